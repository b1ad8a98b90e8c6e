use std::sync::Arc;

use requestdesk_core::domain::request::{Request, RequestFields, RequestId};
use requestdesk_core::notify::{NotificationChannel, NotifyOptions, Severity};
use tracing::{info, warn};

use crate::api::{ApiError, RequestsApi};
use crate::session::schedule_expiry;

pub const UPDATE_SUCCEEDED: &str = "Request updated successfully!";
pub const UPDATE_FAILED: &str = "Failed to update request. Please try again.";
pub const DELETE_SUCCEEDED: &str = "Request deleted successfully!";
pub const DELETE_FAILED: &str = "Failed to delete request. Please try again.";

/// What the table should render after a committed change.
#[derive(Debug)]
pub enum Refreshed {
    List(Vec<Request>),
    /// The change went through but the list could not be reloaded.
    Stale(ApiError),
}

impl Refreshed {
    pub fn list(&self) -> Option<&[Request]> {
        match self {
            Self::List(requests) => Some(requests.as_slice()),
            Self::Stale(_) => None,
        }
    }
}

/// Inline edit and delete for the requests table. `Err` means the change
/// itself failed; a failed reload afterwards is `Ok(Refreshed::Stale)`.
pub struct RequestAdmin {
    api: Arc<dyn RequestsApi>,
    notifications: NotificationChannel,
}

impl RequestAdmin {
    pub fn new(api: Arc<dyn RequestsApi>, notifications: NotificationChannel) -> Self {
        Self { api, notifications }
    }

    pub fn notifications(&self) -> &NotificationChannel {
        &self.notifications
    }

    pub async fn refresh(&self) -> Result<Vec<Request>, ApiError> {
        self.api.list_requests().await
    }

    pub async fn update(
        &self,
        id: RequestId,
        fields: &RequestFields,
    ) -> Result<Refreshed, ApiError> {
        if let Err(error) = self.api.update_request(id, fields).await {
            warn!(event_name = "client.admin.update_failed", request_id = %id, error = %error, "update failed");
            self.show(UPDATE_FAILED, Severity::Error);
            return Err(error);
        }

        info!(event_name = "client.admin.updated", request_id = %id, "request updated");
        self.show(UPDATE_SUCCEEDED, Severity::Success);
        Ok(self.reload().await)
    }

    pub async fn delete(&self, id: RequestId) -> Result<Refreshed, ApiError> {
        if let Err(error) = self.api.delete_request(id).await {
            warn!(event_name = "client.admin.delete_failed", request_id = %id, error = %error, "delete failed");
            self.show(DELETE_FAILED, Severity::Error);
            return Err(error);
        }

        info!(event_name = "client.admin.deleted", request_id = %id, "request deleted");
        self.show(DELETE_SUCCEEDED, Severity::Success);
        Ok(self.reload().await)
    }

    async fn reload(&self) -> Refreshed {
        match self.refresh().await {
            Ok(requests) => Refreshed::List(requests),
            Err(error) => {
                warn!(event_name = "client.admin.refresh_failed", error = %error, "list reload failed after change");
                Refreshed::Stale(error)
            }
        }
    }

    fn show(&self, message: &str, severity: Severity) {
        let shown = self.notifications.show(message, NotifyOptions::severity(severity));
        schedule_expiry(&self.notifications, &shown);
    }
}
