//! Async shell around the wizard state machine.
//!
//! Network responses are tagged with the session epoch they were requested
//! under. `reset` and `close` advance the epoch, so a response that lands
//! afterwards is dropped instead of being applied to a newer draft.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use requestdesk_core::autofill::GeneratedDraft;
use requestdesk_core::config::WizardConfig;
use requestdesk_core::domain::catalog::Catalog;
use requestdesk_core::errors::ApplicationError;
use requestdesk_core::notify::{Notification, NotificationChannel, NotifyOptions, Severity};
use requestdesk_core::wizard::Wizard;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiError, RequestsApi};

pub const REFERENCE_LOAD_FAILED: &str =
    "Failed to load products and cost centers. Please refresh and try again.";
pub const AUTOFILL_FAILED: &str = "Failed to generate form data. Please try again.";
pub const AUTOFILL_APPLIED: &str = "Form filled with generated data. Please review before submitting.";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Application(#[from] ApplicationError),
    #[error("wizard session is closed")]
    Closed,
}

/// Whether a fetched response was applied or dropped as stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    Discarded,
}

pub struct WizardSession {
    api: Arc<dyn RequestsApi>,
    wizard: Mutex<Wizard>,
    notifications: NotificationChannel,
    epoch: AtomicU64,
    closed: AtomicBool,
}

impl WizardSession {
    pub fn new(api: Arc<dyn RequestsApi>, config: &WizardConfig) -> Self {
        let notifications = NotificationChannel::new(config.notification_timeout());
        Self {
            api,
            wizard: Mutex::new(Wizard::new(notifications.clone())),
            notifications,
            epoch: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn api(&self) -> &Arc<dyn RequestsApi> {
        &self.api
    }

    pub fn notifications(&self) -> &NotificationChannel {
        &self.notifications
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// True while nothing has reset or closed the session since `epoch`.
    pub fn is_current(&self, epoch: u64) -> bool {
        !self.is_closed() && self.epoch() == epoch
    }

    /// Runs `change` against the wizard. Any notification the wizard raised
    /// gets an expiry timer.
    pub fn with_wizard<R>(&self, change: impl FnOnce(&mut Wizard) -> R) -> R {
        let before = self.notifications.current().map(|notification| notification.id);
        let result = {
            let mut wizard = self.wizard.lock().unwrap_or_else(PoisonError::into_inner);
            change(&mut wizard)
        };
        if let Some(shown) = self.notifications.current() {
            if Some(shown.id) != before {
                self.schedule_expiry(&shown);
            }
        }
        result
    }

    /// Shows a message and schedules its expiry on the current runtime.
    pub fn notify(&self, message: impl Into<String>, severity: Severity) -> Notification {
        let notification = self.notifications.show(message, NotifyOptions::severity(severity));
        self.schedule_expiry(&notification);
        notification
    }

    /// Fetches products and cost centers concurrently and installs them.
    pub async fn load_reference_data(&self) -> Result<FetchOutcome, SessionError> {
        let epoch = self.guard_open()?;

        let (products, cost_centers) =
            tokio::join!(self.api.products(), self.api.cost_centers());
        let (products, cost_centers) = match (products, cost_centers) {
            (Ok(products), Ok(cost_centers)) => (products, cost_centers),
            (Err(error), _) | (_, Err(error)) => {
                if self.is_current(epoch) {
                    self.notify(REFERENCE_LOAD_FAILED, Severity::Error);
                }
                warn!(
                    event_name = "client.reference.failed",
                    error = %error,
                    "reference data could not be loaded"
                );
                return Err(error.into());
            }
        };

        if !self.is_current(epoch) {
            debug!(event_name = "client.reference.discarded", epoch, "stale reference data dropped");
            return Ok(FetchOutcome::Discarded);
        }

        info!(
            event_name = "client.reference.loaded",
            products = products.len(),
            cost_centers = cost_centers.len(),
            "reference data installed"
        );
        self.with_wizard(|wizard| wizard.set_reference_data(Catalog::new(products), cost_centers));
        Ok(FetchOutcome::Applied)
    }

    /// Asks the server for a generated draft and merges it into the wizard.
    pub async fn autofill(&self) -> Result<FetchOutcome, SessionError> {
        let epoch = self.guard_open()?;

        let generated = match self.api.generate_form_data().await {
            Ok(value) => GeneratedDraft::from_value(value).map_err(SessionError::from),
            Err(error) => Err(SessionError::from(error)),
        };
        let generated = match generated {
            Ok(generated) => generated,
            Err(error) => {
                if self.is_current(epoch) {
                    self.notify(AUTOFILL_FAILED, Severity::Error);
                }
                warn!(event_name = "client.autofill.failed", error = %error, "autofill failed");
                return Err(error);
            }
        };

        if !self.is_current(epoch) {
            debug!(event_name = "client.autofill.discarded", epoch, "stale autofill dropped");
            return Ok(FetchOutcome::Discarded);
        }

        self.with_wizard(|wizard| {
            let patch = generated.into_patch(wizard.catalog());
            wizard.set_draft(patch);
        });
        self.notify(AUTOFILL_APPLIED, Severity::Info);
        Ok(FetchOutcome::Applied)
    }

    /// Fresh draft at the first step; in-flight responses become stale.
    pub fn reset(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.with_wizard(Wizard::reset);
    }

    /// Ends the session; every pending response is discarded.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.notifications.clear();
    }

    fn guard_open(&self) -> Result<u64, SessionError> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        Ok(self.epoch())
    }

    fn schedule_expiry(&self, notification: &Notification) {
        schedule_expiry(&self.notifications, notification);
    }
}

/// Clears `notification` once its display time has passed, unless a newer
/// message replaced it first. Outside a runtime, expiry stays lazy.
pub(crate) fn schedule_expiry(channel: &NotificationChannel, notification: &Notification) {
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        return;
    };
    let channel = channel.clone();
    let id = notification.id;
    let display_for = notification.display_for;
    handle.spawn(async move {
        tokio::time::sleep(display_for).await;
        channel.expire(id);
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use requestdesk_core::notify::Severity;
    use requestdesk_core::wizard::WizardStep;
    use serde_json::json;

    use super::{FetchOutcome, SessionError, WizardSession, AUTOFILL_FAILED, REFERENCE_LOAD_FAILED};
    use crate::testing::{wizard_config, FakeApi};

    fn session(api: Arc<FakeApi>) -> WizardSession {
        WizardSession::new(api, &wizard_config())
    }

    #[tokio::test]
    async fn reference_data_is_loaded_into_the_wizard() {
        let session = session(Arc::new(FakeApi::default()));

        let outcome = session.load_reference_data().await.expect("load");

        assert_eq!(outcome, FetchOutcome::Applied);
        session.with_wizard(|wizard| {
            assert!(wizard.catalog().find("Laptop").is_some());
            assert_eq!(wizard.cost_centers().len(), 4);
        });
    }

    #[tokio::test]
    async fn reference_data_arriving_after_reset_is_discarded() {
        let api = Arc::new(FakeApi::default());
        api.hold_reference_data();
        let session = Arc::new(session(api.clone()));

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.load_reference_data().await }
        });
        api.wait_for_reference_request().await;
        session.reset();
        api.release_reference_data();

        let outcome = pending.await.expect("join").expect("load");
        assert_eq!(outcome, FetchOutcome::Discarded);
        session.with_wizard(|wizard| assert!(wizard.catalog().is_empty()));
    }

    #[tokio::test]
    async fn failed_reference_load_notifies_and_keeps_state() {
        let api = Arc::new(FakeApi::default());
        api.fail_reads();
        let session = session(api);

        let error = session.load_reference_data().await.expect_err("load fails");

        assert!(matches!(error, SessionError::Api(_)));
        let shown = session.notifications().current().expect("notification");
        assert_eq!(shown.message, REFERENCE_LOAD_FAILED);
        assert_eq!(shown.severity, Severity::Error);
    }

    #[tokio::test]
    async fn autofill_merges_generated_draft_against_the_catalog() {
        let api = Arc::new(FakeApi::default());
        api.set_generated(json!({
            "requestorName": "Grace Hopper",
            "requestorEmail": "grace@example.com",
            "requestedDate": "2024-06-01",
            "products": [
                {"label": "Laptop", "quantity": 2, "price": 1.0, "total": 2.0},
                {"label": "Hoverboard", "quantity": 1, "price": 5.0, "total": 5.0}
            ],
            "budget": 5000
        }));
        let session = session(api);
        session.load_reference_data().await.expect("load");

        let outcome = session.autofill().await.expect("autofill");

        assert_eq!(outcome, FetchOutcome::Applied);
        session.with_wizard(|wizard| {
            let draft = wizard.draft();
            assert_eq!(draft.requestor_name, "Grace Hopper");
            assert_eq!(draft.products.len(), 1);
            assert_eq!(draft.products[0].total(), draft.products[0].price() * rust_decimal::Decimal::from(2));
            assert!(wizard.next().is_ok());
        });
    }

    #[tokio::test]
    async fn malformed_autofill_notifies_failure() {
        let api = Arc::new(FakeApi::default());
        api.set_generated(json!(["not", "an", "object"]));
        let session = session(api);

        let error = session.autofill().await.expect_err("malformed");

        assert!(matches!(error, SessionError::Application(_)));
        assert_eq!(
            session.notifications().current().map(|n| n.message),
            Some(AUTOFILL_FAILED.to_string())
        );
    }

    #[tokio::test]
    async fn closed_session_rejects_fetches() {
        let session = session(Arc::new(FakeApi::default()));
        session.close();

        assert!(matches!(session.load_reference_data().await, Err(SessionError::Closed)));
        assert!(matches!(session.autofill().await, Err(SessionError::Closed)));
    }

    #[tokio::test(start_paused = true)]
    async fn wizard_rejection_notification_expires_after_timeout() {
        let session = session(Arc::new(FakeApi::default()));

        let rejected = session.with_wizard(|wizard| wizard.go_to(1));

        assert!(rejected.is_err());
        assert_eq!(session.with_wizard(|wizard| wizard.current_step()), WizardStep::ClientInfo);
        assert!(session.notifications().current().is_some());

        tokio::time::sleep(Duration::from_millis(5_001)).await;
        tokio::task::yield_now().await;

        assert!(session.notifications().current().is_none());
    }
}
