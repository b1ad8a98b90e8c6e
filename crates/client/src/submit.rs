use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use requestdesk_core::config::WizardConfig;
use requestdesk_core::domain::request::Request;
use requestdesk_core::errors::DomainError;
use requestdesk_core::notify::Severity;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::ApiError;
use crate::routes::Navigator;
use crate::session::WizardSession;

pub const SUBMIT_SUCCEEDED: &str = "Request submitted successfully!";
pub const SUBMIT_FAILED: &str = "Failed to submit request. Please try again.";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("a submission is already in flight")]
    InFlight,
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error(transparent)]
    Rejected(#[from] ApiError),
}

/// Sends the wizard draft to the create endpoint.
///
/// At most one submission runs at a time. On success the user sees a success
/// message, and after `redirect_delay` the navigator moves to the success
/// route and the wizard starts over. On failure the draft is left exactly as
/// it was so the user can retry.
pub struct SubmissionClient {
    session: Arc<WizardSession>,
    navigator: Arc<dyn Navigator>,
    in_flight: AtomicBool,
    redirect_delay: Duration,
    success_route: String,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SubmissionClient {
    pub fn new(
        session: Arc<WizardSession>,
        navigator: Arc<dyn Navigator>,
        config: &WizardConfig,
    ) -> Self {
        Self {
            session,
            navigator,
            in_flight: AtomicBool::new(false),
            redirect_delay: config.redirect_delay(),
            success_route: config.success_route.clone(),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub async fn submit(&self) -> Result<Request, SubmitError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            warn!(event_name = "client.submission.duplicate", "submission already in flight");
            return Err(SubmitError::InFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let fields = self.session.with_wizard(|wizard| wizard.prepare_submission())?;
        let epoch = self.session.epoch();

        let stored = match self.session.api().create_request(&fields).await {
            Ok(stored) => stored,
            Err(error) => {
                warn!(
                    event_name = "client.submission.rejected",
                    error = %error,
                    "request submission failed"
                );
                if self.session.is_current(epoch) {
                    self.session.notify(SUBMIT_FAILED, Severity::Error);
                }
                return Err(error.into());
            }
        };

        info!(
            event_name = "client.submission.accepted",
            request_id = %stored.id,
            "request submitted"
        );
        self.session.notify(SUBMIT_SUCCEEDED, Severity::Success);

        tokio::time::sleep(self.redirect_delay).await;
        if self.session.is_current(epoch) {
            self.navigator.navigate(&self.success_route);
            self.session.reset();
        }

        Ok(stored)
    }
}
