pub mod admin;
pub mod api;
pub mod routes;
pub mod session;
pub mod submit;

#[cfg(test)]
pub(crate) mod testing;

pub use admin::{Refreshed, RequestAdmin};
pub use api::{ApiError, HttpRequestsApi, RequestsApi};
pub use routes::{Navigator, RecordingNavigator};
pub use session::{SessionError, WizardSession};
pub use submit::{SubmissionClient, SubmitError};
