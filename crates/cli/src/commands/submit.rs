use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use requestdesk_client::{
    HttpRequestsApi, RecordingNavigator, SubmissionClient, SubmitError, WizardSession,
};
use requestdesk_core::wizard::{DraftPatch, WizardStep};
use serde::Deserialize;

use crate::commands::{load_config, runtime, CommandResult};

const API_TIMEOUT: Duration = Duration::from_secs(30);

/// What `requestdesk submit --draft` reads. Products are picked by catalog
/// label so prices always come from the live catalog.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DraftFile {
    #[serde(default)]
    pub draft: DraftPatch,
    #[serde(default)]
    pub products: Vec<ProductChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ProductChoice {
    pub label: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

impl DraftFile {
    pub fn read(path: &Path) -> Result<Self, String> {
        let raw = fs::read_to_string(path)
            .map_err(|error| format!("could not read `{}`: {error}", path.display()))?;
        serde_json::from_str(&raw)
            .map_err(|error| format!("could not parse `{}`: {error}", path.display()))
    }
}

type Failure = (&'static str, String, u8);

pub fn run(config_path: Option<&Path>, draft_path: &Path) -> CommandResult {
    let config = match load_config("submit", config_path) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let draft_file = match DraftFile::read(draft_path) {
        Ok(draft_file) => draft_file,
        Err(message) => return CommandResult::failure("submit", "draft_file", message, 2),
    };
    let runtime = match runtime("submit") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result: Result<String, Failure> = runtime.block_on(async {
        let api = HttpRequestsApi::with_timeout(config.wizard.api_base_url.clone(), Some(API_TIMEOUT))
            .map_err(|error| ("api_client", error.to_string(), 4u8))?;
        let session = Arc::new(WizardSession::new(Arc::new(api), &config.wizard));

        session
            .load_reference_data()
            .await
            .map_err(|error| ("reference_data", error.to_string(), 4u8))?;

        fill_and_walk(&session, draft_file)?;

        let navigator = Arc::new(RecordingNavigator::default());
        let client = SubmissionClient::new(session.clone(), navigator.clone(), &config.wizard);
        let stored = client.submit().await.map_err(|error| {
            let (error_class, exit_code) = match error {
                SubmitError::Invalid(_) => ("validation", 2u8),
                SubmitError::Rejected(_) | SubmitError::InFlight => ("submission", 4u8),
            };
            (error_class, error.to_string(), exit_code)
        })?;

        let destination = navigator.last().unwrap_or_else(|| config.wizard.success_route.clone());
        Ok(format!(
            "request {} \"{}\" submitted; continue at {destination}",
            stored.id, stored.fields.request_title
        ))
    });

    match result {
        Ok(message) => CommandResult::success("submit", message),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("submit", error_class, message, exit_code)
        }
    }
}

/// Applies the file to the wizard, then advances one step at a time so every
/// step's validation runs in order.
fn fill_and_walk(session: &WizardSession, draft_file: DraftFile) -> Result<(), Failure> {
    session.with_wizard(|wizard| {
        wizard.set_draft(DraftPatch { products: None, ..draft_file.draft });

        let labels: Vec<&str> =
            draft_file.products.iter().map(|choice| choice.label.as_str()).collect();
        wizard.select_products(&labels).map_err(|error| ("draft_file", error.to_string(), 2u8))?;
        for choice in &draft_file.products {
            wizard
                .set_quantity(&choice.label, choice.quantity)
                .map_err(|error| ("draft_file", error.to_string(), 2u8))?;
        }

        while wizard.current_step() != WizardStep::last() {
            wizard.next().map_err(|error| ("validation", error.to_string(), 2u8))?;
        }
        Ok(())
    })
}
