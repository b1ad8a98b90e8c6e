use std::path::Path;

use chrono::Utc;
use requestdesk_core::aggregate::{metrics, timeline};
use requestdesk_store::{JsonRequestRepository, RequestRepository};
use serde_json::json;

use crate::commands::{load_config, runtime, CommandResult};

/// Reads the request collection straight from disk; no server needed.
pub fn run(config_path: Option<&Path>) -> CommandResult {
    let config = match load_config("report", config_path) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("report") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let repository = JsonRequestRepository::new(config.storage.requests_path());
    let requests = match runtime.block_on(repository.list_all()) {
        Ok(requests) => requests,
        Err(error) => {
            return CommandResult::failure("report", "store_read", error.to_string(), 4);
        }
    };

    let metrics = metrics(&requests, Utc::now());
    let timeline = timeline(&requests);
    let message = format!(
        "{} requests, {} high priority, {} created this month; peak month {}",
        metrics.total_requests,
        metrics.high_priority,
        metrics.completed_this_month,
        timeline.summary.peak_month
    );

    CommandResult::success_with_data(
        "report",
        message,
        Some(json!({ "metrics": metrics, "timeline": timeline })),
    )
}
