use std::path::{Path, PathBuf};

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

#[derive(Clone)]
pub struct HealthState {
    data_dir: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub storage: HealthCheck,
    pub checked_at: String,
}

pub fn router(data_dir: PathBuf) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { data_dir })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let storage = storage_check(&state.data_dir).await;
    let ready = storage.status == "ready";

    if !ready {
        warn!(
            event_name = "system.health.degraded",
            data_dir = %state.data_dir.display(),
            detail = %storage.detail,
            "storage check failed"
        );
    }

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "requestdesk-server runtime initialized".to_string(),
        },
        storage,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

/// The data directory must be listable and accept a write.
async fn storage_check(data_dir: &Path) -> HealthCheck {
    if let Err(error) = tokio::fs::read_dir(data_dir).await {
        return HealthCheck {
            status: "degraded",
            detail: format!("data directory is not readable: {error}"),
        };
    }

    let probe = data_dir.join(".health-probe");
    let written = tokio::fs::write(&probe, b"ok").await;
    let _ = tokio::fs::remove_file(&probe).await;

    match written {
        Ok(()) => HealthCheck { status: "ready", detail: "data directory is writable".to_string() },
        Err(error) => HealthCheck {
            status: "degraded",
            detail: format!("data directory is not writable: {error}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};
    use tempfile::TempDir;

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_returns_ready_when_data_dir_is_writable() {
        let dir = TempDir::new().expect("tempdir");

        let (status, Json(payload)) =
            health(State(HealthState { data_dir: dir.path().to_path_buf() })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.storage.status, "ready");
        assert_eq!(payload.service.status, "ready");
        assert!(!dir.path().join(".health-probe").exists());
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_data_dir_is_missing() {
        let dir = TempDir::new().expect("tempdir");
        let missing = dir.path().join("missing");

        let (status, Json(payload)) = health(State(HealthState { data_dir: missing })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.storage.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }
}
