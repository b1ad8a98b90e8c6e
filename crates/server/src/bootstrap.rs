use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use requestdesk_core::config::{AppConfig, ConfigError, LoadOptions};
use requestdesk_store::{
    JsonReferenceDataRepository, JsonRequestRepository, ReferenceDataRepository,
    RequestRepository,
};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{self, ApiState};
use crate::generate::{ChatCompletionsGenerator, DraftGenerator, GenerateError};
use crate::health;

pub struct Application {
    pub config: AppConfig,
    pub requests: Arc<dyn RequestRepository>,
    pub reference: Arc<dyn ReferenceDataRepository>,
    pub generator: Option<Arc<dyn DraftGenerator>>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not prepare data directory `{path}`: {source}")]
    DataDir { path: PathBuf, source: std::io::Error },
    #[error("draft generator setup failed: {0}")]
    Generator(#[source] GenerateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        data_dir = %config.storage.data_dir.display(),
        "starting application bootstrap"
    );

    let data_dir = config.storage.data_dir.clone();
    tokio::fs::create_dir_all(&data_dir)
        .await
        .map_err(|source| BootstrapError::DataDir { path: data_dir.clone(), source })?;

    let requests: Arc<dyn RequestRepository> =
        Arc::new(JsonRequestRepository::new(config.storage.requests_path()));
    let reference: Arc<dyn ReferenceDataRepository> = Arc::new(JsonReferenceDataRepository::new(
        config.storage.products_path(),
        config.storage.cost_centers_path(),
    ));

    let generator: Option<Arc<dyn DraftGenerator>> = if config.llm.enabled {
        let generator =
            ChatCompletionsGenerator::new(&config.llm).map_err(BootstrapError::Generator)?;
        Some(Arc::new(generator))
    } else {
        None
    };
    info!(
        event_name = "system.bootstrap.generator",
        correlation_id = "bootstrap",
        enabled = generator.is_some(),
        model = %config.llm.model,
        "draft generator configured"
    );

    Ok(Application { config, requests, reference, generator })
}

impl Application {
    /// API routes, `/health`, request tracing and the CORS policy.
    pub fn router(&self) -> Router {
        let state =
            ApiState::new(self.requests.clone(), self.reference.clone(), self.generator.clone());

        let router = api::router(state)
            .merge(health::router(self.config.storage.data_dir.clone()))
            .layer(TraceLayer::new_for_http());

        if self.config.server.cors_allow_any {
            router.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        } else {
            router
        }
    }
}
