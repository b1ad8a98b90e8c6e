use std::time::Duration;

use async_trait::async_trait;
use requestdesk_core::domain::catalog::{CatalogProduct, CostCenter};
use requestdesk_core::domain::request::{Request, RequestFields, RequestId};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },
    #[error("could not decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// The HTTP surface the wizard and the request table talk to.
#[async_trait]
pub trait RequestsApi: Send + Sync {
    async fn products(&self) -> Result<Vec<CatalogProduct>, ApiError>;
    async fn cost_centers(&self) -> Result<Vec<CostCenter>, ApiError>;
    async fn list_requests(&self) -> Result<Vec<Request>, ApiError>;
    async fn create_request(&self, fields: &RequestFields) -> Result<Request, ApiError>;
    async fn update_request(
        &self,
        id: RequestId,
        fields: &RequestFields,
    ) -> Result<Request, ApiError>;
    async fn delete_request(&self, id: RequestId) -> Result<(), ApiError>;
    async fn generate_form_data(&self) -> Result<Value, ApiError>;
}

/// reqwest-backed client against a running `requestdesk-server`.
#[derive(Clone)]
pub struct HttpRequestsApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRequestsApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|error| ApiError::Transport { url: base_url.clone(), reason: error.to_string() })?;
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        url: String,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|error| ApiError::Transport { url: url.clone(), reason: error.to_string() })?;

        let status = response.status();
        debug!(event_name = "client.api.response", url = %url, status = status.as_u16(), "api call finished");
        if !status.is_success() {
            return Err(ApiError::Status { url, status: status.as_u16() });
        }

        response.json::<T>().await.map_err(|error| ApiError::Decode { url, reason: error.to_string() })
    }
}

#[async_trait]
impl RequestsApi for HttpRequestsApi {
    async fn products(&self) -> Result<Vec<CatalogProduct>, ApiError> {
        let url = self.url("/api/products");
        self.send(url.clone(), self.client.get(&url)).await
    }

    async fn cost_centers(&self) -> Result<Vec<CostCenter>, ApiError> {
        let url = self.url("/api/costcenters");
        self.send(url.clone(), self.client.get(&url)).await
    }

    async fn list_requests(&self) -> Result<Vec<Request>, ApiError> {
        let url = self.url("/api/requests");
        self.send(url.clone(), self.client.get(&url)).await
    }

    async fn create_request(&self, fields: &RequestFields) -> Result<Request, ApiError> {
        let url = self.url("/api/requests");
        self.send(url.clone(), self.client.post(&url).json(fields)).await
    }

    async fn update_request(
        &self,
        id: RequestId,
        fields: &RequestFields,
    ) -> Result<Request, ApiError> {
        let url = self.url(&format!("/api/requests/{id}"));
        self.send(url.clone(), self.client.put(&url).json(fields)).await
    }

    async fn delete_request(&self, id: RequestId) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/requests/{id}"));
        let _confirmation: Value = self.send(url.clone(), self.client.delete(&url)).await?;
        Ok(())
    }

    async fn generate_form_data(&self) -> Result<Value, ApiError> {
        let url = self.url("/api/generateformdata");
        self.send(url.clone(), self.client.get(&url)).await
    }
}
