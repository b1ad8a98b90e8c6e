use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use requestdesk_core::domain::catalog::{CatalogProduct, CostCenter};
use requestdesk_core::domain::request::{Request, RequestFields, RequestId};
use requestdesk_core::errors::ApplicationError;

pub mod json;
pub mod memory;

pub use json::{JsonReferenceDataRepository, JsonRequestRepository};
pub use memory::{InMemoryReferenceDataRepository, InMemoryRequestRepository};

pub const REQUESTS_COLLECTION: &str = "requests";
pub const PRODUCTS_COLLECTION: &str = "products";
pub const COST_CENTERS_COLLECTION: &str = "cost-centers";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on `{path}`: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("could not decode `{path}`: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("encode error: {0}")]
    Encode(String),
    #[error("{collection} record {id} was not found")]
    NotFound { collection: &'static str, id: i64 },
    #[error("{collection} id space is exhausted")]
    IdSpaceExhausted { collection: &'static str },
}

impl From<StoreError> for ApplicationError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { collection, id } => {
                ApplicationError::NotFound { collection: collection.to_string(), id }
            }
            other => ApplicationError::Persistence(other.to_string()),
        }
    }
}

#[async_trait]
pub trait RequestRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Request>, StoreError>;

    async fn find_by_id(&self, id: RequestId) -> Result<Option<Request>, StoreError>;

    /// Assigns the next id and stamps `created_at`.
    async fn create(&self, fields: RequestFields) -> Result<Request, StoreError>;

    /// Overwrites every field except `id` and `created_at`.
    async fn update(&self, id: RequestId, fields: RequestFields) -> Result<Request, StoreError>;

    async fn delete(&self, id: RequestId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ReferenceDataRepository: Send + Sync {
    async fn products(&self) -> Result<Vec<CatalogProduct>, StoreError>;
    async fn cost_centers(&self) -> Result<Vec<CostCenter>, StoreError>;
}
