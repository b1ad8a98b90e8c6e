use chrono::Utc;
use tokio::sync::RwLock;

use requestdesk_core::domain::catalog::{CatalogProduct, CostCenter};
use requestdesk_core::domain::request::{Request, RequestFields, RequestId};

use super::{ReferenceDataRepository, RequestRepository, StoreError, REQUESTS_COLLECTION};
use crate::collection::next_id;

#[derive(Default)]
pub struct InMemoryRequestRepository {
    requests: RwLock<Vec<Request>>,
}

impl InMemoryRequestRepository {
    pub fn with_requests(requests: Vec<Request>) -> Self {
        Self { requests: RwLock::new(requests) }
    }
}

#[async_trait::async_trait]
impl RequestRepository for InMemoryRequestRepository {
    async fn list_all(&self) -> Result<Vec<Request>, StoreError> {
        Ok(self.requests.read().await.clone())
    }

    async fn find_by_id(&self, id: RequestId) -> Result<Option<Request>, StoreError> {
        let requests = self.requests.read().await;
        Ok(requests.iter().find(|request| request.id == id).cloned())
    }

    async fn create(&self, fields: RequestFields) -> Result<Request, StoreError> {
        let mut requests = self.requests.write().await;
        let id = next_id(REQUESTS_COLLECTION, &requests)?;
        let request = Request::new(RequestId(id), fields, Utc::now());
        requests.push(request.clone());
        Ok(request)
    }

    async fn update(&self, id: RequestId, fields: RequestFields) -> Result<Request, StoreError> {
        let mut requests = self.requests.write().await;
        let existing = requests
            .iter_mut()
            .find(|request| request.id == id)
            .ok_or(StoreError::NotFound { collection: REQUESTS_COLLECTION, id: id.0 })?;
        existing.overwrite(fields);
        Ok(existing.clone())
    }

    async fn delete(&self, id: RequestId) -> Result<(), StoreError> {
        let mut requests = self.requests.write().await;
        let position = requests
            .iter()
            .position(|request| request.id == id)
            .ok_or(StoreError::NotFound { collection: REQUESTS_COLLECTION, id: id.0 })?;
        requests.remove(position);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryReferenceDataRepository {
    products: RwLock<Vec<CatalogProduct>>,
    cost_centers: RwLock<Vec<CostCenter>>,
}

impl InMemoryReferenceDataRepository {
    pub fn new(products: Vec<CatalogProduct>, cost_centers: Vec<CostCenter>) -> Self {
        Self { products: RwLock::new(products), cost_centers: RwLock::new(cost_centers) }
    }
}

#[async_trait::async_trait]
impl ReferenceDataRepository for InMemoryReferenceDataRepository {
    async fn products(&self) -> Result<Vec<CatalogProduct>, StoreError> {
        Ok(self.products.read().await.clone())
    }

    async fn cost_centers(&self) -> Result<Vec<CostCenter>, StoreError> {
        Ok(self.cost_centers.read().await.clone())
    }
}
