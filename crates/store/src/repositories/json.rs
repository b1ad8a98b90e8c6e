use std::path::Path;

use chrono::Utc;
use tracing::info;

use requestdesk_core::domain::catalog::{CatalogProduct, CostCenter};
use requestdesk_core::domain::request::{Request, RequestFields, RequestId};

use super::{
    ReferenceDataRepository, RequestRepository, StoreError, COST_CENTERS_COLLECTION,
    PRODUCTS_COLLECTION, REQUESTS_COLLECTION,
};
use crate::collection::{next_id, JsonCollection};

pub struct JsonRequestRepository {
    requests: JsonCollection<Request>,
}

impl JsonRequestRepository {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { requests: JsonCollection::new(REQUESTS_COLLECTION, path.as_ref()) }
    }

    pub fn path(&self) -> &Path {
        self.requests.path()
    }
}

#[async_trait::async_trait]
impl RequestRepository for JsonRequestRepository {
    async fn list_all(&self) -> Result<Vec<Request>, StoreError> {
        Ok(self.requests.load().await)
    }

    async fn find_by_id(&self, id: RequestId) -> Result<Option<Request>, StoreError> {
        Ok(self.requests.load().await.into_iter().find(|request| request.id == id))
    }

    async fn create(&self, fields: RequestFields) -> Result<Request, StoreError> {
        let created = self
            .requests
            .mutate(|records| {
                let id = next_id(REQUESTS_COLLECTION, records)?;
                let request = Request::new(RequestId(id), fields, Utc::now());
                records.push(request.clone());
                Ok(request)
            })
            .await?;

        info!(event_name = "store.request.created", request_id = %created.id, "request stored");
        Ok(created)
    }

    async fn update(&self, id: RequestId, fields: RequestFields) -> Result<Request, StoreError> {
        let updated = self
            .requests
            .mutate(|records| {
                let existing = records
                    .iter_mut()
                    .find(|request| request.id == id)
                    .ok_or(StoreError::NotFound { collection: REQUESTS_COLLECTION, id: id.0 })?;
                existing.overwrite(fields);
                Ok(existing.clone())
            })
            .await?;

        info!(event_name = "store.request.updated", request_id = %id, "request overwritten");
        Ok(updated)
    }

    async fn delete(&self, id: RequestId) -> Result<(), StoreError> {
        self.requests
            .mutate(|records| {
                let position = records
                    .iter()
                    .position(|request| request.id == id)
                    .ok_or(StoreError::NotFound { collection: REQUESTS_COLLECTION, id: id.0 })?;
                records.remove(position);
                Ok(())
            })
            .await?;

        info!(event_name = "store.request.deleted", request_id = %id, "request removed");
        Ok(())
    }
}

pub struct JsonReferenceDataRepository {
    products: JsonCollection<CatalogProduct>,
    cost_centers: JsonCollection<CostCenter>,
}

impl JsonReferenceDataRepository {
    pub fn new(products_path: impl AsRef<Path>, cost_centers_path: impl AsRef<Path>) -> Self {
        Self {
            products: JsonCollection::new(PRODUCTS_COLLECTION, products_path.as_ref()),
            cost_centers: JsonCollection::new(COST_CENTERS_COLLECTION, cost_centers_path.as_ref()),
        }
    }
}

#[async_trait::async_trait]
impl ReferenceDataRepository for JsonReferenceDataRepository {
    async fn products(&self) -> Result<Vec<CatalogProduct>, StoreError> {
        Ok(self.products.load().await)
    }

    async fn cost_centers(&self) -> Result<Vec<CostCenter>, StoreError> {
        Ok(self.cost_centers.load().await)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use requestdesk_core::domain::request::{LineItem, Request, RequestFields, RequestId};

    use crate::repositories::{
        JsonReferenceDataRepository, JsonRequestRepository, ReferenceDataRepository,
        RequestRepository, StoreError,
    };

    fn fields(title: &str) -> RequestFields {
        RequestFields {
            requestor_name: "Ada Lovelace".to_string(),
            requestor_email: "ada@example.com".to_string(),
            department: "Engineering".to_string(),
            employee_id: "E-100".to_string(),
            on_behalf_of: None,
            request_title: title.to_string(),
            description: "Replacement hardware".to_string(),
            requested_date: "2024-03-01".to_string(),
            due_date: None,
            priority: "high".to_string(),
            products: vec![LineItem::new("Laptop", 2, Decimal::new(129999, 2)).expect("line item")],
            budget: Decimal::from(3000),
            cost_center: "CC300".to_string(),
            attachments: Vec::new(),
        }
    }

    fn repo(dir: &TempDir) -> JsonRequestRepository {
        JsonRequestRepository::new(dir.path().join("requests.json"))
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let dir = TempDir::new().expect("tempdir");

        let requests = repo(&dir).list_all().await.expect("list");

        assert!(requests.is_empty());
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids_in_call_order() {
        let dir = TempDir::new().expect("tempdir");
        let repo = repo(&dir);

        let mut ids = Vec::new();
        for title in ["first", "second", "third"] {
            ids.push(repo.create(fields(title)).await.expect("create").id);
        }

        assert_eq!(ids, vec![RequestId(1), RequestId(2), RequestId(3)]);
        let stored = repo.list_all().await.expect("list");
        let titles: Vec<_> = stored.iter().map(|r| r.fields.request_title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn ids_continue_from_max_after_delete() {
        let dir = TempDir::new().expect("tempdir");
        let repo = repo(&dir);
        for title in ["a", "b", "c"] {
            repo.create(fields(title)).await.expect("create");
        }

        repo.delete(RequestId(2)).await.expect("delete");
        let next = repo.create(fields("d")).await.expect("create");

        assert_eq!(next.id, RequestId(4));
    }

    #[tokio::test]
    async fn create_after_the_largest_id_fails_without_writing() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("requests.json");
        let last = Request::new(
            RequestId(i64::MAX),
            fields("last"),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("valid time"),
        );
        let document = serde_json::to_string_pretty(&vec![last]).expect("encode");
        std::fs::write(&path, &document).expect("seed document");

        let result = JsonRequestRepository::new(&path).create(fields("next")).await;

        assert!(matches!(result, Err(StoreError::IdSpaceExhausted { collection: "requests" })));
        assert_eq!(std::fs::read_to_string(&path).expect("read back"), document);
    }

    #[tokio::test]
    async fn update_preserves_id_and_created_at() {
        let dir = TempDir::new().expect("tempdir");
        let repo = repo(&dir);
        let original = repo.create(fields("before")).await.expect("create");

        let updated = repo.update(original.id, fields("after")).await.expect("update");

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.fields.request_title, "after");
        let reloaded = repo.find_by_id(original.id).await.expect("find").expect("present");
        assert_eq!(reloaded, updated);
    }

    #[tokio::test]
    async fn update_ignores_id_and_created_at_in_payload() {
        let dir = TempDir::new().expect("tempdir");
        let repo = repo(&dir);
        let original = repo.create(fields("before")).await.expect("create");

        let mut body = serde_json::to_value(Request::new(
            RequestId(99),
            fields("after"),
            Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).single().expect("valid time"),
        ))
        .expect("encode");
        body["requestTitle"] = "from payload".into();
        let payload: RequestFields = serde_json::from_value(body).expect("decode");

        let updated = repo.update(original.id, payload).await.expect("update");

        assert_eq!(updated.id, RequestId(1));
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.fields.request_title, "from payload");
    }

    #[tokio::test]
    async fn missing_ids_report_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let repo = repo(&dir);

        assert_eq!(repo.find_by_id(RequestId(7)).await.expect("find"), None);
        assert!(matches!(
            repo.update(RequestId(7), fields("x")).await,
            Err(StoreError::NotFound { id: 7, .. })
        ));
        assert!(matches!(repo.delete(RequestId(7)).await, Err(StoreError::NotFound { id: 7, .. })));
    }

    #[tokio::test]
    async fn every_call_reads_the_file_fresh() {
        let dir = TempDir::new().expect("tempdir");
        let repo = repo(&dir);
        repo.create(fields("ours")).await.expect("create");

        let mut external = repo.list_all().await.expect("list");
        let mut foreign = external[0].clone();
        foreign.id = RequestId(10);
        foreign.fields.request_title = "written elsewhere".to_string();
        external.push(foreign);
        let raw = serde_json::to_string_pretty(&external).expect("encode");
        tokio::fs::write(repo.path(), raw).await.expect("external write");

        let next = repo.create(fields("after external")).await.expect("create");

        assert_eq!(next.id, RequestId(11));
        assert_eq!(repo.list_all().await.expect("list").len(), 3);
    }

    #[tokio::test]
    async fn line_item_totals_are_recomputed_on_load() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("requests.json");
        let repo = JsonRequestRepository::new(&path);
        repo.create(fields("drift")).await.expect("create");

        let raw = tokio::fs::read_to_string(&path).await.expect("read");
        let mut document: serde_json::Value = serde_json::from_str(&raw).expect("parse");
        document[0]["products"][0]["total"] = 1.0.into();
        tokio::fs::write(&path, document.to_string()).await.expect("write");

        let stored = repo.list_all().await.expect("list");
        assert_eq!(stored[0].fields.products[0].total(), Decimal::new(259998, 2));
    }

    #[tokio::test]
    async fn reference_data_reads_both_collections() {
        let dir = TempDir::new().expect("tempdir");
        let products = dir.path().join("products.json");
        let cost_centers = dir.path().join("cost-centers.json");
        tokio::fs::write(&products, r#"[{"id": 1, "label": "Laptop", "price": 1299.99}]"#)
            .await
            .expect("write products");
        tokio::fs::write(&cost_centers, r#"[{"id": 1, "value": "CC100", "label": "IT"}]"#)
            .await
            .expect("write cost centers");
        let repo = JsonReferenceDataRepository::new(&products, &cost_centers);

        let products = repo.products().await.expect("products");
        let cost_centers = repo.cost_centers().await.expect("cost centers");

        assert_eq!(products[0].price, Decimal::new(129999, 2));
        assert_eq!(cost_centers[0].value, "CC100");
    }
}
