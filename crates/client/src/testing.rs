use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use requestdesk_core::config::WizardConfig;
use requestdesk_core::domain::catalog::{CatalogProduct, CostCenter, ProductId};
use requestdesk_core::domain::request::{Request, RequestFields, RequestId};
use requestdesk_core::wizard::DraftPatch;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::api::{ApiError, RequestsApi};
use crate::routes::APPROVALS;

pub(crate) fn wizard_config() -> WizardConfig {
    WizardConfig {
        api_base_url: "http://127.0.0.1:5000".to_string(),
        notification_timeout_ms: 5_000,
        redirect_delay_ms: 1_500,
        success_route: APPROVALS.to_string(),
    }
}

pub(crate) fn complete_patch() -> DraftPatch {
    DraftPatch {
        requestor_name: Some("Ada Lovelace".to_string()),
        requestor_email: Some("ada@example.com".to_string()),
        department: Some("Engineering".to_string()),
        employee_id: Some("E-100".to_string()),
        request_title: Some("Laptop refresh".to_string()),
        description: Some("Two laptops for new hires".to_string()),
        requested_date: Some("2024-05-01".to_string()),
        priority: Some("high".to_string()),
        budget: Some(Decimal::from(3_000)),
        cost_center: Some("CC100".to_string()),
        ..DraftPatch::default()
    }
}

pub(crate) fn complete_fields(title: &str) -> RequestFields {
    let mut draft = requestdesk_core::wizard::Draft::default();
    draft.merge(complete_patch());
    draft.request_title = title.to_string();
    draft.to_fields()
}

/// In-process stand-in for the server.
pub(crate) struct FakeApi {
    products: Vec<CatalogProduct>,
    cost_centers: Vec<CostCenter>,
    requests: Mutex<Vec<Request>>,
    generated: Mutex<Value>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    hold_reference: AtomicBool,
    reference_requested: Notify,
    reference_release: Notify,
    hold_create: AtomicBool,
    create_requested: Notify,
    create_release: Notify,
}

impl Default for FakeApi {
    fn default() -> Self {
        let products = [("Laptop", 129_999), ("Phone", 79_999), ("Tablet", 49_999), ("Smartwatch", 19_999)]
            .iter()
            .zip(1..)
            .map(|((label, cents), id)| CatalogProduct {
                id: ProductId(id),
                label: (*label).to_string(),
                price: Decimal::new(*cents, 2),
            })
            .collect();
        let cost_centers = ["CC100", "CC200", "CC300", "CC400"]
            .iter()
            .zip(1..)
            .map(|(code, id)| CostCenter {
                id,
                value: (*code).to_string(),
                label: format!("{code} - Department {id}"),
            })
            .collect();

        Self {
            products,
            cost_centers,
            requests: Mutex::new(Vec::new()),
            generated: Mutex::new(json!({})),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            hold_reference: AtomicBool::new(false),
            reference_requested: Notify::new(),
            reference_release: Notify::new(),
            hold_create: AtomicBool::new(false),
            create_requested: Notify::new(),
            create_release: Notify::new(),
        }
    }
}

impl FakeApi {
    pub(crate) fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub(crate) fn set_generated(&self, value: Value) {
        *self.generated.lock().expect("generated lock") = value;
    }

    pub(crate) fn created(&self) -> Vec<Request> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub(crate) fn hold_reference_data(&self) {
        self.hold_reference.store(true, Ordering::SeqCst);
    }

    pub(crate) async fn wait_for_reference_request(&self) {
        self.reference_requested.notified().await;
    }

    pub(crate) fn release_reference_data(&self) {
        self.reference_release.notify_one();
    }

    pub(crate) fn hold_create(&self) {
        self.hold_create.store(true, Ordering::SeqCst);
    }

    pub(crate) async fn wait_for_create(&self) {
        self.create_requested.notified().await;
    }

    pub(crate) fn release_create(&self) {
        self.create_release.notify_one();
    }

    fn transport_error(&self, path: &str) -> ApiError {
        ApiError::Transport { url: path.to_string(), reason: "connection refused".to_string() }
    }

    fn not_found(path: &str) -> ApiError {
        ApiError::Status { url: path.to_string(), status: 404 }
    }
}

#[async_trait]
impl RequestsApi for FakeApi {
    async fn products(&self) -> Result<Vec<CatalogProduct>, ApiError> {
        self.reference_requested.notify_one();
        if self.hold_reference.load(Ordering::SeqCst) {
            self.reference_release.notified().await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(self.transport_error("/api/products"));
        }
        Ok(self.products.clone())
    }

    async fn cost_centers(&self) -> Result<Vec<CostCenter>, ApiError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(self.transport_error("/api/costcenters"));
        }
        Ok(self.cost_centers.clone())
    }

    async fn list_requests(&self) -> Result<Vec<Request>, ApiError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(self.transport_error("/api/requests"));
        }
        Ok(self.created())
    }

    async fn create_request(&self, fields: &RequestFields) -> Result<Request, ApiError> {
        self.create_requested.notify_one();
        if self.hold_create.load(Ordering::SeqCst) {
            self.create_release.notified().await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(self.transport_error("/api/requests"));
        }
        let mut requests = self.requests.lock().expect("requests lock");
        let id = requests.iter().map(|request| request.id.0).max().map_or(1, |max| max + 1);
        let request = Request::new(RequestId(id), fields.clone(), Utc::now());
        requests.push(request.clone());
        Ok(request)
    }

    async fn update_request(
        &self,
        id: RequestId,
        fields: &RequestFields,
    ) -> Result<Request, ApiError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(self.transport_error("/api/requests/{id}"));
        }
        let mut requests = self.requests.lock().expect("requests lock");
        let existing = requests
            .iter_mut()
            .find(|request| request.id == id)
            .ok_or_else(|| Self::not_found("/api/requests/{id}"))?;
        existing.overwrite(fields.clone());
        Ok(existing.clone())
    }

    async fn delete_request(&self, id: RequestId) -> Result<(), ApiError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(self.transport_error("/api/requests/{id}"));
        }
        let mut requests = self.requests.lock().expect("requests lock");
        let before = requests.len();
        requests.retain(|request| request.id != id);
        if requests.len() == before {
            return Err(Self::not_found("/api/requests/{id}"));
        }
        Ok(())
    }

    async fn generate_form_data(&self) -> Result<Value, ApiError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(self.transport_error("/api/generateformdata"));
        }
        Ok(self.generated.lock().expect("generated lock").clone())
    }
}
