//! JSON API over the request, product and cost-center collections.
//!
//! - `GET    /api/products`              catalog products
//! - `GET    /api/costcenters`           cost centers
//! - `GET    /api/requests`              all requests
//! - `POST   /api/requests`              create, id and createdAt assigned here
//! - `GET    /api/requests/metrics`      dashboard counters
//! - `GET    /api/requests/timeline`     monthly buckets and summary
//! - `GET    /api/requests/{id}`         one request or 404
//! - `PUT    /api/requests/{id}`         full overwrite or 404
//! - `DELETE /api/requests/{id}`         delete or 404
//! - `GET    /api/generateformdata`      LLM-generated draft for prefill

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use requestdesk_core::aggregate::{self, RequestMetrics, TimelineReport};
use requestdesk_core::domain::catalog::{CatalogProduct, CostCenter};
use requestdesk_core::domain::request::{Request, RequestFields, RequestId};
use requestdesk_core::errors::{ApplicationError, InterfaceError};
use requestdesk_store::{ReferenceDataRepository, RequestRepository, StoreError};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::generate::{generate_draft, DraftGenerator, GenerateError, PromptSelection};

#[derive(Clone)]
pub struct ApiState {
    requests: Arc<dyn RequestRepository>,
    reference: Arc<dyn ReferenceDataRepository>,
    generator: Option<Arc<dyn DraftGenerator>>,
}

impl ApiState {
    pub fn new(
        requests: Arc<dyn RequestRepository>,
        reference: Arc<dyn ReferenceDataRepository>,
        generator: Option<Arc<dyn DraftGenerator>>,
    ) -> Self {
        Self { requests, reference, generator }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub success: bool,
    pub error: String,
    pub details: String,
    pub correlation_id: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub id: RequestId,
    pub message: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/products", get(list_products))
        .route("/api/costcenters", get(list_cost_centers))
        .route("/api/requests", get(list_requests).post(create_request))
        .route("/api/requests/metrics", get(request_metrics))
        .route("/api/requests/timeline", get(request_timeline))
        .route(
            "/api/requests/{id}",
            get(get_request).put(update_request).delete(delete_request),
        )
        .route("/api/generateformdata", get(generate_form_data))
        .with_state(state)
}

async fn list_products(State(state): State<ApiState>) -> ApiResult<Vec<CatalogProduct>> {
    state.reference.products().await.map(Json).map_err(store_failure)
}

async fn list_cost_centers(State(state): State<ApiState>) -> ApiResult<Vec<CostCenter>> {
    state.reference.cost_centers().await.map(Json).map_err(store_failure)
}

async fn list_requests(State(state): State<ApiState>) -> ApiResult<Vec<Request>> {
    state.requests.list_all().await.map(Json).map_err(store_failure)
}

async fn get_request(State(state): State<ApiState>, Path(id): Path<i64>) -> ApiResult<Request> {
    let id = RequestId(id);
    match state.requests.find_by_id(id).await.map_err(store_failure)? {
        Some(request) => Ok(Json(request)),
        None => Err(store_failure(StoreError::NotFound { collection: "requests", id: id.0 })),
    }
}

async fn create_request(
    State(state): State<ApiState>,
    payload: Result<Json<RequestFields>, JsonRejection>,
) -> ApiResult<Request> {
    let fields = accept_fields(payload)?;
    let created = state.requests.create(fields).await.map_err(store_failure)?;
    info!(
        event_name = "server.request.created",
        request_id = %created.id,
        "request created via api"
    );
    Ok(Json(created))
}

async fn update_request(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    payload: Result<Json<RequestFields>, JsonRejection>,
) -> ApiResult<Request> {
    let fields = accept_fields(payload)?;
    let updated = state.requests.update(RequestId(id), fields).await.map_err(store_failure)?;
    info!(event_name = "server.request.updated", request_id = id, "request updated via api");
    Ok(Json(updated))
}

async fn delete_request(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<DeleteResponse> {
    let id = RequestId(id);
    state.requests.delete(id).await.map_err(store_failure)?;
    info!(event_name = "server.request.deleted", request_id = %id, "request deleted via api");
    Ok(Json(DeleteResponse { success: true, id, message: format!("Request {id} deleted") }))
}

async fn request_metrics(State(state): State<ApiState>) -> ApiResult<RequestMetrics> {
    let requests = state.requests.list_all().await.map_err(store_failure)?;
    Ok(Json(aggregate::metrics(&requests, Utc::now())))
}

async fn request_timeline(State(state): State<ApiState>) -> ApiResult<TimelineReport> {
    let requests = state.requests.list_all().await.map_err(store_failure)?;
    Ok(Json(aggregate::timeline(&requests)))
}

async fn generate_form_data(State(state): State<ApiState>) -> ApiResult<Value> {
    let Some(generator) = state.generator.as_deref() else {
        return Err(generate_failure(GenerateError::Disabled));
    };

    let products = state.reference.products().await.map_err(store_failure)?;
    let cost_centers = state.reference.cost_centers().await.map_err(store_failure)?;
    let selection = PromptSelection::pick(&mut rand::thread_rng(), &products, &cost_centers)
        .map_err(generate_failure)?;

    generate_draft(generator, &selection).await.map(Json).map_err(generate_failure)
}

/// Body decode failures and rule violations both leave as a 400 `ApiError`.
fn accept_fields(
    payload: Result<Json<RequestFields>, JsonRejection>,
) -> Result<RequestFields, (StatusCode, Json<ApiError>)> {
    let correlation_id = Uuid::new_v4().to_string();
    let fields = match payload {
        Ok(Json(fields)) => fields,
        Err(rejection) => {
            let interface =
                InterfaceError::BadRequest { message: rejection.body_text(), correlation_id };
            warn!(
                event_name = "server.request.unreadable",
                correlation_id = interface.correlation_id(),
                error = %interface,
                "request body rejected"
            );
            return Err(reject(interface));
        }
    };

    if let Err(error) = fields.validate() {
        let interface = ApplicationError::from(error).into_interface(correlation_id);
        warn!(
            event_name = "server.request.invalid",
            correlation_id = interface.correlation_id(),
            error = %interface,
            "request fields rejected"
        );
        return Err(reject(interface));
    }
    Ok(fields)
}

fn store_failure(error: StoreError) -> (StatusCode, Json<ApiError>) {
    let correlation_id = Uuid::new_v4().to_string();
    let interface = ApplicationError::from(error).into_interface(correlation_id);
    match &interface {
        InterfaceError::NotFound { message, .. } => {
            warn!(
                event_name = "server.request.not_found",
                correlation_id = interface.correlation_id(),
                detail = %message,
                "record not found"
            );
        }
        other => {
            error!(
                event_name = "server.store.failed",
                correlation_id = other.correlation_id(),
                error = %other,
                "store operation failed"
            );
        }
    }
    reject(interface)
}

fn generate_failure(error: GenerateError) -> (StatusCode, Json<ApiError>) {
    let interface = error.into_interface(Uuid::new_v4().to_string());
    warn!(
        event_name = "server.generate.failed",
        correlation_id = interface.correlation_id(),
        error = %interface,
        "draft generation failed"
    );
    reject(interface)
}

pub fn status_for(error: &InterfaceError) -> StatusCode {
    match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
        InterfaceError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(error: InterfaceError) -> (StatusCode, Json<ApiError>) {
    let details = match &error {
        InterfaceError::BadRequest { message, .. }
        | InterfaceError::NotFound { message, .. }
        | InterfaceError::BadGateway { message, .. }
        | InterfaceError::ServiceUnavailable { message, .. }
        | InterfaceError::Internal { message, .. } => message.clone(),
    };

    (
        status_for(&error),
        Json(ApiError {
            success: false,
            error: error.user_message().to_string(),
            details,
            correlation_id: error.correlation_id().to_string(),
        }),
    )
}
