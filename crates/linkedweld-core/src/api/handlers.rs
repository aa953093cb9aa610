//! API handlers for the HTTP REST API

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, Method, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use super::extract::{
    created, ok, ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, OptionalJson,
};
use crate::alerting::{budget_summary, AlertEvaluator, SweepReport};
use crate::dashboard;
use crate::db::Store;
use crate::error::{Error, Result};
use crate::models::{
    Alert, BudgetSummary, Candidate, CandidateInput, CandidateUpdate, DashboardStats, Document,
    DocumentFilter, DocumentInput, DocumentUpdate, Expense, ExpenseFilter, ExpenseInput,
    ExpenseUpdate, HireOutcome, HireRequest, Notification, NotificationQuery, PipelineStage,
    Project, ProjectFilter, ProjectInput, ProjectUpdate, StageChange, Worker, WorkerFilter,
    WorkerInput, WorkerUpdate,
};
use crate::recruitment;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Row store
    pub store: Arc<dyn Store>,
    /// Alert evaluator shared with the sweep loop
    pub evaluator: Arc<AlertEvaluator>,
    /// Prometheus handle when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
}

/// Identifier of a deleted record
#[derive(Debug, Serialize)]
pub struct Deleted {
    /// Identifier of the deleted record
    pub id: Uuid,
}

fn deleted(found: bool, entity: &str, id: Uuid) -> ApiResult<Deleted> {
    if !found {
        return Err(Error::not_found(entity, id));
    }
    ok(Deleted { id })
}

// --- Fallbacks ---

/// Unknown paths
pub async fn route_not_found(uri: Uri) -> Error {
    Error::not_found("Route", uri.path())
}

/// Re-wrap axum's bare 405 in the error envelope, keeping its `Allow` header
pub async fn method_not_allowed(method: Method, request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut enveloped = Error::MethodNotAllowed(method.to_string()).into_response();
    if let Some(allow) = allow {
        enveloped.headers_mut().insert(header::ALLOW, allow);
    }
    enveloped
}

// --- Health & metrics ---

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// "ok" or "degraded"
    pub status: String,
    /// Crate version
    pub version: String,
    /// Store health, or the error it reported
    pub store: String,
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> Response {
    let (status, store) = match state.store.health_check().await {
        Ok(()) => (StatusCode::OK, "ok".to_string()),
        Err(e) => {
            warn!(error = %e, "Store health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
    };

    let body = HealthResponse {
        status: if status.is_success() { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store,
    };

    (
        status,
        Json(ApiResponse {
            success: status.is_success(),
            data: body,
        }),
    )
        .into_response()
}

/// Prometheus exposition
pub async fn metrics(State(state): State<AppState>) -> Result<Response> {
    let handle = state
        .metrics
        .as_ref()
        .ok_or_else(|| Error::not_found("Metrics exporter", "prometheus"))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response())
}

// --- Workers ---

/// List workers
pub async fn list_workers(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<WorkerFilter>,
) -> ApiResult<Vec<Worker>> {
    ok(state.store.list_workers(&filter).await?)
}

/// Create a worker
pub async fn create_worker(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<WorkerInput>,
) -> Result<impl IntoResponse> {
    if let Some(project_id) = input.project_id {
        state.store.require_project(project_id).await?;
    }

    let worker = input.into_worker()?;
    state.store.insert_worker(&worker).await?;

    info!(worker_id = %worker.id, "Worker created");
    created(worker)
}

/// Get a worker
pub async fn get_worker(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Worker> {
    ok(state.store.require_worker(id).await?)
}

/// Update a worker
pub async fn update_worker(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<WorkerUpdate>,
) -> ApiResult<Worker> {
    let mut worker = state.store.require_worker(id).await?;
    if let Some(project_id) = update.project_id.filter(|_| !update.clear_project) {
        state.store.require_project(project_id).await?;
    }

    update.apply(&mut worker)?;
    state.store.update_worker(&worker).await?;
    ok(worker)
}

/// Delete a worker and their documents
pub async fn delete_worker(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    let found = state.store.delete_worker(id).await?;
    if found {
        info!(worker_id = %id, "Worker deleted");
    }
    deleted(found, "Worker", id)
}

/// List one worker's documents
pub async fn list_worker_documents(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<Document>> {
    state.store.require_worker(id).await?;
    let filter = DocumentFilter {
        worker_id: Some(id),
        ..Default::default()
    };
    ok(state
        .store
        .list_documents(&filter, Utc::now().date_naive())
        .await?)
}

/// Add a document to a worker
pub async fn create_document(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<DocumentInput>,
) -> Result<impl IntoResponse> {
    state.store.require_worker(id).await?;

    let document = input.into_document(id)?;
    state.store.insert_document(&document).await?;

    info!(document_id = %document.id, worker_id = %id, "Document added");
    created(document)
}

// --- Documents ---

/// List documents
pub async fn list_documents(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<DocumentFilter>,
) -> ApiResult<Vec<Document>> {
    ok(state
        .store
        .list_documents(&filter, Utc::now().date_naive())
        .await?)
}

/// Get a document
pub async fn get_document(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Document> {
    ok(state.store.require_document(id).await?)
}

/// Update a document
pub async fn update_document(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<DocumentUpdate>,
) -> ApiResult<Document> {
    let mut document = state.store.require_document(id).await?;
    update.apply(&mut document)?;
    state.store.update_document(&document).await?;
    ok(document)
}

/// Delete a document
pub async fn delete_document(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    let found = state.store.delete_document(id).await?;
    deleted(found, "Document", id)
}

// --- Projects ---

/// List projects
pub async fn list_projects(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ProjectFilter>,
) -> ApiResult<Vec<Project>> {
    ok(state.store.list_projects(&filter).await?)
}

/// Create a project
pub async fn create_project(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ProjectInput>,
) -> Result<impl IntoResponse> {
    let project = input.into_project()?;
    state.store.insert_project(&project).await?;

    info!(project_id = %project.id, name = %project.name, "Project created");
    created(project)
}

/// Get a project
pub async fn get_project(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Project> {
    ok(state.store.require_project(id).await?)
}

/// Update a project
pub async fn update_project(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<ProjectUpdate>,
) -> ApiResult<Project> {
    let mut project = state.store.require_project(id).await?;
    update.apply(&mut project)?;
    state.store.update_project(&project).await?;
    ok(project)
}

/// Delete a project with its expenses
pub async fn delete_project(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    let found = state.store.delete_project(id).await?;
    if found {
        info!(project_id = %id, "Project deleted");
    }
    deleted(found, "Project", id)
}

/// Budget summary for a project
pub async fn project_budget(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<BudgetSummary> {
    let project = state.store.require_project(id).await?;
    let spent = state.store.project_spend(id).await?;
    ok(budget_summary(&project, spent, state.evaluator.thresholds()))
}

/// List one project's expenses
pub async fn list_project_expenses(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<Expense>> {
    state.store.require_project(id).await?;
    let filter = ExpenseFilter {
        project_id: Some(id),
        ..Default::default()
    };
    ok(state.store.list_expenses(&filter).await?)
}

/// Book an expense against a project
pub async fn create_expense(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<ExpenseInput>,
) -> Result<impl IntoResponse> {
    state.store.require_project(id).await?;

    let expense = input.into_expense(id)?;
    state.store.insert_expense(&expense).await?;

    info!(expense_id = %expense.id, project_id = %id, amount = expense.amount, "Expense booked");
    created(expense)
}

// --- Expenses ---

/// List expenses
pub async fn list_expenses(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ExpenseFilter>,
) -> ApiResult<Vec<Expense>> {
    ok(state.store.list_expenses(&filter).await?)
}

/// Get an expense
pub async fn get_expense(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Expense> {
    ok(state.store.require_expense(id).await?)
}

/// Update an expense
pub async fn update_expense(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<ExpenseUpdate>,
) -> ApiResult<Expense> {
    let mut expense = state.store.require_expense(id).await?;
    update.apply(&mut expense)?;
    state.store.update_expense(&expense).await?;
    ok(expense)
}

/// Delete an expense
pub async fn delete_expense(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    let found = state.store.delete_expense(id).await?;
    deleted(found, "Expense", id)
}

// --- Recruitment pipeline ---

/// Query parameters for listing candidates
#[derive(Debug, Default, Deserialize)]
pub struct PipelineQuery {
    /// Only candidates at this stage
    pub stage: Option<PipelineStage>,
}

/// List candidates
pub async fn list_candidates(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PipelineQuery>,
) -> ApiResult<Vec<Candidate>> {
    ok(state.store.list_candidates(query.stage).await?)
}

/// Add a candidate
pub async fn create_candidate(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CandidateInput>,
) -> Result<impl IntoResponse> {
    let candidate = input.into_candidate()?;
    state.store.insert_candidate(&candidate).await?;

    info!(candidate_id = %candidate.id, "Candidate added");
    created(candidate)
}

/// Get a candidate
pub async fn get_candidate(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Candidate> {
    ok(state.store.require_candidate(id).await?)
}

/// Update a candidate's details
pub async fn update_candidate(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<CandidateUpdate>,
) -> ApiResult<Candidate> {
    let mut candidate = state.store.require_candidate(id).await?;
    update.apply(&mut candidate)?;
    state.store.update_candidate(&candidate).await?;
    ok(candidate)
}

/// Delete a candidate
pub async fn delete_candidate(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    let found = state.store.delete_candidate(id).await?;
    deleted(found, "Candidate", id)
}

/// Move a candidate to another stage
pub async fn move_candidate_stage(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(change): ApiJson<StageChange>,
) -> ApiResult<Candidate> {
    ok(recruitment::move_stage(state.store.as_ref(), id, change).await?)
}

/// Hire a candidate; the body is optional
pub async fn hire_candidate(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    OptionalJson(body): OptionalJson<HireRequest>,
) -> Result<impl IntoResponse> {
    let request = body.unwrap_or_default();
    let outcome: HireOutcome = recruitment::hire(state.store.as_ref(), id, request).await?;
    created(outcome)
}

// --- Notifications ---

/// List notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<NotificationQuery>,
) -> ApiResult<Vec<Notification>> {
    ok(state.store.list_notifications(query.unread_only).await?)
}

/// Mark one notification read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Value> {
    if !state.store.mark_notification_read(id).await? {
        return Err(Error::not_found("Notification", id));
    }
    ok(json!({ "id": id, "read": true }))
}

/// Mark every notification read
pub async fn mark_all_notifications_read(State(state): State<AppState>) -> ApiResult<Value> {
    let updated = state.store.mark_all_notifications_read().await?;
    ok(json!({ "updated": updated }))
}

/// Delete a notification
pub async fn delete_notification(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    let found = state.store.delete_notification(id).await?;
    deleted(found, "Notification", id)
}

// --- Alerts & dashboard ---

/// Current alerts
pub async fn list_alerts(State(state): State<AppState>) -> ApiResult<Vec<Alert>> {
    ok(state.evaluator.current_alerts().await?)
}

/// Run an alert sweep now
pub async fn sweep_alerts(State(state): State<AppState>) -> ApiResult<SweepReport> {
    ok(state.evaluator.sweep().await?)
}

/// Dashboard statistics
pub async fn get_dashboard(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    ok(dashboard::build_stats(state.store.as_ref(), &state.evaluator).await?)
}
