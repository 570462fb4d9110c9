use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use client_core::{token_hint, BackendClient};
use serde_json::Value;
use shared::{
    domain::{
        Checklist, ChecklistGroup, ChecklistId, ChecklistItem, GroupId, Machine, MachineId,
        MachineType, MachineTypeId, PossibleState, ReportId,
    },
    error::{ApiError, ErrorCode},
    protocol::{PdfArchived, ReportFilters, ReportForm, ReportPage, SubmittedReport},
};
use storage::{prepare_database_url, sanitize_filename, PdfArchive, Storage};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::ApiContext;
use app_state::AppState;
use config::{load_settings, DEFAULT_DATABASE_URL};

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    let database_url = prepare_database_url(&settings.database_url, DEFAULT_DATABASE_URL)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let backend = BackendClient::new(&settings.backend_url)?;
    info!(backend = %backend.base_url(), pdf_dir = %settings.pdf_dir.display(), "gateway configured");

    let api = ApiContext {
        archive: PdfArchive::new(&settings.pdf_dir, storage.clone()),
        backend,
        storage,
    };
    let app = build_router(Arc::new(AppState {
        api,
        max_body_bytes: settings.max_body_bytes,
    }));

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "gateway listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let max_body_bytes = state.max_body_bytes;
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/machine-types", get(http_machine_types))
        .route("/api/machines/by-type/:id", get(http_machines_by_type))
        .route("/api/machines/:id", get(http_machine))
        .route("/api/checklists/by-machine-type/:id", get(http_checklists_by_type))
        .route("/api/checklists/:id/groups", get(http_checklist_groups))
        .route("/api/checklists/groups/:id/items", get(http_group_items))
        .route("/api/states/by-machine-type/:id", get(http_states_by_type))
        .route("/api/reports", post(http_submit_report))
        .route("/api/reports/list", get(http_list_reports))
        .route("/api/reports/:id", get(http_report_detail))
        .route("/api/reports/:id/generate-pdf", post(http_generate_pdf))
        .route("/api/reports/:id/pdf", get(http_report_pdf))
        .route("/api/reports/:id/pdf-file", get(http_archived_pdf))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Upstream => StatusCode::BAD_GATEWAY,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    (status_for(err.code), Json(err))
}

/// Extracts the caller's token. Requests without one never reach the backend.
fn bearer_token(headers: &HeaderMap) -> ApiResult<String> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| reject(ApiError::unauthorized("missing bearer token")))?;
    debug!(token = %token_hint(token), "request authorized by bearer token");
    Ok(token.to_string())
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.api.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            error!(%error, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

async fn http_machine_types(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<MachineType>>> {
    let token = bearer_token(&headers)?;
    api::machine_types(&state.api, &token)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_machines_by_type(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MachineTypeId>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Machine>>> {
    let token = bearer_token(&headers)?;
    api::machines_by_type(&state.api, &token, &id)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_machine(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MachineId>,
    headers: HeaderMap,
) -> ApiResult<Json<Machine>> {
    let token = bearer_token(&headers)?;
    api::machine(&state.api, &token, &id)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_checklists_by_type(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MachineTypeId>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Checklist>>> {
    let token = bearer_token(&headers)?;
    api::checklists_by_type(&state.api, &token, &id)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_checklist_groups(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ChecklistId>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<ChecklistGroup>>> {
    let token = bearer_token(&headers)?;
    api::checklist_groups(&state.api, &token, &id)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_group_items(
    State(state): State<Arc<AppState>>,
    Path(id): Path<GroupId>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<ChecklistItem>>> {
    let token = bearer_token(&headers)?;
    api::group_items(&state.api, &token, &id)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_states_by_type(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MachineTypeId>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<PossibleState>>> {
    let token = bearer_token(&headers)?;
    api::states_by_type(&state.api, &token, &id)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_submit_report(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(form): Json<ReportForm>,
) -> ApiResult<Json<SubmittedReport>> {
    let token = bearer_token(&headers)?;
    api::submit_report(&state.api, &token, &form)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_list_reports(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<ReportFilters>,
    headers: HeaderMap,
) -> ApiResult<Json<ReportPage>> {
    let token = bearer_token(&headers)?;
    api::list_reports(&state.api, &token, &filters)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_report_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ReportId>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let token = bearer_token(&headers)?;
    api::report_detail(&state.api, &token, &id)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_generate_pdf(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ReportId>,
    headers: HeaderMap,
) -> ApiResult<Json<PdfArchived>> {
    let token = bearer_token(&headers)?;
    api::generate_pdf(&state.api, &token, &id)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_report_pdf(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ReportId>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let token = bearer_token(&headers)?;
    let document = api::fetch_pdf(&state.api, &token, &id)
        .await
        .map_err(reject)?;
    let filename = format!("{}.pdf", sanitize_filename(id.as_str()));
    Ok((
        StatusCode::OK,
        pdf_headers("attachment", &filename, None),
        document.bytes,
    ))
}

async fn http_archived_pdf(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ReportId>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    bearer_token(&headers)?;
    let (stored, bytes) = api::archived_pdf(&state.api, &id).await.map_err(reject)?;
    Ok((
        StatusCode::OK,
        pdf_headers("inline", &stored.filename, Some("public, max-age=31536000")),
        bytes,
    ))
}

fn pdf_headers(disposition: &str, filename: &str, cache_control: Option<&'static str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    if let Ok(value) = HeaderValue::from_str(&format!("{disposition}; filename=\"{filename}\"")) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    if let Some(cache_control) = cache_control {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));
    }
    headers
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
