//! # API REST
//!
//! REST API for the prescription firewall.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! Uses `api-shared` for request/response types and API-key checks. The router is built by
//! [`router`]; the workspace's `rxfw-run` binary binds and serves it.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::auth::{validate_api_key, AuthError, API_KEY_HEADER};
use api_shared::health::SERVICE_NAME;
use api_shared::{
    analyze_bulk, AnalysisRes, AnalyzeReq, ApiInfoRes, BulkAnalyzeItem, BulkErrorRes,
    ContraindicationRuleRes, ErrorRes, HealthRes, HealthService, LayerRes, PatientProfileRes,
    PrescriberProfileRes, ReloadRes, SafetyTablesRes, StatsRes,
};
use rxfw_core::PrescriptionFirewall;

/// Application state shared across REST handlers.
///
/// The firewall is shared behind an `Arc`; the API key is resolved at startup.
#[derive(Clone)]
pub struct AppState {
    pub firewall: Arc<PrescriptionFirewall>,
    pub api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(firewall: Arc<PrescriptionFirewall>, api_key: Option<String>) -> Self {
        Self {
            firewall,
            api_key: api_key.filter(|k| !k.is_empty()).map(Arc::from),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        root,
        health,
        analyze_prescription,
        bulk_analyze,
        get_patient,
        get_prescriber,
        stats,
        drugs,
        admin_reload,
    ),
    components(schemas(
        AnalyzeReq,
        AnalysisRes,
        LayerRes,
        BulkAnalyzeItem,
        BulkErrorRes,
        PatientProfileRes,
        PrescriberProfileRes,
        StatsRes,
        SafetyTablesRes,
        ContraindicationRuleRes,
        ReloadRes,
        HealthRes,
        ApiInfoRes,
        ErrorRes,
    ))
)]
pub struct ApiDoc;

type ApiError = (StatusCode, Json<ErrorRes>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorRes {
            error: error.into(),
            status_code: status.as_u16(),
        }),
    )
}

/// Build the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/analyze-prescription", post(analyze_prescription))
        .route("/bulk-analyze", post(bulk_analyze))
        .route("/patients/:id", get(get_patient))
        .route("/prescribers/:id", get(get_prescriber))
        .route("/stats", get(stats))
        .route("/drugs", get(drugs))
        .route("/admin/reload", post(admin_reload))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "API information", body = ApiInfoRes)
    )
)]
/// API information and the list of available endpoints
#[axum::debug_handler]
async fn root(State(_state): State<AppState>) -> Json<ApiInfoRes> {
    let endpoints = [
        ("POST /analyze-prescription", "Analyse a single prescription"),
        ("POST /bulk-analyze", "Analyse a list of prescriptions"),
        ("GET /patients/{id}", "Patient profile"),
        ("GET /prescribers/{id}", "Prescriber profile"),
        ("GET /stats", "Analysis statistics"),
        ("GET /drugs", "Safety tables"),
        ("POST /admin/reload", "Reload reference data (requires x-api-key)"),
        ("GET /health", "Health check"),
        ("GET /swagger-ui", "Interactive API documentation"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect::<BTreeMap<_, _>>();

    Json(ApiInfoRes {
        name: SERVICE_NAME.into(),
        version: env!("CARGO_PKG_VERSION").into(),
        description: "Four-layer prescription safety analysis".into(),
        endpoints,
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/analyze-prescription",
    request_body = AnalyzeReq,
    responses(
        (status = 200, description = "Prescription verdict", body = AnalysisRes),
        (status = 400, description = "Invalid request", body = ErrorRes)
    )
)]
/// Run the four-layer analysis on one prescription
///
/// A denied prescription is still a successful analysis and is returned with `200 OK`.
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - the body is not valid JSON for `AnalyzeReq`,
/// - an identifier or the drug name is blank, or
/// - the dose is not greater than zero.
#[axum::debug_handler]
async fn analyze_prescription(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeReq>, JsonRejection>,
) -> Result<Json<AnalysisRes>, ApiError> {
    let Json(req) = body.map_err(|e| {
        tracing::warn!("Rejected analysis body: {}", e.body_text());
        api_error(StatusCode::BAD_REQUEST, e.body_text())
    })?;
    let request = req.validate().map_err(|e| {
        tracing::warn!("Invalid analysis request: {}", e);
        api_error(StatusCode::BAD_REQUEST, e.to_string())
    })?;

    let verdict = state.firewall.analyze(
        &request.prescriber_id,
        &request.patient_id,
        &request.drug,
        request.dose,
    );
    Ok(Json(verdict.into()))
}

#[utoipa::path(
    post,
    path = "/bulk-analyze",
    request_body = Vec<AnalyzeReq>,
    responses(
        (status = 200, description = "One entry per request, in order", body = Vec<BulkAnalyzeItem>),
        (status = 400, description = "Body is not a list of requests", body = ErrorRes)
    )
)]
/// Analyse a list of prescriptions
///
/// Items failing validation are reported in place as `{error, request}` and do not stop the
/// remaining items from being analysed.
#[axum::debug_handler]
async fn bulk_analyze(
    State(state): State<AppState>,
    body: Result<Json<Vec<AnalyzeReq>>, JsonRejection>,
) -> Result<Json<Vec<BulkAnalyzeItem>>, ApiError> {
    let Json(requests) = body.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;
    Ok(Json(analyze_bulk(&state.firewall, requests)))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient identifier")),
    responses(
        (status = 200, description = "Patient profile", body = PatientProfileRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PatientProfileRes>, ApiError> {
    state
        .firewall
        .patient_profile(&id)
        .map(|p| Json(p.into()))
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Patient {id} not found")))
}

#[utoipa::path(
    get,
    path = "/prescribers/{id}",
    params(("id" = String, Path, description = "Prescriber identifier")),
    responses(
        (status = 200, description = "Prescriber profile", body = PrescriberProfileRes),
        (status = 404, description = "Prescriber not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_prescriber(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PrescriberProfileRes>, ApiError> {
    state
        .firewall
        .prescriber_profile(&id)
        .map(|p| Json(p.into()))
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Prescriber {id} not found")))
}

#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Analysis statistics", body = StatsRes)
    )
)]
#[axum::debug_handler]
async fn stats(State(state): State<AppState>) -> Json<StatsRes> {
    Json(state.firewall.statistics().into())
}

#[utoipa::path(
    get,
    path = "/drugs",
    responses(
        (status = 200, description = "Illegal substances, dose ceilings and contraindication rules", body = SafetyTablesRes)
    )
)]
#[axum::debug_handler]
async fn drugs(State(state): State<AppState>) -> Json<SafetyTablesRes> {
    Json(SafetyTablesRes::from(state.firewall.safety_tables()))
}

#[utoipa::path(
    post,
    path = "/admin/reload",
    params(("x-api-key" = String, Header, description = "Administrative API key")),
    responses(
        (status = 200, description = "Reference data reloaded", body = ReloadRes),
        (status = 401, description = "Missing or invalid API key", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Reload both reference tables from their configured files
///
/// Analyses already in flight keep the snapshot they started with.
///
/// # Errors
/// Returns `401 Unauthorized` if the `x-api-key` header is missing or wrong, or no key is
/// configured. Returns `500 Internal Server Error` if the firewall has no file source.
#[axum::debug_handler]
async fn admin_reload(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ReloadRes>, ApiError> {
    let provided = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    validate_api_key(state.api_key.as_deref(), provided).map_err(|e| {
        if e == AuthError::NotConfigured {
            tracing::error!("Reload requested but API_KEY is not configured");
        }
        api_error(StatusCode::UNAUTHORIZED, e.to_string())
    })?;

    let firewall = state.firewall.clone();
    match tokio::task::spawn_blocking(move || firewall.reload()).await {
        Ok(Ok(summary)) => Ok(Json(summary.into())),
        Ok(Err(e)) => {
            tracing::error!("Reload error: {:?}", e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
        Err(e) => {
            tracing::error!("Reload task failed: {:?}", e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
    }
}
