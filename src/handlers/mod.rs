/// HTTP request handlers
use crate::coordinator::ViewCoordinator;
use crate::domain::{
    AnalysisKind, CacheStats, CelestialBody, ExportFormat, ExportSubject, Health, ViewSnapshot,
};
use crate::errors::ApiError;
use crate::services::DataFacade;
use axum::{
    extract::{Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub facade: Arc<DataFacade>,
    pub coordinator: Arc<ViewCoordinator>,
}

/// Successful response wrapper
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { ok: true, data }
    }
}

#[derive(Deserialize)]
pub struct BodyRequest {
    pub body: String,
}

#[derive(Deserialize)]
pub struct ImageryRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Deserialize)]
pub struct AnalysisRequest {
    pub kind: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize)]
pub struct ExportParams {
    pub format: String,
    #[serde(default)]
    pub subject: Option<String>,
}

/// Health check handler
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        now: Utc::now(),
    })
}

/// Current view state
pub async fn get_state(State(state): State<AppState>) -> Json<SuccessResponse<ViewSnapshot>> {
    Json(SuccessResponse::new(state.coordinator.snapshot().await))
}

/// Switch the active celestial body
pub async fn set_body(
    State(state): State<AppState>,
    Json(req): Json<BodyRequest>,
) -> Result<Json<SuccessResponse<ViewSnapshot>>, ApiError> {
    let body: CelestialBody = req.body.parse()?;
    let snapshot = state.coordinator.set_body(body).await;
    Ok(Json(SuccessResponse::new(snapshot)))
}

/// Acquire imagery for the active body
pub async fn acquire_imagery(
    State(state): State<AppState>,
    Json(req): Json<ImageryRequest>,
) -> Result<Json<SuccessResponse<ViewSnapshot>>, ApiError> {
    let date = req.date.as_deref().map(parse_date).transpose()?;
    let source = req.source.as_deref().unwrap_or("nasa");

    let snapshot = state
        .coordinator
        .acquire(req.latitude, req.longitude, source, date)
        .await?;
    Ok(Json(SuccessResponse::new(snapshot)))
}

/// Run an analysis at a coordinate
pub async fn run_analysis(
    State(state): State<AppState>,
    Json(req): Json<AnalysisRequest>,
) -> Result<Json<SuccessResponse<ViewSnapshot>>, ApiError> {
    let kind: AnalysisKind = req.kind.parse()?;
    let snapshot = state
        .coordinator
        .run_analysis(kind, req.latitude, req.longitude)
        .await?;
    Ok(Json(SuccessResponse::new(snapshot)))
}

/// Download the displayed imagery or analysis results
pub async fn export_current(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> Result<Response, ApiError> {
    let format: ExportFormat = params.format.parse()?;
    let subject: ExportSubject = match params.subject.as_deref() {
        Some(raw) => raw.parse()?,
        None => ExportSubject::default(),
    };

    let payload = state.coordinator.export_current(format, subject).await?;
    let headers = [
        (CONTENT_TYPE, payload.media_type.to_string()),
        (
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", payload.file_name),
        ),
    ];
    Ok((headers, payload.bytes).into_response())
}

/// Cache occupancy
pub async fn cache_stats(State(state): State<AppState>) -> Json<SuccessResponse<CacheStats>> {
    Json(SuccessResponse::new(state.facade.cache_stats().await))
}

/// Drop every cached response
pub async fn clear_cache(
    State(state): State<AppState>,
) -> Json<SuccessResponse<serde_json::Value>> {
    let dropped = state.facade.clear_cache().await;
    Json(SuccessResponse::new(serde_json::json!({ "dropped": dropped })))
}

fn parse_date(s: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| ApiError::Validation(format!("date '{}' is not YYYY-MM-DD", s)))
}
