//! REST API handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use varlab_core::{
    ExperimentError, Metric, ResultsQuery, TimeWindow, Variant, VariantFormat, VariantId,
};

use crate::AppState;

/// Error body returned by every failing route
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Map engine errors to a status and a stable error code.
///
/// Only `STORAGE_UNAVAILABLE` is worth retrying.
fn error_response(err: ExperimentError) -> Response {
    let (status, code) = match &err {
        ExperimentError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
        ExperimentError::StorageUnavailable(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE")
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: code.into(),
        }),
    )
        .into_response()
}

/// Malformed paths, query strings and bodies are input errors too.
fn rejection_response(body_text: String) -> Response {
    error_response(ExperimentError::invalid(body_text))
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the server
    pub status: String,
    /// Server version
    pub version: String,
    /// Seconds since server started
    pub uptime_seconds: i64,
    /// Version of the deployed variant catalog
    pub catalog_version: u32,
    /// Fingerprint of the catalog order
    pub catalog_fingerprint: String,
}

/// Health check endpoint
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let catalog = state.service.catalog();

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        catalog_version: catalog.version(),
        catalog_fingerprint: catalog.fingerprint(),
    })
}

/// Response for listing variants
#[derive(Debug, Serialize, Deserialize)]
pub struct VariantListResponse {
    pub version: u32,
    pub fingerprint: String,
    /// Variants in bucket order
    pub variants: Vec<Variant>,
}

/// GET /api/variants
pub async fn list_variants(State(state): State<Arc<AppState>>) -> Json<VariantListResponse> {
    let catalog = state.service.catalog();

    Json(VariantListResponse {
        version: catalog.version(),
        fingerprint: catalog.fingerprint(),
        variants: state.service.list_variants().to_vec(),
    })
}

/// A user's assigned variant
#[derive(Debug, Serialize, Deserialize)]
pub struct VariantResponse {
    pub user_id: i64,
    pub variant_id: VariantId,
    pub name: String,
    pub description: String,
    pub format: VariantFormat,
}

/// GET /api/variants/:user_id
pub async fn get_variant(
    State(state): State<Arc<AppState>>,
    user_id: Result<Path<i64>, PathRejection>,
) -> impl IntoResponse {
    let Path(user_id) = match user_id {
        Ok(path) => path,
        Err(rejection) => return rejection_response(rejection.body_text()),
    };

    match state.service.get_variant(user_id) {
        Ok(variant) => Json(VariantResponse {
            user_id,
            variant_id: variant.id,
            name: variant.name,
            description: variant.description,
            format: variant.format,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// Body of POST /api/events
#[derive(Debug, Serialize, Deserialize)]
pub struct TrackRequest {
    pub user_id: i64,
    pub subject_id: i64,
    /// `view`, `click` or `apply`
    pub event_type: String,
}

/// POST /api/events
pub async fn track_event(
    State(state): State<Arc<AppState>>,
    req: Result<Json<TrackRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = match req {
        Ok(json) => json,
        Err(rejection) => return rejection_response(rejection.body_text()),
    };

    match state
        .service
        .track_event(req.user_id, req.subject_id, &req.event_type)
        .await
    {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => error_response(e),
    }
}

/// Query params for GET /api/results
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ResultsParams {
    pub a: String,
    pub b: String,
    /// Inclusive window start (RFC 3339)
    pub start: Option<DateTime<Utc>>,
    /// Exclusive window end (RFC 3339)
    pub end: Option<DateTime<Utc>>,
    /// Confidence level in percent
    pub confidence: Option<u32>,
    /// `click_through` (default) or `conversion`
    pub metric: Option<String>,
    /// Minimum detectable effect override
    pub effect: Option<f64>,
    pub power: Option<f64>,
    /// Assumed baseline rate override
    pub baseline: Option<f64>,
}

impl TryFrom<ResultsParams> for ResultsQuery {
    type Error = ExperimentError;

    fn try_from(p: ResultsParams) -> Result<Self, Self::Error> {
        let window = TimeWindow::new(p.start, p.end)?;
        let metric = match p.metric.as_deref() {
            Some(m) => Metric::parse(m)?,
            None => Metric::default(),
        };

        let mut query = ResultsQuery::new(p.a.as_str(), p.b.as_str())
            .with_window(window)
            .with_metric(metric);
        query.confidence = p.confidence;
        query.minimum_detectable_effect = p.effect;
        query.power = p.power;
        query.baseline_rate = p.baseline;
        Ok(query)
    }
}

/// GET /api/results
pub async fn get_results(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ResultsParams>, QueryRejection>,
) -> impl IntoResponse {
    let Query(params) = match params {
        Ok(query) => query,
        Err(rejection) => return rejection_response(rejection.body_text()),
    };
    let query = match ResultsQuery::try_from(params) {
        Ok(query) => query,
        Err(e) => return error_response(e),
    };

    match state.service.get_results(&query).await {
        Ok(results) => Json(results).into_response(),
        Err(e) => error_response(e),
    }
}
