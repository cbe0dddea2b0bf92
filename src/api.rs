use crate::analysis_service::{AtlasError, SharedAnalyzer};
use crate::config::RateLimitConfig;
use crate::metrics::{AnalysisError, MetricKind, MetricReport, UnknownMetric};
use axum::{
    Json, Router,
    extract::{FromRef, Path, State},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{debug, error, info, instrument, warn};

#[derive(Clone)]
pub struct AppState {
    analyzer: SharedAnalyzer,
}

impl AppState {
    pub fn new(analyzer: SharedAnalyzer) -> Self {
        Self { analyzer }
    }
}

impl FromRef<AppState> for SharedAnalyzer {
    fn from_ref(app_state: &AppState) -> SharedAnalyzer {
        app_state.analyzer.clone()
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    UnknownMetric(#[from] UnknownMetric),

    #[error("{kind} analysis failed: {source}")]
    Metric {
        kind: MetricKind,
        #[source]
        source: AtlasError,
    },
}

impl ApiError {
    pub fn client_code(&self) -> &'static str {
        match self {
            ApiError::UnknownMetric(_) => "UNKNOWN_METRIC",
            ApiError::Metric { source, .. } => match source {
                AtlasError::Fetch(_) | AtlasError::Analysis(AnalysisError::EmptySeries) => "FETCH_FAILED",
                AtlasError::Analysis(AnalysisError::InsufficientData { .. }) => "INSUFFICIENT_DATA",
                AtlasError::Analysis(_) => "ANALYSIS_FAILED",
            },
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::UnknownMetric(_) => StatusCode::NOT_FOUND,
            ApiError::Metric { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to callers. Upstream details stay in the logs.
    fn client_message(&self) -> String {
        match self {
            ApiError::UnknownMetric(e) => e.to_string(),
            ApiError::Metric { kind, source } => match source {
                AtlasError::Analysis(AnalysisError::InsufficientData { .. }) => {
                    kind.insufficient_data_message()
                }
                AtlasError::Analysis(AnalysisError::NonFiniteValue | AnalysisError::UnmappedRisk(_)) => {
                    format!("Failed to analyse {} data", kind.label().to_lowercase())
                }
                _ => kind.fetch_failure_message(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, code = self.client_code(), "Request failed");
        } else {
            debug!(error = %self, "Rejected request");
        }

        let body = Json(json!({
            "error": self.client_message(),
            "code": self.client_code(),
        }));
        (status, body).into_response()
    }
}

#[instrument(skip(analyzer))]
pub async fn get_metric_handler(
    State(analyzer): State<SharedAnalyzer>,
    Path(metric): Path<String>,
) -> Result<Json<MetricReport>, ApiError> {
    debug!("Received metric request");

    let kind: MetricKind = metric.parse()?;
    let report = analyzer
        .analyze(kind)
        .await
        .map_err(|source| ApiError::Metric { kind, source })?;

    info!(metric = %kind, value = report.value, risk = report.risk, "Returning metric report");
    Ok(Json(report))
}

/// Browser clients call the service cross-origin. An empty origin list allows
/// any origin.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins = allowed_origins.iter().filter_map(|origin| match origin.parse::<HeaderValue>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(%origin, error = %e, "Ignoring invalid CORS origin");
            None
        }
    });
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Per-peer-IP token bucket. Returns `None` when either limit is zero.
/// The router must be served with `into_make_service_with_connect_info`.
pub fn with_rate_limit(router: Router, limits: &RateLimitConfig) -> Option<Router> {
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(limits.replenish_secs)
        .burst_size(limits.burst)
        .finish()?;

    Some(router.layer(GovernorLayer::new(Arc::new(governor_conf))))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/atlas/{metric}", get(get_metric_handler))
        .with_state(state)
}
