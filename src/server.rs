//! Web server module for the exporter.
//!
//! Serves the latest published snapshot in the Prometheus text format, plus
//! a landing page and a liveness probe.

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use crate::config::DEFAULT_METRICS_PATH;
use crate::snapshot::{Snapshot, SnapshotSlot};

/// Body of the metrics response before the first cycle completes.
pub const NOT_INITIALIZED: &str = "Exporter not yet initialized";

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub slot: SnapshotSlot,
    pub metrics_path: String,
}

impl AppState {
    pub fn new(slot: SnapshotSlot) -> Self {
        Self {
            slot,
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
        }
    }

    pub fn with_metrics_path(mut self, path: impl Into<String>) -> Self {
        self.metrics_path = path.into();
        self
    }
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    initialized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_cycle: Option<LastCycle>,
}

/// Summary of the snapshot currently served.
#[derive(Serialize)]
struct LastCycle {
    cycle: u64,
    completed_at: DateTime<Utc>,
    failed_collectors: Vec<&'static str>,
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let metrics_path = state.metrics_path.clone();
    let app_state = Arc::new(state);
    Router::new()
        .route("/", get(landing_handler))
        .route("/healthz", get(healthz_handler))
        .route(&metrics_path, get(metrics_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .with_state(app_state)
}

/// Landing page linking to the metrics.
async fn landing_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(format!(
        "<html>\n\
         <head><title>Dependency-Track Exporter</title></head>\n\
         <body>\n\
         <h1>Dependency-Track Exporter</h1>\n\
         <p><a href=\"{path}\">Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        path = state.metrics_path
    ))
}

/// Liveness probe, reporting the age of the served snapshot.
async fn healthz_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let last_cycle = state.slot.current().await.map(|snapshot| LastCycle {
        cycle: snapshot.cycle(),
        completed_at: snapshot.completed_at(),
        failed_collectors: snapshot.failed_collectors().to_vec(),
    });
    Json(HealthResponse {
        status: "ok".to_string(),
        initialized: last_cycle.is_some(),
        last_cycle,
    })
}

/// Prometheus scrape endpoint.
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    let Some(snapshot) = state.slot.current().await else {
        return (StatusCode::SERVICE_UNAVAILABLE, NOT_INITIALIZED).into_response();
    };

    match snapshot.render() {
        Ok(body) => ([(header::CONTENT_TYPE, Snapshot::content_type())], body).into_response(),
        Err(err) => {
            tracing::error!(error = %err, cycle = snapshot.cycle(), "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", err)).into_response()
        }
    }
}
