use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::history::CycleHistory;
use crate::ingest::types::Item;
use crate::ingest::{CycleRequest, CycleSummary, IngestRunner};
use crate::store::ItemStore;

pub const DEFAULT_INTEL_LIMIT: usize = 50;
pub const MAX_INTEL_LIMIT: usize = 200;
const HISTORY_LIMIT: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ItemStore>,
    pub runner: Arc<IngestRunner>,
    pub history: Arc<CycleHistory>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/api/intel", get(intel))
        .route("/api/ingest", post(trigger_ingest))
        .route("/api/ingest/history", get(ingest_history))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct Pong {
    message: &'static str,
}

async fn ping() -> Json<Pong> {
    Json(Pong { message: "pong" })
}

#[derive(Deserialize)]
struct IntelQuery {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize)]
struct IntelOut {
    id: i64,
    source: String,
    title: String,
    url: String,
    published: String,
    summary: String,
}

impl From<Item> for IntelOut {
    fn from(it: Item) -> Self {
        Self {
            id: it.id.0,
            source: it.source,
            title: it.title,
            url: it.url,
            published: it.published_at.to_rfc3339(),
            summary: it.summary,
        }
    }
}

#[derive(Serialize)]
struct IntelResponse {
    intel: Vec<IntelOut>,
}

async fn intel(
    State(state): State<AppState>,
    Query(q): Query<IntelQuery>,
) -> Result<Json<IntelResponse>, (StatusCode, String)> {
    let limit = q
        .limit
        .unwrap_or(DEFAULT_INTEL_LIMIT)
        .clamp(1, MAX_INTEL_LIMIT);
    match state.store.recent(limit).await {
        Ok(items) => Ok(Json(IntelResponse {
            intel: items.into_iter().map(IntelOut::from).collect(),
        })),
        Err(e) => {
            tracing::warn!(error = %e, "reading intel feed failed");
            Err((StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
        }
    }
}

/// On-demand cycle. The body is optional: `{}` / empty runs with profile defaults.
async fn trigger_ingest(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CycleSummary>, (StatusCode, String)> {
    let req: CycleRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CycleRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid ingest request: {e}")))?
    };
    let summary = state.runner.run_cycle(&req).await;
    state.history.push(summary.clone());
    Ok(Json(summary))
}

async fn ingest_history(State(state): State<AppState>) -> Json<Vec<CycleSummary>> {
    Json(state.history.snapshot_last_n(HISTORY_LIMIT))
}
