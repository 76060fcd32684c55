//! HTTP surface of the harvester
//!
//! - `GET /search_and_crawl` runs one search (plus optional crawl) through
//!   the configured [`SearchBackend`].
//! - `GET /health` reports pool counters when the backend owns a pool.
//! - `POST /research` runs a research pipeline, when one is configured.

mod error;

pub use error::AppError;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::browser_pool::PoolStats;
use crate::research::{ResearchOutcome, ResearchPipeline};
use crate::search_service::{SearchBackend, SearchRequest, SearchResponse};
use crate::web_search::MAX_QUERY_LENGTH;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    backend: Arc<dyn SearchBackend>,
    research: Option<Arc<ResearchPipeline>>,
}

impl AppState {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            backend,
            research: None,
        }
    }

    /// Also serve `POST /research` with `pipeline`
    #[must_use]
    pub fn with_research(mut self, pipeline: Arc<ResearchPipeline>) -> Self {
        self.research = Some(pipeline);
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolStats>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub queries: Vec<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/search_and_crawl", get(search_and_crawl))
        .route("/health", get(health))
        .route("/research", post(research))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve `state` on `listener` until `shutdown` resolves
pub async fn serve<S>(listener: TcpListener, state: AppState, shutdown: S) -> anyhow::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!("Listening on http://{addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Shutting down HTTP server gracefully");
        })
        .await?;

    Ok(())
}

async fn search_and_crawl(
    State(state): State<AppState>,
    Query(request): Query<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("query must not be empty".into()));
    }
    if query.len() > MAX_QUERY_LENGTH {
        return Err(AppError::BadRequest(format!(
            "query exceeds {MAX_QUERY_LENGTH} characters"
        )));
    }

    debug!(
        "search_and_crawl query='{}' max_results={} timeout={} include_raw_content={}",
        request.query, request.max_results, request.timeout, request.include_raw_content
    );
    let results = state.backend.search_and_crawl(&request).await?;
    Ok(Json(SearchResponse { results }))
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let pool = state.backend.pool_stats();
    let status = match pool {
        Some(stats) if stats.shut_down => "shutting_down",
        _ => "ok",
    };
    let code = if status == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            pool,
        }),
    )
}

async fn research(
    State(state): State<AppState>,
    Json(request): Json<ResearchRequest>,
) -> Result<Json<ResearchOutcome>, AppError> {
    let pipeline = state
        .research
        .ok_or_else(|| AppError::NotFound("research pipeline is not configured".into()))?;
    if request.queries.iter().all(|q| q.trim().is_empty()) {
        return Err(AppError::BadRequest("at least one query is required".into()));
    }
    Ok(Json(pipeline.run(request.queries).await))
}
