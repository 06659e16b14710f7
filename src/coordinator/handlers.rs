use super::protocol::{ENDPOINT_SEARCH, ENDPOINT_STATS, SearchParams, StatsResponse};
use super::service::Coordinator;
use super::types::AggregateResult;
use crate::server::LineHandler;

use async_trait::async_trait;
use axum::extract::{Extension, Query};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

const EMPTY_RESULT: &str = r#"{"total":0,"results":[]}"#;

/// Serves client lines: each line is one query term.
pub struct CoordinatorLineHandler {
    coordinator: Arc<Coordinator>,
}

impl CoordinatorLineHandler {
    pub fn new(coordinator: Arc<Coordinator>) -> Arc<Self> {
        Arc::new(Self { coordinator })
    }
}

#[async_trait]
impl LineHandler for CoordinatorLineHandler {
    async fn handle_line(&self, line: &str) -> String {
        encode(&self.coordinator.handle_query(line).await)
    }

    /// An over-long term is not searched; the client still gets a result.
    fn oversized_line(&self, _limit: usize) -> String {
        encode(&AggregateResult::empty())
    }
}

fn encode(result: &AggregateResult) -> String {
    match serde_json::to_string(result) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to serialize aggregate result: {}", e);
            EMPTY_RESULT.to_string()
        }
    }
}

pub fn router(coordinator: Arc<Coordinator>) -> Router {
    Router::new()
        .route(ENDPOINT_SEARCH, get(handle_search))
        .route(ENDPOINT_STATS, get(handle_stats))
        .layer(Extension(coordinator))
}

pub async fn handle_search(
    Extension(coordinator): Extension<Arc<Coordinator>>,
    Query(params): Query<SearchParams>,
) -> Json<AggregateResult> {
    Json(coordinator.handle_query(&params.q).await)
}

pub async fn handle_stats(
    Extension(coordinator): Extension<Arc<Coordinator>>,
) -> Json<StatsResponse> {
    let shards = coordinator.probe().await;
    Json(StatsResponse {
        shards,
        counters: coordinator.stats(),
    })
}
