//! Coordinator HTTP Protocol
//!
//! Endpoints and DTOs of the coordinator's HTTP surface. The line protocol
//! needs no DTOs of its own: a request is the raw query term and the response
//! is a serialized [`AggregateResult`](super::types::AggregateResult).

use super::types::{ShardStatsSnapshot, ShardStatus};
use serde::{Deserialize, Serialize};

/// `GET /search?q=term` runs a query across all shards.
pub const ENDPOINT_SEARCH: &str = "/search";
/// `GET /health/stats` probes every shard and reports cumulative outcomes.
pub const ENDPOINT_STATS: &str = "/health/stats";

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub shards: Vec<ShardStatus>,
    pub counters: Vec<ShardStatsSnapshot>,
}
