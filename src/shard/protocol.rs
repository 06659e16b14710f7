//! Shard Wire Protocol
//!
//! Messages exchanged between the coordinator and a shard. Each message is a
//! single JSON object on its own line, discriminated by a `kind` field:
//!
//! ```text
//! -> {"kind":"search","query":"needle"}
//! <- {"kind":"results","shard":"shard-b","total":1,"results":[...]}
//! -> {"kind":"status"}
//! <- {"kind":"status","shard":"shard-b","documents":5120}
//! ```

use super::types::SearchHit;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShardRequest {
    /// Run a substring search over every document of the shard.
    Search { query: String },
    /// Report shard identity and collection size.
    Status,
}

/// Hits of one shard for one query, in document load order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardResults {
    pub shard: String,
    pub total: usize,
    pub results: Vec<SearchHit>,
}

impl ShardResults {
    pub fn new(shard: impl Into<String>, results: Vec<SearchHit>) -> Self {
        Self {
            shard: shard.into(),
            total: results.len(),
            results,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShardReply {
    Results(ShardResults),
    Status { shard: String, documents: usize },
    /// The request could not be understood or served.
    Error { message: String },
}
