use crate::shard::protocol::ShardResults;
use crate::shard::types::SearchHit;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// The merged answer to one client query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Number of hits received from every contributing shard.
    pub total: usize,
    /// Hits of every contributing shard, concatenated in answer order.
    pub results: Vec<SearchHit>,
}

impl AggregateResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, shard: ShardResults) {
        if shard.total != shard.results.len() {
            tracing::warn!(
                "Shard {} reported {} hits but sent {}",
                shard.shard,
                shard.total,
                shard.results.len()
            );
        }
        self.total += shard.results.len();
        self.results.extend(shard.results);
    }
}

/// How a single shard call ended.
#[derive(Debug)]
pub enum ShardOutcome<T> {
    Completed(T),
    TimedOut,
    Failed(super::transport::ShardCallError),
}

impl<T> ShardOutcome<T> {
    pub fn label(&self) -> &'static str {
        match self {
            ShardOutcome::Completed(_) => "completed",
            ShardOutcome::TimedOut => "timed_out",
            ShardOutcome::Failed(_) => "failed",
        }
    }
}

/// Reachability of one shard as seen by a status probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardStatus {
    pub name: String,
    pub addr: String,
    pub reachable: bool,
    /// Identifier the shard reports for itself.
    pub shard_id: Option<String>,
    pub documents: Option<usize>,
    pub error: Option<String>,
}

/// Cumulative query outcomes for one shard.
#[derive(Debug, Default)]
pub struct ShardCounters {
    completed: AtomicU64,
    timed_out: AtomicU64,
    failed: AtomicU64,
}

impl ShardCounters {
    pub fn record<T>(&self, outcome: &ShardOutcome<T>) {
        let counter = match outcome {
            ShardOutcome::Completed(_) => &self.completed,
            ShardOutcome::TimedOut => &self.timed_out,
            ShardOutcome::Failed(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, name: &str) -> ShardStatsSnapshot {
        ShardStatsSnapshot {
            name: name.to_string(),
            completed: self.completed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardStatsSnapshot {
    pub name: String,
    pub completed: u64,
    pub timed_out: u64,
    pub failed: u64,
}
