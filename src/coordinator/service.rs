//! Coordinator Service
//!
//! Owns the fixed shard list and runs the fan-out / bounded-wait / merge cycle
//! for every query.
//!
//! ## Per-query state machine
//! `Dispatched` -> per shard `Pending` -> `Completed | TimedOut | Failed` -> `Merged`.
//! There is no failed state for the query itself: zero contributing shards
//! still produce a valid, empty [`AggregateResult`].

use super::transport::{ShardCallError, ShardTransport, TcpShardTransport};
use super::types::{AggregateResult, ShardCounters, ShardOutcome, ShardStatsSnapshot, ShardStatus};
use crate::config::{CoordinatorConfig, ShardEndpoint};
use crate::shard::protocol::{ShardReply, ShardRequest, ShardResults};

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::Instrument;
use uuid::Uuid;

pub struct Coordinator {
    shards: Vec<ShardEndpoint>,
    shard_timeout: Duration,
    transport: Arc<dyn ShardTransport>,
    stats: DashMap<String, ShardCounters>,
}

impl Coordinator {
    pub fn new(
        shards: Vec<ShardEndpoint>,
        shard_timeout: Duration,
        transport: Arc<dyn ShardTransport>,
    ) -> Arc<Self> {
        let stats = DashMap::new();
        for shard in &shards {
            stats.insert(shard.name.clone(), ShardCounters::default());
        }

        Arc::new(Self {
            shards,
            shard_timeout,
            transport,
            stats,
        })
    }

    /// A coordinator reaching its shards over TCP.
    pub fn from_config(config: &CoordinatorConfig) -> Arc<Self> {
        Self::new(
            config.shards.clone(),
            config.shard_timeout,
            Arc::new(TcpShardTransport::new()),
        )
    }

    pub fn shards(&self) -> &[ShardEndpoint] {
        &self.shards
    }

    pub fn shard_timeout(&self) -> Duration {
        self.shard_timeout
    }

    /// Runs `term` against every shard and merges the answers that arrive in
    /// time. Blank terms short-circuit without contacting any shard.
    pub async fn handle_query(&self, term: &str) -> AggregateResult {
        let term = term.trim();
        if term.is_empty() {
            tracing::debug!("Ignoring empty query");
            return AggregateResult::empty();
        }

        let span = tracing::info_span!("query", id = %Uuid::new_v4());
        self.run_query(term).instrument(span).await
    }

    async fn run_query(&self, term: &str) -> AggregateResult {
        tracing::info!("Dispatching '{}' to {} shards", term, self.shards.len());

        let request = ShardRequest::Search {
            query: term.to_string(),
        };
        let outcomes = self.fan_out(request).await;

        let mut aggregate = AggregateResult::empty();
        let mut contributing = 0usize;

        for (endpoint, outcome) in outcomes {
            let outcome = into_search_outcome(outcome);
            self.record(&endpoint, &outcome);

            match outcome {
                ShardOutcome::Completed(results) => {
                    tracing::debug!("{} answered with {} hits", endpoint, results.total);
                    contributing += 1;
                    aggregate.merge(results);
                }
                ShardOutcome::TimedOut => {
                    tracing::warn!("{} timed out after {:?}", endpoint, self.shard_timeout);
                }
                ShardOutcome::Failed(e) => {
                    tracing::warn!("{} failed: {}", endpoint, e);
                }
            }
        }

        tracing::info!(
            "'{}': {} hits from {}/{} shards",
            term,
            aggregate.total,
            contributing,
            self.shards.len()
        );

        aggregate
    }

    /// Asks every shard for its status under the same bounded wait as queries.
    /// Statuses are returned in configured shard order.
    pub async fn probe(&self) -> Vec<ShardStatus> {
        let outcomes = self.fan_out(ShardRequest::Status).await;

        let mut statuses: Vec<(usize, ShardStatus)> = outcomes
            .into_iter()
            .map(|(endpoint, outcome)| {
                let index = self
                    .shards
                    .iter()
                    .position(|shard| *shard == endpoint)
                    .unwrap_or(usize::MAX);
                (index, status_from(endpoint, outcome))
            })
            .collect();
        statuses.sort_by_key(|(index, _)| *index);

        statuses.into_iter().map(|(_, status)| status).collect()
    }

    /// Cumulative query outcomes per shard, in configured shard order.
    pub fn stats(&self) -> Vec<ShardStatsSnapshot> {
        self.shards
            .iter()
            .filter_map(|shard| {
                self.stats
                    .get(&shard.name)
                    .map(|counters| counters.snapshot(&shard.name))
            })
            .collect()
    }

    pub fn log_stats(&self) {
        for snapshot in self.stats() {
            tracing::info!(
                "  - {} completed={} timed_out={} failed={}",
                snapshot.name,
                snapshot.completed,
                snapshot.timed_out,
                snapshot.failed
            );
        }
    }

    fn record<T>(&self, endpoint: &ShardEndpoint, outcome: &ShardOutcome<T>) {
        if let Some(counters) = self.stats.get(&endpoint.name) {
            counters.record(outcome);
        }
    }

    /// Sends `request` to every shard at once, one task per shard.
    /// Outcomes are returned in the order the shards resolved.
    async fn fan_out(&self, request: ShardRequest) -> Vec<(ShardEndpoint, ShardOutcome<ShardReply>)> {
        let request = Arc::new(request);
        let mut tasks = JoinSet::new();

        for endpoint in self.shards.iter().cloned() {
            let transport = self.transport.clone();
            let request = request.clone();
            let timeout = self.shard_timeout;

            tasks.spawn(
                async move {
                    let outcome = call_shard(transport.as_ref(), &endpoint, &request, timeout).await;
                    tracing::trace!("{} resolved: {}", endpoint, outcome.label());
                    (endpoint, outcome)
                }
                .in_current_span(),
            );
        }

        let mut outcomes = Vec::with_capacity(self.shards.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => outcomes.push(entry),
                Err(e) => tracing::error!("Shard call task aborted: {}", e),
            }
        }

        outcomes
    }
}

/// One shard call under its own deadline. When the deadline passes the call is
/// dropped, closing its connection; a late reply is never read.
async fn call_shard(
    transport: &dyn ShardTransport,
    endpoint: &ShardEndpoint,
    request: &ShardRequest,
    timeout: Duration,
) -> ShardOutcome<ShardReply> {
    match tokio::time::timeout(timeout, transport.send(endpoint, request)).await {
        Ok(Ok(ShardReply::Error { message })) => {
            ShardOutcome::Failed(ShardCallError::Remote(message))
        }
        Ok(Ok(reply)) => ShardOutcome::Completed(reply),
        Ok(Err(e)) => ShardOutcome::Failed(e),
        Err(_) => ShardOutcome::TimedOut,
    }
}

fn into_search_outcome(outcome: ShardOutcome<ShardReply>) -> ShardOutcome<ShardResults> {
    match outcome {
        ShardOutcome::Completed(ShardReply::Results(results)) => ShardOutcome::Completed(results),
        ShardOutcome::Completed(other) => ShardOutcome::Failed(ShardCallError::Protocol(format!(
            "unexpected reply to search: {:?}",
            other
        ))),
        ShardOutcome::TimedOut => ShardOutcome::TimedOut,
        ShardOutcome::Failed(e) => ShardOutcome::Failed(e),
    }
}

fn status_from(endpoint: ShardEndpoint, outcome: ShardOutcome<ShardReply>) -> ShardStatus {
    let mut status = ShardStatus {
        name: endpoint.name,
        addr: endpoint.addr,
        reachable: false,
        shard_id: None,
        documents: None,
        error: None,
    };

    match outcome {
        ShardOutcome::Completed(ShardReply::Status { shard, documents }) => {
            status.reachable = true;
            status.shard_id = Some(shard);
            status.documents = Some(documents);
        }
        ShardOutcome::Completed(other) => {
            status.error = Some(format!("unexpected reply to status: {:?}", other));
        }
        ShardOutcome::TimedOut => {
            status.error = Some("timed out".to_string());
        }
        ShardOutcome::Failed(e) => {
            status.error = Some(e.to_string());
        }
    }

    status
}
