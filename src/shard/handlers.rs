use super::protocol::{ShardReply, ShardRequest};
use super::service::ShardSearchService;
use crate::server::LineHandler;

use async_trait::async_trait;
use std::sync::Arc;

const SERIALIZATION_FAILED: &str = r#"{"kind":"error","message":"failed to serialize reply"}"#;

/// Serves [`ShardRequest`] lines from the coordinator.
pub struct ShardLineHandler {
    service: Arc<ShardSearchService>,
}

impl ShardLineHandler {
    pub fn new(service: Arc<ShardSearchService>) -> Arc<Self> {
        Arc::new(Self { service })
    }

    async fn reply_to(&self, line: &str) -> ShardReply {
        let request: ShardRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("{}: malformed request: {}", self.service.shard_id(), e);
                return ShardReply::Error {
                    message: format!("malformed request: {}", e),
                };
            }
        };

        tracing::debug!("{}: received {:?}", self.service.shard_id(), request);

        // Scanning is CPU-bound; keep it off the async workers.
        let service = self.service.clone();
        match tokio::task::spawn_blocking(move || service.handle_request(request)).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("{}: search task failed: {}", self.service.shard_id(), e);
                ShardReply::Error {
                    message: "search failed".to_string(),
                }
            }
        }
    }
}

#[async_trait]
impl LineHandler for ShardLineHandler {
    async fn handle_line(&self, line: &str) -> String {
        encode(&self.reply_to(line).await)
    }

    fn oversized_line(&self, limit: usize) -> String {
        encode(&ShardReply::Error {
            message: format!("request exceeds {} bytes", limit),
        })
    }
}

fn encode(reply: &ShardReply) -> String {
    match serde_json::to_string(reply) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to serialize shard reply: {}", e);
            SERIALIZATION_FAILED.to_string()
        }
    }
}
