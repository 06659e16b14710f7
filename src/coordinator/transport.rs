//! Shard Transport
//!
//! Carries one [`ShardRequest`] to a shard and brings back its [`ShardReply`].
//! Deadlines are not applied here; the coordinator wraps every call in its own
//! timeout and drops the call (and its connection) when the deadline passes.

use crate::config::ShardEndpoint;
use crate::server::{LineRead, MAX_REPLY_BYTES, read_line};
use crate::shard::protocol::{ShardReply, ShardRequest};

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[derive(Debug, thiserror::Error)]
pub enum ShardCallError {
    #[error("could not connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed reply: {0}")]
    Protocol(String),

    #[error("shard reported an error: {0}")]
    Remote(String),
}

#[async_trait]
pub trait ShardTransport: Send + Sync + 'static {
    async fn send(
        &self,
        endpoint: &ShardEndpoint,
        request: &ShardRequest,
    ) -> Result<ShardReply, ShardCallError>;
}

/// Opens a fresh TCP connection per call and exchanges one line each way.
#[derive(Debug, Clone, Default)]
pub struct TcpShardTransport;

impl TcpShardTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ShardTransport for TcpShardTransport {
    async fn send(
        &self,
        endpoint: &ShardEndpoint,
        request: &ShardRequest,
    ) -> Result<ShardReply, ShardCallError> {
        let stream = TcpStream::connect(&endpoint.addr)
            .await
            .map_err(|source| ShardCallError::Connect {
                addr: endpoint.addr.clone(),
                source,
            })?;
        let (reader, mut writer) = stream.into_split();

        let mut payload = serde_json::to_string(request)
            .map_err(|e| ShardCallError::Protocol(e.to_string()))?;
        payload.push('\n');
        writer.write_all(payload.as_bytes()).await?;
        writer.flush().await?;

        let line = match read_line(&mut BufReader::new(reader), MAX_REPLY_BYTES).await? {
            LineRead::Line(line) => line,
            LineRead::TooLong => {
                return Err(ShardCallError::Protocol(format!(
                    "reply exceeds {} bytes",
                    MAX_REPLY_BYTES
                )));
            }
            LineRead::Eof => {
                return Err(ShardCallError::Protocol(
                    "connection closed before reply".to_string(),
                ));
            }
        };

        serde_json::from_str(&line).map_err(|e| ShardCallError::Protocol(e.to_string()))
    }
}
