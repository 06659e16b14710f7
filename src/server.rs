//! Line Server
//!
//! Newline-delimited TCP server shared by shard and coordinator processes.
//!
//! Every accepted connection runs on its own task and may carry any number of
//! request/response pairs: one line in, one line out. The server owns the
//! listening socket; [`LineServer::stop`] closes it and waits for the accept loop
//! to exit. Connections already in flight keep running until their peer hangs up.
//!
//! Lines are read as raw bytes and decoded lossily, so a line that is not valid
//! UTF-8 still reaches the handler and still gets an answer. A request line
//! longer than [`MAX_REQUEST_BYTES`] is answered with
//! [`LineHandler::oversized_line`] and the connection is closed.

use anyhow::Result;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Longest request line a server accepts, `\n` excluded.
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;
/// Longest reply line read from a shard or the coordinator.
pub const MAX_REPLY_BYTES: usize = 32 * 1024 * 1024;

/// Turns one request line into one response line (without the trailing newline).
#[async_trait]
pub trait LineHandler: Send + Sync + 'static {
    async fn handle_line(&self, line: &str) -> String;

    /// Response sent in place of a request line longer than `limit` bytes.
    fn oversized_line(&self, limit: usize) -> String {
        format!("line exceeds {} bytes", limit)
    }
}

/// One newline-delimited read.
#[derive(Debug, PartialEq, Eq)]
pub enum LineRead {
    /// A line without its `\n` or `\r\n`, invalid UTF-8 replaced.
    Line(String),
    /// More than the limit arrived without a newline.
    TooLong,
    /// The peer closed the stream.
    Eof,
}

/// Reads one line of at most `limit` bytes. A final line without a newline is
/// still returned. Never buffers more than `limit + 1` bytes.
pub async fn read_line<R>(reader: &mut R, limit: usize) -> std::io::Result<LineRead>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let mut buf = Vec::new();
    let read = AsyncReadExt::take(&mut *reader, limit as u64 + 1)
        .read_until(b'\n', &mut buf)
        .await?;

    if read == 0 {
        return Ok(LineRead::Eof);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if buf.len() > limit {
        return Ok(LineRead::TooLong);
    }

    Ok(LineRead::Line(String::from_utf8_lossy(&buf).into_owned()))
}

/// A running listener. Dropping it without calling `stop` aborts the accept loop.
pub struct LineServer {
    name: String,
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    accept_task: Option<JoinHandle<()>>,
}

impl LineServer {
    /// Binds `bind_addr` and starts accepting connections in the background.
    pub async fn start<H>(name: &str, bind_addr: SocketAddr, handler: Arc<H>) -> Result<Self>
    where
        H: LineHandler + ?Sized,
    {
        let listener = TcpListener::bind(bind_addr).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let accept_task = tokio::spawn(accept_loop(
            name.to_string(),
            listener,
            handler,
            shutdown_rx,
        ));

        tracing::info!("{} listening on {}", name, local_addr);

        Ok(Self {
            name: name.to_string(),
            local_addr,
            shutdown_tx,
            accept_task: Some(accept_task),
        })
    }

    /// The address actually bound (useful when binding port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Closes the listening socket and waits for the accept loop to finish.
    pub async fn stop(mut self) -> Result<()> {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.accept_task.take() {
            task.await?;
        }
        tracing::info!("{} on {} stopped", self.name, self.local_addr);
        Ok(())
    }
}

impl Drop for LineServer {
    fn drop(&mut self) {
        if let Some(task) = self.accept_task.take() {
            task.abort();
        }
    }
}

async fn accept_loop<H>(
    name: String,
    listener: TcpListener,
    handler: Arc<H>,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    H: LineHandler + ?Sized,
{
    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                tracing::debug!("{}: shutdown requested", name);
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tracing::debug!("{}: connection from {}", name, peer);
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, handler).await {
                            tracing::warn!("Connection with {} closed with error: {}", peer, e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("{}: failed to accept connection: {}", name, e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }
}

async fn serve_connection<H>(stream: TcpStream, handler: Arc<H>) -> std::io::Result<()>
where
    H: LineHandler + ?Sized,
{
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    loop {
        match read_line(&mut reader, MAX_REQUEST_BYTES).await? {
            LineRead::Line(line) => {
                let response = handler.handle_line(&line).await;
                write_line(&mut writer, response).await?;
            }
            LineRead::TooLong => {
                tracing::warn!(
                    "Request line over {} bytes, closing connection",
                    MAX_REQUEST_BYTES
                );
                write_line(&mut writer, handler.oversized_line(MAX_REQUEST_BYTES)).await?;
                break;
            }
            LineRead::Eof => break,
        }
    }

    Ok(())
}

async fn write_line(writer: &mut OwnedWriteHalf, mut line: String) -> std::io::Result<()> {
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}
