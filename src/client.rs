//! Search Client
//!
//! Talks to the coordinator's line listener: one term out, one JSON
//! [`AggregateResult`] back. Also drives the interactive console of the
//! `client` mode.

use crate::config::ClientConfig;
use crate::coordinator::types::AggregateResult;
use crate::server::{LineRead, MAX_REPLY_BYTES, read_line};

use std::fmt::Write as _;
use std::io::Write as _;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("could not connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out while {0}")]
    Timeout(&'static str),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("coordinator closed the connection without a response")]
    NoResponse,

    #[error("response exceeds {0} bytes")]
    TooLarge(usize),

    #[error("malformed response: {0}")]
    Protocol(#[from] serde_json::Error),
}

pub struct SearchClient {
    config: ClientConfig,
}

impl SearchClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub async fn search(&self, term: &str) -> Result<AggregateResult, ClientError> {
        let addr = &self.config.coordinator;

        let stream = match tokio::time::timeout(
            self.config.connect_timeout,
            TcpStream::connect(addr),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(ClientError::Connect {
                    addr: addr.clone(),
                    source,
                });
            }
            Err(_) => return Err(ClientError::Timeout("connecting")),
        };

        let (reader, mut writer) = stream.into_split();

        // The term travels as a single line.
        let mut request = term.replace(['\r', '\n'], " ");
        request.push('\n');
        writer.write_all(request.as_bytes()).await?;
        writer.flush().await?;

        let mut reader = BufReader::new(reader);
        let read = tokio::time::timeout(
            self.config.read_timeout,
            read_line(&mut reader, MAX_REPLY_BYTES),
        )
        .await
        .map_err(|_| ClientError::Timeout("waiting for results"))??;

        let line = match read {
            LineRead::Line(line) => line,
            LineRead::TooLong => return Err(ClientError::TooLarge(MAX_REPLY_BYTES)),
            LineRead::Eof => return Err(ClientError::NoResponse),
        };

        Ok(serde_json::from_str(&line)?)
    }

    /// Reads terms from stdin until `quit`, `exit` or end of input.
    pub async fn run_console(&self) -> anyhow::Result<()> {
        println!("=== Distributed Search Client ===");
        println!("Type 'quit' to exit\n");

        let mut stdin = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("Search term: ");
            std::io::stdout().flush()?;

            let Some(line) = stdin.next_line().await? else {
                break;
            };
            let term = line.trim();

            if is_quit_command(term) {
                println!("Closing client...");
                break;
            }
            if term.is_empty() {
                println!("Please enter a non-empty search term.\n");
                continue;
            }

            match self.search(term).await {
                Ok(result) => println!("{}", render(&result)),
                Err(ClientError::Connect { addr, .. }) => {
                    eprintln!(
                        "Error: could not reach the coordinator at {}. Is it running?",
                        addr
                    );
                }
                Err(ClientError::Timeout(stage)) => {
                    eprintln!("Timeout while {}. Please try again.", stage);
                }
                Err(e) => eprintln!("Error: {}", e),
            }
            println!();
        }

        Ok(())
    }
}

/// `quit`, `exit` and `sair`, in any case, end the console.
pub fn is_quit_command(term: &str) -> bool {
    ["quit", "exit", "sair"]
        .iter()
        .any(|command| term.eq_ignore_ascii_case(command))
}

/// Human-readable listing of an aggregate result.
pub fn render(result: &AggregateResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "========== SEARCH RESULTS ==========");
    let _ = writeln!(out, "Total results: {}", result.total);

    if result.results.is_empty() {
        let _ = writeln!(out, "No articles matched the search term.");
    }

    for (i, hit) in result.results.iter().enumerate() {
        let _ = writeln!(out, "\n--- Result {} ---", i + 1);
        let _ = writeln!(out, "Title: {}", hit.title);
        let _ = writeln!(out, "Category: {}", hit.label);
        let _ = writeln!(out, "Abstract: {}", hit.snippet);
        let _ = writeln!(out, "Shard: {}", hit.shard);
    }

    let _ = write!(out, "====================================");
    out
}
