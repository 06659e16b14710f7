//! Process Configuration
//!
//! Plain configuration values for the three process kinds (shard, coordinator,
//! client). Each is built from `Default`, then environment variables, then
//! `--flag value` command-line arguments, later sources winning.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default per-shard wait applied by the coordinator.
pub const DEFAULT_SHARD_TIMEOUT: Duration = Duration::from_secs(30);
/// The coordinator's HTTP port sits this far above its line-protocol port.
pub const HTTP_PORT_OFFSET: u16 = 1000;

/// One reachable shard, as known to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardEndpoint {
    /// Name used in logs and stats.
    pub name: String,
    /// `host:port` of the shard's line listener.
    pub addr: String,
}

impl ShardEndpoint {
    pub fn new(name: impl Into<String>, addr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            addr: addr.into(),
        }
    }
}

impl fmt::Display for ShardEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.addr)
    }
}

/// Accepts `name=host:port`, or a bare `host:port` which doubles as the name.
impl FromStr for ShardEndpoint {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (name, addr) = match s.split_once('=') {
            Some((name, addr)) => (name.trim(), addr.trim()),
            None => (s, s),
        };
        if name.is_empty() || addr.is_empty() {
            return Err(anyhow!("invalid shard endpoint '{}'", s));
        }
        if !addr.contains(':') {
            return Err(anyhow!("shard address '{}' is missing a port", addr));
        }
        Ok(Self::new(name, addr))
    }
}

fn parse_endpoint_list(list: &str) -> Result<Vec<ShardEndpoint>> {
    list.split(',')
        .filter(|item| !item.trim().is_empty())
        .map(str::parse)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardConfig {
    pub bind: SocketAddr,
    pub shard_id: String,
    pub data_file: PathBuf,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8081)),
            shard_id: "shard-b".to_string(),
            data_file: PathBuf::from("data/shard_b.json"),
        }
    }
}

impl ShardConfig {
    pub fn from_args(args: &[String]) -> Result<Self> {
        Self::from_args_with_env(args, |key| std::env::var(key).ok())
    }

    pub fn from_args_with_env<E>(args: &[String], env: E) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(bind) = env("SHARD_BIND") {
            config.bind = bind.parse().context("SHARD_BIND")?;
        }
        if let Some(id) = env("SHARD_ID") {
            config.shard_id = id;
        }
        if let Some(data) = env("SHARD_DATA") {
            config.data_file = PathBuf::from(data);
        }

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--bind" => {
                    config.bind = flag_value(args, i)?.parse().context("--bind")?;
                    i += 2;
                }
                "--id" => {
                    config.shard_id = flag_value(args, i)?.to_string();
                    i += 2;
                }
                "--data" => {
                    config.data_file = PathBuf::from(flag_value(args, i)?);
                    i += 2;
                }
                _ => {
                    i += 1;
                }
            }
        }

        if config.shard_id.trim().is_empty() {
            return Err(anyhow!("shard id must not be empty"));
        }

        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Line-protocol listener for clients.
    pub bind: SocketAddr,
    /// HTTP listener; defaults to the line port plus [`HTTP_PORT_OFFSET`].
    pub http_bind: Option<SocketAddr>,
    pub shards: Vec<ShardEndpoint>,
    pub shard_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            http_bind: None,
            shards: vec![
                ShardEndpoint::new("shard-b", "127.0.0.1:8081"),
                ShardEndpoint::new("shard-c", "127.0.0.1:8082"),
            ],
            shard_timeout: DEFAULT_SHARD_TIMEOUT,
        }
    }
}

impl CoordinatorConfig {
    pub fn from_args(args: &[String]) -> Result<Self> {
        Self::from_args_with_env(args, |key| std::env::var(key).ok())
    }

    pub fn from_args_with_env<E>(args: &[String], env: E) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(bind) = env("COORDINATOR_BIND") {
            config.bind = bind.parse().context("COORDINATOR_BIND")?;
        }
        if let Some(http) = env("COORDINATOR_HTTP") {
            config.http_bind = Some(http.parse().context("COORDINATOR_HTTP")?);
        }
        if let Some(shards) = env("COORDINATOR_SHARDS") {
            config.shards = parse_endpoint_list(&shards).context("COORDINATOR_SHARDS")?;
        }
        if let Some(secs) = env("COORDINATOR_TIMEOUT_SECS") {
            config.shard_timeout =
                Duration::from_secs(secs.parse().context("COORDINATOR_TIMEOUT_SECS")?);
        }

        // Any --shard on the command line replaces the configured list.
        let mut cli_shards: Vec<ShardEndpoint> = Vec::new();

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--bind" => {
                    config.bind = flag_value(args, i)?.parse().context("--bind")?;
                    i += 2;
                }
                "--http" => {
                    config.http_bind = Some(flag_value(args, i)?.parse().context("--http")?);
                    i += 2;
                }
                "--shard" => {
                    cli_shards.push(flag_value(args, i)?.parse()?);
                    i += 2;
                }
                "--timeout-secs" => {
                    let secs: u64 = flag_value(args, i)?.parse().context("--timeout-secs")?;
                    config.shard_timeout = Duration::from_secs(secs);
                    i += 2;
                }
                _ => {
                    i += 1;
                }
            }
        }

        if !cli_shards.is_empty() {
            config.shards = cli_shards;
        }
        if config.shards.is_empty() {
            return Err(anyhow!("at least one shard must be configured"));
        }
        if config.shard_timeout.is_zero() {
            return Err(anyhow!("shard timeout must be greater than zero"));
        }

        Ok(config)
    }

    pub fn http_addr(&self) -> SocketAddr {
        self.http_bind.unwrap_or_else(|| {
            SocketAddr::new(
                self.bind.ip(),
                self.bind.port().saturating_add(HTTP_PORT_OFFSET),
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// `host:port` of the coordinator's line listener.
    pub coordinator: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            coordinator: "127.0.0.1:8080".to_string(),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(60),
        }
    }
}

impl ClientConfig {
    pub fn from_args(args: &[String]) -> Result<Self> {
        Self::from_args_with_env(args, |key| std::env::var(key).ok())
    }

    pub fn from_args_with_env<E>(args: &[String], env: E) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = env("COORDINATOR_ADDR") {
            config.coordinator = addr;
        }

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--connect" => {
                    config.coordinator = flag_value(args, i)?.to_string();
                    i += 2;
                }
                _ => {
                    i += 1;
                }
            }
        }

        Ok(config)
    }
}

fn flag_value(args: &[String], i: usize) -> Result<&str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{} requires a value", args[i]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_shard_config_defaults() {
        let config = ShardConfig::from_args_with_env(&[], no_env).unwrap();
        assert_eq!(config, ShardConfig::default());
        assert_eq!(config.bind.port(), 8081);
    }

    #[test]
    fn test_shard_config_flags_override_env() {
        let env = |key: &str| match key {
            "SHARD_ID" => Some("from-env".to_string()),
            "SHARD_BIND" => Some("127.0.0.1:9001".to_string()),
            _ => None,
        };
        let config =
            ShardConfig::from_args_with_env(&args(&["--id", "shard-c", "--data", "c.json"]), env)
                .unwrap();

        assert_eq!(config.shard_id, "shard-c");
        assert_eq!(config.data_file, PathBuf::from("c.json"));
        assert_eq!(config.bind.port(), 9001);
    }

    #[test]
    fn test_missing_flag_value_is_an_error() {
        assert!(ShardConfig::from_args_with_env(&args(&["--bind"]), no_env).is_err());
    }

    #[test]
    fn test_shard_endpoint_parsing() {
        let named: ShardEndpoint = "alpha=10.0.0.1:7000".parse().unwrap();
        assert_eq!(named, ShardEndpoint::new("alpha", "10.0.0.1:7000"));

        let bare: ShardEndpoint = "localhost:7001".parse().unwrap();
        assert_eq!(bare.name, "localhost:7001");
        assert_eq!(bare.addr, "localhost:7001");

        assert!("alpha=".parse::<ShardEndpoint>().is_err());
        assert!("alpha=nohost".parse::<ShardEndpoint>().is_err());
    }

    #[test]
    fn test_coordinator_config_defaults_match_two_shards() {
        let config = CoordinatorConfig::from_args_with_env(&[], no_env).unwrap();
        assert_eq!(config.shards.len(), 2);
        assert_eq!(config.shard_timeout, DEFAULT_SHARD_TIMEOUT);
        assert_eq!(config.http_addr().port(), 9080);
    }

    #[test]
    fn test_coordinator_cli_shards_replace_env_shards() {
        let env = |key: &str| match key {
            "COORDINATOR_SHARDS" => Some("a=127.0.0.1:1, b=127.0.0.1:2".to_string()),
            _ => None,
        };
        let from_env = CoordinatorConfig::from_args_with_env(&[], env).unwrap();
        assert_eq!(from_env.shards.len(), 2);

        let from_cli = CoordinatorConfig::from_args_with_env(
            &args(&["--shard", "z=127.0.0.1:3", "--timeout-secs", "2"]),
            env,
        )
        .unwrap();
        assert_eq!(from_cli.shards, vec![ShardEndpoint::new("z", "127.0.0.1:3")]);
        assert_eq!(from_cli.shard_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_coordinator_rejects_zero_timeout() {
        let result =
            CoordinatorConfig::from_args_with_env(&args(&["--timeout-secs", "0"]), no_env);
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_http_bind() {
        let config =
            CoordinatorConfig::from_args_with_env(&args(&["--http", "0.0.0.0:7000"]), no_env)
                .unwrap();
        assert_eq!(config.http_addr(), "0.0.0.0:7000".parse().unwrap());
    }

    #[test]
    fn test_client_config() {
        let config =
            ClientConfig::from_args_with_env(&args(&["--connect", "10.1.1.1:8080"]), no_env)
                .unwrap();
        assert_eq!(config.coordinator, "10.1.1.1:8080");
        assert_eq!(config.read_timeout, Duration::from_secs(60));
    }
}
