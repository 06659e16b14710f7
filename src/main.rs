use sharded_search::client::SearchClient;
use sharded_search::config::{ClientConfig, CoordinatorConfig, ShardConfig};
use sharded_search::coordinator::handlers::{CoordinatorLineHandler, router};
use sharded_search::coordinator::service::Coordinator;
use sharded_search::server::LineServer;
use sharded_search::shard::handlers::ShardLineHandler;
use sharded_search::shard::service::ShardSearchService;

use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        // .with_max_level(tracing::Level::DEBUG)
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let program = args.first().map(String::as_str).unwrap_or("sharded-search");

    let Some(mode) = args.get(1) else {
        usage(program);
    };
    let rest = &args[2..];

    match mode.as_str() {
        "shard" => run_shard(ShardConfig::from_args(rest)?).await,
        "coordinator" => run_coordinator(CoordinatorConfig::from_args(rest)?).await,
        "client" => SearchClient::new(ClientConfig::from_args(rest)?).run_console().await,
        _ => usage(program),
    }
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <shard|coordinator|client> [options]", program);
    eprintln!("  shard        --bind <addr:port> --id <name> --data <file.json>");
    eprintln!(
        "  coordinator  --bind <addr:port> [--http <addr:port>] [--shard <name=addr:port>]... [--timeout-secs <n>]"
    );
    eprintln!("  client       [--connect <addr:port>]");
    eprintln!(
        "Example: {} shard --bind 127.0.0.1:8081 --id shard-b --data data/shard_b.json",
        program
    );
    eprintln!(
        "Example: {} coordinator --bind 127.0.0.1:8080 --shard shard-b=127.0.0.1:8081 --shard shard-c=127.0.0.1:8082",
        program
    );

    std::process::exit(1);
}

async fn run_shard(config: ShardConfig) -> anyhow::Result<()> {
    tracing::info!("Starting shard '{}' on {}", config.shard_id, config.bind);

    // 1. Load the whole collection before accepting anything:
    let service = match ShardSearchService::load(&config).await {
        Ok(service) => Arc::new(service),
        Err(e) => {
            tracing::error!("Shard '{}' cannot start: {}", config.shard_id, e);
            std::process::exit(1);
        }
    };

    // 2. Serve:
    let server = LineServer::start(
        &config.shard_id,
        config.bind,
        ShardLineHandler::new(service),
    )
    .await?;

    tracing::info!("Press Ctrl+C to shutdown");
    tokio::signal::ctrl_c().await?;

    server.stop().await
}

async fn run_coordinator(config: CoordinatorConfig) -> anyhow::Result<()> {
    tracing::info!(
        "Starting coordinator on {} ({} shards, timeout {:?})",
        config.bind,
        config.shards.len(),
        config.shard_timeout
    );

    let coordinator = Coordinator::from_config(&config);

    // 1. Report which shards are up. Unreachable shards are not fatal:
    for status in coordinator.probe().await {
        if status.reachable {
            tracing::info!(
                "  - {} at {}: {} documents",
                status.name,
                status.addr,
                status.documents.unwrap_or_default()
            );
        } else {
            tracing::warn!(
                "  - {} at {} unreachable: {}",
                status.name,
                status.addr,
                status.error.unwrap_or_default()
            );
        }
    }

    // 2. Client-facing line listener:
    let server = LineServer::start(
        "coordinator",
        config.bind,
        CoordinatorLineHandler::new(coordinator.clone()),
    )
    .await?;

    // 3. Spawn stats reporter:
    let stats_coordinator = coordinator.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        interval.tick().await;

        loop {
            interval.tick().await;
            tracing::info!("Shard stats:");
            stats_coordinator.log_stats();
        }
    });

    // 4. Start HTTP server:
    let http_addr = config.http_addr();
    let app = router(coordinator);

    tracing::info!("HTTP server listening on {}", http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(http_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    server.stop().await
}
