//! json-lb: health- and latency-aware JSON load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                  json-lb                     │
//!                         │                                              │
//!   POST /json            │  ┌─────────┐    ┌──────────┐   ┌──────────┐  │
//!   ──────────────────────┼─▶│  http   │───▶│ forward  │──▶│   pool   │  │
//!                         │  │ server  │    │ + retry  │   │ round    │  │
//!                         │  └─────────┘    └────┬─────┘   │ robin    │  │
//!                         │                      │         └────┬─────┘  │
//!   PUT /addinstance      │  ┌─────────┐         │              │        │
//!   PUT /removeinstance ──┼─▶│  admin  │─────────┼──────────────┘        │
//!   GET /status           │  └─────────┘         ▼                       │
//!                         │                ┌──────────┐  samples         │
//!                         │                │  target  │◀───────────┐     │
//!                         │                └────┬─────┘            │     │
//!                         │                     │ /json   ┌────────┴──┐  │
//!                         │                     │         │  health   │  │
//!                         │                     │         │  monitor  │──┼──▶ GET /health
//!                         │                     ▼         └───────────┘  │
//!                         └─────────────────────┼────────────────────────┘
//!                                               ▼
//!                                            Backend
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use json_lb::config::loader;
use json_lb::lifecycle::{signals, Shutdown};
use json_lb::observability::{logging, metrics};
use json_lb::HttpServer;

#[derive(Parser)]
#[command(name = "json-lb")]
#[command(about = "Health- and latency-aware JSON load balancer", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = loader::load(args.config.as_deref())?;
    logging::init_logging(&config.observability.log_level)?;

    tracing::info!("json-lb v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        targets = config.pool.targets.len(),
        availability_threshold_ms = config.pool.availability_threshold_ms,
        liveness_interval_ms = config.health_check.liveness_interval_ms,
        latency_interval_ms = config.health_check.latency_interval_ms,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config, &shutdown)?;
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
