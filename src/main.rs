//! API gateway (v1)
//!
//! Single entry point in front of a set of backend services. Every request
//! except health checks and registration must carry a bearer token issued by
//! the configured OpenID Connect provider.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────┐
//!                          │                  GATEWAY                      │
//!     Client Request       │  ┌─────────┐   ┌─────────┐   ┌───────────┐   │
//!     ─────────────────────┼─▶│  http   │──▶│ routing │──▶│   auth    │   │
//!                          │  │ server  │   │  table  │   │   gate    │   │
//!                          │  └─────────┘   └─────────┘   └─────┬─────┘   │
//!                          │                                    ▼         │
//!     Client Response      │  ┌─────────┐   ┌──────────┐  ┌───────────┐   │
//!     ◀────────────────────┼──│response │◀──│ upstream │◀─│  load     │   │
//!                          │  │ relay   │   │  client  │  │ balancer  │───┼──▶ Backend
//!                          │  └─────────┘   └──────────┘  └───────────┘   │
//!                          └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use api_gateway::config::loader::load_config;
use api_gateway::config::watcher::ConfigWatcher;
use api_gateway::observability::{logging, metrics};
use api_gateway::{bootstrap, Shutdown};

#[derive(Parser)]
#[command(name = "api-gateway")]
#[command(about = "Authenticating API gateway", long_about = None)]
struct Cli {
    /// Configuration file (TOML, or YAML by extension)
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,

    /// Overrides `observability.log_level`
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    logging::init_tracing(
        cli.log_level
            .as_deref()
            .unwrap_or(&config.observability.log_level),
    );

    tracing::info!("api-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        path = %cli.config.display(),
        bind_address = %config.listener.bind_address,
        services = config.services.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    // Services can change without a restart
    let (watcher, config_updates) = ConfigWatcher::new(&cli.config, &config);

    let bind_address = config.listener.bind_address.clone();
    let server = bootstrap(config).await?;

    let _watcher = match watcher.run() {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, "Config hot reload disabled");
            None
        }
    };

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();
    server
        .run(listener, config_updates, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
