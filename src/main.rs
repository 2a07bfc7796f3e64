//! sshproxy-managerd
//!
//! Central routing-decision and host-health daemon for SSH session proxies.
//!
//! # Architecture Overview
//!
//! ```text
//!   proxy instances                    sshproxy-managerd
//!  ─────────────────    ┌──────────────────────────────────────────────────┐
//!   "connect u t\n" ───▶│ net::listener ─▶ net::connection (one per client)│
//!                       │                        │ submit(line)            │
//!                       │                        ▼                         │
//!                       │              dispatch::serializer (one task)     │
//!                       │                        │                         │
//!                       │                        ▼                         │
//!                       │   dispatch::engine ── registry ── routing        │
//!                       │                 └──── health::tracker ── probe   │
//!   "+backend\r\n"  ◀───│                                                  │
//!                       └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use sshproxy_manager::config::{load_config, ManagerConfig};
use sshproxy_manager::health::TcpProbe;
use sshproxy_manager::lifecycle::{signals, Daemon, Shutdown};
use sshproxy_manager::observability::{logging, metrics};
use sshproxy_manager::routing::{BuiltinSelector, SystemGroups};
use sshproxy_manager::Engine;

#[derive(Parser)]
#[command(name = "sshproxy-managerd")]
#[command(about = "Routing and host-health daemon for SSH session proxies", long_about = None)]
struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = "/etc/sshproxy/managerd.toml")]
    config: PathBuf,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if cli.check {
        println!("{}: configuration OK", cli.config.display());
        return ExitCode::SUCCESS;
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!(config = %cli.config.display(), "sshproxy-managerd v{} starting", env!("CARGO_PKG_VERSION"));

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ManagerConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        check_interval_secs = config.health_check.interval_secs,
        groups = config.groups.len(),
        users = config.users.len(),
        "Configuration loaded"
    );

    let probe = TcpProbe::new(Duration::from_secs(config.health_check.probe_timeout_secs));
    let engine = Engine::from_config(
        &config,
        Arc::new(probe),
        Arc::new(SystemGroups),
        Arc::new(BuiltinSelector::new()),
    )?;

    let shutdown = Shutdown::new();
    signals::install(shutdown.clone())?;

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?);
    }

    let daemon = Daemon::bind(&config, engine).await?;
    tracing::info!(address = %daemon.local_addr()?, "Listening for proxy requests");

    daemon.run(&shutdown).await?;
    Ok(())
}
