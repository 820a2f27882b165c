//! Dispatch service (v1)
//!
//! Names a backend for each client request, using a registry kept in sync
//! with the service directory and with the backends' own load reports.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │               DISPATCH SERVICE               │
//!   RegisterServer ──▶│  ┌──────────┐    ┌──────────┐                │
//!   ReportLoad     ──▶│  │   http   │───▶│ dispatch │──┐             │
//!   GetServer      ◀─▶│  │  server  │    │ service  │  │ one mutex   │
//!                     │  └──────────┘    └────┬─────┘  ▼             │
//!                     │                       │   ┌──────────┐       │
//!                     │        load_balancer ◀┘   │ registry │       │
//!                     │       (PickFirst/RR/LL)   └────▲─────┘       │
//!                     │                                │             │
//!                     │  ┌────────────┐  query (no lock)│             │
//!   Directory ◀───────┼──│ reconciler │─────────────────┘             │
//!                     │  └────────────┘                               │
//!                     └──────────────────────────────────────────────┘
//!
//!   Client ── GetServer ──▶ dispatcher ;  Client ── ProcessRequest ──▶ backend
//! ```
//!
//! Usage: `lb-dispatch [config.toml]`

use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::net::TcpListener;

use lb_dispatch::config::load_or_default;
use lb_dispatch::lifecycle::{signals, Dispatcher, Shutdown};
use lb_dispatch::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = load_or_default(config_path.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!("lb-dispatch v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        policy = %config.dispatch.policy,
        reconcile_interval_secs = config.dispatch.reconcile_interval_secs,
        discovery_enabled = config.discovery.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let dispatcher = Dispatcher::new(config.clone())?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    dispatcher.run(listener, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
