use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use lb_dispatch::config::load_or_default;
use lb_dispatch::lifecycle::{signals, Shutdown, Worker};
use lb_dispatch::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "lb-backend")]
#[command(about = "Backend worker that reports its load to the dispatch service", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to serve on; overrides backend.bind_address's port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Dispatch service URL; overrides backend.dispatcher_url.
    #[arg(short, long)]
    dispatcher: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = load_or_default(cli.config.as_deref())?;

    if let Some(port) = cli.port {
        let host = config
            .backend
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "127.0.0.1".to_string());
        config.backend.bind_address = format!("{}:{}", host, port);
    }
    if let Some(dispatcher) = cli.dispatcher {
        config.backend.dispatcher_url = dispatcher;
    }

    logging::init_logging(&config.observability);
    tracing::info!(
        bind_address = %config.backend.bind_address,
        dispatcher = %config.backend.dispatcher_url,
        "lb-backend v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?);
    }

    let worker = Worker::new(config.clone())?;
    let listener = TcpListener::bind(&config.backend.bind_address).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    worker.run(listener, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
