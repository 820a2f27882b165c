use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use lb_dispatch::client::{discover_dispatcher, DispatchClient};
use lb_dispatch::config::load_or_default;
use lb_dispatch::discovery::ConsulDiscovery;

#[derive(Parser)]
#[command(name = "lb-client")]
#[command(about = "Client for the load-aware dispatch service", long_about = None)]
struct Cli {
    /// TOML configuration file (discovery settings).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dispatch service address; skips discovery when given.
    #[arg(short, long)]
    dispatcher: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask for a backend and send it work
    Send {
        /// Tasks to send; reads lines from stdin until "exit" when omitted
        #[arg(short, long)]
        task: Vec<String>,
    },
    /// Show which backend the dispatcher would pick next
    Target,
    /// Print the dispatcher's registry
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;

    let dispatcher = match cli.dispatcher {
        Some(address) => address,
        None => {
            let discovery = ConsulDiscovery::from_config(&config.discovery)?;
            match discover_dispatcher(&discovery, &config.discovery.dispatcher_service).await {
                Some(address) => address,
                None => {
                    eprintln!("Error: no available dispatchers found. Try again later.");
                    return Ok(());
                }
            }
        }
    };
    println!("Dispatcher selected: {}", dispatcher);
    let client = DispatchClient::new(&dispatcher);

    match cli.command {
        Commands::Status => {
            let status = client.status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Target => match client.get_server().await? {
            Some(backend) => println!("{}", backend),
            None => eprintln!("Error: no available servers. Try again later."),
        },
        Commands::Send { task } => {
            let Some(backend) = client.get_server().await? else {
                eprintln!("Error: no available servers. Try again later.");
                return Ok(());
            };
            println!("Backend selected: {}", backend);

            if task.is_empty() {
                let mut lines = BufReader::new(tokio::io::stdin()).lines();
                while let Some(line) = lines.next_line().await? {
                    let line = line.trim();
                    if line.eq_ignore_ascii_case("exit") {
                        break;
                    }
                    if line.is_empty() {
                        continue;
                    }
                    println!("Response from {}: {}", backend, client.process(&backend, line).await?);
                }
            } else {
                for data in task {
                    println!("Response from {}: {}", backend, client.process(&backend, &data).await?);
                }
            }
        }
    }

    Ok(())
}
