use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use perp_sentinel::config::Config;
use perp_sentinel::engine::Engine;
use perp_sentinel::feed::TelegramFeed;
use perp_sentinel::notifier;

#[derive(Parser, Debug)]
#[command(name = "perp-sentinel", about = "Anomaly alerting for perpetual-futures metric snapshots")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/perp-sentinel/config.toml")]
    config: String,

    /// Validate config and exit
    #[arg(long)]
    check: bool,

    /// Print version and exit
    #[arg(short, long)]
    version: bool,
}

#[tokio::main(worker_threads = 2)]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("perp-sentinel {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Load configuration
    let config = Config::load(&cli.config)?;

    if cli.check {
        println!("Configuration is valid.");
        return Ok(());
    }

    // Initialize logging
    init_logging(&config)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        metrics = config.metrics.len(),
        "Starting perp-sentinel"
    );

    // Run the agent
    if let Err(e) = run(config).await {
        error!(error = %e, "Agent terminated with error");
        return Err(e);
    }

    Ok(())
}

fn init_logging(config: &Config) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.agent.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    Ok(())
}

async fn run(config: Config) -> Result<()> {
    let mut engine = Engine::new(&config)?;
    let notifiers = notifier::create_notifiers(&config.notify)?;
    let mut feed = TelegramFeed::new(&config.feed);

    info!("Waiting for snapshots");

    loop {
        tokio::select! {
            batch = feed.next_batch() => {
                match batch {
                    Ok(messages) => {
                        // Snapshots are processed run-to-completion, one at a
                        // time; delivery happens after history is committed.
                        for raw in messages {
                            if let Some(report) = engine.ingest(&raw) {
                                notifier::deliver_all(&notifiers, &report).await;
                            }
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "Feed poll failed");
                        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal, exiting");
                return Ok(());
            }
        }
    }
}
