//! Rollcall daemon: command-line entry point for the device agent.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::sync::watch;

use rollcall_geo::{Coordinates, LocationError, LocationProvider};
use rollcall_node::{init_logging, Agent, AgentConfig};
use rollcall_submission::{HttpRelay, LocalKeySigner};
use rollcall_types::{ItemId, PrivateKey, SystemClock};
use rollcall_verification::Verdict;

#[derive(Parser)]
#[command(name = "rollcall", about = "Attendance claim verification and submission agent")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "ROLLCALL_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the agent's database.
    #[arg(long, env = "ROLLCALL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Base URL of the ledger relay.
    #[arg(long, env = "ROLLCALL_RELAY_URL")]
    relay_url: Option<String>,

    /// Trusted issuer public keys (hex, comma-separated). Added to the file's list.
    #[arg(long, env = "ROLLCALL_TRUSTED_ISSUERS", value_delimiter = ',')]
    trusted_issuer: Vec<String>,

    /// File holding the device's 32-byte signing seed, hex encoded.
    #[arg(long, env = "ROLLCALL_SIGNER_SEED_FILE")]
    signer_seed_file: Option<PathBuf>,

    /// Fixed coarse position "lat,lon" reported to the zone check. Without
    /// it, location is reported as unavailable.
    #[arg(long, env = "ROLLCALL_LOCATION")]
    location: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "ROLLCALL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "ROLLCALL_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Verify one scanned claim and queue it if accepted.
    Verify {
        /// Read the payload from this file instead of stdin.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Inspect or repair the submission queue.
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },
    /// Run one submission pass and exit.
    Drain,
    /// Run the submission worker until SIGINT/SIGTERM.
    Run,
    /// Print the effective configuration.
    Config,
}

#[derive(clap::Subcommand)]
enum QueueAction {
    /// List every queued item.
    List,
    /// Put a failed item back into automatic retry.
    Retry { id: String },
    /// Drop an item for good.
    Discard { id: String },
    /// Sign a fresh envelope for an item whose signature expired.
    Resign { id: String },
}

/// A location provider that always reports the same coarse fix.
struct FixedLocation(Option<Coordinates>);

impl LocationProvider for FixedLocation {
    async fn coarse_position(&self) -> Result<Coordinates, LocationError> {
        self.0
            .ok_or_else(|| LocationError::Unavailable("no location configured".into()))
    }
}

fn parse_location(s: &str) -> anyhow::Result<Coordinates> {
    let (lat, lon) = s
        .split_once(',')
        .context("location must look like \"lat,lon\"")?;
    Ok(Coordinates::new(
        lat.trim().parse().context("latitude")?,
        lon.trim().parse().context("longitude")?,
    ))
}

fn load_seed(path: &Path) -> anyhow::Result<PrivateKey> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading signer seed {}", path.display()))?;
    PrivateKey::from_hex(text.trim()).context("signer seed must be 32 bytes of hex")
}

fn build_config(cli: &Cli) -> anyhow::Result<AgentConfig> {
    let mut config = match &cli.config {
        Some(path) => AgentConfig::from_toml_file(path)?,
        None => AgentConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(url) = &cli.relay_url {
        config.relay_url = url.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    config
        .trusted_issuers
        .extend(cli.trusted_issuer.iter().cloned());
    Ok(config)
}

fn print_verdict(verdict: &Verdict) {
    println!("signature: {:?}", verdict.signature);
    println!("freshness: {:?}", verdict.freshness);
    println!("replay:    {:?}", verdict.replay);
    println!("zone:      {:?}", verdict.zone);
    match &verdict.rejection {
        Some(reason) => println!("rejected:  {reason}"),
        None if verdict.is_accepted() => println!("accepted"),
        None => println!("undetermined"),
    }
}

fn parse_id(id: &str) -> anyhow::Result<ItemId> {
    ItemId::from_hex(id).with_context(|| format!("invalid item id {id:?}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;
    init_logging(config.log_format()?, &config.log_level)?;

    if let Command::Config = cli.command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let Some(seed_path) = &cli.signer_seed_file else {
        bail!("a signer seed file is required (--signer-seed-file)");
    };
    let signer = LocalKeySigner::from_private(load_seed(seed_path)?);
    let relay = HttpRelay::new(
        config.relay_url.clone(),
        Duration::from_millis(config.submission.submit_timeout_ms),
    )?;
    let location = FixedLocation(cli.location.as_deref().map(parse_location).transpose()?);

    let mut agent = Agent::open(config, Arc::new(relay), Arc::new(signer), Arc::new(SystemClock))?;

    match cli.command {
        Command::Verify { file } => {
            let raw = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let (tx, _rx) = watch::channel(Verdict::checking());
            let outcome = agent.scan(raw.trim(), &location, &tx).await;
            print_verdict(&outcome.verification.verdict);
            match outcome.queued {
                Some(Ok(id)) => println!("queued:    {id}"),
                Some(Err(e)) => println!("not queued: {e}"),
                None => {}
            }
        }
        Command::Queue { action } => match action {
            QueueAction::List => {
                for item in agent.queue_items()? {
                    println!(
                        "{}  {:<12}  retries={}  next={}  event={}",
                        item.id,
                        item.status.to_string(),
                        item.retry_count,
                        item.next_attempt_at,
                        item.claim.event_id,
                    );
                }
            }
            QueueAction::Retry { id } => {
                let item = agent.retry(&parse_id(&id)?)?;
                println!("{} is {}", item.id, item.status);
            }
            QueueAction::Discard { id } => {
                let item = agent.discard(&parse_id(&id)?)?;
                println!("discarded {}", item.id);
            }
            QueueAction::Resign { id } => {
                let item = agent.resign(&parse_id(&id)?).await?;
                println!("{} is {}", item.id, item.status);
            }
        },
        Command::Drain => {
            let report = agent.drain_once().await?;
            println!("{report:?}");
        }
        Command::Run => {
            tracing::info!("starting rollcall agent");
            agent.start();
            let shutdown = Arc::clone(agent.shutdown_controller());
            shutdown.wait_for_signal().await;
            tracing::info!("shutdown signal received; stopping agent");
        }
        Command::Config => {}
    }

    agent.stop().await?;
    Ok(())
}
