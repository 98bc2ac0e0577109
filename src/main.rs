//! # Corpus Curator CLI (`curator`)
//!
//! The `curator` binary drives the Tamil dataset curation pipeline: it
//! initializes the on-disk store, runs the HTTP server the curation
//! frontend talks to, prints queue statistics, and pushes approved content
//! to the dataset hub.
//!
//! ## Usage
//!
//! ```bash
//! curator --config ./config/curator.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `curator init` | Create the pending/approved directory tree |
//! | `curator serve` | Start the curation HTTP server |
//! | `curator stats` | Print per-stage pending/approved counts |
//! | `curator push <stage>` | Push approved content to the dataset hub |
//!
//! ## Examples
//!
//! ```bash
//! # Create the data directories
//! curator init --config ./config/curator.toml
//!
//! # Start the server for the curation frontend
//! curator serve --config ./config/curator.toml
//!
//! # Push everything approved, token from HUB_TOKEN
//! curator push all --config ./config/curator.toml
//!
//! # Push only approved chunks to a specific repository
//! curator push chunked --repo org/tamil-chunks
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use corpus_curator::approval;
use corpus_curator::config::{self, Config};
use corpus_curator::export::{self, PushScope};
use corpus_curator::hub::{self, HfHubClient};
use corpus_curator::server;
use corpus_curator::store::Store;

/// Corpus Curator CLI — a staged curation pipeline for assembling a
/// Tamil-language text dataset.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/curator.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "curator",
    about = "Corpus Curator — staged curation pipeline for a Tamil text dataset",
    version,
    long_about = "Corpus Curator runs a three-stage curation workflow (raw collection, \
    cleaning, chunking) over a file-backed store. Every submission waits in a pending \
    queue until an admin approves it; approved content feeds the next stage and can be \
    pushed in bulk to an external dataset repository."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/curator.toml`. Storage, server, and hub
    /// settings are read from this file.
    #[arg(long, global = true, default_value = "./config/curator.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Create the data directory tree.
    ///
    /// Creates `pending/` and `approved/` trees for all three stages under
    /// the configured data directory. Idempotent.
    Init,

    /// Start the curation HTTP server.
    ///
    /// Binds to the address configured in `[server].bind` and serves the
    /// stage pipelines, the admin review queue, and the hub export.
    Serve,

    /// Print per-stage pending/approved counts.
    Stats,

    /// Push approved content to the dataset hub.
    ///
    /// Lists each stage's approved set and uploads every file
    /// independently; individual failures are counted, not fatal.
    Push {
        /// What to push: `raw`, `cleaned`, `chunked`, or `all`.
        #[arg(default_value = "all")]
        stage: String,

        /// Hub access token. Falls back to the HUB_TOKEN environment
        /// variable.
        #[arg(long)]
        token: Option<String>,

        /// Push all stages to this single repository instead of the
        /// per-stage targets in `[hub]`.
        #[arg(long)]
        repo: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let store = Store::new(cfg.storage.data_dir.clone());
            store.ensure_dirs()?;
            println!("Data directories created under {}", cfg.storage.data_dir.display());
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Stats => {
            print_stats(&cfg)?;
        }
        Commands::Push { stage, token, repo } => {
            run_push(&cfg, &stage, token.as_deref(), repo.as_deref()).await?;
        }
    }

    Ok(())
}

fn print_stats(cfg: &Config) -> anyhow::Result<()> {
    let store = Store::new(cfg.storage.data_dir.clone());
    let stats = approval::stats(&store)?;

    println!("Stage     Pending  Approved");
    println!("raw       {:>7}  {:>8}", stats.raw.pending, stats.raw.approved);
    println!("cleaned   {:>7}  {:>8}", stats.cleaned.pending, stats.cleaned.approved);
    println!("chunked   {:>7}  {:>8}", stats.chunked.pending, stats.chunked.approved);
    println!("total     {:>7}  {:>8}", stats.totals.pending, stats.totals.approved);
    Ok(())
}

async fn run_push(
    cfg: &Config,
    stage: &str,
    token: Option<&str>,
    repo: Option<&str>,
) -> anyhow::Result<()> {
    let scope = PushScope::from_request_type(stage)
        .ok_or_else(|| anyhow::anyhow!("Unknown push stage: {stage}"))?;
    let token = hub::resolve_token(token)?;
    let client = HfHubClient::new(&cfg.hub.endpoint, &token);
    let store = Store::new(cfg.storage.data_dir.clone());

    let report = export::push_all(&store, &client, &cfg.hub, scope, repo).await?;

    println!("Stage     Uploaded  Failed");
    println!("raw       {:>8}  {:>6}", report.raw.uploaded, report.raw.failed);
    println!("cleaned   {:>8}  {:>6}", report.cleaned.uploaded, report.cleaned.failed);
    println!("chunked   {:>8}  {:>6}", report.chunked.uploaded, report.chunked.failed);
    println!("total     {:>8}  {:>6}", report.totals.uploaded, report.totals.failed);

    Ok(())
}
