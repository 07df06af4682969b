//! Versioner: reconcile a content directory into a new dataset version.
//!
//! # Usage
//!
//! ```text
//! versioner reconcile [--content-dir <dir>] [--strategy manifest|sidecar] [--dry-run] [--json]
//! versioner publish [--json]
//! ```
//!
//! `reconcile` is phase 1 and runs inside the producing execution; `publish`
//! is phase 2 and runs in a follow-up execution that receives the manifest as
//! its `manifest` input.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use commands::{publish::PublishArgs, reconcile::ReconcileArgs};
use versioner_api::{client::DEFAULT_BASE_URL, ApiClient, ApiConfig};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "versioner",
    version,
    about = "Reconcile local files against the latest dataset version and publish the next one",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    env: RunEnv,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare content with the latest version and hand off the decision.
    Reconcile(ReconcileArgs),

    /// Create the new version from a handed-off manifest.
    Publish(PublishArgs),
}

/// Execution environment shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct RunEnv {
    /// Storage service base URL.
    #[arg(long, global = true, env = "VH_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub api_base_url: String,

    /// API token, sent as `Authorization: Token <token>`.
    #[arg(long, global = true, env = "VH_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Id of the execution this process runs in.
    #[arg(long, global = true, env = "VH_EXECUTION_ID")]
    pub execution_id: Option<String>,

    /// Directory holding `parameters.json`.
    #[arg(long, global = true, env = "VH_CONFIG_DIR", default_value = "/valohai/config")]
    pub config_dir: PathBuf,

    /// Directory the phase-2 inputs (including the manifest) are delivered to.
    #[arg(long, global = true, env = "VH_INPUTS_DIR", default_value = "/valohai/inputs")]
    pub inputs_dir: PathBuf,

    /// Directory whose files become the execution's outputs.
    #[arg(long, global = true, env = "VH_OUTPUTS_DIR", default_value = "/valohai/outputs")]
    pub outputs_dir: PathBuf,
}

impl RunEnv {
    /// Build the API client; fails when no token is configured.
    pub fn client(&self) -> Result<ApiClient> {
        let token = self
            .api_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .context("no API token: pass --api-token or set VH_API_TOKEN")?;
        ApiClient::new(ApiConfig::new(&self.api_base_url, token))
            .context("failed to configure API client")
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Reconcile(args) => args.run(&cli.env),
        Commands::Publish(args) => args.run(&cli.env),
    }
}

/// Logs go to stderr so stdout carries only the command's own output.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
