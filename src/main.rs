//! site-probe CLI
//!
//! Re-classifies every endpoint in a registry by probing it concurrently.

use anyhow::Result;
use clap::{Parser, Subcommand};
use site_probe::check::{run_check, CheckArgs};
use site_probe::init::{run_init, InitArgs};
use site_probe::ProbeKind;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "site-probe")]
#[command(author = "RoyalBit Inc.")]
#[command(version)]
#[command(about = "Bulk capability probing for endpoint registries")]
#[command(long_about = "Probes every selected endpoint in parallel and merges the verdicts back.\n\nCommands:\n  challenge   Detect captcha-protected endpoints\n  interface   Detect endpoints that need browser automation\n  init        Create endpoints.yaml template")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect which endpoints sit behind a captcha
    Challenge(CheckArgs),
    /// Detect which endpoints need browser automation
    Interface(CheckArgs),
    /// Create endpoints.yaml template
    Init(InitArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "site_probe=info".into()),
        )
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();

    match cli.command {
        Commands::Challenge(args) => run_check(ProbeKind::Challenge, args).await,
        Commands::Interface(args) => run_check(ProbeKind::Interface, args).await,
        Commands::Init(args) => run_init(args).await,
    }
}
