use std::process::ExitCode;

use anyhow::Context;
use capesync::config::SyncConfig;
use capesync::sync::engine::{SyncOutcome, Synchronizer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "capesync=info,capes_core=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CliMode {
    Run,
    Help,
}

fn parse_cli_mode<I>(args: I) -> anyhow::Result<CliMode>
where
    I: IntoIterator<Item = String>,
{
    let mut mode = CliMode::Run;
    for arg in args.into_iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => mode = CliMode::Help,
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(mode)
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_usage() {
    println!("Usage: capesync [--help]");
    println!("Downloads missing cape textures and refreshes api/users.json.");
    println!();
    println!("Environment:");
    println!("  CAPESYNC_API_URL     cape directory endpoint");
    println!("  CAPESYNC_REPO_URL    base URL written into users.json");
    println!("  CAPESYNC_BASE_DIR    repository root (default: current directory)");
    println!("  CAPESYNC_CAPES_DIR   texture directory (default: <base>/api/capes)");
    println!("  CAPESYNC_USERS_JSON  user index (default: <base>/api/users.json)");
    println!("  RUST_LOG             log filter (default: {DEFAULT_LOG_FILTER})");
}

async fn run() -> anyhow::Result<()> {
    let config = SyncConfig::from_env()?;
    let synchronizer =
        Synchronizer::from_config(config).context("invalid cape API configuration")?;
    match synchronizer.run().await.context("cape sync failed")? {
        SyncOutcome::Aborted => info!("sync ended early, existing data preserved"),
        SyncOutcome::Completed(_) => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_logging();

    let mode = match parse_cli_mode(std::env::args()) {
        Ok(mode) => mode,
        Err(err) => {
            error!("{err:#}");
            print_usage();
            return ExitCode::FAILURE;
        }
    };
    if mode == CliMode::Help {
        print_usage();
        return ExitCode::SUCCESS;
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
