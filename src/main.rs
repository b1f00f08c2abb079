//! Main entry point for the zendesk-export CLI

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;
use zendesk_export::cli::{status, Cli, Commands};
use zendesk_export::shutdown::{self, ShutdownFlag};

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("zendesk_export=info"));

    // Logs go to stderr so stdout carries only command output
    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let shutdown = ShutdownFlag::shared();
    shutdown::install_ctrl_c_handler(shutdown.clone());

    // Every normal stop, including a too-recent cursor, exits 0
    let result = match cli.command {
        Commands::Export(ref args) => args
            .execute(&cli, shutdown.clone())
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!(e)),
        Commands::Seed(ref args) => args
            .execute(&cli.log_file)
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!(e)),
        Commands::Comments(ref args) => args.execute(&cli).await.map_err(|e| anyhow::anyhow!(e)),
        Commands::Status => status::execute(&cli.log_file, cli.output_format)
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!(e)),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
