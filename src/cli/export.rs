//! Export command and top-level CLI definition

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

use super::{CliError, CommentsArgs, SeedArgs};
use crate::config::ZendeskConfig;
use crate::exporter::config::{DEFAULT_LOG_PATH, DEFAULT_OUTPUT_PATH, MAX_RATE_LIMIT_RETRIES};
use crate::exporter::{ExportDriver, ExportOptions, ExportSummary, StopReason};
use crate::fetcher::zendesk::ZendeskClient;
use crate::shutdown::SharedShutdown;

/// Zendesk incremental ticket exporter
#[derive(Parser, Debug)]
#[command(name = "zendesk-export")]
#[command(about = "Incrementally export Zendesk tickets to a delimited file", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Zendesk API root (e.g., https://acme.zendesk.com/api/v2)
    #[arg(long, global = true, env = "ZENDESK_URL")]
    pub base_url: Option<String>,

    /// Agent email; "/token" is appended for API token auth
    #[arg(long, global = true, env = "ZENDESK_EMAIL")]
    pub email: Option<String>,

    /// Zendesk API token
    #[arg(long, global = true, env = "ZENDESK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Append-only cursor log; its last line is the resume point
    #[arg(long, global = true, default_value = DEFAULT_LOG_PATH)]
    pub log_file: PathBuf,

    /// Maximum consecutive rate-limit retries per request (range: 1-20)
    #[arg(
        long,
        global = true,
        default_value_t = MAX_RATE_LIMIT_RETRIES,
        value_parser = clap::value_parser!(u32).range(1..=20)
    )]
    pub max_retries: u32,

    /// Output format (json or human)
    #[arg(long, global = true, default_value = "human")]
    pub output_format: OutputFormat,
}

impl Cli {
    /// Build the connection configuration from flags and environment
    pub fn zendesk_config(&self) -> Result<ZendeskConfig, CliError> {
        let base_url = required(&self.base_url, "--base-url / ZENDESK_URL")?;
        let email = required(&self.email, "--email / ZENDESK_EMAIL")?;
        let token = required(&self.token, "--token / ZENDESK_TOKEN")?;
        Ok(ZendeskConfig::from_email(base_url, email, token)?)
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, CliError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| CliError::InvalidArgument(format!("{name} is required")))
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export tickets from the logged cursor to the end of the stream
    Export(ExportArgs),

    /// Append a starting cursor to the log
    Seed(SeedArgs),

    /// Print the comments of one ticket
    Comments(CommentsArgs),

    /// Show the current resume cursor
    Status,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

/// Parse a single-byte field delimiter. `\t` and `tab` select a tab.
fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s {
        "\\t" | "tab" => return Ok(b'\t'),
        _ => {}
    }
    match s.as_bytes() {
        [b'"' | b'\n' | b'\r'] => Err(format!("{s:?} cannot be used as a delimiter")),
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(format!("delimiter must be a single ASCII character, got {s:?}")),
    }
}

/// Export command arguments
#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Delimited output file
    #[arg(long, short, default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Field delimiter; ticket text is free-form, so avoid ','
    #[arg(long, default_value = "~", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// Truncate the output file instead of appending to it
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    /// Serve Prometheus metrics on this address while exporting
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

impl ExportArgs {
    /// Options for the export driver
    pub fn export_options(&self, cli: &Cli) -> ExportOptions {
        ExportOptions::new(&self.output, &cli.log_file)
            .with_delimiter(self.delimiter)
            .with_overwrite(self.overwrite)
            .with_max_rate_limit_retries(cli.max_retries)
    }

    /// Execute the export command
    pub async fn execute(
        &self,
        cli: &Cli,
        shutdown: SharedShutdown,
    ) -> Result<ExportSummary, CliError> {
        if let Some(addr) = self.metrics_addr {
            crate::metrics::init_metrics(addr)
                .map_err(|e| CliError::MetricsError(e.to_string()))?;
        }

        let client = ZendeskClient::new(cli.zendesk_config()?)?;
        let options = self.export_options(cli);

        println!("Starting ZenDesk ticket pull.");
        info!(base_url = %client.base_url(), "Exporting tickets");

        let driver = ExportDriver::new(client, options).with_shutdown(shutdown);
        let summary = driver.run().await?;

        match cli.output_format {
            OutputFormat::Json => output_json(&summary, &self.output),
            OutputFormat::Human => output_human(&summary, &self.output),
        }
        Ok(summary)
    }
}

fn output_json(summary: &ExportSummary, output: &std::path::Path) {
    let value = serde_json::json!({
        "success": true,
        "stop": summary.stop.as_str(),
        "pages": summary.pages,
        "rows": summary.rows,
        "start_cursor": summary.start_cursor.value(),
        "last_cursor": summary.last_cursor.value(),
        "output_path": output.display().to_string(),
    });
    println!("{value}");
}

fn output_human(summary: &ExportSummary, output: &std::path::Path) {
    match summary.stop {
        StopReason::EndOfStream | StopReason::UnreadableBody => {
            println!("\nReached most current ticket.")
        }
        StopReason::CursorTooRecent => {
            println!("\nStart time is too recent. Try a start_time older than 5 minutes.")
        }
        StopReason::Interrupted => println!("\nExport interrupted; progress saved."),
        StopReason::Stalled => {
            println!("\nZendesk returned the same cursor again; stopping. The next run re-exports this page.")
        }
    }
    println!("Output: {}", output.display());
    println!("Pages exported: {}", summary.pages);
    println!("Tickets written: {}", summary.rows);
    println!("Resume cursor: {}", summary.last_cursor);
}
