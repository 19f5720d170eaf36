use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use location_audit::client::LibreNmsClient;
use location_audit::reconcile::{self, RunConfig};
use location_audit::{Result, ToolError};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging()?;

    if !cli.excel.exists() {
        return Err(ToolError::MissingInput(cli.excel));
    }

    if !has_excel_extension(&cli.excel) && !cli.yes {
        println!("Warning: the specified file does not have an Excel extension (.xlsx or .xls)");
        if !confirm("Continue anyway? (y/n): ")? {
            return Ok(());
        }
    }

    let client = LibreNmsClient::new(&cli.api_url, &cli.api_token, cli.verify_tls)?;
    let config = RunConfig {
        workbook: cli.excel,
        location_format: if cli.location_format.is_empty() {
            None
        } else {
            Some(cli.location_format)
        },
        domain_suffix: cli.domain_suffix,
        device_column: cli.device_column,
    };

    reconcile::run(&config, &client, &location_audit::dns::SystemResolver)
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

fn has_excel_extension(path: &std::path::Path) -> bool {
    matches!(
        path.extension().and_then(|extension| extension.to_str()),
        Some("xlsx") | Some("xls")
    )
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Reconcile a device inventory spreadsheet against LibreNMS."
)]
struct Cli {
    /// Path to the Excel workbook to annotate in place.
    #[arg(long)]
    excel: PathBuf,

    /// LibreNMS API base URL (e.g. https://10.1.0.183).
    #[arg(long)]
    api_url: String,

    /// LibreNMS API token.
    #[arg(long)]
    api_token: String,

    /// Template with column references describing the expected location.
    #[arg(long, default_value = "$B.$C.$D.$E")]
    location_format: String,

    /// Domain suffix appended to bare device names.
    #[arg(long, default_value = ".sac.ragingwire.net")]
    domain_suffix: String,

    /// Zero-based index of the column containing device names.
    #[arg(long, default_value_t = 0)]
    device_column: usize,

    /// Validate the API server's TLS certificate.
    #[arg(long)]
    verify_tls: bool,

    /// Skip the confirmation prompt for unrecognised file extensions.
    #[arg(long)]
    yes: bool,
}
