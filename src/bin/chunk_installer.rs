use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chunk_installer::{
    cancel::CancelToken,
    commands::{download::download_version, versions::list_versions, VersionChoice},
    download::DownloadOrchestrator,
    manifest::{parse_base_url, DEFAULT_BASE_URL},
    transport::{HttpTransport, TransportConfig},
};
use clap::{ArgGroup, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Subcommand)]
enum Command {
    /// List the versions available for download
    Versions,
    /// Download a version into a folder
    #[command(group(
        ArgGroup::new("which")
        .args(&["version", "id"])
        .required(false) // Neither given means the latest version
        .multiple(false)
    ))]
    Download {
        /// Folder to write the files to (defaults to <downloads>/chunk_installer/<version>)
        output_folder: Option<PathBuf>,
        /// Version label as listed by `versions`, eg. release-1.2.3
        #[arg(long)]
        version: Option<String>,
        /// Bare version id, eg. 1.2.3
        #[arg(long)]
        id: Option<String>,
    },
}

/// Downloads and reconstructs the files of a released version from the manifest service.
#[derive(Parser, Debug)]
#[command(name = "chunk_installer")]
#[clap(version)]
struct Cli {
    /// Base URL of the manifest service
    #[arg(long, env = "CHUNK_INSTALLER_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Seconds to wait for a connection to the service
    #[arg(long, default_value_t = 10)]
    connect_timeout: u64,

    /// Seconds allowed for a whole request, including the transfer (default: no limit)
    #[arg(long)]
    timeout: Option<u64>,

    /// Verbose logging of each file and chunk
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chunk_installer={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = TransportConfig {
        connect_timeout: Duration::from_secs(cli.connect_timeout),
        timeout: cli.timeout.map(Duration::from_secs),
    };
    let transport = HttpTransport::new(&config).context("Failed to initialise HTTP client")?;
    let base_url = parse_base_url(&cli.base_url).context("Invalid base URL")?;
    let orchestrator = DownloadOrchestrator::new(base_url, Arc::new(transport));

    match cli.command {
        Command::Versions => {
            list_versions(orchestrator.manifests()).context("Versions command failed")?
        }
        Command::Download {
            output_folder,
            version,
            id,
        } => {
            let choice = match (version, id) {
                (Some(label), _) => VersionChoice::Label(label),
                (None, Some(id)) => VersionChoice::Id(id),
                (None, None) => VersionChoice::Latest,
            };

            // First Ctrl-C stops between chunks, leaving the current file partially written. A
            // second one exits straight away, since a stalled request never reaches the next check.
            let cancel = CancelToken::new();
            let handler_token = cancel.clone();
            ctrlc::set_handler(move || {
                eprintln!();
                if handler_token.request_cancel() {
                    eprintln!("Interrupted again, exiting");
                    std::process::exit(130);
                }
                eprintln!("Stopping after the current chunk, press Ctrl-C again to quit now");
            })
            .context("Failed to install Ctrl-C handler")?;

            download_version(&orchestrator, &choice, output_folder.as_deref(), &cancel)
                .context("Download command failed")?
        }
    }

    Ok(())
}
