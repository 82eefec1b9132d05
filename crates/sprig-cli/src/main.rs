//! # sprig-cli
//!
//! Command line front end for Sprig variant selection.
//!
//! Loads a `sprig.toml`, then checks it, asks which repositories may serve a
//! module, or selects the variants and artifacts of a component.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use sprig_core::error::{SprigError, SprigResult};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

/// Variant selection for dependency graphs
#[derive(Parser)]
#[command(name = "sprig", version, about = "Variant selection for dependency graphs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file; searched upwards from the working directory when absent
    #[arg(long, global = true, env = "SPRIG_CONFIG", value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the configuration and summarize it
    Check,
    /// Show which repositories may serve a module or component
    Filter {
        /// `group:module:version`, or `group:module` for a version listing
        coordinates: String,
        /// Configuration the request is made from
        #[arg(long)]
        configuration: Option<String>,
        /// Consumer attribute as `name=value`
        #[arg(short, long = "attribute", value_name = "NAME=VALUE")]
        attributes: Vec<String>,
    },
    /// Select the variants and artifacts of a component
    Select {
        /// `group:module[:version]` of a configured component
        coordinates: String,
        /// Requested attribute as `name=value`
        #[arg(short, long = "attribute", value_name = "NAME=VALUE")]
        attributes: Vec<String>,
        /// Variant to select by name; tried before attribute matching
        #[arg(long = "variant", value_name = "NAME")]
        variants: Vec<String>,
        /// Also resolve artifact files below this directory
        #[arg(long, value_name = "DIR")]
        artifact_root: Option<Utf8PathBuf>,
        /// Print the selection as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    info!("Starting Sprig CLI v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_cli(cli) {
        eprintln!("{}", ErrorFormatter::new().format_error(&e));
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> SprigResult<()> {
    // Create Tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| SprigError::io("Failed to create async runtime".to_string(), e))?;

    rt.block_on(async {
        let ctx = CommandContext::new(cli.config).await?;
        commands::dispatch_command(cli.command, &ctx).await
    })
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("SPRIG_LOG").unwrap_or_else(|_| {
        EnvFilter::new(
            [
                "sprig",
                "sprig_core",
                "sprig_attributes",
                "sprig_repository",
                "sprig_artifacts",
                "sprig_config",
            ]
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect::<Vec<_>>()
            .join(","),
        )
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Sprig encountered an unexpected error: {}", panic_info);
        eprintln!("Sprig crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/sprig-build/sprig/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
