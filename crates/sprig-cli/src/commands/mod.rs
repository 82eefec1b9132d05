//! Command implementations and dispatch logic.
//!
//! Every command works on the model built from the project's sprig.toml.

use camino::Utf8PathBuf;
use sprig_config::{ConfigLoader, SprigModel};
use sprig_core::error::{SprigError, SprigResult};
use tracing::{debug, info};

pub mod check;
pub mod filter;
pub mod select;


use crate::{output::OutputHandler, Commands};

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    /// Explicit configuration file
    pub config: Option<Utf8PathBuf>,
    pub output: OutputHandler,
}

impl CommandContext {
    pub async fn new(config: Option<Utf8PathBuf>) -> SprigResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| SprigError::io("Failed to get current directory".to_string(), e))?;
        let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| {
            SprigError::invalid_argument(format!("Working directory is not valid UTF-8: {}", e))
        })?;

        Ok(Self {
            cwd,
            config,
            output: OutputHandler::new(),
        })
    }

    /// Load the configuration and build its model
    pub async fn load_model(&self) -> SprigResult<(SprigModel, Utf8PathBuf)> {
        let (config, path) = match &self.config {
            Some(path) => (ConfigLoader::load_from(path).await?, path.clone()),
            None => ConfigLoader::new(self.cwd.clone()).load_project_config().await?,
        };
        debug!("Using configuration {}", path);
        Ok((SprigModel::build(&config)?, path))
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> SprigResult<()> {
    match command {
        Commands::Check => {
            info!("Checking configuration");
            check::execute(ctx).await
        },
        Commands::Filter {
            coordinates,
            configuration,
            attributes,
        } => {
            info!("Filtering repositories for {}", coordinates);
            filter::execute(&coordinates, configuration.as_deref(), &attributes, ctx).await
        },
        Commands::Select {
            coordinates,
            attributes,
            variants,
            artifact_root,
            json,
        } => {
            info!("Selecting variants of {}", coordinates);
            let request = select::SelectRequest {
                coordinates,
                attributes,
                variants,
                artifact_root,
            };
            select::execute(&request, json, ctx).await
        },
        Commands::Version => {
            show_version(ctx);
            Ok(())
        },
    }
}

fn show_version(ctx: &CommandContext) {
    let target = format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS);

    ctx.output.line(&format!("sprig v{}", env!("CARGO_PKG_VERSION")));
    ctx.output.info(&format!("Target: {}", target));
    ctx.output.info(&format!("Rust: {}", env!("RUSTC_VERSION")));
}
