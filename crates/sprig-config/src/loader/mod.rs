//! Locating and loading sprig.toml

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use sprig_core::error::SprigError;

use crate::toml::SprigToml;
use crate::ConfigResult;

/// Name of the project configuration file
pub const CONFIG_FILE_NAME: &str = "sprig.toml";

/// Finds and loads the project configuration
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Directory the search starts from
    cwd: Utf8PathBuf,
}

impl ConfigLoader {
    pub fn new(cwd: impl Into<Utf8PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    pub fn cwd(&self) -> &Utf8Path {
        &self.cwd
    }

    /// Load the nearest sprig.toml and report where it was found
    pub async fn load_project_config(&self) -> ConfigResult<(SprigToml, Utf8PathBuf)> {
        let path = self
            .resolve_config_path(CONFIG_FILE_NAME)
            .ok_or_else(|| SprigError::ConfigValidation {
                field: "config".to_string(),
                reason: format!(
                    "No {} found in {} or any parent directory",
                    CONFIG_FILE_NAME, self.cwd
                ),
            })?;
        let config = Self::load_from(&path).await?;
        Ok((config, path))
    }

    /// Load a configuration file at an explicit path
    pub async fn load_from(path: &Utf8Path) -> ConfigResult<SprigToml> {
        debug!("Loading configuration from {}", path);
        crate::toml::load_from_file(path).await
    }

    /// Walk up from the working directory looking for `filename`
    pub fn resolve_config_path(&self, filename: &str) -> Option<Utf8PathBuf> {
        let mut current = Some(self.cwd.as_path());
        while let Some(dir) = current {
            let candidate = dir.join(filename);
            if candidate.is_file() {
                return Some(candidate);
            }
            current = dir.parent();
        }
        None
    }
}
