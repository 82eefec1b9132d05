//! Configuration parsing for Sprig
//!
//! This crate parses `sprig.toml` files and builds the runtime objects they
//! describe: attribute schemas, repositories with their content rules, and
//! components with their variants.

pub mod loader;
pub mod model;
pub mod toml;

// Re-export main types
pub use loader::{ConfigLoader, CONFIG_FILE_NAME};
pub use model::SprigModel;
pub use crate::toml::{
    AttributeSection, AttributeValueSpec, CompatibilitySection, ComponentSection,
    DisambiguationSection, PickStrategy, RepositorySection, SchemaSection, SprigToml,
    VariantSection,
};

use sprig_core::error::SprigError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, SprigError>;
