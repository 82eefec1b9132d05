//! # sprig-core
//!
//! Core types shared across all Sprig crates.
//!
//! This crate provides:
//! - Module, component and artifact identifiers
//! - Versions and the version-selector service used by content filters
//! - SprigError enum for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Identifiers and versions
//! - `selector`: Version selector scheme (exact, prefix, latest, ranges)
//! - `error`: Error types and result aliases

pub mod error;
pub mod selector;
pub mod types;

// Re-export commonly used types
pub use error::{SprigError, SprigResult};
pub use selector::{DefaultVersionSelectorScheme, VersionSelector, VersionSelectorScheme};
pub use types::{
    ArtifactName, ComponentArtifactIdentifier, ModuleComponentIdentifier, ModuleIdentifier,
    Version,
};
