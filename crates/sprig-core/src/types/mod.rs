//! Core data types for Sprig.
//!
//! This module provides the identifiers every other crate speaks in:
//! - Module and component coordinates
//! - Artifact names and identifiers
//! - Versions with natural ordering

pub mod identifier;
pub mod version;

// Re-export all public types
pub use identifier::{
    ArtifactName, ComponentArtifactIdentifier, ModuleComponentIdentifier, ModuleIdentifier,
};
pub use version::{Version, VersionPart};
