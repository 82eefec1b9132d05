//! Repository content filtering for Sprig
//!
//! Each repository carries a content descriptor: include/exclude rules by
//! group, module and version (exact, sub-group or regex), configuration
//! allow-lists and attribute allow-lists. The descriptor compiles once into
//! an immutable [`ContentFilter`] that the repository-selection layer
//! consults before any metadata is fetched.

pub mod content;
pub mod repository;

// Re-export main types
pub use content::{
    ArtifactResolutionDetails, ContentFilter, ContentRequest, ContentSpec, MatcherKind,
    RepositoryContentDescriptor, VersionSelectorCache,
};
pub use repository::{Repository, RepositorySelector};

use sprig_core::error::SprigError;

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, SprigError>;
