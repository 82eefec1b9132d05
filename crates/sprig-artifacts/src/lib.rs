//! Variant artifacts for Sprig
//!
//! This crate turns the variant picked by attribute matching into a
//! [`ResolvedVariant`]: exclusions are applied, implicit attributes and
//! capabilities are computed, and the result is cached so that the same
//! variant always resolves to the same instance.
//!
//! Artifact bytes are never touched here; [`ArtifactIoResolver`] is called
//! lazily by consumers of a resolved variant.

pub mod artifact;
pub mod exclude;
pub mod io;
pub mod registry;
pub mod resolver;
pub mod selector;
pub mod variant;

// Re-export main types
pub use artifact::Capability;
pub use exclude::{ExcludeAny, ExcludeFn, ExcludeNothing, ExcludeRule, ExcludeSpec};
pub use io::{ArtifactIoResolver, LocalArtifactResolver};
pub use registry::{ArtifactTypeRegistry, DefaultArtifactTypeRegistry, ARTIFACT_TYPE};
pub use resolver::{CacheStats, ResolvedVariantCache, VariantArtifactResolver};
pub use selector::{
    AllVariantsSelector, ArtifactSet, AttributeMatchingSelector, OriginArtifactSelector,
    OriginArtifactSelectorChain, VariantNameSelector,
};
pub use variant::{ComponentMetadata, ResolvedVariant, VariantIdentifier, VariantResolveMetadata};

use sprig_core::error::SprigError;

/// Result type for artifact operations
pub type ArtifactResult<T> = Result<T, SprigError>;
