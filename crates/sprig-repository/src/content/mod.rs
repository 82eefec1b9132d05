//! Content descriptors and compiled content filters.

mod descriptor;
mod filter;
mod selectors;
mod spec;


pub use descriptor::RepositoryContentDescriptor;
pub use filter::{ArtifactResolutionDetails, ContentFilter, ContentRequest};
pub use selectors::VersionSelectorCache;
pub use spec::{ContentSpec, MatcherKind};
