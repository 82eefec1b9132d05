//! Artifact I/O collaborators.

use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;

use sprig_core::error::{SprigError, SprigResult};
use sprig_core::types::ComponentArtifactIdentifier;

/// Fetches or builds the file behind an artifact
///
/// Called lazily by consumers of a resolved variant, never while resolving.
pub trait ArtifactIoResolver: fmt::Debug + Send + Sync {
    fn resolve_artifact(&self, artifact: &ComponentArtifactIdentifier) -> SprigResult<Utf8PathBuf>;
}

/// Resolves artifacts from a local repository directory
///
/// Layout is `<root>/<group>/<module>/<version>/<file name>`.
#[derive(Debug, Clone)]
pub struct LocalArtifactResolver {
    root: Utf8PathBuf,
}

impl LocalArtifactResolver {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Where the artifact would live, whether or not it exists
    pub fn path_for(&self, artifact: &ComponentArtifactIdentifier) -> Utf8PathBuf {
        let component = &artifact.component;
        self.root
            .join(&component.group)
            .join(&component.module)
            .join(&component.version)
            .join(artifact.file_name())
    }
}

impl ArtifactIoResolver for LocalArtifactResolver {
    fn resolve_artifact(&self, artifact: &ComponentArtifactIdentifier) -> SprigResult<Utf8PathBuf> {
        let path = self.path_for(artifact);
        if path.is_file() {
            Ok(path)
        } else {
            Err(SprigError::ArtifactNotFound {
                artifact: format!("{} at {}", artifact, path),
            })
        }
    }
}
