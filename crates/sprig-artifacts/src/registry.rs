//! Artifact types and the attributes they imply.

use indexmap::{IndexMap, IndexSet};
use std::fmt;

use sprig_attributes::{Attribute, AttributesFactory, ImmutableAttributes};
use sprig_core::error::SprigResult;
use sprig_core::types::ComponentArtifactIdentifier;

/// Name of the attribute carrying an artifact's type
pub const ARTIFACT_TYPE: &str = "artifactType";

/// Maps a variant's attributes to the attributes implied by its artifacts
///
/// Implementations must be pure functions of their inputs.
pub trait ArtifactTypeRegistry: fmt::Debug + Send + Sync {
    fn map_attributes(
        &self,
        attributes: &ImmutableAttributes,
        artifacts: &[ComponentArtifactIdentifier],
    ) -> SprigResult<ImmutableAttributes>;
}

/// Registry keyed by file extension
///
/// When every artifact of a variant shares one extension and the variant
/// has no `artifactType` yet, the extension becomes its `artifactType` and
/// the attributes registered for that type are added. Attributes the
/// variant already declares take precedence.
#[derive(Debug, Clone, Default)]
pub struct DefaultArtifactTypeRegistry {
    factory: AttributesFactory,
    types: IndexMap<String, ImmutableAttributes>,
}

impl DefaultArtifactTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry interning through a shared factory
    pub fn with_factory(factory: AttributesFactory) -> Self {
        Self {
            factory,
            types: IndexMap::new(),
        }
    }

    /// Attributes implied for artifacts with `extension`; replaces earlier ones
    pub fn register(&mut self, extension: impl Into<String>, attributes: ImmutableAttributes) {
        self.types.insert(extension.into(), attributes);
    }

    pub fn registered_types(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn attributes_for(&self, extension: &str) -> Option<&ImmutableAttributes> {
        self.types.get(extension)
    }
}

impl ArtifactTypeRegistry for DefaultArtifactTypeRegistry {
    fn map_attributes(
        &self,
        attributes: &ImmutableAttributes,
        artifacts: &[ComponentArtifactIdentifier],
    ) -> SprigResult<ImmutableAttributes> {
        if attributes.contains(ARTIFACT_TYPE) {
            return Ok(attributes.clone());
        }

        let extensions: IndexSet<&str> = artifacts
            .iter()
            .map(|artifact| artifact.name.extension.as_str())
            .collect();
        let extension = match extensions.first() {
            Some(extension) if extensions.len() == 1 => *extension,
            _ => return Ok(attributes.clone()),
        };

        let mut implied = self
            .factory
            .of([(Attribute::string(ARTIFACT_TYPE), extension)])?;
        if let Some(registered) = self.types.get(extension) {
            implied = self.factory.concat(registered, &implied);
        }
        Ok(self.factory.concat(&implied, attributes))
    }
}
