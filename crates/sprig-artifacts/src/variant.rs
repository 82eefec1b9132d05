//! Variants as declared by components, and variants after resolution.

use camino::Utf8PathBuf;
use std::fmt;
use std::sync::Arc;

use sprig_attributes::{HasAttributes, ImmutableAttributes};
use sprig_core::error::SprigResult;
use sprig_core::types::{ArtifactName, ComponentArtifactIdentifier, ModuleComponentIdentifier};

use crate::artifact::Capability;
use crate::io::ArtifactIoResolver;

/// Stable identity of a variant, used as a cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VariantIdentifier {
    /// A variant declared by a component
    Variant {
        component: ModuleComponentIdentifier,
        name: String,
    },
    /// An ad hoc variant wrapping exactly one artifact
    Artifact(ComponentArtifactIdentifier),
}

impl fmt::Display for VariantIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantIdentifier::Variant { component, name } => write!(f, "{} variant '{}'", component, name),
            VariantIdentifier::Artifact(artifact) => write!(f, "{}", artifact),
        }
    }
}

/// A variant of a component, before exclusions are applied
///
/// A variant without identity is ad hoc and never cached.
#[derive(Debug, Clone)]
pub struct VariantResolveMetadata {
    name: String,
    identity: Option<VariantIdentifier>,
    component: ModuleComponentIdentifier,
    attributes: ImmutableAttributes,
    artifacts: Vec<ComponentArtifactIdentifier>,
    capabilities: Vec<Capability>,
    eligible_for_caching: bool,
}

impl VariantResolveMetadata {
    pub fn new(
        component: ModuleComponentIdentifier,
        name: impl Into<String>,
        attributes: ImmutableAttributes,
    ) -> Self {
        let name = name.into();
        Self {
            identity: Some(VariantIdentifier::Variant {
                component: component.clone(),
                name: name.clone(),
            }),
            name,
            component,
            attributes,
            artifacts: Vec::new(),
            capabilities: Vec::new(),
            eligible_for_caching: true,
        }
    }

    pub(crate) fn adhoc(
        component: ModuleComponentIdentifier,
        identity: Option<VariantIdentifier>,
        artifacts: Vec<ComponentArtifactIdentifier>,
    ) -> Self {
        Self {
            name: "adhoc".to_string(),
            identity,
            component,
            attributes: ImmutableAttributes::empty(),
            artifacts,
            capabilities: Vec::new(),
            eligible_for_caching: true,
        }
    }

    /// Add an artifact owned by this variant's component
    pub fn with_artifact(mut self, name: ArtifactName) -> Self {
        self.artifacts
            .push(ComponentArtifactIdentifier::new(self.component.clone(), name));
        self
    }

    /// Add an artifact owned by any component
    pub fn with_component_artifact(mut self, artifact: ComponentArtifactIdentifier) -> Self {
        self.artifacts.push(artifact);
        self
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    /// Never cache resolutions of this variant
    pub fn ineligible_for_caching(mut self) -> Self {
        self.eligible_for_caching = false;
        self
    }

    /// Copy keeping only `artifacts`; the copy has no identity
    pub(crate) fn with_artifacts_only(&self, artifacts: Vec<ComponentArtifactIdentifier>) -> Self {
        Self {
            identity: None,
            artifacts,
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identity(&self) -> Option<&VariantIdentifier> {
        self.identity.as_ref()
    }

    pub fn component(&self) -> &ModuleComponentIdentifier {
        &self.component
    }

    pub fn artifacts(&self) -> &[ComponentArtifactIdentifier] {
        &self.artifacts
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn is_eligible_for_caching(&self) -> bool {
        self.eligible_for_caching
    }
}

impl HasAttributes for VariantResolveMetadata {
    fn attributes(&self) -> &ImmutableAttributes {
        &self.attributes
    }
}

/// A component with the variants it exposes
#[derive(Debug, Clone)]
pub struct ComponentMetadata {
    id: ModuleComponentIdentifier,
    variants: Vec<Arc<VariantResolveMetadata>>,
}

impl ComponentMetadata {
    pub fn new(id: ModuleComponentIdentifier) -> Self {
        Self {
            id,
            variants: Vec::new(),
        }
    }

    pub fn with_variant(mut self, variant: VariantResolveMetadata) -> Self {
        self.variants.push(Arc::new(variant));
        self
    }

    pub fn id(&self) -> &ModuleComponentIdentifier {
        &self.id
    }

    pub fn variants(&self) -> &[Arc<VariantResolveMetadata>] {
        &self.variants
    }

    pub fn variant(&self, name: &str) -> Option<&Arc<VariantResolveMetadata>> {
        self.variants.iter().find(|variant| variant.name() == name)
    }
}

/// A variant after exclusions, type mapping and capability defaults
#[derive(Debug)]
pub struct ResolvedVariant {
    identity: Option<VariantIdentifier>,
    name: String,
    component: ModuleComponentIdentifier,
    attributes: ImmutableAttributes,
    capabilities: Vec<Capability>,
    artifacts: Vec<ComponentArtifactIdentifier>,
    io: Arc<dyn ArtifactIoResolver>,
}

impl ResolvedVariant {
    pub(crate) fn new(
        variant: &VariantResolveMetadata,
        attributes: ImmutableAttributes,
        io: Arc<dyn ArtifactIoResolver>,
    ) -> Self {
        let capabilities = if variant.capabilities.is_empty() {
            vec![Capability::default_for(&variant.component)]
        } else {
            variant.capabilities.clone()
        };
        Self {
            identity: variant.identity.clone(),
            name: variant.name.clone(),
            component: variant.component.clone(),
            attributes,
            capabilities,
            artifacts: variant.artifacts.clone(),
            io,
        }
    }

    pub fn identity(&self) -> Option<&VariantIdentifier> {
        self.identity.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn component(&self) -> &ModuleComponentIdentifier {
        &self.component
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn artifacts(&self) -> &[ComponentArtifactIdentifier] {
        &self.artifacts
    }

    /// Fetch the files of every artifact through the I/O collaborator
    pub fn files(&self) -> SprigResult<Vec<Utf8PathBuf>> {
        self.artifacts
            .iter()
            .map(|artifact| self.io.resolve_artifact(artifact))
            .collect()
    }
}

impl HasAttributes for ResolvedVariant {
    fn attributes(&self) -> &ImmutableAttributes {
        &self.attributes
    }
}

impl fmt::Display for ResolvedVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} variant '{}' {}", self.component, self.name, self.attributes)
    }
}
