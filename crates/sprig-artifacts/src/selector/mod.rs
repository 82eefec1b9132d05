//! Origin artifact selection
//!
//! Selectors decide which variants of a component provide artifacts. Each
//! selector may decline by returning `None`; [`OriginArtifactSelectorChain`]
//! asks them in order and the first answer wins.

mod chain;

pub use chain::OriginArtifactSelectorChain;

use indexmap::IndexSet;
use std::fmt;
use std::sync::Arc;

use sprig_attributes::{AttributeMatcher, ImmutableAttributes};
use sprig_core::error::SprigResult;
use sprig_core::types::{ComponentArtifactIdentifier, ModuleComponentIdentifier};

use crate::exclude::ExcludeSpec;
use crate::resolver::VariantArtifactResolver;
use crate::variant::{ComponentMetadata, ResolvedVariant};

/// Artifacts selected for a component
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    component: ModuleComponentIdentifier,
    variants: Vec<Arc<ResolvedVariant>>,
}

impl ArtifactSet {
    pub fn new(component: ModuleComponentIdentifier, variants: Vec<Arc<ResolvedVariant>>) -> Self {
        Self { component, variants }
    }

    pub fn component(&self) -> &ModuleComponentIdentifier {
        &self.component
    }

    pub fn variants(&self) -> &[Arc<ResolvedVariant>] {
        &self.variants
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &ComponentArtifactIdentifier> {
        self.variants.iter().flat_map(|variant| variant.artifacts())
    }

    pub fn is_empty(&self) -> bool {
        self.variants.iter().all(|variant| variant.artifacts().is_empty())
    }
}

/// A strategy producing the artifacts of a component, or declining
///
/// The resolver carries the artifact-type registry used for the variants
/// a selector resolves.
pub trait OriginArtifactSelector: fmt::Debug + Send + Sync {
    fn select(
        &self,
        component: &ComponentMetadata,
        resolver: &VariantArtifactResolver,
        exclusions: &dyn ExcludeSpec,
    ) -> SprigResult<Option<ArtifactSet>>;

    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// Selects variants by name; declines when none of the names exist
#[derive(Debug, Clone)]
pub struct VariantNameSelector {
    names: IndexSet<String>,
}

impl VariantNameSelector {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl OriginArtifactSelector for VariantNameSelector {
    fn select(
        &self,
        component: &ComponentMetadata,
        resolver: &VariantArtifactResolver,
        exclusions: &dyn ExcludeSpec,
    ) -> SprigResult<Option<ArtifactSet>> {
        let variants = self
            .names
            .iter()
            .filter_map(|name| component.variant(name))
            .map(|variant| resolver.resolve_variant(variant, exclusions))
            .collect::<SprigResult<Vec<_>>>()?;
        if variants.is_empty() {
            return Ok(None);
        }
        Ok(Some(ArtifactSet::new(component.id().clone(), variants)))
    }

    fn describe(&self) -> String {
        format!(
            "variant name selector [{}]",
            self.names.iter().cloned().collect::<Vec<_>>().join(", ")
        )
    }
}

/// Selects the best variants for requested attributes
///
/// Declines when no variant is compatible.
#[derive(Debug, Clone)]
pub struct AttributeMatchingSelector {
    matcher: AttributeMatcher,
    requested: ImmutableAttributes,
}

impl AttributeMatchingSelector {
    pub fn new(matcher: AttributeMatcher, requested: ImmutableAttributes) -> Self {
        Self { matcher, requested }
    }
}

impl OriginArtifactSelector for AttributeMatchingSelector {
    fn select(
        &self,
        component: &ComponentMetadata,
        resolver: &VariantArtifactResolver,
        exclusions: &dyn ExcludeSpec,
    ) -> SprigResult<Option<ArtifactSet>> {
        let matches = self
            .matcher
            .matches(component.variants(), &self.requested, None)?;
        if matches.is_empty() {
            return Ok(None);
        }
        let variants = matches
            .into_iter()
            .map(|variant| resolver.resolve_variant(variant, exclusions))
            .collect::<SprigResult<Vec<_>>>()?;
        Ok(Some(ArtifactSet::new(component.id().clone(), variants)))
    }

    fn describe(&self) -> String {
        format!("attribute matching selector {}", self.requested)
    }
}

/// Catch-all: every variant of the component
#[derive(Debug, Clone, Copy, Default)]
pub struct AllVariantsSelector;

impl OriginArtifactSelector for AllVariantsSelector {
    fn select(
        &self,
        component: &ComponentMetadata,
        resolver: &VariantArtifactResolver,
        exclusions: &dyn ExcludeSpec,
    ) -> SprigResult<Option<ArtifactSet>> {
        let variants = component
            .variants()
            .iter()
            .map(|variant| resolver.resolve_variant(variant, exclusions))
            .collect::<SprigResult<Vec<_>>>()?;
        Ok(Some(ArtifactSet::new(component.id().clone(), variants)))
    }

    fn describe(&self) -> String {
        "all variants selector".to_string()
    }
}
