//! Variant artifact resolution.

mod cache;

#[cfg(test)]
mod tests;

pub use cache::{CacheStats, ResolvedVariantCache};

use std::sync::Arc;
use tracing::{debug, trace};

use sprig_attributes::HasAttributes;
use sprig_core::error::SprigResult;
use sprig_core::types::{ComponentArtifactIdentifier, ModuleComponentIdentifier};

use crate::exclude::ExcludeSpec;
use crate::io::ArtifactIoResolver;
use crate::registry::ArtifactTypeRegistry;
use crate::variant::{ResolvedVariant, VariantIdentifier, VariantResolveMetadata};

/// Turns variants into [`ResolvedVariant`]s, at most once per variant
///
/// Clones share the cache. One resolver should live for one resolution
/// pass, since its type registry is part of what makes two resolutions of
/// the same variant interchangeable.
#[derive(Debug, Clone)]
pub struct VariantArtifactResolver {
    registry: Arc<dyn ArtifactTypeRegistry>,
    io: Arc<dyn ArtifactIoResolver>,
    cache: Arc<ResolvedVariantCache>,
}

impl VariantArtifactResolver {
    pub fn new(registry: Arc<dyn ArtifactTypeRegistry>, io: Arc<dyn ArtifactIoResolver>) -> Self {
        Self {
            registry,
            io,
            cache: Arc::new(ResolvedVariantCache::new()),
        }
    }

    pub fn registry(&self) -> &dyn ArtifactTypeRegistry {
        self.registry.as_ref()
    }

    pub fn cache(&self) -> &ResolvedVariantCache {
        &self.cache
    }

    /// The variant with excluded artifacts removed
    ///
    /// When nothing is excluded the original variant (and its identity) is
    /// returned. Otherwise the result is a new variant without identity;
    /// the source variant is never modified.
    pub fn effective_variant(
        &self,
        variant: &Arc<VariantResolveMetadata>,
        exclusions: &dyn ExcludeSpec,
    ) -> Arc<VariantResolveMetadata> {
        if !exclusions.may_exclude_artifacts() {
            return Arc::clone(variant);
        }

        let (kept, excluded): (Vec<ComponentArtifactIdentifier>, Vec<ComponentArtifactIdentifier>) =
            variant.artifacts().iter().cloned().partition(|artifact| {
                !exclusions.excludes_artifact(&artifact.component.module_identifier(), &artifact.name)
            });

        if excluded.is_empty() {
            return Arc::clone(variant);
        }
        debug!(
            "Excluded {} of {} artifact(s) from {} variant '{}'",
            excluded.len(),
            variant.artifacts().len(),
            variant.component(),
            variant.name()
        );
        Arc::new(variant.with_artifacts_only(kept))
    }

    /// Resolve a variant after applying exclusions
    pub fn resolve_variant(
        &self,
        variant: &Arc<VariantResolveMetadata>,
        exclusions: &dyn ExcludeSpec,
    ) -> SprigResult<Arc<ResolvedVariant>> {
        let effective = self.effective_variant(variant, exclusions);
        self.resolve_effective(&effective)
    }

    /// Resolve a one-off variant made of explicit artifacts
    ///
    /// Only a single artifact gives the variant an identity, so only then
    /// is the result cached.
    pub fn resolve_adhoc_variant(
        &self,
        component: &ModuleComponentIdentifier,
        artifacts: Vec<ComponentArtifactIdentifier>,
    ) -> SprigResult<Arc<ResolvedVariant>> {
        let identity = match artifacts.as_slice() {
            [only] => Some(VariantIdentifier::Artifact(only.clone())),
            _ => None,
        };
        let variant = VariantResolveMetadata::adhoc(component.clone(), identity, artifacts);
        self.resolve_effective(&variant)
    }

    fn resolve_effective(&self, variant: &VariantResolveMetadata) -> SprigResult<Arc<ResolvedVariant>> {
        let attributes = self
            .registry
            .map_attributes(variant.attributes(), variant.artifacts())?;

        match variant.identity() {
            Some(identity) if variant.is_eligible_for_caching() => Ok(self
                .cache
                .get_or_insert_with(identity, &attributes, || {
                    trace!("Resolving {}", identity);
                    ResolvedVariant::new(variant, attributes.clone(), Arc::clone(&self.io))
                })),
            _ => {
                trace!(
                    "Resolving uncacheable {} variant '{}'",
                    variant.component(),
                    variant.name()
                );
                Ok(Arc::new(ResolvedVariant::new(
                    variant,
                    attributes,
                    Arc::clone(&self.io),
                )))
            },
        }
    }
}
