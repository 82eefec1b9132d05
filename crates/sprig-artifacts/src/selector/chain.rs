//! Ordered selector chain.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use sprig_core::error::{SprigError, SprigResult};

use super::{AllVariantsSelector, ArtifactSet, OriginArtifactSelector};
use crate::exclude::ExcludeSpec;
use crate::resolver::VariantArtifactResolver;
use crate::variant::ComponentMetadata;

/// Selectors asked in order until one produces an artifact set
///
/// A chain should end with a catch-all selector; running out of selectors
/// is reported as [`SprigError::SelectorChainExhausted`].
#[derive(Clone, Default)]
pub struct OriginArtifactSelectorChain {
    selectors: Vec<Arc<dyn OriginArtifactSelector>>,
}

impl OriginArtifactSelectorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain whose only selector is the catch-all
    pub fn with_default() -> Self {
        let mut chain = Self::new();
        chain.add(AllVariantsSelector);
        chain
    }

    pub fn add<S: OriginArtifactSelector + 'static>(&mut self, selector: S) -> &mut Self {
        self.selectors.push(Arc::new(selector));
        self
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn select(
        &self,
        component: &ComponentMetadata,
        resolver: &VariantArtifactResolver,
        exclusions: &dyn ExcludeSpec,
    ) -> SprigResult<ArtifactSet> {
        for selector in &self.selectors {
            if let Some(set) = selector.select(component, resolver, exclusions)? {
                debug!(
                    "Selected {} variant(s) of {} using {}",
                    set.variants().len(),
                    component.id(),
                    selector.describe()
                );
                return Ok(set);
            }
        }

        warn!(
            "No artifact selector produced a result for {} ({} selector(s) tried)",
            component.id(),
            self.selectors.len()
        );
        Err(SprigError::SelectorChainExhausted {
            component: component.id().to_string(),
        })
    }
}

impl fmt::Debug for OriginArtifactSelectorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.selectors.iter().map(|selector| selector.describe()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclude::ExcludeNothing;
    use crate::io::LocalArtifactResolver;
    use crate::registry::DefaultArtifactTypeRegistry;
    use crate::selector::{AttributeMatchingSelector, VariantNameSelector};
    use crate::variant::VariantResolveMetadata;
    use sprig_attributes::{Attribute, AttributesSchema, ImmutableAttributes};
    use sprig_core::types::ModuleComponentIdentifier;

    fn resolver() -> VariantArtifactResolver {
        VariantArtifactResolver::new(
            Arc::new(DefaultArtifactTypeRegistry::new()),
            Arc::new(LocalArtifactResolver::new("/nonexistent")),
        )
    }

    fn usage(value: &str) -> ImmutableAttributes {
        ImmutableAttributes::builder()
            .attribute(Attribute::string("usage"), value)
            .build()
            .unwrap()
    }

    fn component() -> ComponentMetadata {
        let id: ModuleComponentIdentifier = "org.lib:core:1.0".parse().unwrap();
        ComponentMetadata::new(id.clone())
            .with_variant(
                VariantResolveMetadata::new(id.clone(), "apiElements", usage("api"))
                    .with_artifact("core.jar".parse().unwrap()),
            )
            .with_variant(
                VariantResolveMetadata::new(id, "runtimeElements", usage("runtime"))
                    .with_artifact("core.jar".parse().unwrap())
                    .with_artifact("core-native.so".parse().unwrap()),
            )
    }

    #[derive(Debug)]
    struct Declining;

    impl OriginArtifactSelector for Declining {
        fn select(
            &self,
            _component: &ComponentMetadata,
            _resolver: &VariantArtifactResolver,
            _exclusions: &dyn ExcludeSpec,
        ) -> SprigResult<Option<ArtifactSet>> {
            Ok(None)
        }
    }

    #[test]
    fn test_first_answer_wins() {
        let mut chain = OriginArtifactSelectorChain::new();
        chain
            .add(Declining)
            .add(VariantNameSelector::new(["runtimeElements"]))
            .add(AllVariantsSelector);

        let set = chain.select(&component(), &resolver(), &ExcludeNothing).unwrap();
        assert_eq!(set.variants().len(), 1);
        assert_eq!(set.variants()[0].name(), "runtimeElements");
        assert_eq!(set.artifacts().count(), 2);
    }

    #[test]
    fn test_declined_names_fall_through_to_catch_all() {
        let mut chain = OriginArtifactSelectorChain::new();
        chain.add(VariantNameSelector::new(["sources"])).add(AllVariantsSelector);

        let set = chain.select(&component(), &resolver(), &ExcludeNothing).unwrap();
        assert_eq!(set.variants().len(), 2);
    }

    #[test]
    fn test_exhausted_chain_is_internal_error() {
        let mut chain = OriginArtifactSelectorChain::new();
        chain.add(Declining);

        let error = chain
            .select(&component(), &resolver(), &ExcludeNothing)
            .unwrap_err();
        assert!(matches!(error, SprigError::SelectorChainExhausted { ref component } if component == "org.lib:core:1.0"));
        assert!(error.is_internal());
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_attribute_matching_selector() {
        let schema = AttributesSchema::new("consumer");
        schema.attribute(Attribute::string("usage")).unwrap();

        let mut chain = OriginArtifactSelectorChain::new();
        chain
            .add(AttributeMatchingSelector::new(schema.matcher(), usage("api")))
            .add(AllVariantsSelector);
        let set = chain.select(&component(), &resolver(), &ExcludeNothing).unwrap();
        assert_eq!(set.variants().len(), 1);
        assert_eq!(set.variants()[0].name(), "apiElements");

        let mut declining = OriginArtifactSelectorChain::new();
        declining.add(AttributeMatchingSelector::new(schema.matcher(), usage("docs")));
        assert!(declining
            .select(&component(), &resolver(), &ExcludeNothing)
            .is_err());
    }

    #[test]
    fn test_default_chain() {
        let chain = OriginArtifactSelectorChain::with_default();
        assert_eq!(chain.len(), 1);
        assert!(format!("{:?}", chain).contains("all variants selector"));

        let empty = ComponentMetadata::new("org.lib:empty:1.0".parse().unwrap());
        let set = chain.select(&empty, &resolver(), &ExcludeNothing).unwrap();
        assert!(set.is_empty());
    }
}
