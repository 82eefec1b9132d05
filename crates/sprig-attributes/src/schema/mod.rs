//! Attribute schemas.
//!
//! A schema declares attributes together with their matching strategy
//! (compatibility and disambiguation rule chains) and an optional
//! disambiguation precedence. Schemas are configured during setup and
//! locked the first time they are used for matching; after that every
//! mutation fails with [`SprigError::SchemaLocked`].

mod merged;

pub use merged::{Disambiguation, DisambiguationSource, MergedSchema, PrecedenceResult};

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

use sprig_core::error::{SprigError, SprigResult};

use crate::attribute::Attribute;
use crate::matcher::AttributeMatcher;
use crate::rules::{CompatibilityRuleChain, DisambiguationRuleChain};

/// Rule chains for one attribute
#[derive(Debug, Clone)]
pub struct AttributeMatchingStrategy {
    attribute: Attribute,
    compatibility_rules: CompatibilityRuleChain,
    disambiguation_rules: DisambiguationRuleChain,
}

impl AttributeMatchingStrategy {
    fn new(attribute: Attribute) -> Self {
        Self {
            attribute,
            compatibility_rules: CompatibilityRuleChain::new(),
            disambiguation_rules: DisambiguationRuleChain::new(),
        }
    }

    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    pub fn compatibility_rules(&self) -> &CompatibilityRuleChain {
        &self.compatibility_rules
    }

    pub fn compatibility_rules_mut(&mut self) -> &mut CompatibilityRuleChain {
        &mut self.compatibility_rules
    }

    pub fn disambiguation_rules(&self) -> &DisambiguationRuleChain {
        &self.disambiguation_rules
    }

    pub fn disambiguation_rules_mut(&mut self) -> &mut DisambiguationRuleChain {
        &mut self.disambiguation_rules
    }
}

/// Mutable, lockable attribute schema
#[derive(Debug)]
pub struct AttributesSchema {
    name: String,
    state: RwLock<SchemaState>,
    frozen: OnceCell<Arc<FrozenSchema>>,
}

#[derive(Debug, Default)]
struct SchemaState {
    locked: bool,
    strategies: IndexMap<String, AttributeMatchingStrategy>,
    precedence: Vec<Attribute>,
}

/// Read-only snapshot of a schema, shared by matchers
#[derive(Debug, Clone, Default)]
pub struct FrozenSchema {
    name: String,
    strategies: IndexMap<String, AttributeMatchingStrategy>,
    precedence: Vec<Attribute>,
}

impl AttributesSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(SchemaState::default()),
            frozen: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_locked(&self) -> bool {
        self.state.read().locked
    }

    /// Declare an attribute (idempotent)
    pub fn attribute(&self, attribute: Attribute) -> SprigResult<()> {
        self.attribute_with(attribute, |_| {})
    }

    /// Declare an attribute and configure its rule chains
    pub fn attribute_with<F>(&self, attribute: Attribute, configure: F) -> SprigResult<()>
    where
        F: FnOnce(&mut AttributeMatchingStrategy),
    {
        let mut state = self.mutable_state()?;
        if let Some(existing) = state.strategies.get(attribute.name()) {
            if existing.attribute != attribute {
                return Err(SprigError::invalid_argument(format!(
                    "Attribute '{}' is already declared with type {} in schema '{}'",
                    attribute.name(),
                    existing.attribute.value_type(),
                    self.name
                )));
            }
        }
        let strategy = state
            .strategies
            .entry(attribute.name().to_string())
            .or_insert_with(|| AttributeMatchingStrategy::new(attribute));
        configure(strategy);
        Ok(())
    }

    /// Append attributes to the disambiguation precedence
    pub fn attribute_disambiguation_precedence<I>(&self, attributes: I) -> SprigResult<()>
    where
        I: IntoIterator<Item = Attribute>,
    {
        let mut state = self.mutable_state()?;
        for attribute in attributes {
            if state.precedence.contains(&attribute) {
                return Err(SprigError::invalid_argument(format!(
                    "Attribute '{}' is already present in the disambiguation precedence",
                    attribute.name()
                )));
            }
            state.precedence.push(attribute);
        }
        Ok(())
    }

    /// Replace the disambiguation precedence
    pub fn set_attribute_disambiguation_precedence<I>(&self, attributes: I) -> SprigResult<()>
    where
        I: IntoIterator<Item = Attribute>,
    {
        self.mutable_state()?.precedence.clear();
        self.attribute_disambiguation_precedence(attributes)
    }

    pub fn has_attribute(&self, attribute: &Attribute) -> bool {
        self.state
            .read()
            .strategies
            .get(attribute.name())
            .map(|strategy| &strategy.attribute == attribute)
            .unwrap_or(false)
    }

    pub fn attribute_by_name(&self, name: &str) -> Option<Attribute> {
        self.state
            .read()
            .strategies
            .get(name)
            .map(|strategy| strategy.attribute.clone())
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        self.state
            .read()
            .strategies
            .values()
            .map(|strategy| strategy.attribute.clone())
            .collect()
    }

    pub fn precedence(&self) -> Vec<Attribute> {
        self.state.read().precedence.clone()
    }

    /// Lock the schema and return its snapshot
    pub fn freeze(&self) -> Arc<FrozenSchema> {
        Arc::clone(self.frozen.get_or_init(|| {
            let mut state = self.state.write();
            state.locked = true;
            debug!(
                "Locked attributes schema '{}' with {} attribute(s)",
                self.name,
                state.strategies.len()
            );
            Arc::new(FrozenSchema {
                name: self.name.clone(),
                strategies: state.strategies.clone(),
                precedence: state.precedence.clone(),
            })
        }))
    }

    /// Matcher using only this schema
    pub fn matcher(&self) -> AttributeMatcher {
        AttributeMatcher::new(MergedSchema::new(
            self.freeze(),
            Arc::new(FrozenSchema::empty("producer")),
        ))
    }

    /// Matcher reconciling this (consumer) schema with a producer schema
    pub fn with_producer(&self, producer: &AttributesSchema) -> AttributeMatcher {
        AttributeMatcher::new(MergedSchema::new(self.freeze(), producer.freeze()))
    }

    fn mutable_state(&self) -> SprigResult<parking_lot::RwLockWriteGuard<'_, SchemaState>> {
        let state = self.state.write();
        if state.locked {
            return Err(SprigError::SchemaLocked {
                schema: self.name.clone(),
            });
        }
        Ok(state)
    }
}

impl FrozenSchema {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategy(&self, name: &str) -> Option<&AttributeMatchingStrategy> {
        self.strategies.get(name)
    }

    pub fn attribute_by_name(&self, name: &str) -> Option<&Attribute> {
        self.strategies.get(name).map(|strategy| &strategy.attribute)
    }

    pub fn has_attribute(&self, attribute: &Attribute) -> bool {
        self.attribute_by_name(attribute.name()) == Some(attribute)
    }

    pub fn precedence(&self) -> &[Attribute] {
        &self.precedence
    }
}
