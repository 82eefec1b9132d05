//! Interning factory for attribute containers.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::trace;

use sprig_core::error::SprigResult;

use crate::attribute::{Attribute, Value};
use crate::container::ImmutableAttributes;

/// Creates, interns and desugars attribute containers
///
/// Structurally equal containers produced by the factory are the same
/// instance. Desugaring is memoized per container identity.
#[derive(Debug, Default, Clone)]
pub struct AttributesFactory {
    interned: Arc<DashMap<ImmutableAttributes, ImmutableAttributes>>,
    desugared: Arc<DashMap<u64, ImmutableAttributes>>,
}

impl AttributesFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical instance for a container
    pub fn intern(&self, attributes: ImmutableAttributes) -> ImmutableAttributes {
        self.interned
            .entry(attributes.clone())
            .or_insert(attributes)
            .value()
            .clone()
    }

    /// Build and intern a container from entries
    pub fn of<I, V>(&self, entries: I) -> SprigResult<ImmutableAttributes>
    where
        I: IntoIterator<Item = (Attribute, V)>,
        V: Into<Value>,
    {
        let attributes = entries
            .into_iter()
            .fold(ImmutableAttributes::builder(), |builder, (attribute, value)| {
                builder.attribute(attribute, value)
            })
            .build()?;
        Ok(self.intern(attributes))
    }

    /// `base` overridden by `overrides`, interned
    pub fn concat(
        &self,
        base: &ImmutableAttributes,
        overrides: &ImmutableAttributes,
    ) -> ImmutableAttributes {
        self.intern(base.concat(overrides))
    }

    /// Desugared form of a container, computed once per instance
    pub fn desugared(&self, attributes: &ImmutableAttributes) -> ImmutableAttributes {
        if let Some(cached) = self.desugared.get(&attributes.id()) {
            return cached.value().clone();
        }
        let desugared = self.intern(attributes.desugared());
        trace!("Desugared attributes {} (container {})", desugared, attributes.id());
        self.desugared
            .entry(attributes.id())
            .or_insert(desugared)
            .value()
            .clone()
    }

    /// Number of distinct interned containers
    pub fn interned_count(&self) -> usize {
        self.interned.len()
    }

    /// Drop every interned and desugared container
    pub fn clear(&self) {
        self.interned.clear();
        self.desugared.clear();
    }
}
