//! Immutable attribute containers.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sprig_core::error::{SprigError, SprigResult};

use crate::attribute::{Attribute, Value};
use crate::value::AttributeValue;

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

static EMPTY: Lazy<ImmutableAttributes> =
    Lazy::new(|| ImmutableAttributes::from_entries(IndexMap::new()));

/// Anything that carries an attribute container (variants, configurations)
pub trait HasAttributes {
    fn attributes(&self) -> &ImmutableAttributes;
}

/// Immutable mapping from attribute to value
///
/// Equality and hashing are structural and ignore insertion order. Every
/// container also carries an identity (`id`) that clones share; caches
/// that memoize per container key on it.
#[derive(Clone)]
pub struct ImmutableAttributes {
    inner: Arc<Inner>,
}

struct Inner {
    id: u64,
    entries: IndexMap<Arc<str>, Entry>,
    hash: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Entry {
    attribute: Attribute,
    value: Value,
}

/// Builder for [`ImmutableAttributes`]
#[derive(Debug, Default, Clone)]
pub struct AttributesBuilder {
    entries: Vec<(Attribute, Value)>,
}

impl ImmutableAttributes {
    /// The shared empty container
    pub fn empty() -> Self {
        EMPTY.clone()
    }

    pub fn builder() -> AttributesBuilder {
        AttributesBuilder::default()
    }

    fn from_entries(entries: IndexMap<Arc<str>, Entry>) -> Self {
        // Order-independent hash so that {a, b} and {b, a} collide
        let hash = entries
            .values()
            .map(|entry| {
                let mut hasher = DefaultHasher::new();
                entry.hash(&mut hasher);
                hasher.finish()
            })
            .fold(0u64, |acc, h| acc.wrapping_add(h));

        Self {
            inner: Arc::new(Inner {
                id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
                entries,
                hash,
            }),
        }
    }

    /// Identity of this container instance
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Check if both handles point at the same instance
    pub fn ptr_eq(&self, other: &ImmutableAttributes) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Attributes in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &Attribute> {
        self.inner.entries.values().map(|entry| &entry.attribute)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Attribute, &Value)> {
        self.inner
            .entries
            .values()
            .map(|entry| (&entry.attribute, &entry.value))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.entries.contains_key(name)
    }

    /// Find the attribute stored under `name`
    pub fn attribute_by_name(&self, name: &str) -> Option<&Attribute> {
        self.inner.entries.get(name).map(|entry| &entry.attribute)
    }

    /// Raw value stored under `name`
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.inner.entries.get(name).map(|entry| &entry.value)
    }

    /// Value for `attribute`, coerced to its type when stored desugared
    ///
    /// Returns `Missing` when the container has no entry with that name.
    /// A value that cannot be coerced is returned as stored, so it simply
    /// fails equality checks later.
    pub fn find_entry(&self, attribute: &Attribute) -> AttributeValue<Value> {
        match self.inner.entries.get(attribute.name()) {
            Some(entry) => {
                let value = entry
                    .value
                    .coerce(attribute.value_type())
                    .unwrap_or_else(|| entry.value.clone());
                AttributeValue::Present(value)
            },
            None => AttributeValue::Missing,
        }
    }

    /// Entries of `self` overridden by entries of `other`
    pub fn concat(&self, other: &ImmutableAttributes) -> ImmutableAttributes {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut entries = self.inner.entries.clone();
        for (name, entry) in &other.inner.entries {
            entries.insert(Arc::clone(name), entry.clone());
        }
        Self::from_entries(entries)
    }

    /// Container with every named value reduced to a string
    pub fn desugared(&self) -> ImmutableAttributes {
        let entries = self
            .inner
            .entries
            .iter()
            .map(|(name, entry)| {
                (
                    Arc::clone(name),
                    Entry {
                        attribute: entry.attribute.desugared(),
                        value: entry.value.desugared(),
                    },
                )
            })
            .collect();
        Self::from_entries(entries)
    }
}

impl AttributesBuilder {
    /// Add an entry; a later entry with the same name replaces an earlier one
    pub fn attribute(mut self, attribute: Attribute, value: impl Into<Value>) -> Self {
        self.entries.push((attribute, value.into()));
        self
    }

    /// Build the container, checking each value against its attribute type
    pub fn build(self) -> SprigResult<ImmutableAttributes> {
        let mut entries = IndexMap::with_capacity(self.entries.len());
        for (attribute, value) in self.entries {
            let value = if attribute.accepts(&value) {
                value
            } else {
                value.coerce(attribute.value_type()).ok_or_else(|| {
                    SprigError::invalid_argument(format!(
                        "Value {} is not a valid {} for attribute '{}'",
                        value,
                        attribute.value_type(),
                        attribute.name()
                    ))
                })?
            };
            let name: Arc<str> = Arc::from(attribute.name());
            entries.insert(name, Entry { attribute, value });
        }
        Ok(ImmutableAttributes::from_entries(entries))
    }
}

impl HasAttributes for ImmutableAttributes {
    fn attributes(&self) -> &ImmutableAttributes {
        self
    }
}

impl<T: HasAttributes + ?Sized> HasAttributes for Arc<T> {
    fn attributes(&self) -> &ImmutableAttributes {
        (**self).attributes()
    }
}

impl PartialEq for ImmutableAttributes {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.inner.hash == other.inner.hash && self.inner.entries == other.inner.entries)
    }
}

impl Eq for ImmutableAttributes {}

impl Hash for ImmutableAttributes {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.inner.hash);
    }
}

impl Default for ImmutableAttributes {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for ImmutableAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(attribute, value)| (attribute.name(), value)))
            .finish()
    }
}

impl fmt::Display for ImmutableAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (attribute, value)) in self.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", attribute.name(), value)?;
        }
        f.write_str("}")
    }
}
