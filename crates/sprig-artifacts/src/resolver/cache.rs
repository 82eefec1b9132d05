//! Resolved-variant cache

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sprig_attributes::ImmutableAttributes;

use crate::variant::{ResolvedVariant, VariantIdentifier};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    identity: VariantIdentifier,
    attributes: ImmutableAttributes,
}

/// Resolved variants keyed by (identity, final attributes)
///
/// The first instance installed for a key is the one every caller sees.
#[derive(Debug, Default)]
pub struct ResolvedVariantCache {
    entries: DashMap<CacheKey, Arc<ResolvedVariant>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResolvedVariantCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached variant for the key, building and installing it if absent
    pub(crate) fn get_or_insert_with<F>(
        &self,
        identity: &VariantIdentifier,
        attributes: &ImmutableAttributes,
        build: F,
    ) -> Arc<ResolvedVariant>
    where
        F: FnOnce() -> ResolvedVariant,
    {
        let key = CacheKey {
            identity: identity.clone(),
            attributes: attributes.clone(),
        };
        if let Some(existing) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(existing.value());
        }
        match self.entries.entry(key) {
            Entry::Occupied(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Arc::clone(entry.get())
            },
            Entry::Vacant(entry) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Arc::clone(entry.insert(Arc::new(build())).value())
            },
        }
    }

    /// Check if a variant is cached
    pub fn contains(&self, identity: &VariantIdentifier, attributes: &ImmutableAttributes) -> bool {
        self.entries.contains_key(&CacheKey {
            identity: identity.clone(),
            attributes: attributes.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached variants
    pub total_entries: usize,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that built a new variant
    pub misses: u64,
}
