use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

use sprig_core::error::SprigResult;
use sprig_core::selector::{DefaultVersionSelectorScheme, VersionSelector, VersionSelectorScheme};

/// Memoizes parsed version selectors by selector text
///
/// Clones share the same cache. When two threads parse the same text at
/// once, the first selector installed is returned to both.
#[derive(Clone)]
pub struct VersionSelectorCache {
    scheme: Arc<dyn VersionSelectorScheme>,
    selectors: Arc<DashMap<String, Arc<dyn VersionSelector>>>,
}

impl VersionSelectorCache {
    pub fn new<S: VersionSelectorScheme + 'static>(scheme: S) -> Self {
        Self {
            scheme: Arc::new(scheme),
            selectors: Arc::new(DashMap::new()),
        }
    }

    /// Cached selector for `version`, parsing it on first use
    pub fn get_or_parse(&self, version: &str) -> SprigResult<Arc<dyn VersionSelector>> {
        if let Some(selector) = self.selectors.get(version) {
            trace!("Version selector cache hit for '{}'", version);
            return Ok(Arc::clone(selector.value()));
        }

        let parsed = self.scheme.parse_selector(version)?;
        let installed = self
            .selectors
            .entry(version.to_string())
            .or_insert(parsed);
        Ok(Arc::clone(installed.value()))
    }

    /// Number of distinct selector strings parsed so far
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

impl Default for VersionSelectorCache {
    fn default() -> Self {
        Self::new(DefaultVersionSelectorScheme)
    }
}

impl fmt::Debug for VersionSelectorCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionSelectorCache")
            .field("scheme", &self.scheme)
            .field("cached", &self.selectors.len())
            .finish()
    }
}
