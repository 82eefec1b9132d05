//! Mutable repository content descriptor.

use indexmap::{IndexMap, IndexSet};
use once_cell::sync::OnceCell;
use parking_lot::{RwLock, RwLockWriteGuard};
use std::sync::Arc;
use tracing::debug;

use sprig_attributes::{Attribute, Value};
use sprig_core::error::{SprigError, SprigResult};

use super::filter::ContentFilter;
use super::selectors::VersionSelectorCache;
use super::spec::{ContentSpec, MatcherKind, SpecMatcher};

/// Declares what a repository may serve
///
/// Rules can be added until [`to_content_filter`] is called for the first
/// time; from then on the descriptor is locked and every mutator fails
/// with [`SprigError::DescriptorLocked`].
///
/// [`to_content_filter`]: RepositoryContentDescriptor::to_content_filter
#[derive(Debug)]
pub struct RepositoryContentDescriptor {
    repository: String,
    selectors: VersionSelectorCache,
    state: RwLock<DescriptorState>,
    compiled: OnceCell<Arc<ContentFilter>>,
}

#[derive(Debug, Clone, Default)]
struct DescriptorState {
    locked: bool,
    included_configurations: Option<IndexSet<String>>,
    excluded_configurations: Option<IndexSet<String>>,
    include_specs: Option<IndexMap<ContentSpec, SpecMatcher>>,
    exclude_specs: Option<IndexMap<ContentSpec, SpecMatcher>>,
    required_attributes: Option<IndexMap<Attribute, IndexSet<Value>>>,
}

fn require(value: &str, what: &str) -> SprigResult<()> {
    if value.trim().is_empty() {
        return Err(SprigError::invalid_argument(format!("{} cannot be empty", what)));
    }
    Ok(())
}

impl RepositoryContentDescriptor {
    pub fn new(repository: impl Into<String>) -> Self {
        Self::with_selector_cache(repository, VersionSelectorCache::default())
    }

    /// Descriptor sharing a version-selector cache with other descriptors
    pub fn with_selector_cache(repository: impl Into<String>, selectors: VersionSelectorCache) -> Self {
        Self {
            repository: repository.into(),
            selectors,
            state: RwLock::new(DescriptorState::default()),
            compiled: OnceCell::new(),
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn is_locked(&self) -> bool {
        self.state.read().locked
    }

    // Includes

    pub fn include_group(&self, group: &str) -> SprigResult<()> {
        require(group, "Group")?;
        self.add_spec(MatcherKind::Simple, group, None, None, true)
    }

    pub fn include_group_and_subgroups(&self, group_prefix: &str) -> SprigResult<()> {
        require(group_prefix, "Group prefix")?;
        self.add_spec(MatcherKind::SubGroup, group_prefix, None, None, true)
    }

    pub fn include_group_by_regex(&self, group_regex: &str) -> SprigResult<()> {
        require(group_regex, "Group regex")?;
        self.add_spec(MatcherKind::Regex, group_regex, None, None, true)
    }

    pub fn include_module(&self, group: &str, module: &str) -> SprigResult<()> {
        require(group, "Group")?;
        require(module, "Module name")?;
        self.add_spec(MatcherKind::Simple, group, Some(module), None, true)
    }

    pub fn include_module_by_regex(&self, group_regex: &str, module_regex: &str) -> SprigResult<()> {
        require(group_regex, "Group regex")?;
        require(module_regex, "Module name regex")?;
        self.add_spec(MatcherKind::Regex, group_regex, Some(module_regex), None, true)
    }

    /// Include one version; `version` may also be a selector such as `[1.0,2.0)`
    pub fn include_version(&self, group: &str, module: &str, version: &str) -> SprigResult<()> {
        require(group, "Group")?;
        require(module, "Module name")?;
        require(version, "Version")?;
        self.add_spec(MatcherKind::Simple, group, Some(module), Some(version), true)
    }

    pub fn include_version_by_regex(
        &self,
        group_regex: &str,
        module_regex: &str,
        version_regex: &str,
    ) -> SprigResult<()> {
        require(group_regex, "Group regex")?;
        require(module_regex, "Module name regex")?;
        require(version_regex, "Version regex")?;
        self.add_spec(
            MatcherKind::Regex,
            group_regex,
            Some(module_regex),
            Some(version_regex),
            true,
        )
    }

    // Excludes

    pub fn exclude_group(&self, group: &str) -> SprigResult<()> {
        require(group, "Group")?;
        self.add_spec(MatcherKind::Simple, group, None, None, false)
    }

    pub fn exclude_group_and_subgroups(&self, group_prefix: &str) -> SprigResult<()> {
        require(group_prefix, "Group prefix")?;
        self.add_spec(MatcherKind::SubGroup, group_prefix, None, None, false)
    }

    pub fn exclude_group_by_regex(&self, group_regex: &str) -> SprigResult<()> {
        require(group_regex, "Group regex")?;
        self.add_spec(MatcherKind::Regex, group_regex, None, None, false)
    }

    pub fn exclude_module(&self, group: &str, module: &str) -> SprigResult<()> {
        require(group, "Group")?;
        require(module, "Module name")?;
        self.add_spec(MatcherKind::Simple, group, Some(module), None, false)
    }

    pub fn exclude_module_by_regex(&self, group_regex: &str, module_regex: &str) -> SprigResult<()> {
        require(group_regex, "Group regex")?;
        require(module_regex, "Module name regex")?;
        self.add_spec(MatcherKind::Regex, group_regex, Some(module_regex), None, false)
    }

    pub fn exclude_version(&self, group: &str, module: &str, version: &str) -> SprigResult<()> {
        require(group, "Group")?;
        require(module, "Module name")?;
        require(version, "Version")?;
        self.add_spec(MatcherKind::Simple, group, Some(module), Some(version), false)
    }

    pub fn exclude_version_by_regex(
        &self,
        group_regex: &str,
        module_regex: &str,
        version_regex: &str,
    ) -> SprigResult<()> {
        require(group_regex, "Group regex")?;
        require(module_regex, "Module name regex")?;
        require(version_regex, "Version regex")?;
        self.add_spec(
            MatcherKind::Regex,
            group_regex,
            Some(module_regex),
            Some(version_regex),
            false,
        )
    }

    // Configuration and attribute allow-lists

    /// Only serve requests made from the named configurations
    pub fn only_for_configurations<I, S>(&self, names: I) -> SprigResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = collect_names(names)?;
        let mut state = self.mutable_state()?;
        state
            .included_configurations
            .get_or_insert_with(IndexSet::new)
            .extend(names);
        Ok(())
    }

    /// Never serve requests made from the named configurations
    pub fn not_for_configurations<I, S>(&self, names: I) -> SprigResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = collect_names(names)?;
        let mut state = self.mutable_state()?;
        state
            .excluded_configurations
            .get_or_insert_with(IndexSet::new)
            .extend(names);
        Ok(())
    }

    /// Only serve consumers whose `attribute` has one of `values`
    ///
    /// Calling this again for the same attribute replaces its allowed values.
    pub fn only_for_attribute<I, V>(&self, attribute: Attribute, values: I) -> SprigResult<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let allowed = values
            .into_iter()
            .map(|value| {
                let value = value.into();
                value.coerce(attribute.value_type()).ok_or_else(|| {
                    SprigError::invalid_argument(format!(
                        "Value {} is not a valid {} for attribute '{}'",
                        value,
                        attribute.value_type(),
                        attribute.name()
                    ))
                })
            })
            .collect::<SprigResult<IndexSet<Value>>>()?;

        let mut state = self.mutable_state()?;
        state
            .required_attributes
            .get_or_insert_with(IndexMap::new)
            .insert(attribute, allowed);
        Ok(())
    }

    // Accessors

    pub fn included_configurations(&self) -> Option<Vec<String>> {
        let state = self.state.read();
        state
            .included_configurations
            .as_ref()
            .map(|names| names.iter().cloned().collect())
    }

    pub fn excluded_configurations(&self) -> Option<Vec<String>> {
        let state = self.state.read();
        state
            .excluded_configurations
            .as_ref()
            .map(|names| names.iter().cloned().collect())
    }

    pub fn include_specs(&self) -> Vec<ContentSpec> {
        let state = self.state.read();
        state
            .include_specs
            .as_ref()
            .map(|specs| specs.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn exclude_specs(&self) -> Vec<ContentSpec> {
        let state = self.state.read();
        state
            .exclude_specs
            .as_ref()
            .map(|specs| specs.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn required_attributes(&self) -> Option<IndexMap<Attribute, IndexSet<Value>>> {
        self.state.read().required_attributes.clone()
    }

    // Lifecycle

    /// Compile the descriptor into its filter, locking it
    ///
    /// Every call returns the same filter instance.
    pub fn to_content_filter(&self) -> Arc<ContentFilter> {
        Arc::clone(self.compiled.get_or_init(|| {
            let mut state = self.state.write();
            state.locked = true;

            let filter = ContentFilter {
                included_configurations: state.included_configurations.clone(),
                excluded_configurations: state.excluded_configurations.clone(),
                includes: state
                    .include_specs
                    .as_ref()
                    .map(|specs| specs.values().cloned().collect()),
                excludes: state
                    .exclude_specs
                    .as_ref()
                    .map(|specs| specs.values().cloned().collect()),
                required_attributes: state.required_attributes.clone(),
                ..ContentFilter::new(self.repository.clone())
            };
            debug!(
                "Compiled content filter for repository '{}' ({} include, {} exclude rule(s))",
                self.repository,
                filter.includes.as_ref().map_or(0, Vec::len),
                filter.excludes.as_ref().map_or(0, Vec::len)
            );
            Arc::new(filter)
        }))
    }

    /// Unlocked, independent copy of this descriptor's rules
    pub fn as_mutable_copy(&self) -> RepositoryContentDescriptor {
        let mut state = self.state.read().clone();
        state.locked = false;
        RepositoryContentDescriptor {
            repository: self.repository.clone(),
            selectors: self.selectors.clone(),
            state: RwLock::new(state),
            compiled: OnceCell::new(),
        }
    }

    fn add_spec(
        &self,
        kind: MatcherKind,
        group: &str,
        module: Option<&str>,
        version: Option<&str>,
        inclusive: bool,
    ) -> SprigResult<()> {
        let spec = ContentSpec {
            kind,
            group: group.to_string(),
            module: module.map(str::to_string),
            version: version.map(str::to_string),
            inclusive,
        };

        let mut state = self.mutable_state()?;
        let matcher = spec.to_matcher(&self.selectors)?;
        let specs = if inclusive {
            &mut state.include_specs
        } else {
            &mut state.exclude_specs
        };
        specs.get_or_insert_with(IndexMap::new).insert(spec, matcher);
        Ok(())
    }

    fn mutable_state(&self) -> SprigResult<RwLockWriteGuard<'_, DescriptorState>> {
        let state = self.state.write();
        if state.locked {
            return Err(SprigError::DescriptorLocked {
                repository: self.repository.clone(),
            });
        }
        Ok(state)
    }
}

fn collect_names<I, S>(names: I) -> SprigResult<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names
        .into_iter()
        .map(|name| {
            let name = name.into();
            require(&name, "Configuration name")?;
            Ok(name)
        })
        .collect()
}
