//! Include/exclude specs and their compiled matchers.

use regex::Regex;
use std::fmt;
use std::sync::Arc;

use sprig_core::error::{SprigError, SprigResult};
use sprig_core::selector::VersionSelector;
use sprig_core::types::{ModuleComponentIdentifier, ModuleIdentifier};

use super::filter::ContentRequest;
use super::selectors::VersionSelectorCache;

/// How the text of a spec is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatcherKind {
    /// Exact group/module, version exact or via selector
    Simple,
    /// Group equals the prefix or is nested below it (`prefix.`)
    SubGroup,
    /// Full-match regular expressions
    Regex,
}

/// One include or exclude rule
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentSpec {
    pub kind: MatcherKind,
    pub group: String,
    pub module: Option<String>,
    pub version: Option<String>,
    pub inclusive: bool,
}

/// Compiled form of a [`ContentSpec`]
#[derive(Clone)]
pub(crate) enum SpecMatcher {
    Simple {
        group: String,
        module: Option<String>,
        version: Option<String>,
        selector: Option<Arc<dyn VersionSelector>>,
        inclusive: bool,
        include_subgroups: bool,
    },
    Pattern {
        group: Regex,
        module: Option<Regex>,
        version: Option<Regex>,
        inclusive: bool,
    },
}

impl ContentSpec {
    /// Compile into a matcher, validating regexes and version selectors
    pub(crate) fn to_matcher(&self, selectors: &VersionSelectorCache) -> SprigResult<SpecMatcher> {
        match self.kind {
            MatcherKind::Simple | MatcherKind::SubGroup => {
                // Only include specs consult version selectors
                let selector = match (&self.version, self.inclusive) {
                    (Some(version), true) => Some(selectors.get_or_parse(version)?),
                    _ => None,
                };
                Ok(SpecMatcher::Simple {
                    group: self.group.clone(),
                    module: self.module.clone(),
                    version: self.version.clone(),
                    selector,
                    inclusive: self.inclusive,
                    include_subgroups: self.kind == MatcherKind::SubGroup,
                })
            },
            MatcherKind::Regex => Ok(SpecMatcher::Pattern {
                group: full_match(&self.group)?,
                module: self.module.as_deref().map(full_match).transpose()?,
                version: self.version.as_deref().map(full_match).transpose()?,
                inclusive: self.inclusive,
            }),
        }
    }
}

fn full_match(pattern: &str) -> SprigResult<Regex> {
    Regex::new(&format!("^(?:{})$", pattern))
        .map_err(|source| SprigError::invalid_pattern(pattern, source))
}

impl SpecMatcher {
    pub(crate) fn matches(&self, request: &ContentRequest) -> bool {
        match request {
            ContentRequest::Listing(id) => self.matches_module(id),
            ContentRequest::Component(id) => self.matches_component(id),
        }
    }

    /// Version listings have no version yet; exclude specs that pin a
    /// version cannot apply to them
    fn matches_module(&self, id: &ModuleIdentifier) -> bool {
        match self {
            SpecMatcher::Simple {
                group,
                module,
                version,
                inclusive,
                include_subgroups,
                ..
            } => {
                group_matches(group, &id.group, *include_subgroups)
                    && module.as_ref().map_or(true, |module| module == &id.name)
                    && (*inclusive || version.is_none())
            },
            SpecMatcher::Pattern {
                group,
                module,
                version,
                inclusive,
            } => {
                group.is_match(&id.group)
                    && module.as_ref().map_or(true, |module| module.is_match(&id.name))
                    && (*inclusive || version.is_none())
            },
        }
    }

    fn matches_component(&self, id: &ModuleComponentIdentifier) -> bool {
        match self {
            SpecMatcher::Simple {
                group,
                module,
                version,
                selector,
                include_subgroups,
                ..
            } => {
                group_matches(group, &id.group, *include_subgroups)
                    && module.as_ref().map_or(true, |module| module == &id.module)
                    && match version {
                        None => true,
                        Some(version) => {
                            version == &id.version
                                || selector
                                    .as_ref()
                                    .map_or(false, |selector| selector.accept(&id.version))
                        },
                    }
            },
            SpecMatcher::Pattern {
                group,
                module,
                version,
                ..
            } => {
                group.is_match(&id.group)
                    && module.as_ref().map_or(true, |module| module.is_match(&id.module))
                    && version.as_ref().map_or(true, |version| version.is_match(&id.version))
            },
        }
    }
}

fn group_matches(group: &str, candidate: &str, include_subgroups: bool) -> bool {
    match candidate.strip_prefix(group) {
        Some("") => true,
        Some(rest) => include_subgroups && rest.starts_with('.'),
        None => false,
    }
}

impl fmt::Debug for SpecMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecMatcher::Simple {
                group,
                module,
                version,
                inclusive,
                include_subgroups,
                ..
            } => f
                .debug_struct("Simple")
                .field("group", group)
                .field("module", module)
                .field("version", version)
                .field("inclusive", inclusive)
                .field("include_subgroups", include_subgroups)
                .finish(),
            SpecMatcher::Pattern {
                group,
                module,
                version,
                inclusive,
            } => f
                .debug_struct("Pattern")
                .field("group", &group.as_str())
                .field("module", &module.as_ref().map(|r| r.as_str()))
                .field("version", &version.as_ref().map(|r| r.as_str()))
                .field("inclusive", inclusive)
                .finish(),
        }
    }
}

impl fmt::Display for ContentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.group)?;
        if let Some(module) = &self.module {
            write!(f, ":{}", module)?;
        }
        if let Some(version) = &self.version {
            write!(f, ":{}", version)?;
        }
        Ok(())
    }
}
