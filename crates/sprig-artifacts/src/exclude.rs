//! Artifact exclusions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use sprig_core::types::{ArtifactName, ModuleIdentifier};

/// Predicate deciding whether an artifact of a module is excluded
pub trait ExcludeSpec: fmt::Debug + Send + Sync {
    fn excludes_artifact(&self, module: &ModuleIdentifier, artifact: &ArtifactName) -> bool;

    /// Whether this spec can ever exclude an artifact
    fn may_exclude_artifacts(&self) -> bool {
        true
    }
}

/// Excludes nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct ExcludeNothing;

impl ExcludeSpec for ExcludeNothing {
    fn excludes_artifact(&self, _module: &ModuleIdentifier, _artifact: &ArtifactName) -> bool {
        false
    }

    fn may_exclude_artifacts(&self) -> bool {
        false
    }
}

/// Structured exclusion; `None` fields match anything
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExcludeRule {
    pub group: Option<String>,
    pub module: Option<String>,
    pub artifact: Option<String>,
    pub extension: Option<String>,
}

impl ExcludeRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn artifact(mut self, artifact: impl Into<String>) -> Self {
        self.artifact = Some(artifact.into());
        self
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }
}

fn field_matches(expected: &Option<String>, actual: &str) -> bool {
    expected.as_deref().map_or(true, |expected| expected == actual)
}

impl ExcludeSpec for ExcludeRule {
    fn excludes_artifact(&self, module: &ModuleIdentifier, artifact: &ArtifactName) -> bool {
        field_matches(&self.group, &module.group)
            && field_matches(&self.module, &module.name)
            && field_matches(&self.artifact, &artifact.name)
            && field_matches(&self.extension, &artifact.extension)
    }
}

/// Excludes what any of its specs excludes
#[derive(Debug, Clone, Default)]
pub struct ExcludeAny {
    specs: Vec<Arc<dyn ExcludeSpec>>,
}

impl ExcludeAny {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<S: ExcludeSpec + 'static>(mut self, spec: S) -> Self {
        self.specs.push(Arc::new(spec));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl ExcludeSpec for ExcludeAny {
    fn excludes_artifact(&self, module: &ModuleIdentifier, artifact: &ArtifactName) -> bool {
        self.specs
            .iter()
            .any(|spec| spec.excludes_artifact(module, artifact))
    }

    fn may_exclude_artifacts(&self) -> bool {
        self.specs.iter().any(|spec| spec.may_exclude_artifacts())
    }
}

/// Closure-backed exclusion
pub struct ExcludeFn<F> {
    name: String,
    predicate: F,
}

impl<F> ExcludeFn<F>
where
    F: Fn(&ModuleIdentifier, &ArtifactName) -> bool + Send + Sync,
{
    pub fn new(name: impl Into<String>, predicate: F) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }
}

impl<F> fmt::Debug for ExcludeFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExcludeFn").field(&self.name).finish()
    }
}

impl<F> ExcludeSpec for ExcludeFn<F>
where
    F: Fn(&ModuleIdentifier, &ArtifactName) -> bool + Send + Sync,
{
    fn excludes_artifact(&self, module: &ModuleIdentifier, artifact: &ArtifactName) -> bool {
        (self.predicate)(module, artifact)
    }
}
