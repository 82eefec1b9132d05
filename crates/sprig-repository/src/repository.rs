//! Repositories and repository selection.

use std::sync::Arc;
use tracing::debug;

use crate::content::{ArtifactResolutionDetails, ContentFilter, RepositoryContentDescriptor};

/// A named repository with its content rules
#[derive(Debug)]
pub struct Repository {
    name: String,
    url: Option<String>,
    content: RepositoryContentDescriptor,
}

impl Repository {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            content: RepositoryContentDescriptor::new(name.clone()),
            name,
            url: None,
        }
    }

    /// Repository using an already configured descriptor
    pub fn with_content(name: impl Into<String>, content: RepositoryContentDescriptor) -> Self {
        Self {
            name: name.into(),
            url: None,
            content,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn content(&self) -> &RepositoryContentDescriptor {
        &self.content
    }

    /// Compiled filter (locks the content descriptor)
    pub fn content_filter(&self) -> Arc<ContentFilter> {
        self.content.to_content_filter()
    }

    /// Check if this repository may serve the request
    pub fn is_eligible(&self, details: &ArtifactResolutionDetails) -> bool {
        self.content_filter().allows(details)
    }
}

/// Picks the repositories eligible for a request, in declaration order
#[derive(Debug, Default, Clone)]
pub struct RepositorySelector {
    repositories: Vec<Arc<Repository>>,
}

impl RepositorySelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, repository: Repository) -> &mut Self {
        self.repositories.push(Arc::new(repository));
        self
    }

    pub fn repositories(&self) -> &[Arc<Repository>] {
        &self.repositories
    }

    pub fn find(&self, name: &str) -> Option<&Arc<Repository>> {
        self.repositories.iter().find(|repository| repository.name() == name)
    }

    /// Repositories whose content filter admits the request
    pub fn select(&self, details: &ArtifactResolutionDetails) -> Vec<Arc<Repository>> {
        let eligible: Vec<Arc<Repository>> = self
            .repositories
            .iter()
            .filter(|repository| repository.is_eligible(details))
            .cloned()
            .collect();
        debug!(
            "{} of {} repositories eligible for {}",
            eligible.len(),
            self.repositories.len(),
            details.request()
        );
        eligible
    }

    /// Lock every repository's content descriptor
    pub fn lock_all(&self) {
        for repository in &self.repositories {
            repository.content_filter();
        }
    }
}
