//! Compiled content filters and the requests they judge.

use indexmap::{IndexMap, IndexSet};
use std::fmt;
use tracing::debug;

use sprig_attributes::{Attribute, ImmutableAttributes, Value};
use sprig_core::types::{ModuleComponentIdentifier, ModuleIdentifier};

use super::spec::SpecMatcher;

/// What a repository is being asked for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentRequest {
    /// List the versions of a module (no version known yet)
    Listing(ModuleIdentifier),
    /// Resolve a concrete component
    Component(ModuleComponentIdentifier),
}

impl ContentRequest {
    pub fn module_id(&self) -> ModuleIdentifier {
        match self {
            ContentRequest::Listing(id) => id.clone(),
            ContentRequest::Component(id) => id.module_identifier(),
        }
    }
}

impl fmt::Display for ContentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentRequest::Listing(id) => write!(f, "{} (version listing)", id),
            ContentRequest::Component(id) => write!(f, "{}", id),
        }
    }
}

/// A request handed to a content filter, which may mark it not found
#[derive(Debug, Clone)]
pub struct ArtifactResolutionDetails {
    request: ContentRequest,
    configuration: Option<String>,
    consumer_attributes: ImmutableAttributes,
    not_found: bool,
}

impl ArtifactResolutionDetails {
    pub fn new(request: ContentRequest) -> Self {
        Self {
            request,
            configuration: None,
            consumer_attributes: ImmutableAttributes::empty(),
            not_found: false,
        }
    }

    /// Request for a concrete component
    pub fn for_component(id: ModuleComponentIdentifier) -> Self {
        Self::new(ContentRequest::Component(id))
    }

    /// Request listing the versions of a module
    pub fn for_listing(id: ModuleIdentifier) -> Self {
        Self::new(ContentRequest::Listing(id))
    }

    pub fn with_configuration(mut self, name: impl Into<String>) -> Self {
        self.configuration = Some(name.into());
        self
    }

    pub fn with_consumer_attributes(mut self, attributes: ImmutableAttributes) -> Self {
        self.consumer_attributes = attributes;
        self
    }

    pub fn request(&self) -> &ContentRequest {
        &self.request
    }

    pub fn module_id(&self) -> ModuleIdentifier {
        self.request.module_id()
    }

    pub fn component_id(&self) -> Option<&ModuleComponentIdentifier> {
        match &self.request {
            ContentRequest::Component(id) => Some(id),
            ContentRequest::Listing(_) => None,
        }
    }

    pub fn is_version_listing(&self) -> bool {
        matches!(self.request, ContentRequest::Listing(_))
    }

    pub fn configuration_name(&self) -> Option<&str> {
        self.configuration.as_deref()
    }

    pub fn consumer_attributes(&self) -> &ImmutableAttributes {
        &self.consumer_attributes
    }

    /// Mark the request as not servable by this repository
    pub fn not_found(&mut self) {
        self.not_found = true;
    }

    pub fn is_not_found(&self) -> bool {
        self.not_found
    }
}

/// Immutable filter compiled from a content descriptor
///
/// Absent (`None`) rule groups are not evaluated at all.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub(crate) repository: String,
    pub(crate) included_configurations: Option<IndexSet<String>>,
    pub(crate) excluded_configurations: Option<IndexSet<String>>,
    pub(crate) includes: Option<Vec<SpecMatcher>>,
    pub(crate) excludes: Option<Vec<SpecMatcher>>,
    pub(crate) required_attributes: Option<IndexMap<Attribute, IndexSet<Value>>>,
}

impl ContentFilter {
    pub(crate) fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            ..Self::default()
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Check if this filter admits every request
    pub fn is_noop(&self) -> bool {
        self.included_configurations.is_none()
            && self.excluded_configurations.is_none()
            && self.includes.is_none()
            && self.excludes.is_none()
            && self.required_attributes.is_none()
    }

    /// Apply the filter, marking rejected requests not found
    pub fn execute(&self, details: &mut ArtifactResolutionDetails) {
        if !self.allows(details) {
            details.not_found();
        }
    }

    /// Evaluate the filter without touching the request
    pub fn allows(&self, details: &ArtifactResolutionDetails) -> bool {
        let configuration = details.configuration_name();

        if let Some(included) = &self.included_configurations {
            if !configuration.map_or(false, |name| included.contains(name)) {
                return self.reject(details, "configuration not in allow-list");
            }
        }
        if let (Some(excluded), Some(name)) = (&self.excluded_configurations, configuration) {
            if excluded.contains(name) {
                return self.reject(details, "configuration excluded");
            }
        }
        if let Some(includes) = &self.includes {
            if !includes.iter().any(|matcher| matcher.matches(details.request())) {
                return self.reject(details, "no include rule matched");
            }
        }
        if let Some(excludes) = &self.excludes {
            if excludes.iter().any(|matcher| matcher.matches(details.request())) {
                return self.reject(details, "exclude rule matched");
            }
        }
        if let Some(required) = &self.required_attributes {
            for (attribute, allowed) in required {
                let actual = details.consumer_attributes().find_entry(attribute).present();
                if !actual.map_or(false, |value| allowed.contains(&value)) {
                    return self.reject(details, "required attribute not satisfied");
                }
            }
        }
        true
    }

    fn reject(&self, details: &ArtifactResolutionDetails, reason: &str) -> bool {
        debug!(
            "Repository '{}' does not serve {}: {}",
            self.repository,
            details.request(),
            reason
        );
        false
    }
}
