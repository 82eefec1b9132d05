//! Module, component and artifact identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SprigError;

/// Module coordinates without a version (`group:name`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleIdentifier {
    pub group: String,
    pub name: String,
}

/// Fully versioned component coordinates (`group:module:version`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleComponentIdentifier {
    pub group: String,
    pub module: String,
    pub version: String,
}

/// Name of an artifact within a component
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactName {
    pub name: String,
    pub extension: String,
    pub classifier: Option<String>,
}

/// An artifact owned by a specific component
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentArtifactIdentifier {
    pub component: ModuleComponentIdentifier,
    pub name: ArtifactName,
}

impl ModuleIdentifier {
    /// Create a new module identifier
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl ModuleComponentIdentifier {
    /// Create a new component identifier
    pub fn new(
        group: impl Into<String>,
        module: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            module: module.into(),
            version: version.into(),
        }
    }

    /// Get the unversioned module this component belongs to
    pub fn module_identifier(&self) -> ModuleIdentifier {
        ModuleIdentifier::new(self.group.clone(), self.module.clone())
    }
}

impl ArtifactName {
    /// Create an artifact name without classifier
    pub fn new(name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extension: extension.into(),
            classifier: None,
        }
    }

    /// Attach a classifier
    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    /// File name as it would appear in a repository layout
    pub fn file_name(&self, version: &str) -> String {
        match &self.classifier {
            Some(classifier) => format!("{}-{}-{}.{}", self.name, version, classifier, self.extension),
            None => format!("{}-{}.{}", self.name, version, self.extension),
        }
    }
}

impl ComponentArtifactIdentifier {
    /// Create a new artifact identifier
    pub fn new(component: ModuleComponentIdentifier, name: ArtifactName) -> Self {
        Self { component, name }
    }

    /// File name of the artifact
    pub fn file_name(&self) -> String {
        self.name.file_name(&self.component.version)
    }
}

fn split_coordinates(input: &str, expected: usize) -> Result<Vec<&str>, SprigError> {
    let parts: Vec<&str> = input.trim().split(':').collect();
    if parts.len() != expected || parts.iter().any(|p| p.is_empty()) {
        return Err(SprigError::invalid_argument(format!(
            "Expected {} colon-separated coordinates but got '{}'",
            expected, input
        )));
    }
    Ok(parts)
}

impl FromStr for ModuleIdentifier {
    type Err = SprigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = split_coordinates(s, 2)?;
        Ok(Self::new(parts[0], parts[1]))
    }
}

impl FromStr for ModuleComponentIdentifier {
    type Err = SprigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = split_coordinates(s, 3)?;
        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl FromStr for ArtifactName {
    type Err = SprigError;

    /// Parse `name:ext[:classifier]` or a plain `name.ext` file name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let parts: Vec<&str> = input.split(':').collect();
        match parts.as_slice() {
            [name, extension] if !name.is_empty() && !extension.is_empty() => {
                Ok(Self::new(*name, *extension))
            },
            [name, extension, classifier]
                if !name.is_empty() && !extension.is_empty() && !classifier.is_empty() =>
            {
                Ok(Self::new(*name, *extension).with_classifier(*classifier))
            },
            _ => match input.rsplit_once('.') {
                Some((name, extension)) if !name.is_empty() && !extension.is_empty() => {
                    Ok(Self::new(name, extension))
                },
                _ => Err(SprigError::invalid_argument(format!(
                    "Invalid artifact name '{}'",
                    input
                ))),
            },
        }
    }
}

impl fmt::Display for ModuleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

impl fmt::Display for ModuleComponentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.module, self.version)
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.classifier {
            Some(classifier) => write!(f, "{}-{}.{}", self.name, classifier, self.extension),
            None => write!(f, "{}.{}", self.name, self.extension),
        }
    }
}

impl fmt::Display for ComponentArtifactIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.file_name(), self.component)
    }
}
