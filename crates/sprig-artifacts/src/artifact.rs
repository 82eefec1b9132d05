//! Capabilities provided by variants.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use sprig_core::error::SprigError;
use sprig_core::types::ModuleComponentIdentifier;

/// Something a variant provides (`group:name:version`)
///
/// Two variants providing the same capability conflict in a graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Capability {
    pub group: String,
    pub name: String,
    pub version: Option<String>,
}

impl Capability {
    pub fn new(group: impl Into<String>, name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version,
        }
    }

    /// Implicit capability of a component: its own coordinates
    pub fn default_for(component: &ModuleComponentIdentifier) -> Self {
        Self::new(
            component.group.clone(),
            component.module.clone(),
            Some(component.version.clone()),
        )
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}:{}:{}", self.group, self.name, version),
            None => write!(f, "{}:{}", self.group, self.name),
        }
    }
}

impl FromStr for Capability {
    type Err = SprigError;

    /// Parse `group:name` or `group:name:version`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        match parts.as_slice() {
            [group, name] if !group.is_empty() && !name.is_empty() => {
                Ok(Self::new(*group, *name, None))
            },
            [group, name, version]
                if !group.is_empty() && !name.is_empty() && !version.is_empty() =>
            {
                Ok(Self::new(*group, *name, Some(version.to_string())))
            },
            _ => Err(SprigError::invalid_argument(format!(
                "Invalid capability '{}', expected group:name[:version]",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capability() {
        let component: ModuleComponentIdentifier = "org.lib:core:2.1".parse().unwrap();
        let capability = Capability::default_for(&component);
        assert_eq!(capability.to_string(), "org.lib:core:2.1");
    }

    #[test]
    fn test_parse_capability() {
        let capability: Capability = "org.lib:core-test-fixtures".parse().unwrap();
        assert_eq!(capability.version, None);
        assert_eq!(capability.to_string(), "org.lib:core-test-fixtures");

        assert!("org.lib".parse::<Capability>().is_err());
        assert!("org.lib::1.0".parse::<Capability>().is_err());
    }
}
