//! sprig.toml configuration parsing and serialization

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::ops::Range;

use sprig_artifacts::{Capability, ExcludeRule};
use sprig_core::error::SprigError;
use sprig_core::types::{ArtifactName, ModuleComponentIdentifier, ModuleIdentifier};

use crate::ConfigResult;

/// Complete sprig.toml configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SprigToml {
    /// Consumer attributes schema
    #[serde(default)]
    pub schema: SchemaSection,

    /// Schema published by producers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer_schema: Option<SchemaSection>,

    /// Repositories in declaration order
    #[serde(default)]
    pub repositories: Vec<RepositorySection>,

    /// Components available for selection
    #[serde(default)]
    pub components: Vec<ComponentSection>,

    /// Attributes implied by artifact extensions
    #[serde(default)]
    pub artifact_types: IndexMap<String, ArtifactTypeSection>,

    /// Artifacts excluded from every selection
    #[serde(default)]
    pub excludes: Vec<ExcludeRule>,
}

/// Attributes schema section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSection {
    /// Schema name, used in error messages
    #[serde(default = "default_schema_name")]
    pub name: String,

    /// Attributes disambiguated first, in order
    #[serde(default)]
    pub precedence: Vec<String>,

    /// Declared attributes
    #[serde(default)]
    pub attributes: IndexMap<String, AttributeSection>,
}

/// One declared attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSection {
    /// `string`, `boolean`, or the name of a named type
    #[serde(rename = "type", default = "default_attribute_type")]
    pub value_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility: Option<CompatibilitySection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub disambiguation: Option<DisambiguationSection>,
}

/// Ordered compatibility rule
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompatibilitySection {
    /// Value ranking; natural ordering when empty
    #[serde(default)]
    pub order: Vec<String>,

    /// Accept producer values above the requested one instead of below
    #[serde(default)]
    pub reverse: bool,
}

/// Ordered disambiguation rule
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisambiguationSection {
    /// Value ranking; natural ordering when empty
    #[serde(default)]
    pub order: Vec<String>,

    #[serde(default)]
    pub pick: PickStrategy,
}

/// Which end of the ordering wins disambiguation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickStrategy {
    #[default]
    First,
    Last,
}

/// Repository with content rules
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepositorySection {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default)]
    pub include_groups: Vec<String>,
    #[serde(default)]
    pub include_groups_and_subgroups: Vec<String>,
    #[serde(default)]
    pub include_group_regexes: Vec<String>,
    /// `group:module`
    #[serde(default)]
    pub include_modules: Vec<String>,
    #[serde(default)]
    pub include_module_regexes: Vec<String>,
    /// `group:module:version`, where version may be a selector
    #[serde(default)]
    pub include_versions: Vec<String>,
    #[serde(default)]
    pub include_version_regexes: Vec<String>,

    #[serde(default)]
    pub exclude_groups: Vec<String>,
    #[serde(default)]
    pub exclude_groups_and_subgroups: Vec<String>,
    #[serde(default)]
    pub exclude_group_regexes: Vec<String>,
    #[serde(default)]
    pub exclude_modules: Vec<String>,
    #[serde(default)]
    pub exclude_module_regexes: Vec<String>,
    #[serde(default)]
    pub exclude_versions: Vec<String>,
    #[serde(default)]
    pub exclude_version_regexes: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_for_configurations: Option<Vec<String>>,
    #[serde(default)]
    pub not_for_configurations: Vec<String>,
    #[serde(default)]
    pub only_for_attributes: IndexMap<String, Vec<AttributeValueSpec>>,
}

/// Component and its variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSection {
    /// `group:module:version`
    pub coordinates: String,

    #[serde(default)]
    pub variants: Vec<VariantSection>,
}

/// A variant of a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSection {
    pub name: String,

    #[serde(default)]
    pub attributes: IndexMap<String, AttributeValueSpec>,

    /// Artifact file names (`core.jar`) or `name:ext[:classifier]`
    #[serde(default)]
    pub artifacts: Vec<String>,

    /// `group:name[:version]`
    #[serde(default)]
    pub capabilities: Vec<String>,

    /// Whether resolutions of this variant may be cached
    #[serde(default = "default_true")]
    pub cacheable: bool,
}

/// Attributes implied by an artifact type
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArtifactTypeSection {
    #[serde(default)]
    pub attributes: IndexMap<String, AttributeValueSpec>,
}

/// Attribute value as written in TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValueSpec {
    Boolean(bool),
    String(String),
}

impl fmt::Display for AttributeValueSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValueSpec::Boolean(value) => write!(f, "{}", value),
            AttributeValueSpec::String(value) => write!(f, "{}", value),
        }
    }
}

impl Default for SchemaSection {
    fn default() -> Self {
        Self {
            name: default_schema_name(),
            precedence: Vec::new(),
            attributes: IndexMap::new(),
        }
    }
}

fn default_schema_name() -> String {
    "consumer".to_string()
}

fn default_attribute_type() -> String {
    "string".to_string()
}

fn default_true() -> bool {
    true
}

/// Parse TOML string to SprigToml configuration
pub fn parse_sprig_toml(content: &str) -> ConfigResult<SprigToml> {
    // Syntax first, for precise error locations
    content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| toml_error(content, e.message(), e.span()))?;

    let config: SprigToml =
        toml::from_str(content).map_err(|e| toml_error(content, e.message(), e.span()))?;

    validate_config(&config)?;
    Ok(config)
}

/// Serialize SprigToml to TOML string
pub fn serialize_sprig_toml(config: &SprigToml) -> ConfigResult<String> {
    toml::to_string_pretty(config).map_err(|e| SprigError::TomlParse {
        message: format!("TOML serialization error: {}", e),
        line: 0,
        column: 0,
    })
}

/// Load and parse sprig.toml from file path
pub async fn load_from_file(path: &camino::Utf8Path) -> ConfigResult<SprigToml> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SprigError::io(format!("Failed to read {}", path), e))?;

    parse_sprig_toml(&content).map_err(|e| match e {
        SprigError::TomlParse {
            message,
            line,
            column,
        } => SprigError::TomlParse {
            message: format!("In file {}: {}", path, message),
            line,
            column,
        },
        SprigError::ConfigValidation { field, reason } => SprigError::ConfigValidation {
            field,
            reason: format!("In file {}: {}", path, reason),
        },
        other => other,
    })
}

fn toml_error(content: &str, message: &str, span: Option<Range<usize>>) -> SprigError {
    let (line, column) = span
        .map(|span| line_column(content, span.start))
        .unwrap_or((0, 0));
    SprigError::TomlParse {
        message: message.trim().to_string(),
        line,
        column,
    }
}

/// 1-based line and column of a byte offset
pub(crate) fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(content.len());
    let before = content.get(..offset).unwrap_or(content);
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map_or(before.chars().count(), |newline| before[newline + 1..].chars().count())
        + 1;
    (line, column)
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> SprigError {
    SprigError::ConfigValidation {
        field: field.into(),
        reason: reason.into(),
    }
}

/// Validate configuration completeness
pub fn validate_config(config: &SprigToml) -> ConfigResult<()> {
    validate_schema("schema", &config.schema)?;
    if let Some(producer) = &config.producer_schema {
        validate_schema("producer-schema", producer)?;
    }

    let mut repository_names = HashSet::new();
    for (index, repository) in config.repositories.iter().enumerate() {
        let field = format!("repositories[{}]", index);
        if repository.name.trim().is_empty() {
            return Err(invalid(format!("{}.name", field), "Repository name is required"));
        }
        if !repository_names.insert(repository.name.as_str()) {
            return Err(invalid(
                format!("{}.name", field),
                format!("Duplicate repository '{}'", repository.name),
            ));
        }
        validate_repository(&field, repository)?;
    }

    for (index, component) in config.components.iter().enumerate() {
        validate_component(&format!("components[{}]", index), component)?;
    }

    for (extension, artifact_type) in &config.artifact_types {
        if extension.trim().is_empty() {
            return Err(invalid("artifact-types", "Artifact type extension cannot be empty"));
        }
        if artifact_type.attributes.is_empty() {
            return Err(invalid(
                format!("artifact-types.{}", extension),
                "Artifact type must declare at least one attribute",
            ));
        }
    }

    Ok(())
}

fn validate_schema(field: &str, schema: &SchemaSection) -> ConfigResult<()> {
    if schema.name.trim().is_empty() {
        return Err(invalid(format!("{}.name", field), "Schema name cannot be empty"));
    }
    for (name, attribute) in &schema.attributes {
        if attribute.value_type.trim().is_empty() {
            return Err(invalid(
                format!("{}.attributes.{}.type", field, name),
                "Attribute type cannot be empty",
            ));
        }
    }

    let mut seen = HashSet::new();
    for name in &schema.precedence {
        if !schema.attributes.contains_key(name) {
            return Err(invalid(
                format!("{}.precedence", field),
                format!("Attribute '{}' is not declared in the schema", name),
            ));
        }
        if !seen.insert(name.as_str()) {
            return Err(invalid(
                format!("{}.precedence", field),
                format!("Attribute '{}' is listed twice", name),
            ));
        }
    }
    Ok(())
}

fn validate_repository(field: &str, repository: &RepositorySection) -> ConfigResult<()> {
    let modules = repository
        .include_modules
        .iter()
        .map(|m| ("include-modules", m))
        .chain(repository.exclude_modules.iter().map(|m| ("exclude-modules", m)));
    for (list, module) in modules {
        module.parse::<ModuleIdentifier>().map_err(|e| {
            invalid(format!("{}.{}", field, list), e.to_string())
        })?;
    }

    let versions = repository
        .include_versions
        .iter()
        .map(|v| ("include-versions", v))
        .chain(repository.exclude_versions.iter().map(|v| ("exclude-versions", v)));
    for (list, version) in versions {
        split_version(version).map_err(|reason| invalid(format!("{}.{}", field, list), reason))?;
    }

    let module_regexes = repository
        .include_module_regexes
        .iter()
        .map(|m| ("include-module-regexes", m))
        .chain(
            repository
                .exclude_module_regexes
                .iter()
                .map(|m| ("exclude-module-regexes", m)),
        );
    for (list, module) in module_regexes {
        split_module(module).map_err(|reason| invalid(format!("{}.{}", field, list), reason))?;
    }

    let version_regexes = repository
        .include_version_regexes
        .iter()
        .map(|v| ("include-version-regexes", v))
        .chain(
            repository
                .exclude_version_regexes
                .iter()
                .map(|v| ("exclude-version-regexes", v)),
        );
    for (list, version) in version_regexes {
        split_version(version).map_err(|reason| invalid(format!("{}.{}", field, list), reason))?;
    }

    for (attribute, values) in &repository.only_for_attributes {
        if values.is_empty() {
            return Err(invalid(
                format!("{}.only-for-attributes.{}", field, attribute),
                "At least one allowed value is required",
            ));
        }
    }
    Ok(())
}

fn validate_component(field: &str, component: &ComponentSection) -> ConfigResult<()> {
    component
        .coordinates
        .parse::<ModuleComponentIdentifier>()
        .map_err(|e| invalid(format!("{}.coordinates", field), e.to_string()))?;

    let mut names = HashSet::new();
    for (index, variant) in component.variants.iter().enumerate() {
        let variant_field = format!("{}.variants[{}]", field, index);
        if variant.name.trim().is_empty() {
            return Err(invalid(format!("{}.name", variant_field), "Variant name is required"));
        }
        if !names.insert(variant.name.as_str()) {
            return Err(invalid(
                format!("{}.name", variant_field),
                format!("Duplicate variant '{}' in {}", variant.name, component.coordinates),
            ));
        }
        for artifact in &variant.artifacts {
            artifact
                .parse::<ArtifactName>()
                .map_err(|e| invalid(format!("{}.artifacts", variant_field), e.to_string()))?;
        }
        for capability in &variant.capabilities {
            capability
                .parse::<Capability>()
                .map_err(|e| invalid(format!("{}.capabilities", variant_field), e.to_string()))?;
        }
    }
    Ok(())
}

/// Split `group:module` where either side may be a pattern
pub(crate) fn split_module(input: &str) -> Result<(&str, &str), String> {
    match input.splitn(2, ':').collect::<Vec<_>>().as_slice() {
        [group, module] if !group.is_empty() && !module.is_empty() => Ok((*group, *module)),
        _ => Err(format!("Expected 'group:module' but got '{}'", input)),
    }
}

/// Split `group:module:version`; the version keeps any further colons
pub(crate) fn split_version(input: &str) -> Result<(&str, &str, &str), String> {
    match input.splitn(3, ':').collect::<Vec<_>>().as_slice() {
        [group, module, version] if !group.is_empty() && !module.is_empty() && !version.is_empty() => {
            Ok((*group, *module, *version))
        },
        _ => Err(format!("Expected 'group:module:version' but got '{}'", input)),
    }
}

#[cfg(test)]
mod tests;
