//! Runtime objects built from a parsed sprig.toml

use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

use sprig_artifacts::{
    ArtifactIoResolver, Capability, ComponentMetadata, DefaultArtifactTypeRegistry, ExcludeAny,
    VariantArtifactResolver, VariantResolveMetadata,
};
use sprig_attributes::{
    Attribute, AttributeMatcher, AttributeType, AttributesFactory, AttributesSchema,
    ImmutableAttributes, Value, ValueOrdering,
};
use sprig_core::error::SprigError;
use sprig_core::types::{ArtifactName, ModuleComponentIdentifier, ModuleIdentifier};
use sprig_repository::{Repository, RepositorySelector, VersionSelectorCache};

use crate::toml::{
    split_module, split_version, AttributeSection, AttributeValueSpec, PickStrategy,
    RepositorySection, SchemaSection, SprigToml,
};
use crate::ConfigResult;

/// Everything a sprig.toml describes, ready for matching and selection
#[derive(Debug)]
pub struct SprigModel {
    factory: AttributesFactory,
    consumer: AttributesSchema,
    producer: AttributesSchema,
    repositories: RepositorySelector,
    components: Vec<ComponentMetadata>,
    registry: Arc<DefaultArtifactTypeRegistry>,
    exclusions: ExcludeAny,
}

impl SprigModel {
    /// Build the model described by `config`
    pub fn build(config: &SprigToml) -> ConfigResult<Self> {
        let factory = AttributesFactory::new();
        let consumer = build_schema(&config.schema)?;
        let producer = match &config.producer_schema {
            Some(section) => build_schema(section)?,
            None => AttributesSchema::new("producer"),
        };

        let mut model = Self {
            registry: Arc::new(DefaultArtifactTypeRegistry::with_factory(factory.clone())),
            factory,
            consumer,
            producer,
            repositories: RepositorySelector::new(),
            components: Vec::new(),
            exclusions: ExcludeAny::new(),
        };

        let mut registry = DefaultArtifactTypeRegistry::with_factory(model.factory.clone());
        for (extension, section) in &config.artifact_types {
            let field = format!("artifact-types.{}", extension);
            let attributes = model.attributes_of(&section.attributes, &field)?;
            registry.register(extension.clone(), attributes);
        }
        model.registry = Arc::new(registry);

        let selectors = VersionSelectorCache::default();
        for section in &config.repositories {
            let repository = model.build_repository(section, &selectors)?;
            model.repositories.add(repository);
        }

        for section in &config.components {
            let id: ModuleComponentIdentifier = section.coordinates.parse()?;
            let mut component = ComponentMetadata::new(id.clone());
            for variant in &section.variants {
                let field = format!("{} variant '{}'", id, variant.name);
                let attributes = model.attributes_of(&variant.attributes, &field)?;
                let mut metadata = VariantResolveMetadata::new(id.clone(), variant.name.clone(), attributes);
                for artifact in &variant.artifacts {
                    metadata = metadata.with_artifact(artifact.parse::<ArtifactName>()?);
                }
                for capability in &variant.capabilities {
                    metadata = metadata.with_capability(capability.parse::<Capability>()?);
                }
                if !variant.cacheable {
                    metadata = metadata.ineligible_for_caching();
                }
                component = component.with_variant(metadata);
            }
            model.components.push(component);
        }

        model.exclusions = config
            .excludes
            .iter()
            .cloned()
            .fold(ExcludeAny::new(), |exclusions, rule| exclusions.with(rule));

        debug!(
            "Built model with {} repositories and {} components",
            model.repositories.repositories().len(),
            model.components.len()
        );
        Ok(model)
    }

    pub fn consumer_schema(&self) -> &AttributesSchema {
        &self.consumer
    }

    pub fn producer_schema(&self) -> &AttributesSchema {
        &self.producer
    }

    /// Matcher over both schemas (locks them)
    pub fn matcher(&self) -> AttributeMatcher {
        self.consumer.with_producer(&self.producer)
    }

    pub fn repositories(&self) -> &RepositorySelector {
        &self.repositories
    }

    pub fn components(&self) -> &[ComponentMetadata] {
        &self.components
    }

    /// Component by `group:module` or `group:module:version`
    pub fn component(&self, coordinates: &str) -> Option<&ComponentMetadata> {
        if let Ok(id) = coordinates.parse::<ModuleComponentIdentifier>() {
            return self.components.iter().find(|c| c.id() == &id);
        }
        let module = coordinates.parse::<ModuleIdentifier>().ok()?;
        self.components
            .iter()
            .find(|c| c.id().module_identifier() == module)
    }

    pub fn exclusions(&self) -> &ExcludeAny {
        &self.exclusions
    }

    pub fn factory(&self) -> &AttributesFactory {
        &self.factory
    }

    /// Resolver using the configured artifact types
    pub fn variant_resolver(&self, io: Arc<dyn ArtifactIoResolver>) -> VariantArtifactResolver {
        VariantArtifactResolver::new(self.registry.clone(), io)
    }

    /// Attribute as declared by either schema, or a string attribute
    pub fn attribute(&self, name: &str) -> Attribute {
        self.consumer
            .attribute_by_name(name)
            .or_else(|| self.producer.attribute_by_name(name))
            .unwrap_or_else(|| Attribute::string(name))
    }

    /// Requested attributes from `name=value` pairs
    pub fn requested<I, S>(&self, pairs: I) -> ConfigResult<ImmutableAttributes>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = ImmutableAttributes::builder();
        for pair in pairs {
            let pair = pair.as_ref();
            let (name, value) = pair.split_once('=').ok_or_else(|| {
                SprigError::invalid_argument(format!("Expected 'name=value' but got '{}'", pair))
            })?;
            builder = builder.attribute(self.attribute(name.trim()), value.trim());
        }
        Ok(self.factory.intern(builder.build()?))
    }

    fn attributes_of(
        &self,
        entries: &IndexMap<String, AttributeValueSpec>,
        field: &str,
    ) -> ConfigResult<ImmutableAttributes> {
        let mut builder = ImmutableAttributes::builder();
        for (name, value) in entries {
            let attribute = match (value, self.consumer.attribute_by_name(name)) {
                (_, Some(declared)) => declared,
                (AttributeValueSpec::Boolean(_), None) => self
                    .producer
                    .attribute_by_name(name)
                    .unwrap_or_else(|| Attribute::boolean(name)),
                (AttributeValueSpec::String(_), None) => self.attribute(name),
            };
            builder = builder.attribute(attribute, to_value(value));
        }
        builder
            .build()
            .map(|attributes| self.factory.intern(attributes))
            .map_err(|e| SprigError::ConfigValidation {
                field: field.to_string(),
                reason: e.to_string(),
            })
    }

    fn build_repository(
        &self,
        section: &RepositorySection,
        selectors: &VersionSelectorCache,
    ) -> ConfigResult<Repository> {
        let mut repository = Repository::with_content(
            section.name.clone(),
            sprig_repository::RepositoryContentDescriptor::with_selector_cache(
                section.name.clone(),
                selectors.clone(),
            ),
        );
        if let Some(url) = &section.url {
            repository = repository.with_url(url.clone());
        }
        let content = repository.content();

        for group in &section.include_groups {
            content.include_group(group)?;
        }
        for prefix in &section.include_groups_and_subgroups {
            content.include_group_and_subgroups(prefix)?;
        }
        for regex in &section.include_group_regexes {
            content.include_group_by_regex(regex)?;
        }
        for module in &section.include_modules {
            let (group, name) = split(split_module(module))?;
            content.include_module(group, name)?;
        }
        for module in &section.include_module_regexes {
            let (group, name) = split(split_module(module))?;
            content.include_module_by_regex(group, name)?;
        }
        for version in &section.include_versions {
            let (group, name, version) = split(split_version(version))?;
            content.include_version(group, name, version)?;
        }
        for version in &section.include_version_regexes {
            let (group, name, version) = split(split_version(version))?;
            content.include_version_by_regex(group, name, version)?;
        }

        for group in &section.exclude_groups {
            content.exclude_group(group)?;
        }
        for prefix in &section.exclude_groups_and_subgroups {
            content.exclude_group_and_subgroups(prefix)?;
        }
        for regex in &section.exclude_group_regexes {
            content.exclude_group_by_regex(regex)?;
        }
        for module in &section.exclude_modules {
            let (group, name) = split(split_module(module))?;
            content.exclude_module(group, name)?;
        }
        for module in &section.exclude_module_regexes {
            let (group, name) = split(split_module(module))?;
            content.exclude_module_by_regex(group, name)?;
        }
        for version in &section.exclude_versions {
            let (group, name, version) = split(split_version(version))?;
            content.exclude_version(group, name, version)?;
        }
        for version in &section.exclude_version_regexes {
            let (group, name, version) = split(split_version(version))?;
            content.exclude_version_by_regex(group, name, version)?;
        }

        if let Some(names) = &section.only_for_configurations {
            content.only_for_configurations(names.iter().cloned())?;
        }
        if !section.not_for_configurations.is_empty() {
            content.not_for_configurations(section.not_for_configurations.iter().cloned())?;
        }
        for (name, values) in &section.only_for_attributes {
            content.only_for_attribute(self.attribute(name), values.iter().map(to_value))?;
        }

        Ok(repository)
    }
}

fn split<T>(result: Result<T, String>) -> ConfigResult<T> {
    result.map_err(SprigError::invalid_argument)
}

fn to_value(spec: &AttributeValueSpec) -> Value {
    match spec {
        AttributeValueSpec::Boolean(value) => Value::Boolean(*value),
        AttributeValueSpec::String(value) => Value::String(value.clone()),
    }
}

fn attribute_type(name: &str) -> AttributeType {
    match name {
        "string" => AttributeType::String,
        "boolean" => AttributeType::Boolean,
        other => AttributeType::Named(other.to_string()),
    }
}

fn ordering(attribute: &Attribute, order: &[String]) -> ConfigResult<ValueOrdering> {
    if order.is_empty() {
        return Ok(ValueOrdering::Natural);
    }
    let ranks = order
        .iter()
        .map(|value| {
            Value::String(value.clone())
                .coerce(attribute.value_type())
                .ok_or_else(|| SprigError::ConfigValidation {
                    field: format!("attributes.{}.order", attribute.name()),
                    reason: format!("'{}' is not a valid {}", value, attribute.value_type()),
                })
        })
        .collect::<ConfigResult<Vec<Value>>>()?;
    Ok(ValueOrdering::Ranked(ranks))
}

fn build_schema(section: &SchemaSection) -> ConfigResult<AttributesSchema> {
    let schema = AttributesSchema::new(section.name.clone());
    let mut declared = IndexMap::new();

    for (name, attribute_section) in &section.attributes {
        let attribute = Attribute::of(name, attribute_type(&attribute_section.value_type));
        configure_attribute(&schema, &attribute, attribute_section)?;
        declared.insert(name.as_str(), attribute);
    }

    let precedence = section
        .precedence
        .iter()
        .map(|name| {
            declared.get(name.as_str()).cloned().ok_or_else(|| SprigError::ConfigValidation {
                field: format!("{}.precedence", section.name),
                reason: format!("Attribute '{}' is not declared", name),
            })
        })
        .collect::<ConfigResult<Vec<Attribute>>>()?;
    schema.attribute_disambiguation_precedence(precedence)?;
    Ok(schema)
}

fn configure_attribute(
    schema: &AttributesSchema,
    attribute: &Attribute,
    section: &AttributeSection,
) -> ConfigResult<()> {
    let compatibility = section
        .compatibility
        .as_ref()
        .map(|c| ordering(attribute, &c.order).map(|ordering| (ordering, c.reverse)))
        .transpose()?;
    let disambiguation = section
        .disambiguation
        .as_ref()
        .map(|d| ordering(attribute, &d.order).map(|ordering| (ordering, d.pick)))
        .transpose()?;

    schema.attribute_with(attribute.clone(), |strategy| {
        if let Some((ordering, reverse)) = compatibility {
            let rules = strategy.compatibility_rules_mut();
            if reverse {
                rules.reverse_ordered(ordering);
            } else {
                rules.ordered(ordering);
            }
        }
        if let Some((ordering, pick)) = disambiguation {
            let rules = strategy.disambiguation_rules_mut();
            match pick {
                PickStrategy::First => rules.pick_first(ordering),
                PickStrategy::Last => rules.pick_last(ordering),
            };
        }
    })
}

#[cfg(test)]
mod tests;
