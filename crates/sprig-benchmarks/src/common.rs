//! Common utilities and fixtures for benchmarks

use criterion::Criterion;
use pprof::criterion::{Output, PProfProfiler};

use sprig_artifacts::{ComponentMetadata, VariantResolveMetadata};
use sprig_attributes::{Attribute, AttributesSchema, ImmutableAttributes, ValueOrdering};
use sprig_core::types::{ArtifactName, ModuleComponentIdentifier};
use sprig_repository::{RepositoryContentDescriptor, VersionSelectorCache};

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(3))
        .measurement_time(std::time::Duration::from_secs(10))
        .sample_size(100)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

pub const USAGES: [&str; 4] = ["java-api", "java-runtime", "javadoc", "sources"];

/// Consumer schema with an exact `usage`, an ordered `jvm-version` and a
/// boolean `debug`
pub fn jvm_schema() -> AttributesSchema {
    let schema = AttributesSchema::new("consumer");
    let usage = Attribute::named("usage", "Usage");
    schema.attribute(usage.clone()).expect("usage");
    schema
        .attribute_with(Attribute::string("jvm-version"), |strategy| {
            strategy.compatibility_rules_mut().ordered(ValueOrdering::Natural);
            strategy.disambiguation_rules_mut().pick_last(ValueOrdering::Natural);
        })
        .expect("jvm-version");
    schema.attribute(Attribute::boolean("debug")).expect("debug");
    schema.attribute_disambiguation_precedence([usage]).expect("precedence");
    schema
}

/// `count` candidates cycling through usages, JVM versions 8..=21 and debug
pub fn candidates(count: usize) -> Vec<ImmutableAttributes> {
    (0..count)
        .map(|i| {
            ImmutableAttributes::builder()
                .attribute(Attribute::named("usage", "Usage"), USAGES[i % USAGES.len()])
                .attribute(Attribute::string("jvm-version"), (8 + i % 14).to_string())
                .attribute(Attribute::boolean("debug"), i % 3 == 0)
                .build()
                .expect("candidate attributes")
        })
        .collect()
}

pub fn requested(usage: &str, jvm: u32) -> ImmutableAttributes {
    ImmutableAttributes::builder()
        .attribute(Attribute::named("usage", "Usage"), usage)
        .attribute(Attribute::string("jvm-version"), jvm.to_string())
        .build()
        .expect("requested attributes")
}

/// Descriptor with `rules` include and exclude rules of every kind
pub fn descriptor(
    name: &str,
    rules: usize,
    selectors: &VersionSelectorCache,
) -> RepositoryContentDescriptor {
    let descriptor = RepositoryContentDescriptor::with_selector_cache(name, selectors.clone());
    (0..rules)
        .try_for_each(|i| {
            descriptor.include_group(&format!("org.group{}", i))?;
            descriptor.include_group_and_subgroups(&format!("com.tree{}", i))?;
            descriptor.include_module_by_regex(&format!("io\\.regex{}", i), "core-.*")?;
            descriptor.include_version("org.pinned", &format!("module{}", i), "[1.0,2.0)")?;
            descriptor.exclude_module(&format!("org.group{}", i), "legacy")?;
            descriptor.exclude_version_by_regex("org.group0", "core", &format!("{}\\..*-SNAPSHOT", i))
        })
        .expect("descriptor rules");
    descriptor
}

/// Component with `count` variants, each with one jar
pub fn component(count: usize) -> ComponentMetadata {
    let id = ModuleComponentIdentifier::new("org.lib", "core", "1.0");
    candidates(count)
        .into_iter()
        .enumerate()
        .fold(ComponentMetadata::new(id.clone()), |component, (i, attributes)| {
            let variant = VariantResolveMetadata::new(id.clone(), format!("variant{}", i), attributes)
                .with_artifact(ArtifactName::new(format!("core{}", i), "jar"));
            component.with_variant(variant)
        })
}
