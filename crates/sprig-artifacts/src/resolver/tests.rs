//! Unit tests for variant artifact resolution

use super::*;
use crate::artifact::Capability;
use crate::exclude::{ExcludeFn, ExcludeNothing, ExcludeRule};
use crate::io::LocalArtifactResolver;
use crate::registry::{DefaultArtifactTypeRegistry, ARTIFACT_TYPE};
use camino::Utf8PathBuf;
use sprig_attributes::{Attribute, ImmutableAttributes};
use sprig_core::error::SprigError;
use sprig_core::types::{ArtifactName, ModuleIdentifier};

fn component_id() -> ModuleComponentIdentifier {
    "org.lib:core:1.0".parse().unwrap()
}

fn resolver_at(root: &str) -> VariantArtifactResolver {
    VariantArtifactResolver::new(
        Arc::new(DefaultArtifactTypeRegistry::new()),
        Arc::new(LocalArtifactResolver::new(root)),
    )
}

fn resolver() -> VariantArtifactResolver {
    resolver_at("/nonexistent")
}

fn variant(artifacts: &[&str]) -> Arc<VariantResolveMetadata> {
    let attributes = ImmutableAttributes::builder()
        .attribute(Attribute::string("usage"), "runtime")
        .build()
        .unwrap();
    let variant = artifacts.iter().fold(
        VariantResolveMetadata::new(component_id(), "runtimeElements", attributes),
        |variant, name| variant.with_artifact(name.parse().unwrap()),
    );
    Arc::new(variant)
}

fn artifact_names(resolved: &ResolvedVariant) -> Vec<String> {
    resolved
        .artifacts()
        .iter()
        .map(|artifact| artifact.name.to_string())
        .collect()
}

#[test]
fn test_exclusions_produce_uncached_adhoc_variant() {
    let resolver = resolver();
    let source = variant(&["a.jar", "b.jar"]);
    let exclude_b = ExcludeRule::new().artifact("b");

    let first = resolver.resolve_variant(&source, &exclude_b).unwrap();
    assert_eq!(artifact_names(&first), vec!["a.jar"]);
    assert!(first.identity().is_none());
    assert!(resolver.cache().is_empty());

    let second = resolver.resolve_variant(&source, &exclude_b).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(resolver.cache().is_empty());

    // The source variant is untouched
    assert_eq!(source.artifacts().len(), 2);
    assert!(source.identity().is_some());
}

#[test]
fn test_same_variant_resolves_to_same_instance() {
    let resolver = resolver();
    let source = variant(&["a.jar", "b.jar"]);

    let first = resolver.resolve_variant(&source, &ExcludeNothing).unwrap();
    let second = resolver.resolve_variant(&source, &ExcludeNothing).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    // A predicate that excludes nothing keeps the original identity
    let unrelated = ExcludeRule::new().group("org.other");
    let third = resolver.resolve_variant(&source, &unrelated).unwrap();
    assert!(Arc::ptr_eq(&first, &third));
    assert!(Arc::ptr_eq(&resolver.effective_variant(&source, &unrelated), &source));

    let stats = resolver.cache().stats();
    assert_eq!(stats.total_entries, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 2);
}

#[test]
fn test_equal_variants_share_cache_entry() {
    let resolver = resolver();
    let first = resolver
        .resolve_variant(&variant(&["a.jar"]), &ExcludeNothing)
        .unwrap();
    let second = resolver
        .resolve_variant(&variant(&["a.jar"]), &ExcludeNothing)
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_resolvers_do_not_share_caches() {
    let source = variant(&["a.jar"]);
    let first = resolver().resolve_variant(&source, &ExcludeNothing).unwrap();
    let second = resolver().resolve_variant(&source, &ExcludeNothing).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_ineligible_variants_are_never_cached() {
    let resolver = resolver();
    let source = Arc::new(
        VariantResolveMetadata::new(component_id(), "local", ImmutableAttributes::empty())
            .with_artifact(ArtifactName::new("core", "jar"))
            .ineligible_for_caching(),
    );
    let first = resolver.resolve_variant(&source, &ExcludeNothing).unwrap();
    let second = resolver.resolve_variant(&source, &ExcludeNothing).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(resolver.cache().is_empty());
}

#[test]
fn test_final_attributes_and_capabilities() {
    let resolver = resolver();
    let resolved = resolver
        .resolve_variant(&variant(&["a.jar", "b.jar"]), &ExcludeNothing)
        .unwrap();
    assert_eq!(
        resolved.attributes().get(ARTIFACT_TYPE).and_then(|v| v.as_str()),
        Some("jar")
    );
    assert_eq!(resolved.capabilities(), &[Capability::default_for(&component_id())]);
    assert!(resolver
        .cache()
        .contains(resolved.identity().unwrap(), resolved.attributes()));

    let declared = Capability::new("org.lib", "core-fixtures", None);
    let with_capability = Arc::new(
        VariantResolveMetadata::new(component_id(), "fixtures", ImmutableAttributes::empty())
            .with_capability(declared.clone()),
    );
    let resolved = resolver.resolve_variant(&with_capability, &ExcludeNothing).unwrap();
    assert_eq!(resolved.capabilities(), &[declared]);
}

#[test]
fn test_adhoc_variants() {
    let resolver = resolver();
    let component = component_id();
    let jar = ComponentArtifactIdentifier::new(component.clone(), ArtifactName::new("core", "jar"));
    let pom = ComponentArtifactIdentifier::new(component.clone(), ArtifactName::new("core", "pom"));

    let single = resolver
        .resolve_adhoc_variant(&component, vec![jar.clone()])
        .unwrap();
    assert_eq!(single.identity(), Some(&VariantIdentifier::Artifact(jar.clone())));
    let again = resolver.resolve_adhoc_variant(&component, vec![jar.clone()]).unwrap();
    assert!(Arc::ptr_eq(&single, &again));

    let several = resolver
        .resolve_adhoc_variant(&component, vec![jar.clone(), pom.clone()])
        .unwrap();
    assert!(several.identity().is_none());
    let again = resolver.resolve_adhoc_variant(&component, vec![jar, pom]).unwrap();
    assert!(!Arc::ptr_eq(&several, &again));
    assert_eq!(resolver.cache().len(), 1);
}

#[test]
fn test_exclusions_use_owning_module() {
    let resolver = resolver();
    let foreign = ComponentArtifactIdentifier::new(
        "org.other:shaded:2.0".parse().unwrap(),
        ArtifactName::new("shaded", "jar"),
    );
    let source = Arc::new(
        VariantResolveMetadata::new(component_id(), "fat", ImmutableAttributes::empty())
            .with_artifact(ArtifactName::new("core", "jar"))
            .with_component_artifact(foreign),
    );
    let exclude_other = ExcludeFn::new("org.other", |module: &ModuleIdentifier, _: &ArtifactName| {
        module.group == "org.other"
    });

    let resolved = resolver.resolve_variant(&source, &exclude_other).unwrap();
    assert_eq!(artifact_names(&resolved), vec!["core.jar"]);
}

#[test]
fn test_files_are_resolved_lazily() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let resolver = resolver_at(root.as_str());

    // Resolution succeeds even though nothing exists on disk
    let resolved = resolver
        .resolve_variant(&variant(&["core.jar"]), &ExcludeNothing)
        .unwrap();
    assert!(matches!(
        resolved.files(),
        Err(SprigError::ArtifactNotFound { .. })
    ));

    let path = root.join("org.lib/core/1.0/core-1.0.jar");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"jar").unwrap();
    assert_eq!(resolved.files().unwrap(), vec![path]);
}

#[test]
fn test_concurrent_resolution_is_canonical() {
    use rayon::prelude::*;

    let resolver = resolver();
    let source = variant(&["a.jar", "b.jar"]);
    let resolved: Vec<Arc<ResolvedVariant>> = (0..128)
        .into_par_iter()
        .map(|_| resolver.resolve_variant(&source, &ExcludeNothing).unwrap())
        .collect();

    assert!(resolved.iter().all(|r| Arc::ptr_eq(r, &resolved[0])));
    assert_eq!(resolver.cache().stats().misses, 1);
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn exclusions_never_modify_source(
            names in prop::collection::btree_set("[a-e]{1,3}", 1..8),
            excluded in prop::collection::btree_set("[a-e]{1,3}", 0..4),
        ) {
            let files: Vec<String> = names.iter().map(|n| format!("{}.jar", n)).collect();
            let refs: Vec<&str> = files.iter().map(String::as_str).collect();
            let source = variant(&refs);
            let before: Vec<_> = source.artifacts().to_vec();

            let excluded_names = excluded.clone();
            let spec = ExcludeFn::new("names", move |_: &ModuleIdentifier, a: &ArtifactName| {
                excluded_names.contains(&a.name)
            });
            let resolver = resolver();
            let resolved = resolver.resolve_variant(&source, &spec).unwrap();

            prop_assert_eq!(source.artifacts(), before.as_slice());
            let expected: Vec<String> = names
                .difference(&excluded)
                .map(|n| format!("{}.jar", n))
                .collect();
            prop_assert_eq!(artifact_names(&resolved), expected);

            let hit_any = names.intersection(&excluded).next().is_some();
            prop_assert_eq!(resolved.identity().is_none(), hit_any);

            // The source stays resolvable on its own
            let original = resolver.resolve_variant(&source, &ExcludeNothing).unwrap();
            prop_assert_eq!(original.artifacts().len(), names.len());
        }
    }
}
