use super::*;
use crate::toml::parse_sprig_toml;
use sprig_artifacts::{ExcludeNothing, LocalArtifactResolver, ARTIFACT_TYPE};
use sprig_attributes::HasAttributes;
use sprig_repository::ArtifactResolutionDetails;

const CONFIG: &str = r#"
[schema]
precedence = ["usage"]

[schema.attributes.usage]
type = "Usage"

[schema.attributes.jvm-version]
compatibility = { order = ["8", "11", "17"] }
disambiguation = { order = ["8", "11", "17"], pick = "last" }

[producer-schema]
name = "producer"

[producer-schema.attributes.debug]
type = "boolean"

[[repositories]]
name = "internal"
include-groups-and-subgroups = ["com.example"]
only-for-configurations = ["compileClasspath"]

[repositories.only-for-attributes]
usage = ["java-api"]

[[repositories]]
name = "central"
exclude-groups = ["com.example"]
include-versions = ["org.lib:core:[1.0,2.0)"]

[[components]]
coordinates = "org.lib:core:1.0"

[[components.variants]]
name = "apiElements"
attributes = { usage = "java-api", jvm-version = "11" }
artifacts = ["core.jar"]

[[components.variants]]
name = "runtimeElements"
attributes = { usage = "java-runtime", jvm-version = "17", debug = false }
artifacts = ["core.aar"]
cacheable = false

[artifact-types.aar]
attributes = { packaging = "android" }

[[excludes]]
module = "core"
extension = "aar"
"#;

fn model() -> SprigModel {
    SprigModel::build(&parse_sprig_toml(CONFIG).unwrap()).unwrap()
}

#[test]
fn test_schema_declarations() {
    let model = model();
    assert_eq!(model.attribute("usage"), Attribute::named("usage", "Usage"));
    assert_eq!(model.attribute("jvm-version"), Attribute::string("jvm-version"));
    assert_eq!(model.attribute("debug"), Attribute::boolean("debug"));
    assert_eq!(model.attribute("undeclared"), Attribute::string("undeclared"));
    assert_eq!(
        model.consumer_schema().precedence(),
        vec![Attribute::named("usage", "Usage")]
    );
    assert_eq!(model.producer_schema().name(), "producer");
}

#[test]
fn test_matching_by_declared_type() {
    let model = model();
    let component = model.component("org.lib:core").unwrap();
    let matcher = model.matcher();

    let requested = model.requested(["usage=java-api"]).unwrap();
    assert_eq!(requested.get("usage"), Some(&Value::named("java-api")));
    let matches = matcher.matches(component.variants(), &requested, None).unwrap();
    let names: Vec<&str> = matches.iter().map(|v| v.name()).collect();
    assert_eq!(names, vec!["apiElements"]);

    // Both are compatible with 17; disambiguation picks the highest
    let requested = model.requested(["jvm-version=17"]).unwrap();
    let matches = matcher.matches(component.variants(), &requested, None).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].name(), "runtimeElements");

    let requested = model.requested(["jvm-version=8"]).unwrap();
    assert!(matcher
        .matches(component.variants(), &requested, None)
        .unwrap()
        .is_empty());

    assert!(model.consumer_schema().is_locked());
    assert!(model.producer_schema().is_locked());
}

#[test]
fn test_requested_pairs() {
    let model = model();
    let requested = model.requested(["debug = true", "flavor=free"]).unwrap();
    assert_eq!(requested.get("debug"), Some(&Value::Boolean(true)));
    assert_eq!(requested.get("flavor"), Some(&Value::from("free")));

    // Interned
    let again = model.requested(["debug=true", "flavor=free"]).unwrap();
    assert!(requested.ptr_eq(&again));

    assert!(matches!(
        model.requested(["usage"]),
        Err(SprigError::InvalidArgument { .. })
    ));
    assert!(model.requested(["debug=maybe"]).is_err());
}

#[test]
fn test_repository_selection() {
    let model = model();
    let consumer = model.requested(["usage=java-api"]).unwrap();
    let names = |details: &ArtifactResolutionDetails| -> Vec<String> {
        model
            .repositories()
            .select(details)
            .iter()
            .map(|r| r.name().to_string())
            .collect()
    };

    let example = ArtifactResolutionDetails::for_component("com.example:app:1.0".parse().unwrap())
        .with_configuration("compileClasspath")
        .with_consumer_attributes(consumer.clone());
    assert_eq!(names(&example), vec!["internal"]);

    let no_configuration = ArtifactResolutionDetails::for_component("com.example:app:1.0".parse().unwrap())
        .with_consumer_attributes(consumer);
    assert!(names(&no_configuration).is_empty());

    let in_range = ArtifactResolutionDetails::for_component("org.lib:core:1.5".parse().unwrap());
    assert_eq!(names(&in_range), vec!["central"]);

    let out_of_range = ArtifactResolutionDetails::for_component("org.lib:core:2.0".parse().unwrap());
    assert!(names(&out_of_range).is_empty());

    assert!(model.repositories().find("internal").unwrap().content().is_locked());
}

#[test]
fn test_components_and_resolution() {
    let model = model();
    assert_eq!(model.components().len(), 1);
    assert!(model.component("org.lib:core:1.0").is_some());
    assert!(model.component("org.lib:core:2.0").is_none());
    assert!(model.component("org.lib:other").is_none());

    let component = model.component("org.lib:core").unwrap();
    let runtime = component.variant("runtimeElements").unwrap();
    assert!(!runtime.is_eligible_for_caching());

    let resolver = model.variant_resolver(Arc::new(LocalArtifactResolver::new("/nonexistent")));
    let resolved = resolver.resolve_variant(runtime, &ExcludeNothing).unwrap();
    let attributes = resolved.attributes();
    assert_eq!(attributes.get(ARTIFACT_TYPE).and_then(|v| v.as_str()), Some("aar"));
    assert_eq!(attributes.get("packaging").and_then(|v| v.as_str()), Some("android"));
    assert_eq!(attributes.get("debug"), Some(&Value::Boolean(false)));

    // The configured exclusion drops the aar
    let excluded = resolver.resolve_variant(runtime, model.exclusions()).unwrap();
    assert!(excluded.artifacts().is_empty());
    let api = component.variant("apiElements").unwrap();
    let kept = resolver.resolve_variant(api, model.exclusions()).unwrap();
    assert_eq!(kept.artifacts().len(), 1);
}

#[test]
fn test_unvalidated_precedence_is_rejected() {
    let mut config = SprigToml::default();
    config.schema.precedence.push("usage".to_string());
    assert!(matches!(
        SprigModel::build(&config),
        Err(SprigError::ConfigValidation { ref field, .. }) if field == "consumer.precedence"
    ));
}

#[test]
fn test_ranked_order_must_fit_type() {
    let content = r#"
[schema.attributes.debug]
type = "boolean"
compatibility = { order = ["false", "sometimes"] }
"#;
    let config = parse_sprig_toml(content).unwrap();
    let error = SprigModel::build(&config).unwrap_err();
    assert!(error.to_string().contains("sometimes"));
}

#[test]
fn test_invalid_repository_regex_is_reported() {
    let content = "[[repositories]]\nname = \"r\"\ninclude-group-regexes = [\"(unclosed\"]\n";
    let config = parse_sprig_toml(content).unwrap();
    assert!(matches!(
        SprigModel::build(&config),
        Err(SprigError::InvalidPattern { .. })
    ));
}
