use super::*;

const EXAMPLE: &str = r#"
[schema]
precedence = ["usage"]

[schema.attributes.usage]
type = "Usage"

[schema.attributes.jvm-version]
type = "string"
compatibility = { order = ["8", "11", "17"] }
disambiguation = { order = ["8", "11", "17"], pick = "last" }

[producer-schema]
name = "producer"

[[repositories]]
name = "internal"
url = "https://repo.example.com/internal"
include-groups-and-subgroups = ["com.example"]
exclude-modules = ["com.example:legacy"]
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
artifacts = ["core.jar", "core:jar:natives"]
capabilities = ["org.lib:core-runtime:1.0"]
cacheable = false

[artifact-types.aar]
attributes = { packaging = "android" }

[[excludes]]
group = "org.unwanted"
"#;

#[test]
fn test_parse_full_example() {
    let config = parse_sprig_toml(EXAMPLE).unwrap();

    assert_eq!(config.schema.name, "consumer");
    assert_eq!(config.schema.precedence, vec!["usage"]);
    assert_eq!(config.schema.attributes["usage"].value_type, "Usage");
    let jvm = &config.schema.attributes["jvm-version"];
    assert_eq!(jvm.compatibility.as_ref().unwrap().order, vec!["8", "11", "17"]);
    assert!(!jvm.compatibility.as_ref().unwrap().reverse);
    assert_eq!(jvm.disambiguation.as_ref().unwrap().pick, PickStrategy::Last);
    assert_eq!(config.producer_schema.as_ref().unwrap().name, "producer");

    assert_eq!(config.repositories.len(), 2);
    let internal = &config.repositories[0];
    assert_eq!(internal.url.as_deref(), Some("https://repo.example.com/internal"));
    assert_eq!(internal.include_groups_and_subgroups, vec!["com.example"]);
    assert_eq!(
        internal.only_for_configurations,
        Some(vec!["compileClasspath".to_string()])
    );
    assert_eq!(
        internal.only_for_attributes["usage"],
        vec![AttributeValueSpec::String("java-api".to_string())]
    );
    assert_eq!(config.repositories[1].include_versions, vec!["org.lib:core:[1.0,2.0)"]);

    let variants = &config.components[0].variants;
    assert_eq!(variants.len(), 2);
    assert!(variants[0].cacheable);
    assert!(!variants[1].cacheable);
    assert_eq!(variants[1].attributes["debug"], AttributeValueSpec::Boolean(false));
    assert_eq!(variants[1].capabilities, vec!["org.lib:core-runtime:1.0"]);

    assert!(config.artifact_types.contains_key("aar"));
    assert_eq!(config.excludes[0].group.as_deref(), Some("org.unwanted"));
}

#[test]
fn test_empty_document_is_default() {
    let config = parse_sprig_toml("").unwrap();
    assert_eq!(config, SprigToml::default());
}

#[test]
fn test_syntax_error_location() {
    let content = "[schema]\nname = \"consumer\"\n[[repositories]\nname = \"central\"\n";
    match parse_sprig_toml(content).unwrap_err() {
        SprigError::TomlParse { line, column, .. } => {
            assert_eq!(line, 3);
            assert!(column > 0);
        },
        other => panic!("Expected TomlParse error, got {:?}", other),
    }
}

#[test]
fn test_type_error_location() {
    let content = "[[repositories]]\nname = 5\n";
    match parse_sprig_toml(content).unwrap_err() {
        SprigError::TomlParse { line, .. } => assert_eq!(line, 2),
        other => panic!("Expected TomlParse error, got {:?}", other),
    }
}

#[test]
fn test_duplicate_repository_is_rejected() {
    let content = "[[repositories]]\nname = \"central\"\n[[repositories]]\nname = \"central\"\n";
    let error = parse_sprig_toml(content).unwrap_err();
    assert!(matches!(
        error,
        SprigError::ConfigValidation { ref field, ref reason }
            if field == "repositories[1].name" && reason.contains("central")
    ));
}

#[test]
fn test_undeclared_precedence_is_rejected() {
    let content = "[schema]\nprecedence = [\"usage\"]\n";
    let error = parse_sprig_toml(content).unwrap_err();
    assert!(matches!(
        error,
        SprigError::ConfigValidation { ref field, .. } if field == "schema.precedence"
    ));
}

#[test]
fn test_invalid_coordinates_are_rejected() {
    let content = "[[components]]\ncoordinates = \"org.lib:core\"\n";
    let error = parse_sprig_toml(content).unwrap_err();
    assert!(matches!(
        error,
        SprigError::ConfigValidation { ref field, .. } if field == "components[0].coordinates"
    ));

    let content = "[[repositories]]\nname = \"r\"\ninclude-versions = [\"org.lib:core\"]\n";
    let error = parse_sprig_toml(content).unwrap_err();
    assert!(matches!(
        error,
        SprigError::ConfigValidation { ref field, .. } if field == "repositories[0].include-versions"
    ));
}

#[test]
fn test_duplicate_variant_is_rejected() {
    let content = r#"
[[components]]
coordinates = "org.lib:core:1.0"
variants = [{ name = "api" }, { name = "api" }]
"#;
    let error = parse_sprig_toml(content).unwrap_err();
    assert!(error.to_string().contains("Duplicate variant 'api'"));
}

#[test]
fn test_empty_attribute_allow_list_is_rejected() {
    let content = "[[repositories]]\nname = \"r\"\nonly-for-attributes = { usage = [] }\n";
    assert!(parse_sprig_toml(content).is_err());
}

#[test]
fn test_serialize_round_trip() {
    let config = parse_sprig_toml(EXAMPLE).unwrap();
    let serialized = serialize_sprig_toml(&config).unwrap();
    assert_eq!(parse_sprig_toml(&serialized).unwrap(), config);
}

#[test]
fn test_line_column() {
    let content = "a\nbc\ndef";
    assert_eq!(line_column(content, 0), (1, 1));
    assert_eq!(line_column(content, 3), (2, 2));
    assert_eq!(line_column(content, 5), (3, 1));
    assert_eq!(line_column(content, 100), (3, 4));
}

#[test]
fn test_split_coordinates() {
    assert_eq!(split_module("org.*:core"), Ok(("org.*", "core")));
    assert!(split_module("org").is_err());
    assert_eq!(
        split_version("org:core:[1.0,2.0)"),
        Ok(("org", "core", "[1.0,2.0)"))
    );
    assert_eq!(split_version("org:core:a:b"), Ok(("org", "core", "a:b")));
    assert!(split_version("org::1.0").is_err());
}

#[tokio::test]
async fn test_load_from_file_prefixes_path() {
    let temp = tempfile::tempdir().unwrap();
    let path = camino::Utf8PathBuf::from_path_buf(temp.path().join("sprig.toml")).unwrap();
    tokio::fs::write(&path, "[schema]\nprecedence = [\"usage\"]\n")
        .await
        .unwrap();

    let error = load_from_file(&path).await.unwrap_err();
    assert!(error.to_string().contains(path.as_str()));

    let missing = load_from_file(&path.with_file_name("missing.toml")).await.unwrap_err();
    assert!(matches!(missing, SprigError::Io { .. }));
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn line_starts_are_column_one(lines in prop::collection::vec("[a-z =\"]{0,12}", 1..8)) {
            let content = lines.join("\n");
            let mut offset = 0;
            for (index, line) in lines.iter().enumerate() {
                prop_assert_eq!(line_column(&content, offset), (index + 1, 1));
                offset += line.len() + 1;
            }
        }

        #[test]
        fn repository_names_round_trip(names in prop::collection::btree_set("[a-z][a-z0-9-]{0,10}", 0..6)) {
            let config = SprigToml {
                repositories: names
                    .iter()
                    .map(|name| RepositorySection {
                        name: name.clone(),
                        include_groups: vec![format!("org.{}", name)],
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            };
            let parsed = parse_sprig_toml(&serialize_sprig_toml(&config).unwrap()).unwrap();
            prop_assert_eq!(parsed, config);
        }
    }
}
