//! Unit tests for the attribute matcher

use super::*;
use crate::rules::ValueOrdering;
use crate::schema::AttributesSchema;
use sprig_core::error::SprigError;

fn attrs(entries: &[(&str, &str)]) -> ImmutableAttributes {
    entries
        .iter()
        .fold(ImmutableAttributes::builder(), |builder, (name, value)| {
            builder.attribute(Attribute::string(name), *value)
        })
        .build()
        .unwrap()
}

fn always_compatible(schema: &AttributesSchema, name: &str) {
    schema
        .attribute_with(Attribute::string(name), |strategy| {
            strategy.compatibility_rules_mut().add_fn("AlwaysCompatible", |details| {
                details.compatible();
                Ok(())
            });
        })
        .unwrap();
}

fn index_of(candidates: &[ImmutableAttributes], selected: &[&ImmutableAttributes]) -> Vec<usize> {
    selected
        .iter()
        .map(|s| {
            candidates
                .iter()
                .position(|c| std::ptr::eq(c, *s))
                .unwrap()
        })
        .collect()
}

#[test]
fn test_exact_equality_without_rules() {
    let matcher = AttributesSchema::new("consumer").matcher();
    let candidates = vec![attrs(&[("color", "blue")]), attrs(&[("color", "green")])];
    let requested = attrs(&[("color", "blue")]);

    let selected = matcher.matches(&candidates, &requested, None).unwrap();
    assert_eq!(index_of(&candidates, &selected), vec![0]);
    assert!(!matcher
        .is_matching_candidate(&candidates[1], &requested)
        .unwrap());
}

#[test]
fn test_requested_value_breaks_tie() {
    let schema = AttributesSchema::new("consumer");
    always_compatible(&schema, "flavor");
    let matcher = schema.matcher();

    let candidates = vec![attrs(&[("flavor", "x")]), attrs(&[("flavor", "y")])];
    let selected = matcher
        .matches(&candidates, &attrs(&[("flavor", "x")]), None)
        .unwrap();
    assert_eq!(index_of(&candidates, &selected), vec![0]);
}

#[test]
fn test_missing_candidate_attributes_are_ignored() {
    let matcher = AttributesSchema::new("consumer").matcher();
    let requested = attrs(&[("color", "blue"), ("shape", "round")]);
    assert!(matcher
        .is_matching_candidate(&attrs(&[("color", "blue")]), &requested)
        .unwrap());
    assert!(matcher
        .is_matching_candidate(&ImmutableAttributes::empty(), &requested)
        .unwrap());
}

#[test]
fn test_longest_match_wins_when_superset() {
    let matcher = AttributesSchema::new("consumer").matcher();
    let candidates = vec![
        attrs(&[("color", "blue")]),
        attrs(&[("color", "blue"), ("shape", "round")]),
    ];
    let requested = attrs(&[("color", "blue"), ("shape", "round")]);

    let selected = matcher.matches(&candidates, &requested, None).unwrap();
    assert_eq!(index_of(&candidates, &selected), vec![1]);
}

#[test]
fn test_fallback_when_nothing_is_compatible() {
    let matcher = AttributesSchema::new("consumer").matcher();
    let requested = attrs(&[("color", "blue")]);
    let fallback = attrs(&[("color", "default")]);

    let single = vec![attrs(&[("color", "red")])];
    let selected = matcher
        .matches(&single, &requested, Some(&fallback))
        .unwrap();
    assert_eq!(selected.len(), 1);
    assert!(std::ptr::eq(selected[0], &fallback));
    // Returned even though it does not match the request itself
    assert!(!matcher.is_matching_candidate(&fallback, &requested).unwrap());

    let several = vec![attrs(&[("color", "red")]), attrs(&[("color", "green")])];
    assert!(matcher.matches(&several, &requested, None).unwrap().is_empty());
    assert!(matcher
        .matches::<ImmutableAttributes>(&[], &requested, None)
        .unwrap()
        .is_empty());
}

#[test]
fn test_ordered_rules_pick_closest_jvm() {
    let schema = AttributesSchema::new("consumer");
    schema
        .attribute_with(Attribute::string("jvm"), |strategy| {
            strategy
                .compatibility_rules_mut()
                .ordered(ValueOrdering::Natural);
            strategy
                .disambiguation_rules_mut()
                .pick_last(ValueOrdering::Natural);
        })
        .unwrap();
    let matcher = schema.matcher();

    let candidates = vec![
        attrs(&[("jvm", "8")]),
        attrs(&[("jvm", "9")]),
        attrs(&[("jvm", "17")]),
    ];
    let selected = matcher
        .matches(&candidates, &attrs(&[("jvm", "11")]), None)
        .unwrap();
    assert_eq!(index_of(&candidates, &selected), vec![1]);
}

#[test]
fn test_candidates_without_extra_attributes_preferred() {
    let matcher = AttributesSchema::new("consumer").matcher();
    let candidates = vec![
        attrs(&[("usage", "api"), ("debug", "true")]),
        attrs(&[("usage", "api")]),
    ];
    let selected = matcher
        .matches(&candidates, &attrs(&[("usage", "api")]), None)
        .unwrap();
    assert_eq!(index_of(&candidates, &selected), vec![1]);
}

#[test]
fn test_rule_choice_excludes_candidates_without_value() {
    let schema = AttributesSchema::new("consumer");
    schema
        .attribute_with(Attribute::string("jvm"), |strategy| {
            strategy
                .compatibility_rules_mut()
                .ordered(ValueOrdering::Natural);
            strategy
                .disambiguation_rules_mut()
                .pick_last(ValueOrdering::Natural);
        })
        .unwrap();
    let matcher = schema.matcher();

    let candidates = vec![attrs(&[("jvm", "8")]), attrs(&[("jvm", "9")]), attrs(&[])];
    let selected = matcher
        .matches(&candidates, &attrs(&[("jvm", "11")]), None)
        .unwrap();
    assert_eq!(index_of(&candidates, &selected), vec![1]);
}

#[test]
fn test_extra_attributes_counted_over_all_candidates() {
    let matcher = AttributesSchema::new("consumer").matcher();
    let candidates = vec![
        attrs(&[("color", "blue"), ("x", "1")]),
        attrs(&[("color", "blue"), ("x", "1"), ("y", "1")]),
        attrs(&[("color", "red")]),
    ];
    // `x` is missing only on the incompatible candidate, which empties the
    // remaining set and leaves every compatible candidate
    let selected = matcher
        .matches(&candidates, &attrs(&[("color", "blue")]), None)
        .unwrap();
    assert_eq!(index_of(&candidates, &selected), vec![0, 1]);
}

#[test]
fn test_extra_attribute_disambiguation_rule() {
    let schema = AttributesSchema::new("consumer");
    schema
        .attribute_with(Attribute::string("debug"), |strategy| {
            strategy
                .disambiguation_rules_mut()
                .add_fn("PreferRelease", |details| {
                    let release = Value::from("false");
                    if details.candidate_values().contains(&release) {
                        details.closest_match(release);
                    }
                    Ok(())
                });
        })
        .unwrap();
    let matcher = schema.matcher();

    let candidates = vec![
        attrs(&[("usage", "api"), ("debug", "true")]),
        attrs(&[("usage", "api"), ("debug", "false")]),
    ];
    let selected = matcher
        .matches(&candidates, &attrs(&[("usage", "api")]), None)
        .unwrap();
    assert_eq!(index_of(&candidates, &selected), vec![1]);
}

#[test]
fn test_precedence_decides_which_attribute_wins() {
    let requested = attrs(&[("a", "x"), ("b", "y")]);
    let candidates = vec![attrs(&[("a", "x"), ("b", "z")]), attrs(&[("a", "w"), ("b", "y")])];

    let plain = AttributesSchema::new("plain");
    always_compatible(&plain, "a");
    always_compatible(&plain, "b");
    // Each attribute rules out the other candidate, so both stay
    let selected = plain.matcher().matches(&candidates, &requested, None).unwrap();
    assert_eq!(index_of(&candidates, &selected), vec![0, 1]);

    let ranked = AttributesSchema::new("ranked");
    always_compatible(&ranked, "a");
    always_compatible(&ranked, "b");
    ranked
        .attribute_disambiguation_precedence([Attribute::string("b")])
        .unwrap();
    let selected = ranked.matcher().matches(&candidates, &requested, None).unwrap();
    assert_eq!(index_of(&candidates, &selected), vec![1]);
}

#[test]
fn test_no_preference_keeps_all_compatible_candidates() {
    let schema = AttributesSchema::new("consumer");
    always_compatible(&schema, "color");
    let matcher = schema.matcher();

    let candidates = vec![attrs(&[("color", "red")]), attrs(&[("color", "green")])];
    let selected = matcher
        .matches(&candidates, &attrs(&[("color", "blue")]), None)
        .unwrap();
    assert_eq!(index_of(&candidates, &selected), vec![0, 1]);
}

#[test]
fn test_empty_request_matches_everything() {
    let matcher = AttributesSchema::new("consumer").matcher();
    let candidates = vec![attrs(&[("color", "red")]), attrs(&[])];
    let selected = matcher
        .matches(&candidates, &ImmutableAttributes::empty(), None)
        .unwrap();
    assert_eq!(selected.len(), 2);
}

#[test]
fn test_panicking_rule_surfaces_as_error() {
    let schema = AttributesSchema::new("consumer");
    schema
        .attribute_with(Attribute::string("color"), |strategy| {
            strategy
                .compatibility_rules_mut()
                .add_fn("ExplodingRule", |_| panic!("color wheel missing"));
        })
        .unwrap();
    let matcher = schema.matcher();

    let candidates = vec![attrs(&[("color", "red")]), attrs(&[("color", "green")])];
    let error = matcher
        .matches(&candidates, &attrs(&[("color", "blue")]), None)
        .unwrap_err();

    match &error {
        SprigError::CompatibilityRuleFailed { rule, attribute, .. } => {
            assert_eq!(rule, "ExplodingRule");
            assert_eq!(attribute, "color");
        },
        other => panic!("unexpected error: {:?}", other),
    }
    let source = std::error::Error::source(&error).map(|e| e.to_string());
    assert!(source.unwrap().contains("color wheel missing"));
}

#[test]
fn test_producer_rules_apply_when_consumer_has_none() {
    let consumer = AttributesSchema::new("consumer");
    let producer = AttributesSchema::new("producer");
    producer
        .attribute_with(Attribute::string("jvm"), |strategy| {
            strategy
                .compatibility_rules_mut()
                .ordered(ValueOrdering::Natural);
        })
        .unwrap();
    let matcher = consumer.with_producer(&producer);

    assert!(matcher
        .is_matching_value(&Attribute::string("jvm"), &Value::from("11"), &Value::from("8"))
        .unwrap());
    assert!(!matcher
        .is_matching_value(&Attribute::string("jvm"), &Value::from("8"), &Value::from("11"))
        .unwrap());
    assert!(consumer.is_locked() && producer.is_locked());
}

#[test]
fn test_concurrent_matching() {
    use rayon::prelude::*;

    let schema = AttributesSchema::new("consumer");
    schema
        .attribute_with(Attribute::string("jvm"), |strategy| {
            strategy
                .compatibility_rules_mut()
                .ordered(ValueOrdering::Natural);
            strategy
                .disambiguation_rules_mut()
                .pick_last(ValueOrdering::Natural);
        })
        .unwrap();
    let matcher = schema.matcher();
    let candidates: Vec<ImmutableAttributes> = (6..20)
        .map(|jvm| attrs(&[("jvm", jvm.to_string().as_str())]))
        .collect();
    let requested = attrs(&[("jvm", "11")]);

    let results: Vec<Vec<usize>> = (0..64)
        .into_par_iter()
        .map(|_| {
            let selected = matcher.matches(&candidates, &requested, None).unwrap();
            index_of(&candidates, &selected)
        })
        .collect();

    assert!(results.iter().all(|r| r == &vec![5]));
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn candidate_strategy() -> impl Strategy<Value = Vec<(Option<u8>, Option<u8>)>> {
        prop::collection::vec((prop::option::of(0u8..4), prop::option::of(0u8..4)), 1..6)
    }

    fn build(spec: &[(Option<u8>, Option<u8>)]) -> Vec<ImmutableAttributes> {
        spec.iter()
            .map(|(color, shape)| {
                let mut builder = ImmutableAttributes::builder();
                if let Some(color) = color {
                    builder = builder.attribute(Attribute::string("color"), color.to_string());
                }
                if let Some(shape) = shape {
                    builder = builder.attribute(Attribute::string("shape"), shape.to_string());
                }
                builder.build().unwrap()
            })
            .collect()
    }

    proptest! {
        #[test]
        fn matching_is_deterministic_and_compatible(
            spec in candidate_strategy(),
            color in 0u8..4,
            shape in 0u8..4,
        ) {
            let candidates = build(&spec);
            let (color, shape) = (color.to_string(), shape.to_string());
            let requested = attrs(&[("color", color.as_str()), ("shape", shape.as_str())]);

            let first = AttributesSchema::new("a").matcher();
            let second = AttributesSchema::new("b").matcher();
            let a = index_of(&candidates, &first.matches(&candidates, &requested, None).unwrap());
            let b = index_of(&candidates, &second.matches(&candidates, &requested, None).unwrap());
            prop_assert_eq!(&a, &b);

            // Every selected candidate is individually compatible
            for index in a {
                prop_assert!(first.is_matching_candidate(&candidates[index], &requested).unwrap());
            }
        }
    }
}
