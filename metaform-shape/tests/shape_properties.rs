//! Property-based tests for shape composition and conformance.
//!
//! - A value conforming to a composed shape conforms to every base.
//! - Dropping or nulling any required attribute breaks conformance.
//! - Shapes without attributes never match structurally.

use metaform_shape::{AttrType, Kind, StructuralType};
use proptest::prelude::*;
use serde_json::{Map, Value, json};
use std::sync::Arc;

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn kind_strategy() -> impl Strategy<Value = Kind> {
    prop_oneof![
        Just(Kind::Bool),
        Just(Kind::Integer),
        Just(Kind::Float),
        Just(Kind::String),
    ]
}

/// Attribute declarations with unique names.
fn attributes_strategy() -> impl Strategy<Value = Vec<(String, Kind)>> {
    prop::collection::btree_map("[a-z]{1,6}", kind_strategy(), 1..6)
        .prop_map(|m| m.into_iter().collect())
}

fn sample_for(kind: Kind) -> Value {
    match kind {
        Kind::Bool => json!(true),
        Kind::Integer => json!(7),
        Kind::Float => json!(1.5),
        Kind::String => json!("s"),
        _ => Value::Null,
    }
}

fn instance_for(attributes: &[(String, Kind)]) -> Map<String, Value> {
    attributes
        .iter()
        .map(|(name, kind)| (name.clone(), sample_for(*kind)))
        .collect()
}

fn declare(name: &str, attributes: &[(String, Kind)], bases: &[Arc<StructuralType>]) -> Arc<StructuralType> {
    let typed = attributes
        .iter()
        .map(|(n, k)| (n.clone(), AttrType::Native(*k)));
    Arc::new(StructuralType::declare(name, typed, bases).unwrap())
}

// =============================================================================
// COMPOSITION PROPERTIES
// =============================================================================

proptest! {
    /// conforms(S2, x) implies conforms(S1, x) for every base S1 of S2.
    #[test]
    fn composed_conformance_implies_base_conformance(
        base_attrs in attributes_strategy(),
        extra in prop::collection::btree_map("[A-Z]{1,6}", kind_strategy(), 0..4),
    ) {
        let base = declare("Base", &base_attrs, &[]);
        let extra: Vec<(String, Kind)> = extra.into_iter().collect();
        let composed = declare("Composed", &extra, &[base.clone()]);

        let mut all = base_attrs.clone();
        all.extend(extra.iter().cloned());
        let instance = Value::Object(instance_for(&all));

        prop_assert!(composed.conforms(&instance));
        prop_assert!(base.conforms(&instance));
    }

    /// Removing any one required attribute, or nulling it, breaks conformance.
    #[test]
    fn every_required_attribute_is_needed(
        attrs in attributes_strategy(),
        pick in any::<prop::sample::Index>(),
    ) {
        let shape = declare("Shape", &attrs, &[]);
        let full = instance_for(&attrs);
        let (victim, _) = &attrs[pick.index(attrs.len())];

        let mut missing = full.clone();
        missing.remove(victim);
        prop_assert!(!shape.conforms(&Value::Object(missing)));

        let mut nulled = full;
        nulled.insert(victim.clone(), Value::Null);
        prop_assert!(!shape.conforms(&Value::Object(nulled)));
    }

    /// A shape with no attributes never matches, whatever the value exposes.
    #[test]
    fn empty_shape_never_matches(attrs in attributes_strategy()) {
        let empty = declare("Empty", &[], &[]);
        prop_assert!(!empty.conforms(&Value::Object(instance_for(&attrs))));
    }
}
