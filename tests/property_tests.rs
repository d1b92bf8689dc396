//! Property-based tests for core domain types.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::collections::HashSet;

use proptest::prelude::*;

use meshline::core::catalog::ProductCatalog;
use meshline::core::lineage::{EdgeDraft, LineageGraph};
use meshline::core::product::{normalize_tags, ProductDraft};
use meshline::core::snapshot::{parse_snapshot, RegistrySnapshot};
use meshline::core::types::{Confidence, ProductName};

/// Strategy for generating valid product name characters.
fn name_char() -> impl Strategy<Value = char> {
    prop_oneof![
        prop::char::range('a', 'z'),
        prop::char::range('A', 'Z'),
        prop::char::range('0', '9'),
        Just('-'),
        Just('_'),
    ]
}

/// Strategy for generating valid product names.
fn valid_name() -> impl Strategy<Value = String> {
    prop::collection::vec(name_char(), 1..30).prop_map(|chars| chars.into_iter().collect())
}

proptest! {
    /// Any valid product name round-trips through serde.
    #[test]
    fn product_name_serde_roundtrip(name in valid_name()) {
        let name = ProductName::new(&name).unwrap();
        let json = serde_json::to_string(&name).unwrap();
        let parsed: ProductName = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(name, parsed);
    }

    /// Names containing any character outside the allowed set are rejected.
    #[test]
    fn product_name_rejects_forbidden_chars(
        prefix in valid_name(),
        bad in prop::char::any().prop_filter(
            "must be outside the allowed set",
            |c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'),
        ),
    ) {
        let candidate = format!("{prefix}{bad}");
        prop_assert!(ProductName::new(candidate).is_err());
    }

    /// A confidence value is accepted exactly when it lies in [0.0, 1.0].
    #[test]
    fn confidence_accepts_exactly_the_unit_interval(value in -10.0f64..10.0) {
        let accepted = Confidence::new(value).is_ok();
        prop_assert_eq!(accepted, (0.0..=1.0).contains(&value));
    }

    /// Tag normalization is idempotent.
    #[test]
    fn tag_normalization_is_idempotent(
        tags in prop::collection::vec("[ A-Za-z0-9_]{0,12}", 0..10)
    ) {
        let once = normalize_tags(&tags);
        let twice = normalize_tags(&once);
        prop_assert_eq!(once, twice);
    }

    /// Registering N distinct names yields a catalog of exactly N
    /// products, each retrievable.
    #[test]
    fn catalog_holds_every_distinct_name(
        names in prop::collection::hash_set(valid_name(), 1..20)
    ) {
        let mut catalog = ProductCatalog::new();
        for name in &names {
            let name = ProductName::new(name).unwrap();
            catalog
                .create(ProductDraft::new(name, "domain", "owner", "desc"))
                .unwrap();
        }

        prop_assert_eq!(catalog.len(), names.len());
        for name in &names {
            prop_assert!(catalog.get(&ProductName::new(name).unwrap()).is_ok());
        }
    }

    /// A snapshot of any registry state survives the serialize/parse cycle.
    #[test]
    fn snapshot_roundtrips_arbitrary_state(
        names in prop::collection::hash_set(valid_name(), 0..10),
        pairs in prop::collection::vec((0..6usize, 0..6usize), 0..15),
    ) {
        let mut catalog = ProductCatalog::new();
        for name in &names {
            catalog
                .create(ProductDraft::new(
                    ProductName::new(name).unwrap(),
                    "domain",
                    "owner",
                    "desc",
                ))
                .unwrap();
        }

        let mut graph = LineageGraph::new();
        for (s, t) in pairs {
            graph
                .add_edge(EdgeDraft::new(
                    ProductName::new(format!("n{s}")).unwrap(),
                    ProductName::new(format!("n{t}")).unwrap(),
                    "transform",
                ))
                .unwrap();
        }

        let snapshot = RegistrySnapshot::new(
            catalog.iter().cloned().collect(),
            graph.iter().cloned().collect(),
        )
        .unwrap();
        let parsed = parse_snapshot(&snapshot.to_json().unwrap()).unwrap();
        prop_assert_eq!(parsed, snapshot);
    }

    /// Traversal over an arbitrary (possibly cyclic) graph terminates,
    /// never reports the root, and reports each node at most once with
    /// a positive depth.
    #[test]
    fn traversal_is_finite_and_duplicate_free(
        pairs in prop::collection::vec((0..8usize, 0..8usize), 0..25),
    ) {
        let mut graph = LineageGraph::new();
        for (s, t) in pairs {
            graph
                .add_edge(EdgeDraft::new(
                    ProductName::new(format!("n{s}")).unwrap(),
                    ProductName::new(format!("n{t}")).unwrap(),
                    "transform",
                ))
                .unwrap();
        }

        let root = ProductName::new("n0").unwrap();
        for nodes in [graph.downstream(&root, None), graph.upstream(&root, None)] {
            let mut seen = HashSet::new();
            for node in &nodes {
                prop_assert!(node.name != root);
                prop_assert!(node.depth >= 1);
                prop_assert!(seen.insert(node.name.clone()), "node reported twice");
            }
            // At most 7 other nodes exist in the name pool.
            prop_assert!(nodes.len() <= 7);
        }
    }
}
