//! Property-based tests for reference handling
//!
//! These tests verify that reference formatting round-trips and that
//! embedding is deterministic and idempotent across a wide range of inputs.

use proptest::prelude::*;
use refweave_core::reference::format_pointer;
use refweave_core::{canonical, InMemoryLoader, JsonReference, JsonSchemaEmbedder};
use serde_json::{Map, Value};

/// Strategy for generating pointer segments, escapable characters included
fn segment_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _.~/-]{0,8}"
}

/// Strategy for generating the document part of a reference
fn url_strategy() -> impl Strategy<Value = Option<String>> {
    proptest::option::of(prop_oneof![
        "[a-z]{1,10}\\.(json|yaml|yml)",
        "\\./[a-z]{1,8}/[a-z]{1,8}\\.json",
        "https://[a-z]{1,10}\\.se(/[a-z]{1,8})?",
    ])
}

/// Strategy for generating JSON documents without `$ref`s
fn json_object_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 ]{0,20}".prop_map(Value::String),
    ];

    let value = leaf.prop_recursive(
        3,  // max depth
        10, // max size
        5,  // items per collection
        |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
                proptest::collection::hash_map("[a-zA-Z_][a-zA-Z0-9_]{0,10}", inner, 0..5)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        },
    );

    // top-level keys never spell "definitions"
    proptest::collection::hash_map("[a-ce-zA-Z_][a-zA-Z0-9_]{0,10}", value, 0..5)
        .prop_map(|m| Value::Object(m.into_iter().collect::<Map<String, Value>>()))
}

proptest! {
    #[test]
    fn format_after_parse_is_identity(
        url in url_strategy(),
        segments in proptest::collection::vec(segment_strategy(), 0..5),
    ) {
        let raw = format!("{}#{}", url.clone().unwrap_or_default(), format_pointer(&segments));

        let reference = JsonReference::parse(&raw).unwrap();
        prop_assert_eq!(reference.url(), url.as_deref());
        prop_assert_eq!(reference.pointer(), segments.as_slice());
        prop_assert_eq!(reference.to_string(), raw);
    }

    #[test]
    fn strings_without_hash_are_rejected(raw in "[a-zA-Z0-9/._~-]{0,30}") {
        prop_assert!(JsonReference::parse(&raw).is_err());
    }

    #[test]
    fn embedding_without_refs_is_stable(document in json_object_strategy()) {
        let loader = InMemoryLoader::new();
        let embedder = JsonSchemaEmbedder::new(&loader);

        let first = embedder.embed(&document).unwrap();
        let second = embedder.embed(&document).unwrap();
        let again = embedder.embed(&first).unwrap();

        prop_assert_eq!(
            canonical::to_canonical_string(&first).unwrap(),
            canonical::to_canonical_string(&second).unwrap()
        );
        prop_assert_eq!(&again, &first);
    }
}
