// crates/flagship-core/tests/proptest_split.rs
// ============================================================================
// Module: Split Model Property-Based Tests
// Description: Property tests for split condition-walking robustness.
// Purpose: Detect panics and false extractions across arbitrary condition
//          payloads.
// ============================================================================

//! Property-based tests for split model invariants.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use flagship_core::Split;
use proptest::prelude::*;
use serde_json::Value;

fn json_value_strategy(max_depth: u32) -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|v| Value::Number(v.into())),
        "[a-zA-Z0-9_]{0,12}".prop_map(Value::String),
    ];

    leaf.prop_recursive(max_depth, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0 .. 4).prop_map(Value::Array),
            prop::collection::hash_map("[a-zA-Z]{1,10}", inner, 0 .. 4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn segment_names_never_panics_on_arbitrary_conditions(
        conditions in json_value_strategy(3),
    ) {
        let mut split = Split::new("fuzzed", "user", 1);
        split.definition.insert("conditions".to_string(), conditions);
        // Walking must tolerate any shape; extraction is best-effort.
        let _ = split.segment_names();
    }

    #[test]
    fn segment_names_finds_only_in_segment_matchers(
        segment in "[a-z_]{1,16}",
        other_matcher in "[A-Z_]{1,16}",
    ) {
        let json = serde_json::json!({
            "name": "fuzzed",
            "trafficTypeName": "user",
            "changeNumber": 1,
            "conditions": [{
                "matcherGroup": {
                    "matchers": [
                        {
                            "matcherType": "IN_SEGMENT",
                            "userDefinedSegmentMatcherData": {"segmentName": segment.clone()}
                        },
                        {"matcherType": other_matcher.clone()}
                    ]
                }
            }]
        });
        let split: Split = serde_json::from_value(json).expect("valid split json");
        let names = split.segment_names();
        // The second matcher carries no segment data, so it contributes
        // nothing even when its type collides with IN_SEGMENT.
        prop_assert_eq!(names.len(), 1);
        prop_assert!(names.contains(&segment));
    }
}
