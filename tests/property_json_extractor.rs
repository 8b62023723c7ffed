use proptest::prelude::*;
use serde_json::{Map, Value};
use storelens::services::JsonExtractor;

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i32>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-zA-Z0-9 {}\\[\\]\",:]{0,12}".prop_map(Value::from),
        prop::collection::vec(any::<u16>().prop_map(Value::from), 0..4).prop_map(Value::from),
    ]
}

fn object_strategy() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-z]{1,8}", value_strategy(), 1..6)
        .prop_map(|entries| entries.into_iter().collect())
}

/// Compact serialization plus the byte offset where each member ends.
fn serialize_with_offsets(object: &Map<String, Value>) -> (String, Vec<(String, usize)>) {
    let mut text = String::from("{");
    let mut ends = Vec::new();
    for (i, (key, value)) in object.iter().enumerate() {
        if i > 0 {
            text.push(',');
        }
        text.push_str(&serde_json::to_string(key).unwrap());
        text.push(':');
        text.push_str(&serde_json::to_string(value).unwrap());
        ends.push((key.clone(), text.len()));
    }
    text.push('}');
    (text, ends)
}

proptest! {
    /// Property: valid JSON goes through the direct path unchanged
    #[test]
    fn prop_direct_parse_is_identity(object in object_strategy()) {
        let text = serde_json::to_string(&object).unwrap();
        let expected: Value = serde_json::from_str(&text).unwrap();
        prop_assert_eq!(JsonExtractor::extract(&text, "prop"), Some(expected.clone()));

        let pretty = serde_json::to_string_pretty(&object).unwrap();
        prop_assert_eq!(JsonExtractor::extract(&pretty, "prop"), Some(expected));
    }

    /// Property: fencing and surrounding prose do not change the payload
    #[test]
    fn prop_fenced_block_is_transparent(object in object_strategy()) {
        let text = serde_json::to_string(&object).unwrap();
        let fenced = format!("Here is the result:\n```json\n{}\n```\nAnything else?", text);
        prop_assert_eq!(
            JsonExtractor::extract(&fenced, "prop"),
            Some(Value::Object(object))
        );
    }

    /// Property: fence markers quoted inside string values are plain text
    #[test]
    fn prop_quoted_fences_are_ignored(
        object in object_strategy(),
        snippet in "[a-z0-9\\[\\] ]{0,8}",
    ) {
        let mut object = object;
        object.insert("note".to_string(), Value::from(format!("see ```json {} ``` here", snippet)));
        let text = serde_json::to_string(&object).unwrap();
        prop_assert_eq!(
            JsonExtractor::extract(&text, "prop"),
            Some(Value::Object(object.clone()))
        );

        let in_prose = format!("Result: {} done", text);
        prop_assert_eq!(
            JsonExtractor::extract(&in_prose, "prop"),
            Some(Value::Object(object))
        );
    }

    /// Property: truncation keeps every member written in full before the cut
    #[test]
    fn prop_truncation_repair_keeps_complete_members(
        object in object_strategy(),
        cut_seed in any::<prop::sample::Index>(),
    ) {
        let (text, ends) = serialize_with_offsets(&object);
        prop_assert_eq!(&text, &serde_json::to_string(&object).unwrap());

        // Keep at least "{" and drop at least the final "}".
        let cut = 1 + cut_seed.index(text.len() - 1);
        let truncated = &text[..cut];

        let recovered = JsonExtractor::extract(truncated, "prop");
        prop_assert!(recovered.is_some(), "no result for {:?}", truncated);
        let recovered = recovered.unwrap();

        for (key, end) in &ends {
            if *end <= cut {
                prop_assert_eq!(
                    recovered.get(key),
                    object.get(key),
                    "member {} lost from {:?}",
                    key,
                    truncated
                );
            }
        }
    }

    /// Property: text without braces or brackets never yields a result
    #[test]
    fn prop_plain_text_has_no_result(text in "[a-zA-Z0-9 .,!?]{0,60}") {
        prop_assert_eq!(JsonExtractor::extract(&text, "prop"), None);
    }

    /// Property: arbitrary input never panics
    #[test]
    fn prop_never_panics(text in any::<String>()) {
        let _ = JsonExtractor::extract(&text, "prop");
    }
}
