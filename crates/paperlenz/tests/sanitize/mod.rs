use std::collections::BTreeMap;

use paperlenz::sanitize::{extract_json_object, sanitize, SanitizeStrategy};
use proptest::prelude::*;

/// Flat JSON objects without braces or backticks in keys or values.
fn json_object() -> impl Strategy<Value = BTreeMap<String, i64>> {
  prop::collection::btree_map("[a-z_]{1,10}", any::<i64>(), 0..6)
}

/// Prose a model might wrap its answer in.
fn prose() -> impl Strategy<Value = String> { "[A-Za-z0-9 ,.!:'\n-]{0,60}" }

fn fence_tag() -> impl Strategy<Value = &'static str> {
  prop_oneof![Just(""), Just("json"), Just("JSON")]
}

proptest! {
  #[test]
  fn fenced_object_is_recovered(
    object in json_object(),
    before in prose(),
    after in prose(),
    tag in fence_tag(),
  ) {
    let json = serde_json::to_string(&object).unwrap();
    let reply = format!("{before}\n```{tag}\n{json}\n```\n{after}");

    prop_assert_eq!(sanitize(&reply), json.as_str());
    prop_assert_eq!(SanitizeStrategy::Streaming.apply(&reply), json.as_str());
    let decoded: BTreeMap<String, i64> = serde_json::from_str(sanitize(&reply)).unwrap();
    prop_assert_eq!(decoded, object);
  }

  #[test]
  fn unfenced_object_is_recovered(object in json_object(), before in prose(), after in prose()) {
    let json = serde_json::to_string(&object).unwrap();
    let reply = format!("{before}{json}{after}");
    prop_assert_eq!(sanitize(&reply), json.as_str());
  }

  #[test]
  fn streaming_ignores_braces_after_the_object(object in json_object(), after in prose()) {
    let json = serde_json::to_string(&object).unwrap();
    let reply = format!("```json\n{json}\n```\n{after} {{see above}} }}");
    prop_assert_eq!(extract_json_object(&reply), Some(json.as_str()));
    prop_assert_eq!(SanitizeStrategy::Streaming.apply(&reply), json.as_str());
  }

  #[test]
  fn text_without_braces_is_only_trimmed(text in prose()) {
    prop_assert_eq!(sanitize(&text), text.trim());
  }
}

#[test]
fn test_documented_example() {
  let reply = "Here is the JSON:\n```json\n{\"a\":1}\n```\nHope this helps!";
  assert_eq!(sanitize(reply), "{\"a\":1}");
  assert_eq!(SanitizeStrategy::Heuristic.apply(reply), "{\"a\":1}");
}
