//! Structural parsing of the provider's reply.
//!
//! Only the outer shape is checked here: the reply must be a JSON array once
//! stray code fences are removed. Individual records stay loose; their fields
//! are defaulted when persisted (see `TinkerRecord::normalize`).

use serde_json::Value as JsonValue;
use thiserror::Error;

use tinkerscout_core::TinkerRecord;

/// The reply could not be read as a JSON array.
///
/// Carries the cleaned text so the caller can log it for post-mortems.
#[derive(Debug, Clone, Error)]
#[error("malformed response: {reason}")]
pub struct MalformedResponseError {
    pub raw: String,
    pub reason: String,
}

/// Remove code-fence lines at the edges of `raw`.
///
/// An opening fence is three backticks optionally followed by a language tag
/// such as `json`; a closing fence is three backticks. Both are dropped
/// independently, so half-fenced and single-line fenced replies are cleaned
/// as well.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        let tag_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        text = &rest[tag_len..];
    }

    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

/// Parse a raw reply into a batch of records.
///
/// An empty array is a valid, empty batch.
pub fn parse_batch(raw: &str) -> Result<Vec<TinkerRecord>, MalformedResponseError> {
    let cleaned = strip_code_fences(raw);

    let value: JsonValue = serde_json::from_str(cleaned).map_err(|e| MalformedResponseError {
        raw: cleaned.to_string(),
        reason: format!("invalid json: {e}"),
    })?;

    match value {
        JsonValue::Array(items) => Ok(items.into_iter().map(TinkerRecord::new).collect()),
        other => Err(MalformedResponseError {
            raw: cleaned.to_string(),
            reason: format!("expected a json array, found {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    const BATCH: &str = r#"[{"name":"FOO","hypeLevel":"High"},{"name":"BAR"}]"#;

    #[test]
    fn plain_array_parses() {
        let batch = parse_batch(BATCH).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].name(), Some("FOO"));
        assert_eq!(batch[1].name(), Some("BAR"));
    }

    #[test]
    fn fenced_array_parses_like_plain_array() {
        let fenced = format!("```json\n{BATCH}\n```");
        assert_eq!(parse_batch(&fenced).unwrap(), parse_batch(BATCH).unwrap());

        let bare_fence = format!("```\n{BATCH}\n```\n");
        assert_eq!(parse_batch(&bare_fence).unwrap(), parse_batch(BATCH).unwrap());
    }

    #[test]
    fn half_fenced_array_parses() {
        let leading_only = format!("```json\n{BATCH}");
        assert_eq!(parse_batch(&leading_only).unwrap().len(), 2);

        let trailing_only = format!("{BATCH}\n```");
        assert_eq!(parse_batch(&trailing_only).unwrap().len(), 2);
    }

    #[test]
    fn single_line_fence_parses() {
        assert_eq!(parse_batch(&format!("```json {BATCH} ```")).unwrap().len(), 2);
    }

    #[test]
    fn empty_array_is_an_empty_batch() {
        assert!(parse_batch("[]").unwrap().is_empty());
        assert!(parse_batch("```json\n[]\n```").unwrap().is_empty());
    }

    #[test]
    fn non_json_is_malformed_and_keeps_raw_text() {
        let err = parse_batch("```json\nSorry, I cannot browse the web.\n```").unwrap_err();
        assert_eq!(err.raw, "Sorry, I cannot browse the web.");
        assert!(err.reason.starts_with("invalid json"));
    }

    #[test]
    fn non_array_is_malformed() {
        let err = parse_batch(r#"{"name":"FOO"}"#).unwrap_err();
        assert!(err.reason.contains("object"));

        let err = parse_batch("null").unwrap_err();
        assert!(err.reason.contains("null"));
    }

    #[test]
    fn blank_reply_is_malformed() {
        assert!(parse_batch("").is_err());
        assert!(parse_batch("```\n```").is_err());
    }

    #[test]
    fn loose_records_do_not_fail_the_batch() {
        let batch = parse_batch(r#"[{"name":"FOO","extra":{"x":1}}, 3, {"reason":"no name"}]"#).unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[1].as_json(), &json!(3));
    }

    proptest! {
        #[test]
        fn fences_never_change_the_result(
            names in proptest::collection::vec("[A-Z]{1,8}", 0..5),
            tag in proptest::option::of("[a-z]{1,6}"),
        ) {
            let array = serde_json::to_string(
                &names.iter().map(|n| json!({ "name": n })).collect::<Vec<_>>()
            ).unwrap();
            let open = format!("```{}", tag.unwrap_or_default());
            let fenced = format!("{open}\n{array}\n```");

            prop_assert_eq!(parse_batch(&fenced).unwrap(), parse_batch(&array).unwrap());
        }
    }
}
