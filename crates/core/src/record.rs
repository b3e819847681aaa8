//! Loosely-shaped records as reported by the intelligence source.
//!
//! The source is a generative model, so field presence, casing and types
//! drift between runs. Records are therefore kept as raw JSON until the
//! moment they are persisted, where [`TinkerRecord::normalize`] applies the
//! per-field defaults. A bad field never invalidates the surrounding batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::error::{DomainError, DomainResult};
use crate::id::TinkerId;
use crate::tinker::{Level, Tinker};

/// Placeholder for descriptive text fields the source left out.
pub const UNKNOWN_TEXT: &str = "Unknown";

/// Placeholder for a missing contract address.
pub const UNKNOWN_CONTRACT_ADDRESS: &str = "unknown";

const BLOCKCHAIN_KEYS: &[&str] = &["blockchain", "Blockchain", "blockChain", "blockchainTag", "chain"];
const CONTRACT_KEYS: &[&str] = &["contractAddress", "CA", "ca"];

const DEFAULT_HYPE: Level = Level::Low;
const DEFAULT_RISK: Level = Level::High;

/// One element of a parsed batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TinkerRecord(JsonValue);

impl TinkerRecord {
    pub fn new(value: JsonValue) -> Self {
        Self(value)
    }

    pub fn as_json(&self) -> &JsonValue {
        &self.0
    }

    fn fields(&self) -> Option<&Map<String, JsonValue>> {
        self.0.as_object()
    }

    /// The dedupe key, if the record carries a usable one.
    ///
    /// Names are taken exactly as received (no case folding, no trimming);
    /// only an empty string counts as missing.
    pub fn name(&self) -> Option<&str> {
        let name = self.fields()?.get("name")?.as_str()?;
        (!name.is_empty()).then_some(name)
    }

    /// Apply defaults and produce a persistable tinker.
    ///
    /// `now` is the processing time used for missing or unparsable timestamps.
    pub fn normalize(&self, now: DateTime<Utc>) -> DomainResult<Tinker> {
        let Some(fields) = self.fields() else {
            return Err(DomainError::validation(format!(
                "record is not an object: {}",
                self.0
            )));
        };
        let name = self
            .name()
            .ok_or_else(|| DomainError::validation("record has no usable name"))?
            .to_string();

        Ok(Tinker {
            id: TinkerId::new(),
            reason: text_field(fields, &["reason"]).unwrap_or_else(|| UNKNOWN_TEXT.to_string()),
            source: text_field(fields, &["source"]).unwrap_or_else(|| UNKNOWN_TEXT.to_string()),
            blockchain: text_field(fields, BLOCKCHAIN_KEYS)
                .unwrap_or_else(|| UNKNOWN_TEXT.to_string()),
            hype_level: level_field(fields, "hypeLevel").unwrap_or(DEFAULT_HYPE),
            risk_level: level_field(fields, "riskLevel").unwrap_or(DEFAULT_RISK),
            contract_address: text_field(fields, CONTRACT_KEYS)
                .unwrap_or_else(|| UNKNOWN_CONTRACT_ADDRESS.to_string()),
            found_at: time_field(fields, "foundAt").unwrap_or(now),
            created_at: time_field(fields, "createdAt").unwrap_or(now),
            name,
        })
    }
}

impl From<JsonValue> for TinkerRecord {
    fn from(value: JsonValue) -> Self {
        Self(value)
    }
}

/// First non-blank value among `keys`, rendered as text.
fn text_field(fields: &Map<String, JsonValue>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let text = match fields.get(*key)? {
            JsonValue::Null => return None,
            JsonValue::String(s) => s.trim().to_string(),
            JsonValue::Number(n) => n.to_string(),
            JsonValue::Bool(b) => b.to_string(),
            other => other.to_string(),
        };
        (!text.is_empty()).then_some(text)
    })
}

fn level_field(fields: &Map<String, JsonValue>, key: &str) -> Option<Level> {
    let raw = fields.get(key)?.as_str()?;
    match raw.parse() {
        Ok(level) => Some(level),
        Err(e) => {
            debug!(field = key, error = %e, "ignoring unrecognised level");
            None
        }
    }
}

fn time_field(fields: &Map<String, JsonValue>, key: &str) -> Option<DateTime<Utc>> {
    let raw = fields.get(key)?.as_str()?;
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|t| t.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 29, 13, 0, 0).unwrap()
    }

    #[test]
    fn full_record_keeps_all_fields() {
        let record = TinkerRecord::new(json!({
            "name": "MEMEX",
            "reason": "Trending in CT",
            "hypeLevel": "High",
            "riskLevel": "Medium",
            "source": "Twitter",
            "Blockchain": "Base",
            "CA": "0xabc",
            "foundAt": "2025-06-29T12:00:00Z",
            "createdAt": "2025-06-29T12:05:00Z"
        }));

        let t = record.normalize(now()).unwrap();
        assert_eq!(t.name, "MEMEX");
        assert_eq!(t.reason, "Trending in CT");
        assert_eq!(t.hype_level, Level::High);
        assert_eq!(t.risk_level, Level::Medium);
        assert_eq!(t.source, "Twitter");
        assert_eq!(t.blockchain, "Base");
        assert_eq!(t.contract_address, "0xabc");
        assert_eq!(t.found_at, Utc.with_ymd_and_hms(2025, 6, 29, 12, 0, 0).unwrap());
        assert_eq!(t.created_at, Utc.with_ymd_and_hms(2025, 6, 29, 12, 5, 0).unwrap());
    }

    #[test]
    fn missing_fields_get_defaults() {
        let t = TinkerRecord::new(json!({ "name": "FOO" }))
            .normalize(now())
            .unwrap();

        assert_eq!(t.reason, UNKNOWN_TEXT);
        assert_eq!(t.source, UNKNOWN_TEXT);
        assert_eq!(t.blockchain, UNKNOWN_TEXT);
        assert_eq!(t.hype_level, Level::Low);
        assert_eq!(t.risk_level, Level::High);
        assert_eq!(t.contract_address, UNKNOWN_CONTRACT_ADDRESS);
        assert_eq!(t.found_at, now());
        assert_eq!(t.created_at, now());
    }

    #[test]
    fn unparsable_values_fall_back_to_defaults() {
        let t = TinkerRecord::new(json!({
            "name": "FOO",
            "hypeLevel": "Stratospheric",
            "riskLevel": 7,
            "foundAt": "yesterday-ish",
            "source": null,
            "contractAddress": "   "
        }))
        .normalize(now())
        .unwrap();

        assert_eq!(t.hype_level, Level::Low);
        assert_eq!(t.risk_level, Level::High);
        assert_eq!(t.found_at, now());
        assert_eq!(t.source, UNKNOWN_TEXT);
        assert_eq!(t.contract_address, UNKNOWN_CONTRACT_ADDRESS);
    }

    #[test]
    fn blockchain_accepts_alternate_casings() {
        for key in ["blockchain", "Blockchain", "blockChain", "blockchainTag", "chain"] {
            let t = TinkerRecord::new(json!({ "name": "FOO", key: "Solana" }))
                .normalize(now())
                .unwrap();
            assert_eq!(t.blockchain, "Solana", "key {key}");
        }
    }

    #[test]
    fn non_string_text_is_rendered() {
        let t = TinkerRecord::new(json!({ "name": "FOO", "source": 42 }))
            .normalize(now())
            .unwrap();
        assert_eq!(t.source, "42");
    }

    #[test]
    fn name_is_kept_exactly_as_received() {
        let record = TinkerRecord::new(json!({ "name": "  FooBar " }));
        assert_eq!(record.name(), Some("  FooBar "));
        let t = record.normalize(now()).unwrap();
        assert_eq!(t.name, "  FooBar ");
    }

    #[test]
    fn record_without_name_is_rejected() {
        for value in [json!({}), json!({ "name": "" }), json!({ "name": 12 }), json!("FOO")] {
            let err = TinkerRecord::new(value).normalize(now()).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }
    }

    proptest! {
        #[test]
        fn any_non_blank_name_survives_normalisation(name in "[A-Za-z0-9$]{1,16}") {
            let t = TinkerRecord::new(json!({ "name": name.clone() }))
                .normalize(now())
                .unwrap();
            prop_assert_eq!(t.name, name);
        }
    }
}
