//! # Payload decoder.
//!
//! Pure function: bytes in, [`LogRecord`] or [`DecodeError`] out. The returned
//! record is always untagged.
//!
//! ## Wire form
//! - the payload must be a JSON object; arrays and scalars are malformed
//! - keys match case-insensitively (`ID`, `Message`); an exact lowercase key wins
//! - missing or `null` fields read as empty strings; unknown keys are ignored

use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::records::LogRecord;

/// Parses a raw JSON payload into an untagged [`LogRecord`].
///
/// No validation beyond a successful parse: empty ids or odd timestamps pass through.
pub fn decode(payload: &[u8]) -> Result<LogRecord, DecodeError> {
    let malformed = |source| DecodeError::Malformed {
        payload: String::from_utf8_lossy(payload).into_owned(),
        source,
    };

    let fields: Map<String, Value> = serde_json::from_slice(payload).map_err(malformed)?;
    serde_json::from_value(Value::Object(fold_keys(fields))).map_err(malformed)
}

fn fold_keys(fields: Map<String, Value>) -> Map<String, Value> {
    let mut folded = Map::with_capacity(fields.len());
    for (key, value) in fields {
        let lower = key.to_lowercase();
        if lower == key || !folded.contains_key(&lower) {
            folded.insert(lower, value);
        }
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wire_form() {
        let rec = decode(br#"{"id":"1","timestamp":"t","level":"warning","message":"m"}"#).unwrap();
        assert_eq!(rec, LogRecord::new("1", "t", "warning", "m"));
        assert_eq!(rec.category(), None);
    }

    #[test]
    fn missing_fields_decode_empty() {
        let rec = decode(br#"{"message":"only body"}"#).unwrap();
        assert_eq!(rec.id, "");
        assert_eq!(rec.timestamp, "");
        assert_eq!(rec.message, "only body");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let rec = decode(br#"{"id":"9","message":"m","host":"web-1"}"#).unwrap();
        assert_eq!(rec.id, "9");
    }

    #[test]
    fn malformed_payload_keeps_offending_text() {
        let err = decode(b"not json").unwrap_err();
        assert_eq!(err.payload(), "not json");
        assert_eq!(err.as_label(), "decode_malformed");
    }

    #[test]
    fn wrong_field_type_is_rejected() {
        assert!(decode(br#"{"id":1}"#).is_err());
        assert!(decode(b"[]").is_err());
    }

    #[test]
    fn non_object_payloads_are_rejected() {
        let err = decode(br#"["1","t","warning","m"]"#).unwrap_err();
        assert_eq!(err.payload(), r#"["1","t","warning","m"]"#);
        assert!(decode(b"\"just text\"").is_err());
        assert!(decode(b"42").is_err());
        assert!(decode(b"null").is_err());
    }

    #[test]
    fn keys_match_case_insensitively() {
        let rec = decode(br#"{"ID":"7","Message":"disk full","LEVEL":"error"}"#).unwrap();
        assert_eq!(rec.id, "7");
        assert_eq!(rec.message, "disk full");
        assert_eq!(rec.level, "error");
    }

    #[test]
    fn exact_lowercase_key_wins_over_folded() {
        let rec = decode(br#"{"id":"exact","ID":"folded"}"#).unwrap();
        assert_eq!(rec.id, "exact");
        let rec = decode(br#"{"ID":"folded","id":"exact"}"#).unwrap();
        assert_eq!(rec.id, "exact");
    }

    #[test]
    fn null_fields_read_as_empty() {
        let rec = decode(br#"{"id":null,"message":"m","timestamp":null}"#).unwrap();
        assert_eq!(rec.id, "");
        assert_eq!(rec.timestamp, "");
        assert_eq!(rec.message, "m");
    }
}
