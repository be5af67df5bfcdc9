//! Wire decoder: character-code payloads back to structured values.
//!
//! The server ships `updateOldData` / `updateStream` payloads as arrays of
//! character codes. Decoding rebuilds the string and tries JSON; text that is
//! not JSON is handed back untouched rather than treated as an error.

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An inbound payload as it arrives inside a channel frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EncodedPayload {
    /// UTF-16 code units, one per element.
    CharCodes(Vec<u32>),
    /// Already a string (decoded the same way as char codes).
    Text(String),
    /// Already structured; passed through.
    Structured(Value),
}

impl EncodedPayload {
    pub fn decode(&self) -> Decoded {
        match self {
            EncodedPayload::CharCodes(codes) => decode_char_codes(codes),
            EncodedPayload::Text(text) => decode_text(text.clone()),
            EncodedPayload::Structured(value) => Decoded::Structured(value.clone()),
        }
    }

    /// Encode a string as character codes (the server's format).
    pub fn from_text(text: &str) -> Self {
        EncodedPayload::CharCodes(text.encode_utf16().map(u32::from).collect())
    }
}

/// Result of decoding a payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Structured(Value),
    Raw(String),
}

impl Decoded {
    pub fn as_structured(&self) -> Result<&Value, DecodeError> {
        match self {
            Decoded::Structured(value) => Ok(value),
            Decoded::Raw(raw) => Err(DecodeError::Unstructured(preview(raw))),
        }
    }

    pub fn into_structured(self) -> Result<Value, DecodeError> {
        match self {
            Decoded::Structured(value) => Ok(value),
            Decoded::Raw(raw) => Err(DecodeError::Unstructured(preview(&raw))),
        }
    }
}

/// Rebuild a string from character codes and try to parse it as JSON.
///
/// Each code is truncated to a 16-bit unit; unpaired surrogates become
/// U+FFFD. Never fails: non-JSON text comes back as [`Decoded::Raw`].
pub fn decode_char_codes(codes: &[u32]) -> Decoded {
    let text: String = char::decode_utf16(codes.iter().map(|&c| c as u16))
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    decode_text(text)
}

fn decode_text(text: String) -> Decoded {
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => Decoded::Structured(value),
        Err(_) => Decoded::Raw(text),
    }
}

fn preview(raw: &str) -> String {
    const MAX: usize = 64;
    match raw.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}…", &raw[..idx]),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn codes(s: &str) -> Vec<u32> {
        s.encode_utf16().map(u32::from).collect()
    }

    #[test]
    fn test_decode_json_object() {
        let decoded = decode_char_codes(&codes(r#"{"time":100,"value":1}"#));
        assert_eq!(decoded, Decoded::Structured(json!({"time": 100, "value": 1})));
    }

    #[test]
    fn test_decode_raw_fallback() {
        let decoded = decode_char_codes(&codes("hello"));
        assert_eq!(decoded, Decoded::Raw("hello".into()));
        assert!(matches!(decoded.as_structured(), Err(DecodeError::Unstructured(_))));
    }

    #[test]
    fn test_decode_non_ascii() {
        let decoded = decode_char_codes(&codes(r#"{"s":"€𝄞"}"#));
        assert_eq!(decoded, Decoded::Structured(json!({"s": "€𝄞"})));
    }

    #[test]
    fn test_decode_unpaired_surrogate() {
        let decoded = decode_char_codes(&[0xD800, 0x41]);
        assert_eq!(decoded, Decoded::Raw("\u{FFFD}A".into()));
    }

    #[test]
    fn test_encoded_payload_variants() {
        let p: EncodedPayload = serde_json::from_value(json!([91, 49, 93])).unwrap();
        assert_eq!(p.decode(), Decoded::Structured(json!([1])));

        let p: EncodedPayload = serde_json::from_value(json!("[2]")).unwrap();
        assert_eq!(p.decode(), Decoded::Structured(json!([2])));

        let p: EncodedPayload = serde_json::from_value(json!({"time": 1, "value": 2})).unwrap();
        assert_eq!(p.decode(), Decoded::Structured(json!({"time": 1, "value": 2})));
    }

    #[test]
    fn test_from_text_roundtrip() {
        let p = EncodedPayload::from_text(r#"[{"time":1,"value":2}]"#);
        assert_eq!(p.decode(), Decoded::Structured(json!([{"time": 1, "value": 2}])));
    }
}
