//! Text-safe transport encoding for document content.
//!
//! The remote endpoint carries file bytes as base64 text. Documents are
//! UTF-8 JSON, so encoding goes through the UTF-8 bytes and decoding
//! validates them, which keeps multi-byte characters (`°F`, accented names)
//! intact.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::document::Document;
use crate::error::StoreError;

/// Encode UTF-8 text for transport.
pub fn encode_content(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decode transport text back into UTF-8.
///
/// The remote wraps long payloads with newlines, so ASCII whitespace is
/// ignored.
pub fn decode_content(encoded: &str) -> Result<String, StoreError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| StoreError::Decode(format!("Invalid base64 content: {}", e)))?;

    String::from_utf8(bytes)
        .map_err(|e| StoreError::Decode(format!("Content is not valid UTF-8: {}", e)))
}

/// Serialize a document to the persisted JSON text form.
pub fn serialize_document(document: &Document) -> Result<String, StoreError> {
    serde_json::to_string_pretty(document)
        .map_err(|e| StoreError::Serialization(format!("Failed to serialize document: {}", e)))
}

/// Parse the persisted JSON text form.
pub fn parse_document(text: &str) -> Result<Document, StoreError> {
    serde_json::from_str(text)
        .map_err(|e| StoreError::Decode(format!("Failed to parse document: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Checklist, Submission, TempLogs};
    use chrono::{TimeZone, Utc};

    fn sample_document() -> Document {
        Document {
            checklists: vec![Checklist {
                id: "health".to_string(),
                name: "Santé & Hygiène ✓".to_string(),
                tasks: vec![
                    "Record temperature (Standard: 41°F or below).".to_string(),
                    "Vérifier les éviers — 手洗い".to_string(),
                ],
                extra: Default::default(),
            }],
            submissions: vec![Submission {
                id: "s1".to_string(),
                checklist_id: "health".to_string(),
                checklist_name: "Santé & Hygiène ✓".to_string(),
                submitter_id: "u1".to_string(),
                employee_name: "Zoë Ñúñez 🍳".to_string(),
                location: "Austell".to_string(),
                completion_date: "2024-03-01".to_string(),
                completion_time: "09:00".to_string(),
                completed_tasks: vec!["Record temperature (Standard: 41°F or below).".to_string()],
                total_tasks: 2,
                timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 0).unwrap(),
                notification_email: None,
                temp_logs: Some(TempLogs::from([(
                    "Kitchen_Meat_Cooler".to_string(),
                    "38".to_string(),
                )])),
                extra: Default::default(),
            }],
            reports: None,
            extra: Default::default(),
        }
    }

    #[test]
    fn test_document_survives_serialize_encode_decode_parse() {
        let doc = sample_document();
        let encoded = encode_content(&serialize_document(&doc).unwrap());
        let decoded = parse_document(&decode_content(&encoded).unwrap()).unwrap();
        assert_eq!(decoded, doc);
    }

    #[test]
    fn test_decode_ignores_line_wrapping() {
        let encoded = encode_content("{\"checklists\": [], \"submissions\": [], \"note\": \"°F\"}");
        let wrapped: String = encoded
            .as_bytes()
            .chunks(20)
            .map(|chunk| format!("{}\n", String::from_utf8_lossy(chunk)))
            .collect();
        assert_eq!(
            decode_content(&wrapped).unwrap(),
            "{\"checklists\": [], \"submissions\": [], \"note\": \"°F\"}"
        );
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let encoded = STANDARD.encode([0xff, 0xfe, 0x00]);
        assert!(matches!(
            decode_content(&encoded),
            Err(StoreError::Decode(_))
        ));
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(matches!(
            parse_document("{\"checklists\": [}"),
            Err(StoreError::Decode(_))
        ));
    }
}
