//! Model reply → ExtractedFieldSet
//!
//! Never fails: anything unusable becomes an `Unparsed` outcome carrying the
//! raw text and the reason, so a malformed reply can be told apart from a
//! document that simply had no data.

use crate::extractors::json_block::{locate_json_object, JsonSource};
use crate::types::{ExtractedFieldSet, FieldSet};
use tracing::{debug, warn};

/// Upper bound on raw reply text kept inside an `Unparsed` marker
const MAX_RAW_TEXT_CHARS: usize = 2000;

/// Parse one model reply for `document_id`
pub fn parse_model_reply(document_id: &str, raw_text: &str) -> ExtractedFieldSet {
    let Some((candidate, source)) = locate_json_object(raw_text) else {
        warn!(document_id = %document_id, "No JSON object found in model reply");
        return ExtractedFieldSet::unparsed(
            document_id,
            truncate(raw_text),
            "no JSON object found in model reply",
        );
    };

    let value: serde_json::Value = match serde_json::from_str(candidate) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                document_id = %document_id,
                source = ?source,
                error = %e,
                "Model reply contained malformed JSON"
            );
            return ExtractedFieldSet::unparsed(
                document_id,
                truncate(raw_text),
                format!("malformed JSON in model reply: {}", e),
            );
        }
    };

    let Some(fields) = FieldSet::from_json_object(&value) else {
        return ExtractedFieldSet::unparsed(
            document_id,
            truncate(raw_text),
            "model reply JSON is not an object",
        );
    };

    debug!(
        document_id = %document_id,
        fields_found = fields.len(),
        fenced = source == JsonSource::FencedBlock,
        "Parsed model reply"
    );

    ExtractedFieldSet::parsed(document_id, fields)
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_RAW_TEXT_CHARS).collect()
}
