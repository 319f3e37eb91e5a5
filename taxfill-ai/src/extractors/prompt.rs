//! Extraction prompt
//!
//! The prompt is fixed: it names every vocabulary key and asks for exactly
//! one JSON object. Text documents are embedded below the instructions.

use crate::types::{FieldKind, FieldName};

/// Upper bound on embedded document text, in characters
pub const MAX_EMBEDDED_CHARS: usize = 100_000;

const INSTRUCTIONS: &str = "\
You are extracting data from a United States individual income tax document \
(for example a W-2, 1099-INT, 1099-DIV, 1099-B or a prior-year return).

Reply with exactly one JSON object inside a ```json fenced code block. The \
object must contain exactly the keys listed below. Use null for any value \
that does not appear in the document. Do not guess and do not add keys.";

/// Build the extraction prompt, optionally embedding a text document
pub fn extraction_prompt(embedded_text: Option<&str>) -> String {
    let mut prompt = String::from(INSTRUCTIONS);
    prompt.push_str("\n\nKeys:\n");

    for field in FieldName::ALL {
        prompt.push_str("- ");
        prompt.push_str(field.as_str());
        prompt.push_str(": ");
        prompt.push_str(describe(field));
        prompt.push('\n');
    }

    if let Some(text) = embedded_text {
        let text: String = text.chars().take(MAX_EMBEDDED_CHARS).collect();
        prompt.push_str("\nDocument text:\n<<<\n");
        prompt.push_str(&text);
        prompt.push_str("\n>>>\n");
    }

    prompt
}

fn describe(field: FieldName) -> &'static str {
    match (field, field.kind()) {
        (FieldName::Ssn, _) => "string, the taxpayer's 9-digit social security number",
        (FieldName::Zip, _) => "string, 5-digit ZIP code",
        (FieldName::State, _) => "string, two-letter state code",
        (_, FieldKind::FilingStatus) => {
            "one of single, married_joint, married_separate, head_of_household, qualifying_widow"
        }
        (FieldName::Adjustments, _) => "number, total adjustments to income in dollars",
        (FieldName::Deductions, _) => "number, itemized deductions in dollars",
        (_, FieldKind::Money) => "number, amount in dollars without currency symbols",
        (_, FieldKind::Text) => "string",
    }
}
