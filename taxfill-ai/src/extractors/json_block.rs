//! Locate a JSON object inside free-form model text
//!
//! Two stages, first match wins:
//! 1. A fenced code block labelled `json` (```` ```json ... ``` ````)
//! 2. The span from the first `{` to the last `}` of the text

/// Where the candidate JSON text was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonSource {
    FencedBlock,
    BraceSpan,
}

/// Find the JSON object text in `text`
///
/// Returns the trimmed candidate and how it was found, or `None` when
/// neither stage matches. The candidate is not validated here.
pub fn locate_json_object(text: &str) -> Option<(&str, JsonSource)> {
    if let Some(block) = fenced_json_block(text) {
        return Some((block, JsonSource::FencedBlock));
    }
    brace_span(text).map(|span| (span, JsonSource::BraceSpan))
}

/// Body of the first code fence whose info string is `json`
fn fenced_json_block(text: &str) -> Option<&str> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find("```") {
        let fence_start = search_from + offset + 3;
        let rest = &text[fence_start..];
        let line_end = rest.find('\n').unwrap_or(rest.len());
        let info = rest[..line_end].trim();

        if info.eq_ignore_ascii_case("json") {
            let body_start = (fence_start + line_end + 1).min(text.len());
            let body = &text[body_start..];
            let body_end = body.find("```")?;
            let block = body[..body_end].trim();
            return (!block.is_empty()).then_some(block);
        }

        // Skip past this fence's closing marker, if any
        let after_info = fence_start + line_end;
        match text[after_info..].find("```") {
            Some(close) => search_from = after_info + close + 3,
            None => return None,
        }
    }
    None
}

/// Text from the first `{` through the last `}`
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_block_preferred() {
        let text = "Here you go {not this}\n```json\n{\"wages\": 1}\n```\nthanks";
        let (json, source) = locate_json_object(text).unwrap();
        assert_eq!(json, "{\"wages\": 1}");
        assert_eq!(source, JsonSource::FencedBlock);
    }

    #[test]
    fn test_uppercase_label_accepted() {
        let text = "```JSON\n{\"ssn\": null}\n```";
        assert_eq!(locate_json_object(text).unwrap().0, "{\"ssn\": null}");
    }

    #[test]
    fn test_other_fences_skipped() {
        let text = "```text\nignore {me}\n```\nthen\n```json\n{\"city\": \"Austin\"}\n```";
        let (json, source) = locate_json_object(text).unwrap();
        assert_eq!(json, "{\"city\": \"Austin\"}");
        assert_eq!(source, JsonSource::FencedBlock);
    }

    #[test]
    fn test_brace_span_fallback() {
        let text = "The values are {\"wages\": 75000, \"employer\": {\"name\": \"Acme\"}} as requested.";
        let (json, source) = locate_json_object(text).unwrap();
        assert_eq!(
            json,
            "{\"wages\": 75000, \"employer\": {\"name\": \"Acme\"}}"
        );
        assert_eq!(source, JsonSource::BraceSpan);
    }

    #[test]
    fn test_unterminated_json_fence_falls_back_to_braces() {
        let text = "```json\n{\"zip\": \"10001\"}";
        let (json, source) = locate_json_object(text).unwrap();
        assert_eq!(json, "{\"zip\": \"10001\"}");
        assert_eq!(source, JsonSource::BraceSpan);
    }

    #[test]
    fn test_prose_only_yields_none() {
        assert!(locate_json_object("I could not read this document, sorry.").is_none());
        assert!(locate_json_object("} backwards {").is_none());
        assert!(locate_json_object("").is_none());
    }
}
