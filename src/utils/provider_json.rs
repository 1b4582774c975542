use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

const DETAIL_LIMIT: usize = 500;

/// Removes a markdown code fence (with or without a language tag) wrapped
/// around provider output. Text without a fence comes back trimmed.
pub fn strip_markdown_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };

    let after = &trimmed[start + 3..];
    let body = match after.find('\n') {
        Some(nl) => &after[nl + 1..],
        None => after.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    let body = match body.rfind("```") {
        Some(end) => &body[..end],
        None => body,
    };
    body.trim()
}

/// Narrows text to the outermost JSON object or array when the model wraps
/// it in prose.
pub fn json_span(text: &str) -> &str {
    if text.starts_with('{') || text.starts_with('[') {
        return text;
    }
    let start = text.find(['{', '[']);
    let end = text.rfind(['}', ']']);
    match (start, end) {
        (Some(s), Some(e)) if s < e => &text[s..=e],
        _ => text,
    }
}

pub fn sanitize(raw: &str) -> &str {
    json_span(strip_markdown_fences(raw))
}

/// Parses provider output into `T`, sanitizing only when the trimmed text is
/// not already valid JSON. Any failure is a `MalformedProviderResponse`
/// carrying the head of the raw text.
pub fn parse_provider_json<T: DeserializeOwned>(raw: &str) -> Result<T> {
    if let Ok(parsed) = serde_json::from_str(raw.trim()) {
        return Ok(parsed);
    }

    let cleaned = sanitize(raw);
    if cleaned.is_empty() {
        return Err(Error::malformed("provider returned an empty response", None));
    }
    serde_json::from_str(cleaned).map_err(|e| {
        Error::malformed(
            format!("could not parse provider JSON: {}", e),
            Some(raw.chars().take(DETAIL_LIMIT).collect()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Feedback {
        feedback: String,
    }

    #[test]
    fn unfenced_json_is_untouched() {
        let raw = "  {\"feedback\": \"ok\"}\n";
        assert_eq!(strip_markdown_fences(raw), "{\"feedback\": \"ok\"}");
        let parsed: Feedback = parse_provider_json(raw).unwrap();
        assert_eq!(parsed.feedback, "ok");
    }

    #[test]
    fn backticks_inside_valid_json_survive() {
        let raw = r#"{"feedback": "Remember that ```let x = 1;``` declares a binding."}"#;
        let parsed: Feedback = parse_provider_json(raw).unwrap();
        assert_eq!(
            parsed.feedback,
            "Remember that ```let x = 1;``` declares a binding."
        );
    }

    #[test]
    fn fenced_json_with_inner_backticks_is_parsed() {
        let raw = "```json\n{\"feedback\": \"Use `cargo fmt`.\"}\n```";
        let parsed: Feedback = parse_provider_json(raw).unwrap();
        assert_eq!(parsed.feedback, "Use `cargo fmt`.");
    }

    #[test]
    fn json_fence_is_removed() {
        let raw = "```json\n{\"feedback\": \"fenced\"}\n```";
        let parsed: Feedback = parse_provider_json(raw).unwrap();
        assert_eq!(parsed.feedback, "fenced");
    }

    #[test]
    fn bare_fence_is_removed() {
        let raw = "```\n[1, 2, 3]\n```\n";
        let parsed: Vec<u8> = parse_provider_json(raw).unwrap();
        assert_eq!(parsed, vec![1, 2, 3]);
    }

    #[test]
    fn single_line_fence_with_tag() {
        assert_eq!(strip_markdown_fences("```json {\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn prose_around_fence_is_dropped() {
        let raw = "Here you go:\n```json\n{\"feedback\": \"x\"}\n```\nHope it helps!";
        let parsed: Feedback = parse_provider_json(raw).unwrap();
        assert_eq!(parsed.feedback, "x");
    }

    #[test]
    fn prose_without_fence_narrows_to_object() {
        let raw = "Sure! {\"feedback\": \"inline\"} Anything else?";
        let parsed: Feedback = parse_provider_json(raw).unwrap();
        assert_eq!(parsed.feedback, "inline");
    }

    #[test]
    fn garbage_is_a_typed_error_with_detail() {
        let err = parse_provider_json::<Feedback>("I cannot help with that.").unwrap_err();
        match err {
            Error::MalformedProviderResponse { detail, .. } => {
                assert_eq!(detail.as_deref(), Some("I cannot help with that."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn wrong_shape_is_a_typed_error() {
        let err = parse_provider_json::<Feedback>("{\"score\": 3}").unwrap_err();
        assert!(matches!(err, Error::MalformedProviderResponse { .. }));
    }

    #[test]
    fn empty_response_is_a_typed_error() {
        let err = parse_provider_json::<Feedback>("```json\n```").unwrap_err();
        assert!(matches!(err, Error::MalformedProviderResponse { .. }));
    }
}
