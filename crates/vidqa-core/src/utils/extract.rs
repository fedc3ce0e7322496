//! Structured payload extraction from raw model output.
//!
//! Models wrap JSON in code fences and chatter around it. The payload is
//! located by taking the first opening bracket of the expected shape and
//! the last matching closing bracket, looking inside the first code fence
//! before falling back to the whole response.

use serde::de::DeserializeOwned;
use thiserror::Error;

const FENCE: &str = "```";

/// Expected top-level JSON shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Object,
    Array,
}

impl Shape {
    const fn delimiters(self) -> (char, char) {
        match self {
            Self::Object => ('{', '}'),
            Self::Array => ('[', ']'),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("No {0:?} payload found in model output")]
    NoPayload(Shape),

    #[error("Payload is not valid JSON for the expected structure: {0}")]
    Parse(String),
}

/// Locate the payload text for `shape` inside `raw`.
pub fn locate_payload(raw: &str, shape: Shape) -> Option<&str> {
    fenced_body(raw)
        .and_then(|body| bracketed(body, shape))
        .or_else(|| bracketed(raw, shape))
}

/// Locate and deserialize the payload for `shape`.
pub fn extract_structured<T: DeserializeOwned>(raw: &str, shape: Shape) -> Result<T, ExtractError> {
    let payload = locate_payload(raw, shape).ok_or(ExtractError::NoPayload(shape))?;
    serde_json::from_str(payload).map_err(|e| ExtractError::Parse(e.to_string()))
}

fn bracketed(text: &str, shape: Shape) -> Option<&str> {
    let (open, close) = shape.delimiters();
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Body of the first code fence, with any language label removed.
fn fenced_body(raw: &str) -> Option<&str> {
    let start = raw.find(FENCE)? + FENCE.len();
    let after = &raw[start..];
    let body = after.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    let end = body.find(FENCE).unwrap_or(body.len());
    Some(&body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Point {
        timestamp: String,
        reason: String,
    }

    fn point(raw: &str) -> Result<Point, ExtractError> {
        extract_structured(raw, Shape::Object)
    }

    #[test]
    fn test_bare_payload() {
        let p = point(r#"{"timestamp":"1:02:03","reason":"intro"}"#).unwrap();
        assert_eq!(p.timestamp, "1:02:03");
    }

    #[test]
    fn test_labeled_fence() {
        let raw = "```json\n{\"timestamp\": \"2:00\", \"reason\": \"demo\"}\n```";
        assert_eq!(point(raw).unwrap().reason, "demo");
    }

    #[test]
    fn test_unlabeled_fence() {
        let raw = "```\n{\"timestamp\": \"2:00\", \"reason\": \"demo\"}\n```";
        assert_eq!(point(raw).unwrap().timestamp, "2:00");
    }

    #[test]
    fn test_surrounding_prose() {
        let raw = "Sure! Here is the answer: {\"timestamp\": \"0:45\", \"reason\": \"setup\"} Hope that helps.";
        assert_eq!(point(raw).unwrap().timestamp, "0:45");
    }

    #[test]
    fn test_prose_with_stray_brackets_after_fence() {
        let raw = "Result:\n```json\n[{\"a\": 1}]\n```\nNote [1]: see above";
        let items: Vec<serde_json::Value> = extract_structured(raw, Shape::Array).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_missing_payload_and_bad_json() {
        assert_eq!(
            point("I cannot help with that").unwrap_err(),
            ExtractError::NoPayload(Shape::Object)
        );
        assert!(matches!(
            point("{timestamp: oops}"),
            Err(ExtractError::Parse(_))
        ));
        assert!(locate_payload("} backwards {", Shape::Object).is_none());
    }
}
