//! Parsing of structured (JSON) output from completion text.
//!
//! Every pipeline stage and the correction engine go through this module:
//! fence stripping, JSON parsing, required-key checks and typed decoding.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Failure to turn completion text into a structured value.
///
/// Every variant carries the raw text it was given.
#[derive(Debug, Error)]
pub enum StructuredOutputError {
    #[error("Empty model output")]
    Empty,

    #[error("Model output is not valid JSON: {message}")]
    InvalidJson { message: String, raw: String },

    #[error("Model output is missing required keys: {}", keys.join(", "))]
    MissingKeys { keys: Vec<String>, raw: String },

    #[error("Model output has an unexpected shape: {message}")]
    Shape { message: String, raw: String },
}

impl StructuredOutputError {
    /// Raw text that failed to parse.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            StructuredOutputError::Empty => None,
            StructuredOutputError::InvalidJson { raw, .. }
            | StructuredOutputError::MissingKeys { raw, .. }
            | StructuredOutputError::Shape { raw, .. } => Some(raw),
        }
    }
}

/// Strip an enclosing Markdown code fence, with or without a language tag.
///
/// Text before the opening fence is dropped; a missing closing fence is
/// tolerated (truncated output).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };

    let after_fence = &trimmed[start + 3..];
    let body = match after_fence.find('\n') {
        Some(newline) => &after_fence[newline + 1..],
        // single line: ```{...}```
        None => after_fence.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };

    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Parse completion text as JSON and require `required_keys` at top level.
///
/// A key whose value is `null` counts as missing.
pub fn parse_json_value(raw: &str, required_keys: &[&str]) -> Result<Value, StructuredOutputError> {
    let body = strip_code_fences(raw);
    if body.is_empty() {
        return Err(StructuredOutputError::Empty);
    }

    let value: Value = serde_json::from_str(body).map_err(|e| StructuredOutputError::InvalidJson {
        message: e.to_string(),
        raw: raw.to_string(),
    })?;

    if required_keys.is_empty() {
        return Ok(value);
    }

    let Some(object) = value.as_object() else {
        return Err(StructuredOutputError::Shape {
            message: "expected a JSON object".to_string(),
            raw: raw.to_string(),
        });
    };

    let missing: Vec<String> = required_keys
        .iter()
        .filter(|key| object.get(**key).map_or(true, Value::is_null))
        .map(|key| key.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(StructuredOutputError::MissingKeys {
            keys: missing,
            raw: raw.to_string(),
        });
    }

    Ok(value)
}

/// Parse completion text into `T` after the required-key check.
pub fn parse_structured<T: DeserializeOwned>(
    raw: &str,
    required_keys: &[&str],
) -> Result<T, StructuredOutputError> {
    let value = parse_json_value(raw, required_keys)?;
    serde_json::from_value(value).map_err(|e| StructuredOutputError::Shape {
        message: e.to_string(),
        raw: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        a: u32,
        b: String,
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(
            strip_code_fences("Here you go:\n```json\n{\"a\":1}\n```\nEnjoy"),
            "{\"a\":1}"
        );
        assert_eq!(strip_code_fences("```json\n{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn test_parse_structured_success() {
        let value: Sample = parse_structured("```json\n{\"a\": 1, \"b\": \"x\"}\n```", &["a", "b"]).unwrap();
        assert_eq!(value, Sample { a: 1, b: "x".into() });
    }

    #[test]
    fn test_missing_keys_reports_names_and_raw() {
        let raw = r#"{"a": 1, "b": null}"#;
        let err = parse_json_value(raw, &["a", "b", "c"]).unwrap_err();
        match &err {
            StructuredOutputError::MissingKeys { keys, .. } => assert_eq!(keys, &["b", "c"]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.raw_output(), Some(raw));
    }

    #[test]
    fn test_invalid_json_and_empty() {
        let err = parse_json_value("I cannot help with that", &[]).unwrap_err();
        assert!(matches!(err, StructuredOutputError::InvalidJson { .. }));

        let err = parse_json_value("```json\n```", &[]).unwrap_err();
        assert!(matches!(err, StructuredOutputError::Empty));
    }

    #[test]
    fn test_shape_errors() {
        let err = parse_json_value("[1, 2]", &["a"]).unwrap_err();
        assert!(matches!(err, StructuredOutputError::Shape { .. }));

        let err = parse_structured::<Sample>(r#"{"a": "one", "b": "x"}"#, &["a"]).unwrap_err();
        assert!(matches!(err, StructuredOutputError::Shape { .. }));
    }
}
