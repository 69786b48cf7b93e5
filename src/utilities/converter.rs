//! Extraction of structured JSON from free-form model output.
//!
//! Generative backends are asked for a JSON object but routinely wrap it in
//! Markdown code fences or a sentence of prose. These helpers recover the
//! object and deserialize it into a typed result.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Matches a fenced block such as ```` ```json { ... } ``` ````.
static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("valid fenced block pattern")
});

/// Error raised when the converter cannot recover a JSON object.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ConverterError {
    pub message: String,
}

impl ConverterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Locate the first JSON object in `text`.
///
/// Tries, in order: the whole text, the first fenced block, and the span
/// between the first `{` and the last `}`.
pub fn extract_json_object(text: &str) -> Result<Value, ConverterError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ConverterError::new("empty response"));
    }

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    if let Some(block) = FENCED_BLOCK.captures(trimmed).and_then(|c| c.get(1)) {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(block.as_str()) {
            return Ok(value);
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return serde_json::from_str::<Value>(&trimmed[start..=end])
                .map_err(|e| ConverterError::new(format!("JSON parse error: {}", e)))
                .and_then(|value| match value {
                    Value::Object(_) => Ok(value),
                    other => Err(ConverterError::new(format!(
                        "expected a JSON object, found {}",
                        other
                    ))),
                });
        }
    }

    Err(ConverterError::new("no JSON object found in response"))
}

/// Extract the first JSON object in `text` and deserialize it into `T`.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T, ConverterError> {
    let value = extract_json_object(text)?;
    serde_json::from_value(value).map_err(|e| ConverterError::new(format!("schema mismatch: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        mood: String,
    }

    #[test]
    fn test_plain_object() {
        let value = extract_json_object(r#"{"mood": "Bored"}"#).unwrap();
        assert_eq!(value["mood"], "Bored");
    }

    #[test]
    fn test_fenced_object() {
        let text = "Here you go:\n```json\n{\"mood\": \"Positive\"}\n```\nAnything else?";
        let sample: Sample = parse_structured(text).unwrap();
        assert_eq!(sample.mood, "Positive");
    }

    #[test]
    fn test_object_embedded_in_prose() {
        let text = r#"My answer is {"mood": "Negative"} based on the comments."#;
        let sample: Sample = parse_structured(text).unwrap();
        assert_eq!(sample.mood, "Negative");
    }

    #[test]
    fn test_rejects_non_objects_and_empty_text() {
        assert!(extract_json_object("").is_err());
        assert!(extract_json_object("[1, 2, 3]").is_err());
        assert!(extract_json_object("no json here").is_err());
    }

    #[test]
    fn test_schema_mismatch_is_reported() {
        let err = parse_structured::<Sample>(r#"{"score": 3}"#).unwrap_err();
        assert!(err.message.contains("schema mismatch"));
    }
}
