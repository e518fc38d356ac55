//! JSON payload validation

use serde_json::Value;

/// Why rendered text was rejected as a payload
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("payload is empty")]
    Empty,

    #[error("Illegal JSON content: should start and end with {{}} or []")]
    Envelope,

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("parsed JSON is null")]
    Null,
}

/// A payload that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPayload {
    /// Trimmed text, sent verbatim
    pub text: String,
    /// Parsed value
    pub value: Value,
}

/// Validate rendered text as a JSON object or array.
///
/// Surrounding whitespace is trimmed; the first and last characters must be a
/// matching `{}` or `[]` pair before the text is parsed.
pub fn validate(text: &str) -> Result<ValidPayload, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::Empty);
    }

    if !has_envelope(text) {
        return Err(ValidationError::Envelope);
    }

    let value: Value = serde_json::from_str(text)?;
    if value.is_null() {
        return Err(ValidationError::Null);
    }

    Ok(ValidPayload {
        text: text.to_string(),
        value,
    })
}

fn has_envelope(text: &str) -> bool {
    (text.starts_with('{') && text.ends_with('}')) || (text.starts_with('[') && text.ends_with(']'))
}
