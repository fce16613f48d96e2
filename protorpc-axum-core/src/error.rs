//! Codec error types.
//!
//! This module provides the errors produced while converting between
//! messages and their JSON representation:
//! - [`ValidationError`]: a decoded value violates the message schema
//! - [`CodecError`]: every failure the codec can report

/// A decoded value does not satisfy the message schema.
///
/// Carries the path of the offending field (`x`, `inner.y`, `items[2]`) when
/// the failure can be attributed to one, and a human readable description.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{}", render(.field, .message))]
pub struct ValidationError {
    field: Option<String>,
    message: String,
}

impl ValidationError {
    /// Create a validation error that is not tied to a specific field.
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    /// Create a validation error for the field at `path`.
    pub fn field<P: Into<String>, S: Into<String>>(path: P, message: S) -> Self {
        Self {
            field: Some(path.into()),
            message: message.into(),
        }
    }

    /// Path of the offending field, if known.
    pub fn field_path(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Description of the violation, without the field path.
    pub fn message(&self) -> &str {
        &self.message
    }
}

fn render(field: &Option<String>, message: &str) -> String {
    match field {
        Some(field) => format!("{field}: {message}"),
        None => message.to_owned(),
    }
}

/// Errors reported by the message codec.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The decode source is neither JSON text nor a key/value mapping.
    #[error("value must be a json string or object, got {0}")]
    JsonValue(&'static str),

    /// The JSON text could not be parsed.
    #[error("malformed json: {0}")]
    Syntax(#[source] serde_json::Error),

    /// The decoded fields violate the message schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

impl CodecError {
    /// Whether this is a schema violation (as opposed to unusable input).
    pub fn is_validation(&self) -> bool {
        matches!(self, CodecError::Validation(_))
    }
}
