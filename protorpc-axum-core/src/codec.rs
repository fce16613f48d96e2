//! JSON codec for [`Message`] types.
//!
//! Encoding produces deterministic JSON in declared field order. Decoding
//! accepts either JSON text or an already-parsed key/value mapping; both are
//! lifted into a single `serde_json::Value` so there is one decode path:
//!
//! ```text
//! Source::Text ──parse──┐
//!                       ├─> Value ─> typed fields ─> Message::validate ─> M
//! Source::Mapping ──────┘
//! ```
//!
//! String scalars are accepted for numeric and boolean fields, so mappings
//! built from querystrings or form posts decode into typed messages.

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::error::{CodecError, ValidationError};
use crate::lenient::Lenient;
use crate::message::Message;

/// Input to [`decode`].
#[derive(Clone, Debug, PartialEq)]
pub enum Source {
    /// JSON text.
    Text(Bytes),
    /// An already-parsed key/value mapping.
    Mapping(Map<String, Value>),
}

impl Source {
    /// An empty mapping, which decodes to the message's defaults.
    pub fn empty() -> Self {
        Source::Mapping(Map::new())
    }
}

impl From<String> for Source {
    fn from(text: String) -> Self {
        Source::Text(Bytes::from(text))
    }
}

impl From<&str> for Source {
    fn from(text: &str) -> Self {
        Source::Text(Bytes::copy_from_slice(text.as_bytes()))
    }
}

impl From<Bytes> for Source {
    fn from(text: Bytes) -> Self {
        Source::Text(text)
    }
}

impl From<Map<String, Value>> for Source {
    fn from(map: Map<String, Value>) -> Self {
        Source::Mapping(map)
    }
}

impl TryFrom<Value> for Source {
    type Error = CodecError;

    /// JSON strings are treated as text and objects as mappings; any other
    /// value is rejected.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(text) => Ok(Source::from(text)),
            Value::Object(map) => Ok(Source::Mapping(map)),
            Value::Null => Err(CodecError::JsonValue("null")),
            Value::Bool(_) => Err(CodecError::JsonValue("boolean")),
            Value::Number(_) => Err(CodecError::JsonValue("number")),
            Value::Array(_) => Err(CodecError::JsonValue("array")),
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Text(text) => f.write_str(&String::from_utf8_lossy(text)),
            Source::Mapping(map) => write!(f, "{}", Value::Object(map.clone())),
        }
    }
}

/// Encode a message as JSON text.
pub fn encode<M: Message>(message: &M) -> Result<String, CodecError> {
    serde_json::to_string(message).map_err(CodecError::Encode)
}

/// Encode a message as a JSON value (the mapping form of the message).
pub fn to_value<M: Message>(message: &M) -> Result<Value, CodecError> {
    serde_json::to_value(message).map_err(CodecError::Encode)
}

/// Decode a message from JSON text or a mapping.
///
/// An empty mapping decodes to the all-defaults instance for messages whose
/// fields all have defaults.
pub fn decode<M: Message>(source: Source) -> Result<M, CodecError> {
    let value = match source {
        Source::Text(text) => serde_json::from_slice::<Value>(&text).map_err(CodecError::Syntax)?,
        Source::Mapping(map) => Value::Object(map),
    };
    decode_fields(&value)
}

/// Decode a message from JSON text.
pub fn decode_str<M: Message>(text: &str) -> Result<M, CodecError> {
    decode(Source::from(text))
}

/// Decode a message from a JSON value, which must be a string or an object.
pub fn decode_value<M: Message>(value: Value) -> Result<M, CodecError> {
    decode(Source::try_from(value)?)
}

fn decode_fields<M: Message>(value: &Value) -> Result<M, CodecError> {
    let message: M = serde_path_to_error::deserialize(Lenient(value)).map_err(|err| {
        let path = err.path().to_string();
        let inner = err.into_inner().to_string();
        if path == "." {
            ValidationError::new(inner)
        } else {
            ValidationError::field(path, inner)
        }
    })?;
    message.validate()?;
    Ok(message)
}
