//! The message contract and the status envelope.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::ValidationError;

/// A typed, schema-validated record exchanged with a remote endpoint.
///
/// The serde derive is the schema declaration:
/// - required fields are plain fields without a default,
/// - optional fields are `Option<T>`,
/// - defaulted fields use `#[serde(default)]` (or a container-level default),
/// - nested messages are struct fields and repeated fields are `Vec<T>`,
/// - enums are serde enums, so an unknown variant is rejected.
///
/// Constraints that cannot be expressed in the field types go in
/// [`Message::validate`], which runs after every successful decode.
///
/// # Example
///
/// ```
/// use protorpc_axum_core::{Message, ValidationError};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// #[serde(default)]
/// struct Page {
///     offset: u32,
///     limit: u32,
/// }
///
/// impl Message for Page {
///     fn validate(&self) -> Result<(), ValidationError> {
///         if self.limit > 100 {
///             return Err(ValidationError::field("limit", "must be at most 100"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Message: Serialize + DeserializeOwned + Send + 'static {
    /// Check constraints beyond field types.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// The uniform `{msg, status}` envelope.
///
/// Every failure at the endpoint boundary is reported with this shape, and
/// handlers may return it for plain acknowledgements. `status` is an
/// application-level status code, independent of the HTTP status line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusMessage {
    pub msg: String,
    pub status: u16,
}

impl Default for StatusMessage {
    fn default() -> Self {
        Self {
            msg: "ok".to_string(),
            status: 200,
        }
    }
}

impl StatusMessage {
    /// Create an envelope with a status and message.
    pub fn new<S: Into<String>>(status: u16, msg: S) -> Self {
        Self {
            msg: msg.into(),
            status,
        }
    }

    /// The default `{"msg": "ok", "status": 200}` acknowledgement.
    pub fn ok() -> Self {
        Self::default()
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl Message for StatusMessage {}
