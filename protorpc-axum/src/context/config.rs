//! Endpoint configuration - per-endpoint static settings.
//!
//! Set once when a handler is bound to a route, shared read-only by every
//! call to that endpoint.

use crate::error::RpcError;
use axum::http::{HeaderValue, StatusCode, header::InvalidHeaderValue};

/// Default request body limit (4 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 4 * 1024 * 1024;

/// How the HTTP status line relates to an error envelope's `status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusMode {
    /// The HTTP status line is always `200 OK`; callers read `status` from
    /// the body.
    #[default]
    Decoupled,
    /// Error envelopes with a 4xx or 5xx `status` field use it as the HTTP
    /// status line. Successful responses are still `200 OK`.
    Mirror,
}

/// Configuration for a remote endpoint.
///
/// # Example
///
/// ```rust
/// use protorpc_axum::{RemoteConfig, StatusMode};
///
/// let config = RemoteConfig::new()
///     .payload(true)
///     .status_mode(StatusMode::Mirror)
///     .max_body_size(Some(64 * 1024))
///     .try_allowed_origin("https://app.example.com")
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    allowed_origin: HeaderValue,
    payload: bool,
    status_mode: StatusMode,
    max_body_size: Option<usize>,
    require_json_accept: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            allowed_origin: HeaderValue::from_static("*"),
            payload: false,
            status_mode: StatusMode::default(),
            max_body_size: Some(DEFAULT_MAX_BODY_SIZE),
            require_json_accept: false,
        }
    }
}

impl RemoteConfig {
    /// Creates the default configuration: any origin, no payload mode,
    /// decoupled status, 4 MB body limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `Access-Control-Allow-Origin` value.
    pub fn allowed_origin(mut self, origin: HeaderValue) -> Self {
        self.allowed_origin = origin;
        self
    }

    /// Set the `Access-Control-Allow-Origin` value from a string.
    pub fn try_allowed_origin(self, origin: &str) -> Result<Self, InvalidHeaderValue> {
        Ok(self.allowed_origin(HeaderValue::from_str(origin)?))
    }

    /// Read POST requests from a single JSON-encoded `payload` form field.
    pub fn payload(mut self, enabled: bool) -> Self {
        self.payload = enabled;
        self
    }

    /// Choose whether error envelopes drive the HTTP status line.
    pub fn status_mode(mut self, mode: StatusMode) -> Self {
        self.status_mode = mode;
        self
    }

    /// Cap the buffered request body, in bytes. `None` reads bodies of any
    /// size, which lets one request exhaust server memory.
    pub fn max_body_size(mut self, limit: Option<usize>) -> Self {
        self.max_body_size = limit;
        self
    }

    /// Reject requests whose `Accept` header excludes JSON.
    ///
    /// Disabled by default. A request without an `Accept` header always
    /// passes.
    pub fn require_json_accept(mut self, require: bool) -> Self {
        self.require_json_accept = require;
        self
    }

    pub fn cors_origin(&self) -> &HeaderValue {
        &self.allowed_origin
    }

    pub fn payload_enabled(&self) -> bool {
        self.payload
    }

    pub fn status_line_mode(&self) -> StatusMode {
        self.status_mode
    }

    pub fn body_limit(&self) -> Option<usize> {
        self.max_body_size
    }

    pub fn json_accept_required(&self) -> bool {
        self.require_json_accept
    }

    /// Reject a declared body length over the limit.
    pub(crate) fn check_body_size(&self, length: usize) -> Result<(), RpcError> {
        match self.max_body_size {
            Some(max) if length > max => Err(RpcError::request_data(format!(
                "request body of {length} bytes exceeds maximum allowed size of {max} bytes"
            ))),
            _ => Ok(()),
        }
    }

    /// Number of body bytes to read before giving up.
    pub(crate) fn read_limit(&self) -> usize {
        self.max_body_size.unwrap_or(usize::MAX)
    }

    /// HTTP status line for an error envelope with the given `status`.
    ///
    /// Mirror mode only uses client and server error codes; anything else
    /// could suppress the envelope body, so it falls back to `200 OK`.
    pub(crate) fn error_status_line(&self, status: u16) -> StatusCode {
        match self.status_mode {
            StatusMode::Decoupled => StatusCode::OK,
            StatusMode::Mirror => match StatusCode::from_u16(status) {
                Ok(code) if code.is_client_error() || code.is_server_error() => code,
                _ => StatusCode::OK,
            },
        }
    }
}
