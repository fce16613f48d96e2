//! The error taxonomy of a remote call.
//!
//! Every failure between receiving a request and producing a response is
//! an [`RpcError`]. None of them reach the HTTP server as a fault: each one
//! is folded into a [`StatusMessage`] by [`RpcError::into_status_message`],
//! which is the single place that decides the `status` and `msg` a client
//! sees.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use protorpc_axum_core::StatusMessage;
use std::fmt;

/// A failure anywhere in the remote call pipeline.
#[derive(Clone, Debug)]
pub enum RpcError {
    /// Malformed, missing or unparseable request content.
    RequestData(String),
    /// Decoded request fields violate the message schema.
    Validation(String),
    /// The request's content type is not one the endpoint can read.
    ContentType(String),
    /// The request does not accept a JSON response.
    MimeType(String),
    /// The handler produced something that is not a valid response message.
    ResponseData(String),
    /// A fault that carries its own HTTP status and description.
    Http {
        code: StatusCode,
        description: String,
    },
    /// Any other handler failure.
    Unhandled(String),
}

impl RpcError {
    /// Create a request data error.
    pub fn request_data<S: Into<String>>(message: S) -> Self {
        RpcError::RequestData(message.into())
    }

    /// Create a response data error.
    pub fn response_data<S: Into<String>>(message: S) -> Self {
        RpcError::ResponseData(message.into())
    }

    /// Create an HTTP-semantic fault.
    pub fn http<S: Into<String>>(code: StatusCode, description: S) -> Self {
        RpcError::Http {
            code,
            description: description.into(),
        }
    }

    /// Create a not found fault.
    pub fn not_found<S: Into<String>>(description: S) -> Self {
        Self::http(StatusCode::NOT_FOUND, description)
    }

    /// Create a forbidden fault.
    pub fn forbidden<S: Into<String>>(description: S) -> Self {
        Self::http(StatusCode::FORBIDDEN, description)
    }

    /// Create a conflict fault.
    pub fn conflict<S: Into<String>>(description: S) -> Self {
        Self::http(StatusCode::CONFLICT, description)
    }

    /// Create an unhandled failure from anything displayable.
    pub fn unhandled<E: fmt::Display>(err: E) -> Self {
        RpcError::Unhandled(err.to_string())
    }

    /// Whether the failure happened before the handler was invoked.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            RpcError::RequestData(_)
                | RpcError::Validation(_)
                | RpcError::ContentType(_)
                | RpcError::MimeType(_)
        )
    }

    /// The application-level status reported in the envelope.
    pub fn status(&self) -> StatusCode {
        match self {
            RpcError::RequestData(_)
            | RpcError::Validation(_)
            | RpcError::ContentType(_)
            | RpcError::MimeType(_) => StatusCode::BAD_REQUEST,
            RpcError::Http { code, .. } => *code,
            RpcError::ResponseData(_) | RpcError::Unhandled(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Translate into the status envelope returned to the client.
    pub fn into_status_message(self) -> StatusMessage {
        let status = self.status().as_u16();
        let msg = match self {
            RpcError::Http { description, .. } => {
                format!("Error with remote call: {description}")
            }
            err if err.is_request_error() => format!("Error with rpc request: {err}"),
            err => format!("Exception in remote call: {err}"),
        };
        StatusMessage::new(status, msg)
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::RequestData(msg)
            | RpcError::Validation(msg)
            | RpcError::ContentType(msg)
            | RpcError::MimeType(msg)
            | RpcError::ResponseData(msg)
            | RpcError::Unhandled(msg) => f.write_str(msg),
            RpcError::Http { code, description } => write!(f, "{code}: {description}"),
        }
    }
}

impl std::error::Error for RpcError {}

// ---- Conversions ----

impl From<std::convert::Infallible> for RpcError {
    fn from(infallible: std::convert::Infallible) -> Self {
        match infallible {}
    }
}

impl From<StatusCode> for RpcError {
    /// Lift a bare HTTP status into a fault, using its canonical reason as
    /// the description.
    fn from(code: StatusCode) -> Self {
        RpcError::http(code, code.canonical_reason().unwrap_or("unknown status"))
    }
}

impl From<(StatusCode, String)> for RpcError {
    fn from((code, description): (StatusCode, String)) -> Self {
        RpcError::http(code, description)
    }
}

impl From<(StatusCode, &str)> for RpcError {
    fn from((code, description): (StatusCode, &str)) -> Self {
        RpcError::http(code, description)
    }
}

impl From<anyhow::Error> for RpcError {
    /// Application errors become unhandled failures. The full context chain
    /// is kept in the message.
    fn from(err: anyhow::Error) -> Self {
        RpcError::Unhandled(format!("{err:#}"))
    }
}

impl IntoResponse for RpcError {
    /// Render with the default endpoint configuration.
    ///
    /// Handler wrappers render through the endpoint's own configuration
    /// instead.
    fn into_response(self) -> Response {
        crate::message::build_error_response(self, &crate::context::RemoteConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            RpcError::request_data("x").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RpcError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RpcError::ContentType("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RpcError::MimeType("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RpcError::response_data("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            RpcError::unhandled("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(RpcError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(RpcError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(RpcError::conflict("x").status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_request_error_envelope() {
        let status = RpcError::request_data("No data sent in the request body.")
            .into_status_message();
        assert_eq!(status.status, 400);
        assert_eq!(
            status.msg,
            "Error with rpc request: No data sent in the request body."
        );
    }

    #[test]
    fn test_http_fault_envelope() {
        let status = RpcError::not_found("no such user").into_status_message();
        assert_eq!(status.status, 404);
        assert_eq!(status.msg, "Error with remote call: no such user");
    }

    #[test]
    fn test_unhandled_envelope() {
        let status = RpcError::unhandled("division by zero").into_status_message();
        assert_eq!(status.status, 500);
        assert_eq!(status.msg, "Exception in remote call: division by zero");
    }

    #[test]
    fn test_response_data_envelope() {
        let status = RpcError::response_data("bad reply").into_status_message();
        assert_eq!(status.status, 500);
        assert_eq!(status.msg, "Exception in remote call: bad reply");
    }

    #[test]
    fn test_from_status_code() {
        let err = RpcError::from(StatusCode::UNAUTHORIZED);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            err.into_status_message().msg,
            "Error with remote call: Unauthorized"
        );
    }

    #[test]
    fn test_from_status_code_and_string() {
        let err = RpcError::from((StatusCode::GONE, "expired".to_string()));
        assert_eq!(err.status(), StatusCode::GONE);
        assert_eq!(err.to_string(), "410 Gone: expired");
    }

    #[test]
    fn test_from_anyhow_keeps_context_chain() {
        let err: RpcError = anyhow::anyhow!("disk full")
            .context("saving profile")
            .into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "saving profile: disk full");
    }
}
