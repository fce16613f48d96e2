//! Response types and the response envelope.
use crate::context::RemoteConfig;
use crate::error::RpcError;
use axum::{
    body::Body,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
        },
    },
    response::{IntoResponse, Response},
};
use protorpc_axum_core::{Message, codec};
use serde_json::{Map, Value};
use std::marker::PhantomData;

/// Methods advertised on every response.
pub const ALLOW_METHODS: &str = "OPTIONS, HEAD, GET, POST, PUT";

/// Request headers advertised on every response.
pub const ALLOW_HEADERS: &str = "Accept, Content-Type, Origin, X-Requested-With";

const APPLICATION_JSON: &str = "application/json";
const TEXT_PLAIN: &str = "text/plain";

/// Sent when even the status envelope cannot be encoded.
const INTERNAL_ERROR_BODY: &str =
    r#"{"msg":"Exception in remote call: failed to encode response","status":500}"#;

/// Response wrapper for remote handlers.
#[derive(Debug, Clone)]
pub struct RemoteResponse<T>(pub T);

impl<T> RemoteResponse<T> {
    /// Create a new RemoteResponse wrapping the given message.
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    /// Extract the inner message.
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Response fields as a plain JSON mapping, converted into `T` before
/// encoding.
///
/// Fields that do not form a valid `T` fail the call with a response data
/// error rather than reaching the client.
///
/// ```rust
/// use protorpc_axum::RemoteFields;
/// use protorpc_axum::StatusMessage;
/// use serde_json::json;
///
/// let fields: RemoteFields<StatusMessage> = RemoteFields::new(json!({"msg": "saved"}));
/// ```
#[derive(Debug, Clone)]
pub struct RemoteFields<T> {
    fields: Value,
    _message: PhantomData<fn() -> T>,
}

impl<T> RemoteFields<T> {
    pub fn new(fields: impl Into<Value>) -> Self {
        Self {
            fields: fields.into(),
            _message: PhantomData,
        }
    }

    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self::new(Value::Object(fields))
    }
}

/// Values a remote handler may return on success.
pub trait Reply: Send + 'static {
    /// The response message type.
    type Message: Message;

    /// Produce the response message.
    fn into_message(self) -> Result<Self::Message, RpcError>;
}

impl<M: Message> Reply for RemoteResponse<M> {
    type Message = M;

    fn into_message(self) -> Result<M, RpcError> {
        Ok(self.0)
    }
}

impl<M: Message> Reply for RemoteFields<M> {
    type Message = M;

    fn into_message(self) -> Result<M, RpcError> {
        codec::decode_value::<M>(self.fields).map_err(|e| {
            RpcError::response_data(format!(
                "Remote method did not return a valid response message: {e}"
            ))
        })
    }
}

/// Set the fixed CORS headers.
pub fn set_cors_headers(headers: &mut HeaderMap, origin: &HeaderValue) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}

/// Build a response with the given body, content type and status, carrying
/// the CORS headers of `config`.
pub fn build_response(
    body: impl Into<Body>,
    content_type: &'static str,
    status: StatusCode,
    config: &RemoteConfig,
) -> Response {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    set_cors_headers(headers, config.cors_origin());
    response
}

/// Answer a CORS preflight: empty `text/plain` body with the CORS headers.
pub fn preflight_response(config: &RemoteConfig) -> Response {
    build_response(Body::empty(), TEXT_PLAIN, StatusCode::OK, config)
}

/// Encode a successful response message.
pub(crate) fn build_message_response<M: Message>(message: &M, config: &RemoteConfig) -> Response {
    match codec::encode(message) {
        Ok(body) => build_response(body, APPLICATION_JSON, StatusCode::OK, config),
        Err(e) => {
            tracing::error!(target: "protorpc_axum", error = %e, "failed to encode response message");
            build_error_response(
                RpcError::response_data(format!("failed to encode response message: {e}")),
                config,
            )
        }
    }
}

/// Encode a failure as a status envelope.
pub(crate) fn build_error_response(err: RpcError, config: &RemoteConfig) -> Response {
    let status = err.into_status_message();
    let status_line = config.error_status_line(status.status);
    match codec::encode(&status) {
        Ok(body) => build_response(body, APPLICATION_JSON, status_line, config),
        Err(e) => {
            tracing::error!(target: "protorpc_axum", error = %e, "failed to encode status envelope");
            build_response(INTERNAL_ERROR_BODY, APPLICATION_JSON, status_line, config)
        }
    }
}

impl<M: Message> IntoResponse for RemoteResponse<M> {
    /// Render with the default endpoint configuration.
    fn into_response(self) -> Response {
        build_message_response(&self.0, &RemoteConfig::default())
    }
}
