//! Request and response pipelines for remote calls.
//!
//! A call runs three stages, each of which can fail into an [`RpcError`]:
//! - RequestPipeline: build the call context, pick the source, decode
//! - invoke: run the handler, turning panics into unhandled failures
//! - ResponsePipeline: encode the message or the status envelope
//!
//! Only the last stage produces an HTTP response, so every failure leaves
//! the endpoint as a status envelope.

use crate::context::{CallContext, RemoteConfig};
use crate::error::RpcError;
use crate::message::{
    Reply, build_error_response, build_message_response, decode_request, extract_source,
    negotiate,
};
use axum::{extract::Request, response::Response};
use futures::FutureExt;
use protorpc_axum_core::Message;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// Largest extractor rejection body kept as a fault description.
const REJECTION_BODY_LIMIT: usize = 16 * 1024;

// ============================================================================
// RequestPipeline
// ============================================================================

/// Request pipeline - decodes the request message of a call.
pub struct RequestPipeline;

impl RequestPipeline {
    /// Decode the request message from an HTTP request.
    ///
    /// Failures are logged here, with the method and URI of the call.
    pub async fn decode<T: Message>(req: Request, config: &RemoteConfig) -> Result<T, RpcError> {
        let method = req.method().clone();
        let uri = req.uri().clone();

        let result = match CallContext::from_request(req, config).await {
            Ok(ctx) => Self::decode_context(&ctx, config),
            Err(err) => Err(err),
        };

        if let Err(err) = &result {
            tracing::error!(
                target: "protorpc_axum",
                %method,
                %uri,
                error = %err,
                "error with rpc request"
            );
        }
        result
    }

    /// Decode from an already built call context.
    pub fn decode_context<T: Message>(
        ctx: &CallContext,
        config: &RemoteConfig,
    ) -> Result<T, RpcError> {
        negotiate(ctx, config)?;
        let source = extract_source(ctx)?;
        decode_request(ctx, source)
    }
}

/// Run a handler future and resolve its reply into the response message.
///
/// A panic inside the handler is caught and reported as an unhandled
/// failure.
pub async fn invoke<Fut, R>(future: Fut) -> Result<R::Message, RpcError>
where
    Fut: Future<Output = Result<R, RpcError>>,
    R: Reply,
{
    let result = match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(reply)) => reply.into_message(),
        Ok(Err(err)) => Err(err),
        Err(panic) => Err(RpcError::Unhandled(panic_message(&*panic))),
    };

    if let Err(err) = &result {
        tracing::error!(target: "protorpc_axum", error = ?err, "error in remote call");
    }
    result
}

/// Convert a rendered extractor rejection into an HTTP-semantic fault,
/// keeping its status and body text.
pub async fn rejection_into_error(response: Response) -> RpcError {
    let code = response.status();
    let description = match axum::body::to_bytes(response.into_body(), REJECTION_BODY_LIMIT).await
    {
        Ok(body) if !body.is_empty() => String::from_utf8_lossy(&body).into_owned(),
        _ => code
            .canonical_reason()
            .unwrap_or("request rejected")
            .to_string(),
    };
    let err = RpcError::http(code, description);
    tracing::error!(target: "protorpc_axum", error = %err, "extractor rejected rpc request");
    err
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("handler panicked: {msg}")
    } else {
        "handler panicked".to_string()
    }
}

// ============================================================================
// ResponsePipeline
// ============================================================================

/// Response pipeline - encodes the outcome of a call.
pub struct ResponsePipeline;

impl ResponsePipeline {
    /// Encode a call outcome: the message on success, the status envelope
    /// otherwise.
    pub fn encode<M: Message>(result: Result<M, RpcError>, config: &RemoteConfig) -> Response {
        match result {
            Ok(message) => build_message_response(&message, config),
            Err(err) => Self::error(err, config),
        }
    }

    /// Encode a failure as a status envelope.
    pub fn error(err: RpcError, config: &RemoteConfig) -> Response {
        build_error_response(err, config)
    }
}
