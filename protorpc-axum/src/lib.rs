//! # protorpc-axum
//!
//! Typed remote procedures over plain HTTP with [Axum](https://github.com/tokio-rs/axum).
//!
//! A remote handler takes a typed request message and returns a typed
//! response message. This crate does everything in between:
//!
//! - **Request extraction:** the request message is read from the
//!   querystring (`GET`), from form fields, from a JSON-encoded `payload`
//!   form field, or from a JSON body, depending on method, content type and
//!   endpoint configuration.
//! - **Validation:** string scalars from querystrings and forms are coerced
//!   to the field types, and every schema violation is reported with the
//!   offending field.
//! - **Uniform errors:** every failure, including a panicking handler,
//!   becomes a `{"msg": ..., "status": ...}` envelope. The HTTP status line
//!   stays `200 OK` unless [`StatusMode::Mirror`] is configured.
//! - **CORS:** every response, including `OPTIONS` preflights, carries the
//!   same allow-origin, allow-methods and allow-headers values.
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! use axum::Router;
//! use protorpc_axum::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct AddRequest {
//!     a: i64,
//!     b: i64,
//! }
//!
//! impl Message for AddRequest {}
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct AddResponse {
//!     sum: i64,
//! }
//!
//! impl Message for AddResponse {}
//!
//! async fn add(
//!     RemoteRequest(req): RemoteRequest<AddRequest>,
//! ) -> Result<RemoteResponse<AddResponse>, RpcError> {
//!     Ok(RemoteResponse(AddResponse { sum: req.a + req.b }))
//! }
//!
//! # async fn run() {
//! let app: Router = Router::new().route("/add", remote(add));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await.unwrap();
//! axum::serve(listener, app).await.unwrap();
//! # }
//! ```

pub mod context;
pub mod error;
pub mod handler;
pub mod lazy;
pub mod message;
pub mod pipeline;

pub use context::{CallContext, ContentKind, DEFAULT_MAX_BODY_SIZE, RemoteConfig, StatusMode};
pub use error::RpcError;
pub use handler::{RemoteHandler, remote, remote_with};
pub use lazy::Cached;
pub use message::{RemoteFields, RemoteRequest, RemoteResponse, Reply};

// Re-export the message contract and codec
pub use protorpc_axum_core::{
    CodecError, Message, Source, StatusMessage, ValidationError, codec,
};

// Re-export several crates
pub use serde;
pub use serde_json;

pub mod prelude {
    //! A prelude for `protorpc-axum` providing the most common types.
    pub use crate::context::{RemoteConfig, StatusMode};
    pub use crate::error::RpcError;
    pub use crate::handler::{remote, remote_with};
    pub use crate::lazy::Cached;
    pub use crate::message::{RemoteFields, RemoteRequest, RemoteResponse};
    pub use protorpc_axum_core::{Message, StatusMessage, ValidationError};
}
