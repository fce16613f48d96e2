//! Core message types for protorpc-axum.
//!
//! This crate provides the pieces shared by servers and clients that speak
//! the typed JSON RPC shape, independent of any HTTP framework.
//!
//! ## Modules
//!
//! - `message`: The [`Message`] contract and the [`StatusMessage`] envelope
//! - [`codec`]: JSON encoding and schema-validated decoding
//! - `error`: Codec and validation errors

pub mod codec;
mod error;
mod lenient;
mod message;

pub use codec::{Source, decode, decode_str, decode_value, encode, to_value};
pub use error::*;
pub use message::*;
