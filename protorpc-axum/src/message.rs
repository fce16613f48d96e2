//! Message wrappers for remote request and response handling.

mod request;
mod response;

pub use request::{RemoteRequest, decode_request, extract_source, negotiate};
pub use response::{
    ALLOW_HEADERS, ALLOW_METHODS, RemoteFields, RemoteResponse, Reply, build_response,
    preflight_response, set_cors_headers,
};
pub(crate) use response::{build_error_response, build_message_response};
