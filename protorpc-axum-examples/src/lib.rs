//! Shared message types for the example servers.

use protorpc_axum::{Message, ValidationError};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HelloRequest {
    #[serde(default)]
    pub name: Option<String>,
}

impl Message for HelloRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloResponse {
    pub message: String,
}

impl Message for HelloResponse {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddRequest {
    pub a: i64,
    pub b: i64,
}

impl Message for AddRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddResponse {
    pub sum: i64,
}

impl Message for AddResponse {}

/// How a profile is listed in search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Message for Profile {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::field("username", "must not be empty"));
        }
        Ok(())
    }
}

/// Request body of a payload-mode endpoint: the message travels as JSON in
/// the `payload` form field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilePayload {
    pub payload: Profile,
}

impl Message for ProfilePayload {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupRequest {
    pub username: String,
}

impl Message for LookupRequest {}

/// Returns the server address from PORT env var, defaulting to 3000.
///
/// # Example
///
/// ```ignore
/// let addr = protorpc_axum_examples::server_addr();
/// let listener = tokio::net::TcpListener::bind(addr).await?;
/// ```
pub fn server_addr() -> SocketAddr {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    format!("0.0.0.0:{port}")
        .parse()
        .expect("invalid PORT env var")
}
