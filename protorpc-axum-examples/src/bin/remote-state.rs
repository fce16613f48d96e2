//! Example 4: Extractors and shared state
//!
//! Handlers can take any axum `FromRequestParts` extractor before the
//! request message. A rejected extractor is answered with an error envelope
//! carrying the rejection's status. The greeting banner is derived from
//! configuration once, on first use, and shared by every call.
//!
//! Run with: cargo run --bin remote-state

use axum::{
    Router,
    extract::{FromRequestParts, State},
    http::{StatusCode, request::Parts},
};
use protorpc_axum::prelude::*;
use protorpc_axum_examples::{HelloRequest, HelloResponse};
use std::sync::Arc;

/// Caller identity taken from the `x-user-id` header.
pub struct UserId(pub String);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .map(|s| UserId(s.to_string()))
            .ok_or((StatusCode::UNAUTHORIZED, "missing x-user-id header"))
    }
}

#[derive(Clone)]
struct AppState {
    site_name: String,
    banner: Arc<Cached<String>>,
}

impl AppState {
    fn banner(&self) -> &str {
        self.banner.get_or_init(|| {
            tracing::info!("computing banner");
            format!("Welcome to {}", self.site_name)
        })
    }
}

async fn say_hello(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    RemoteRequest(req): RemoteRequest<HelloRequest>,
) -> Result<RemoteResponse<HelloResponse>, RpcError> {
    let name = req.name.unwrap_or_else(|| "World".to_string());
    Ok(RemoteResponse::new(HelloResponse {
        message: format!("{}. Hello, {}! (authenticated as {})", state.banner(), name, user_id),
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let state = AppState {
        site_name: "the example site".into(),
        banner: Arc::new(Cached::new()),
    };

    let app = Router::new()
        .route("/hello", remote(say_hello))
        .with_state(state);

    let addr = protorpc_axum_examples::server_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    println!("=== Example 4: Extractors and shared state ===");
    println!("Server listening on http://{}", addr);
    println!();
    println!("Test WITHOUT x-user-id header (status 401 envelope):");
    println!("  curl 'http://localhost:3000/hello?name=Alice'");
    println!();
    println!("Test WITH x-user-id header:");
    println!("  curl -H 'x-user-id: user123' 'http://localhost:3000/hello?name=Alice'");

    axum::serve(listener, app).await?;
    Ok(())
}
