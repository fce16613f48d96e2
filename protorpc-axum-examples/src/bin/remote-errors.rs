//! Example 3: Error envelopes
//!
//! Every failure is answered with a `{"msg": ..., "status": ...}` envelope:
//! - `/lookup` returns an HTTP-semantic fault for unknown users
//! - `/divide` panics on a zero divisor, reported as status 500
//! - `/profile/strict` mirrors the envelope status onto the status line
//! - `/describe` builds its reply from plain JSON fields
//!
//! Run with: cargo run --bin remote-errors

use axum::Router;
use protorpc_axum::prelude::*;
use protorpc_axum_examples::{AddRequest, AddResponse, LookupRequest, Profile, Visibility};
use serde_json::json;

async fn lookup(
    RemoteRequest(req): RemoteRequest<LookupRequest>,
) -> Result<RemoteResponse<Profile>, RpcError> {
    match req.username.as_str() {
        "alice" => Ok(RemoteResponse::new(Profile {
            username: "alice".into(),
            age: Some(30),
            visibility: Visibility::Public,
            tags: vec!["admin".into()],
        })),
        "" => Err(RpcError::request_data("username is required")),
        other => Err(RpcError::not_found(format!("no such user: {other}"))),
    }
}

async fn divide(
    RemoteRequest(req): RemoteRequest<AddRequest>,
) -> Result<RemoteResponse<AddResponse>, RpcError> {
    // Panics on b == 0; the envelope reports it as an unhandled exception
    Ok(RemoteResponse::new(AddResponse { sum: req.a / req.b }))
}

async fn strict_profile(
    RemoteRequest(profile): RemoteRequest<Profile>,
) -> Result<RemoteResponse<StatusMessage>, RpcError> {
    if profile.visibility == Visibility::Private {
        return Err(RpcError::forbidden("private profiles are read only"));
    }
    Ok(RemoteResponse::new(StatusMessage::ok()))
}

async fn describe(
    RemoteRequest(req): RemoteRequest<LookupRequest>,
) -> Result<RemoteFields<Profile>, RpcError> {
    Ok(RemoteFields::new(json!({
        "username": req.username,
        "visibility": "PRIVATE",
    })))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mirror = RemoteConfig::new().status_mode(StatusMode::Mirror);

    let app = Router::new()
        .route("/lookup", remote(lookup))
        .route("/divide", remote(divide))
        .route("/profile/strict", remote_with(mirror, strict_profile))
        .route("/describe", remote(describe));

    let addr = protorpc_axum_examples::server_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    println!("=== Example 3: Error envelopes ===");
    println!("Server listening on http://{}", addr);
    println!();
    println!("Test with:");
    println!("  curl 'http://localhost:3000/lookup?username=bob'");
    println!("  curl 'http://localhost:3000/divide?a=1&b=0'");
    println!("  curl -i 'http://localhost:3000/profile/strict?username=a&visibility=PRIVATE'");
    println!("  curl 'http://localhost:3000/describe?username=carol'");

    axum::serve(listener, app).await?;
    Ok(())
}
