//! Example 2: Payload mode
//!
//! Browsers posting plain HTML forms can send a whole message as a JSON
//! document in a single `payload` form field. The request type wraps the
//! real message in a `payload` field.
//!
//! Run with: cargo run --bin remote-payload

use axum::Router;
use protorpc_axum::prelude::*;
use protorpc_axum_examples::{Profile, ProfilePayload};

async fn save_profile(
    RemoteRequest(req): RemoteRequest<ProfilePayload>,
) -> Result<RemoteResponse<StatusMessage>, RpcError> {
    let profile: Profile = req.payload;
    Ok(RemoteResponse::new(StatusMessage::new(
        200,
        format!("saved {} ({} tags)", profile.username, profile.tags.len()),
    )))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = RemoteConfig::new()
        .payload(true)
        .try_allowed_origin("http://localhost:8080")?;

    let app = Router::new().route("/profile", remote_with(config, save_profile));

    let addr = protorpc_axum_examples::server_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    println!("=== Example 2: Payload mode ===");
    println!("Server listening on http://{}", addr);
    println!();
    println!("Test with:");
    println!("  curl -X POST http://localhost:3000/profile \\");
    println!("    --data-urlencode 'payload={{\"username\": \"alice\", \"tags\": [\"admin\"]}}'");

    axum::serve(listener, app).await?;
    Ok(())
}
