//! Example 1: Unary endpoints
//!
//! The same handler answers GET (querystring), JSON bodies and form posts:
//! - `GET /hello?name=Alice`
//! - `POST /hello` with `{"name": "Alice"}`
//! - `POST /add` with `a=1&b=2` (form fields are coerced to integers)
//!
//! Run with: cargo run --bin remote-unary

use axum::Router;
use protorpc_axum::prelude::*;
use protorpc_axum_examples::{AddRequest, AddResponse, HelloRequest, HelloResponse};

async fn say_hello(
    RemoteRequest(req): RemoteRequest<HelloRequest>,
) -> Result<RemoteResponse<HelloResponse>, RpcError> {
    let name = req.name.unwrap_or_else(|| "World".to_string());
    Ok(RemoteResponse::new(HelloResponse {
        message: format!("Hello, {}!", name),
    }))
}

async fn add(
    RemoteRequest(req): RemoteRequest<AddRequest>,
) -> Result<RemoteResponse<AddResponse>, RpcError> {
    let sum = req
        .a
        .checked_add(req.b)
        .ok_or_else(|| RpcError::http(axum::http::StatusCode::UNPROCESSABLE_ENTITY, "sum overflows"))?;
    Ok(RemoteResponse::new(AddResponse { sum }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let app = Router::new()
        .route("/hello", remote(say_hello))
        .route("/add", remote(add));

    let addr = protorpc_axum_examples::server_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    println!("=== Example 1: Unary endpoints ===");
    println!("Server listening on http://{}", addr);
    println!();
    println!("Test with:");
    println!("  curl 'http://localhost:3000/hello?name=Alice'");
    println!("  curl -X POST http://localhost:3000/hello \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!("    -d '{{\"name\": \"Alice\"}}'");
    println!("  curl -X POST http://localhost:3000/add -d 'a=1&b=2'");

    axum::serve(listener, app).await?;
    Ok(())
}
