//! Binding typed handlers to axum routes.
//!
//! A remote handler is an async function taking any number of axum
//! `FromRequestParts` extractors followed by a [`RemoteRequest`], and
//! returning `Result<R, RpcError>` where `R` is a [`Reply`]:
//!
//! ```rust,no_run
//! use axum::Router;
//! use protorpc_axum::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Echo {
//!     text: String,
//! }
//!
//! impl Message for Echo {}
//!
//! async fn echo(RemoteRequest(req): RemoteRequest<Echo>) -> Result<RemoteResponse<Echo>, RpcError> {
//!     Ok(RemoteResponse(req))
//! }
//!
//! let app: Router = Router::new().route("/echo", remote(echo));
//! ```
use axum::{
    extract::{FromRequestParts, Request},
    handler::Handler,
    http::Method,
    response::{IntoResponse, Response},
    routing::{MethodFilter, MethodRouter},
};
use protorpc_axum_core::Message;
use std::{future::Future, pin::Pin, sync::Arc};

use crate::context::RemoteConfig;
use crate::error::RpcError;
use crate::message::{RemoteRequest, Reply, preflight_response};
use crate::pipeline::{RequestPipeline, ResponsePipeline, invoke, rejection_into_error};

/// Adapts a typed handler function to axum's `Handler` trait.
///
/// Every call answers `OPTIONS` with a preflight response, runs the
/// extractors, decodes the request message, invokes the handler and encodes
/// the outcome. Failures at any step become a status envelope.
#[derive(Clone)]
pub struct RemoteHandler<F> {
    handler: F,
    config: Arc<RemoteConfig>,
}

impl<F> RemoteHandler<F> {
    /// Wrap a handler with the default configuration.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            config: Arc::new(RemoteConfig::default()),
        }
    }

    /// Replace the endpoint configuration.
    pub fn with_config(mut self, config: RemoteConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }
}

// Extractor lists, from none up to sixteen
macro_rules! all_tuples {
    ($m:ident) => {
        $m!([]);
        $m!([A1]);
        $m!([A1, A2]);
        $m!([A1, A2, A3]);
        $m!([A1, A2, A3, A4]);
        $m!([A1, A2, A3, A4, A5]);
        $m!([A1, A2, A3, A4, A5, A6]);
        $m!([A1, A2, A3, A4, A5, A6, A7]);
        $m!([A1, A2, A3, A4, A5, A6, A7, A8]);
        $m!([A1, A2, A3, A4, A5, A6, A7, A8, A9]);
        $m!([A1, A2, A3, A4, A5, A6, A7, A8, A9, A10]);
        $m!([A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11]);
        $m!([A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12]);
        $m!([A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12, A13]);
        $m!([A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12, A13, A14]);
        $m!([
            A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12, A13, A14, A15
        ]);
        $m!([
            A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12, A13, A14, A15, A16
        ]);
    };
}

macro_rules! impl_handler_for_remote_handler {
    ([$($A:ident),*]) => {
        impl<F, Fut, S, Req, R, $($A,)*> Handler<($($A,)* RemoteRequest<Req>,), S>
            for RemoteHandler<F>
        where
            F: Fn($($A,)* RemoteRequest<Req>) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Result<R, RpcError>> + Send + 'static,
            S: Clone + Send + Sync + 'static,
            $( $A: FromRequestParts<S> + Send + 'static, )*
            Req: Message,
            R: Reply,
        {
            type Future = Pin<Box<dyn Future<Output = Response> + Send>>;

            #[allow(unused_mut, unused_variables)]
            fn call(self, req: Request, state: S) -> Self::Future {
                Box::pin(async move {
                    let RemoteHandler { handler, config } = self;

                    if req.method() == Method::OPTIONS {
                        tracing::debug!(target: "protorpc_axum", uri = %req.uri(), "answering preflight");
                        return preflight_response(&config);
                    }

                    let (mut parts, body) = req.into_parts();

                    $(
                        // Rejections need not be Send, so render them before awaiting again
                        let $A = match $A::from_request_parts(&mut parts, &state)
                            .await
                            .map_err(IntoResponse::into_response)
                        {
                            Ok(value) => value,
                            Err(rejection) => {
                                let err = rejection_into_error(rejection).await;
                                return ResponsePipeline::error(err, &config);
                            }
                        };
                    )*

                    let req = Request::from_parts(parts, body);
                    let result = match RequestPipeline::decode::<Req>(req, &config).await {
                        // A handler that panics before returning its future is caught too
                        Ok(message) => {
                            invoke(async move { handler($($A,)* RemoteRequest(message)).await }).await
                        }
                        Err(err) => Err(err),
                    };
                    ResponsePipeline::encode(result, &config)
                })
            }
        }
    };
}

#[allow(non_snake_case)]
mod generated_handler_impls {
    use super::*;
    all_tuples!(impl_handler_for_remote_handler);
}

/// Methods a remote endpoint is routed for.
pub fn remote_methods() -> MethodFilter {
    MethodFilter::OPTIONS
        .or(MethodFilter::HEAD)
        .or(MethodFilter::GET)
        .or(MethodFilter::POST)
        .or(MethodFilter::PUT)
}

/// Route a remote handler with the default configuration.
pub fn remote<F, T, S>(handler: F) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
    RemoteHandler<F>: Handler<T, S>,
    T: 'static,
{
    remote_with(RemoteConfig::default(), handler)
}

/// Route a remote handler with an endpoint configuration.
pub fn remote_with<F, T, S>(config: RemoteConfig, handler: F) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
    RemoteHandler<F>: Handler<T, S>,
    T: 'static,
{
    axum::routing::on(
        remote_methods(),
        RemoteHandler::new(handler).with_config(config),
    )
}
