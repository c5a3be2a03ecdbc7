//! HTTP surface: health probe and the compile endpoint.

mod compile;
pub mod error;
mod middleware;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::application::compile::CompileService;

pub use middleware::REQUEST_ID_HEADER;

#[derive(Clone)]
pub struct HttpState {
    pub compile: Arc<CompileService>,
}

impl HttpState {
    pub fn new(compile: Arc<CompileService>) -> Self {
        Self { compile }
    }
}

pub fn build_router(state: HttpState, max_request_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(compile::health))
        .route("/compile", post(compile::compile))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
