//! # lumen_api
//!
//! HTTP relay for Lumen.
//!
//! `POST /api/chat` forwards a conversation to the inference provider with
//! the operator's system directive in front and returns the provider's raw
//! response. Every path outside `/api/` is served by the static asset
//! server.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{any, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{chat, fallback};
use crate::services::inference::InferenceProvider;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration, including the system directive.
    pub config: ApiConfig,
    /// Inference provider the chat endpoint forwards to.
    pub provider: Arc<dyn InferenceProvider>,
}

impl AppState {
    pub fn new(config: ApiConfig, provider: Arc<dyn InferenceProvider>) -> Self {
        Self { config, provider }
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let assets = ServeDir::new(&state.config.assets_dir);

    Router::new()
        .route(
            routes::API_CHAT,
            post(chat::chat_handler).fallback(fallback::method_not_allowed),
        )
        .route(routes::API_ROOT, any(fallback::not_found))
        .route(routes::API_ANY, any(fallback::not_found))
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
