//! # acesso_api
//!
//! HTTP API library for Acesso.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;

use std::sync::Arc;

use acesso_core::store::AcessoStore;
use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{authorize, health, validate};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend.
    pub store: Arc<dyn AcessoStore>,
    /// API configuration.
    pub config: ApiConfig,
}

/// Builds the Axum router with all routes and shared state.
///
/// Routes are nested under `config.url_path_prefix`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no user required)
    let public = Router::new()
        .route(routes::GET_API_HEALTH, get(health::health))
        .route(routes::GET_API_V1_VALIDATE, get(validate::validate_handler));

    // Routes acting on behalf of the remote user
    let protected = Router::new()
        .route(
            routes::GET_API_V1_AUTHORIZE,
            get(authorize::authorize_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_user,
        ));

    let api = Router::new().merge(public).merge(protected);
    let app = match state.config.nest_path() {
        Some(prefix) => Router::new().nest(&prefix, api),
        None => api,
    };

    app.layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
