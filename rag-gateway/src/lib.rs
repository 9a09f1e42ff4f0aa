pub mod config;
pub mod dtos;
pub mod handlers;
pub mod services;
pub mod startup;

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use gateway_core::middleware::{
    metrics_middleware, rate_limit::ip_rate_limit_middleware, request_id_middleware, RouteLimiter,
};
use std::sync::Arc;
use time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::GatewayConfig;
use crate::services::RagClient;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub rag_client: Arc<RagClient>,
}

pub fn build_router(state: AppState) -> Router {
    // Cookie-bound server-side sessions, lazily created, 24h inactivity
    // expiry. Secure flag off for the local/dev posture.
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            state.config.session.max_age_hours,
        )));

    let rl = &state.config.rate_limit;

    // Each route class carries its own IP-keyed limiter.
    let upload_route = Router::new()
        .route("/upload", post(handlers::upload::upload))
        .layer(DefaultBodyLimit::max(state.config.upload.max_bytes))
        .layer(from_fn_with_state(
            RouteLimiter::new("upload", rl.upload_attempts, rl.upload_window_seconds),
            ip_rate_limit_middleware,
        ));

    let ask_route = Router::new()
        .route("/ask", post(handlers::query::ask))
        .layer(from_fn_with_state(
            RouteLimiter::new("ask", rl.ask_attempts, rl.ask_window_seconds),
            ip_rate_limit_middleware,
        ));

    let summarize_route = Router::new()
        .route("/summarize", post(handlers::query::summarize))
        .layer(from_fn_with_state(
            RouteLimiter::new(
                "summarize",
                rl.summarize_attempts,
                rl.summarize_window_seconds,
            ),
            ip_rate_limit_middleware,
        ));

    let compare_route = Router::new()
        .route("/compare", post(handlers::query::compare))
        .layer(from_fn_with_state(
            RouteLimiter::new("compare", rl.compare_attempts, rl.compare_window_seconds),
            ip_rate_limit_middleware,
        ));

    // Backstop for anything not individually limited.
    let global_limiter = RouteLimiter::new(
        "gateway",
        rl.global_ip_limit,
        rl.global_ip_window_seconds,
    );

    Router::new()
        .route("/healthz", get(handlers::health::healthz))
        .route("/readyz", get(handlers::health::readyz))
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route("/clear-history", post(handlers::session::clear_history))
        .merge(upload_route)
        .merge(ask_route)
        .merge(summarize_route)
        .merge(compare_route)
        .nest_service("/static", ServeDir::new(state.config.static_dir.clone()))
        .with_state(state)
        .layer(session_layer)
        .layer(from_fn_with_state(
            global_limiter,
            ip_rate_limit_middleware,
        ))
        .layer(from_fn(metrics_middleware))
        // The request-id middleware is outermost; the HTTP trace span opens
        // inside its id-carrying span.
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(request_id_middleware))
}
