//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: shared services (token pair, environment)
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request schemas and request/response DTOs
//! - `errors.rs`: handler error type; formatting happens in the dispatcher

use std::sync::Arc;

use axum::{Extension, Router, extract::DefaultBodyLimit};
use tower::ServiceBuilder;

use edgeguard_core::AppResult;

use crate::config::AppConfig;
use crate::dispatcher::{DiagnosticSink, ErrorDispatcher, TracingSink};
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Largest request body accepted by any route.
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &AppConfig) -> AppResult<Router> {
    build_app_with_sink(config, Arc::new(TracingSink))
}

/// Same router, recording failures through `sink`.
pub fn build_app_with_sink(config: &AppConfig, sink: Arc<dyn DiagnosticSink>) -> AppResult<Router> {
    let services = Arc::new(services::build_services(config)?);
    let dispatcher = Arc::new(ErrorDispatcher::with_sink(config.environment, sink));
    let auth_state = middleware::AuthState {
        tokens: services.tokens.clone(),
    };

    // Protected routes: require a verified access token.
    let protected = routes::protected_router().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::require_access_token,
    ));

    Ok(Router::new()
        .merge(routes::public_router())
        .merge(protected)
        .fallback(routes::system::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    dispatcher,
                    middleware::dispatch_failures,
                ))
                .layer(Extension(services))
                .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES)),
        ))
}
