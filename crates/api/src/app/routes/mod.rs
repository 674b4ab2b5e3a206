use axum::{
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod system;
pub mod users;

/// Endpoints reachable without credentials.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/refresh", post(auth::refresh))
}

/// Endpoints that require a verified access token.
pub fn protected_router() -> Router {
    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/users/:id", get(users::get_user))
}
