use std::sync::Arc;

use axum::extract::Extension;
use serde_json::{json, Value as JsonValue};

use edgeguard_core::AppError;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::envelope::ResponseEnvelope;

pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> ResponseEnvelope<JsonValue> {
    ResponseEnvelope::success(
        "OK",
        json!({ "status": "ok", "environment": services.environment.as_str() }),
    )
}

/// Fallback for unmatched routes.
pub async fn not_found() -> ApiError {
    AppError::not_found("Route not found").into()
}
