//! Handler-facing error type.
//!
//! Handlers return `Result<_, ApiError>` and use `?` freely. `ApiError` does
//! not render a body: it sets the status and parks the [`AppError`] in the
//! response extensions, where [`crate::middleware::dispatch_failures`] picks
//! it up and formats it through the dispatcher.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use edgeguard_core::AppError;

#[derive(Debug)]
pub struct ApiError(pub AppError);

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn into_inner(self) -> AppError {
        self.0
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<anyhow::Error> for ApiError {
    #[track_caller]
    fn from(err: anyhow::Error) -> Self {
        Self(AppError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = status.into_response();
        response.extensions_mut().insert(self.0);
        response
    }
}
