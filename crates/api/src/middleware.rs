use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::ALLOW},
    middleware::Next,
    response::{IntoResponse, Response},
};

use edgeguard_auth::TokenPair;
use edgeguard_core::{AppError, ErrorDetails, ErrorKind};

use crate::app::errors::ApiError;
use crate::context::AuthenticatedSubject;
use crate::dispatcher::{ErrorDispatcher, RequestMeta};

/// Outermost layer: turns any failure parked by [`ApiError`] into the
/// dispatcher's envelope. Successful responses pass through untouched.
pub async fn dispatch_failures(
    State(dispatcher): State<Arc<ErrorDispatcher>>,
    req: Request,
    next: Next,
) -> Response {
    let meta = RequestMeta::new(req.method().as_str(), req.uri().path());

    let mut response = next.run(req).await;
    if let Some(err) = response.extensions_mut().remove::<AppError>() {
        return dispatcher.dispatch(err, &meta).into_response();
    }

    // Failures produced by the framework itself (e.g. 405 from a method
    // router) carry no AppError; give them the same envelope.
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }
    let allow = response.headers().get(ALLOW).cloned();
    let mut dispatched = dispatcher.dispatch(framework_failure(status), &meta).into_response();
    if let Some(allow) = allow {
        dispatched.headers_mut().insert(ALLOW, allow);
    }
    dispatched
}

#[track_caller]
fn framework_failure(status: StatusCode) -> AppError {
    let message = status.canonical_reason().unwrap_or("Request failed");
    let kind = match status {
        StatusCode::UNAUTHORIZED => ErrorKind::Unauthorized,
        StatusCode::FORBIDDEN => ErrorKind::Forbidden,
        StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED => ErrorKind::NotFound,
        StatusCode::CONFLICT => ErrorKind::Conflict,
        s if s.is_client_error() => ErrorKind::Validation,
        _ => ErrorKind::Internal,
    };
    AppError::new(kind, message).with_status(status.as_u16())
}

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenPair>,
}

/// Require a valid access token and expose the caller as
/// [`AuthenticatedSubject`].
pub async fn require_access_token(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;

    let claims = match state.tokens.access().verify(&token) {
        Ok(claims) => claims,
        Err(err) => {
            // Unverified: only used to say who the token claims to be.
            if let Ok(unverified) = state.tokens.access().inspect(&token) {
                tracing::debug!(
                    claimed_sub = unverified.subject().unwrap_or("<none>"),
                    "rejected access token"
                );
            }
            return Err(err.into());
        }
    };

    let subject = AuthenticatedSubject::from_claims(claims)?;
    req.extensions_mut().insert(subject);

    Ok(next.run(req).await)
}

fn missing_token() -> AppError {
    AppError::unauthorized("Authentication required")
        .with_details(ErrorDetails::Reason("missing_token".to_string()))
}

fn extract_bearer(headers: &HeaderMap) -> Result<String, AppError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(missing_token)?;

    let header = header.to_str().map_err(|_| missing_token())?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(missing_token)?
        .trim();
    if token.is_empty() {
        return Err(missing_token());
    }

    Ok(token.to_string())
}
