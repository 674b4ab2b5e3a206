//! Schema-validated request extractor.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::ops::Deref;

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, rejection::BytesRejection},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE, request::Parts},
};
use serde_json::Value as JsonValue;

use edgeguard_core::{AppError, ValidationIssue};
use edgeguard_validation::{RawRequest, Schema, ValidatedRequest, validate};

use crate::app::errors::ApiError;

/// A request shape known at compile time.
pub trait RequestSchema {
    fn schema() -> &'static Schema;
}

/// Extracts path parameters, query string and JSON body, and validates all
/// three against `S::schema()` in one pass.
///
/// Rejects with a single VALIDATION failure listing every issue found.
#[derive(Debug, Clone)]
pub struct Valid<S> {
    request: ValidatedRequest,
    _schema: PhantomData<fn() -> S>,
}

impl<S> Valid<S> {
    pub fn into_inner(self) -> ValidatedRequest {
        self.request
    }
}

impl<S> Deref for Valid<S> {
    type Target = ValidatedRequest;

    fn deref(&self) -> &Self::Target {
        &self.request
    }
}

#[axum::async_trait]
impl<S, St> FromRequest<St> for Valid<S>
where
    S: RequestSchema,
    St: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &St) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();

        let raw = read_parts(&mut parts, state).await?;
        let json_content = has_json_content_type(&parts.headers);

        // Buffered through `Bytes` so the router's `DefaultBodyLimit` applies.
        let bytes = Bytes::from_request(Request::from_parts(parts, body), state)
            .await
            .map_err(body_rejection)?;
        let raw = match parse_body(json_content, &bytes)? {
            Some(body) => raw.with_body(body),
            None => raw,
        };

        match validate(S::schema(), &raw) {
            Ok(request) => Ok(Self {
                request,
                _schema: PhantomData,
            }),
            Err(issues) => Err(AppError::validation(issues).into()),
        }
    }
}

async fn read_parts<St>(parts: &mut Parts, state: &St) -> Result<RawRequest, AppError>
where
    St: Send + Sync,
{
    // Routes without captures have no path parameters to offer.
    let params = Path::<HashMap<String, String>>::from_request_parts(parts, state)
        .await
        .map(|Path(params)| params)
        .unwrap_or_default();

    let Query(query) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .map_err(|_| malformed("query", "query string is malformed"))?;

    Ok(RawRequest::new().with_params(params).with_query(query))
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}

#[track_caller]
fn body_rejection(rejection: BytesRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::validation(vec![
            ValidationIssue::new(["body"], "request body is too large").with_code("too_large"),
        ])
        .with_status(StatusCode::PAYLOAD_TOO_LARGE.as_u16())
    } else {
        malformed("body", "request body could not be read")
    }
}

fn parse_body(json_content: bool, bytes: &[u8]) -> Result<Option<JsonValue>, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    if !json_content {
        return Err(malformed("body", "request body must be sent as application/json")
            .with_status(StatusCode::UNSUPPORTED_MEDIA_TYPE.as_u16()));
    }
    match serde_json::from_slice::<JsonValue>(bytes) {
        Ok(JsonValue::Null) => Ok(None),
        Ok(body) => Ok(Some(body)),
        Err(_) => Err(malformed("body", "request body must be valid JSON")),
    }
}

#[track_caller]
fn malformed(section: &str, message: &str) -> AppError {
    AppError::validation(vec![ValidationIssue::new([section], message).with_code("malformed")])
}
