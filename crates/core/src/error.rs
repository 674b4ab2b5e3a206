//! Failure taxonomy.
//!
//! Every failure observed outside the function that detected it is an
//! [`AppError`]: a tagged record whose [`ErrorKind`] decides the HTTP status,
//! whether the message is safe to show to a caller, and how it is logged.
//! Unclassified failures (anything that is not already an `AppError`) are
//! normalized into [`ErrorKind::Internal`] with a generic public message.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt::Write as _;
use std::panic::Location;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use thiserror::Error;

use crate::issue::ValidationIssue;

/// Result type used across the edge.
pub type AppResult<T> = Result<T, AppError>;

/// Message returned to callers in place of any non-operational failure text.
pub const GENERIC_INTERNAL_MESSAGE: &str = "Internal server error";

type Cause = Arc<dyn StdError + Send + Sync + 'static>;

/// Closed set of failure kinds.
///
/// New kinds are added here, never by introducing new error types.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Request data did not match the declared schema.
    Validation,
    /// Missing, invalid or expired credential.
    Unauthorized,
    /// Authenticated, but not allowed.
    Forbidden,
    /// A requested resource does not exist.
    NotFound,
    /// The request conflicts with existing state (e.g. uniqueness).
    Conflict,
    /// Deployment/configuration problem (missing secret, bad ttl).
    Config,
    /// Anything unanticipated.
    Internal,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::Validation,
        ErrorKind::Unauthorized,
        ErrorKind::Forbidden,
        ErrorKind::NotFound,
        ErrorKind::Conflict,
        ErrorKind::Config,
        ErrorKind::Internal,
    ];

    /// HTTP status a failure of this kind maps to unless overridden.
    pub const fn default_status(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Config | ErrorKind::Internal => 500,
        }
    }

    /// Operational failures are expected business outcomes whose message and
    /// details may be shown to the caller.
    pub const fn is_operational(self) -> bool {
        !matches!(self, ErrorKind::Config | ErrorKind::Internal)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Config => "CONFIG",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured payload attached to a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDetails {
    /// Ordered validation issues (only meaningful for [`ErrorKind::Validation`]).
    Issues(Vec<ValidationIssue>),
    /// Name of the field a failure is about (e.g. a uniqueness conflict).
    Field(String),
    /// Machine-readable sub-classification (e.g. `"expired"`).
    Reason(String),
    Json(JsonValue),
}

impl ErrorDetails {
    pub fn to_json(&self) -> JsonValue {
        match self {
            ErrorDetails::Issues(issues) => json!(issues),
            ErrorDetails::Field(field) => json!({ "field": field }),
            ErrorDetails::Reason(reason) => json!({ "reason": reason }),
            ErrorDetails::Json(value) => value.clone(),
        }
    }
}

/// A classified failure.
///
/// Immutable once built (the `with_*` helpers consume and return a new value).
/// Construction records the caller location for diagnostics.
#[derive(Clone, Error)]
#[error("{message}")]
pub struct AppError {
    kind: ErrorKind,
    status_code: u16,
    message: String,
    is_operational: bool,
    details: Option<ErrorDetails>,
    internal_message: Option<String>,
    #[source]
    cause: Option<Cause>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

impl AppError {
    #[track_caller]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status_code: kind.default_status(),
            message: message.into(),
            is_operational: kind.is_operational(),
            details: None,
            internal_message: None,
            cause: None,
            location: Location::caller(),
            backtrace: Arc::new(Backtrace::capture()),
        }
    }

    /// Validation failure carrying the ordered issue sequence.
    #[track_caller]
    pub fn validation(issues: Vec<ValidationIssue>) -> Self {
        Self::new(ErrorKind::Validation, "Validation failed")
            .with_details(ErrorDetails::Issues(issues))
    }

    /// Validation failure for a single field.
    #[track_caller]
    pub fn invalid_field<I, S>(path: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::validation(vec![
            ValidationIssue::new(path, message).with_code("invalid_format"),
        ])
    }

    #[track_caller]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    #[track_caller]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    #[track_caller]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    #[track_caller]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Conflict on a uniquely-constrained field (e.g. an email already in use).
    #[track_caller]
    pub fn conflict_on(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(ErrorKind::Conflict, format!("{field} already exists"))
            .with_details(ErrorDetails::Field(field))
    }

    #[track_caller]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    #[track_caller]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Normalize an arbitrary error.
    ///
    /// If `err` (or anything in its source chain) is already an `AppError`,
    /// that classification is kept. Otherwise the failure becomes
    /// [`ErrorKind::Internal`] with a generic message; the original text and
    /// the error itself are kept for diagnostics only.
    #[track_caller]
    pub fn unexpected<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        if let Some(classified) = find_classified(&err) {
            return classified;
        }
        let mut normalized = Self::new(ErrorKind::Internal, GENERIC_INTERNAL_MESSAGE);
        normalized.internal_message = Some(err.to_string());
        normalized.cause = Some(Arc::new(err));
        normalized
    }

    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = Some(details);
        self
    }

    /// Override the HTTP status (the kind and its operational flag are kept).
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_operational(&self) -> bool {
        self.is_operational
    }

    pub fn details(&self) -> Option<&ErrorDetails> {
        self.details.as_ref()
    }

    /// Validation issues, if this is a validation failure that carries them.
    pub fn issues(&self) -> Option<&[ValidationIssue]> {
        match &self.details {
            Some(ErrorDetails::Issues(issues)) => Some(issues),
            _ => None,
        }
    }

    /// Message safe to return to a caller.
    ///
    /// Non-operational failures never expose their own text.
    pub fn public_message(&self) -> &str {
        if self.is_operational {
            &self.message
        } else {
            GENERIC_INTERNAL_MESSAGE
        }
    }

    /// Original message of a normalized failure, falling back to the message.
    pub fn internal_message(&self) -> &str {
        self.internal_message.as_deref().unwrap_or(&self.message)
    }

    /// Where this failure was constructed.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Full diagnostic trace: classification, origin, cause chain and (when
    /// enabled via `RUST_BACKTRACE`) the captured backtrace.
    pub fn trace(&self) -> String {
        let mut out = format!("{}: {}\n    at {}", self.kind, self.internal_message(), self.location);
        let mut source = self.cause.as_deref().map(|c| c as &(dyn StdError + 'static));
        while let Some(err) = source {
            let _ = write!(out, "\ncaused by: {err}");
            source = err.source();
        }
        if self.backtrace.status() == BacktraceStatus::Captured {
            let _ = write!(out, "\nbacktrace:\n{}", self.backtrace);
        }
        out
    }
}

impl core::fmt::Debug for AppError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("status_code", &self.status_code)
            .field("message", &self.message)
            .field("is_operational", &self.is_operational)
            .field("details", &self.details)
            .field("internal_message", &self.internal_message)
            .field("location", &format_args!("{}", self.location))
            .finish()
    }
}

impl From<anyhow::Error> for AppError {
    #[track_caller]
    fn from(err: anyhow::Error) -> Self {
        if let Some(classified) = err.chain().find_map(|e| e.downcast_ref::<AppError>()) {
            return classified.clone();
        }
        let mut normalized = Self::new(ErrorKind::Internal, GENERIC_INTERNAL_MESSAGE);
        normalized.internal_message = Some(format!("{err:#}"));
        normalized.cause = Some(Arc::from(Box::<dyn StdError + Send + Sync>::from(err)));
        normalized
    }
}

fn find_classified(err: &(dyn StdError + 'static)) -> Option<AppError> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(app) = e.downcast_ref::<AppError>() {
            return Some(app.clone());
        }
        current = e.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("duplicate key value violates unique constraint \"users_email_key\"")]
    struct UniqueViolation;

    #[derive(Debug, Error)]
    #[error("repository write failed")]
    struct RepositoryError {
        #[source]
        inner: AppError,
    }

    #[test]
    fn taxonomy_defaults_match_table() {
        let expected = [
            (ErrorKind::Validation, 400, true),
            (ErrorKind::Unauthorized, 401, true),
            (ErrorKind::Forbidden, 403, true),
            (ErrorKind::NotFound, 404, true),
            (ErrorKind::Conflict, 409, true),
            (ErrorKind::Config, 500, false),
            (ErrorKind::Internal, 500, false),
        ];
        for (kind, status, operational) in expected {
            assert_eq!(kind.default_status(), status, "{kind}");
            assert_eq!(kind.is_operational(), operational, "{kind}");
        }
        assert_eq!(ErrorKind::ALL.len(), expected.len());
    }

    #[test]
    fn kind_serializes_as_screaming_snake_case() {
        assert_eq!(serde_json::to_value(ErrorKind::NotFound).unwrap(), "NOT_FOUND");
        assert_eq!(ErrorKind::NotFound.to_string(), "NOT_FOUND");
    }

    #[test]
    fn validation_error_carries_issues() {
        let err = AppError::validation(vec![ValidationIssue::new(["body", "email"], "bad")]);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status_code(), 400);
        assert!(err.is_operational());
        assert_eq!(err.issues().map(<[_]>::len), Some(1));
    }

    #[test]
    fn unclassified_error_is_normalized_to_internal() {
        let err = AppError::unexpected(UniqueViolation);
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.status_code(), 500);
        assert!(!err.is_operational());
        assert_eq!(err.message(), GENERIC_INTERNAL_MESSAGE);
        assert_eq!(err.public_message(), GENERIC_INTERNAL_MESSAGE);
        assert!(err.internal_message().contains("users_email_key"));
        assert!(err.trace().contains("caused by: duplicate key value"));
    }

    #[test]
    fn classified_error_in_source_chain_is_preserved() {
        let err = AppError::unexpected(RepositoryError {
            inner: AppError::conflict_on("email"),
        });
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.details(), Some(&ErrorDetails::Field("email".to_string())));
    }

    #[test]
    fn anyhow_normalization_preserves_kind() {
        let wrapped = anyhow::Error::new(AppError::not_found("user not found")).context("loading user");
        let err = AppError::from(wrapped);
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), "user not found");
    }

    #[test]
    fn anyhow_normalization_hides_unclassified_message() {
        let err = AppError::from(anyhow::anyhow!("connection reset by peer"));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.public_message(), GENERIC_INTERNAL_MESSAGE);
        assert!(err.internal_message().contains("connection reset by peer"));
    }

    #[test]
    fn non_operational_message_is_never_public() {
        let err = AppError::config("JWT_ACCESS_SECRET is not set");
        assert_eq!(err.message(), "JWT_ACCESS_SECRET is not set");
        assert_eq!(err.public_message(), GENERIC_INTERNAL_MESSAGE);
    }

    #[test]
    fn status_override_keeps_kind() {
        let err = AppError::validation(Vec::new()).with_status(422);
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn trace_names_origin_location() {
        let err = AppError::internal("boom");
        assert!(err.location().file().ends_with("error.rs"));
        assert!(err.trace().starts_with("INTERNAL: boom\n    at "));
    }

    #[test]
    fn details_render_as_json() {
        assert_eq!(
            ErrorDetails::Reason("expired".into()).to_json(),
            json!({ "reason": "expired" })
        );
        assert_eq!(ErrorDetails::Field("email".into()).to_json(), json!({ "field": "email" }));
    }
}
