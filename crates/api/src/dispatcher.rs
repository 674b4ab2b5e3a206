//! Global error dispatch.
//!
//! [`ErrorDispatcher::dispatch`] is the only code path by which a failure
//! becomes an HTTP response. It consumes the failure, so a failure can be
//! dispatched (and recorded) at most once no matter how often it was
//! propagated with `?` on the way here.

use std::sync::Arc;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value as JsonValue;

use edgeguard_core::{AppError, ErrorKind};

use crate::config::Environment;
use crate::envelope::ResponseEnvelope;

/// Request attributes recorded alongside a failure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestMeta {
    pub method: String,
    pub path: String,
}

impl RequestMeta {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
        }
    }
}

/// One structured diagnostic record per dispatched failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticRecord {
    pub message: String,
    pub kind: ErrorKind,
    pub status: u16,
    pub operational: bool,
    pub location: String,
    pub method: String,
    pub path: String,
    pub trace: String,
}

/// Receives diagnostic records (log transport is outside this crate).
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, record: &DiagnosticRecord);
}

/// Emits each record as one `tracing` event: `warn` for operational
/// failures, `error` for everything else.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, r: &DiagnosticRecord) {
        if r.operational {
            tracing::warn!(
                kind = %r.kind,
                status = r.status,
                location = %r.location,
                method = %r.method,
                path = %r.path,
                trace = %r.trace,
                "{}",
                r.message
            );
        } else {
            tracing::error!(
                kind = %r.kind,
                status = r.status,
                location = %r.location,
                method = %r.method,
                path = %r.path,
                trace = %r.trace,
                "{}",
                r.message
            );
        }
    }
}

/// Status and envelope produced for one failure.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchedFailure {
    pub status: StatusCode,
    pub envelope: ResponseEnvelope<JsonValue>,
}

impl IntoResponse for DispatchedFailure {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}

#[derive(Clone)]
pub struct ErrorDispatcher {
    environment: Environment,
    sink: Arc<dyn DiagnosticSink>,
}

impl core::fmt::Debug for ErrorDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ErrorDispatcher")
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

impl ErrorDispatcher {
    /// Dispatcher recording through [`TracingSink`].
    pub fn new(environment: Environment) -> Self {
        Self::with_sink(environment, Arc::new(TracingSink))
    }

    pub fn with_sink(environment: Environment, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { environment, sink }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Turn a failure into its response.
    ///
    /// Accepts anything convertible into an [`AppError`]; unclassified
    /// failures (e.g. `anyhow::Error`) are normalized first.
    pub fn dispatch(&self, error: impl Into<AppError>, request: &RequestMeta) -> DispatchedFailure {
        let error: AppError = error.into();
        let trace = error.trace();

        self.sink.record(&DiagnosticRecord {
            message: error.internal_message().to_string(),
            kind: error.kind(),
            status: error.status_code(),
            operational: error.is_operational(),
            location: error.location().to_string(),
            method: request.method.clone(),
            path: request.path.clone(),
            trace: trace.clone(),
        });

        let mut envelope = ResponseEnvelope::failure(error.public_message());
        if error.kind() == ErrorKind::Validation {
            envelope = envelope.with_errors(error.issues().unwrap_or_default());
        } else if error.is_operational() {
            if let Some(details) = error.details() {
                envelope = envelope.with_details(details.to_json());
            }
        }
        if self.environment.exposes_traces() {
            envelope = envelope.with_stack(trace);
        }

        let status = StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        DispatchedFailure { status, envelope }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgeguard_core::{ErrorDetails, GENERIC_INTERNAL_MESSAGE, ValidationIssue};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<DiagnosticRecord>>);

    impl DiagnosticSink for Recorder {
        fn record(&self, record: &DiagnosticRecord) {
            self.0.lock().unwrap().push(record.clone());
        }
    }

    fn dispatcher(environment: Environment) -> (ErrorDispatcher, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        (ErrorDispatcher::with_sink(environment, recorder.clone()), recorder)
    }

    fn meta() -> RequestMeta {
        RequestMeta::new("POST", "/auth/register")
    }

    fn sample(kind: ErrorKind) -> AppError {
        match kind {
            ErrorKind::Validation => AppError::validation(vec![ValidationIssue::new(["body", "email"], "bad")]),
            other => AppError::new(other, "something happened").with_details(ErrorDetails::Reason("r".into())),
        }
    }

    #[test]
    fn errors_present_iff_validation() {
        let (dispatcher, _) = dispatcher(Environment::Production);
        for kind in ErrorKind::ALL {
            let out = dispatcher.dispatch(sample(kind), &meta());
            assert!(!out.envelope.is_success());
            assert_eq!(out.envelope.errors().is_some(), kind == ErrorKind::Validation, "{kind}");
            assert!(out.envelope.data().is_none());
            assert_eq!(out.status.as_u16(), kind.default_status());
        }
    }

    #[test]
    fn validation_without_issues_still_has_errors_array() {
        let (dispatcher, _) = dispatcher(Environment::Production);
        let err = AppError::new(ErrorKind::Validation, "Validation failed");
        let out = dispatcher.dispatch(err, &meta());
        assert_eq!(out.envelope.errors(), Some(&[][..]));
    }

    #[test]
    fn operational_details_are_passed_through() {
        let (dispatcher, _) = dispatcher(Environment::Production);
        let out = dispatcher.dispatch(sample(ErrorKind::Unauthorized), &meta());
        assert_eq!(out.envelope.message(), "something happened");
        assert_eq!(out.envelope.details(), Some(&json!({ "reason": "r" })));
    }

    #[test]
    fn non_operational_failures_are_generic() {
        let (dispatcher, _) = dispatcher(Environment::Development);
        for kind in [ErrorKind::Config, ErrorKind::Internal] {
            let out = dispatcher.dispatch(sample(kind), &meta());
            assert_eq!(out.envelope.message(), GENERIC_INTERNAL_MESSAGE);
            assert!(out.envelope.details().is_none());
        }
    }

    #[test]
    fn stack_only_in_development_and_absent_otherwise() {
        let (dev, _) = dispatcher(Environment::Development);
        let out = dev.dispatch(AppError::internal("db down"), &meta());
        assert!(out.envelope.stack().unwrap().contains("db down"));

        for env in [Environment::Test, Environment::Production] {
            let (other, _) = dispatcher(env);
            let out = other.dispatch(AppError::internal("db down"), &meta());
            let json = serde_json::to_value(&out.envelope).unwrap();
            assert!(json.get("stack").is_none(), "{env:?}");
        }
    }

    #[test]
    fn exactly_one_record_per_dispatch() {
        let (dispatcher, recorder) = dispatcher(Environment::Production);
        dispatcher.dispatch(AppError::not_found("user not found"), &meta());
        dispatcher.dispatch(anyhow::anyhow!("socket closed"), &meta());

        let records = recorder.0.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, ErrorKind::NotFound);
        assert_eq!(records[0].path, "/auth/register");
        assert_eq!(records[0].method, "POST");
        assert!(records[0].operational);
        assert_eq!(records[1].kind, ErrorKind::Internal);
        assert_eq!(records[1].message, "socket closed");
    }

    #[test]
    fn unclassified_failure_is_normalized_before_response() {
        let (dispatcher, _) = dispatcher(Environment::Production);
        let out = dispatcher.dispatch(anyhow::anyhow!("password column missing"), &meta());
        assert_eq!(out.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(out.envelope.message(), GENERIC_INTERNAL_MESSAGE);
        let body = serde_json::to_string(&out.envelope).unwrap();
        assert!(!body.contains("password column"));
    }
}
