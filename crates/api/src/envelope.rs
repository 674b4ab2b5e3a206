//! Uniform response envelope.
//!
//! ```text
//! { "success": true,  "message": "...", "data": ... }
//! { "success": false, "message": "...", "errors"?: [{"path", "message", "code"?}],
//!   "details"?: {...}, "stack"?: "..." }
//! ```
//!
//! Absent fields are omitted from the JSON entirely, never sent as `null`.

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value as JsonValue;

use edgeguard_core::ValidationIssue;

/// Wire form of a [`ValidationIssue`]: the path is dotted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueBody {
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl From<&ValidationIssue> for IssueBody {
    fn from(issue: &ValidationIssue) -> Self {
        Self {
            path: issue.dotted_path(),
            message: issue.message.clone(),
            code: issue.code.clone(),
        }
    }
}

/// Success or failure envelope.
///
/// Fields are private so the invariants hold by construction: a success
/// envelope never has `errors`/`details`/`stack`, a failure never has `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope<T = JsonValue> {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<IssueBody>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
}

impl<T> ResponseEnvelope<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
            details: None,
            stack: None,
        }
    }

    /// Success without a payload.
    pub fn acknowledged(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            errors: None,
            details: None,
            stack: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors: None,
            details: None,
            stack: None,
        }
    }

    /// Attach validation issues. Ignored on success envelopes.
    pub fn with_errors(mut self, issues: &[ValidationIssue]) -> Self {
        if !self.success {
            self.errors = Some(issues.iter().map(IssueBody::from).collect());
        }
        self
    }

    /// Ignored on success envelopes.
    pub fn with_details(mut self, details: JsonValue) -> Self {
        if !self.success {
            self.details = Some(details);
        }
        self
    }

    /// Ignored on success envelopes.
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        if !self.success {
            self.stack = Some(stack.into());
        }
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn errors(&self) -> Option<&[IssueBody]> {
        self.errors.as_deref()
    }

    pub fn details(&self) -> Option<&JsonValue> {
        self.details.as_ref()
    }

    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

impl<T: Serialize> IntoResponse for ResponseEnvelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
