//! Field-level validation failures.

use serde::{Deserialize, Serialize};

/// One field-level failure produced by a validation run.
///
/// `path` identifies the offending field starting with the request section,
/// e.g. `["body", "email"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub path: Vec<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ValidationIssue {
    pub fn new<I, S>(path: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Path joined with `.` (`"body.email"`), the form used on the wire.
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

impl core::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.dotted_path(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_path_joins_segments() {
        let issue = ValidationIssue::new(["body", "email"], "email is required");
        assert_eq!(issue.dotted_path(), "body.email");
        assert_eq!(issue.to_string(), "body.email: email is required");
    }

    #[test]
    fn code_is_omitted_from_json_when_absent() {
        let issue = ValidationIssue::new(["query", "page"], "page must be an integer");
        let json = serde_json::to_value(&issue).unwrap();
        assert!(json.get("code").is_none());

        let json = serde_json::to_value(issue.with_code("invalid_type")).unwrap();
        assert_eq!(json["code"], "invalid_type");
    }
}
