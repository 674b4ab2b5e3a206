use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::json;

use edgeguard_auth::{IssuedTokens, Payload};
use edgeguard_core::UserId;
use edgeguard_validation::{FieldRule, Schema};

use crate::context::AuthenticatedSubject;
use crate::extract::RequestSchema;

pub const ROLES: [&str; 2] = ["user", "admin"];

// -------------------------
// Request schemas
// -------------------------

#[derive(Debug, Clone)]
pub struct RegisterSchema;

impl RequestSchema for RegisterSchema {
    fn schema() -> &'static Schema {
        static SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
            Schema::builder()
                .body("email", FieldRule::string().email())
                .body("password", FieldRule::string().min_length(6))
                .body("name", FieldRule::string().optional().min_length(1).max_length(100))
                .body("role", FieldRule::one_of(ROLES).optional().default_value("user"))
                .build()
        });
        &SCHEMA
    }
}

#[derive(Debug, Clone)]
pub struct RefreshSchema;

impl RequestSchema for RefreshSchema {
    fn schema() -> &'static Schema {
        static SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
            Schema::builder()
                .body("refreshToken", FieldRule::string().min_length(1))
                .build()
        });
        &SCHEMA
    }
}

#[derive(Debug, Clone)]
pub struct UserIdParamSchema;

impl RequestSchema for UserIdParamSchema {
    fn schema() -> &'static Schema {
        static SCHEMA: LazyLock<Schema> =
            LazyLock::new(|| Schema::builder().param("id", FieldRule::uuid()).build());
        &SCHEMA
    }
}

// -------------------------
// Request DTOs
// -------------------------

/// Registration input as handlers see it. The password is validated but
/// never read back out: nothing is persisted.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: Option<String>,
    pub role: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: Option<String>,
}

impl UserView {
    pub fn from_subject(subject: &AuthenticatedSubject) -> Self {
        let name = subject
            .claims()
            .payload
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Self {
            id: subject.user_id(),
            email: subject.email().map(str::to_string),
            name,
            role: subject.role().map(str::to_string),
        }
    }

    /// Claims carried by the credentials issued for this user.
    pub fn to_payload(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert("sub".into(), json!(self.id.to_string()));
        payload.insert("email".into(), json!(self.email));
        payload.insert("role".into(), json!(self.role));
        if let Some(name) = &self.name {
            payload.insert("name".into(), json!(name));
        }
        payload
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisteredUser {
    pub user: UserView,
    #[serde(flatten)]
    pub tokens: IssuedTokens,
}
