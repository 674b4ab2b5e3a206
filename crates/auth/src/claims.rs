use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::token::TokenRejection;

/// Caller-supplied claims (subject, role, ...).
pub type Payload = Map<String, JsonValue>;

/// Claims of a credential whose signature and expiry were checked.
///
/// Only [`crate::verify`] produces this type; it is the only claims type that
/// may be used for access-control decisions.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedClaims {
    pub payload: Payload,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl VerifiedClaims {
    /// `sub` claim, if present and a string.
    pub fn subject(&self) -> Option<&str> {
        self.payload.get("sub").and_then(JsonValue::as_str)
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }
}

/// Claims decoded WITHOUT checking signature or expiry.
///
/// Produced by [`crate::inspect`]. The content may be forged; use it for
/// diagnostics and display only, never to grant access.
#[derive(Debug, Clone, PartialEq)]
pub struct UnverifiedClaims {
    pub payload: Payload,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl UnverifiedClaims {
    pub fn subject(&self) -> Option<&str> {
        self.payload.get("sub").and_then(JsonValue::as_str)
    }
}

/// Claims as encoded in the token: the payload plus `iat`/`exp` in seconds
/// since the Unix epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireClaims {
    #[serde(flatten)]
    pub payload: Payload,
    pub iat: i64,
    pub exp: i64,
}

/// Deterministically check a credential's time window.
///
/// A credential is expired from the instant `now` reaches `expires_at`.
pub fn check_expiry(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), TokenRejection> {
    if now >= expires_at {
        return Err(TokenRejection::Expired);
    }
    Ok(())
}
