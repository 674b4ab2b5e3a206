//! Access + refresh credential pair.
//!
//! Both classes are the same abstraction; they differ only in the secret and
//! ttl they were configured with.

use chrono::{DateTime, Utc};
use serde::Serialize;

use edgeguard_core::{AppError, AppResult};

use crate::claims::{Payload, VerifiedClaims};
use crate::secret::TokenConfig;
use crate::token::TokenService;

/// Tokens handed to a client after login/registration or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    access: TokenService,
    refresh: TokenService,
}

impl TokenPair {
    /// Fails with CONFIG when both classes share a secret: a refresh token
    /// must never verify as an access token.
    #[track_caller]
    pub fn new(access: TokenConfig, refresh: TokenConfig) -> AppResult<Self> {
        if access.secret() == refresh.secret() {
            return Err(AppError::config(
                "access and refresh tokens must use different signing secrets",
            ));
        }
        Ok(Self {
            access: TokenService::new(access),
            refresh: TokenService::new(refresh),
        })
    }

    pub fn access(&self) -> &TokenService {
        &self.access
    }

    pub fn refresh(&self) -> &TokenService {
        &self.refresh
    }

    pub fn issue_pair(&self, payload: &Payload) -> AppResult<IssuedTokens> {
        self.issue_pair_at(payload, Utc::now())
    }

    pub fn issue_pair_at(&self, payload: &Payload, now: DateTime<Utc>) -> AppResult<IssuedTokens> {
        Ok(IssuedTokens {
            access_token: self.access.issue_at(payload, now)?,
            refresh_token: self.refresh.issue_at(payload, now)?,
            access_expires_at: self.access.config().expiry_from(now)?,
            refresh_expires_at: self.refresh.config().expiry_from(now)?,
        })
    }

    /// Verify a refresh token and issue a fresh pair for the same payload.
    pub fn rotate(&self, refresh_token: &str) -> AppResult<IssuedTokens> {
        let VerifiedClaims { payload, .. } = self.refresh.verify(refresh_token)?;
        self.issue_pair(&payload)
    }
}
