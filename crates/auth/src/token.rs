//! Credential issuance, verification and inspection.
//!
//! Credentials are HS256 JWTs. The payload is signed together with an `iat`
//! and an `exp` timestamp; the secret is never embedded.
//!
//! ```text
//! issue ──► issued ──verify──► valid | expired | signature-invalid
//! ```
//!
//! Only `valid` lets a request proceed. [`inspect`] evaluates none of these
//! states and must not be used for access control.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use edgeguard_core::{AppError, AppResult, ErrorDetails};

use crate::claims::{Payload, UnverifiedClaims, VerifiedClaims, WireClaims, check_expiry};
use crate::secret::{SigningSecret, TokenConfig};

const RESERVED_CLAIMS: [&str; 2] = ["iat", "exp"];

/// Why a credential was rejected.
///
/// Carried in the UNAUTHORIZED error's details as `{"reason": "..."}` so
/// callers can start a refresh flow on expiry instead of logging out.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenRejection {
    /// Signature does not match (tampered, wrong secret, or not a token we issued).
    SignatureInvalid,
    /// Signature is fine but the embedded expiry has passed.
    Expired,
    /// Not decodable at all.
    Malformed,
}

impl TokenRejection {
    pub const fn as_str(self) -> &'static str {
        match self {
            TokenRejection::SignatureInvalid => "signature_invalid",
            TokenRejection::Expired => "expired",
            TokenRejection::Malformed => "malformed",
        }
    }

    const fn message(self) -> &'static str {
        match self {
            TokenRejection::SignatureInvalid => "Invalid token",
            TokenRejection::Expired => "Token expired",
            TokenRejection::Malformed => "Malformed token",
        }
    }

    /// Recover the rejection reason from an error produced by this crate.
    pub fn of(err: &AppError) -> Option<Self> {
        match err.details() {
            Some(ErrorDetails::Reason(reason)) => [Self::SignatureInvalid, Self::Expired, Self::Malformed]
                .into_iter()
                .find(|r| r.as_str() == reason.as_str()),
            _ => None,
        }
    }

    #[track_caller]
    fn into_error(self) -> AppError {
        AppError::unauthorized(self.message()).with_details(ErrorDetails::Reason(self.as_str().to_string()))
    }
}

impl core::fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue a credential for `payload` that expires `ttl` from now.
///
/// Fails with CONFIG if `secret` is empty.
pub fn issue(payload: &Payload, secret: &str, ttl: Duration) -> AppResult<String> {
    let config = TokenConfig::new(SigningSecret::new(secret)?, ttl)?;
    issue_at(payload, &config, Utc::now())
}

/// Verify signature and expiry; the only check whose result may be trusted.
///
/// Fails with CONFIG if `secret` is empty, UNAUTHORIZED otherwise.
pub fn verify(token: &str, secret: &str) -> AppResult<VerifiedClaims> {
    verify_at(token, secret, Utc::now())
}

/// [`verify`] against an explicit clock.
pub fn verify_at(token: &str, secret: &str, now: DateTime<Utc>) -> AppResult<VerifiedClaims> {
    verify_with(token, &SigningSecret::new(secret)?, now)
}

/// Decode the payload without any validation.
///
/// Never fails because of a bad signature or an expired credential; only a
/// structurally undecodable token is rejected (reason `malformed`).
pub fn inspect(token: &str) -> AppResult<UnverifiedClaims> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(TokenRejection::Malformed.into_error());
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| TokenRejection::Malformed.into_error())?;
    let mut payload: Payload =
        serde_json::from_slice(&bytes).map_err(|_| TokenRejection::Malformed.into_error())?;

    let issued_at = payload.remove("iat").and_then(|v| v.as_i64()).and_then(from_epoch);
    let expires_at = payload.remove("exp").and_then(|v| v.as_i64()).and_then(from_epoch);

    Ok(UnverifiedClaims {
        payload,
        issued_at,
        expires_at,
    })
}

/// Issues and verifies one credential class with a captured secret and ttl.
#[derive(Debug, Clone)]
pub struct TokenService {
    config: TokenConfig,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    pub fn issue(&self, payload: &Payload) -> AppResult<String> {
        issue_at(payload, &self.config, Utc::now())
    }

    pub fn issue_at(&self, payload: &Payload, now: DateTime<Utc>) -> AppResult<String> {
        issue_at(payload, &self.config, now)
    }

    pub fn verify(&self, token: &str) -> AppResult<VerifiedClaims> {
        verify_with(token, self.config.secret(), Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> AppResult<VerifiedClaims> {
        verify_with(token, self.config.secret(), now)
    }

    /// See [`inspect`]: unverified, never for access control.
    pub fn inspect(&self, token: &str) -> AppResult<UnverifiedClaims> {
        inspect(token)
    }
}

fn issue_at(payload: &Payload, config: &TokenConfig, now: DateTime<Utc>) -> AppResult<String> {
    let mut payload = payload.clone();
    for reserved in RESERVED_CLAIMS {
        payload.remove(reserved);
    }

    let claims = WireClaims {
        payload,
        iat: now.timestamp(),
        exp: config.expiry_from(now)?.timestamp(),
    };

    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret().as_bytes()),
    )
    .map_err(AppError::unexpected)?;

    tracing::trace!(exp = claims.exp, "credential issued");
    Ok(token)
}

fn verify_with(token: &str, secret: &SigningSecret, now: DateTime<Utc>) -> AppResult<VerifiedClaims> {
    // Expiry is checked below against the caller's clock, not by jsonwebtoken.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation.leeway = 0;

    let decoded = jsonwebtoken::decode::<WireClaims>(
        token.trim(),
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "credential signature check failed");
        TokenRejection::SignatureInvalid.into_error()
    })?;

    let WireClaims { payload, iat, exp } = decoded.claims;
    let (Some(issued_at), Some(expires_at)) = (from_epoch(iat), from_epoch(exp)) else {
        return Err(TokenRejection::Malformed.into_error());
    };

    check_expiry(expires_at, now).map_err(TokenRejection::into_error)?;

    Ok(VerifiedClaims {
        payload,
        issued_at,
        expires_at,
    })
}

fn from_epoch(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}
