//! Signing secrets and per-credential-class settings.

use chrono::{DateTime, Duration, Utc};

use edgeguard_core::{AppError, AppResult};

/// HMAC signing secret.
///
/// Never empty. `Debug` output is redacted so secrets cannot end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(String);

impl SigningSecret {
    /// Fails with CONFIG if the secret is empty or whitespace only.
    #[track_caller]
    pub fn new(secret: impl Into<String>) -> AppResult<Self> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(AppError::config("signing secret must not be empty"));
        }
        Ok(Self(secret))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl core::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// Longest accepted ttl, in days.
pub const MAX_TTL_DAYS: i64 = 3650;

/// Secret and time-to-live for one credential class (e.g. access, refresh).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    secret: SigningSecret,
    ttl: Duration,
}

impl TokenConfig {
    /// Fails with CONFIG for a negative ttl or one above [`MAX_TTL_DAYS`]. A zero
    /// ttl is allowed and yields credentials that are already expired.
    #[track_caller]
    pub fn new(secret: SigningSecret, ttl: Duration) -> AppResult<Self> {
        if ttl < Duration::zero() {
            return Err(AppError::config("token ttl must not be negative"));
        }
        if ttl > Duration::days(MAX_TTL_DAYS) {
            return Err(AppError::config(format!(
                "token ttl must not exceed {MAX_TTL_DAYS} days"
            )));
        }
        Ok(Self { secret, ttl })
    }

    /// Expiry of a credential issued at `issued_at`.
    ///
    /// CONFIG if the result falls outside the representable date range.
    #[track_caller]
    pub fn expiry_from(&self, issued_at: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
        issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::config("token expiry is out of the representable range"))
    }

    pub fn secret(&self) -> &SigningSecret {
        &self.secret
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
