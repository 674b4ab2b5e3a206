use std::sync::Arc;

use chrono::{DateTime, Utc};

use edgeguard_auth::{IssuedTokens, Payload, TokenPair};
use edgeguard_core::AppResult;

use crate::config::{AppConfig, Environment};

/// Shared, read-only application services handed to every handler.
#[derive(Debug, Clone)]
pub struct AppServices {
    pub tokens: Arc<TokenPair>,
    pub environment: Environment,
}

impl AppServices {
    /// Issue a credential pair, stamping the issuance time for logs.
    pub fn issue_tokens(&self, payload: &Payload) -> AppResult<IssuedTokens> {
        let now: DateTime<Utc> = Utc::now();
        let tokens = self.tokens.issue_pair_at(payload, now)?;
        tracing::info!(
            sub = payload.get("sub").and_then(|v| v.as_str()).unwrap_or_default(),
            access_expires_at = %tokens.access_expires_at,
            "issued credential pair"
        );
        Ok(tokens)
    }
}

pub fn build_services(config: &AppConfig) -> AppResult<AppServices> {
    let tokens = TokenPair::new(config.access.clone(), config.refresh.clone())?;
    Ok(AppServices {
        tokens: Arc::new(tokens),
        environment: config.environment,
    })
}
