//! `edgeguard-auth`: signed, time-bounded credentials.
//!
//! No HTTP or storage concerns live here. Secrets are
//! passed in explicitly (or captured once in a [`TokenService`]); nothing here
//! reads process-wide configuration.

pub mod claims;
pub mod pair;
pub mod secret;
pub mod token;

pub use claims::{Payload, UnverifiedClaims, VerifiedClaims, check_expiry};
pub use pair::{IssuedTokens, TokenPair};
pub use secret::{MAX_TTL_DAYS, SigningSecret, TokenConfig};
pub use token::{TokenRejection, TokenService, inspect, issue, verify, verify_at};
