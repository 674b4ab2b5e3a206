//! `edgeguard-core`: failure taxonomy shared by every crate at the edge.
//!
//! This crate contains no transport or storage concerns: it only defines how a
//! failure is classified and what it carries.

pub mod error;
pub mod id;
pub mod issue;

pub use error::{AppError, AppResult, ErrorDetails, ErrorKind, GENERIC_INTERNAL_MESSAGE};
pub use id::UserId;
pub use issue::ValidationIssue;
