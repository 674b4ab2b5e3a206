//! `edgeguard-validation`: declarative request schemas and the validator.
//!
//! Pure: validating never mutates the schema and performs no IO.

pub mod request;
pub mod schema;
pub mod validator;

pub use edgeguard_core::ValidationIssue;
pub use request::{RawRequest, ValidatedRequest};
pub use schema::{FieldRule, FieldType, Format, Schema, SchemaBuilder, Section};
pub use validator::{validate, validate_request};
