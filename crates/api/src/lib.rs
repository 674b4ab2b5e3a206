//! HTTP edge: response envelope, error dispatch, request validation and
//! credential checks wired into an Axum router.

pub mod app;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod envelope;
pub mod extract;
pub mod middleware;

pub use config::{AppConfig, Environment};
pub use dispatcher::{DiagnosticRecord, DiagnosticSink, DispatchedFailure, ErrorDispatcher, RequestMeta, TracingSink};
pub use envelope::ResponseEnvelope;
