//! Raw and validated request views.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};

use edgeguard_core::{AppError, AppResult};

use crate::schema::Section;

/// Request data as handed over by the HTTP layer.
///
/// Query and path values normally arrive as strings; the body is whatever
/// JSON the client sent (absent and `null` both mean "no body").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRequest {
    pub(crate) body: Option<JsonValue>,
    pub(crate) query: Map<String, JsonValue>,
    pub(crate) params: Map<String, JsonValue>,
}

impl RawRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<JsonValue>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_params<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<JsonValue>,
    {
        self.params
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn body(&self) -> Option<&JsonValue> {
        self.body.as_ref()
    }
}

/// Request view produced by a successful validation.
///
/// Only declared fields are present, each coerced to its declared type.
/// Optional fields without a value or default are omitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedRequest {
    pub(crate) body: Map<String, JsonValue>,
    pub(crate) query: Map<String, JsonValue>,
    pub(crate) params: Map<String, JsonValue>,
}

impl ValidatedRequest {
    pub fn section(&self, section: Section) -> &Map<String, JsonValue> {
        match section {
            Section::Body => &self.body,
            Section::Query => &self.query,
            Section::Params => &self.params,
        }
    }

    pub fn body(&self) -> &Map<String, JsonValue> {
        &self.body
    }

    pub fn query(&self) -> &Map<String, JsonValue> {
        &self.query
    }

    pub fn params(&self) -> &Map<String, JsonValue> {
        &self.params
    }

    pub fn get(&self, section: Section, name: &str) -> Option<&JsonValue> {
        self.section(section).get(name)
    }

    pub fn str(&self, section: Section, name: &str) -> Option<&str> {
        self.get(section, name).and_then(JsonValue::as_str)
    }

    pub fn i64(&self, section: Section, name: &str) -> Option<i64> {
        self.get(section, name).and_then(JsonValue::as_i64)
    }

    pub fn f64(&self, section: Section, name: &str) -> Option<f64> {
        self.get(section, name).and_then(JsonValue::as_f64)
    }

    pub fn bool(&self, section: Section, name: &str) -> Option<bool> {
        self.get(section, name).and_then(JsonValue::as_bool)
    }

    /// Deserialize the validated body into a typed struct.
    ///
    /// A failure here means the schema and `T` disagree, which is a
    /// programming error and therefore classified as internal.
    pub fn body_as<T: DeserializeOwned>(&self) -> AppResult<T> {
        serde_json::from_value(JsonValue::Object(self.body.clone())).map_err(AppError::unexpected)
    }
}
