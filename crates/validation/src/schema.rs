//! Declarative request shape.
//!
//! A [`Schema`] describes three independent request sections (body, query
//! string, path parameters), each an ordered list of named [`FieldRule`]s.
//! Once built it is immutable and can be shared freely between requests.

use serde_json::Value as JsonValue;

use edgeguard_core::AppError;

use crate::validator::check_field;

/// Request section a field belongs to.
///
/// The declaration order here is also the order issues are reported in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Section {
    Body,
    Query,
    Params,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Body, Section::Query, Section::Params];

    pub const fn as_str(self) -> &'static str {
        match self {
            Section::Body => "body",
            Section::Query => "query",
            Section::Params => "params",
        }
    }
}

impl core::fmt::Display for Section {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic type a field is coerced to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    /// String holding a UUID; canonicalized on success.
    Uuid,
    /// String restricted to a closed set of values.
    Enum(Vec<String>),
}

/// Format constraint applied to string values.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Format {
    Email,
}

/// Type and constraints of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub(crate) ty: FieldType,
    pub(crate) required: bool,
    pub(crate) format: Option<Format>,
    pub(crate) min_length: Option<usize>,
    pub(crate) max_length: Option<usize>,
    pub(crate) min: Option<f64>,
    pub(crate) max: Option<f64>,
    pub(crate) default: Option<JsonValue>,
}

impl FieldRule {
    /// A required field of the given type with no further constraints.
    pub fn of(ty: FieldType) -> Self {
        Self {
            ty,
            required: true,
            format: None,
            min_length: None,
            max_length: None,
            min: None,
            max: None,
            default: None,
        }
    }

    pub fn string() -> Self {
        Self::of(FieldType::String)
    }

    pub fn integer() -> Self {
        Self::of(FieldType::Integer)
    }

    pub fn number() -> Self {
        Self::of(FieldType::Number)
    }

    pub fn boolean() -> Self {
        Self::of(FieldType::Boolean)
    }

    pub fn uuid() -> Self {
        Self::of(FieldType::Uuid)
    }

    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::of(FieldType::Enum(values.into_iter().map(Into::into).collect()))
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn email(mut self) -> Self {
        self.format = Some(Format::Email);
        self
    }

    /// Minimum length in characters (string-like types).
    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    /// Maximum length in characters (string-like types).
    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    /// Inclusive lower bound (numeric types).
    pub fn min(mut self, value: f64) -> Self {
        self.min = Some(value);
        self
    }

    /// Inclusive upper bound (numeric types).
    pub fn max(mut self, value: f64) -> Self {
        self.max = Some(value);
        self
    }

    /// Value used when an optional field is absent. Must itself satisfy the
    /// rule; see [`SchemaBuilder::try_build`].
    pub fn default_value(mut self, value: impl Into<JsonValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn field_type(&self) -> &FieldType {
        &self.ty
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Immutable request schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    body: Vec<(String, FieldRule)>,
    query: Vec<(String, FieldRule)>,
    params: Vec<(String, FieldRule)>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Fields of one section, in declaration order.
    pub fn fields(&self, section: Section) -> &[(String, FieldRule)] {
        match section {
            Section::Body => &self.body,
            Section::Query => &self.query,
            Section::Params => &self.params,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty() && self.query.is_empty() && self.params.is_empty()
    }
}

/// Builder for [`Schema`].
///
/// Declaring the same field twice in a section replaces the earlier rule but
/// keeps its original position.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn body(self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.field(Section::Body, name, rule)
    }

    pub fn query(self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.field(Section::Query, name, rule)
    }

    pub fn param(self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.field(Section::Params, name, rule)
    }

    pub fn field(mut self, section: Section, name: impl Into<String>, rule: FieldRule) -> Self {
        let name = name.into();
        let fields = match section {
            Section::Body => &mut self.schema.body,
            Section::Query => &mut self.schema.query,
            Section::Params => &mut self.schema.params,
        };
        match fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = rule,
            None => fields.push((name, rule)),
        }
        self
    }

    /// Finish the schema. A default that violates its own rule is a
    /// programming error and trips a debug assertion.
    pub fn build(self) -> Schema {
        let checked = self.try_build();
        debug_assert!(
            checked.is_ok(),
            "{:?}",
            checked.as_ref().err().map(|(_, e)| e.message())
        );
        match checked {
            Ok(schema) => schema,
            Err((schema, _)) => schema,
        }
    }

    /// Finish the schema, checking every default value against its rule.
    ///
    /// On failure the schema is handed back along with a CONFIG error naming
    /// each offending field.
    pub fn try_build(self) -> Result<Schema, (Schema, AppError)> {
        let mut problems = Vec::new();
        for section in Section::ALL {
            for (name, rule) in self.schema.fields(section) {
                let Some(default) = &rule.default else { continue };
                if let Err(failure) = check_field(name, rule, Some(default)) {
                    problems.push(format!("{section}.{name}: default {default} rejected ({})", failure.message));
                }
            }
        }
        if problems.is_empty() {
            Ok(self.schema)
        } else {
            Err((self.schema, AppError::config(problems.join("; "))))
        }
    }
}
