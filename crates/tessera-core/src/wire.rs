//! Wire envelope and error taxonomy shared by the server and the client.
//!
//! Every response has the same shape:
//!
//! ```text
//! { "<collection>": [ <record>, ... ], "errors": [ { "error": slug, "field": .., "param": .., "header": .. } ] }
//! ```
//!
//! Successful single-object operations carry exactly one record and an
//! empty `errors` list. Failures carry an empty record list.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::record::Record;

/// Closed vocabulary of error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSlug {
    /// No record with that ID in that table.
    NotFound,
    /// ID already present on create.
    Conflict,
    /// The request body failed to parse against the expected shape.
    InvalidFormat,
    /// A required field was absent.
    Missing,
    /// The shared-secret credential was absent or wrong.
    AccessDenied,
    /// Anything that cannot be attributed to caller input.
    ActOfGod,
}

impl ErrorSlug {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::InvalidFormat => "invalid_format",
            Self::Missing => "missing",
            Self::AccessDenied => "access_denied",
            Self::ActOfGod => "act_of_god",
        }
    }

    pub fn parse(slug: &str) -> Option<Self> {
        match slug {
            "not_found" => Some(Self::NotFound),
            "conflict" => Some(Self::Conflict),
            "invalid_format" => Some(Self::InvalidFormat),
            "missing" => Some(Self::Missing),
            "access_denied" => Some(Self::AccessDenied),
            "act_of_god" => Some(Self::ActOfGod),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the `errors` list.
///
/// The slug is kept as a raw string so that a server speaking a newer
/// vocabulary still produces a parseable response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequestError {
    #[serde(rename = "error", default)]
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

pub type RequestErrors = Vec<RequestError>;

impl RequestError {
    pub fn new(slug: ErrorSlug) -> Self {
        Self {
            slug: slug.as_str().to_string(),
            ..Default::default()
        }
    }

    /// An error attributed to a JSON pointer into the request body.
    pub fn at_field(slug: ErrorSlug, field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Self::new(slug)
        }
    }

    /// An error attributed to a path parameter.
    pub fn at_param(slug: ErrorSlug, param: impl Into<String>) -> Self {
        Self {
            param: Some(param.into()),
            ..Self::new(slug)
        }
    }

    /// An error attributed to a request header.
    pub fn at_header(slug: ErrorSlug, header: impl Into<String>) -> Self {
        Self {
            header: Some(header.into()),
            ..Self::new(slug)
        }
    }

    pub fn act_of_god() -> Self {
        Self::new(ErrorSlug::ActOfGod)
    }

    pub fn invalid_format() -> Self {
        Self::at_field(ErrorSlug::InvalidFormat, "/")
    }

    pub fn missing_field(field: &str) -> Self {
        Self::at_field(ErrorSlug::Missing, format!("/{field}"))
    }

    /// The parsed slug, or `None` if it is outside the known vocabulary.
    pub fn kind(&self) -> Option<ErrorSlug> {
        ErrorSlug::parse(&self.slug)
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.slug)?;
        if let Some(field) = &self.field {
            write!(f, " (field {field})")?;
        }
        if let Some(param) = &self.param {
            write!(f, " (param {param})")?;
        }
        if let Some(header) = &self.header {
            write!(f, " (header {header})")?;
        }
        Ok(())
    }
}

// ── Envelope ──────────────────────────────────────────────────────

/// Response body for one collection.
///
/// Serializes the records under `R::COLLECTION`, so a worker response
/// reads `{"workers": [...], "errors": []}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<R> {
    pub items: Vec<R>,
    pub errors: RequestErrors,
}

impl<R> Envelope<R> {
    pub fn one(item: R) -> Self {
        Self {
            items: vec![item],
            errors: RequestErrors::new(),
        }
    }

    pub fn errors(errors: RequestErrors) -> Self {
        Self {
            items: Vec::new(),
            errors,
        }
    }
}

impl<R: Record> Serialize for Envelope<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(R::COLLECTION, &self.items)?;
        map.serialize_entry("errors", &self.errors)?;
        map.end()
    }
}

impl<'de, R: Record> Deserialize<'de> for Envelope<R> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            errors: Option<RequestErrors>,
            #[serde(flatten)]
            rest: serde_json::Map<String, serde_json::Value>,
        }

        let mut raw = Raw::deserialize(deserializer)?;
        let items = match raw.rest.remove(R::COLLECTION) {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(value) => serde_json::from_value(value).map_err(de::Error::custom)?,
        };
        Ok(Self {
            items,
            errors: raw.errors.unwrap_or_default(),
        })
    }
}

/// Error-only body for responses not tied to a collection (auth
/// rejections, unknown routes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub errors: RequestErrors,
}

impl ErrorBody {
    pub fn single(error: RequestError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}
