//! Client error type and the mapping from response errors to it.

use http::StatusCode;
use tessera_core::{ErrorSlug, RequestError, RequestErrors};
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// An ID was required and the caller passed an empty one. Raised
    /// before anything is sent.
    #[error("id must be specified")]
    MissingId,

    #[error("invalid base url {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("server error")]
    Server,

    #[error("invalid format error returned")]
    InvalidFormat,

    #[error("{field} must be set")]
    Missing { field: String },

    #[error("record already exists")]
    AlreadyExists,

    #[error("record not found")]
    NotFound,

    #[error("referenced record at {field} not found")]
    UnresolvedReference { field: String },

    #[error("access denied")]
    AccessDenied,

    #[error("unexpected error in response: {0:?}")]
    Unexpected(RequestErrors),

    #[error("unexpected status {0} with no errors in response")]
    UnexpectedStatus(StatusCode),

    #[error("no record returned in response")]
    EmptyResponse,

    #[error("error serialising request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("error constructing request: {0}")]
    Request(#[from] http::Error),

    #[error("error making request: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("error parsing response body (status {status}): {source}")]
    Decode {
        status: StatusCode,
        source: serde_json::Error,
    },
}

fn matching(errors: &[RequestError], slug: ErrorSlug) -> impl Iterator<Item = &RequestError> {
    errors.iter().filter(move |e| e.kind() == Some(slug))
}

impl ClientError {
    /// Pick the typed error for a non-empty `errors` list. Known pairs are
    /// checked in a fixed order so a server error always wins over field
    /// complaints.
    pub fn from_response_errors(errors: RequestErrors) -> Self {
        if matching(&errors, ErrorSlug::ActOfGod).next().is_some() {
            return Self::Server;
        }
        if matching(&errors, ErrorSlug::InvalidFormat).any(|e| e.field.as_deref() == Some("/")) {
            return Self::InvalidFormat;
        }
        if matching(&errors, ErrorSlug::Conflict).any(|e| e.field.as_deref() == Some("/id")) {
            return Self::AlreadyExists;
        }
        if matching(&errors, ErrorSlug::NotFound).any(|e| e.param.as_deref() == Some("id")) {
            return Self::NotFound;
        }
        if matching(&errors, ErrorSlug::AccessDenied).next().is_some() {
            return Self::AccessDenied;
        }
        if let Some(field) = matching(&errors, ErrorSlug::Missing).find_map(|e| e.field.clone()) {
            return Self::Missing { field };
        }
        if let Some(field) = matching(&errors, ErrorSlug::NotFound).find_map(|e| e.field.clone()) {
            return Self::UnresolvedReference { field };
        }
        Self::Unexpected(errors)
    }
}
