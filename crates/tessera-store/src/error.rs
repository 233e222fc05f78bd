//! Error types for the Tessera store and resource services.

use tessera_core::EnrichError;
use thiserror::Error;

/// Result type alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during state store operations.
///
/// `NotFound`, `AlreadyExists` and `UnresolvedReference` are the domain
/// outcomes. Everything the engine reports (transactions, tables, I/O on
/// the backend, serialization) is wrapped into `Internal` with context.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("{table}: {id} not found")]
    NotFound { table: &'static str, id: String },

    #[error("{table}: {id} already exists")]
    AlreadyExists { table: &'static str, id: String },

    #[error("unresolved reference at {field}: {id}")]
    UnresolvedReference { field: String, id: String },

    #[error("internal store error: {0}")]
    Internal(String),
}

impl From<EnrichError> for StateError {
    fn from(err: EnrichError) -> Self {
        match err {
            EnrichError::UnresolvedReference { field, id } => {
                Self::UnresolvedReference { field, id }
            }
            EnrichError::Lookup(e) => Self::Internal(e.to_string()),
        }
    }
}

/// Result type alias for resource service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Outcomes a resource service reports besides success.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The caller supplied an empty identifier.
    #[error("id must be specified")]
    MissingId,

    #[error("{table}: {id} not found")]
    NotFound { table: &'static str, id: String },

    #[error("{table}: {id} already exists")]
    AlreadyExists { table: &'static str, id: String },

    #[error("unresolved reference at {field}: {id}")]
    UnresolvedReference { field: String, id: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StateError> for ServiceError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::NotFound { table, id } => Self::NotFound { table, id },
            StateError::AlreadyExists { table, id } => Self::AlreadyExists { table, id },
            StateError::UnresolvedReference { field, id } => {
                Self::UnresolvedReference { field, id }
            }
            StateError::Internal(msg) => Self::Internal(msg),
        }
    }
}
