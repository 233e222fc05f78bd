//! The `Record` trait and the enrichment hooks built on it.
//!
//! A record type names its collection once; the store derives its table,
//! the API layer derives its routes, and the client derives its URLs and
//! envelope key from the same constant.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::wire::RequestErrors;

/// A resource type that can live in a store table.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Table name, URL path segment, and envelope key (e.g. `workers`).
    const COLLECTION: &'static str;

    /// Human-readable singular name (e.g. `worker`).
    const KIND: &'static str;

    /// The record identifier. Empty until assigned at creation.
    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    /// Report required fields that are absent or empty.
    fn validate(&self) -> RequestErrors {
        RequestErrors::new()
    }

    /// Compute derived fields before the record is first inserted.
    ///
    /// Runs inside the creating write transaction: `lookup` sees the same
    /// state the insert will commit against, and an error aborts the
    /// transaction with nothing written.
    fn enrich<L: Lookup>(&mut self, _lookup: &L) -> Result<(), EnrichError> {
        Ok(())
    }
}

/// Point lookups against other tables, used during enrichment.
pub trait Lookup {
    fn find<R: Record>(&self, id: &str) -> Result<Option<R>, LookupError>;
}

/// An engine-level failure while resolving a lookup.
#[derive(Debug, Error)]
#[error("lookup failed: {0}")]
pub struct LookupError(pub String);

/// Errors raised by [`Record::enrich`].
#[derive(Debug, Error)]
pub enum EnrichError {
    /// A referenced record does not exist.
    #[error("unresolved reference at {field}: {id}")]
    UnresolvedReference { field: String, id: String },

    #[error(transparent)]
    Lookup(#[from] LookupError),
}
