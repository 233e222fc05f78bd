//! tessera-core — shared types for the Tessera resource backend.
//!
//! Everything that both sides of the wire need lives here: the resource
//! record types, the [`Record`] trait that the store and the HTTP layer are
//! generic over, the response envelope and its error taxonomy, and the
//! daemon configuration.

pub mod config;
pub mod record;
pub mod types;
pub mod wire;

pub use config::{ConfigError, ServerConfig};
pub use record::{EnrichError, Lookup, LookupError, Record};
pub use types::*;
pub use wire::{Envelope, ErrorBody, ErrorSlug, RequestError, RequestErrors};
