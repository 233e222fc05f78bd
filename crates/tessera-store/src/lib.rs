//! tessera-store — transactional multi-table resource store for Tessera.
//!
//! Backed by [redb](https://docs.rs/redb) on its in-memory backend: one
//! table per record type, keyed by the lowercased record ID, values
//! JSON-serialized into `&[u8]` columns. Nothing survives the process.
//!
//! # Architecture
//!
//! ```text
//! ResourceService<R>          ID assignment, MissingId, fetch-then-delete
//!   └── StateStore            Get / Create / Update / Delete per table
//!         ├── write txn       serialized, commit or abort as one unit
//!         └── Snapshot        read txn, sees state committed at begin
//! ```
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and is constructed once at startup, then handed to every service.

pub mod error;
pub mod service;
pub mod store;
pub mod tables;

pub use error::{ServiceError, ServiceResult, StateError, StateResult};
pub use service::ResourceService;
pub use store::{Snapshot, StateStore};
