//! StateStore — redb-backed transactional record store.
//!
//! Provides typed Get/Create/Update/Delete over one table per record type.
//! Write transactions are serialized by redb (single writer) and either
//! commit as a whole or abort with no effect. Reads run on a read
//! transaction and observe the state committed when it began; they never
//! block a writer and are never blocked by one.

use std::sync::Arc;

use redb::{Database, ReadTransaction, ReadableDatabase, ReadableTable, TableError, WriteTransaction};
use tessera_core::{Lookup, LookupError, Record};
use tracing::{debug, warn};

use crate::error::{StateError, StateResult};
use crate::tables::{self, index_key, table};

/// Convert any `Display` error into `StateError::Internal` with context.
macro_rules! internal {
    ($context:literal) => {
        |e| StateError::Internal(format!(concat!($context, ": {}"), e))
    };
}

/// Thread-safe in-memory record store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Create an empty in-memory store with a table for every built-in
    /// record type.
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(internal!("open database"))?;
        let store = Self { db: Arc::new(db) };
        store.write(|txn| tables::create_builtin(txn).map_err(internal!("create tables")))?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create the table for a record type that is not built in.
    pub fn ensure_table<R: Record>(&self) -> StateResult<()> {
        self.write(|txn| {
            txn.open_table(table::<R>()).map_err(internal!("open table"))?;
            Ok(())
        })
    }

    /// Begin a read transaction.
    pub fn snapshot(&self) -> StateResult<Snapshot> {
        let txn = self.db.begin_read().map_err(internal!("begin read"))?;
        Ok(Snapshot { txn })
    }

    // ── Operations ─────────────────────────────────────────────────

    /// Get a record by ID from the latest committed state.
    pub fn get<R: Record>(&self, id: &str) -> StateResult<R> {
        self.snapshot()?.get(id)
    }

    /// Insert a new record. Fails with `AlreadyExists` if its ID is taken.
    pub fn create<R: Record>(&self, record: &R) -> StateResult<()> {
        self.write(|txn| insert_absent(txn, record))?;
        debug!(table = R::COLLECTION, id = record.id(), "record created");
        Ok(())
    }

    /// Enrich a new record and insert it, both inside one write
    /// transaction. Returns the record as stored.
    pub fn create_enriched<R: Record>(&self, record: R) -> StateResult<R> {
        let mut record = record;
        self.write(|txn| {
            record.enrich(&WriteView { txn })?;
            insert_absent(txn, &record)
        })?;
        debug!(table = R::COLLECTION, id = record.id(), "record created");
        Ok(record)
    }

    /// Replace an existing record wholesale. Fails with `NotFound` if no
    /// record has its ID. The stored ID keeps the casing it was created
    /// with; the returned record is the one now stored.
    pub fn update<R: Record>(&self, record: R) -> StateResult<R> {
        let mut record = record;
        self.write(|txn| {
            let mut table = txn.open_table(table::<R>()).map_err(internal!("open table"))?;
            let key = index_key(record.id());
            let stored_id = match table.get(key.as_str()).map_err(internal!("read"))? {
                Some(guard) => {
                    let existing: R =
                        serde_json::from_slice(guard.value()).map_err(internal!("deserialize"))?;
                    existing.id().to_string()
                }
                None => {
                    return Err(StateError::NotFound {
                        table: R::COLLECTION,
                        id: record.id().to_string(),
                    });
                }
            };
            record.set_id(stored_id);
            let value = serde_json::to_vec(&record).map_err(internal!("serialize"))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(internal!("write"))?;
            Ok(())
        })?;
        debug!(table = R::COLLECTION, id = record.id(), "record updated");
        Ok(record)
    }

    /// Remove a record. Fails with `NotFound` if no record has the ID.
    pub fn delete<R: Record>(&self, id: &str) -> StateResult<()> {
        self.write(|txn| {
            let mut table = txn.open_table(table::<R>()).map_err(internal!("open table"))?;
            let removed = table
                .remove(index_key(id).as_str())
                .map_err(internal!("write"))?
                .is_some();
            if !removed {
                return Err(StateError::NotFound {
                    table: R::COLLECTION,
                    id: id.to_string(),
                });
            }
            Ok(())
        })?;
        debug!(table = R::COLLECTION, %id, "record deleted");
        Ok(())
    }

    /// Run `op` in a write transaction: commit if it succeeds, abort
    /// otherwise.
    fn write<T>(&self, op: impl FnOnce(&WriteTransaction) -> StateResult<T>) -> StateResult<T> {
        let txn = self.db.begin_write().map_err(internal!("begin write"))?;
        match op(&txn) {
            Ok(value) => {
                txn.commit().map_err(internal!("commit"))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(abort_err) = txn.abort() {
                    warn!(error = %abort_err, "write transaction abort failed");
                }
                Err(err)
            }
        }
    }
}

/// Insert `record` unless its ID is already present.
fn insert_absent<R: Record>(txn: &WriteTransaction, record: &R) -> StateResult<()> {
    let mut table = txn.open_table(table::<R>()).map_err(internal!("open table"))?;
    let key = index_key(record.id());
    let exists = table
        .get(key.as_str())
        .map_err(internal!("read"))?
        .is_some();
    if exists {
        return Err(StateError::AlreadyExists {
            table: R::COLLECTION,
            id: record.id().to_string(),
        });
    }
    let value = serde_json::to_vec(record).map_err(internal!("serialize"))?;
    table
        .insert(key.as_str(), value.as_slice())
        .map_err(internal!("write"))?;
    Ok(())
}

// ── Snapshot ───────────────────────────────────────────────────────

/// A read transaction: a consistent view of the state committed at the
/// moment it began. Writes committed afterwards are invisible to it.
pub struct Snapshot {
    txn: ReadTransaction,
}

impl Snapshot {
    /// Get a record by ID as of this snapshot.
    pub fn get<R: Record>(&self, id: &str) -> StateResult<R> {
        self.find(id)?.ok_or_else(|| StateError::NotFound {
            table: R::COLLECTION,
            id: id.to_string(),
        })
    }

    fn find<R: Record>(&self, id: &str) -> StateResult<Option<R>> {
        let table = match self.txn.open_table(table::<R>()) {
            Ok(table) => table,
            // A table nobody has written to reads as empty.
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(StateError::Internal(format!("open table: {e}"))),
        };
        let Some(guard) = table.get(index_key(id).as_str()).map_err(internal!("read"))? else {
            return Ok(None);
        };
        let record = serde_json::from_slice(guard.value()).map_err(internal!("deserialize"))?;
        Ok(Some(record))
    }
}

impl Lookup for Snapshot {
    fn find<R: Record>(&self, id: &str) -> Result<Option<R>, LookupError> {
        Snapshot::find(self, id).map_err(|e| LookupError(e.to_string()))
    }
}

/// Lookups inside an in-flight write transaction.
struct WriteView<'a> {
    txn: &'a WriteTransaction,
}

impl Lookup for WriteView<'_> {
    fn find<R: Record>(&self, id: &str) -> Result<Option<R>, LookupError> {
        let table = self.txn.open_table(table::<R>()).map_err(lookup_err)?;
        let Some(guard) = table.get(index_key(id).as_str()).map_err(lookup_err)? else {
            return Ok(None);
        };
        let record = serde_json::from_slice(guard.value()).map_err(lookup_err)?;
        Ok(Some(record))
    }
}

fn lookup_err(e: impl std::fmt::Display) -> LookupError {
    LookupError(e.to_string())
}
