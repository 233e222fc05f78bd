//! Resource services: the typed CRUD surface over one store table.
//!
//! A `ResourceService<R>` owns the parts of each operation that are not the
//! store's business: rejecting empty IDs, assigning fresh identifiers on
//! create, trusting the caller-supplied path ID over the body on update,
//! and fetching a record before deleting it so it can be returned.

use std::marker::PhantomData;

use tessera_core::Record;
use tracing::info;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::store::StateStore;

pub struct ResourceService<R> {
    store: StateStore,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: Record> ResourceService<R> {
    pub fn new(store: StateStore) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    pub fn get(&self, id: &str) -> ServiceResult<R> {
        let id = require_id(id)?;
        Ok(self.store.get(id)?)
    }

    /// Store `input` under a newly generated ID, with derived fields
    /// computed. Any ID in `input` is discarded.
    pub fn create(&self, input: R) -> ServiceResult<R> {
        let mut record = input;
        record.set_id(Uuid::new_v4().to_string());
        let created = self.store.create_enriched(record)?;
        info!(kind = R::KIND, id = created.id(), "created");
        Ok(created)
    }

    /// Replace the record at `id` with `input`.
    pub fn update(&self, id: &str, input: R) -> ServiceResult<R> {
        let id = require_id(id)?;
        let mut record = input;
        record.set_id(id.to_string());
        let record = self.store.update(record)?;
        info!(kind = R::KIND, %id, "updated");
        Ok(record)
    }

    /// Delete the record at `id` and return it as it was.
    pub fn delete(&self, id: &str) -> ServiceResult<R> {
        let id = require_id(id)?;
        let existing: R = self.store.get(id)?;
        self.store.delete::<R>(id)?;
        info!(kind = R::KIND, %id, "deleted");
        Ok(existing)
    }
}

fn require_id(id: &str) -> ServiceResult<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ServiceError::MissingId);
    }
    Ok(id)
}
