//! redb table definitions for the Tessera store.
//!
//! Every record type gets one table named after its collection, with `&str`
//! keys (the lowercased record ID) and `&[u8]` values (JSON).

use redb::{TableDefinition, TableError, WriteTransaction};
use tessera_core::{
    ComputeCluster, Record, Speaker, StorageCluster, Talk, TenantGateway, Worker, Workshop,
};

/// Table definition for a record type.
pub fn table<R: Record>() -> TableDefinition<'static, &'static str, &'static [u8]> {
    TableDefinition::new(R::COLLECTION)
}

/// Key under which a record ID is indexed. IDs are case-insensitive.
pub fn index_key(id: &str) -> String {
    id.to_lowercase()
}

/// Create the tables for every built-in record type.
pub(crate) fn create_builtin(txn: &WriteTransaction) -> Result<(), TableError> {
    // Opening a table in a write transaction creates it if absent.
    txn.open_table(table::<StorageCluster>())?;
    txn.open_table(table::<ComputeCluster>())?;
    txn.open_table(table::<Worker>())?;
    txn.open_table(table::<TenantGateway>())?;
    txn.open_table(table::<Speaker>())?;
    txn.open_table(table::<Talk>())?;
    txn.open_table(table::<Workshop>())?;
    Ok(())
}
