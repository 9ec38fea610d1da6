//! Database layer for the local replica

mod call_log_store;
mod connection;
mod contact_store;
mod cursor_store;
mod migrations;

use async_trait::async_trait;

pub use call_log_store::SqliteCallLogStore;
pub use connection::Database;
pub use contact_store::SqliteContactStore;
pub use cursor_store::{CursorStore, Domain, SqliteCursorStore, SyncCursor};

use crate::error::Result;
use crate::models::Record;

/// Trait for replica record storage, one implementation per domain
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    /// Insert or replace a batch of records by id
    async fn upsert(&self, records: &[R]) -> Result<()>;

    /// Remove the records with the given ids; missing ids are ignored
    async fn delete_by_ids(&self, ids: &[i64]) -> Result<()>;

    /// Load the whole replica in the domain's display order
    async fn find_all(&self) -> Result<Vec<R>>;

    /// Load the first `limit` records in the domain's display order
    async fn find_page(&self, limit: usize) -> Result<Vec<R>>;

    /// Keyset paging read: every record whose id is strictly below `id`,
    /// in the domain's display order
    async fn find_with_id_less_than(&self, id: i64) -> Result<Vec<R>>;
}
