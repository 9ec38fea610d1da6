//! Per-domain sync cursor persistence

use std::fmt;

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use crate::error::Result;

use super::Database;

/// The two independently synced record sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Contacts,
    CallLog,
}

impl Domain {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contacts => "contacts",
            Self::CallLog => "call_log",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Watermark state for one sync domain.
///
/// `last_sync` is the source-clock time of the last completed pass;
/// `first_run` distinguishes "never bootstrapped" from "synced up to
/// time zero".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncCursor {
    pub last_sync: i64,
    pub first_run: bool,
}

impl Default for SyncCursor {
    fn default() -> Self {
        Self {
            last_sync: 0,
            first_run: true,
        }
    }
}

/// Trait for cursor storage
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Load the cursor for a domain, defaulting when never written
    async fn load(&self, domain: Domain) -> Result<SyncCursor>;

    /// Persist the cursor for a domain
    async fn save(&self, domain: Domain, cursor: SyncCursor) -> Result<()>;
}

/// `SQLite` implementation backed by the meta key/value table
#[derive(Clone)]
pub struct SqliteCursorStore {
    db: Database,
}

impl SqliteCursorStore {
    pub const fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CursorStore for SqliteCursorStore {
    async fn load(&self, domain: Domain) -> Result<SyncCursor> {
        self.db
            .execute(move |conn| {
                let get = |key: String| -> Result<Option<String>> {
                    Ok(conn
                        .query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| {
                            row.get(0)
                        })
                        .optional()?)
                };

                let last_sync = get(format!("{domain}.last_sync"))?
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
                let first_run = get(format!("{domain}.first_run"))?
                    .map_or(true, |v| v == "1");

                Ok(SyncCursor {
                    last_sync,
                    first_run,
                })
            })
            .await
    }

    async fn save(&self, domain: Domain, cursor: SyncCursor) -> Result<()> {
        self.db
            .execute(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
                    params![format!("{domain}.last_sync"), cursor.last_sync.to_string()],
                )?;
                tx.execute(
                    "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
                    params![
                        format!("{domain}.first_run"),
                        if cursor.first_run { "1" } else { "0" }
                    ],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_load_defaults_when_never_written() {
        let store = SqliteCursorStore::new(Database::open_in_memory().unwrap());
        let cursor = store.load(Domain::Contacts).await.unwrap();
        assert_eq!(cursor, SyncCursor::default());
        assert!(cursor.first_run);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_save_then_load_roundtrip() {
        let store = SqliteCursorStore::new(Database::open_in_memory().unwrap());
        let cursor = SyncCursor {
            last_sync: 1_700_000_000_000,
            first_run: false,
        };

        store.save(Domain::CallLog, cursor).await.unwrap();

        assert_eq!(store.load(Domain::CallLog).await.unwrap(), cursor);
        // Domains do not share cursors
        assert_eq!(
            store.load(Domain::Contacts).await.unwrap(),
            SyncCursor::default()
        );
    }
}
