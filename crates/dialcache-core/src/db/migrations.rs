//! Database migrations

use rusqlite::Connection;

use crate::error::Result;

/// Current schema version
const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations
pub fn run(conn: &mut Connection) -> Result<()> {
    let version = get_version(conn)?;

    if version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

/// Get the current schema version
fn get_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    Ok(version)
}

/// Migration to version 1: Initial schema
fn migrate_v1(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );

        -- Contact directory replica
        CREATE TABLE IF NOT EXISTS contacts (
            contact_id INTEGER PRIMARY KEY,
            display_name TEXT NOT NULL,
            nickname TEXT NOT NULL DEFAULT '',
            note TEXT NOT NULL DEFAULT '',
            last_updated INTEGER NOT NULL DEFAULT 0,
            avatar BLOB,
            details TEXT NOT NULL DEFAULT '{}'
        );
        CREATE INDEX IF NOT EXISTS idx_contacts_name ON contacts(display_name COLLATE NOCASE);
        CREATE INDEX IF NOT EXISTS idx_contacts_updated ON contacts(last_updated DESC);

        -- Call-log history replica
        CREATE TABLE IF NOT EXISTS call_log (
            call_log_id INTEGER PRIMARY KEY,
            contact_id INTEGER NOT NULL DEFAULT 0,
            phone_number TEXT NOT NULL,
            cached_name TEXT NOT NULL DEFAULT '',
            timestamp INTEGER NOT NULL,
            date TEXT NOT NULL DEFAULT '',
            time TEXT NOT NULL DEFAULT '',
            duration_secs INTEGER NOT NULL DEFAULT 0,
            call_type INTEGER NOT NULL DEFAULT 1,
            region TEXT NOT NULL DEFAULT '',
            sim_label TEXT NOT NULL DEFAULT ''
        );
        CREATE INDEX IF NOT EXISTS idx_call_log_timestamp ON call_log(timestamp DESC);
        CREATE INDEX IF NOT EXISTS idx_call_log_number ON call_log(phone_number);
        CREATE INDEX IF NOT EXISTS idx_call_log_contact ON call_log(contact_id);

        -- Sync cursors and other per-domain bookkeeping
        CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        INSERT INTO schema_version (version) VALUES (1);",
    )?;

    tx.commit()?;

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_migrations() {
        let mut conn = setup();
        run(&mut conn).unwrap();

        let version = get_version(&conn).unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_migrations_idempotent() {
        let mut conn = setup();
        run(&mut conn).unwrap();
        run(&mut conn).unwrap(); // Should not fail

        let version = get_version(&conn).unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_migration_v1_creates_tables() {
        let mut conn = setup();
        run(&mut conn).unwrap();

        for table in ["contacts", "call_log", "meta"] {
            let exists: bool = conn
                .query_row(
                    "SELECT EXISTS(
                        SELECT 1 FROM sqlite_master
                        WHERE type = 'table' AND name = ?1
                    )",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert!(exists, "missing table {table}");
        }
    }
}
