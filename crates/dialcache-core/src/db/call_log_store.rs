//! Call-log replica store

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use async_trait::async_trait;
use rusqlite::params;

use crate::error::Result;
use crate::models::{CallLogRecord, CallType};

use super::{Database, RecordStore};

/// `SQLite` store for the call-log history replica.
///
/// Display order is newest-first by call timestamp, ties broken by id,
/// matching the order the source hands records out in.
#[derive(Clone)]
pub struct SqliteCallLogStore {
    db: Database,
}

impl SqliteCallLogStore {
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    fn parse_call(row: &rusqlite::Row<'_>) -> rusqlite::Result<CallLogRecord> {
        Ok(CallLogRecord {
            call_log_id: row.get(0)?,
            contact_id: row.get(1)?,
            phone_number: row.get(2)?,
            cached_name: row.get(3)?,
            timestamp: row.get(4)?,
            date: row.get(5)?,
            time: row.get(6)?,
            duration_secs: row.get(7)?,
            call_type: CallType::from_raw(row.get(8)?),
            region: row.get(9)?,
            sim_label: row.get(10)?,
        })
    }
}

const SELECT_COLUMNS: &str = "call_log_id, contact_id, phone_number, cached_name, timestamp, \
                              date, time, duration_secs, call_type, region, sim_label";

#[async_trait]
impl RecordStore<CallLogRecord> for SqliteCallLogStore {
    async fn upsert(&self, records: &[CallLogRecord]) -> Result<()> {
        let records = records.to_vec();
        self.db
            .execute(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare_cached(
                        "INSERT OR REPLACE INTO call_log
                         (call_log_id, contact_id, phone_number, cached_name, timestamp,
                          date, time, duration_secs, call_type, region, sim_label)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                    )?;
                    for record in &records {
                        stmt.execute(params![
                            record.call_log_id,
                            record.contact_id,
                            record.phone_number,
                            record.cached_name,
                            record.timestamp,
                            record.date,
                            record.time,
                            record.duration_secs,
                            record.call_type.as_raw(),
                            record.region,
                            record.sim_label,
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
    }

    async fn delete_by_ids(&self, ids: &[i64]) -> Result<()> {
        let ids = ids.to_vec();
        self.db
            .execute(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut stmt =
                        tx.prepare_cached("DELETE FROM call_log WHERE call_log_id = ?1")?;
                    for id in &ids {
                        stmt.execute(params![id])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
    }

    async fn find_all(&self) -> Result<Vec<CallLogRecord>> {
        self.db
            .execute(|conn| {
                let mut stmt = conn.prepare_cached(&format!(
                    "SELECT {SELECT_COLUMNS} FROM call_log
                     ORDER BY timestamp DESC, call_log_id DESC"
                ))?;
                let rows = stmt.query_map([], Self::parse_call)?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await
    }

    async fn find_page(&self, limit: usize) -> Result<Vec<CallLogRecord>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare_cached(&format!(
                    "SELECT {SELECT_COLUMNS} FROM call_log
                     ORDER BY timestamp DESC, call_log_id DESC
                     LIMIT ?1"
                ))?;
                let rows = stmt.query_map(params![limit as i64], Self::parse_call)?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await
    }

    async fn find_with_id_less_than(&self, id: i64) -> Result<Vec<CallLogRecord>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare_cached(&format!(
                    "SELECT {SELECT_COLUMNS} FROM call_log
                     WHERE call_log_id < ?1
                     ORDER BY timestamp DESC, call_log_id DESC"
                ))?;
                let rows = stmt.query_map(params![id], Self::parse_call)?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    async fn setup() -> SqliteCallLogStore {
        SqliteCallLogStore::new(Database::open_in_memory().unwrap())
    }

    fn call(id: i64, number: &str, timestamp: i64) -> CallLogRecord {
        CallLogRecord::new(id, number, timestamp)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_find_all_newest_first() {
        let store = setup().await;
        store
            .upsert(&[
                call(1, "555-0100", 1_000),
                call(2, "555-0101", 3_000),
                call(3, "555-0102", 2_000),
            ])
            .await
            .unwrap();

        let all = store.find_all().await.unwrap();
        let ids: Vec<i64> = all.iter().map(|c| c.call_log_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_call_type_roundtrip() {
        let store = setup().await;
        let mut record = call(1, "555-0100", 1_000);
        record.call_type = CallType::Missed;
        record.duration_secs = 42;
        record.sim_label = "SIM 2".into();

        store.upsert(std::slice::from_ref(&record)).await.unwrap();

        let all = store.find_all().await.unwrap();
        assert_eq!(all[0], record);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_upsert_replaces_and_delete_removes() {
        let store = setup().await;
        store
            .upsert(&[call(1, "555-0100", 1_000), call(2, "555-0101", 2_000)])
            .await
            .unwrap();

        let mut updated = call(1, "555-0100", 1_000);
        updated.cached_name = "Ada".into();
        store.upsert(&[updated]).await.unwrap();
        store.delete_by_ids(&[2]).await.unwrap();

        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].cached_name, "Ada");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_paged_reads() {
        let store = setup().await;
        store
            .upsert(&[
                call(10, "555-0100", 5_000),
                call(11, "555-0101", 4_000),
                call(12, "555-0102", 3_000),
            ])
            .await
            .unwrap();

        let page = store.find_page(2).await.unwrap();
        let ids: Vec<i64> = page.iter().map(|c| c.call_log_id).collect();
        assert_eq!(ids, vec![10, 11]);

        let rest = store.find_with_id_less_than(12).await.unwrap();
        let ids: Vec<i64> = rest.iter().map(|c| c.call_log_id).collect();
        assert_eq!(ids, vec![10, 11]);
    }
}
