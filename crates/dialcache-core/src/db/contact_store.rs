//! Contact replica store

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use async_trait::async_trait;
use rusqlite::params;

use crate::error::Result;
use crate::models::{ContactDetails, ContactRecord};

use super::{Database, RecordStore};

/// `SQLite` store for the contact directory replica.
///
/// Display order is case-insensitive name, then id, so paged reads and
/// full reads agree on which records come first.
#[derive(Clone)]
pub struct SqliteContactStore {
    db: Database,
}

impl SqliteContactStore {
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    fn parse_contact(row: &rusqlite::Row<'_>) -> rusqlite::Result<ContactRecord> {
        let details: String = row.get(6)?;
        Ok(ContactRecord {
            contact_id: row.get(0)?,
            display_name: row.get(1)?,
            nickname: row.get(2)?,
            note: row.get(3)?,
            last_updated: row.get(4)?,
            avatar: row.get(5)?,
            // A malformed blob from an older build degrades to empty
            // details rather than poisoning the whole read.
            details: serde_json::from_str::<ContactDetails>(&details).unwrap_or_default(),
        })
    }
}

const SELECT_COLUMNS: &str =
    "contact_id, display_name, nickname, note, last_updated, avatar, details";

#[async_trait]
impl RecordStore<ContactRecord> for SqliteContactStore {
    async fn upsert(&self, records: &[ContactRecord]) -> Result<()> {
        let records = records.to_vec();
        self.db
            .execute(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare_cached(
                        "INSERT OR REPLACE INTO contacts
                         (contact_id, display_name, nickname, note, last_updated, avatar, details)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    )?;
                    for record in &records {
                        let details = serde_json::to_string(&record.details)?;
                        stmt.execute(params![
                            record.contact_id,
                            record.display_name,
                            record.nickname,
                            record.note,
                            record.last_updated,
                            record.avatar,
                            details,
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
                    let mut stmt = tx.prepare_cached("DELETE FROM contacts WHERE contact_id = ?1")?;
                    for id in &ids {
                        stmt.execute(params![id])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
    }

    async fn find_all(&self) -> Result<Vec<ContactRecord>> {
        self.db
            .execute(|conn| {
                let mut stmt = conn.prepare_cached(&format!(
                    "SELECT {SELECT_COLUMNS} FROM contacts
                     ORDER BY display_name COLLATE NOCASE ASC, contact_id ASC"
                ))?;
                let rows = stmt.query_map([], Self::parse_contact)?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await
    }

    async fn find_page(&self, limit: usize) -> Result<Vec<ContactRecord>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare_cached(&format!(
                    "SELECT {SELECT_COLUMNS} FROM contacts
                     ORDER BY display_name COLLATE NOCASE ASC, contact_id ASC
                     LIMIT ?1"
                ))?;
                let rows = stmt.query_map(params![limit as i64], Self::parse_contact)?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await
    }

    async fn find_with_id_less_than(&self, id: i64) -> Result<Vec<ContactRecord>> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare_cached(&format!(
                    "SELECT {SELECT_COLUMNS} FROM contacts
                     WHERE contact_id < ?1
                     ORDER BY display_name COLLATE NOCASE ASC, contact_id ASC"
                ))?;
                let rows = stmt.query_map(params![id], Self::parse_contact)?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    async fn setup() -> SqliteContactStore {
        SqliteContactStore::new(Database::open_in_memory().unwrap())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_upsert_and_find_all_sorted() {
        let store = setup().await;
        store
            .upsert(&[
                ContactRecord::new(1, "zoe"),
                ContactRecord::new(2, "Ada"),
                ContactRecord::new(3, "mia"),
            ])
            .await
            .unwrap();

        let all = store.find_all().await.unwrap();
        let names: Vec<&str> = all.iter().map(|c| c.display_name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "mia", "zoe"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_upsert_replaces_by_id() {
        let store = setup().await;
        store.upsert(&[ContactRecord::new(1, "Ada")]).await.unwrap();

        let mut updated = ContactRecord::new(1, "Ada Lovelace");
        updated.nickname = "The Countess".into();
        store.upsert(&[updated]).await.unwrap();

        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].display_name, "Ada Lovelace");
        assert_eq!(all[0].nickname, "The Countess");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_details_roundtrip() {
        let store = setup().await;
        let mut contact = ContactRecord::new(7, "Grace");
        contact
            .details
            .phones
            .push(crate::models::LabeledValue::new("mobile", "555-0100"));
        contact.avatar = Some(vec![0xff, 0xd8, 0xff]);

        store.upsert(std::slice::from_ref(&contact)).await.unwrap();

        let all = store.find_all().await.unwrap();
        assert_eq!(all[0], contact);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete_by_ids_ignores_missing() {
        let store = setup().await;
        store
            .upsert(&[ContactRecord::new(1, "Ada"), ContactRecord::new(2, "Grace")])
            .await
            .unwrap();

        store.delete_by_ids(&[2, 99]).await.unwrap();

        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].contact_id, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_find_page_follows_display_order() {
        let store = setup().await;
        store
            .upsert(&[
                ContactRecord::new(5, "Edsger"),
                ContactRecord::new(2, "Ada"),
                ContactRecord::new(9, "Grace"),
            ])
            .await
            .unwrap();

        let page = store.find_page(2).await.unwrap();
        let names: Vec<&str> = page.iter().map(|c| c.display_name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Edsger"]);

        let below = store.find_with_id_less_than(9).await.unwrap();
        let ids: Vec<i64> = below.iter().map(|c| c.contact_id).collect();
        assert_eq!(ids, vec![2, 5]);
    }
}
