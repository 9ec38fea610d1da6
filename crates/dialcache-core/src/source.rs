//! Collaborator contracts for the authoritative external source.
//!
//! Implementations wrap whatever platform API owns the records (a
//! content-provider bridge on device, a fixture in tests). Results are
//! point-in-time reads; an `Ok` empty result means "no change observed
//! this pass", while `Err` means the source could not be queried at all
//! and the pass must abort without advancing the sync cursor.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CallLogRecord, Record};

/// Read/delete access to one externally-owned record set.
#[async_trait]
pub trait SourceAdapter<R: Record>: Send + Sync {
    /// Fetch all records, optionally capped to the first `page_limit`
    /// rows in the source's default order.
    async fn query_all(&self, page_limit: Option<usize>) -> Result<Vec<R>>;

    /// Fetch records added or modified after `timestamp` (source clock, ms).
    async fn query_updated_since(&self, timestamp: i64) -> Result<Vec<R>>;

    /// Enumerate every id currently present in the source. This is the
    /// only deletion signal available: absence here is a tombstone.
    async fn query_all_ids(&self) -> Result<HashSet<i64>>;

    /// Delete a record at the source. Returns `false` when the source
    /// refused or the row was already gone.
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// Phone-number to contact-id resolution, offered by the contact domain
/// to call-log adapters.
#[async_trait]
pub trait PhoneLookup: Send + Sync {
    /// Resolve each number to a contact id. Numbers matching no contact
    /// are simply absent from the returned map.
    async fn resolve_contact_ids(&self, numbers: &[String]) -> Result<HashMap<String, i64>>;
}

/// Attach resolved contact ids to a freshly queried call-log batch.
/// Unresolved numbers keep contact id 0.
pub async fn assign_contact_ids(
    records: &mut [CallLogRecord],
    lookup: &dyn PhoneLookup,
) -> Result<()> {
    let mut numbers: Vec<String> = records.iter().map(|r| r.phone_number.clone()).collect();
    numbers.sort_unstable();
    numbers.dedup();

    let resolved = lookup.resolve_contact_ids(&numbers).await?;
    for record in records.iter_mut() {
        record.contact_id = resolved.get(&record.phone_number).copied().unwrap_or(0);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    struct FixtureLookup(HashMap<String, i64>);

    #[async_trait]
    impl PhoneLookup for FixtureLookup {
        async fn resolve_contact_ids(
            &self,
            numbers: &[String],
        ) -> Result<HashMap<String, i64>> {
            Ok(numbers
                .iter()
                .filter_map(|n| self.0.get(n).map(|id| (n.clone(), *id)))
                .collect())
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_assign_contact_ids() {
        let lookup = FixtureLookup(HashMap::from([("555-0100".to_string(), 42)]));
        let mut records = vec![
            CallLogRecord::new(1, "555-0100", 1_000),
            CallLogRecord::new(2, "555-0199", 2_000),
            CallLogRecord::new(3, "555-0100", 3_000),
        ];

        assign_contact_ids(&mut records, &lookup).await.unwrap();

        assert_eq!(records[0].contact_id, 42);
        assert_eq!(records[1].contact_id, 0);
        assert_eq!(records[2].contact_id, 42);
    }
}
