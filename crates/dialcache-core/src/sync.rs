//! Per-domain sync orchestration.
//!
//! One orchestrator owns one domain's replica: it runs the bootstrap or
//! warm-start publish sequence, then incremental passes whenever the
//! change listener fires. Consumers observe the replica through a watch
//! channel carrying immutable snapshots in display order.
//!
//! Ordering contract per pass: persist to the store, advance the sync
//! cursor, then publish. A crash between persist and publish costs one
//! stale snapshot, never durable data.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::db::{CursorStore, Domain, RecordStore, SyncCursor};
use crate::error::{Error, Result};
use crate::models::{CallLogRecord, ContactRecord, Record};
use crate::notify::ChangeListener;
use crate::reconcile::reconcile;
use crate::source::SourceAdapter;

/// Records published eagerly before the rest of a bootstrap load
pub const DEFAULT_PAGE_LIMIT: usize = 20;

/// Drives one sync domain against its adapter and store
pub struct SyncOrchestrator<R, A, S>
where
    R: Record,
{
    domain: Domain,
    adapter: Arc<A>,
    store: Arc<S>,
    cursors: Arc<dyn CursorStore>,
    snapshot_tx: watch::Sender<Arc<Vec<R>>>,
    // Held across a whole pass; one pass per domain at a time.
    state: Mutex<HashMap<i64, R>>,
    sort: fn(&mut [R]),
    page_limit: usize,
}

impl<R, A, S> SyncOrchestrator<R, A, S>
where
    R: Record,
    A: SourceAdapter<R> + 'static,
    S: RecordStore<R> + 'static,
{
    pub fn new(
        domain: Domain,
        adapter: Arc<A>,
        store: Arc<S>,
        cursors: Arc<dyn CursorStore>,
        sort: fn(&mut [R]),
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            domain,
            adapter,
            store,
            cursors,
            snapshot_tx,
            state: Mutex::new(HashMap::new()),
            sort,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    /// Observe snapshot publications. The receiver always starts with
    /// the latest published value.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<R>>> {
        self.snapshot_tx.subscribe()
    }

    /// The most recently published snapshot
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<R>> {
        self.snapshot_tx.borrow().clone()
    }

    /// First-publish sequence. On the very first run this pages the
    /// source (first page published early, then the full set); on a warm
    /// start it serves the persisted replica immediately and catches up
    /// against the source afterwards.
    pub async fn initialize(&self) -> Result<()> {
        let cursor = self.cursors.load(self.domain).await?;
        let mut state = self.state.lock().await;

        if cursor.first_run {
            tracing::info!(domain = %self.domain, "bootstrapping replica from source");
            self.bootstrap(&mut state).await
        } else {
            tracing::debug!(domain = %self.domain, "warm start from persisted replica");
            self.warm_start(&mut state, cursor).await
        }
    }

    async fn bootstrap(&self, state: &mut HashMap<i64, R>) -> Result<()> {
        let started_at = now_millis();

        let page = self.adapter.query_all(Some(self.page_limit)).await?;
        self.store.upsert(&page).await?;
        *state = page.into_iter().map(|r| (r.id(), r)).collect();
        self.publish(state);

        let full = self.adapter.query_all(None).await?;
        let full_ids = full.iter().map(Record::id).collect();
        let recon = reconcile(state, full, Some(&full_ids));
        self.store.upsert(&recon.changed()).await?;
        let removed: Vec<i64> = recon.removed_ids.iter().copied().collect();
        self.store.delete_by_ids(&removed).await?;
        *state = recon.state;
        self.publish(state);

        self.cursors
            .save(
                self.domain,
                SyncCursor {
                    last_sync: started_at,
                    first_run: false,
                },
            )
            .await?;

        tracing::info!(domain = %self.domain, records = state.len(), "bootstrap complete");
        Ok(())
    }

    async fn warm_start(&self, state: &mut HashMap<i64, R>, cursor: SyncCursor) -> Result<()> {
        let page = self.store.find_page(self.page_limit).await?;
        *state = page.into_iter().map(|r| (r.id(), r)).collect();
        self.publish(state);

        let full = self.store.find_all().await?;
        *state = full.into_iter().map(|r| (r.id(), r)).collect();
        self.publish(state);

        // Catch up on whatever changed while we were down. The cached
        // replica stays served even if the source is unreachable.
        match self.pass(state, cursor).await {
            Ok(()) => Ok(()),
            Err(Error::SourceUnavailable(reason)) => {
                tracing::warn!(domain = %self.domain, "catch-up pass skipped: {reason}");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Run one incremental pass now. Passes serialize on the state lock.
    pub async fn incremental_pass(&self) -> Result<()> {
        let cursor = self.cursors.load(self.domain).await?;
        let mut state = self.state.lock().await;
        self.pass(&mut state, cursor).await
    }

    async fn pass(&self, state: &mut HashMap<i64, R>, cursor: SyncCursor) -> Result<()> {
        let started_at = now_millis();

        let delta = self.adapter.query_updated_since(cursor.last_sync).await?;
        let full_ids = self.adapter.query_all_ids().await?;

        let recon = reconcile(state, delta, Some(&full_ids));
        if !recon.is_noop() {
            self.store.upsert(&recon.changed()).await?;
            let removed: Vec<i64> = recon.removed_ids.iter().copied().collect();
            self.store.delete_by_ids(&removed).await?;
        }

        self.cursors
            .save(
                self.domain,
                SyncCursor {
                    last_sync: started_at,
                    first_run: false,
                },
            )
            .await?;

        if recon.is_noop() {
            tracing::debug!(domain = %self.domain, "pass observed no changes");
        } else {
            tracing::debug!(
                domain = %self.domain,
                added = recon.added.len(),
                updated = recon.updated.len(),
                removed = recon.removed_ids.len(),
                "pass applied changes"
            );
            *state = recon.state;
            self.publish(state);
        }
        Ok(())
    }

    /// Spawn the observation loop: one incremental pass per conflated
    /// change trigger, until cancelled or the notifier side is dropped.
    /// Pass failures are logged and absorbed; the next trigger retries.
    pub fn start_observing(
        self: Arc<Self>,
        mut listener: ChangeListener,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    changed = listener.changed() => {
                        if !changed {
                            break;
                        }
                        if let Err(e) = self.incremental_pass().await {
                            tracing::warn!(domain = %self.domain, "sync pass failed: {e}");
                        }
                    }
                }
            }
            tracing::debug!(domain = %self.domain, "sync observer stopped");
        })
    }

    /// Delete a record at the source, then mirror the removal locally.
    /// If the source refuses, the replica is left untouched.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut state = self.state.lock().await;

        let accepted = match self.adapter.delete(id).await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!(domain = %self.domain, "source delete errored: {e}");
                false
            }
        };
        if !accepted {
            return Err(Error::DeleteFailed(id));
        }

        self.store.delete_by_ids(&[id]).await?;
        if state.remove(&id).is_some() {
            self.publish(&state);
        }
        Ok(())
    }

    fn publish(&self, state: &HashMap<i64, R>) {
        let mut records: Vec<R> = state.values().cloned().collect();
        (self.sort)(&mut records);
        self.snapshot_tx.send_replace(Arc::new(records));
    }
}

/// Display order for contact snapshots: case-insensitive name, then id
pub fn contact_order(records: &mut [ContactRecord]) {
    records.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
            .then(a.contact_id.cmp(&b.contact_id))
    });
}

/// Display order for call-log snapshots: newest first, then id descending
pub fn call_log_order(records: &mut [CallLogRecord]) {
    records.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then(b.call_log_id.cmp(&a.call_log_id))
    });
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
