//! Call-log classification.
//!
//! Turns a timestamp-descending call-log snapshot into display items
//! under one of three grouping modes, then labels the first item of
//! each day bucket (today, yesterday, earlier). Classification is pure;
//! it never touches the store.

use std::collections::HashMap;

use chrono::{Local, NaiveDate, TimeZone};
use serde::Serialize;

use crate::models::CallLogRecord;

/// Grouping strategy for the call-log view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayMode {
    /// One item per call, in input order
    Timeline,
    /// All calls from the same party collapse into one item
    #[default]
    Merged,
    /// Adjacent calls from the same party collapse; a call from someone
    /// else breaks the run
    ContinuousMerge,
}

/// Day bucket for section labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    Today,
    Yesterday,
    Earlier,
}

impl TimeBucket {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Yesterday => "Yesterday",
            Self::Earlier => "Earlier",
        }
    }
}

/// Aggregate facts about one display item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallSummary {
    /// The call shown for the group (newest for Merged, first for the
    /// other modes)
    pub representative: CallLogRecord,
    pub call_count: usize,
    /// Sum of the group's call durations, in seconds
    pub total_duration_secs: i64,
}

/// One rendered row of the call-log view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallLogItem {
    pub records: Vec<CallLogRecord>,
    pub summary: CallSummary,
    /// Set on the first item of each day bucket, `None` elsewhere
    pub bucket: Option<TimeBucket>,
}

/// Identity under which calls merge: the resolved contact when known,
/// otherwise the raw number string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MergeKey {
    Contact(i64),
    Number(String),
}

fn merge_key(record: &CallLogRecord) -> MergeKey {
    if record.contact_id != 0 {
        MergeKey::Contact(record.contact_id)
    } else {
        MergeKey::Number(record.phone_number.clone())
    }
}

/// Classify a snapshot under the given mode. Timeline keeps the input
/// order; the merging modes impose their own newest-first ordering.
#[must_use]
pub fn classify(records: &[CallLogRecord], mode: DisplayMode) -> Vec<CallLogItem> {
    match mode {
        DisplayMode::Timeline => timeline(records),
        DisplayMode::Merged => merged(records),
        DisplayMode::ContinuousMerge => continuous(records),
    }
}

fn timeline(records: &[CallLogRecord]) -> Vec<CallLogItem> {
    records
        .iter()
        .map(|record| item_from_group(vec![record.clone()], record.clone()))
        .collect()
}

fn merged(records: &[CallLogRecord]) -> Vec<CallLogItem> {
    // First-seen order keeps grouping deterministic before the final sort
    let mut order: Vec<MergeKey> = Vec::new();
    let mut groups: HashMap<MergeKey, Vec<CallLogRecord>> = HashMap::new();

    for record in records {
        let key = merge_key(record);
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(record.clone());
    }

    let mut items: Vec<CallLogItem> = order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .map(|group| {
            let representative = group
                .iter()
                .max_by_key(|r| (r.timestamp, r.call_log_id))
                .cloned()
                .unwrap_or_else(|| group[0].clone());
            item_from_group(group, representative)
        })
        .collect();

    items.sort_by(|a, b| {
        b.summary
            .representative
            .timestamp
            .cmp(&a.summary.representative.timestamp)
    });
    items
}

fn continuous(records: &[CallLogRecord]) -> Vec<CallLogItem> {
    // Adjacency is only meaningful in newest-first order, so sort a
    // local copy rather than trusting the caller's ordering.
    let mut sorted: Vec<&CallLogRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then(b.call_log_id.cmp(&a.call_log_id))
    });

    let mut items = Vec::new();
    let mut run: Vec<CallLogRecord> = Vec::new();

    for record in sorted {
        if let Some(last) = run.last() {
            if merge_key(last) != merge_key(record) {
                let representative = run[0].clone();
                items.push(item_from_group(std::mem::take(&mut run), representative));
            }
        }
        run.push(record.clone());
    }
    if let Some(first) = run.first() {
        let representative = first.clone();
        items.push(item_from_group(run, representative));
    }
    items
}

fn item_from_group(records: Vec<CallLogRecord>, representative: CallLogRecord) -> CallLogItem {
    let total_duration_secs = records.iter().map(|r| r.duration_secs).sum();
    CallLogItem {
        summary: CallSummary {
            representative,
            call_count: records.len(),
            total_duration_secs,
        },
        records,
        bucket: None,
    }
}

/// Label each item list in place relative to the current local date.
pub fn label_time_buckets(items: &mut [CallLogItem]) {
    assign_time_buckets(items, Local::now().date_naive());
}

/// Set `bucket` on the first item of each day bucket, walking the list
/// in display order. Items continuing the current bucket stay `None`.
/// Everything older than yesterday shares one Earlier bucket, so the
/// walk ends at its first label.
pub fn assign_time_buckets(items: &mut [CallLogItem], today: NaiveDate) {
    let yesterday = today.pred_opt().unwrap_or(today);
    let mut current: Option<TimeBucket> = None;

    for item in &mut *items {
        let date = local_date(item.summary.representative.timestamp);
        let bucket = if date == today {
            TimeBucket::Today
        } else if date == yesterday {
            TimeBucket::Yesterday
        } else {
            TimeBucket::Earlier
        };

        if current == Some(bucket) {
            item.bucket = None;
        } else {
            item.bucket = Some(bucket);
            current = Some(bucket);
            if bucket == TimeBucket::Earlier {
                break;
            }
        }
    }
}

fn local_date(timestamp: i64) -> NaiveDate {
    Local
        .timestamp_millis_opt(timestamp)
        .single()
        .map_or(NaiveDate::MIN, |dt| dt.date_naive())
}
