//! Call-log model

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use super::Record;

/// Call disposition, mirroring the platform's wire values 1-7.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    #[default]
    Incoming,
    Outgoing,
    Missed,
    Voicemail,
    Rejected,
    Blocked,
    AnsweredElsewhere,
}

impl CallType {
    /// Map a raw source value to a call type. Values outside the known
    /// range collapse to `Incoming` (malformed records are defaulted,
    /// never rejected).
    #[must_use]
    pub const fn from_raw(raw: i64) -> Self {
        match raw {
            2 => Self::Outgoing,
            3 => Self::Missed,
            4 => Self::Voicemail,
            5 => Self::Rejected,
            6 => Self::Blocked,
            7 => Self::AnsweredElsewhere,
            _ => Self::Incoming,
        }
    }

    #[must_use]
    pub const fn as_raw(self) -> i64 {
        match self {
            Self::Incoming => 1,
            Self::Outgoing => 2,
            Self::Missed => 3,
            Self::Voicemail => 4,
            Self::Rejected => 5,
            Self::Blocked => 6,
            Self::AnsweredElsewhere => 7,
        }
    }

    /// Human-readable label for display surfaces
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
            Self::Missed => "missed",
            Self::Voicemail => "voicemail",
            Self::Rejected => "rejected",
            Self::Blocked => "blocked",
            Self::AnsweredElsewhere => "answered elsewhere",
        }
    }
}

/// One row of the call-log history as mirrored from the external source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallLogRecord {
    /// Stable identifier: the source row id
    pub call_log_id: i64,
    /// Resolved contact id, 0 when the number matches no known contact
    #[serde(default)]
    pub contact_id: i64,
    pub phone_number: String,
    /// Caller name cached by the source at call time
    #[serde(default)]
    pub cached_name: String,
    /// Call timestamp (Unix ms)
    pub timestamp: i64,
    /// Derived calendar date string ("%Y-%m-%d", local time)
    #[serde(default)]
    pub date: String,
    /// Derived clock string ("%H:%M:%S%.3f", local time)
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub duration_secs: i64,
    #[serde(default)]
    pub call_type: CallType,
    /// Carrier/region label for the number
    #[serde(default)]
    pub region: String,
    /// SIM/account label the call was placed on
    #[serde(default)]
    pub sim_label: String,
}

impl CallLogRecord {
    /// Create a record with the date/time display strings derived from
    /// the timestamp.
    #[must_use]
    pub fn new(call_log_id: i64, phone_number: impl Into<String>, timestamp: i64) -> Self {
        let (date, time) = derive_clock_strings(timestamp);
        Self {
            call_log_id,
            contact_id: 0,
            phone_number: phone_number.into(),
            cached_name: String::new(),
            timestamp,
            date,
            time,
            duration_secs: 0,
            call_type: CallType::default(),
            region: String::new(),
            sim_label: String::new(),
        }
    }
}

impl Record for CallLogRecord {
    fn id(&self) -> i64 {
        self.call_log_id
    }
}

/// Render the date/time display strings for a Unix-ms timestamp in local time.
#[must_use]
pub fn derive_clock_strings(timestamp: i64) -> (String, String) {
    Local.timestamp_millis_opt(timestamp).single().map_or_else(
        || (String::new(), String::new()),
        |dt| {
            (
                dt.format("%Y-%m-%d").to_string(),
                dt.format("%H:%M:%S%.3f").to_string(),
            )
        },
    )
}

/// Format a duration in seconds as a compact "1h 2m 3s" string.
/// Hours and minutes are omitted when zero; seconds always print.
#[must_use]
pub fn format_duration(secs: i64) -> String {
    let s = secs % 60;
    let m = (secs / 60) % 60;
    let h = secs / 60 / 60;
    let mut out = String::new();
    if h > 0 {
        out.push_str(&format!("{h}h "));
    }
    if m > 0 {
        out.push_str(&format!("{m}m "));
    }
    out.push_str(&format!("{s}s"));
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_call_type_raw_roundtrip() {
        for raw in 1..=7 {
            assert_eq!(CallType::from_raw(raw).as_raw(), raw);
        }
    }

    #[test]
    fn test_call_type_unknown_defaults() {
        assert_eq!(CallType::from_raw(0), CallType::Incoming);
        assert_eq!(CallType::from_raw(42), CallType::Incoming);
    }

    #[test]
    fn test_new_derives_clock_strings() {
        let record = CallLogRecord::new(1, "555-0100", 1_700_000_000_000);
        assert_eq!(record.date.len(), 10);
        assert!(record.time.starts_with(char::is_numeric));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(61), "1m 1s");
        assert_eq!(format_duration(3723), "1h 2m 3s");
        assert_eq!(format_duration(3600), "1h 0s");
    }
}
