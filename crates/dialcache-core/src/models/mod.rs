//! Record models replicated from the external source

mod call_log;
mod contact;

pub use call_log::{format_duration, CallLogRecord, CallType};
pub use contact::{ContactDetails, ContactRecord, LabeledValue, Organization};

/// A record owned by the external source and mirrored locally.
///
/// Identity is the stable identifier assigned by the source; the
/// reconciliation engine is generic over this trait.
pub trait Record: Clone + Send + Sync + 'static {
    /// Stable identifier assigned by the external source
    fn id(&self) -> i64;
}
