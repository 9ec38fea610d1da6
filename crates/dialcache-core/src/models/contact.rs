//! Contact model

use serde::{Deserialize, Serialize};

use super::Record;

/// A labeled value from the contact directory (phone, email, address, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledValue {
    /// Kind label as reported by the source (e.g. "mobile", "work")
    pub label: String,
    pub value: String,
}

impl LabeledValue {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// An organization entry (company + title)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub company: String,
    pub title: String,
}

/// Multi-valued detail sets attached to a contact. Order is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    #[serde(default)]
    pub phones: Vec<LabeledValue>,
    #[serde(default)]
    pub emails: Vec<LabeledValue>,
    #[serde(default)]
    pub addresses: Vec<LabeledValue>,
    #[serde(default)]
    pub organizations: Vec<Organization>,
    #[serde(default)]
    pub events: Vec<LabeledValue>,
    #[serde(default)]
    pub websites: Vec<LabeledValue>,
    #[serde(default)]
    pub ims: Vec<LabeledValue>,
}

/// A contact as mirrored from the external directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    /// Stable identifier assigned by the external source
    pub contact_id: i64,
    pub display_name: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub note: String,
    /// Last-modified timestamp on the source's clock (Unix ms)
    #[serde(default)]
    pub last_updated: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Vec<u8>>,
    #[serde(default)]
    pub details: ContactDetails,
}

impl ContactRecord {
    /// Create a minimal contact with the given identity and name
    #[must_use]
    pub fn new(contact_id: i64, display_name: impl Into<String>) -> Self {
        Self {
            contact_id,
            display_name: display_name.into(),
            nickname: String::new(),
            note: String::new(),
            last_updated: 0,
            avatar: None,
            details: ContactDetails::default(),
        }
    }

    /// First phone number on record, if any
    #[must_use]
    pub fn primary_number(&self) -> Option<&str> {
        self.details.phones.first().map(|p| p.value.as_str())
    }
}

impl Record for ContactRecord {
    fn id(&self) -> i64 {
        self.contact_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_contact_defaults() {
        let contact = ContactRecord::new(7, "Ada");
        assert_eq!(contact.id(), 7);
        assert_eq!(contact.display_name, "Ada");
        assert!(contact.avatar.is_none());
        assert!(contact.details.phones.is_empty());
    }

    #[test]
    fn test_primary_number() {
        let mut contact = ContactRecord::new(1, "Ada");
        assert_eq!(contact.primary_number(), None);

        contact
            .details
            .phones
            .push(LabeledValue::new("mobile", "555-0100"));
        contact
            .details
            .phones
            .push(LabeledValue::new("work", "555-0101"));
        assert_eq!(contact.primary_number(), Some("555-0100"));
    }

    #[test]
    fn test_details_roundtrip_with_missing_fields() {
        // Partial JSON (as stored by older schema versions) must default cleanly
        let details: ContactDetails =
            serde_json::from_str(r#"{"phones":[{"label":"home","value":"1"}]}"#).unwrap();
        assert_eq!(details.phones.len(), 1);
        assert!(details.emails.is_empty());
        assert!(details.organizations.is_empty());
    }
}
