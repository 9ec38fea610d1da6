//! First-letter sectioning of the contact directory.
//!
//! Names in any script are transliterated to Latin before taking the
//! initial, so CJK and accented names land in the section a reader
//! would look for them under. Anything without a Latin-letter initial
//! collects under the `#` section.

use std::collections::BTreeMap;

use crate::models::ContactRecord;

/// Section for names with no usable Latin initial
pub const FALLBACK_SECTION: char = '#';

/// Section letter for a display name
#[must_use]
pub fn initial_of(name: &str) -> char {
    let latin = deunicode::deunicode(name);
    latin
        .chars()
        .next()
        .filter(char::is_ascii_alphabetic)
        .map_or(FALLBACK_SECTION, |c| c.to_ascii_uppercase())
}

/// Build the sectioned index from a snapshot, preserving the snapshot's
/// order within each section. Rebuilt whole on every snapshot; nothing
/// is cached between calls.
#[must_use]
pub fn initials_index(contacts: &[ContactRecord]) -> BTreeMap<char, Vec<ContactRecord>> {
    let mut index: BTreeMap<char, Vec<ContactRecord>> = BTreeMap::new();
    for contact in contacts {
        index
            .entry(initial_of(&contact.display_name))
            .or_default()
            .push(contact.clone());
    }
    index
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_initial_of_ascii() {
        assert_eq!(initial_of("alice"), 'A');
        assert_eq!(initial_of("Bob"), 'B');
    }

    #[test]
    fn test_initial_of_transliterates() {
        assert_eq!(initial_of("Élodie"), 'E');
        assert_eq!(initial_of("Øyvind"), 'O');
        assert_eq!(initial_of("张伟"), 'Z');
    }

    #[test]
    fn test_initial_of_fallback() {
        assert_eq!(initial_of("42nd Street Deli"), FALLBACK_SECTION);
        assert_eq!(initial_of("+15550100"), FALLBACK_SECTION);
        assert_eq!(initial_of(""), FALLBACK_SECTION);
    }

    #[test]
    fn test_index_sections_sorted_and_order_preserved() {
        let contacts = vec![
            ContactRecord::new(1, "Ada"),
            ContactRecord::new(2, "alan"),
            ContactRecord::new(3, "Grace"),
            ContactRecord::new(4, "007"),
        ];

        let index = initials_index(&contacts);

        let sections: Vec<char> = index.keys().copied().collect();
        assert_eq!(sections, vec!['#', 'A', 'G']);

        let a_ids: Vec<i64> = index[&'A'].iter().map(|c| c.contact_id).collect();
        assert_eq!(a_ids, vec![1, 2]);
    }
}
