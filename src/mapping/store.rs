use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Mapping, MappingKey, MappingSuggestion};

/// What a field cascade removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeCounts {
    pub mappings: usize,
    pub suggestions: usize,
    pub dismissals: usize,
}

impl PurgeCounts {
    pub fn total(&self) -> usize {
        self.mappings + self.suggestions + self.dismissals
    }
}

/// In-memory mapping state: confirmed links, pending suggestions, dismissals.
///
/// Keeps the key invariants: one mapping per key, one suggestion per key,
/// and no suggestion for a confirmed or dismissed key.
#[derive(Debug, Default)]
pub struct MappingStore {
    confirmed: BTreeMap<MappingKey, Mapping>,
    suggestions: Vec<MappingSuggestion>,
    dismissed: BTreeSet<MappingKey>,
}

impl MappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_confirmed(&self, key: &MappingKey) -> bool {
        self.confirmed.contains_key(key)
    }

    pub fn is_dismissed(&self, key: &MappingKey) -> bool {
        self.dismissed.contains(key)
    }

    pub fn has_suggestion(&self, key: &MappingKey) -> bool {
        self.suggestions.iter().any(|s| &s.key() == key)
    }

    /// True when a new suggestion for `key` would violate an invariant.
    pub fn blocks(&self, key: &MappingKey) -> bool {
        self.is_confirmed(key) || self.is_dismissed(key) || self.has_suggestion(key)
    }

    /// Store a suggestion if its key is free. Returns true if stored.
    pub fn insert_suggestion(&mut self, suggestion: MappingSuggestion) -> bool {
        if self.blocks(&suggestion.key()) {
            return false;
        }
        self.suggestions.push(suggestion);
        true
    }

    pub fn take_suggestion(&mut self, key: &MappingKey) -> Option<MappingSuggestion> {
        let pos = self.suggestions.iter().position(|s| &s.key() == key)?;
        Some(self.suggestions.remove(pos))
    }

    /// Commit a mapping, replacing any prior mapping for the key and
    /// dropping a pending suggestion for it.
    pub fn confirm(&mut self, mapping: Mapping) -> Option<Mapping> {
        let key = mapping.key();
        self.suggestions.retain(|s| s.key() != key);
        self.confirmed.insert(key, mapping)
    }

    pub fn remove_mapping(&mut self, key: &MappingKey) -> Option<Mapping> {
        self.confirmed.remove(key)
    }

    /// Record a dismissal and drop the matching suggestion.
    /// Returns true only the first time a key is dismissed.
    pub fn dismiss(&mut self, key: MappingKey) -> bool {
        self.suggestions.retain(|s| s.key() != key);
        self.dismissed.insert(key)
    }

    pub fn clear_dismissals_for_field(&mut self, field_id: &str) -> usize {
        let before = self.dismissed.len();
        self.dismissed.retain(|k| k.field_id() != field_id);
        before - self.dismissed.len()
    }

    /// Keep only suggestions matching `keep`. Returns how many were dropped.
    pub fn retain_suggestions<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&MappingSuggestion) -> bool,
    {
        let before = self.suggestions.len();
        self.suggestions.retain(keep);
        before - self.suggestions.len()
    }

    /// Remove everything referencing `field_id`.
    pub fn purge_field(&mut self, field_id: &str) -> PurgeCounts {
        let before_mappings = self.confirmed.len();
        self.confirmed.retain(|k, _| k.field_id() != field_id);

        PurgeCounts {
            mappings: before_mappings - self.confirmed.len(),
            suggestions: self.retain_suggestions(|s| s.field_id != field_id),
            dismissals: self.clear_dismissals_for_field(field_id),
        }
    }

    pub fn suggestions(&self) -> &[MappingSuggestion] {
        &self.suggestions
    }

    pub fn confirmed(&self) -> impl Iterator<Item = &Mapping> {
        self.confirmed.values()
    }

    pub fn dismissed(&self) -> impl Iterator<Item = &MappingKey> {
        self.dismissed.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SuggestionSource;

    fn suggestion(field_id: &str, sub: Option<&str>, path: &str) -> MappingSuggestion {
        MappingSuggestion {
            field_id: field_id.into(),
            sub_field_key: sub.map(str::to_string),
            ehr_path: path.into(),
            reason: String::new(),
            source: SuggestionSource::StaticFallback,
        }
    }

    #[test]
    fn duplicate_suggestion_is_rejected() {
        let mut store = MappingStore::new();
        assert!(store.insert_suggestion(suggestion("e", None, "demographics.contact.email")));
        assert!(!store.insert_suggestion(suggestion("e", None, "demographics.contact.phone")));
        assert_eq!(store.suggestions().len(), 1);
        assert_eq!(store.suggestions()[0].ehr_path, "demographics.contact.email");
    }

    #[test]
    fn confirmed_key_blocks_suggestion() {
        let mut store = MappingStore::new();
        store.confirm(Mapping::new("e", None, "demographics.contact.email"));
        assert!(!store.insert_suggestion(suggestion("e", None, "demographics.contact.email")));
        assert!(store.suggestions().is_empty());
    }

    #[test]
    fn dismissed_key_blocks_suggestion() {
        let mut store = MappingStore::new();
        store.dismiss(MappingKey::field("e"));
        assert!(!store.insert_suggestion(suggestion("e", None, "demographics.contact.email")));
    }

    #[test]
    fn confirm_drops_pending_suggestion_and_replaces_mapping() {
        let mut store = MappingStore::new();
        store.insert_suggestion(suggestion("e", None, "demographics.contact.email"));
        assert!(store
            .confirm(Mapping::new("e", None, "demographics.contact.email"))
            .is_none());
        let previous = store.confirm(Mapping::new("e", None, "demographics.contact.phone"));
        assert_eq!(previous.unwrap().ehr_path, "demographics.contact.email");
        assert!(store.suggestions().is_empty());
        assert_eq!(store.confirmed().count(), 1);
    }

    #[test]
    fn dismiss_is_idempotent() {
        let mut store = MappingStore::new();
        store.insert_suggestion(suggestion("pi", Some("includeDOB"), "demographics.dob"));
        let key = MappingKey::new("pi", Some("includeDOB"));
        assert!(store.dismiss(key.clone()));
        assert!(!store.dismiss(key.clone()));
        assert!(store.suggestions().is_empty());
        assert_eq!(store.dismissed().count(), 1);
    }

    #[test]
    fn purge_field_counts_everything() {
        let mut store = MappingStore::new();
        store.confirm(Mapping::new("pi", Some("includeDOB"), "demographics.dob"));
        store.insert_suggestion(suggestion("pi", Some("includeGender"), "demographics.gender"));
        store.dismiss(MappingKey::new("pi", Some("includeFullName")));
        store.insert_suggestion(suggestion("other", None, "clinical.allergies"));

        let counts = store.purge_field("pi");
        assert_eq!(
            counts,
            PurgeCounts {
                mappings: 1,
                suggestions: 1,
                dismissals: 1
            }
        );
        assert_eq!(counts.total(), 3);
        assert_eq!(store.confirmed().count(), 0);
        assert_eq!(store.dismissed().count(), 0);
        assert_eq!(store.suggestions().len(), 1);
    }

    #[test]
    fn take_missing_suggestion_is_none() {
        let mut store = MappingStore::new();
        assert!(store.take_suggestion(&MappingKey::field("nope")).is_none());
    }
}
