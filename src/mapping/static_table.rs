//! Built-in default mappings used when no provider output is available.
//!
//! Two read-only lookups: composite sub-field key → EHR path, and field
//! type → EHR path. Both are built once per process.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::models::{FieldType, MappableItem, MappingSuggestion, SuggestionSource};

const SUB_FIELD_DEFAULTS: &[(&str, &str)] = &[
    ("includeFullName", "demographics.name.full"),
    ("includeDOB", "demographics.dob"),
    ("includeGender", "demographics.gender"),
    ("includeEmail", "demographics.contact.email"),
    ("includePhone", "demographics.contact.phone"),
    ("includeAddress", "demographics.address.full"),
    ("includeMaritalStatus", "demographics.marital_status"),
    ("includePreferredLanguage", "demographics.preferred_language"),
    ("includeHeight", "vitals.height"),
    ("includeWeight", "vitals.weight"),
    ("includeBMI", "vitals.bmi"),
    ("includeBloodPressure", "vitals.blood_pressure"),
    ("includeHeartRate", "vitals.heart_rate"),
    ("includeTemperature", "vitals.temperature"),
    ("includeRespiratoryRate", "vitals.respiratory_rate"),
    ("includeOxygenSaturation", "vitals.oxygen_saturation"),
    ("includeProviderName", "insurance.primary.provider"),
    ("includeMemberId", "insurance.primary.member_id"),
    ("includeGroupNumber", "insurance.primary.group_number"),
    ("includePolicyHolderName", "insurance.primary.subscriber.name"),
    ("includePolicyHolderDOB", "insurance.primary.subscriber.dob"),
    ("includeRelationship", "insurance.primary.subscriber.relationship"),
    ("includeContactName", "contacts.emergency.name"),
    ("includeContactRelationship", "contacts.emergency.relationship"),
    ("includeContactPhone", "contacts.emergency.phone"),
];

const FIELD_TYPE_DEFAULTS: &[(FieldType, &str)] = &[
    (FieldType::Email, "demographics.contact.email"),
    (FieldType::Phone, "demographics.contact.phone"),
    (FieldType::Medications, "clinical.medications"),
    (FieldType::Allergies, "clinical.allergies"),
    (FieldType::Agreement, "administrative.consents"),
    (FieldType::FileUpload, "administrative.documents"),
];

static BUILTIN: LazyLock<StaticMappingTable> = LazyLock::new(|| {
    StaticMappingTable::new(
        SUB_FIELD_DEFAULTS.iter().copied(),
        FIELD_TYPE_DEFAULTS.iter().copied(),
    )
});

#[derive(Debug, Clone)]
pub struct StaticMappingTable {
    by_sub_field: HashMap<&'static str, &'static str>,
    by_field_type: HashMap<FieldType, &'static str>,
}

impl StaticMappingTable {
    pub fn new(
        by_sub_field: impl IntoIterator<Item = (&'static str, &'static str)>,
        by_field_type: impl IntoIterator<Item = (FieldType, &'static str)>,
    ) -> Self {
        Self {
            by_sub_field: by_sub_field.into_iter().collect(),
            by_field_type: by_field_type.into_iter().collect(),
        }
    }

    /// The process-wide default table.
    pub fn builtin() -> &'static StaticMappingTable {
        &BUILTIN
    }

    pub fn sub_field_path(&self, sub_field_key: &str) -> Option<&'static str> {
        self.by_sub_field.get(sub_field_key).copied()
    }

    pub fn field_type_path(&self, field_type: FieldType) -> Option<&'static str> {
        self.by_field_type.get(&field_type).copied()
    }

    /// Default suggestion for one item, if the table has an entry.
    pub fn lookup(&self, item: &MappableItem) -> Option<MappingSuggestion> {
        let (path, reason) = match item.sub_field_key.as_deref() {
            Some(sub) => (
                self.sub_field_path(sub)?,
                format!("Default mapping for sub-field {sub}"),
            ),
            None => (
                self.field_type_path(item.field_type)?,
                format!("Default mapping for field type {}", item.field_type),
            ),
        };

        Some(MappingSuggestion {
            field_id: item.field_id.clone(),
            sub_field_key: item.sub_field_key.clone(),
            ehr_path: path.to_string(),
            reason,
            source: SuggestionSource::StaticFallback,
        })
    }

    /// Fallback suggestions for every item with a table entry. Misses are skipped.
    pub fn suggest(&self, items: &[MappableItem]) -> Vec<MappingSuggestion> {
        items.iter().filter_map(|item| self.lookup(item)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ehr;

    fn item(field_id: &str, sub: Option<&str>, field_type: FieldType) -> MappableItem {
        MappableItem {
            field_id: field_id.into(),
            sub_field_key: sub.map(str::to_string),
            label: "x".into(),
            field_type,
        }
    }

    #[test]
    fn every_default_path_is_in_catalog() {
        for (_, path) in SUB_FIELD_DEFAULTS {
            assert!(ehr::is_known(path), "{path}");
        }
        for (_, path) in FIELD_TYPE_DEFAULTS {
            assert!(ehr::is_known(path), "{path}");
        }
    }

    #[test]
    fn sub_field_lookup_uses_templated_reason() {
        let table = StaticMappingTable::builtin();
        let s = table
            .lookup(&item("pi_1", Some("includeFullName"), FieldType::PersonalInfo))
            .unwrap();
        assert_eq!(s.ehr_path, "demographics.name.full");
        assert_eq!(s.reason, "Default mapping for sub-field includeFullName");
        assert_eq!(s.source, SuggestionSource::StaticFallback);
    }

    #[test]
    fn field_type_lookup_uses_templated_reason() {
        let table = StaticMappingTable::builtin();
        let s = table.lookup(&item("e", None, FieldType::Email)).unwrap();
        assert_eq!(s.ehr_path, "demographics.contact.email");
        assert_eq!(s.reason, "Default mapping for field type EMAIL");
        assert!(s.sub_field_key.is_none());
    }

    #[test]
    fn missing_entries_are_skipped() {
        let table = StaticMappingTable::builtin();
        let items = vec![
            item("t", None, FieldType::TextInput),
            item("ins", Some("includeCardImages"), FieldType::HealthInsurance),
            item("p", None, FieldType::Phone),
        ];
        let suggestions = table.suggest(&items);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].field_id, "p");
    }

    #[test]
    fn custom_table_overrides_builtin() {
        let table = StaticMappingTable::new(
            [("includeDOB", "insurance.primary.subscriber.dob")],
            [],
        );
        assert_eq!(
            table.sub_field_path("includeDOB"),
            Some("insurance.primary.subscriber.dob")
        );
        assert!(table.field_type_path(FieldType::Email).is_none());
    }
}
