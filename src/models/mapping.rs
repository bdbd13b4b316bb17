use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::enums::{FieldType, SuggestionSource};
use super::field::is_sub_field_key;

/// A field (or one enabled sub-item of a composite field) that can be linked to an EHR path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappableItem {
    pub field_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_field_key: Option<String>,
    pub label: String,
    pub field_type: FieldType,
}

impl MappableItem {
    pub fn key(&self) -> MappingKey {
        MappingKey::new(&self.field_id, self.sub_field_key.as_deref())
    }
}

/// Composite key `fieldId` or `fieldId-subFieldKey`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MappingKey {
    field_id: String,
    sub_field_key: Option<String>,
}

impl MappingKey {
    pub fn new(field_id: &str, sub_field_key: Option<&str>) -> Self {
        Self {
            field_id: field_id.to_string(),
            sub_field_key: sub_field_key.map(str::to_string),
        }
    }

    pub fn field(field_id: &str) -> Self {
        Self::new(field_id, None)
    }

    pub fn field_id(&self) -> &str {
        &self.field_id
    }

    pub fn sub_field_key(&self) -> Option<&str> {
        self.sub_field_key.as_deref()
    }

    /// Field ids may themselves contain `-`, so the suffix only counts as a
    /// sub-field key when it names a known composite sub-item.
    pub fn parse(s: &str) -> Self {
        if let Some((field_id, sub)) = s.rsplit_once('-') {
            if !field_id.is_empty() && is_sub_field_key(sub) {
                return Self::new(field_id, Some(sub));
            }
        }
        Self::field(s)
    }
}

impl fmt::Display for MappingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sub_field_key {
            Some(sub) => write!(f, "{}-{}", self.field_id, sub),
            None => f.write_str(&self.field_id),
        }
    }
}

impl FromStr for MappingKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Serialize for MappingKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MappingKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// A committed link between a field (or sub-item) and an EHR path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    pub field_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_field_key: Option<String>,
    pub ehr_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<NaiveDateTime>,
}

impl Mapping {
    pub fn new(field_id: &str, sub_field_key: Option<&str>, ehr_path: &str) -> Self {
        Self {
            field_id: field_id.to_string(),
            sub_field_key: sub_field_key.map(str::to_string),
            ehr_path: ehr_path.to_string(),
            confirmed_at: Some(chrono::Local::now().naive_local()),
        }
    }

    pub fn key(&self) -> MappingKey {
        MappingKey::new(&self.field_id, self.sub_field_key.as_deref())
    }
}

/// A candidate link awaiting user acceptance or dismissal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingSuggestion {
    pub field_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_field_key: Option<String>,
    pub ehr_path: String,
    /// Free text: provider rationale or a fallback template.
    #[serde(default)]
    pub reason: String,
    #[serde(default = "default_source")]
    pub source: SuggestionSource,
}

fn default_source() -> SuggestionSource {
    SuggestionSource::Provider
}

impl MappingSuggestion {
    pub fn key(&self) -> MappingKey {
        MappingKey::new(&self.field_id, self.sub_field_key.as_deref())
    }

    pub fn into_mapping(self) -> Mapping {
        Mapping::new(&self.field_id, self.sub_field_key.as_deref(), &self.ehr_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display_joins_sub_field() {
        assert_eq!(
            MappingKey::new("pi_1", Some("includeFullName")).to_string(),
            "pi_1-includeFullName"
        );
        assert_eq!(MappingKey::field("email_1").to_string(), "email_1");
    }

    #[test]
    fn key_parse_recognizes_known_sub_field() {
        let key: MappingKey = "pi_1-includeDOB".parse().unwrap();
        assert_eq!(key.field_id(), "pi_1");
        assert_eq!(key.sub_field_key(), Some("includeDOB"));
    }

    #[test]
    fn key_parse_keeps_dashed_field_id() {
        let key: MappingKey = "field-1712-abc".parse().unwrap();
        assert_eq!(key.field_id(), "field-1712-abc");
        assert_eq!(key.sub_field_key(), None);

        let key: MappingKey = "field-1712-includeHeight".parse().unwrap();
        assert_eq!(key.field_id(), "field-1712");
        assert_eq!(key.sub_field_key(), Some("includeHeight"));
    }

    #[test]
    fn key_serializes_as_string() {
        let key = MappingKey::new("v", Some("includeBMI"));
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"v-includeBMI\"");
        let back: MappingKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn suggestion_promotes_to_mapping() {
        let suggestion = MappingSuggestion {
            field_id: "pi_1".into(),
            sub_field_key: Some("includeDOB".into()),
            ehr_path: "demographics.dob".into(),
            reason: "Date of birth".into(),
            source: SuggestionSource::Provider,
        };
        let key = suggestion.key();
        let mapping = suggestion.into_mapping();
        assert_eq!(mapping.key(), key);
        assert_eq!(mapping.ehr_path, "demographics.dob");
        assert!(mapping.confirmed_at.is_some());
    }

    #[test]
    fn suggestion_deserializes_without_source() {
        let json = r#"{"fieldId": "e", "ehrPath": "demographics.contact.email", "reason": "r"}"#;
        let suggestion: MappingSuggestion = serde_json::from_str(json).unwrap();
        assert_eq!(suggestion.source, SuggestionSource::Provider);
        assert!(suggestion.sub_field_key.is_none());
    }
}
