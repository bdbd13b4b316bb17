use serde::{Deserialize, Serialize};

use super::enums::FieldType;
use super::mapping::MappableItem;

/// Declares a composite sub-selection struct: one `include*` flag per
/// sub-item, serialized under its camelCase key, plus the ordered
/// projection of enabled flags.
macro_rules! composite_selection {
    ($name:ident { $($field:ident => $key:literal, $label:literal);+ $(;)? }) => {
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            $(
                #[serde(rename = $key, default)]
                pub $field: bool,
            )+
        }

        impl $name {
            /// Every sub-field key this composite can expose, in display order.
            pub const KEYS: &'static [&'static str] = &[$($key),+];

            /// `(sub_field_key, sub_label)` for each enabled flag, in display order.
            pub fn enabled(&self) -> Vec<(&'static str, &'static str)> {
                let mut items = Vec::new();
                $(
                    if self.$field {
                        items.push(($key, $label));
                    }
                )+
                items
            }
        }
    };
}

composite_selection!(PersonalInfoSelection {
    include_full_name => "includeFullName", "Full Name";
    include_dob => "includeDOB", "Date of Birth";
    include_gender => "includeGender", "Gender";
    include_email => "includeEmail", "Email";
    include_phone => "includePhone", "Phone";
    include_address => "includeAddress", "Address";
    include_marital_status => "includeMaritalStatus", "Marital Status";
    include_preferred_language => "includePreferredLanguage", "Preferred Language";
});

composite_selection!(VitalsSelection {
    include_height => "includeHeight", "Height";
    include_weight => "includeWeight", "Weight";
    include_bmi => "includeBMI", "BMI";
    include_blood_pressure => "includeBloodPressure", "Blood Pressure";
    include_heart_rate => "includeHeartRate", "Heart Rate";
    include_temperature => "includeTemperature", "Temperature";
    include_respiratory_rate => "includeRespiratoryRate", "Respiratory Rate";
    include_oxygen_saturation => "includeOxygenSaturation", "Oxygen Saturation";
});

composite_selection!(HealthInsuranceSelection {
    include_provider_name => "includeProviderName", "Insurance Provider";
    include_member_id => "includeMemberId", "Member ID";
    include_group_number => "includeGroupNumber", "Group Number";
    include_policy_holder_name => "includePolicyHolderName", "Policy Holder Name";
    include_policy_holder_dob => "includePolicyHolderDOB", "Policy Holder Date of Birth";
    include_relationship => "includeRelationship", "Relationship to Policy Holder";
    include_card_images => "includeCardImages", "Insurance Card Images";
});

composite_selection!(EmergencyContactSelection {
    include_contact_name => "includeContactName", "Contact Name";
    include_contact_relationship => "includeContactRelationship", "Relationship";
    include_contact_phone => "includeContactPhone", "Contact Phone";
});

/// True when `key` names a sub-item of any composite kind.
pub fn is_sub_field_key(key: &str) -> bool {
    PersonalInfoSelection::KEYS
        .iter()
        .chain(VitalsSelection::KEYS)
        .chain(HealthInsuranceSelection::KEYS)
        .chain(EmergencyContactSelection::KEYS)
        .any(|k| *k == key)
}

/// Kind-specific payload of a form field, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldKind {
    Header,
    Paragraph,
    Note,
    Image,
    Signature,
    RichText,
    Payment,
    Divider,
    TextInput,
    TextArea,
    Number,
    Email,
    Phone,
    Date,
    Checkbox,
    Radio {
        #[serde(default)]
        options: Vec<String>,
    },
    Dropdown {
        #[serde(default)]
        options: Vec<String>,
    },
    MultiSelect {
        #[serde(default)]
        options: Vec<String>,
    },
    FileUpload,
    Agreement {
        #[serde(default)]
        text: String,
    },
    Medications,
    Allergies,
    PersonalInfo {
        #[serde(rename = "personalInfo", default)]
        personal_info: PersonalInfoSelection,
    },
    Vitals {
        #[serde(default)]
        vitals: VitalsSelection,
    },
    HealthInsurance {
        #[serde(rename = "healthInsurance", default)]
        health_insurance: HealthInsuranceSelection,
    },
    EmergencyContact {
        #[serde(rename = "emergencyContact", default)]
        emergency_contact: EmergencyContactSelection,
    },
}

/// How a field kind participates in EHR mapping.
enum Mappability {
    None,
    Whole,
    Composite(Vec<(&'static str, &'static str)>),
}

impl FieldKind {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Header => FieldType::Header,
            Self::Paragraph => FieldType::Paragraph,
            Self::Note => FieldType::Note,
            Self::Image => FieldType::Image,
            Self::Signature => FieldType::Signature,
            Self::RichText => FieldType::RichText,
            Self::Payment => FieldType::Payment,
            Self::Divider => FieldType::Divider,
            Self::TextInput => FieldType::TextInput,
            Self::TextArea => FieldType::TextArea,
            Self::Number => FieldType::Number,
            Self::Email => FieldType::Email,
            Self::Phone => FieldType::Phone,
            Self::Date => FieldType::Date,
            Self::Checkbox => FieldType::Checkbox,
            Self::Radio { .. } => FieldType::Radio,
            Self::Dropdown { .. } => FieldType::Dropdown,
            Self::MultiSelect { .. } => FieldType::MultiSelect,
            Self::FileUpload => FieldType::FileUpload,
            Self::Agreement { .. } => FieldType::Agreement,
            Self::Medications => FieldType::Medications,
            Self::Allergies => FieldType::Allergies,
            Self::PersonalInfo { .. } => FieldType::PersonalInfo,
            Self::Vitals { .. } => FieldType::Vitals,
            Self::HealthInsurance { .. } => FieldType::HealthInsurance,
            Self::EmergencyContact { .. } => FieldType::EmergencyContact,
        }
    }

    fn mappability(&self) -> Mappability {
        match self {
            Self::Header
            | Self::Paragraph
            | Self::Note
            | Self::Image
            | Self::Signature
            | Self::RichText
            | Self::Payment
            | Self::Divider => Mappability::None,
            Self::TextInput
            | Self::TextArea
            | Self::Number
            | Self::Email
            | Self::Phone
            | Self::Date
            | Self::Checkbox
            | Self::Radio { .. }
            | Self::Dropdown { .. }
            | Self::MultiSelect { .. }
            | Self::FileUpload
            | Self::Agreement { .. }
            | Self::Medications
            | Self::Allergies => Mappability::Whole,
            Self::PersonalInfo { personal_info } => Mappability::Composite(personal_info.enabled()),
            Self::Vitals { vitals } => Mappability::Composite(vitals.enabled()),
            Self::HealthInsurance { health_insurance } => {
                Mappability::Composite(health_insurance.enabled())
            }
            Self::EmergencyContact { emergency_contact } => {
                Mappability::Composite(emergency_contact.enabled())
            }
        }
    }

    /// Same composite sub-selection (or both non-composite of the same type).
    /// Option lists and agreement text do not count as mapping-relevant content.
    fn same_selection(&self, other: &FieldKind) -> bool {
        match (self, other) {
            (Self::PersonalInfo { personal_info: a }, Self::PersonalInfo { personal_info: b }) => {
                a == b
            }
            (Self::Vitals { vitals: a }, Self::Vitals { vitals: b }) => a == b,
            (
                Self::HealthInsurance { health_insurance: a },
                Self::HealthInsurance { health_insurance: b },
            ) => a == b,
            (
                Self::EmergencyContact { emergency_contact: a },
                Self::EmergencyContact { emergency_contact: b },
            ) => a == b,
            (a, b) => a.field_type() == b.field_type(),
        }
    }
}

/// A field on the form being built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FormField {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            required: false,
            kind,
        }
    }

    pub fn field_type(&self) -> FieldType {
        self.kind.field_type()
    }

    /// True when the label or composite sub-selection differs from `previous`.
    pub fn mapping_content_changed(&self, previous: &FormField) -> bool {
        self.label != previous.label || !self.kind.same_selection(&previous.kind)
    }

    /// Project this field into its mappable items.
    pub fn mappable_items(&self) -> Vec<MappableItem> {
        let field_type = self.field_type();
        match self.kind.mappability() {
            Mappability::None => Vec::new(),
            Mappability::Whole => vec![MappableItem {
                field_id: self.id.clone(),
                sub_field_key: None,
                label: self.label.clone(),
                field_type,
            }],
            Mappability::Composite(enabled) => enabled
                .into_iter()
                .map(|(key, sub_label)| MappableItem {
                    field_id: self.id.clone(),
                    sub_field_key: Some(key.to_string()),
                    label: format!("{} - {}", self.label, sub_label),
                    field_type,
                })
                .collect(),
        }
    }
}

/// Flatten a field list into every mappable item it exposes.
pub fn flatten_mappable(fields: &[FormField]) -> Vec<MappableItem> {
    fields.iter().flat_map(FormField::mappable_items).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn personal_info(full_name: bool, dob: bool) -> FormField {
        FormField::new(
            "pi_1",
            "Patient Info",
            FieldKind::PersonalInfo {
                personal_info: PersonalInfoSelection {
                    include_full_name: full_name,
                    include_dob: dob,
                    ..Default::default()
                },
            },
        )
    }

    #[test]
    fn non_mappable_kinds_yield_nothing() {
        for kind in [
            FieldKind::Header,
            FieldKind::Note,
            FieldKind::Image,
            FieldKind::Signature,
            FieldKind::RichText,
            FieldKind::Payment,
        ] {
            let field = FormField::new("x", "X", kind);
            assert!(field.mappable_items().is_empty(), "{:?}", field.field_type());
        }
    }

    #[test]
    fn simple_kind_yields_single_item() {
        let field = FormField::new("email_1", "Email Address", FieldKind::Email);
        let items = field.mappable_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].field_id, "email_1");
        assert!(items[0].sub_field_key.is_none());
        assert_eq!(items[0].label, "Email Address");
        assert_eq!(items[0].field_type, FieldType::Email);
    }

    #[test]
    fn composite_yields_enabled_sub_items_in_order() {
        let items = personal_info(true, true).mappable_items();
        let keys: Vec<_> = items
            .iter()
            .map(|i| i.sub_field_key.as_deref().unwrap())
            .collect();
        assert_eq!(keys, vec!["includeFullName", "includeDOB"]);
        assert_eq!(items[0].label, "Patient Info - Full Name");
    }

    #[test]
    fn composite_with_nothing_enabled_yields_nothing() {
        assert!(personal_info(false, false).mappable_items().is_empty());
    }

    #[test]
    fn label_change_is_content_change() {
        let before = personal_info(true, false);
        let mut after = before.clone();
        after.label = "Demographics".into();
        assert!(after.mapping_content_changed(&before));
    }

    #[test]
    fn sub_selection_change_is_content_change() {
        let before = personal_info(true, false);
        let after = personal_info(true, true);
        assert!(after.mapping_content_changed(&before));
    }

    #[test]
    fn option_edit_is_not_content_change() {
        let before = FormField::new(
            "r",
            "Smoker?",
            FieldKind::Radio {
                options: vec!["Yes".into()],
            },
        );
        let mut after = before.clone();
        after.kind = FieldKind::Radio {
            options: vec!["Yes".into(), "No".into()],
        };
        assert!(!after.mapping_content_changed(&before));
    }

    #[test]
    fn type_change_is_content_change() {
        let before = FormField::new("f", "Contact", FieldKind::Email);
        let after = FormField::new("f", "Contact", FieldKind::Phone);
        assert!(after.mapping_content_changed(&before));
    }

    #[test]
    fn deserializes_tagged_composite() {
        let json = r#"{
            "id": "pi_1",
            "type": "PERSONAL_INFO",
            "label": "Patient Info",
            "personalInfo": {"includeFullName": true, "includeDOB": true}
        }"#;
        let field: FormField = serde_json::from_str(json).unwrap();
        assert_eq!(field, personal_info(true, true));
    }

    #[test]
    fn deserializes_simple_kind_with_options() {
        let json = r#"{"id": "d", "type": "DROPDOWN", "label": "Sex", "options": ["F", "M"]}"#;
        let field: FormField = serde_json::from_str(json).unwrap();
        assert_eq!(field.field_type(), FieldType::Dropdown);
        assert_eq!(field.mappable_items().len(), 1);
    }

    #[test]
    fn flatten_spans_all_fields() {
        let fields = vec![
            personal_info(true, true),
            FormField::new("h", "Intake", FieldKind::Header),
            FormField::new("p", "Phone", FieldKind::Phone),
        ];
        assert_eq!(flatten_mappable(&fields).len(), 3);
    }

    #[test]
    fn composite_keys_are_unique_across_kinds() {
        let mut all: Vec<&str> = Vec::new();
        all.extend(PersonalInfoSelection::KEYS);
        all.extend(VitalsSelection::KEYS);
        all.extend(HealthInsuranceSelection::KEYS);
        all.extend(EmergencyContactSelection::KEYS);
        let unique: std::collections::HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
    }
}
