use crate::mapping::MappingError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = MappingError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(MappingError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(FieldType {
    Header => "HEADER",
    Paragraph => "PARAGRAPH",
    Note => "NOTE",
    Image => "IMAGE",
    Signature => "SIGNATURE",
    RichText => "RICH_TEXT",
    Payment => "PAYMENT",
    Divider => "DIVIDER",
    TextInput => "TEXT_INPUT",
    TextArea => "TEXT_AREA",
    Number => "NUMBER",
    Email => "EMAIL",
    Phone => "PHONE",
    Date => "DATE",
    Checkbox => "CHECKBOX",
    Radio => "RADIO",
    Dropdown => "DROPDOWN",
    MultiSelect => "MULTI_SELECT",
    FileUpload => "FILE_UPLOAD",
    Agreement => "AGREEMENT",
    Medications => "MEDICATIONS",
    Allergies => "ALLERGIES",
    PersonalInfo => "PERSONAL_INFO",
    Vitals => "VITALS",
    HealthInsurance => "HEALTH_INSURANCE",
    EmergencyContact => "EMERGENCY_CONTACT",
});

str_enum!(EhrCategory {
    Demographics => "demographics",
    Contact => "contact",
    Vitals => "vitals",
    Insurance => "insurance",
    Clinical => "clinical",
    Administrative => "administrative",
});

str_enum!(SuggestionSource {
    Provider => "provider",
    StaticFallback => "static_fallback",
});
