use serde::Serialize;

use super::enums::EhrCategory;

/// A location in the target patient-record schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EhrPath {
    pub path: &'static str,
    pub label: &'static str,
    pub category: EhrCategory,
}

macro_rules! ehr_catalog {
    ($($category:ident : $path:literal => $label:literal),+ $(,)?) => {
        const CATALOG: &[EhrPath] = &[
            $(EhrPath { path: $path, label: $label, category: EhrCategory::$category }),+
        ];
    };
}

ehr_catalog! {
    Demographics: "demographics.name.full" => "Full Name",
    Demographics: "demographics.name.first" => "First Name",
    Demographics: "demographics.name.last" => "Last Name",
    Demographics: "demographics.dob" => "Date of Birth",
    Demographics: "demographics.gender" => "Gender",
    Demographics: "demographics.marital_status" => "Marital Status",
    Demographics: "demographics.preferred_language" => "Preferred Language",
    Contact: "demographics.contact.email" => "Email",
    Contact: "demographics.contact.phone" => "Phone",
    Contact: "demographics.address.full" => "Home Address",
    Contact: "contacts.emergency.name" => "Emergency Contact Name",
    Contact: "contacts.emergency.relationship" => "Emergency Contact Relationship",
    Contact: "contacts.emergency.phone" => "Emergency Contact Phone",
    Vitals: "vitals.height" => "Height",
    Vitals: "vitals.weight" => "Weight",
    Vitals: "vitals.bmi" => "BMI",
    Vitals: "vitals.blood_pressure" => "Blood Pressure",
    Vitals: "vitals.heart_rate" => "Heart Rate",
    Vitals: "vitals.temperature" => "Temperature",
    Vitals: "vitals.respiratory_rate" => "Respiratory Rate",
    Vitals: "vitals.oxygen_saturation" => "Oxygen Saturation",
    Insurance: "insurance.primary.provider" => "Insurance Provider",
    Insurance: "insurance.primary.member_id" => "Member ID",
    Insurance: "insurance.primary.group_number" => "Group Number",
    Insurance: "insurance.primary.subscriber.name" => "Subscriber Name",
    Insurance: "insurance.primary.subscriber.dob" => "Subscriber Date of Birth",
    Insurance: "insurance.primary.subscriber.relationship" => "Relationship to Subscriber",
    Clinical: "clinical.medications" => "Current Medications",
    Clinical: "clinical.allergies" => "Allergies",
    Clinical: "clinical.history.medical" => "Medical History",
    Clinical: "clinical.history.family" => "Family History",
    Clinical: "clinical.history.social" => "Social History",
    Clinical: "clinical.chief_complaint" => "Chief Complaint",
    Administrative: "administrative.consents" => "Signed Consents",
    Administrative: "administrative.documents" => "Uploaded Documents",
    Administrative: "administrative.notes" => "Intake Notes",
}

/// The full, fixed catalog of mappable EHR paths.
pub fn catalog() -> &'static [EhrPath] {
    CATALOG
}

pub fn find(path: &str) -> Option<&'static EhrPath> {
    CATALOG.iter().find(|p| p.path == path)
}

pub fn is_known(path: &str) -> bool {
    find(path).is_some()
}
