//! Adapter from internal hospital (HMS) diagnosis records to FHIR Conditions.
//!
//! HMS call sites hand over loosely shaped diagnosis records: identifiers may be strings or
//! numbers, and the condition name lives in `diagnosis`, `name` or `description` depending on
//! the page that produced it. [`HmsDiagnosis`] absorbs those variations at the boundary so that
//! [`Condition::from_hms_diagnosis`] is the single mapping point into FHIR.

use crate::condition::{Condition, ConditionInput};
use crate::terminology::{ClinicalStatus, Severity};
use crate::wire::{from_json_text, from_yaml_text};
use crate::FhirResult;
use serde::{Deserialize, Deserializer, Serialize};

/// An internal diagnosis record as produced by HMS pages and services.
///
/// Unknown keys are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HmsDiagnosis {
    #[serde(default, deserialize_with = "lenient_id")]
    pub patient_id: Option<String>,

    #[serde(default, alias = "doctorId", deserialize_with = "lenient_id")]
    pub practitioner_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_id")]
    pub encounter_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_id")]
    pub visit_id: Option<String>,

    #[serde(default)]
    pub diagnosis: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// SNOMED CT code, when the record carries one.
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub severity: Option<String>,

    #[serde(default)]
    pub onset_date: Option<String>,

    #[serde(default)]
    pub recorded_at: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl HmsDiagnosis {
    pub fn parse_json(text: &str) -> FhirResult<Self> {
        from_json_text(text, "HMS diagnosis")
    }

    pub fn parse_yaml(text: &str) -> FhirResult<Self> {
        from_yaml_text(text, "HMS diagnosis")
    }

    /// Condition name: `diagnosis`, then `name`, then `description`.
    pub fn display(&self) -> Option<&str> {
        first_present([&self.diagnosis, &self.name, &self.description])
    }

    /// Encounter id, falling back to the visit id.
    pub fn encounter(&self) -> Option<&str> {
        first_present([&self.encounter_id, &self.visit_id])
    }

    pub fn recorded(&self) -> Option<&str> {
        first_present([&self.recorded_at, &self.created_at])
    }

    /// Free-text notes, falling back to the description.
    pub fn note_text(&self) -> Option<&str> {
        first_present([&self.notes, &self.description])
    }

    /// Only the exact status `resolved` maps to resolved; everything else is active.
    pub fn clinical_status(&self) -> ClinicalStatus {
        match self.status.as_deref() {
            Some("resolved") => ClinicalStatus::Resolved,
            _ => ClinicalStatus::Active,
        }
    }

    /// Severity label, falling back to mild for unrecognised labels.
    pub fn severity(&self) -> Option<Severity> {
        let label = first_present([&self.severity])?;
        Some(Severity::from_label(label).unwrap_or_else(|| {
            tracing::debug!(label, "unrecognised HMS severity, using mild");
            Severity::Mild
        }))
    }

    /// Narrow the record to a [`ConditionInput`].
    pub fn to_condition_input(&self) -> ConditionInput {
        let owned = |value: Option<&str>| value.map(str::to_owned);

        ConditionInput {
            patient_id: self.patient_id.clone().unwrap_or_default(),
            practitioner_id: self.practitioner_id.clone(),
            encounter_id: owned(self.encounter()),
            condition_display: self.display().unwrap_or_default().to_owned(),
            condition_code: self.code.clone(),
            clinical_status: self.clinical_status(),
            severity: self.severity(),
            onset_date: self.onset_date.clone(),
            recorded_date: owned(self.recorded()),
            notes: owned(self.note_text()),
            ..ConditionInput::default()
        }
    }
}

impl Condition {
    /// Map an internal diagnosis record into a Condition.
    pub fn from_hms_diagnosis(diagnosis: &HmsDiagnosis) -> Self {
        if diagnosis.patient_id.is_none() {
            tracing::warn!("HMS diagnosis has no patient id; Condition will lack a subject");
        }
        Condition::basic(diagnosis.to_condition_input())
    }
}

fn first_present<const N: usize>(candidates: [&Option<String>; N]) -> Option<&str> {
    candidates
        .into_iter()
        .filter_map(|value| value.as_deref())
        .map(str::trim)
        .find(|value| !value.is_empty())
}

/// Accept identifiers written as strings or as numbers.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdWire {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match Option::<IdWire>::deserialize(deserializer)? {
        Some(IdWire::Text(text)) => Some(text),
        Some(IdWire::Integer(number)) => Some(number.to_string()),
        Some(IdWire::Float(number)) => Some(number.to_string()),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_condition;

    #[test]
    fn maps_a_typical_record() {
        let record = HmsDiagnosis::parse_json(
            r#"{
                "patientId": "P-100",
                "doctorId": "D-7",
                "visitId": 42,
                "diagnosis": "Hypertensive disorder",
                "code": "38341003",
                "status": "ongoing",
                "severity": "Moderate",
                "createdAt": "2024-02-01T10:00:00Z",
                "notes": "monitor BP",
                "ward": "B2"
            }"#,
        )
        .expect("parse record");

        let condition = Condition::from_hms_diagnosis(&record);

        assert_eq!(condition.patient_id(), Some("P-100"));
        assert_eq!(
            condition.encounter.as_ref().and_then(|r| r.reference.as_deref()),
            Some("Encounter/42")
        );
        assert_eq!(
            condition.asserter.as_ref().and_then(|r| r.reference.as_deref()),
            Some("Practitioner/D-7")
        );
        assert_eq!(condition.condition_display(), "Hypertensive disorder");
        assert_eq!(condition.condition_code(), Some("38341003"));
        assert_eq!(condition.clinical_status_code(), Some("active"));
        assert_eq!(condition.severity_display(), "Moderate");
        assert_eq!(condition.recorded_date.as_deref(), Some("2024-02-01T10:00:00Z"));
        assert_eq!(condition.note[0].text, "monitor BP");
        assert!(validate_condition(&condition).valid);
    }

    #[test]
    fn resolved_status_maps_to_resolved() {
        let record = HmsDiagnosis {
            patient_id: Some("1".into()),
            name: Some("Bronchitis".into()),
            status: Some("resolved".into()),
            ..HmsDiagnosis::default()
        };
        let condition = Condition::from_hms_diagnosis(&record);
        assert!(condition.is_resolved());
        assert!(!condition.is_active());
    }

    #[test]
    fn status_match_is_exact() {
        for status in ["Resolved", " resolved", "RESOLVED", "resolved "] {
            let record = HmsDiagnosis {
                status: Some(status.into()),
                ..HmsDiagnosis::default()
            };
            assert_eq!(record.clinical_status(), ClinicalStatus::Active, "{status:?}");
        }
    }

    #[test]
    fn display_and_notes_fall_back_in_order() {
        let record = HmsDiagnosis {
            patient_id: Some("1".into()),
            diagnosis: Some("  ".into()),
            description: Some("Laceration of left hand".into()),
            ..HmsDiagnosis::default()
        };
        assert_eq!(record.display(), Some("Laceration of left hand"));
        assert_eq!(record.note_text(), Some("Laceration of left hand"));
        assert_eq!(record.encounter(), None);
    }

    #[test]
    fn unknown_severity_falls_back_to_mild() {
        let record = HmsDiagnosis {
            severity: Some("critical".into()),
            ..HmsDiagnosis::default()
        };
        assert_eq!(record.severity(), Some(Severity::Mild));

        let none = HmsDiagnosis::default();
        assert_eq!(none.severity(), None);
    }

    #[test]
    fn numeric_patient_ids_are_accepted() {
        let record = HmsDiagnosis::parse_yaml("patientId: 123\nname: Asthma\n").expect("yaml");
        assert_eq!(record.patient_id.as_deref(), Some("123"));
    }

    #[test]
    fn any_record_with_a_patient_id_maps_to_a_valid_condition() {
        let statuses = [None, Some("resolved"), Some("active"), Some("whatever")];
        let displays = [None, Some("Sepsis")];
        let severities = [None, Some("severe"), Some("??")];

        for status in statuses {
            for display in displays {
                for severity in severities {
                    let record = HmsDiagnosis {
                        patient_id: Some("p".into()),
                        diagnosis: display.map(str::to_owned),
                        status: status.map(str::to_owned),
                        severity: severity.map(str::to_owned),
                        ..HmsDiagnosis::default()
                    };
                    let report = validate_condition(&Condition::from_hms_diagnosis(&record));
                    assert!(report.valid, "{record:?}: {:?}", report.errors);
                }
            }
        }
    }

    #[test]
    fn record_without_patient_fails_validation() {
        let record = HmsDiagnosis {
            diagnosis: Some("Migraine".into()),
            ..HmsDiagnosis::default()
        };
        let report = validate_condition(&Condition::from_hms_diagnosis(&record));
        assert_eq!(report.errors, vec!["subject is required".to_owned()]);
    }
}
