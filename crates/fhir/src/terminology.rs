//! FHIR code systems used by Condition resources.
//!
//! Each axis of a Condition (clinical status, verification status, category, severity) is a
//! closed enum. The enum owns its wire code, its display text and its code system, so building a
//! [`CodeableConcept`] never involves string manipulation of caller input.

use crate::datatypes::CodeableConcept;
use crate::FhirError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const CLINICAL_STATUS_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/condition-clinical";
pub const VERIFICATION_STATUS_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/condition-ver-status";
pub const CATEGORY_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/condition-category";
pub const SNOMED_SYSTEM: &str = "https://snomed.info/sct";

fn join_codes<T: Copy>(all: &[T], code: fn(T) -> &'static str) -> String {
    all.iter().map(|v| code(*v)).collect::<Vec<_>>().join(", ")
}

// ============================================================================
// Clinical status
// ============================================================================

/// Whether a condition is currently affecting the patient.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClinicalStatus {
    #[default]
    Active,
    Recurrence,
    Relapse,
    Inactive,
    Remission,
    Resolved,
}

impl ClinicalStatus {
    pub const ALL: [ClinicalStatus; 6] = [
        ClinicalStatus::Active,
        ClinicalStatus::Recurrence,
        ClinicalStatus::Relapse,
        ClinicalStatus::Inactive,
        ClinicalStatus::Remission,
        ClinicalStatus::Resolved,
    ];

    pub fn code(self) -> &'static str {
        match self {
            ClinicalStatus::Active => "active",
            ClinicalStatus::Recurrence => "recurrence",
            ClinicalStatus::Relapse => "relapse",
            ClinicalStatus::Inactive => "inactive",
            ClinicalStatus::Remission => "remission",
            ClinicalStatus::Resolved => "resolved",
        }
    }

    pub fn display(self) -> &'static str {
        match self {
            ClinicalStatus::Active => "Active",
            ClinicalStatus::Recurrence => "Recurrence",
            ClinicalStatus::Relapse => "Relapse",
            ClinicalStatus::Inactive => "Inactive",
            ClinicalStatus::Remission => "Remission",
            ClinicalStatus::Resolved => "Resolved",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// `active`, `recurrence` and `relapse` all mean the condition is currently present.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ClinicalStatus::Active | ClinicalStatus::Recurrence | ClinicalStatus::Relapse
        )
    }

    /// Comma-separated list of every allowed code, in code system order.
    pub fn allowed_codes() -> String {
        join_codes(&Self::ALL, Self::code)
    }

    pub fn to_codeable_concept(self) -> CodeableConcept {
        CodeableConcept::coded(CLINICAL_STATUS_SYSTEM, self.code(), self.display())
    }
}

impl fmt::Display for ClinicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ClinicalStatus {
    type Err = FhirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s.trim()).ok_or_else(|| {
            FhirError::InvalidInput(format!(
                "unknown clinical status '{s}', expected one of: {}",
                Self::allowed_codes()
            ))
        })
    }
}

// ============================================================================
// Verification status
// ============================================================================

/// How confident the asserter is in the diagnosis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationStatus {
    Unconfirmed,
    Provisional,
    Differential,
    #[default]
    Confirmed,
    Refuted,
    EnteredInError,
}

impl VerificationStatus {
    pub const ALL: [VerificationStatus; 6] = [
        VerificationStatus::Unconfirmed,
        VerificationStatus::Provisional,
        VerificationStatus::Differential,
        VerificationStatus::Confirmed,
        VerificationStatus::Refuted,
        VerificationStatus::EnteredInError,
    ];

    pub fn code(self) -> &'static str {
        match self {
            VerificationStatus::Unconfirmed => "unconfirmed",
            VerificationStatus::Provisional => "provisional",
            VerificationStatus::Differential => "differential",
            VerificationStatus::Confirmed => "confirmed",
            VerificationStatus::Refuted => "refuted",
            VerificationStatus::EnteredInError => "entered-in-error",
        }
    }

    pub fn display(self) -> &'static str {
        match self {
            VerificationStatus::Unconfirmed => "Unconfirmed",
            VerificationStatus::Provisional => "Provisional",
            VerificationStatus::Differential => "Differential",
            VerificationStatus::Confirmed => "Confirmed",
            VerificationStatus::Refuted => "Refuted",
            VerificationStatus::EnteredInError => "Entered in Error",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    pub fn allowed_codes() -> String {
        join_codes(&Self::ALL, Self::code)
    }

    pub fn to_codeable_concept(self) -> CodeableConcept {
        CodeableConcept::coded(VERIFICATION_STATUS_SYSTEM, self.code(), self.display())
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for VerificationStatus {
    type Err = FhirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s.trim()).ok_or_else(|| {
            FhirError::InvalidInput(format!(
                "unknown verification status '{s}', expected one of: {}",
                Self::allowed_codes()
            ))
        })
    }
}

// ============================================================================
// Category
// ============================================================================

/// Long-term tracked problem versus a diagnosis tied to a single visit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionCategory {
    ProblemListItem,
    #[default]
    EncounterDiagnosis,
}

impl ConditionCategory {
    pub const ALL: [ConditionCategory; 2] = [
        ConditionCategory::ProblemListItem,
        ConditionCategory::EncounterDiagnosis,
    ];

    pub fn code(self) -> &'static str {
        match self {
            ConditionCategory::ProblemListItem => "problem-list-item",
            ConditionCategory::EncounterDiagnosis => "encounter-diagnosis",
        }
    }

    pub fn display(self) -> &'static str {
        match self {
            ConditionCategory::ProblemListItem => "Problem List Item",
            ConditionCategory::EncounterDiagnosis => "Encounter Diagnosis",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Anything other than `problem-list-item` is treated as an encounter diagnosis.
    pub fn from_code_lenient(code: &str) -> Self {
        if code.trim() == ConditionCategory::ProblemListItem.code() {
            ConditionCategory::ProblemListItem
        } else {
            ConditionCategory::EncounterDiagnosis
        }
    }

    pub fn to_codeable_concept(self) -> CodeableConcept {
        CodeableConcept::coded(CATEGORY_SYSTEM, self.code(), self.display())
    }
}

impl fmt::Display for ConditionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ConditionCategory {
    type Err = FhirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s.trim()).ok_or_else(|| {
            FhirError::InvalidInput(format!(
                "unknown condition category '{s}', expected one of: {}",
                join_codes(&Self::ALL, Self::code)
            ))
        })
    }
}

// ============================================================================
// Severity
// ============================================================================

/// Subjective severity of a condition, SNOMED CT coded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Mild, Severity::Moderate, Severity::Severe];

    /// Lowercase label, as used by hospital records.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }

    pub fn snomed_code(self) -> &'static str {
        match self {
            Severity::Mild => "255604002",
            Severity::Moderate => "6736007",
            Severity::Severe => "24484000",
        }
    }

    pub fn display(self) -> &'static str {
        match self {
            Severity::Mild => "Mild",
            Severity::Moderate => "Moderate",
            Severity::Severe => "Severe",
        }
    }

    /// Case-insensitive lookup by label.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.label().eq_ignore_ascii_case(label))
    }

    pub fn to_codeable_concept(self) -> CodeableConcept {
        CodeableConcept::coded(SNOMED_SYSTEM, self.snomed_code(), self.display())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Severity {
    type Err = FhirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| {
            FhirError::InvalidInput(format!(
                "unknown severity '{s}', expected one of: {}",
                join_codes(&Self::ALL, Self::label)
            ))
        })
    }
}

/// SNOMED CT code for a severity label. Unrecognised labels fall back to the mild code.
pub fn severity_code(label: &str) -> &'static str {
    Severity::from_label(label)
        .unwrap_or(Severity::Mild)
        .snomed_code()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_codes_match_snomed() {
        assert_eq!(severity_code("mild"), "255604002");
        assert_eq!(severity_code("moderate"), "6736007");
        assert_eq!(severity_code("severe"), "24484000");
        assert_eq!(severity_code("SEVERE"), "24484000");
    }

    #[test]
    fn unknown_severity_falls_back_to_mild_code() {
        assert_eq!(severity_code("catastrophic"), "255604002");
        assert_eq!(severity_code(""), "255604002");
    }

    #[test]
    fn clinical_status_active_family() {
        let active: Vec<_> = ClinicalStatus::ALL
            .into_iter()
            .filter(|s| s.is_active())
            .collect();
        assert_eq!(
            active,
            vec![
                ClinicalStatus::Active,
                ClinicalStatus::Recurrence,
                ClinicalStatus::Relapse
            ]
        );
    }

    #[test]
    fn status_codeable_concepts_carry_their_system() {
        let concept = VerificationStatus::EnteredInError.to_codeable_concept();
        let coding = concept.first_coding().expect("coding");
        assert_eq!(coding.system.as_deref(), Some(VERIFICATION_STATUS_SYSTEM));
        assert_eq!(coding.code.as_deref(), Some("entered-in-error"));
        assert_eq!(coding.display.as_deref(), Some("Entered in Error"));
    }

    #[test]
    fn strict_parsing_rejects_unknown_codes() {
        assert_eq!(
            "relapse".parse::<ClinicalStatus>().unwrap(),
            ClinicalStatus::Relapse
        );

        let err = "bogus".parse::<ClinicalStatus>().expect_err("unknown code");
        match err {
            FhirError::InvalidInput(msg) => {
                assert!(msg.contains("active, recurrence, relapse, inactive, remission, resolved"));
            }
            other => panic!("expected InvalidInput error, got {other:?}"),
        }

        assert!("maybe".parse::<VerificationStatus>().is_err());
        assert!("chronic".parse::<ConditionCategory>().is_err());
        assert!("critical".parse::<Severity>().is_err());
    }

    #[test]
    fn lenient_category_defaults_to_encounter_diagnosis() {
        assert_eq!(
            ConditionCategory::from_code_lenient("problem-list-item"),
            ConditionCategory::ProblemListItem
        );
        assert_eq!(
            ConditionCategory::from_code_lenient("anything-else"),
            ConditionCategory::EncounterDiagnosis
        );
    }

    #[test]
    fn serde_uses_wire_codes() {
        let json = serde_json::to_string(&VerificationStatus::EnteredInError).unwrap();
        assert_eq!(json, r#""entered-in-error""#);

        let category: ConditionCategory = serde_json::from_str(r#""problem-list-item""#).unwrap();
        assert_eq!(category, ConditionCategory::ProblemListItem);
    }
}
