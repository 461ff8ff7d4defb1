//! Request and response bodies for the REST API.
//!
//! FHIR resources travel as their JSON wire shape; OpenAPI documents them as free-form objects.

use hms_fhir::{
    ClinicalStatus, Condition, ConditionCategory, ConditionFilter, ConditionInput,
    ConditionSummary, FhirResult, ReferenceCondition, Severity, ValidationReport,
    VerificationStatus,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Which constructor to use for a new Condition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    #[default]
    Basic,
    Chronic,
    Acute,
    Resolved,
}

/// Fields for building a Condition. Status values use their FHIR codes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateConditionReq {
    pub kind: ConditionKind,
    pub patient_id: String,
    pub practitioner_id: Option<String>,
    pub encounter_id: Option<String>,
    pub condition_display: String,
    pub condition_code: Option<String>,
    pub clinical_status: Option<String>,
    pub verification_status: Option<String>,
    /// `problem-list-item`; anything else is an encounter diagnosis.
    pub category: Option<String>,
    pub severity: Option<String>,
    pub onset_date: Option<String>,
    pub abatement_date: Option<String>,
    pub recorded_date: Option<String>,
    pub notes: Option<String>,
}

impl CreateConditionReq {
    /// Build the Condition this request describes.
    ///
    /// # Errors
    ///
    /// Returns an error when a status or severity value is not a known code. Those fields are
    /// closed code sets on [`ConditionInput`], so an unknown code cannot be built and validated
    /// later.
    pub fn into_condition(self) -> FhirResult<Condition> {
        let mut input = ConditionInput {
            patient_id: self.patient_id,
            practitioner_id: self.practitioner_id,
            encounter_id: self.encounter_id,
            condition_display: self.condition_display,
            condition_code: self.condition_code,
            clinical_status: parse_or_default::<ClinicalStatus>(self.clinical_status)?,
            verification_status: parse_or_default::<VerificationStatus>(
                self.verification_status,
            )?,
            category: self
                .category
                .as_deref()
                .map(ConditionCategory::from_code_lenient)
                .unwrap_or_default(),
            severity: self
                .severity
                .as_deref()
                .map(str::parse::<Severity>)
                .transpose()?,
            onset_date: self.onset_date,
            abatement_date: self.abatement_date,
            recorded_date: self.recorded_date,
            notes: None,
        };

        Ok(match self.kind {
            ConditionKind::Basic => Condition::basic(ConditionInput {
                notes: self.notes,
                ..input
            }),
            ConditionKind::Chronic => Condition::chronic(input, self.notes),
            ConditionKind::Acute => Condition::acute(input, self.notes),
            ConditionKind::Resolved => {
                let abatement_date = input.abatement_date.take();
                Condition::resolved(input, abatement_date, self.notes)
            }
        })
    }
}

fn parse_or_default<T>(value: Option<String>) -> FhirResult<T>
where
    T: std::str::FromStr<Err = hms_fhir::FhirError> + Default,
{
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::parse::<T>)
        .transpose()
        .map(Option::unwrap_or_default)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConditionRes {
    #[schema(value_type = Object)]
    pub condition: Condition,
    pub validation: ValidationRes,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationRes {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl From<ValidationReport> for ValidationRes {
    fn from(report: ValidationReport) -> Self {
        Self {
            valid: report.valid,
            errors: report.errors,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConditionListReq {
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub conditions: Vec<Condition>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SummaryRes {
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<ConditionSummary>,
    /// Number of conditions in each display bucket, keyed by bucket label.
    pub groups: BTreeMap<String, usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchReq {
    #[schema(value_type = Vec<Object>)]
    pub conditions: Vec<Condition>,
    pub text: Option<String>,
    pub severity: Option<String>,
    pub active_only: bool,
    pub chronic_only: bool,
}

impl SearchReq {
    pub fn filter(&self) -> ConditionFilter {
        ConditionFilter {
            text: self.text.clone(),
            severity: self.severity.clone(),
            active_only: self.active_only,
            chronic_only: self.chronic_only,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReferenceConditionRes {
    pub key: String,
    pub code: String,
    pub display: String,
    /// Default severity label, absent for acute conditions.
    pub severity: Option<String>,
    pub chronic: bool,
    pub emergency: bool,
}

impl From<&ReferenceCondition> for ReferenceConditionRes {
    fn from(entry: &ReferenceCondition) -> Self {
        Self {
            key: entry.key.to_owned(),
            code: entry.code.to_owned(),
            display: entry.display.to_owned(),
            severity: hms_fhir::condition_severity(entry.code).map(|s| s.label().to_owned()),
            chronic: hms_fhir::is_chronic_condition(entry.code),
            emergency: hms_fhir::is_emergency_condition(entry.code),
        }
    }
}
