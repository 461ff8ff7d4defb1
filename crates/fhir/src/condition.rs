//! FHIR Condition resource: construction, accessors and wire helpers.
//!
//! A [`Condition`] is built once from a [`ConditionInput`] and is plain value data afterwards.
//! When the source record changes, build a new one.
//!
//! Responsibilities:
//! - Build FHIR R4 Condition resources from internal hospital data
//! - Provide total accessors that degrade to sentinels instead of failing
//! - Parse and render Condition JSON/YAML, including lists and Bundles
//!
//! Notes:
//! - Construction never fails. A missing patient id yields a Condition without `subject`,
//!   which [`crate::validate_condition`] reports. Run validation before persisting or
//!   transmitting a resource.

use crate::datatypes::{
    format_fhir_instant, parse_fhir_instant, Annotation, ClinicalTime, CodeableConcept, Coding,
    Reference,
};
use crate::reference::{self, UNKNOWN_CONDITION};
use crate::terminology::{
    ClinicalStatus, ConditionCategory, Severity, VerificationStatus, SNOMED_SYSTEM,
};
use crate::validation::{validate_condition, ValidationReport};
use crate::wire::{from_json_text, from_json_value, from_yaml_text};
use crate::{FhirError, FhirResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const RESOURCE_TYPE: &str = "Condition";

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

// ============================================================================
// Public domain-level types
// ============================================================================

/// Narrow input for building a Condition.
///
/// Callers adapt their own record shape to this struct at the boundary. Status axes default to
/// `active` / `confirmed` / `encounter-diagnosis`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConditionInput {
    /// Patient logical id, rendered as `Patient/{id}`.
    pub patient_id: String,

    /// Practitioner logical id, rendered as the `asserter` reference.
    pub practitioner_id: Option<String>,

    /// Encounter logical id.
    pub encounter_id: Option<String>,

    /// Human-readable condition name; also used as the SNOMED display.
    pub condition_display: String,

    /// SNOMED CT code for the condition, when known.
    pub condition_code: Option<String>,

    pub clinical_status: ClinicalStatus,
    pub verification_status: VerificationStatus,
    pub category: ConditionCategory,
    pub severity: Option<Severity>,

    /// ISO-8601 date or date-time the condition began.
    pub onset_date: Option<String>,

    /// ISO-8601 date or date-time the condition resolved.
    pub abatement_date: Option<String>,

    /// ISO-8601 timestamp the condition was recorded. Defaults to construction time.
    pub recorded_date: Option<String>,

    /// Free-text note, stamped with construction time.
    pub notes: Option<String>,
}

impl ConditionInput {
    pub fn new(patient_id: impl Into<String>, condition_display: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            condition_display: condition_display.into(),
            ..Self::default()
        }
    }
}

/// Flat, display-ready summary of one condition.
///
/// This is the row shape condition list views bind to; field names are part of the contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionSummary {
    pub condition: String,
    pub clinical_status: String,
    pub verification_status: String,
    pub category: String,
    pub severity: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    pub is_active: bool,
    pub is_chronic: bool,
}

/// A FHIR R4 Condition resource, in its JSON wire shape.
///
/// Every field tolerates absence on input so that foreign resources can be parsed and then
/// validated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default)]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_status: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asserter: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onset: Option<ClinicalTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abatement: Option<ClinicalTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_date: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<Annotation>,
}

// ============================================================================
// Constructors
// ============================================================================

impl Condition {
    /// Build a Condition from `input`, using the current time for defaults.
    pub fn basic(input: ConditionInput) -> Self {
        Self::basic_at(input, Utc::now())
    }

    /// Build a Condition from `input`, using `now` for the recorded date and note time.
    pub fn basic_at(input: ConditionInput, now: DateTime<Utc>) -> Self {
        let subject = non_blank(&input.patient_id).map(|id| Reference::to_resource("Patient", id));
        let asserter = input
            .practitioner_id
            .as_deref()
            .and_then(non_blank)
            .map(|id| Reference::to_resource("Practitioner", id));
        let encounter = input
            .encounter_id
            .as_deref()
            .and_then(non_blank)
            .map(|id| Reference::to_resource("Encounter", id));
        let code = condition_concept(&input.condition_display, input.condition_code.as_deref());

        let note = non_blank_owned(input.notes)
            .map(|text| {
                vec![Annotation {
                    text,
                    time: Some(format_fhir_instant(now)),
                }]
            })
            .unwrap_or_default();

        let recorded_date =
            non_blank_owned(input.recorded_date).unwrap_or_else(|| format_fhir_instant(now));

        Self {
            resource_type: RESOURCE_TYPE.to_owned(),
            id: None,
            clinical_status: Some(input.clinical_status.to_codeable_concept()),
            verification_status: Some(input.verification_status.to_codeable_concept()),
            category: vec![input.category.to_codeable_concept()],
            code,
            subject,
            asserter,
            encounter,
            severity: input.severity.map(Severity::to_codeable_concept),
            onset: non_blank_owned(input.onset_date).map(ClinicalTime::DateTime),
            abatement: non_blank_owned(input.abatement_date).map(ClinicalTime::DateTime),
            recorded_date: Some(recorded_date),
            note,
        }
    }

    /// A confirmed problem-list item recorded now.
    pub fn chronic(input: ConditionInput, management_notes: Option<String>) -> Self {
        Self::basic(ConditionInput {
            category: ConditionCategory::ProblemListItem,
            verification_status: VerificationStatus::Confirmed,
            recorded_date: None,
            notes: management_notes,
            ..input
        })
    }

    /// A confirmed diagnosis for the current encounter.
    pub fn acute(input: ConditionInput, clinical_notes: Option<String>) -> Self {
        Self::basic(ConditionInput {
            category: ConditionCategory::EncounterDiagnosis,
            verification_status: VerificationStatus::Confirmed,
            notes: clinical_notes,
            ..input
        })
    }

    /// A resolved problem-list item. `abatement` is omitted when no date is given.
    pub fn resolved(
        input: ConditionInput,
        abatement_date: Option<String>,
        resolution_notes: Option<String>,
    ) -> Self {
        Self::basic(ConditionInput {
            category: ConditionCategory::ProblemListItem,
            clinical_status: ClinicalStatus::Resolved,
            abatement_date,
            notes: resolution_notes,
            ..input
        })
    }

    /// Assign the logical resource id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

// ============================================================================
// Accessors and derived facts
// ============================================================================

impl Condition {
    /// Patient id from `subject`, with any `Patient/` prefix removed.
    pub fn patient_id(&self) -> Option<&str> {
        let reference = self.subject.as_ref()?.reference.as_deref()?;
        Some(reference.strip_prefix("Patient/").unwrap_or(reference))
    }

    /// Coding display, else concept text, else `"Unknown Condition"`.
    pub fn condition_display(&self) -> &str {
        self.code
            .as_ref()
            .and_then(|code| {
                code.first_display()
                    .and_then(non_blank)
                    .or_else(|| code.text.as_deref().and_then(non_blank))
            })
            .unwrap_or(UNKNOWN_CONDITION)
    }

    /// SNOMED code of the condition itself.
    pub fn condition_code(&self) -> Option<&str> {
        self.code.as_ref().and_then(CodeableConcept::first_code)
    }

    pub fn clinical_status_code(&self) -> Option<&str> {
        self.clinical_status
            .as_ref()
            .and_then(CodeableConcept::first_code)
    }

    pub fn clinical_status_display(&self) -> &str {
        display_or(self.clinical_status.as_ref(), "Unknown")
    }

    pub fn verification_status_code(&self) -> Option<&str> {
        self.verification_status
            .as_ref()
            .and_then(CodeableConcept::first_code)
    }

    pub fn verification_status_display(&self) -> &str {
        display_or(self.verification_status.as_ref(), "Unknown")
    }

    /// Code of the first category.
    pub fn category_code(&self) -> Option<&str> {
        self.category.first().and_then(CodeableConcept::first_code)
    }

    pub fn category_display(&self) -> &str {
        display_or(self.category.first(), "Unknown")
    }

    pub fn severity_display(&self) -> &str {
        display_or(self.severity.as_ref(), "Not specified")
    }

    /// True for `active`, `recurrence` and `relapse`.
    pub fn is_active(&self) -> bool {
        self.clinical_status_code()
            .and_then(ClinicalStatus::from_code)
            .is_some_and(ClinicalStatus::is_active)
    }

    /// True when the first category is `problem-list-item`.
    pub fn is_chronic(&self) -> bool {
        self.category_code() == Some(ConditionCategory::ProblemListItem.code())
    }

    pub fn is_resolved(&self) -> bool {
        self.clinical_status_code() == Some(ClinicalStatus::Resolved.code())
    }

    pub fn onset_date(&self) -> Option<DateTime<Utc>> {
        self.onset.as_ref().and_then(ClinicalTime::start_instant)
    }

    pub fn abatement_date(&self) -> Option<DateTime<Utc>> {
        self.abatement.as_ref().and_then(ClinicalTime::start_instant)
    }

    pub fn recorded_date(&self) -> Option<DateTime<Utc>> {
        self.recorded_date.as_deref().and_then(parse_fhir_instant)
    }

    /// Whole days from onset to abatement, or to now while the condition is ongoing.
    pub fn duration_days(&self) -> Option<i64> {
        self.duration_days_at(Utc::now())
    }

    /// Whole days from onset to abatement, or to `now` when there is no abatement.
    ///
    /// Partial days are floored. `None` when the onset is unknown.
    pub fn duration_days_at(&self, now: DateTime<Utc>) -> Option<i64> {
        let onset = self.onset_date()?;
        let end = self.abatement_date().unwrap_or(now);
        Some((end - onset).num_milliseconds().div_euclid(MILLIS_PER_DAY))
    }

    pub fn format_for_display(&self) -> ConditionSummary {
        self.format_for_display_at(Utc::now())
    }

    pub fn format_for_display_at(&self, now: DateTime<Utc>) -> ConditionSummary {
        ConditionSummary {
            condition: self.condition_display().to_owned(),
            clinical_status: self.clinical_status_display().to_owned(),
            verification_status: self.verification_status_display().to_owned(),
            category: self.category_display().to_owned(),
            severity: self.severity_display().to_owned(),
            duration: self
                .duration_days_at(now)
                .map(|days| format!("{days} days")),
            is_active: self.is_active(),
            is_chronic: self.is_chronic(),
        }
    }

    /// Run structural validation on this resource.
    pub fn validate(&self) -> ValidationReport {
        validate_condition(self)
    }
}

// ============================================================================
// Wire helpers
// ============================================================================

impl Condition {
    /// Parse a Condition from JSON text.
    ///
    /// The resource is not validated here; call [`Condition::validate`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] naming the failing path when a field has the wrong
    /// shape, or [`FhirError::InvalidJson`] for trailing garbage.
    pub fn parse_json(text: &str) -> FhirResult<Self> {
        from_json_text(text, "Condition")
    }

    /// Parse a Condition from YAML text.
    pub fn parse_yaml(text: &str) -> FhirResult<Self> {
        from_yaml_text(text, "Condition")
    }

    /// Render as pretty-printed FHIR JSON.
    pub fn render_json(&self) -> FhirResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FhirError::Translation(format!("Failed to serialise condition: {e}")))
    }

    pub fn render_yaml(&self) -> FhirResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| FhirError::Translation(format!("Failed to serialise condition: {e}")))
    }
}

/// Parse a JSON array of Conditions or a FHIR Bundle carrying Condition entries.
///
/// Bundle entries holding other resource types are skipped. A Condition entry that does not
/// match the Condition shape fails the whole parse, naming the entry, e.g.
/// `entry[1].resource.note`.
pub fn parse_condition_list_json(text: &str) -> FhirResult<Vec<Condition>> {
    conditions_from_value(from_json_text::<Value>(text, LIST_WHAT)?)
}

/// YAML counterpart of [`parse_condition_list_json`].
pub fn parse_condition_list_yaml(text: &str) -> FhirResult<Vec<Condition>> {
    conditions_from_value(from_yaml_text::<Value>(text, LIST_WHAT)?)
}

// ============================================================================
// List translation (internal)
// ============================================================================

const LIST_WHAT: &str = "Condition list";
const BUNDLE_RESOURCE_TYPE: &str = "Bundle";

fn resource_type_of(value: &Value) -> Option<&str> {
    value.get("resourceType").and_then(Value::as_str)
}

fn conditions_from_value(value: Value) -> FhirResult<Vec<Condition>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| from_json_value(item, LIST_WHAT, &format!("[{i}]")))
            .collect(),
        Value::Object(mut bundle) => {
            let resource_type = bundle.get("resourceType").and_then(Value::as_str);
            if resource_type != Some(BUNDLE_RESOURCE_TYPE) {
                return Err(FhirError::InvalidInput(format!(
                    "Expected an array of Conditions or a Bundle, got resourceType '{}'",
                    resource_type.unwrap_or("<missing>")
                )));
            }
            let entries = match bundle.remove("entry") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(entries)) => entries,
                Some(_) => {
                    return Err(FhirError::Translation(format!(
                        "{LIST_WHAT} schema mismatch at entry: expected an array"
                    )))
                }
            };

            let mut conditions = Vec::new();
            for (i, mut entry) in entries.into_iter().enumerate() {
                let Some(resource) = entry.get_mut("resource").map(Value::take) else {
                    continue;
                };
                if resource_type_of(&resource) != Some(RESOURCE_TYPE) {
                    continue;
                }
                conditions.push(from_json_value(
                    resource,
                    LIST_WHAT,
                    &format!("entry[{i}].resource"),
                )?);
            }
            Ok(conditions)
        }
        _ => Err(FhirError::InvalidInput(
            "Expected an array of Conditions or a Bundle".into(),
        )),
    }
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn non_blank_owned(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn display_or<'a>(concept: Option<&'a CodeableConcept>, fallback: &'a str) -> &'a str {
    concept
        .and_then(CodeableConcept::first_display)
        .and_then(non_blank)
        .unwrap_or(fallback)
}

/// Build the SNOMED-coded `code` concept.
///
/// A blank display is filled from the reference table when the code is known there.
fn condition_concept(display: &str, code: Option<&str>) -> Option<CodeableConcept> {
    let code = code.and_then(non_blank);
    let display = non_blank(display).or_else(|| {
        code.and_then(reference::find_by_code)
            .map(|entry| entry.display)
    });

    if display.is_none() && code.is_none() {
        return None;
    }

    Some(CodeableConcept {
        coding: vec![Coding {
            system: Some(SNOMED_SYSTEM.to_owned()),
            code: code.map(str::to_owned),
            display: display.map(str::to_owned),
        }],
        text: display.map(str::to_owned),
    })
}
