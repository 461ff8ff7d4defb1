//! FHIR Condition mapping for the hospital management system.
//!
//! This crate translates internal hospital diagnosis records into FHIR R4 `Condition`
//! resources and provides the read-side helpers the rest of the system binds to:
//! - construction of Condition resources from a narrow input struct or an HMS record
//! - total accessors and derived facts (display names, activity, chronicity, duration)
//! - structural validation against the Condition profile subset in use
//! - classification and search over collections of conditions
//! - a static SNOMED CT reference table of common conditions
//!
//! Everything here is synchronous and pure. Nothing is persisted; callers own storage and
//! transport. The FHIR JSON shape of [`Condition`] is the output contract.

pub mod condition;
pub mod datatypes;
pub mod hms;
pub mod query;
pub mod reference;
pub mod terminology;
pub mod validation;
mod wire;

// Re-export facades
pub use condition::{Condition, ConditionInput, ConditionSummary};
pub use hms::HmsDiagnosis;
pub use validation::{validate_condition, ValidationReport};

// Re-export public domain-level types
pub use condition::{parse_condition_list_json, parse_condition_list_yaml};
pub use datatypes::{
    Age, Annotation, ClinicalTime, CodeableConcept, Coding, Period, Quantity, Range, Reference,
};
pub use query::{
    active_conditions, chronic_conditions, conditions_by_severity, group_by_category,
    search_conditions, ConditionBucket, ConditionFilter, ConditionGroups,
};
pub use reference::{
    condition_severity, display_name, is_chronic_condition, is_emergency_condition,
    ReferenceCondition, ACUTE_CONDITIONS, CHRONIC_CONDITIONS, EMERGENCY_CONDITIONS,
};
pub use terminology::{
    severity_code, ClinicalStatus, ConditionCategory, Severity, VerificationStatus,
};

/// Errors returned by the `hms-fhir` crate.
///
/// Only parsing can fail. Constructors, accessors, validation and queries are total.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
