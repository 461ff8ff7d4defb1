//! Structural validation of Condition resources.
//!
//! This is the conformance gate for the Condition profile subset used by the hospital. Every
//! rule is checked and every failure is reported, so callers can present all problems at once.
//! Absent status fields are allowed; only present-but-invalid values are errors.

use crate::condition::{Condition, RESOURCE_TYPE};
use crate::datatypes::CodeableConcept;
use crate::terminology::{ClinicalStatus, VerificationStatus};
use serde::{Deserialize, Serialize};

/// Outcome of [`validate_condition`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validate the structure of a Condition.
///
/// Rules:
/// 1. `resourceType` must be `Condition`.
/// 2. `subject` must be present.
/// 3. `code` or `category` must be present.
/// 4. A present `clinicalStatus` must carry an allowed code in its first coding.
/// 5. A present `verificationStatus` must carry an allowed code in its first coding.
pub fn validate_condition(condition: &Condition) -> ValidationReport {
    let mut errors = Vec::new();

    if condition.resource_type != RESOURCE_TYPE {
        errors.push(format!("resourceType must be '{RESOURCE_TYPE}'"));
    }

    if condition.subject.is_none() {
        errors.push("subject is required".to_owned());
    }

    if condition.code.is_none() && condition.category.is_empty() {
        errors.push("code or category is required".to_owned());
    }

    if let Some(status) = &condition.clinical_status {
        if !has_allowed_code(status, |code| ClinicalStatus::from_code(code).is_some()) {
            errors.push(format!(
                "Invalid clinicalStatus. Must be one of: {}",
                ClinicalStatus::allowed_codes()
            ));
        }
    }

    if let Some(status) = &condition.verification_status {
        if !has_allowed_code(status, |code| VerificationStatus::from_code(code).is_some()) {
            errors.push(format!(
                "Invalid verificationStatus. Must be one of: {}",
                VerificationStatus::allowed_codes()
            ));
        }
    }

    if !errors.is_empty() {
        tracing::debug!(
            condition_id = condition.id.as_deref().unwrap_or("<none>"),
            error_count = errors.len(),
            "Condition failed validation"
        );
    }

    ValidationReport::from_errors(errors)
}

/// A missing first coding or code counts as not allowed.
fn has_allowed_code(concept: &CodeableConcept, allowed: impl Fn(&str) -> bool) -> bool {
    concept.first_code().is_some_and(allowed)
}
