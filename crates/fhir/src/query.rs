//! Classification and search over collections of Conditions.
//!
//! All operations borrow the input slice and return references into it.

use crate::condition::Condition;
use serde::Serialize;
use std::fmt;

/// Display bucket of a condition list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConditionBucket {
    ActiveProblems,
    ChronicConditions,
    EncounterDiagnoses,
    ResolvedConditions,
    Other,
}

impl ConditionBucket {
    pub const ALL: [ConditionBucket; 5] = [
        ConditionBucket::ActiveProblems,
        ConditionBucket::ChronicConditions,
        ConditionBucket::EncounterDiagnoses,
        ConditionBucket::ResolvedConditions,
        ConditionBucket::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ConditionBucket::ActiveProblems => "Active Problems",
            ConditionBucket::ChronicConditions => "Chronic Conditions",
            ConditionBucket::EncounterDiagnoses => "Encounter Diagnoses",
            ConditionBucket::ResolvedConditions => "Resolved Conditions",
            ConditionBucket::Other => "Other",
        }
    }

    /// Pick the bucket for one condition. The first matching rule wins:
    /// resolved, then chronic, then active, then a category display equal to the
    /// "Encounter Diagnoses" label.
    ///
    /// The category table displays "Encounter Diagnosis", so only resources built elsewhere
    /// with the plural display reach that bucket. Inactive encounter diagnoses land in Other.
    pub fn classify(condition: &Condition) -> Self {
        if condition.is_resolved() {
            ConditionBucket::ResolvedConditions
        } else if condition.is_chronic() {
            ConditionBucket::ChronicConditions
        } else if condition.is_active() {
            ConditionBucket::ActiveProblems
        } else if condition.category_display() == ConditionBucket::EncounterDiagnoses.label() {
            ConditionBucket::EncounterDiagnoses
        } else {
            ConditionBucket::Other
        }
    }
}

impl fmt::Display for ConditionBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Conditions partitioned into display buckets. Serialises with the bucket labels as keys.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ConditionGroups<'a> {
    #[serde(rename = "Active Problems")]
    pub active_problems: Vec<&'a Condition>,

    #[serde(rename = "Chronic Conditions")]
    pub chronic_conditions: Vec<&'a Condition>,

    #[serde(rename = "Encounter Diagnoses")]
    pub encounter_diagnoses: Vec<&'a Condition>,

    #[serde(rename = "Resolved Conditions")]
    pub resolved_conditions: Vec<&'a Condition>,

    #[serde(rename = "Other")]
    pub other: Vec<&'a Condition>,
}

impl<'a> ConditionGroups<'a> {
    pub fn bucket(&self, bucket: ConditionBucket) -> &[&'a Condition] {
        match bucket {
            ConditionBucket::ActiveProblems => &self.active_problems,
            ConditionBucket::ChronicConditions => &self.chronic_conditions,
            ConditionBucket::EncounterDiagnoses => &self.encounter_diagnoses,
            ConditionBucket::ResolvedConditions => &self.resolved_conditions,
            ConditionBucket::Other => &self.other,
        }
    }

    fn bucket_mut(&mut self, bucket: ConditionBucket) -> &mut Vec<&'a Condition> {
        match bucket {
            ConditionBucket::ActiveProblems => &mut self.active_problems,
            ConditionBucket::ChronicConditions => &mut self.chronic_conditions,
            ConditionBucket::EncounterDiagnoses => &mut self.encounter_diagnoses,
            ConditionBucket::ResolvedConditions => &mut self.resolved_conditions,
            ConditionBucket::Other => &mut self.other,
        }
    }

    /// Bucket sizes in display order.
    pub fn counts(&self) -> Vec<(ConditionBucket, usize)> {
        ConditionBucket::ALL
            .into_iter()
            .map(|bucket| (bucket, self.bucket(bucket).len()))
            .collect()
    }
}

/// Partition conditions into mutually exclusive display buckets.
pub fn group_by_category(conditions: &[Condition]) -> ConditionGroups<'_> {
    let mut groups = ConditionGroups::default();
    for condition in conditions {
        groups
            .bucket_mut(ConditionBucket::classify(condition))
            .push(condition);
    }
    groups
}

pub fn active_conditions(conditions: &[Condition]) -> Vec<&Condition> {
    conditions.iter().filter(|c| c.is_active()).collect()
}

/// Conditions that are both on the problem list and currently active.
pub fn chronic_conditions(conditions: &[Condition]) -> Vec<&Condition> {
    conditions
        .iter()
        .filter(|c| c.is_chronic() && c.is_active())
        .collect()
}

/// Case-insensitive match on the severity display (e.g. `"severe"`).
pub fn conditions_by_severity<'a>(conditions: &'a [Condition], severity: &str) -> Vec<&'a Condition> {
    conditions
        .iter()
        .filter(|c| c.severity_display().eq_ignore_ascii_case(severity))
        .collect()
}

/// Case-insensitive substring search over the condition name and its SNOMED code.
pub fn search_conditions<'a>(conditions: &'a [Condition], text: &str) -> Vec<&'a Condition> {
    let needle = text.to_lowercase();
    conditions
        .iter()
        .filter(|c| matches_text(c, &needle))
        .collect()
}

fn matches_text(condition: &Condition, needle: &str) -> bool {
    condition.condition_display().to_lowercase().contains(needle)
        || condition
            .condition_code()
            .is_some_and(|code| code.to_lowercase().contains(needle))
}

/// Composable filter used by list endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConditionFilter {
    pub text: Option<String>,
    pub severity: Option<String>,
    pub active_only: bool,
    pub chronic_only: bool,
}

impl ConditionFilter {
    pub fn matches(&self, condition: &Condition) -> bool {
        if self.active_only && !condition.is_active() {
            return false;
        }
        if self.chronic_only && !(condition.is_chronic() && condition.is_active()) {
            return false;
        }
        if let Some(severity) = &self.severity {
            if !condition.severity_display().eq_ignore_ascii_case(severity) {
                return false;
            }
        }
        match &self.text {
            Some(text) => matches_text(condition, &text.to_lowercase()),
            None => true,
        }
    }

    pub fn apply<'a>(&self, conditions: &'a [Condition]) -> Vec<&'a Condition> {
        conditions.iter().filter(|c| self.matches(c)).collect()
    }
}
