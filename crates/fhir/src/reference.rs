//! Static SNOMED CT reference table of commonly recorded conditions.
//!
//! The table is process-wide read-only data. Lookups are by SNOMED CT code unless stated
//! otherwise; the `key` is a stable slug for UI pickers.

use crate::terminology::Severity;

/// Default display returned when a code is not in any table.
pub const UNKNOWN_CONDITION: &str = "Unknown Condition";

/// One row of the reference table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReferenceCondition {
    pub key: &'static str,
    pub code: &'static str,
    pub display: &'static str,
}

const fn entry(key: &'static str, code: &'static str, display: &'static str) -> ReferenceCondition {
    ReferenceCondition { key, code, display }
}

pub const CHRONIC_CONDITIONS: &[ReferenceCondition] = &[
    entry("diabetes-type-2", "44054006", "Diabetes mellitus type 2"),
    entry("hypertension", "38341003", "Hypertensive disorder"),
    entry("asthma", "195967001", "Asthma"),
    entry("copd", "13645005", "Chronic obstructive pulmonary disease"),
    entry("heart-disease", "56265001", "Heart disease"),
    entry("arthritis", "3723001", "Arthritis"),
    entry("depression", "35489007", "Depressive disorder"),
    entry("anxiety", "197480006", "Anxiety disorder"),
];

pub const ACUTE_CONDITIONS: &[ReferenceCondition] = &[
    entry("pneumonia", "233604007", "Pneumonia"),
    entry("bronchitis", "32398004", "Bronchitis"),
    entry("uti", "68566005", "Urinary tract infection"),
    entry("gastroenteritis", "25374005", "Gastroenteritis"),
    entry("migraine", "37796009", "Migraine"),
    entry("fracture", "125605004", "Fracture of bone"),
    entry("sprain", "44465007", "Sprain"),
    entry("laceration", "312608009", "Laceration"),
];

pub const EMERGENCY_CONDITIONS: &[ReferenceCondition] = &[
    entry("heart-attack", "22298006", "Myocardial infarction"),
    entry("stroke", "230690007", "Cerebrovascular accident"),
    entry("anaphylaxis", "39579001", "Anaphylaxis"),
    entry("sepsis", "91302008", "Sepsis"),
    entry("respiratory-failure", "409622000", "Respiratory failure"),
    entry("cardiac-arrest", "410429000", "Cardiac arrest"),
];

fn all_conditions() -> impl Iterator<Item = &'static ReferenceCondition> {
    CHRONIC_CONDITIONS
        .iter()
        .chain(ACUTE_CONDITIONS)
        .chain(EMERGENCY_CONDITIONS)
}

fn contains_code(table: &[ReferenceCondition], code: &str) -> bool {
    table.iter().any(|c| c.code == code)
}

/// Default severity for a code: severe for emergencies, moderate for chronic conditions.
///
/// Acute conditions have no default severity.
pub fn condition_severity(code: &str) -> Option<Severity> {
    if is_emergency_condition(code) {
        Some(Severity::Severe)
    } else if is_chronic_condition(code) {
        Some(Severity::Moderate)
    } else {
        None
    }
}

pub fn is_chronic_condition(code: &str) -> bool {
    contains_code(CHRONIC_CONDITIONS, code)
}

pub fn is_emergency_condition(code: &str) -> bool {
    contains_code(EMERGENCY_CONDITIONS, code)
}

/// Display name for a code across all tables, or [`UNKNOWN_CONDITION`].
pub fn display_name(code: &str) -> &'static str {
    find_by_code(code).map_or(UNKNOWN_CONDITION, |c| c.display)
}

pub fn find_by_code(code: &str) -> Option<&'static ReferenceCondition> {
    all_conditions().find(|c| c.code == code)
}

pub fn find_by_key(key: &str) -> Option<&'static ReferenceCondition> {
    all_conditions().find(|c| c.key == key)
}
