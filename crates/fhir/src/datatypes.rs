//! FHIR R4 general-purpose data types used by Condition resources.
//!
//! Only the subset the Condition mapper reads or writes is modelled. Every field is optional on
//! input so that foreign or partially-populated resources can be parsed and then validated,
//! instead of being rejected by the deserializer.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Coded values
// ============================================================================

/// A single code from a terminology system.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Coding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// A concept expressed as zero or more codings plus optional free text.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    /// Build a concept with exactly one fully-populated coding.
    pub fn coded(system: &str, code: &str, display: &str) -> Self {
        Self {
            coding: vec![Coding {
                system: Some(system.to_owned()),
                code: Some(code.to_owned()),
                display: Some(display.to_owned()),
            }],
            text: None,
        }
    }

    pub fn first_coding(&self) -> Option<&Coding> {
        self.coding.first()
    }

    /// Code of the first coding, if any.
    pub fn first_code(&self) -> Option<&str> {
        self.first_coding().and_then(|c| c.code.as_deref())
    }

    /// Display of the first coding, if any.
    pub fn first_display(&self) -> Option<&str> {
        self.first_coding().and_then(|c| c.display.as_deref())
    }
}

// ============================================================================
// References
// ============================================================================

/// A weak pointer to another resource, e.g. `Patient/123`.
///
/// No referential integrity is enforced here; resolution belongs to the caller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
}

impl Reference {
    /// Build a typed reference of the form `{resource_type}/{id}`.
    pub fn to_resource(resource_type: &str, id: &str) -> Self {
        Self {
            reference: Some(format!("{resource_type}/{id}")),
            resource_type: Some(resource_type.to_owned()),
        }
    }
}

// ============================================================================
// Time values
// ============================================================================

/// A time interval. Either bound may be open.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Period {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// A measured amount.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// An age, expressed as a UCUM-coded quantity.
pub type Age = Quantity;

/// A range of quantities, e.g. an age band.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Range {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<Quantity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<Quantity>,
}

/// Value of a Condition's `onset` or `abatement`.
///
/// On input the variant is picked from the keys present: `low`/`high` is a Range,
/// `start`/`end` a Period, any other object an Age. Keys a variant does not model, such as
/// `id` or `extension`, are ignored.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClinicalTime {
    DateTime(String),
    Period(Period),
    Age(Age),
    Range(Range),
}

impl<'de> Deserialize<'de> for ClinicalTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if let Value::String(text) = value {
            return Ok(ClinicalTime::DateTime(text));
        }
        if !value.is_object() {
            return Err(de::Error::invalid_type(
                de::Unexpected::Other("non-string, non-object value"),
                &"a dateTime string, Period, Age or Range",
            ));
        }

        let has = |key: &str| value.get(key).is_some();
        let is_range = has("low") || has("high");
        let is_period = has("start") || has("end");

        let parsed = if is_range {
            serde_json::from_value(value).map(ClinicalTime::Range)
        } else if is_period {
            serde_json::from_value(value).map(ClinicalTime::Period)
        } else {
            serde_json::from_value(value).map(ClinicalTime::Age)
        };
        parsed.map_err(de::Error::custom)
    }
}

impl ClinicalTime {
    /// The point in time this value starts at, if it can be determined.
    ///
    /// Date strings are parsed directly and periods use their `start`. Ages and ranges are
    /// relative to the patient's birth date, which is not known here, so they yield `None`.
    pub fn start_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            ClinicalTime::DateTime(value) => parse_fhir_instant(value),
            ClinicalTime::Period(period) => period.start.as_deref().and_then(parse_fhir_instant),
            ClinicalTime::Age(_) | ClinicalTime::Range(_) => None,
        }
    }
}

/// A free-text note attached to a resource.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

// ============================================================================
// Date helpers
// ============================================================================

/// Parse a FHIR `date` or `dateTime` string into a UTC instant.
///
/// Accepts RFC 3339 timestamps, local timestamps without an offset (treated as UTC) and bare
/// dates (UTC midnight). Returns `None` for anything else.
pub fn parse_fhir_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Render an instant the way FHIR `instant`/`dateTime` values are written by this crate.
pub(crate) fn format_fhir_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
