//! Shared deserialisation helpers that report the failing field path.

use crate::{FhirError, FhirResult};
use serde::de::DeserializeOwned;
use std::fmt::Display;

/// Deserialize JSON text, surfacing a best-effort path (e.g. `category[0].coding`) on mismatch.
pub(crate) fn from_json_text<T: DeserializeOwned>(text: &str, what: &str) -> FhirResult<T> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    let value = serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|err| schema_mismatch(what, err))?;
    deserializer.end()?;
    Ok(value)
}

/// Deserialize YAML text, surfacing a best-effort path on mismatch.
pub(crate) fn from_yaml_text<T: DeserializeOwned>(text: &str, what: &str) -> FhirResult<T> {
    let deserializer = serde_yaml::Deserializer::from_str(text);
    serde_path_to_error::deserialize(deserializer).map_err(|err| schema_mismatch(what, err))
}

/// Deserialize one nested JSON value. `at` is the value's own path inside the enclosing
/// document and prefixes any reported path.
pub(crate) fn from_json_value<T: DeserializeOwned>(
    value: serde_json::Value,
    what: &str,
    at: &str,
) -> FhirResult<T> {
    serde_path_to_error::deserialize(value).map_err(|err| {
        let inner = err.path().to_string();
        let path = if is_root(&inner) {
            at.to_owned()
        } else if inner.starts_with('[') {
            format!("{at}{inner}")
        } else {
            format!("{at}.{inner}")
        };
        FhirError::Translation(format!("{what} schema mismatch at {path}: {}", err.into_inner()))
    })
}

fn is_root(path: &str) -> bool {
    path.is_empty() || path == "."
}

fn schema_mismatch<E: Display>(what: &str, err: serde_path_to_error::Error<E>) -> FhirError {
    let path = err.path().to_string();
    let source = err.into_inner();
    let path = if is_root(&path) { "<root>" } else { path.as_str() };
    FhirError::Translation(format!("{what} schema mismatch at {path}: {source}"))
}
