//! Reading condition documents from disk.
//!
//! The format is picked from the file extension: `.yaml`/`.yml` is YAML, anything else JSON.

use hms_fhir::{
    parse_condition_list_json, parse_condition_list_yaml, Condition, FhirResult, HmsDiagnosis,
};
use std::path::Path;

pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => Format::Yaml,
            _ => Format::Json,
        }
    }
}

fn read_with<T>(
    path: &Path,
    json: fn(&str) -> FhirResult<T>,
    yaml: fn(&str) -> FhirResult<T>,
) -> CliResult<T> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let parsed = match Format::from_path(path) {
        Format::Json => json(&text),
        Format::Yaml => yaml(&text),
    };
    parsed.map_err(|e| format!("{}: {e}", path.display()).into())
}

pub fn read_diagnosis(path: &Path) -> CliResult<HmsDiagnosis> {
    read_with(path, HmsDiagnosis::parse_json, HmsDiagnosis::parse_yaml)
}

pub fn read_condition(path: &Path) -> CliResult<Condition> {
    read_with(path, Condition::parse_json, Condition::parse_yaml)
}

/// Read an array of Conditions or a Bundle.
pub fn read_condition_list(path: &Path) -> CliResult<Vec<Condition>> {
    read_with(path, parse_condition_list_json, parse_condition_list_yaml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        file
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(Format::from_path(Path::new("a.yaml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("a.YML")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("a.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("noext")), Format::Json);
    }

    #[test]
    fn reads_yaml_diagnosis() {
        let file = write_temp(".yaml", "patientId: 9\ndiagnosis: Asthma\nstatus: resolved\n");
        let record = read_diagnosis(file.path()).expect("read diagnosis");
        assert_eq!(record.patient_id.as_deref(), Some("9"));
        assert!(Condition::from_hms_diagnosis(&record).is_resolved());
    }

    #[test]
    fn reads_json_bundle() {
        let file = write_temp(
            ".json",
            r#"{"resourceType":"Bundle","entry":[{"resource":{"resourceType":"Condition","subject":{"reference":"Patient/1"}}}]}"#,
        );
        let conditions = read_condition_list(file.path()).expect("read bundle");
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].patient_id(), Some("1"));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let file = write_temp(".json", r#"{"resourceType":"Condition","note":5}"#);
        let err = read_condition(file.path()).expect_err("bad note");
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_condition(Path::new("/definitely/not/here.json")).is_err());
    }
}
