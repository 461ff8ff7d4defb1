mod files;

use clap::{Parser, Subcommand, ValueEnum};
use files::{read_condition, read_condition_list, read_diagnosis, CliResult};
use hms_fhir::reference::{find_by_code, find_by_key};
use hms_fhir::{
    condition_severity, group_by_category, is_chronic_condition, is_emergency_condition,
    ClinicalStatus, Condition, ConditionBucket, ConditionCategory, ConditionFilter,
    ConditionInput, ConditionSummary, Severity, ValidationReport, VerificationStatus,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hms-fhir")]
#[command(about = "HMS FHIR Condition mapper CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum Kind {
    #[default]
    Basic,
    Chronic,
    Acute,
    Resolved,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an HMS diagnosis record into a FHIR Condition
    Convert {
        /// Diagnosis file (.json, .yaml or .yml)
        file: PathBuf,
        /// Print YAML instead of JSON
        #[arg(long)]
        yaml: bool,
    },
    /// Build a Condition from command line fields
    New {
        /// Patient id
        #[arg(long)]
        patient: String,
        /// Condition display text
        #[arg(long)]
        display: String,
        #[arg(long, value_enum, default_value_t = Kind::Basic)]
        kind: Kind,
        /// SNOMED CT code
        #[arg(long)]
        code: Option<String>,
        /// Clinical status code (active, recurrence, relapse, inactive, remission, resolved)
        #[arg(long)]
        status: Option<ClinicalStatus>,
        /// Verification status code
        #[arg(long)]
        verification: Option<VerificationStatus>,
        /// problem-list-item or encounter-diagnosis
        #[arg(long)]
        category: Option<String>,
        /// mild, moderate or severe
        #[arg(long)]
        severity: Option<Severity>,
        /// Onset date (ISO-8601)
        #[arg(long)]
        onset: Option<String>,
        /// Abatement date (ISO-8601)
        #[arg(long)]
        abatement: Option<String>,
        #[arg(long)]
        practitioner: Option<String>,
        #[arg(long)]
        encounter: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Print YAML instead of JSON
        #[arg(long)]
        yaml: bool,
    },
    /// Validate a FHIR Condition file
    Validate {
        file: PathBuf,
    },
    /// Print grouped one-line summaries of a Condition list or Bundle
    Summary {
        file: PathBuf,
    },
    /// Filter a Condition list or Bundle
    Search {
        file: PathBuf,
        /// Case-insensitive match against display and code
        #[arg(long)]
        text: Option<String>,
        /// Severity display (Mild, Moderate, Severe)
        #[arg(long)]
        severity: Option<String>,
        /// Only active conditions
        #[arg(long)]
        active: bool,
        /// Only active chronic conditions
        #[arg(long)]
        chronic: bool,
    },
    /// Look up a reference condition by SNOMED CT code or key
    Lookup {
        code: String,
    },
}

struct NewArgs {
    input: ConditionInput,
    kind: Kind,
    notes: Option<String>,
}

fn build_condition(args: NewArgs) -> Condition {
    let NewArgs {
        mut input,
        kind,
        notes,
    } = args;
    match kind {
        Kind::Basic => Condition::basic(ConditionInput { notes, ..input }),
        Kind::Chronic => Condition::chronic(input, notes),
        Kind::Acute => Condition::acute(input, notes),
        Kind::Resolved => {
            let abatement = input.abatement_date.take();
            Condition::resolved(input, abatement, notes)
        }
    }
}

fn render(condition: &Condition, yaml: bool) -> CliResult<String> {
    Ok(if yaml {
        condition.render_yaml()?
    } else {
        condition.render_json()?
    })
}

fn report_errors(report: &ValidationReport) {
    for error in &report.errors {
        eprintln!("  - {}", error);
    }
}

fn summary_line(row: &ConditionSummary) -> String {
    let mut line = format!(
        "{} | {} | {} | {}",
        row.condition, row.clinical_status, row.verification_status, row.severity
    );
    if let Some(duration) = &row.duration {
        line.push_str(" | ");
        line.push_str(duration);
    }
    line
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert { file, yaml }) => {
            let record = read_diagnosis(&file)?;
            let condition = Condition::from_hms_diagnosis(&record);
            println!("{}", render(&condition, yaml)?);

            let report = condition.validate();
            if !report.valid {
                eprintln!("Converted condition is not valid:");
                report_errors(&report);
            }
        }
        Some(Commands::New {
            patient,
            display,
            kind,
            code,
            status,
            verification,
            category,
            severity,
            onset,
            abatement,
            practitioner,
            encounter,
            notes,
            yaml,
        }) => {
            let input = ConditionInput {
                practitioner_id: practitioner,
                encounter_id: encounter,
                condition_code: code,
                clinical_status: status.unwrap_or_default(),
                verification_status: verification.unwrap_or_default(),
                category: category
                    .as_deref()
                    .map(ConditionCategory::from_code_lenient)
                    .unwrap_or_default(),
                severity,
                onset_date: onset,
                abatement_date: abatement,
                ..ConditionInput::new(patient, display)
            };
            let condition = build_condition(NewArgs { input, kind, notes });
            println!("{}", render(&condition, yaml)?);
        }
        Some(Commands::Validate { file }) => {
            let condition = read_condition(&file)?;
            let report = condition.validate();
            if report.valid {
                println!("valid");
            } else {
                eprintln!("{} is not valid:", file.display());
                report_errors(&report);
                std::process::exit(1);
            }
        }
        Some(Commands::Summary { file }) => {
            let conditions = read_condition_list(&file)?;
            let groups = group_by_category(&conditions);
            let mut printed = false;
            for bucket in ConditionBucket::ALL {
                let members = groups.bucket(bucket);
                if members.is_empty() {
                    continue;
                }
                printed = true;
                println!("{} ({})", bucket, members.len());
                for condition in members {
                    println!("  {}", summary_line(&condition.format_for_display()));
                }
            }
            if !printed {
                println!("No conditions found.");
            }
        }
        Some(Commands::Search {
            file,
            text,
            severity,
            active,
            chronic,
        }) => {
            let conditions = read_condition_list(&file)?;
            let filter = ConditionFilter {
                text,
                severity,
                active_only: active,
                chronic_only: chronic,
            };
            let matches = filter.apply(&conditions);
            if matches.is_empty() {
                println!("No matching conditions.");
            }
            for condition in matches {
                println!("{}", summary_line(&condition.format_for_display()));
            }
        }
        Some(Commands::Lookup { code }) => {
            match find_by_code(&code).or_else(|| find_by_key(&code)) {
                Some(entry) => {
                    println!("Code: {}, Key: {}, Display: {}", entry.code, entry.key, entry.display);
                    if let Some(severity) = condition_severity(entry.code) {
                        println!("Default severity: {}", severity.display());
                    }
                    if is_chronic_condition(entry.code) {
                        println!("Chronic");
                    }
                    if is_emergency_condition(entry.code) {
                        println!("Emergency");
                    }
                }
                None => {
                    eprintln!("No reference condition for '{}'", code);
                    std::process::exit(1);
                }
            }
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_new_with_typed_statuses() {
        let cli = Cli::try_parse_from([
            "hms-fhir",
            "new",
            "--patient",
            "p1",
            "--display",
            "Asthma",
            "--kind",
            "chronic",
            "--status",
            "remission",
            "--severity",
            "moderate",
        ])
        .expect("valid arguments");
        match cli.command {
            Some(Commands::New {
                kind,
                status,
                severity,
                ..
            }) => {
                assert_eq!(kind, Kind::Chronic);
                assert_eq!(status, Some(ClinicalStatus::Remission));
                assert_eq!(severity, Some(Severity::Moderate));
            }
            _ => panic!("expected the new command"),
        }
    }

    #[test]
    fn cli_rejects_unknown_status() {
        let result = Cli::try_parse_from([
            "hms-fhir",
            "new",
            "--patient",
            "p1",
            "--display",
            "Asthma",
            "--status",
            "cured",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn resolved_kind_moves_abatement_into_the_resolution() {
        let input = ConditionInput {
            abatement_date: Some("2024-03-01".into()),
            ..ConditionInput::new("p1", "Pneumonia")
        };
        let condition = build_condition(NewArgs {
            input,
            kind: Kind::Resolved,
            notes: Some("cleared".into()),
        });
        assert!(condition.is_resolved());
        assert!(condition.abatement_date().is_some());
        assert_eq!(condition.note.len(), 1);
    }

    #[test]
    fn summary_line_includes_duration_when_known() {
        let row = ConditionSummary {
            condition: "Asthma".into(),
            clinical_status: "Active".into(),
            verification_status: "Confirmed".into(),
            category: "Problem List Item".into(),
            severity: "Moderate".into(),
            duration: Some("12 days".into()),
            is_active: true,
            is_chronic: true,
        };
        assert_eq!(summary_line(&row), "Asthma | Active | Confirmed | Moderate | 12 days");

        let row = ConditionSummary {
            duration: None,
            ..row
        };
        assert_eq!(summary_line(&row), "Asthma | Active | Confirmed | Moderate");
    }
}
