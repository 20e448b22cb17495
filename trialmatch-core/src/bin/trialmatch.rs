//! Trialmatch CLI - match patients against clinical trials
//!
//! Usage:
//!     trialmatch match --patients patients.csv
//!     trialmatch match --patients patients.csv --patient-id P001 --json
//!     trialmatch trial --trial-key trials/egfr.json --patients patients.csv
//!     trialmatch check-trials --data-dir data
//!     trialmatch explain --patients patients.csv --patient-id P001 --trial-key trials/egfr.json
//!
//! Logs go to stderr (filter with RUST_LOG) so `--json` output on stdout
//! stays machine readable.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trialmatch_core::matching::{MatchReport, TrialReport};
use trialmatch_core::patients::find_patient;
use trialmatch_core::registry::check_trial_files;
use trialmatch_core::{MatchingEngine, Patient, PatientSource, Result, TrialLoader};

#[derive(Parser, Debug)]
#[command(name = "trialmatch")]
#[command(about = "Match oncology patients against clinical-trial eligibility criteria")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct TrialSelection {
    /// Directory trial keys are relative to
    #[arg(long, env = "TRIALMATCH_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Trial files to load, relative to the data directory (repeatable)
    #[arg(long = "trial", value_name = "FILE")]
    trials: Vec<String>,
}

impl TrialSelection {
    fn loader(&self) -> TrialLoader {
        let loader = TrialLoader::new(self.data_dir.clone());
        if self.trials.is_empty() {
            loader
        } else {
            loader.with_trial_files(self.trials.iter().cloned())
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Match patients against every loaded trial
    Match {
        /// Patient dataset (.csv or .json)
        #[arg(long)]
        patients: PathBuf,

        /// Only match this patient
        #[arg(long)]
        patient_id: Option<String>,

        #[command(flatten)]
        selection: TrialSelection,

        /// Hide trials the patient is not eligible for
        #[arg(long)]
        eligible_only: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Match every patient against one trial
    Trial {
        /// Trial key, e.g. trials/egfr.json
        #[arg(long)]
        trial_key: String,

        /// Patient dataset (.csv or .json)
        #[arg(long)]
        patients: PathBuf,

        #[command(flatten)]
        selection: TrialSelection,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report the load status of each trial file
    CheckTrials {
        #[command(flatten)]
        selection: TrialSelection,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show every rule outcome for one patient and one trial
    Explain {
        /// Patient dataset (.csv or .json)
        #[arg(long)]
        patients: PathBuf,

        #[arg(long)]
        patient_id: String,

        /// Trial key, e.g. trials/egfr.json
        #[arg(long)]
        trial_key: String,

        #[command(flatten)]
        selection: TrialSelection,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "trialmatch=info,trialmatch_core=info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the command ran but found invalid input
fn run(command: Command) -> Result<bool> {
    match command {
        Command::Match {
            patients,
            patient_id,
            selection,
            eligible_only,
            json,
        } => {
            let patients = load_patients(&patients)?;
            let engine = load_engine(&selection)?;

            let selected: Vec<&Patient> = match &patient_id {
                Some(id) => vec![find_patient(&patients, id)?],
                None => patients.iter().collect(),
            };

            let reports: Vec<(&Patient, MatchReport)> = selected
                .into_iter()
                .map(|patient| {
                    let report = MatchReport::new(&patient.patient_id, engine.find_matches_for_patient(patient));
                    let report = if eligible_only { report.eligible_only() } else { report };
                    (patient, report)
                })
                .collect();

            if json {
                let reports: Vec<&MatchReport> = reports.iter().map(|(_, report)| report).collect();
                print_json(&reports)?;
            } else {
                for (patient, report) in &reports {
                    output_match_report(report, patient);
                }
            }
            Ok(true)
        }

        Command::Trial {
            trial_key,
            patients,
            selection,
            json,
        } => {
            let patients = load_patients(&patients)?;
            let engine = load_engine(&selection)?;

            let report = engine.trial_report(&trial_key, &patients)?;

            if json {
                print_json(&report)?;
            } else {
                output_trial_report(&report);
            }
            Ok(true)
        }

        Command::CheckTrials { selection, json } => {
            let loader = selection.loader();
            let report = check_trial_files(loader.data_dir(), loader.trial_files());

            if json {
                print_json(&report)?;
            } else {
                for check in &report.checks {
                    println!("{}: {}", check.file, check.status);
                    for warning in &check.warnings {
                        println!("    warning: {}", warning);
                    }
                }
                println!();
                println!("{}", report.summary());
            }
            Ok(report.is_all_valid())
        }

        Command::Explain {
            patients,
            patient_id,
            trial_key,
            selection,
        } => {
            let patients = load_patients(&patients)?;
            let patient = find_patient(&patients, &patient_id)?;
            let engine = load_engine(&selection)?;

            let snapshot = engine.trials();
            let trial = snapshot.get(&trial_key).ok_or_else(|| {
                trialmatch_core::TrialMatchError::TrialNotFound {
                    trial_key: trial_key.clone(),
                }
            })?;

            println!("{}", patient);
            println!("{} [{}]", trial.title, trial.trial_id);
            println!("Criteria: {}", trial.criteria);
            println!();
            for outcome in engine.explain(patient, &trial.criteria) {
                let mark = if outcome.passed { "PASS" } else { "FAIL" };
                println!("  [{}] {:<18} {}", mark, outcome.rule, outcome.reason);
            }

            let (is_match, _) = engine.match_patient_to_trial(patient, &trial.criteria);
            println!();
            println!("{}", if is_match { "ELIGIBLE" } else { "NOT ELIGIBLE" });

            if !trial.criteria.raw_inclusion.is_empty() {
                println!();
                println!("Inclusion criteria:");
                for line in &trial.criteria.raw_inclusion {
                    println!("  - {}", line);
                }
            }
            if !trial.criteria.raw_exclusion.is_empty() {
                println!();
                println!("Exclusion criteria:");
                for line in &trial.criteria.raw_exclusion {
                    println!("  - {}", line);
                }
            }
            Ok(true)
        }
    }
}

fn load_patients(path: &Path) -> Result<Vec<Patient>> {
    PatientSource::new().load(path)
}

fn load_engine(selection: &TrialSelection) -> Result<MatchingEngine> {
    let trials = selection.loader().load()?;
    Ok(MatchingEngine::with_trials(trials))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn output_match_report(report: &MatchReport, patient: &Patient) {
    println!("{}", patient);
    for result in &report.results {
        let mark = if result.is_match { "ELIGIBLE" } else { "NOT ELIGIBLE" };
        println!("  [{}] {} ({})", mark, result.trial_title, result.source);
        for reason in &result.reasons {
            println!("      - {}", reason);
        }
    }
    println!(
        "  {} of {} trials eligible",
        report.summary.eligible, report.summary.total
    );
    println!();
}

fn output_trial_report(report: &TrialReport) {
    println!("{} ({})", report.trial_title, report.trial_key);
    for result in &report.results {
        let mark = if result.is_match { "ELIGIBLE" } else { "NOT ELIGIBLE" };
        println!("  [{}] {}", mark, result.patient_id);
        for reason in &result.reasons {
            println!("      - {}", reason);
        }
    }
    println!();
    println!(
        "{} of {} patients eligible",
        report.summary.eligible, report.summary.total
    );
}
