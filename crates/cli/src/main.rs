use anyhow::Context;
use api_shared::{
    analyze_bulk, AnalysisRes, AnalyzeReq, BulkAnalyzeItem, PatientProfileRes,
    PrescriberProfileRes, SafetyTablesRes, StatsRes,
};
use clap::{Parser, Subcommand};
use rxfw_core::{CoreConfig, Dose, PrescriptionFirewall};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status when at least one analysed prescription is denied.
const DENIED_EXIT_CODE: u8 = 2;

#[derive(Parser)]
#[command(name = "rxfw")]
#[command(about = "Prescription firewall CLI")]
struct Cli {
    /// Prescriber reference file (YAML or JSON); defaults to RXFW_PRESCRIBERS_FILE
    #[arg(long, global = true)]
    prescribers: Option<PathBuf>,
    /// Patient reference file (YAML or JSON); defaults to RXFW_PATIENTS_FILE
    #[arg(long, global = true)]
    patients: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a single prescription
    Analyze {
        /// Prescriber identifier
        prescriber: String,
        /// Patient identifier
        patient: String,
        /// Drug name
        drug: String,
        /// Dose in milligrams, e.g. 30, 30mg or "30 mg"
        dose: Dose,
    },
    /// Analyse every request in a YAML or JSON list
    Bulk {
        /// File holding a list of {prescriber_id, patient_id, drug, dose}
        file: PathBuf,
    },
    /// Show a prescriber profile
    Prescriber { id: String },
    /// Show a patient profile
    Patient { id: String },
    /// Show reference data counts
    Stats,
    /// Show the drug safety tables
    Drugs,
}

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout carries only JSON.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("rxfw=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let cfg = Arc::new(resolve_config(
        cli.prescribers,
        cli.patients,
        std::env::var("RXFW_PRESCRIBERS_FILE").ok(),
        std::env::var("RXFW_PATIENTS_FILE").ok(),
    )?);
    let firewall = PrescriptionFirewall::new(cfg);

    match cli.command {
        Commands::Analyze {
            prescriber,
            patient,
            drug,
            dose,
        } => {
            let request = AnalyzeReq {
                prescriber_id: prescriber,
                patient_id: patient,
                drug,
                dose: dose.milligrams(),
            }
            .validate()?;
            let verdict = AnalysisRes::from(firewall.analyze(
                &request.prescriber_id,
                &request.patient_id,
                &request.drug,
                request.dose,
            ));
            print_json(&verdict)?;
            Ok(exit_code(verdict.approved))
        }
        Commands::Bulk { file } => {
            let requests = read_requests(&file)?;
            let items = analyze_bulk(&firewall, requests);
            print_json(&items)?;
            Ok(exit_code(all_approved(&items)))
        }
        Commands::Prescriber { id } => {
            let profile = firewall
                .prescriber_profile(&id)
                .with_context(|| format!("Prescriber {id} not found"))?;
            print_json(&PrescriberProfileRes::from(profile))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Patient { id } => {
            let profile = firewall
                .patient_profile(&id)
                .with_context(|| format!("Patient {id} not found"))?;
            print_json(&PatientProfileRes::from(profile))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Stats => {
            print_json(&StatsRes::from(firewall.statistics()))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Drugs => {
            print_json(&SafetyTablesRes::from(firewall.safety_tables()))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Command-line paths take precedence over environment values.
fn resolve_config(
    prescribers: Option<PathBuf>,
    patients: Option<PathBuf>,
    env_prescribers: Option<String>,
    env_patients: Option<String>,
) -> anyhow::Result<CoreConfig> {
    let defaults = CoreConfig::from_env_values(env_prescribers, env_patients)?;
    let cfg = CoreConfig::new(
        prescribers.unwrap_or_else(|| defaults.prescribers_path().to_path_buf()),
        patients.unwrap_or_else(|| defaults.patients_path().to_path_buf()),
    )?;
    Ok(cfg)
}

fn read_requests(path: &Path) -> anyhow::Result<Vec<AnalyzeReq>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let requests = if is_json {
        serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))?
    } else {
        serde_yaml::from_str(&raw).with_context(|| format!("invalid YAML in {}", path.display()))?
    };
    Ok(requests)
}

/// Invalid items count as not approved.
fn all_approved(items: &[BulkAnalyzeItem]) -> bool {
    items
        .iter()
        .all(|item| matches!(item, BulkAnalyzeItem::Analysis(a) if a.approved))
}

fn exit_code(approved: bool) -> ExitCode {
    if approved {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(DENIED_EXIT_CODE)
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
