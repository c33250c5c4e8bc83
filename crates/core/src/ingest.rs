//! Reference data ingestion.
//!
//! Prescriber and patient tables are read from YAML or JSON files (chosen by extension). Each file
//! holds a list of rows whose cells may be text, numbers or booleans, as they come out of a
//! spreadsheet export. Rows are first deserialised into schema-free raw rows and then converted
//! into typed records:
//!
//! - a row without an identifier or name, or with a list/map cell, is skipped with a warning,
//! - clinical and registration gaps (odd organ status, missing age or DEA number) keep the row,
//!   so the layers judge it,
//! - a file that cannot be read or parsed makes the whole table unavailable.
//!
//! Only this module turns low-level failures into "no records available"; the pipeline never sees
//! an ingestion error.

use crate::config::CoreConfig;
use crate::records::{split_tags, CredentialStatus, OrganFunction, PatientRecord, PrescriberRecord};
use crate::store::ReferenceSnapshot;
use crate::{FirewallError, FirewallResult};
use rxfw_types::NonBlank;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::Path;

// ============================================================================
// RAW ROWS
// ============================================================================

/// A single spreadsheet cell.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawCell {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    /// Lists and maps. Not valid in any column.
    Other(serde_json::Value),
}

impl RawCell {
    fn scalar(&self) -> Option<String> {
        match self {
            RawCell::Integer(v) => Some(v.to_string()),
            RawCell::Float(v) => Some(v.to_string()),
            RawCell::Bool(v) => Some(v.to_string()),
            RawCell::Text(v) => Some(v.clone()),
            RawCell::Other(_) => None,
        }
    }
}

/// Prescriber row as found in the source, before validation.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawPrescriberRow {
    #[serde(default, alias = "doctor_id")]
    pub prescriber_id: Option<RawCell>,
    #[serde(default)]
    pub name: Option<RawCell>,
    #[serde(default)]
    pub specialty: Option<RawCell>,
    #[serde(default, alias = "status")]
    pub credentialing_status: Option<RawCell>,
    #[serde(default, alias = "registration_number")]
    pub dea_number: Option<RawCell>,
    #[serde(default)]
    pub license_number: Option<RawCell>,
}

/// Patient row as found in the source, before validation.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawPatientRow {
    #[serde(default)]
    pub patient_id: Option<RawCell>,
    #[serde(default)]
    pub name: Option<RawCell>,
    #[serde(default)]
    pub age: Option<RawCell>,
    #[serde(default)]
    pub conditions: Option<RawCell>,
    #[serde(default)]
    pub medications: Option<RawCell>,
    #[serde(default)]
    pub liver_status: Option<RawCell>,
    #[serde(default)]
    pub kidney_status: Option<RawCell>,
}

fn scalar(cell: &RawCell, column: &str) -> Result<String, String> {
    cell.scalar()
        .ok_or_else(|| format!("unsupported value in {column}"))
}

/// Trimmed cell text; blank cells read as absent.
fn optional(cell: Option<&RawCell>, column: &str) -> Result<Option<String>, String> {
    let Some(cell) = cell else {
        return Ok(None);
    };
    let text = scalar(cell, column)?;
    let trimmed = text.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_owned()))
}

fn required(cell: Option<&RawCell>, column: &str) -> Result<String, String> {
    optional(cell, column)?.ok_or_else(|| format!("missing {column}"))
}

/// Identifiers are matched by exact equality, so they are kept as written.
fn identifier(cell: Option<&RawCell>, column: &'static str) -> Result<String, String> {
    let cell = cell.ok_or_else(|| format!("missing {column}"))?;
    NonBlank::new(column, scalar(cell, column)?)
        .map(NonBlank::into_inner)
        .map_err(|e| e.to_string())
}

fn organ_function(
    cell: Option<&RawCell>,
    column: &str,
    patient_id: &str,
) -> Result<OrganFunction, String> {
    let status = optional(cell, column)?
        .map(OrganFunction::from)
        .unwrap_or_default();
    if let OrganFunction::Other(raw) = &status {
        tracing::warn!(
            "patient {}: unrecognised {} '{}' matches no contraindication rule",
            patient_id,
            column,
            raw
        );
    }
    Ok(status)
}

/// A missing or unusable age leaves the field unset.
fn age(cell: Option<&RawCell>, patient_id: &str) -> Option<u32> {
    let cell = cell?;
    let parsed = match cell {
        RawCell::Integer(v) => u32::try_from(*v).ok(),
        RawCell::Float(v) if v.fract() == 0.0 && *v >= 0.0 && *v <= f64::from(u32::MAX) => {
            Some(*v as u32)
        }
        RawCell::Text(v) if v.trim().is_empty() => return None,
        RawCell::Text(v) => v.trim().parse().ok(),
        RawCell::Float(_) | RawCell::Bool(_) | RawCell::Other(_) => None,
    };
    if parsed.is_none() {
        tracing::warn!("patient {}: ignoring unusable age {:?}", patient_id, cell);
    }
    parsed
}

impl TryFrom<RawPrescriberRow> for PrescriberRecord {
    type Error = String;

    /// Absent status or DEA number load as empty text and are rejected by authorisation.
    fn try_from(row: RawPrescriberRow) -> Result<Self, Self::Error> {
        Ok(PrescriberRecord {
            id: identifier(row.prescriber_id.as_ref(), "prescriber_id")?,
            name: required(row.name.as_ref(), "name")?,
            specialty: optional(row.specialty.as_ref(), "specialty")?.unwrap_or_default(),
            status: CredentialStatus::from(
                optional(row.credentialing_status.as_ref(), "credentialing_status")?
                    .unwrap_or_default(),
            ),
            dea_number: optional(row.dea_number.as_ref(), "dea_number")?.unwrap_or_default(),
            license_number: optional(row.license_number.as_ref(), "license_number")?
                .unwrap_or_default(),
        })
    }
}

impl TryFrom<RawPatientRow> for PatientRecord {
    type Error = String;

    fn try_from(row: RawPatientRow) -> Result<Self, Self::Error> {
        let id = identifier(row.patient_id.as_ref(), "patient_id")?;
        Ok(PatientRecord {
            name: required(row.name.as_ref(), "name")?,
            age: age(row.age.as_ref(), &id),
            conditions: split_tags(optional(row.conditions.as_ref(), "conditions")?.as_deref()),
            medications: split_tags(optional(row.medications.as_ref(), "medications")?.as_deref()),
            liver_status: organ_function(row.liver_status.as_ref(), "liver_status", &id)?,
            kidney_status: organ_function(row.kidney_status.as_ref(), "kidney_status", &id)?,
            id,
        })
    }
}

// ============================================================================
// FILE LOADING
// ============================================================================

/// Deserialise a list of rows from a YAML or JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, has an unsupported extension, or does not parse.
/// Parse errors carry the path of the offending field.
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> FirewallResult<Vec<T>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let contents = fs::read_to_string(path).map_err(|source| FirewallError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    match extension.as_deref() {
        Some("yaml") | Some("yml") => {
            let de = serde_yaml::Deserializer::from_str(&contents);
            serde_path_to_error::deserialize(de).map_err(|source| {
                FirewallError::YamlDeserialization {
                    path: path.to_path_buf(),
                    source,
                }
            })
        }
        Some("json") => {
            let mut de = serde_json::Deserializer::from_str(&contents);
            serde_path_to_error::deserialize(&mut de).map_err(|source| {
                FirewallError::JsonDeserialization {
                    path: path.to_path_buf(),
                    source,
                }
            })
        }
        _ => Err(FirewallError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Convert raw rows into records, skipping rows that fail validation.
fn convert_rows<R, T>(rows: Vec<R>, path: &Path) -> Vec<T>
where
    T: TryFrom<R, Error = String>,
{
    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| match T::try_from(row) {
            Ok(record) => Some(record),
            Err(reason) => {
                let err = FirewallError::InvalidRow {
                    row: index + 1,
                    reason,
                };
                tracing::warn!("skipping row in {}: {}", path.display(), err);
                None
            }
        })
        .collect()
}

/// Load the prescriber table.
pub fn load_prescribers(path: &Path) -> FirewallResult<Vec<PrescriberRecord>> {
    let rows: Vec<RawPrescriberRow> = read_rows(path)?;
    Ok(convert_rows(rows, path))
}

/// Load the patient table.
pub fn load_patients(path: &Path) -> FirewallResult<Vec<PatientRecord>> {
    let rows: Vec<RawPatientRow> = read_rows(path)?;
    Ok(convert_rows(rows, path))
}

/// Load both tables named by `cfg` into a snapshot.
///
/// Never fails: a table whose file cannot be loaded is marked unavailable and the error is logged.
pub fn load_snapshot(cfg: &CoreConfig) -> ReferenceSnapshot {
    let prescribers = match load_prescribers(cfg.prescribers_path()) {
        Ok(records) => {
            tracing::info!(
                "loaded {} prescribers from {}",
                records.len(),
                cfg.prescribers_path().display()
            );
            Some(records)
        }
        Err(e) => {
            tracing::error!("prescriber data unavailable: {}", e);
            None
        }
    };

    let patients = match load_patients(cfg.patients_path()) {
        Ok(records) => {
            tracing::info!(
                "loaded {} patients from {}",
                records.len(),
                cfg.patients_path().display()
            );
            Some(records)
        }
        Err(e) => {
            tracing::error!("patient data unavailable: {}", e);
            None
        }
    };

    ReferenceSnapshot::new(prescribers, patients)
}
