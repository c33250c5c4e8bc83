//! Typed reference records.
//!
//! Prescriber and patient rows arrive from tabular sources as loosely-typed cells. The ingestion
//! adapter converts them into the records defined here, so the pipeline never inspects untyped
//! data. Records are immutable once loaded.

use crate::constants::TAG_DELIMITER;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// CREDENTIALING
// ============================================================================

/// Credentialing status of a prescriber.
///
/// Parsing is case-insensitive. Any status outside the known set is preserved verbatim in
/// `Other` so that denial messages can report exactly what the source said.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CredentialStatus {
    Active,
    Suspended,
    Revoked,
    Other(String),
}

impl CredentialStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, CredentialStatus::Active)
    }
}

impl From<&str> for CredentialStatus {
    fn from(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("active") {
            CredentialStatus::Active
        } else if trimmed.eq_ignore_ascii_case("suspended") {
            CredentialStatus::Suspended
        } else if trimmed.eq_ignore_ascii_case("revoked") {
            CredentialStatus::Revoked
        } else {
            CredentialStatus::Other(trimmed.to_owned())
        }
    }
}

impl From<String> for CredentialStatus {
    fn from(value: String) -> Self {
        CredentialStatus::from(value.as_str())
    }
}

impl From<CredentialStatus> for String {
    fn from(value: CredentialStatus) -> Self {
        value.to_string()
    }
}

impl fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialStatus::Active => f.write_str("Active"),
            CredentialStatus::Suspended => f.write_str("Suspended"),
            CredentialStatus::Revoked => f.write_str("Revoked"),
            CredentialStatus::Other(raw) => f.write_str(raw),
        }
    }
}

// ============================================================================
// ORGAN FUNCTION
// ============================================================================

/// Liver or kidney function status.
///
/// Values outside the known set are kept verbatim in `Other`. They are shown as given in patient
/// details and never match a contraindication trigger.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrganFunction {
    #[default]
    Normal,
    Impaired,
    Severe,
    Other(String),
}

impl OrganFunction {
    pub fn as_str(&self) -> &str {
        match self {
            OrganFunction::Normal => "normal",
            OrganFunction::Impaired => "impaired",
            OrganFunction::Severe => "severe",
            OrganFunction::Other(raw) => raw,
        }
    }
}

/// Case-insensitive; surrounding whitespace is ignored.
impl From<&str> for OrganFunction {
    fn from(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "normal" => OrganFunction::Normal,
            "impaired" => OrganFunction::Impaired,
            "severe" => OrganFunction::Severe,
            _ => OrganFunction::Other(trimmed.to_owned()),
        }
    }
}

impl From<String> for OrganFunction {
    fn from(value: String) -> Self {
        OrganFunction::from(value.as_str())
    }
}

impl From<OrganFunction> for String {
    fn from(value: OrganFunction) -> Self {
        value.as_str().to_owned()
    }
}

impl fmt::Display for OrganFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// A credentialed prescriber.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriberRecord {
    #[serde(rename = "prescriber_id")]
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub status: CredentialStatus,
    /// DEA registration number; valid numbers start with `A`.
    pub dea_number: String,
    pub license_number: String,
}

/// A patient and the clinical attributes used by the contraindication rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(rename = "patient_id")]
    pub id: String,
    pub name: String,
    /// `None` when the source row had no usable age.
    pub age: Option<u32>,
    /// Normalised condition tags.
    pub conditions: BTreeSet<String>,
    /// Normalised drug-name tags for current medications.
    pub medications: BTreeSet<String>,
    pub liver_status: OrganFunction,
    pub kidney_status: OrganFunction,
}

impl PatientRecord {
    pub fn takes_medication(&self, drug: &str) -> bool {
        self.medications.contains(drug)
    }

    pub fn has_condition(&self, tag: &str) -> bool {
        self.conditions.contains(tag)
    }

    /// True if any condition tag contains `marker` as a substring.
    pub fn has_condition_containing(&self, marker: &str) -> bool {
        self.conditions.iter().any(|c| c.contains(marker))
    }
}

/// Split a delimited cell into a set of normalised tags.
///
/// Tags are trimmed and lowercased; empty fragments are dropped, so an absent or blank cell
/// yields an empty set.
pub fn split_tags(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(|value| {
        value
            .split(TAG_DELIMITER)
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_status_parses_case_insensitively() {
        assert_eq!(CredentialStatus::from(" ACTIVE "), CredentialStatus::Active);
        assert_eq!(CredentialStatus::from("suspended"), CredentialStatus::Suspended);
        assert_eq!(
            CredentialStatus::from("Pending review"),
            CredentialStatus::Other("Pending review".into())
        );
    }

    #[test]
    fn credential_status_serialises_as_display_text() {
        let json = serde_json::to_string(&CredentialStatus::Revoked).unwrap();
        assert_eq!(json, "\"Revoked\"");
    }

    #[test]
    fn organ_function_keeps_unknown_values_verbatim() {
        assert_eq!(OrganFunction::from(" Severe"), OrganFunction::Severe);
        assert_eq!(OrganFunction::from("Mild "), OrganFunction::Other("Mild".into()));
        assert_eq!(OrganFunction::from("Mild").to_string(), "Mild");
        let json = serde_json::to_string(&OrganFunction::Impaired).unwrap();
        assert_eq!(json, "\"impaired\"");
    }

    #[test]
    fn split_tags_normalises_and_drops_blanks() {
        let tags = split_tags(Some(" Hypertension;;CKD_stage_3 ; "));
        assert_eq!(
            tags.into_iter().collect::<Vec<_>>(),
            vec!["ckd_stage_3".to_string(), "hypertension".to_string()]
        );
        assert!(split_tags(None).is_empty());
        assert!(split_tags(Some("")).is_empty());
    }
}
