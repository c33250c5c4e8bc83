//! Static drug safety tables.
//!
//! This is the single source of truth for the illegal-substance list and the safe dose ceilings.
//! Adapters that want to show these values (REST `/drugs`, CLI `drugs`) read them from
//! [`SafetyTables`] rather than keeping their own copies.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Substances that are never prescribable.
pub const ILLEGAL_SUBSTANCES: &[&str] = &["heroin", "fentanyl_street", "meth", "cocaine", "pcp"];

/// Maximum safe single dose in milligrams.
pub const DOSE_CEILINGS_MG: &[(&str, f64)] = &[
    ("oxycodone", 50.0),
    ("morphine", 100.0),
    ("hydrocodone", 40.0),
    ("codeine", 60.0),
    ("paracetamol", 1000.0),
    ("ibuprofen", 800.0),
    ("aspirin", 500.0),
    ("metformin", 2550.0),
    ("lisinopril", 40.0),
    ("atenolol", 100.0),
    ("vitamin_d", 4000.0),
    ("atorvastatin", 80.0),
    ("amlodipine", 10.0),
    ("albuterol", 200.0),
    ("insulin", 300.0),
];

/// Normalise a drug name for table lookups.
///
/// # Arguments
///
/// * `raw` - Drug name as submitted.
///
/// # Returns
///
/// The name trimmed and lowercased, the form every table and rule is keyed by.
pub fn normalise_drug_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Read-only view over the illegal-substance set and dose ceilings.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SafetyTables {
    illegal_substances: BTreeSet<String>,
    dose_ceilings_mg: BTreeMap<String, f64>,
}

impl SafetyTables {
    /// Check a drug against the illegal-substance list.
    ///
    /// # Arguments
    ///
    /// * `drug` - Normalised drug name.
    ///
    /// # Returns
    ///
    /// `true` if the drug may never be prescribed.
    pub fn is_illegal(&self, drug: &str) -> bool {
        self.illegal_substances.contains(drug)
    }

    /// Maximum safe single dose for a drug.
    ///
    /// # Arguments
    ///
    /// * `drug` - Normalised drug name.
    ///
    /// # Returns
    ///
    /// The ceiling in milligrams, or `None` for drugs without one.
    pub fn dose_ceiling(&self, drug: &str) -> Option<f64> {
        self.dose_ceilings_mg.get(drug).copied()
    }

    /// Illegal substances in alphabetical order.
    pub fn illegal_substances(&self) -> impl Iterator<Item = &str> {
        self.illegal_substances.iter().map(String::as_str)
    }

    /// `(drug, milligrams)` pairs in alphabetical order of drug.
    pub fn dose_ceilings(&self) -> impl Iterator<Item = (&str, f64)> {
        self.dose_ceilings_mg.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Default for SafetyTables {
    fn default() -> Self {
        Self {
            illegal_substances: ILLEGAL_SUBSTANCES.iter().map(|s| s.to_string()).collect(),
            dose_ceilings_mg: DOSE_CEILINGS_MG
                .iter()
                .map(|(drug, mg)| (drug.to_string(), *mg))
                .collect(),
        }
    }
}
