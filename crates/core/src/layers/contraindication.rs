//! Layer 3: contraindication detection.
//!
//! Rules live in [`CONTRAINDICATION_RULES`] and are evaluated in order; the first match wins.
//! This layer fails open: if the patient data cannot be consulted, the prescription is allowed
//! through with an advisory message.

use super::LayerOutcome;
use crate::constants::{CKD_MARKER, KIDNEY_DISEASE_CONDITION};
use crate::error::EvaluationError;
use crate::records::{OrganFunction, PatientRecord};
use crate::store::ReferenceSnapshot;
use crate::tables::normalise_drug_name;
use crate::verdict::LayerResult;
use serde::Serialize;

pub const OPIOIDS: &[&str] = &["oxycodone", "morphine", "hydrocodone", "codeine"];
pub const NSAIDS: &[&str] = &["aspirin", "ibuprofen"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    OpioidsLiverDisease,
    OpioidsKidneyDisease,
    NsaidKidneyDisease,
    DrugDrugInteraction,
    MetforminKidneyDisease,
}

impl Reason {
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::OpioidsLiverDisease => "opioids_liver_disease",
            Reason::OpioidsKidneyDisease => "opioids_kidney_disease",
            Reason::NsaidKidneyDisease => "nsaid_kidney_disease",
            Reason::DrugDrugInteraction => "drug_drug_interaction",
            Reason::MetforminKidneyDisease => "metformin_kidney_disease",
        }
    }
}

/// Patient-side condition that triggers a rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Trigger {
    /// Liver status is one of the listed values.
    Liver(&'static [OrganFunction]),
    /// Kidney status is one of the listed values.
    Kidney(&'static [OrganFunction]),
    /// A condition tag marks kidney disease.
    KidneyDiseaseCondition,
    /// The patient currently takes this drug.
    CurrentMedication(&'static str),
}

impl Trigger {
    fn matches(self, patient: &PatientRecord) -> bool {
        match self {
            Trigger::Liver(statuses) => statuses.contains(&patient.liver_status),
            Trigger::Kidney(statuses) => statuses.contains(&patient.kidney_status),
            Trigger::KidneyDiseaseCondition => {
                patient.has_condition(KIDNEY_DISEASE_CONDITION)
                    || patient.has_condition_containing(CKD_MARKER)
            }
            Trigger::CurrentMedication(drug) => patient.takes_medication(drug),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ContraindicationRule {
    pub reason: Reason,
    pub severity: Severity,
    /// Normalised drug names the rule applies to.
    pub drugs: &'static [&'static str],
    pub trigger: Trigger,
    /// Interaction subtype for drug-drug rules.
    pub interaction: Option<&'static str>,
}

const COMPROMISED: &[OrganFunction] = &[OrganFunction::Severe, OrganFunction::Impaired];
const SEVERE: &[OrganFunction] = &[OrganFunction::Severe];

pub const CONTRAINDICATION_RULES: &[ContraindicationRule] = &[
    ContraindicationRule {
        reason: Reason::OpioidsLiverDisease,
        severity: Severity::Critical,
        drugs: OPIOIDS,
        trigger: Trigger::Liver(COMPROMISED),
        interaction: None,
    },
    ContraindicationRule {
        reason: Reason::OpioidsKidneyDisease,
        severity: Severity::Critical,
        drugs: OPIOIDS,
        trigger: Trigger::Kidney(SEVERE),
        interaction: None,
    },
    ContraindicationRule {
        reason: Reason::NsaidKidneyDisease,
        severity: Severity::High,
        drugs: NSAIDS,
        trigger: Trigger::KidneyDiseaseCondition,
        interaction: None,
    },
    ContraindicationRule {
        reason: Reason::DrugDrugInteraction,
        severity: Severity::Critical,
        drugs: &["aspirin"],
        trigger: Trigger::CurrentMedication("warfarin"),
        interaction: Some("aspirin_warfarin"),
    },
    ContraindicationRule {
        reason: Reason::MetforminKidneyDisease,
        severity: Severity::High,
        drugs: &["metformin"],
        trigger: Trigger::Kidney(COMPROMISED),
        interaction: None,
    },
];

impl ContraindicationRule {
    fn applies(&self, drug: &str, patient: &PatientRecord) -> bool {
        self.drugs.iter().any(|d| *d == drug) && self.trigger.matches(patient)
    }

    fn message(&self, drug: &str, patient: &PatientRecord) -> String {
        match self.reason {
            Reason::OpioidsLiverDisease => format!(
                "CONTRAINDICATION: {drug} contraindicated with {} liver disease",
                patient.liver_status
            ),
            Reason::OpioidsKidneyDisease => {
                format!("CONTRAINDICATION: {drug} contraindicated with severe kidney disease")
            }
            Reason::NsaidKidneyDisease => {
                "CONTRAINDICATION: NSAIDs contraindicated with kidney disease".into()
            }
            Reason::DrugDrugInteraction => {
                "CONTRAINDICATION: Aspirin-Warfarin interaction (bleeding risk)".into()
            }
            Reason::MetforminKidneyDisease => {
                "CONTRAINDICATION: Metformin contraindicated with kidney impairment".into()
            }
        }
    }

    fn to_result(self, drug: &str, patient: &PatientRecord) -> LayerResult {
        let result = LayerResult::fail(self.message(drug, patient))
            .with_detail("reason", self.reason.as_str())
            .with_detail("severity", self.severity.as_str());
        match self.interaction {
            Some(interaction) => result.with_detail("interaction", interaction),
            None => result,
        }
    }
}

/// Find the first rule that applies to `drug` (normalised) for this patient.
pub fn first_match(drug: &str, patient: &PatientRecord) -> Option<&'static ContraindicationRule> {
    CONTRAINDICATION_RULES
        .iter()
        .find(|rule| rule.applies(drug, patient))
}

/// `_dose` is accepted for future dose-dependent rules; no current rule uses it.
pub fn check(
    snapshot: &ReferenceSnapshot,
    patient_id: &str,
    drug: &str,
    _dose: f64,
) -> LayerOutcome {
    if !snapshot.patients_loaded() {
        return Ok(LayerResult::pass(
            "Cannot check contraindications - patient DB unavailable",
        ));
    }

    let Some(patient) = snapshot.find_patient(patient_id) else {
        return Ok(LayerResult::pass(
            "Patient not found for contraindication check",
        ));
    };

    let normalised = normalise_drug_name(drug);
    if normalised.is_empty() {
        return Err(EvaluationError::EmptyDrugName);
    }

    if let Some(rule) = first_match(&normalised, patient) {
        return Ok(rule.to_result(drug, patient));
    }

    let conditions: Vec<String> = patient.conditions.iter().cloned().collect();
    Ok(LayerResult::pass("No contraindications detected")
        .with_detail("checked", true)
        .with_detail("conditions", conditions)
        .with_detail("status", "safe"))
}
