//! Layer 2: drug legality and dose ceiling.
//!
//! Drugs missing from the ceiling table pass: an unknown drug is not blocked just for being
//! unknown.

use super::LayerOutcome;
use crate::error::EvaluationError;
use crate::tables::{normalise_drug_name, SafetyTables};
use crate::verdict::LayerResult;

pub fn check(tables: &SafetyTables, drug: &str, dose: f64) -> LayerOutcome {
    let normalised = normalise_drug_name(drug);
    if normalised.is_empty() {
        return Err(EvaluationError::EmptyDrugName);
    }
    if !dose.is_finite() {
        return Err(EvaluationError::NonFiniteDose(dose));
    }

    if tables.is_illegal(&normalised) {
        return Ok(LayerResult::fail(format!(
            "Drug '{drug}' is illegal/controlled substance"
        )));
    }

    if let Some(max_dose) = tables.dose_ceiling(&normalised) {
        if dose > max_dose {
            return Ok(LayerResult::fail(format!(
                "Dose {dose}mg exceeds safe limit of {max_dose}mg"
            ))
            .with_detail("drug", drug)
            .with_detail("dose", dose)
            .with_detail("max_safe_dose", max_dose));
        }
    }

    Ok(LayerResult::pass(format!("Drug '{drug}' at {dose}mg is safe"))
        .with_detail("drug", drug)
        .with_detail("dose", dose)
        .with_detail("status", "valid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dose_within_ceiling_passes() {
        let result = check(&SafetyTables::default(), "oxycodone", 30.0).unwrap();
        assert!(result.passed);
        assert_eq!(result.message, "Drug 'oxycodone' at 30mg is safe");
        assert_eq!(result.details["status"], "valid");
    }

    #[test]
    fn dose_at_ceiling_passes() {
        assert!(check(&SafetyTables::default(), "amlodipine", 10.0).unwrap().passed);
    }

    #[test]
    fn dose_above_ceiling_fails_with_limit() {
        let result = check(&SafetyTables::default(), "Oxycodone ", 75.0).unwrap();
        assert!(!result.passed);
        assert_eq!(result.message, "Dose 75mg exceeds safe limit of 50mg");
        assert_eq!(result.details["drug"], "Oxycodone ");
        assert_eq!(result.details["dose"], 75.0);
        assert_eq!(result.details["max_safe_dose"], 50.0);
    }

    #[test]
    fn illegal_substance_fails_regardless_of_dose() {
        for dose in [0.1, 5.0, 10_000.0] {
            let result = check(&SafetyTables::default(), "HEROIN", dose).unwrap();
            assert!(!result.passed);
            assert_eq!(result.message, "Drug 'HEROIN' is illegal/controlled substance");
        }
    }

    #[test]
    fn unknown_drug_has_no_ceiling() {
        let result = check(&SafetyTables::default(), "semaglutide", 99_999.0).unwrap();
        assert!(result.passed);
    }

    #[test]
    fn empty_drug_and_non_finite_dose_are_evaluation_errors() {
        let tables = SafetyTables::default();
        assert_eq!(
            check(&tables, "   ", 10.0).unwrap_err(),
            EvaluationError::EmptyDrugName
        );
        assert!(matches!(
            check(&tables, "aspirin", f64::INFINITY).unwrap_err(),
            EvaluationError::NonFiniteDose(_)
        ));
    }
}
