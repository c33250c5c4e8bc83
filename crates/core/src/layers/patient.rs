//! Layer 1: patient validation.
//!
//! Only loading and existence gate this layer; clinical content never fails it. The clinical
//! attributes are surfaced in the details for display and for the contraindication layer's
//! consumers.

use super::LayerOutcome;
use crate::store::ReferenceSnapshot;
use crate::verdict::LayerResult;
use serde_json::Value;

pub fn check(snapshot: &ReferenceSnapshot, patient_id: &str) -> LayerOutcome {
    if !snapshot.patients_loaded() {
        return Ok(LayerResult::fail("Patient database not loaded"));
    }

    let Some(patient) = snapshot.find_patient(patient_id) else {
        return Ok(LayerResult::fail(format!("Patient {patient_id} not found")));
    };

    let conditions: Vec<String> = patient.conditions.iter().cloned().collect();
    let medications: Vec<String> = patient.medications.iter().cloned().collect();

    Ok(LayerResult::pass(format!("Patient {} found", patient.name))
        .with_detail("name", patient.name.as_str())
        .with_detail("age", patient.age.map_or(Value::Null, Value::from))
        .with_detail("conditions", conditions)
        .with_detail("medications", medications)
        .with_detail("liver_status", patient.liver_status.as_str())
        .with_detail("kidney_status", patient.kidney_status.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::OrganFunction;
    use crate::store::tests::patient;
    use serde_json::json;

    #[test]
    fn existing_patient_passes_with_clinical_details() {
        let snapshot = ReferenceSnapshot::new(
            None,
            Some(vec![patient(
                "P001",
                "Diabetes;Hypertension",
                "Metformin",
                OrganFunction::Normal,
                OrganFunction::Impaired,
            )]),
        );

        let result = check(&snapshot, "P001").unwrap();
        assert!(result.passed);
        assert_eq!(result.message, "Patient Patient P001 found");
        assert_eq!(result.details["age"], 54);
        assert_eq!(result.details["conditions"], json!(["diabetes", "hypertension"]));
        assert_eq!(result.details["medications"], json!(["metformin"]));
        assert_eq!(result.details["liver_status"], "normal");
        assert_eq!(result.details["kidney_status"], "impaired");
    }

    #[test]
    fn severe_clinical_state_never_fails_this_layer() {
        let snapshot = ReferenceSnapshot::new(
            None,
            Some(vec![patient(
                "P002",
                "cirrhosis",
                "",
                OrganFunction::Severe,
                OrganFunction::Severe,
            )]),
        );
        assert!(check(&snapshot, "P002").unwrap().passed);
    }

    #[test]
    fn unrecognised_status_and_unknown_age_still_pass() {
        let mut record = patient(
            "P003",
            "",
            "",
            OrganFunction::from("mild"),
            OrganFunction::Normal,
        );
        record.age = None;
        let snapshot = ReferenceSnapshot::new(None, Some(vec![record]));

        let result = check(&snapshot, "P003").unwrap();
        assert!(result.passed);
        assert_eq!(result.details["liver_status"], "mild");
        assert_eq!(result.details["age"], Value::Null);
    }

    #[test]
    fn missing_patient_fails() {
        let snapshot = ReferenceSnapshot::new(None, Some(vec![]));
        let result = check(&snapshot, "P404").unwrap();
        assert!(!result.passed);
        assert_eq!(result.message, "Patient P404 not found");
    }

    #[test]
    fn unloaded_table_fails() {
        let result = check(&ReferenceSnapshot::unavailable(), "P001").unwrap();
        assert_eq!(result.message, "Patient database not loaded");
    }
}
