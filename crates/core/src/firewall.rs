//! Prescription firewall orchestrator.
//!
//! [`PrescriptionFirewall`] owns the reference store, the safety tables, and the analysis
//! counters. `analyze` runs the four layers in order against a single snapshot:
//!
//! ```text
//! Layer0 --pass--> Layer1 --pass--> Layer2 --pass--> Layer3 --pass--> Done (approved, 100)
//!   |                |                |                |
//!   +-fail (0)       +-fail (25)      +-fail (50)      +-fail (25) --> Done (denied)
//! ```
//!
//! Layers after the first failure are never evaluated and are reported as skipped placeholders.
//! An evaluation error fails layers 0 to 2 but lets layer 3 pass with a warning.

use crate::config::CoreConfig;
use crate::constants::{APPROVAL_REASON, APPROVED_SAFETY_SCORE};
use crate::error::EvaluationError;
use crate::ingest;
use crate::layers::{authorization, contraindication, drug_safety, patient};
use crate::metrics::{FirewallMetrics, FirewallStatistics};
use crate::records::{PatientRecord, PrescriberRecord};
use crate::store::{ReferenceSnapshot, ReferenceStore};
use crate::tables::SafetyTables;
use crate::verdict::{Layer, LayerResult, PrescriptionVerdict};
use crate::{FirewallError, FirewallResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// The four inputs of one analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionRequest {
    pub prescriber_id: String,
    pub patient_id: String,
    pub drug: String,
    pub dose: f64,
}

/// Table sizes after a reload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadSummary {
    pub prescribers_loaded: bool,
    pub patients_loaded: bool,
    pub total_prescribers: usize,
    pub total_patients: usize,
}

impl ReloadSummary {
    fn of(snapshot: &ReferenceSnapshot) -> Self {
        Self {
            prescribers_loaded: snapshot.prescribers_loaded(),
            patients_loaded: snapshot.patients_loaded(),
            total_prescribers: snapshot.prescriber_count(),
            total_patients: snapshot.patient_count(),
        }
    }
}

#[derive(Debug)]
pub struct PrescriptionFirewall {
    cfg: Option<Arc<CoreConfig>>,
    store: ReferenceStore,
    tables: SafetyTables,
    metrics: FirewallMetrics,
}

impl PrescriptionFirewall {
    /// Create a firewall and load reference data from the files named by `cfg`.
    ///
    /// Loading never fails; unreadable sources leave the corresponding table unavailable.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let snapshot = ingest::load_snapshot(&cfg);
        Self {
            cfg: Some(cfg),
            store: ReferenceStore::new(snapshot),
            tables: SafetyTables::default(),
            metrics: FirewallMetrics::new(),
        }
    }

    /// Create a firewall over an already-built snapshot, with no source to reload from.
    pub fn from_snapshot(snapshot: ReferenceSnapshot) -> Self {
        Self {
            cfg: None,
            store: ReferenceStore::new(snapshot),
            tables: SafetyTables::default(),
            metrics: FirewallMetrics::new(),
        }
    }

    /// Run the four-layer analysis.
    ///
    /// Always returns a complete verdict. Only the analysis counters are touched.
    pub fn analyze(
        &self,
        prescriber_id: &str,
        patient_id: &str,
        drug: &str,
        dose: f64,
    ) -> PrescriptionVerdict {
        let analysis_id = Uuid::new_v4();
        let snapshot = self.store.snapshot();

        let mut results: [Option<LayerResult>; 4] = Default::default();
        let mut failed_at = None;

        for layer in Layer::ALL {
            let outcome = match layer {
                Layer::Authorization => authorization::check(&snapshot, prescriber_id),
                Layer::Patient => patient::check(&snapshot, patient_id),
                Layer::DrugSafety => drug_safety::check(&self.tables, drug, dose),
                Layer::Contraindication => {
                    contraindication::check(&snapshot, patient_id, drug, dose)
                }
            };
            let result = outcome.unwrap_or_else(|e| recover(layer, e));

            let passed = result.passed;
            if !passed {
                tracing::debug!(
                    "analysis {} stopped at layer {}: {}",
                    analysis_id,
                    layer.index(),
                    result.message
                );
            }
            results[layer.index()] = Some(result);
            if !passed {
                failed_at = Some(layer);
                break;
            }
        }

        let [layer0, layer1, layer2, layer3] = results.map(|result| {
            result
                .or_else(|| failed_at.map(LayerResult::skipped))
                .unwrap_or_default()
        });

        let (safety_score, reason) = match failed_at {
            Some(layer) => {
                let message = [&layer0, &layer1, &layer2, &layer3][layer.index()]
                    .message
                    .clone();
                (layer.failure_score(), message)
            }
            None => (APPROVED_SAFETY_SCORE, APPROVAL_REASON.to_string()),
        };
        let approved = failed_at.is_none();

        self.metrics.record(approved);
        tracing::info!(
            "analysis {}: prescriber={} patient={} drug={} dose={} approved={} score={}",
            analysis_id,
            prescriber_id,
            patient_id,
            drug,
            dose,
            approved,
            safety_score
        );

        PrescriptionVerdict {
            analysis_id,
            approved,
            prescriber_id: prescriber_id.to_string(),
            patient_id: patient_id.to_string(),
            drug: drug.to_string(),
            dose,
            layer0,
            layer1,
            layer2,
            layer3,
            safety_score,
            reason,
            timestamp: Utc::now(),
        }
    }

    /// Analyse each request in order.
    pub fn analyze_batch(&self, requests: &[PrescriptionRequest]) -> Vec<PrescriptionVerdict> {
        requests
            .iter()
            .map(|r| self.analyze(&r.prescriber_id, &r.patient_id, &r.drug, r.dose))
            .collect()
    }

    pub fn statistics(&self) -> FirewallStatistics {
        FirewallStatistics::collect(&self.metrics, &self.store.snapshot())
    }

    pub fn prescriber_profile(&self, prescriber_id: &str) -> Option<PrescriberRecord> {
        self.store.snapshot().find_prescriber(prescriber_id).cloned()
    }

    pub fn patient_profile(&self, patient_id: &str) -> Option<PatientRecord> {
        self.store.snapshot().find_patient(patient_id).cloned()
    }

    /// Reload both tables from the configured sources and publish the result.
    ///
    /// # Errors
    ///
    /// Returns `FirewallError::NoReferenceSource` if the firewall was built from a snapshot.
    pub fn reload(&self) -> FirewallResult<ReloadSummary> {
        let cfg = self.cfg.as_ref().ok_or(FirewallError::NoReferenceSource)?;
        let snapshot = ingest::load_snapshot(cfg);
        let summary = ReloadSummary::of(&snapshot);
        self.store.replace(snapshot);
        tracing::info!(
            "reference data reloaded: {} prescribers, {} patients",
            summary.total_prescribers,
            summary.total_patients
        );
        Ok(summary)
    }

    pub fn snapshot(&self) -> Arc<ReferenceSnapshot> {
        self.store.snapshot()
    }

    pub fn safety_tables(&self) -> &SafetyTables {
        &self.tables
    }

    pub fn metrics(&self) -> &FirewallMetrics {
        &self.metrics
    }
}

/// Convert an evaluation error into the layer's result according to its error policy.
fn recover(layer: Layer, err: EvaluationError) -> LayerResult {
    tracing::warn!("layer {} evaluation error: {}", layer.index(), err);
    if layer.fails_open() {
        LayerResult::pass(format!("Warning in Layer {}: {err}", layer.index()))
    } else {
        LayerResult::fail(format!("Error in Layer {}: {err}", layer.index()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::OrganFunction::{Normal, Severe};
    use crate::store::tests::{patient, prescriber};
    use std::fs;
    use tempfile::TempDir;

    fn firewall() -> PrescriptionFirewall {
        PrescriptionFirewall::from_snapshot(ReferenceSnapshot::new(
            Some(vec![
                prescriber("DOC001", "Active", "A1234567"),
                prescriber("DOC002", "Suspended", "A7654321"),
            ]),
            Some(vec![
                patient("P001", "", "", Normal, Normal),
                patient("P002", "", "", Severe, Normal),
                patient("P003", "", "warfarin", Normal, Normal),
            ]),
        ))
    }

    fn passed_flags(verdict: &PrescriptionVerdict) -> Vec<bool> {
        verdict.layers().iter().map(|l| l.passed).collect()
    }

    #[test]
    fn all_layers_pass_is_approved() {
        let verdict = firewall().analyze("DOC001", "P001", "oxycodone", 30.0);
        assert!(verdict.approved);
        assert_eq!(verdict.safety_score, 100);
        assert_eq!(verdict.reason, APPROVAL_REASON);
        assert_eq!(passed_flags(&verdict), vec![true, true, true, true]);
    }

    #[test]
    fn dose_over_ceiling_stops_at_layer_two() {
        let verdict = firewall().analyze("DOC001", "P001", "oxycodone", 75.0);
        assert!(!verdict.approved);
        assert_eq!(verdict.safety_score, 50);
        assert!(verdict.layer2.message.contains("exceeds safe limit of 50mg"));
        assert_eq!(verdict.reason, verdict.layer2.message);
        assert_eq!(verdict.layer3.message, "Skipped - Layer 2 failed");
        assert_eq!(passed_flags(&verdict), vec![true, true, false, false]);
    }

    #[test]
    fn suspended_prescriber_skips_remaining_layers() {
        let verdict = firewall().analyze("DOC002", "P001", "oxycodone", 30.0);
        assert!(!verdict.approved);
        assert_eq!(verdict.safety_score, 0);
        assert_eq!(passed_flags(&verdict), vec![false, false, false, false]);
        for skipped in [&verdict.layer1, &verdict.layer2, &verdict.layer3] {
            assert_eq!(skipped.message, "Skipped - Layer 0 failed");
            assert!(skipped.details.is_empty());
        }
    }

    #[test]
    fn unknown_patient_scores_twenty_five() {
        let verdict = firewall().analyze("DOC001", "P999", "aspirin", 100.0);
        assert_eq!(verdict.safety_score, 25);
        assert_eq!(passed_flags(&verdict), vec![true, false, false, false]);
        assert_eq!(verdict.layer2.message, "Skipped - Layer 1 failed");
        assert_eq!(verdict.layer3.message, "Skipped - Layer 1 failed");
    }

    #[test]
    fn liver_contraindication_scores_twenty_five() {
        let verdict = firewall().analyze("DOC001", "P002", "morphine", 20.0);
        assert!(!verdict.approved);
        assert_eq!(verdict.safety_score, 25);
        assert_eq!(verdict.layer3.details["reason"], "opioids_liver_disease");
        assert_eq!(verdict.layer3.details["severity"], "CRITICAL");
    }

    #[test]
    fn aspirin_warfarin_interaction_is_denied() {
        let verdict = firewall().analyze("DOC001", "P003", "aspirin", 100.0);
        assert_eq!(verdict.safety_score, 25);
        assert_eq!(verdict.layer3.details["reason"], "drug_drug_interaction");
        assert_eq!(verdict.layer3.details["interaction"], "aspirin_warfarin");
    }

    #[test]
    fn illegal_drug_fails_layer_two() {
        let verdict = firewall().analyze("DOC001", "P001", "heroin", 1.0);
        assert_eq!(verdict.safety_score, 50);
        assert!(verdict
            .layer2
            .message
            .contains("illegal/controlled substance"));
    }

    #[test]
    fn evaluation_error_fails_closed_before_layer_three() {
        let verdict = firewall().analyze("DOC001", "P001", "aspirin", f64::NAN);
        assert_eq!(verdict.safety_score, 50);
        assert!(verdict.layer2.message.starts_with("Error in Layer 2:"));
    }

    #[test]
    fn contraindication_layer_fails_open_without_patient_data() {
        // Layer 1 would stop the pipeline first, so exercise the rule directly.
        let snapshot = ReferenceSnapshot::new(None, None);
        let result = contraindication::check(&snapshot, "P002", "morphine", 20.0)
            .unwrap_or_else(|e| recover(Layer::Contraindication, e));
        assert!(result.passed);

        let recovered = recover(Layer::Contraindication, EvaluationError::EmptyDrugName);
        assert!(recovered.passed);
        assert_eq!(recovered.message, "Warning in Layer 3: drug name is empty");
    }

    #[test]
    fn analysis_is_idempotent_for_unchanged_store() {
        let fw = firewall();
        let first = fw.analyze("DOC001", "P002", "morphine", 20.0);
        let second = fw.analyze("DOC001", "P002", "morphine", 20.0);
        assert_eq!(first.approved, second.approved);
        assert_eq!(first.safety_score, second.safety_score);
        assert_eq!(passed_flags(&first), passed_flags(&second));
        assert_ne!(first.analysis_id, second.analysis_id);
    }

    #[test]
    fn scores_are_always_in_allowed_set() {
        let fw = firewall();
        let prescribers = ["DOC001", "DOC002", "DOC404"];
        let patients = ["P001", "P002", "P003", "P404"];
        let drugs = [("oxycodone", 30.0), ("oxycodone", 80.0), ("aspirin", 100.0), ("meth", 1.0)];

        for p in prescribers {
            for pt in patients {
                for (drug, dose) in drugs {
                    let verdict = fw.analyze(p, pt, drug, dose);
                    assert!([0, 25, 50, 100].contains(&verdict.safety_score));
                    assert_eq!(verdict.approved, verdict.safety_score == 100);
                }
            }
        }
    }

    #[test]
    fn counters_track_approvals() {
        let fw = firewall();
        fw.analyze("DOC001", "P001", "oxycodone", 30.0);
        fw.analyze("DOC002", "P001", "oxycodone", 30.0);

        let stats = fw.statistics();
        assert_eq!(stats.total_prescribers, 2);
        assert_eq!(stats.total_patients, 3);
        assert_eq!(stats.total_analyses, 2);
        assert_eq!(stats.approved_count, 1);
        assert_eq!(stats.denied_count, 1);
        assert_eq!(stats.approval_rate_percent, 50.0);
    }

    #[test]
    fn batch_returns_one_verdict_per_request() {
        let requests = vec![
            PrescriptionRequest {
                prescriber_id: "DOC001".into(),
                patient_id: "P001".into(),
                drug: "oxycodone".into(),
                dose: 30.0,
            },
            PrescriptionRequest {
                prescriber_id: "DOC001".into(),
                patient_id: "P001".into(),
                drug: "oxycodone".into(),
                dose: 75.0,
            },
        ];
        let verdicts = firewall().analyze_batch(&requests);
        let scores: Vec<u8> = verdicts.iter().map(|v| v.safety_score).collect();
        assert_eq!(scores, vec![100, 50]);
    }

    #[test]
    fn profiles_are_direct_lookups() {
        let fw = firewall();
        assert_eq!(fw.prescriber_profile("DOC001").unwrap().dea_number, "A1234567");
        assert!(fw.patient_profile("P404").is_none());
        assert_eq!(fw.statistics().total_analyses, 0);
    }

    #[test]
    fn missing_sources_deny_at_layer_zero() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = CoreConfig::new(
            dir.path().join("prescribers.yaml"),
            dir.path().join("patients.yaml"),
        )
        .unwrap();
        let fw = PrescriptionFirewall::new(Arc::new(cfg));

        let verdict = fw.analyze("DOC001", "P001", "oxycodone", 30.0);
        assert_eq!(verdict.safety_score, 0);
        assert_eq!(verdict.layer0.message, "Database not loaded");
    }

    #[test]
    fn reload_publishes_new_reference_data() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let prescribers = dir.path().join("prescribers.yaml");
        let patients = dir.path().join("patients.yaml");
        fs::write(&patients, "- patient_id: P001\n  name: Ana Ruiz\n  age: 61\n").unwrap();

        let fw = PrescriptionFirewall::new(Arc::new(
            CoreConfig::new(prescribers.clone(), patients).unwrap(),
        ));
        let before = fw.snapshot();
        assert!(!before.prescribers_loaded());

        fs::write(
            &prescribers,
            "- doctor_id: DOC001\n  name: Dr. Chen\n  credentialing_status: Active\n  dea_number: A1234567\n",
        )
        .unwrap();
        let summary = fw.reload().expect("reload");
        assert!(summary.prescribers_loaded);
        assert_eq!(summary.total_prescribers, 1);
        assert_eq!(summary.total_patients, 1);

        assert!(!before.prescribers_loaded());
        assert!(fw.analyze("DOC001", "P001", "oxycodone", 30.0).approved);
    }

    #[test]
    fn concurrent_analyses_are_all_counted() {
        let fw = Arc::new(firewall());
        std::thread::scope(|s| {
            for _ in 0..8 {
                let fw = Arc::clone(&fw);
                s.spawn(move || {
                    for _ in 0..25 {
                        assert!(fw.analyze("DOC001", "P001", "oxycodone", 30.0).approved);
                        assert!(!fw.analyze("DOC002", "P001", "oxycodone", 30.0).approved);
                    }
                });
            }
        });

        let stats = fw.statistics();
        assert_eq!(stats.total_analyses, 400);
        assert_eq!(stats.approved_count, 200);
        assert_eq!(stats.denied_count, 200);
    }

    #[test]
    fn reload_during_analyses_leaves_held_snapshot_intact() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let prescribers = dir.path().join("prescribers.yaml");
        let patients = dir.path().join("patients.yaml");
        let with_status = |status: &str| {
            format!(
                "- doctor_id: DOC001\n  name: Dr. Chen\n  credentialing_status: {status}\n  dea_number: A1234567\n"
            )
        };
        fs::write(&prescribers, with_status("Active")).expect("Failed to write prescribers");
        fs::write(&patients, "- patient_id: P001\n  name: Ana Ruiz\n  age: 61\n")
            .expect("Failed to write patients");

        let fw = Arc::new(PrescriptionFirewall::new(Arc::new(
            CoreConfig::new(prescribers.clone(), patients).unwrap(),
        )));
        let held = fw.snapshot();
        fs::write(&prescribers, with_status("Suspended")).expect("Failed to write prescribers");

        std::thread::scope(|s| {
            let readers: Vec<_> = (0..4)
                .map(|_| {
                    let fw = Arc::clone(&fw);
                    s.spawn(move || {
                        for _ in 0..20 {
                            let verdict = fw.analyze("DOC001", "P001", "oxycodone", 30.0);
                            assert!(verdict.safety_score == 100 || verdict.safety_score == 0);
                        }
                    })
                })
                .collect();
            let reloader = s.spawn(|| fw.reload());

            reloader
                .join()
                .expect("reload thread panicked")
                .expect("reload failed");
            for reader in readers {
                reader.join().expect("analysis thread panicked");
            }
        });

        let doc = held.find_prescriber("DOC001").expect("held snapshot keeps DOC001");
        assert!(doc.status.is_active());

        let after = fw.analyze("DOC001", "P001", "oxycodone", 30.0);
        assert_eq!(after.safety_score, 0);
        assert!(after.layer0.message.contains("Suspended"));
        assert_eq!(fw.statistics().total_analyses, 81);
    }

    #[test]
    fn reload_without_source_is_an_error() {
        let err = firewall().reload().unwrap_err();
        assert!(matches!(err, FirewallError::NoReferenceSource));
    }
}
