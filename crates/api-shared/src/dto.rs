//! Request and response types shared by the API adapters.
//!
//! These mirror the core types with wire-friendly fields (strings for timestamps and UUIDs) and
//! carry OpenAPI schemas. Conversions from core types live here so every adapter renders results
//! the same way.

use rxfw_core::layers::contraindication::CONTRAINDICATION_RULES;
use rxfw_core::{
    Dose, DoseError, FirewallStatistics, LayerResult, NonBlank, PatientRecord, PrescriberRecord,
    PrescriptionRequest, PrescriptionVerdict, ReloadSummary, SafetyTables, TextError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use utoipa::ToSchema;

// ============================================================================
// REQUESTS
// ============================================================================

/// Boundary validation failures for an analysis request.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error(transparent)]
    Text(#[from] TextError),
    #[error("dose: {0}")]
    Dose(#[from] DoseError),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeReq {
    pub prescriber_id: String,
    pub patient_id: String,
    pub drug: String,
    /// Dose in milligrams; must be greater than zero.
    pub dose: f64,
}

impl AnalyzeReq {
    /// Validate the request into the core's input type.
    ///
    /// Text fields are passed on exactly as submitted; identifiers match by exact equality.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if an identifier or the drug is blank, or the dose is not a
    /// positive finite number.
    pub fn validate(&self) -> Result<PrescriptionRequest, ValidationError> {
        Ok(PrescriptionRequest {
            prescriber_id: NonBlank::new("prescriber_id", self.prescriber_id.as_str())?.into(),
            patient_id: NonBlank::new("patient_id", self.patient_id.as_str())?.into(),
            drug: NonBlank::new("drug", self.drug.as_str())?.into(),
            dose: Dose::new(self.dose)?.milligrams(),
        })
    }
}

// ============================================================================
// ANALYSIS RESPONSES
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LayerRes {
    pub passed: bool,
    pub message: String,
    #[schema(value_type = Object)]
    pub details: BTreeMap<String, Value>,
}

impl From<LayerResult> for LayerRes {
    fn from(r: LayerResult) -> Self {
        Self {
            passed: r.passed,
            message: r.message,
            details: r.details,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisRes {
    pub analysis_id: String,
    pub approved: bool,
    pub prescriber_id: String,
    pub patient_id: String,
    pub drug: String,
    pub dose: f64,
    pub layer0: LayerRes,
    pub layer1: LayerRes,
    pub layer2: LayerRes,
    pub layer3: LayerRes,
    pub safety_score: u8,
    pub reason: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

impl From<PrescriptionVerdict> for AnalysisRes {
    fn from(v: PrescriptionVerdict) -> Self {
        Self {
            analysis_id: v.analysis_id.to_string(),
            approved: v.approved,
            prescriber_id: v.prescriber_id,
            patient_id: v.patient_id,
            drug: v.drug,
            dose: v.dose,
            layer0: v.layer0.into(),
            layer1: v.layer1.into(),
            layer2: v.layer2.into(),
            layer3: v.layer3.into(),
            safety_score: v.safety_score,
            reason: v.reason,
            timestamp: v.timestamp.to_rfc3339(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BulkErrorRes {
    pub error: String,
    pub request: AnalyzeReq,
}

/// One entry of a bulk analysis: a verdict, or the reason the request was not analysed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum BulkAnalyzeItem {
    Analysis(AnalysisRes),
    Error(BulkErrorRes),
}

// ============================================================================
// PROFILES
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PatientProfileRes {
    pub patient_id: String,
    pub name: String,
    pub age: Option<u32>,
    pub conditions: Vec<String>,
    pub medications: Vec<String>,
    pub liver_status: String,
    pub kidney_status: String,
}

impl From<PatientRecord> for PatientProfileRes {
    fn from(p: PatientRecord) -> Self {
        Self {
            patient_id: p.id,
            name: p.name,
            age: p.age,
            conditions: p.conditions.into_iter().collect(),
            medications: p.medications.into_iter().collect(),
            liver_status: p.liver_status.to_string(),
            kidney_status: p.kidney_status.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PrescriberProfileRes {
    pub prescriber_id: String,
    pub name: String,
    pub specialty: String,
    pub status: String,
    pub dea_number: String,
    pub license_number: String,
}

impl From<PrescriberRecord> for PrescriberProfileRes {
    fn from(p: PrescriberRecord) -> Self {
        Self {
            prescriber_id: p.id,
            name: p.name,
            specialty: p.specialty,
            status: p.status.to_string(),
            dea_number: p.dea_number,
            license_number: p.license_number,
        }
    }
}

// ============================================================================
// REPORTING
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatsRes {
    pub total_prescribers: usize,
    pub total_patients: usize,
    pub total_analyses: u64,
    pub approved_count: u64,
    pub denied_count: u64,
    pub approval_rate_percent: f64,
    /// Display form, e.g. `"66.7%"`.
    pub approval_rate: String,
}

impl From<FirewallStatistics> for StatsRes {
    fn from(s: FirewallStatistics) -> Self {
        Self {
            total_prescribers: s.total_prescribers,
            total_patients: s.total_patients,
            total_analyses: s.total_analyses,
            approved_count: s.approved_count,
            denied_count: s.denied_count,
            approval_rate_percent: s.approval_rate_percent,
            approval_rate: format!("{:.1}%", s.approval_rate_percent),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ContraindicationRuleRes {
    pub reason: String,
    pub severity: String,
    pub drugs: Vec<String>,
    #[schema(value_type = Object)]
    pub trigger: Value,
    pub interaction: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SafetyTablesRes {
    pub illegal_substances: Vec<String>,
    pub dose_ceilings_mg: BTreeMap<String, f64>,
    pub contraindication_rules: Vec<ContraindicationRuleRes>,
}

impl From<&SafetyTables> for SafetyTablesRes {
    fn from(tables: &SafetyTables) -> Self {
        Self {
            illegal_substances: tables.illegal_substances().map(str::to_string).collect(),
            dose_ceilings_mg: tables
                .dose_ceilings()
                .map(|(drug, mg)| (drug.to_string(), mg))
                .collect(),
            contraindication_rules: CONTRAINDICATION_RULES
                .iter()
                .map(|rule| ContraindicationRuleRes {
                    reason: rule.reason.as_str().to_string(),
                    severity: rule.severity.as_str().to_string(),
                    drugs: rule.drugs.iter().map(|d| d.to_string()).collect(),
                    trigger: serde_json::to_value(rule.trigger).unwrap_or(Value::Null),
                    interaction: rule.interaction.map(str::to_string),
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReloadRes {
    pub prescribers_loaded: bool,
    pub patients_loaded: bool,
    pub total_prescribers: usize,
    pub total_patients: usize,
}

impl From<ReloadSummary> for ReloadRes {
    fn from(s: ReloadSummary) -> Self {
        Self {
            prescribers_loaded: s.prescribers_loaded,
            patients_loaded: s.patients_loaded,
            total_prescribers: s.total_prescribers,
            total_patients: s.total_patients,
        }
    }
}

// ============================================================================
// SERVICE
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub status: String,
    pub version: String,
    pub service: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApiInfoRes {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
    pub status_code: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(prescriber: &str, dose: f64) -> AnalyzeReq {
        AnalyzeReq {
            prescriber_id: prescriber.into(),
            patient_id: " P001 ".into(),
            drug: "Oxycodone".into(),
            dose,
        }
    }

    #[test]
    fn validate_passes_text_through_unchanged() {
        let request = req("DOC001", 30.0).validate().unwrap();
        assert_eq!(request.prescriber_id, "DOC001");
        assert_eq!(request.patient_id, " P001 ");
        assert_eq!(request.drug, "Oxycodone");
        assert_eq!(request.dose, 30.0);
    }

    #[test]
    fn validate_rejects_blank_ids_and_bad_doses() {
        assert_eq!(
            req("  ", 30.0).validate().unwrap_err(),
            ValidationError::Text(TextError::Blank {
                field: "prescriber_id"
            })
        );
        assert_eq!(
            req("", 30.0).validate().unwrap_err().to_string(),
            "prescriber_id cannot be blank"
        );
        assert_eq!(
            req("DOC001", 0.0).validate().unwrap_err().to_string(),
            "dose: dose must be greater than zero (got 0)"
        );
    }

    #[test]
    fn safety_tables_response_lists_rules_in_order() {
        let res = SafetyTablesRes::from(&SafetyTables::default());
        assert_eq!(res.dose_ceilings_mg["insulin"], 300.0);
        assert_eq!(res.contraindication_rules.len(), CONTRAINDICATION_RULES.len());
        assert_eq!(res.contraindication_rules[0].reason, "opioids_liver_disease");
        assert_eq!(
            res.contraindication_rules[3].interaction.as_deref(),
            Some("aspirin_warfarin")
        );
    }

    #[test]
    fn stats_include_display_rate() {
        let res = StatsRes::from(FirewallStatistics {
            total_prescribers: 1,
            total_patients: 2,
            total_analyses: 3,
            approved_count: 2,
            denied_count: 1,
            approval_rate_percent: 66.7,
        });
        assert_eq!(res.approval_rate, "66.7%");
    }
}
