//! Pipeline result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Structured context attached to a layer result.
pub type LayerDetails = BTreeMap<String, Value>;

/// The four checks, in evaluation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Authorization,
    Patient,
    DrugSafety,
    Contraindication,
}

impl Layer {
    pub const ALL: [Layer; 4] = [
        Layer::Authorization,
        Layer::Patient,
        Layer::DrugSafety,
        Layer::Contraindication,
    ];

    pub fn index(self) -> usize {
        match self {
            Layer::Authorization => 0,
            Layer::Patient => 1,
            Layer::DrugSafety => 2,
            Layer::Contraindication => 3,
        }
    }

    /// Safety score assigned when this layer is the first to fail.
    pub fn failure_score(self) -> u8 {
        match self {
            Layer::Authorization => 0,
            Layer::Patient => 25,
            Layer::DrugSafety => 50,
            Layer::Contraindication => 25,
        }
    }

    /// Whether an evaluation error in this layer lets the prescription through.
    pub fn fails_open(self) -> bool {
        matches!(self, Layer::Contraindication)
    }
}

/// Outcome of one layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerResult {
    pub passed: bool,
    pub message: String,
    #[serde(default)]
    pub details: LayerDetails,
}

impl LayerResult {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: LayerDetails::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: LayerDetails::new(),
        }
    }

    /// Placeholder for a layer that was never evaluated because `failed` stopped the pipeline.
    pub fn skipped(failed: Layer) -> Self {
        Self::fail(format!("Skipped - Layer {} failed", failed.index()))
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_owned(), value.into());
        self
    }
}

/// Composite result of one analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionVerdict {
    pub analysis_id: Uuid,
    pub approved: bool,
    pub prescriber_id: String,
    pub patient_id: String,
    pub drug: String,
    pub dose: f64,
    pub layer0: LayerResult,
    pub layer1: LayerResult,
    pub layer2: LayerResult,
    pub layer3: LayerResult,
    pub safety_score: u8,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl PrescriptionVerdict {
    /// Layer results in evaluation order.
    pub fn layers(&self) -> [&LayerResult; 4] {
        [&self.layer0, &self.layer1, &self.layer2, &self.layer3]
    }
}
