//! Analysis counters and reporting.
//!
//! Counters are bookkeeping only; nothing in the pipeline reads them.

use crate::store::ReferenceSnapshot;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-firewall analysis counters.
#[derive(Debug, Default)]
pub struct FirewallMetrics {
    total_analyses: AtomicU64,
    approved: AtomicU64,
}

impl FirewallMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one finished analysis.
    ///
    /// # Arguments
    ///
    /// * `approved` - Whether the verdict approved the prescription.
    pub fn record(&self, approved: bool) {
        self.total_analyses.fetch_add(1, Ordering::Relaxed);
        if approved {
            self.approved.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Analyses recorded since start-up.
    pub fn total_analyses(&self) -> u64 {
        self.total_analyses.load(Ordering::Relaxed)
    }

    pub fn approved(&self) -> u64 {
        self.approved.load(Ordering::Relaxed)
    }
}

/// Reporting view combining counters and reference table sizes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FirewallStatistics {
    pub total_prescribers: usize,
    pub total_patients: usize,
    pub total_analyses: u64,
    pub approved_count: u64,
    pub denied_count: u64,
    /// Percentage of analyses approved, rounded to one decimal place.
    pub approval_rate_percent: f64,
}

impl FirewallStatistics {
    /// Build the reporting view.
    ///
    /// # Arguments
    ///
    /// * `metrics` - Counters to read.
    /// * `snapshot` - Reference tables whose sizes are reported.
    ///
    /// # Returns
    ///
    /// Counts plus the approval rate. The rate is `0.0` before any analysis has run.
    pub fn collect(metrics: &FirewallMetrics, snapshot: &ReferenceSnapshot) -> Self {
        let approved = metrics.approved();
        // A concurrent record() may land between the two loads.
        let total = metrics.total_analyses().max(approved);
        let rate = approved as f64 / total.max(1) as f64 * 100.0;

        Self {
            total_prescribers: snapshot.prescriber_count(),
            total_patients: snapshot.patient_count(),
            total_analyses: total,
            approved_count: approved,
            denied_count: total - approved,
            approval_rate_percent: (rate * 10.0).round() / 10.0,
        }
    }
}
