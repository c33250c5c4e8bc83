//! # Prescription Firewall Core
//!
//! Decision logic for the four-layer prescription firewall:
//! - Layer 0: prescriber authorisation
//! - Layer 1: patient validation
//! - Layer 2: drug legality and dose ceilings
//! - Layer 3: contraindication detection
//!
//! The crate also owns the reference data store, its ingestion adapter, and the analysis counters.
//!
//! **No API concerns**: HTTP servers, request marshalling, and CLI parsing belong in `api-rest`,
//! `api-shared`, or `rxfw-cli`.

pub mod config;
pub mod constants;
pub mod error;
pub mod firewall;
pub mod ingest;
pub mod layers;
pub mod metrics;
pub mod records;
pub mod store;
pub mod tables;
pub mod verdict;

pub use config::CoreConfig;
pub use constants::*;
pub use error::{EvaluationError, FirewallError, FirewallResult};
pub use firewall::{PrescriptionFirewall, PrescriptionRequest, ReloadSummary};
pub use metrics::{FirewallMetrics, FirewallStatistics};
pub use records::{CredentialStatus, OrganFunction, PatientRecord, PrescriberRecord};
pub use store::{ReferenceSnapshot, ReferenceStore};
pub use tables::SafetyTables;
pub use verdict::{Layer, LayerDetails, LayerResult, PrescriptionVerdict};

// Re-exported so adapters validate input with the same types the core documents.
pub use rxfw_types::{Dose, DoseError, NonBlank, TextError};
