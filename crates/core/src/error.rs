use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FirewallError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to read reference data file {path}: {source}", path = path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "unsupported reference data format (expected .yaml, .yml or .json): {path}",
        path = path.display()
    )]
    UnsupportedFormat { path: PathBuf },
    #[error("failed to parse YAML in {path}: {source}", path = path.display())]
    YamlDeserialization {
        path: PathBuf,
        #[source]
        source: serde_path_to_error::Error<serde_yaml::Error>,
    },
    #[error("failed to parse JSON in {path}: {source}", path = path.display())]
    JsonDeserialization {
        path: PathBuf,
        #[source]
        source: serde_path_to_error::Error<serde_json::Error>,
    },
    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
    #[error("no reference data source configured")]
    NoReferenceSource,
}

pub type FirewallResult<T> = std::result::Result<T, FirewallError>;

/// Unexpected conditions raised while a single layer is being computed.
///
/// These never escape `PrescriptionFirewall::analyze`; the orchestrator converts them into a
/// failed layer (layers 0 to 2) or a passing warning (layer 3).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("drug name is empty")]
    EmptyDrugName,
    #[error("dose {0} is not a finite number")]
    NonFiniteDose(f64),
}
