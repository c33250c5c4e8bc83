//! Constants used throughout the firewall core crate.

/// Default prescriber table used when no explicit file is configured.
pub const DEFAULT_PRESCRIBERS_FILE: &str = "data/prescribers.yaml";

/// Default patient table used when no explicit file is configured.
pub const DEFAULT_PATIENTS_FILE: &str = "data/patients.yaml";

/// Every valid DEA registration number starts with this character.
pub const DEA_NUMBER_PREFIX: char = 'A';

/// Separator used by the `conditions` and `medications` columns.
pub const TAG_DELIMITER: char = ';';

/// Condition tag that marks kidney disease.
pub const KIDNEY_DISEASE_CONDITION: &str = "kidney_disease";

/// Substring that marks chronic kidney disease inside any condition tag.
pub const CKD_MARKER: &str = "ckd";

/// Reason recorded on a verdict when every layer passes.
pub const APPROVAL_REASON: &str = "APPROVED - All 4 layers passed";

/// Safety score of a prescription that passed every layer.
pub const APPROVED_SAFETY_SCORE: u8 = 100;
