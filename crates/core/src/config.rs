//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the firewall. Request
//! handling never reads environment variables, which keeps behaviour consistent across threads and
//! test harnesses.

use crate::constants::{DEFAULT_PATIENTS_FILE, DEFAULT_PRESCRIBERS_FILE};
use crate::{FirewallError, FirewallResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    prescribers_path: PathBuf,
    patients_path: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `FirewallError::InvalidInput` if either path is empty.
    pub fn new(prescribers_path: PathBuf, patients_path: PathBuf) -> FirewallResult<Self> {
        if prescribers_path.as_os_str().is_empty() {
            return Err(FirewallError::InvalidInput(
                "prescribers path cannot be empty".into(),
            ));
        }
        if patients_path.as_os_str().is_empty() {
            return Err(FirewallError::InvalidInput(
                "patients path cannot be empty".into(),
            ));
        }

        Ok(Self {
            prescribers_path,
            patients_path,
        })
    }

    /// Build a configuration from optional raw values, typically read from
    /// `RXFW_PRESCRIBERS_FILE` and `RXFW_PATIENTS_FILE`.
    ///
    /// Missing or whitespace-only values fall back to the bundled defaults.
    pub fn from_env_values(
        prescribers: Option<String>,
        patients: Option<String>,
    ) -> FirewallResult<Self> {
        fn resolve(value: Option<String>, default: &str) -> PathBuf {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default))
        }

        Self::new(
            resolve(prescribers, DEFAULT_PRESCRIBERS_FILE),
            resolve(patients, DEFAULT_PATIENTS_FILE),
        )
    }

    pub fn prescribers_path(&self) -> &Path {
        &self.prescribers_path
    }

    pub fn patients_path(&self) -> &Path {
        &self.patients_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_values_falls_back_to_defaults() {
        let cfg = CoreConfig::from_env_values(None, Some("   ".into())).unwrap();
        assert_eq!(cfg.prescribers_path(), Path::new(DEFAULT_PRESCRIBERS_FILE));
        assert_eq!(cfg.patients_path(), Path::new(DEFAULT_PATIENTS_FILE));
    }

    #[test]
    fn from_env_values_uses_supplied_paths() {
        let cfg = CoreConfig::from_env_values(
            Some("/srv/prescribers.json".into()),
            Some(" /srv/patients.yaml ".into()),
        )
        .unwrap();
        assert_eq!(cfg.prescribers_path(), Path::new("/srv/prescribers.json"));
        assert_eq!(cfg.patients_path(), Path::new("/srv/patients.yaml"));
    }

    #[test]
    fn new_rejects_empty_paths() {
        let err = CoreConfig::new(PathBuf::new(), PathBuf::from("patients.yaml")).unwrap_err();
        assert!(matches!(err, FirewallError::InvalidInput(_)));
    }
}
