//! Validated primitive types used at the edges of the prescription firewall.
//!
//! The firewall core treats every value it receives as already well-typed. Adapters (REST, CLI)
//! build these types from raw user input so that malformed requests are rejected before an
//! analysis is ever started.

use std::fmt;
use std::str::FromStr;

/// A required text field held nothing but whitespace.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    #[error("{field} cannot be blank")]
    Blank { field: &'static str },
}

/// Text that is known to hold at least one non-whitespace character.
///
/// The value is kept exactly as given. Identifiers match by exact string equality downstream,
/// so `" DOC001"` stays distinct from `"DOC001"` instead of being quietly repaired here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonBlank(String);

impl NonBlank {
    /// Accepts `value` for the named field.
    ///
    /// # Arguments
    ///
    /// * `field` - Field name reported in the error.
    /// * `value` - Raw text, stored unchanged.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Blank` if `value` is empty or whitespace only.
    pub fn new(field: &'static str, value: impl Into<String>) -> Result<Self, TextError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(TextError::Blank { field });
        }
        Ok(Self(value))
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<NonBlank> for String {
    fn from(value: NonBlank) -> Self {
        value.0
    }
}

/// Errors raised when a dose cannot be accepted.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DoseError {
    #[error("dose must be a finite number")]
    NotFinite,
    #[error("dose must be greater than zero (got {0})")]
    NotPositive(f64),
    #[error("could not parse dose from '{0}'")]
    Unparseable(String),
}

/// A prescribed dose in milligrams. Always finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Dose(f64);

impl Dose {
    /// Suffix accepted (case-insensitively) when parsing a dose from text.
    pub const UNIT: &'static str = "mg";

    /// Wraps a milligram amount.
    ///
    /// # Errors
    ///
    /// Returns `DoseError::NotFinite` for NaN or infinite values and
    /// `DoseError::NotPositive` for zero or negative values.
    pub fn new(milligrams: f64) -> Result<Self, DoseError> {
        if !milligrams.is_finite() {
            return Err(DoseError::NotFinite);
        }
        if milligrams <= 0.0 {
            return Err(DoseError::NotPositive(milligrams));
        }
        Ok(Self(milligrams))
    }

    pub fn milligrams(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Dose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0, Self::UNIT)
    }
}

/// Parses `30`, `30mg`, `30 mg` or `12.5MG`.
impl FromStr for Dose {
    type Err = DoseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        let number = lower
            .strip_suffix(Self::UNIT)
            .unwrap_or(&lower)
            .trim_end();

        let value: f64 = number
            .parse()
            .map_err(|_| DoseError::Unparseable(trimmed.to_owned()))?;
        Self::new(value)
    }
}

impl serde::Serialize for Dose {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Dose {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Dose::new(value).map_err(serde::de::Error::custom)
    }
}
