//! Reference data store.
//!
//! A [`ReferenceSnapshot`] holds the prescriber and patient tables as they were at load time.
//! Each table is either loaded (possibly empty) or unavailable; lookups against an unavailable
//! table simply return `None`.
//!
//! The [`ReferenceStore`] publishes snapshots behind an `Arc`. Evaluations take one snapshot and
//! use it end to end, so a concurrent reload can never expose a half-updated view.

use crate::records::{PatientRecord, PrescriberRecord};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Immutable view of both reference tables.
#[derive(Clone, Debug)]
pub struct ReferenceSnapshot {
    prescribers: Option<HashMap<String, PrescriberRecord>>,
    patients: Option<HashMap<String, PatientRecord>>,
}

impl ReferenceSnapshot {
    /// Build a snapshot from optional tables.
    ///
    /// # Arguments
    ///
    /// * `prescribers` - Prescriber rows, or `None` if the prescriber table could not be loaded.
    /// * `patients` - Patient rows, or `None` if the patient table could not be loaded.
    ///
    /// # Returns
    ///
    /// A snapshot indexed by identifier. Duplicate identifiers keep the first row seen.
    pub fn new(
        prescribers: Option<Vec<PrescriberRecord>>,
        patients: Option<Vec<PatientRecord>>,
    ) -> Self {
        Self {
            prescribers: prescribers.map(|rows| index_by_id(rows, |p| p.id.clone(), "prescriber")),
            patients: patients.map(|rows| index_by_id(rows, |p| p.id.clone(), "patient")),
        }
    }

    /// A snapshot in which both tables are unavailable.
    pub fn unavailable() -> Self {
        Self::new(None, None)
    }

    pub fn prescribers_loaded(&self) -> bool {
        self.prescribers.is_some()
    }

    pub fn patients_loaded(&self) -> bool {
        self.patients.is_some()
    }

    /// Look up a prescriber.
    ///
    /// # Arguments
    ///
    /// * `id` - Prescriber identifier, compared by exact string equality.
    ///
    /// # Returns
    ///
    /// The record, or `None` if the id is unknown or the table is unavailable.
    pub fn find_prescriber(&self, id: &str) -> Option<&PrescriberRecord> {
        self.prescribers.as_ref()?.get(id)
    }

    /// Look up a patient.
    ///
    /// # Arguments
    ///
    /// * `id` - Patient identifier, compared by exact string equality.
    ///
    /// # Returns
    ///
    /// The record, or `None` if the id is unknown or the table is unavailable.
    pub fn find_patient(&self, id: &str) -> Option<&PatientRecord> {
        self.patients.as_ref()?.get(id)
    }

    /// Number of prescribers; zero when the table is unavailable.
    pub fn prescriber_count(&self) -> usize {
        self.prescribers.as_ref().map_or(0, HashMap::len)
    }

    /// Number of patients; zero when the table is unavailable.
    pub fn patient_count(&self) -> usize {
        self.patients.as_ref().map_or(0, HashMap::len)
    }
}

impl Default for ReferenceSnapshot {
    fn default() -> Self {
        Self::unavailable()
    }
}

fn index_by_id<T>(
    rows: Vec<T>,
    key: impl Fn(&T) -> String,
    kind: &str,
) -> HashMap<String, T> {
    let mut map = HashMap::with_capacity(rows.len());
    for row in rows {
        let id = key(&row);
        if map.contains_key(&id) {
            tracing::warn!("duplicate {} id {}, keeping first row", kind, id);
            continue;
        }
        map.insert(id, row);
    }
    map
}

/// Holder of the current snapshot.
#[derive(Debug, Default)]
pub struct ReferenceStore {
    current: RwLock<Arc<ReferenceSnapshot>>,
}

impl ReferenceStore {
    pub fn new(snapshot: ReferenceSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The snapshot in effect right now.
    ///
    /// # Returns
    ///
    /// A shared handle. It stays valid and unchanged after a later [`replace`](Self::replace).
    pub fn snapshot(&self) -> Arc<ReferenceSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Publish a new snapshot.
    ///
    /// # Arguments
    ///
    /// * `snapshot` - The tables every later [`snapshot`](Self::snapshot) call will see.
    ///
    /// # Returns
    ///
    /// The snapshot it replaced.
    pub fn replace(&self, snapshot: ReferenceSnapshot) -> Arc<ReferenceSnapshot> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(snapshot))
    }
}
