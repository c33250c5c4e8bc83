//! Layer 0: prescriber authorisation.

use super::LayerOutcome;
use crate::constants::DEA_NUMBER_PREFIX;
use crate::store::ReferenceSnapshot;
use crate::verdict::LayerResult;

/// Verify the prescriber exists, is actively credentialed, and holds a well-formed DEA number.
pub fn check(snapshot: &ReferenceSnapshot, prescriber_id: &str) -> LayerOutcome {
    if !snapshot.prescribers_loaded() {
        return Ok(LayerResult::fail("Database not loaded"));
    }

    let Some(prescriber) = snapshot.find_prescriber(prescriber_id) else {
        return Ok(LayerResult::fail(format!(
            "Prescriber {prescriber_id} not found in database"
        )));
    };

    if !prescriber.status.is_active() {
        return Ok(
            LayerResult::fail(format!("Prescriber status: {}", prescriber.status))
                .with_detail("status", prescriber.status.to_string())
                .with_detail("name", prescriber.name.as_str()),
        );
    }

    if !prescriber.dea_number.starts_with(DEA_NUMBER_PREFIX) {
        return Ok(LayerResult::fail("Invalid DEA number format"));
    }

    Ok(
        LayerResult::pass(format!("Prescriber {} authorized", prescriber.name))
            .with_detail("name", prescriber.name.as_str())
            .with_detail("specialty", prescriber.specialty.as_str())
            .with_detail("status", prescriber.status.to_string())
            .with_detail("dea_number", prescriber.dea_number.as_str()),
    )
}
