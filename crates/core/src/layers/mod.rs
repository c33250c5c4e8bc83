//! The four checks run by the pipeline.
//!
//! Every layer is a plain function over the reference snapshot (or the static safety tables) and
//! its inputs. Layers do not call each other; the orchestrator in [`crate::firewall`] decides what
//! runs and what an evaluation error means for each layer.

use crate::error::EvaluationError;
use crate::verdict::LayerResult;

pub mod authorization;
pub mod contraindication;
pub mod drug_safety;
pub mod patient;

/// Result of evaluating one layer.
pub type LayerOutcome = Result<LayerResult, EvaluationError>;
