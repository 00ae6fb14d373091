//! Error taxonomy for the reactive pipeline.
//!
//! Input errors carry the failed validation rule, derivation and simulation
//! errors stay inside the graph boundary, and construction errors (cycles,
//! duplicate producers) surface at startup.

use thiserror::Error;

use crate::store::CellKey;
use crate::validate::EpochTextError;

/// Result type used throughout the pipeline.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown cell: {0}")]
    UnknownCell(CellKey),

    #[error("cell already defined: {0}")]
    DuplicateCell(CellKey),

    #[error("cell {key} already produced by {existing}")]
    DuplicateProducer {
        key: CellKey,
        existing: &'static str,
    },

    #[error("{origin} may not write {key}")]
    ForbiddenWrite { key: CellKey, origin: String },

    #[error("node {node} wrote undeclared output {key}")]
    UndeclaredOutput {
        key: CellKey,
        node: &'static str,
    },

    #[error("non-finite value for {key}")]
    NonFiniteValue { key: CellKey },

    #[error("cycle detected in derivation graph: {nodes:?}")]
    CycleDetected { nodes: Vec<&'static str> },

    #[error("invalid epoch text: {0}")]
    InvalidEpochText(#[from] EpochTextError),

    #[error("epoch construction failed: {message}")]
    EpochConstruction { message: String },

    #[error("degenerate reference orbit: semi-major axis {sma:.3} km")]
    DegenerateOrbit { sma: f64 },

    #[error("step size must be positive, got {0}")]
    InvalidStepSize(f64),

    #[error("estimator has not been acquired")]
    EstimatorNotAcquired,

    #[error("estimator diverged")]
    EstimatorDiverged,
}
