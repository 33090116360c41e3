//! Error types for the depth pipeline.

use rig_data::{CameraSide, Facet};
use thiserror::Error;

/// Errors raised while configuring the manager or running a tick.
#[derive(Debug, Error)]
pub enum DepthError {
    /// Calibration or configuration values the manager cannot work with.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A required facet image was absent or empty. The tick should be skipped.
    #[error("Missing {camera} image for {facet} facet (slot {slot})")]
    MissingFacet {
        facet: Facet,
        camera: CameraSide,
        slot: usize,
    },

    /// Upper and lower facet images differ in size after preparation.
    #[error("Stereo pair size mismatch for {facet} facet: upper {upper:?}, lower {lower:?}")]
    PairMismatch {
        facet: Facet,
        upper: (u32, u32),
        lower: (u32, u32),
    },

    #[error("Depth solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Capture error: {0}")]
    Capture(#[from] rig_capture::CaptureError),

    #[error("Calibration file error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Opaque failure reported by an external depth solver.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SolverError(pub String);

/// Failure reported by an output sink.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SinkError(pub String);

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
