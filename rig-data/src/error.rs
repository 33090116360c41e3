use thiserror::Error;

/// Errors raised while building rig data containers.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Depth field expects {expected} points for {width}x{height}, got {actual}")]
    LengthMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}
