use thiserror::Error;

use crate::cell::Position;

/// Errors surfaced by the trace engines before any step is recorded.
///
/// A search that exhausts the grid is not an error; it comes back as a
/// `PathTrace` with `path_found == false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unknown algorithm: {0}")]
    InvalidAlgorithm(String),

    #[error("invalid {role} position {position}: {reason}")]
    InvalidPosition {
        role: &'static str,
        position: Position,
        reason: &'static str,
    },

    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    #[error("input too large: {0}")]
    InputTooLarge(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
