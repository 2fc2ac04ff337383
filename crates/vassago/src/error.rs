//! Engine-level error type

use crate::engine::{PatternId, SpecId};
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the engine facade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Error from generation or analysis.
    #[error(transparent)]
    Pattern(#[from] vassago_core::Error),

    /// Unknown spec id.
    #[error("spec {0} not found")]
    SpecNotFound(SpecId),

    /// Unknown pattern id.
    #[error("pattern {0} not found")]
    PatternNotFound(PatternId),

    /// An operation was given nothing to work on.
    #[error("empty input: {0}")]
    EmptyInput(&'static str),
}
