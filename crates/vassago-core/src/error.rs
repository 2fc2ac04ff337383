//! Error types for pattern generation and analysis

use thiserror::Error;

/// Result type alias for pattern operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Pattern engine error taxonomy.
///
/// All failures are local and synchronous. Generation is deterministic,
/// so none of these are retried automatically: retrying an
/// `InvalidParameter` without changing the input reproduces the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A spec field is missing, non-positive, or out of range.
    #[error("invalid parameter `{field}`: {message}")]
    InvalidParameter {
        field: &'static str,
        message: String,
    },

    /// Pattern family name not recognized.
    #[error("unsupported pattern family: {name}")]
    UnsupportedFamily { name: String },

    /// Malformed mask passed to analysis. This cannot occur through the
    /// public API and is treated as fatal to the call, not the process.
    #[error("invalid mask: {message}")]
    InvalidMask { message: String },

    /// Sequence length too large for the requested exact analysis.
    /// Recoverable by switching to sampled mode.
    #[error("sequence length {sequence_length} exceeds exact analysis limit {limit}")]
    ResourceExceeded {
        sequence_length: usize,
        limit: usize,
    },
}

impl Error {
    /// Convenience constructor for parameter errors.
    pub fn invalid_parameter(field: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidParameter {
            field,
            message: message.into(),
        }
    }
}
