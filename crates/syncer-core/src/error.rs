//! Errors shared by the producer and consumer sides.

use thiserror::Error;

/// Failures while decoding or converting diff data.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CoreError {
    /// The payload is not valid JSON or does not match the diff wire format.
    #[error("malformed diff payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A patch operation outside of add/remove/replace was encountered.
    #[error("unsupported patch operation '{op}' at '{path}'")]
    UnsupportedOp {
        /// The RFC 6902 operation name.
        op: &'static str,
        /// Pointer the operation targets.
        path: String,
    },

    /// An add or replace operation arrived without a value.
    #[error("'{op}' operation at '{path}' has no value")]
    MissingValue {
        /// The operation name.
        op: &'static str,
        /// Pointer the operation targets.
        path: String,
    },

    /// The operation path is not a valid JSON pointer.
    #[error("invalid JSON pointer '{path}': {reason}")]
    InvalidPointer {
        /// The offending path.
        path: String,
        /// Parser message.
        reason: String,
    },
}

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
