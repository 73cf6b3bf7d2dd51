//! Error types for the state tracker.
//!
//! Every error here is fatal to the call that produced it: the tracker never
//! commits part of an update, so after an `Err` the previously committed
//! state, version and snapshot are still in place.

use syncer_core::CoreError;
use thiserror::Error;

/// Errors raised while encoding or diffing producer state.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TrackerError {
    /// The producer's data could not be encoded as JSON.
    #[error("state serialization failed: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// The encoded data is not a JSON object, so the version key cannot be
    /// embedded.
    #[error("state must encode to a JSON object, got {found}")]
    NotAnObject {
        /// JSON kind the data encoded to.
        found: &'static str,
    },

    /// The producer's data already uses the reserved version key.
    #[error("state uses reserved key '{key}'")]
    ReservedKey {
        /// The reserved key.
        key: String,
    },

    /// The computed diff could not be expressed in the wire format.
    #[error("diff error: {0}")]
    Diff(#[from] CoreError),
}

/// Result type alias for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = TrackerError::NotAnObject { found: "array" };
        assert_eq!(err.to_string(), "state must encode to a JSON object, got array");

        let err = TrackerError::ReservedKey {
            key: "__syncer_data_version".into(),
        };
        assert_eq!(err.to_string(), "state uses reserved key '__syncer_data_version'");

        let err = TrackerError::from(CoreError::UnsupportedOp {
            op: "move",
            path: "/a".into(),
        });
        assert_eq!(
            err.to_string(),
            "diff error: unsupported patch operation 'move' at '/a'"
        );
    }
}
