use syncer_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ClientError {
    #[error("invalid path pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("malformed message: {0}")]
    Message(#[from] CoreError),

    #[error("failed to apply diff: {reason}")]
    Patch { reason: String },

    #[error("missing or invalid version under '{key}'")]
    MissingVersion { key: String },

    #[error("invalid snapshot: {reason}")]
    InvalidSnapshot { reason: String },

    #[error("no snapshot loaded")]
    NotSynced,

    #[error("full state request went unanswered")]
    NoResponder,

    #[error("failed to decode state: {0}")]
    Decode(#[source] serde_json::Error),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
