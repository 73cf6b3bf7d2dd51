//! Shared types for snapshot + diff state replication.
//!
//! A single producer keeps an authoritative JSON state and publishes
//! RFC 6902 diffs (restricted to `add`, `remove` and `replace`) whenever the
//! state materially changes. Consumers bootstrap from a full snapshot and then
//! follow the diff stream. This crate holds what both sides agree on: the
//! operation types, the wire format and the transport interface.

pub mod channel;
pub mod error;
pub mod op;
pub mod wire;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use channel::{InMemoryChannel, RequestHandler, StateRequester, SyncChannel};
pub use error::{CoreError, CoreResult};
pub use op::{DiffOp, PatchOp, PatchOpSet};
pub use wire::{Diff, Message};
/// Re-export to ensure the same type is used
pub use serde_json::Value as JsonValue;

/// Top-level key holding the integer state version inside every snapshot.
///
/// Producer data must not use this key.
pub const DEFAULT_VERSION_KEY: &str = "__syncer_data_version";

/// Data that can be replicated: encodable, decodable and shareable across
/// threads.
pub trait SyncState: 'static + Clone + Send + Sync + Serialize + DeserializeOwned {}
impl<T> SyncState for T where T: 'static + Clone + Send + Sync + Serialize + DeserializeOwned {}

/// Builds the JSON pointer addressing a top-level `key`.
#[must_use]
pub fn top_level_pointer(key: &str) -> String {
    format!("/{}", key.replace('~', "~0").replace('/', "~1"))
}
