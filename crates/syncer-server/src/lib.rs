//! Producer side of snapshot + diff state replication.
//!
//! A producer hands its data to a [`StateTracker`] on every change. The
//! tracker keeps the canonical encoded state with an embedded version,
//! publishes a JSON Patch (RFC 6902) diff whenever the data materially
//! changes, and answers full-state requests from a cached snapshot.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use syncer_core::{InMemoryChannel, Message};
//! use syncer_server::StateTracker;
//! use serde_json::json;
//!
//! let channel = Arc::new(InMemoryChannel::new());
//! let mut tracker = StateTracker::new(Arc::clone(&channel), &json!({"a": 1}))
//!     .expect("object state encodes");
//!
//! tracker.update(&json!({"a": 2})).expect("object state encodes");
//!
//! let published = channel.take_published();
//! assert_eq!(Message::decode(&published[0]).unwrap(), Message::Reset);
//! assert!(matches!(Message::decode(&published[1]).unwrap(), Message::Diff(d) if d.len() == 2));
//! ```
//!
//! # Transport
//!
//! Any backend implementing [`SyncChannel`](syncer_core::SyncChannel) can
//! carry the traffic: a broadcast for diffs and the reset signal, and a
//! request/reply responder for full snapshots.
//!
//! # Error Handling
//!
//! Encoding failures are returned as [`TrackerError`] and leave the tracker
//! exactly as it was before the call.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod state;

pub use config::TrackerConfig;
pub use error::{TrackerError, TrackerResult};
pub use state::{SnapshotHandle, StateTracker};

// Re-export the entire syncer-core crate for full access
pub use syncer_core;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use syncer_server::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::TrackerConfig;
    pub use crate::error::{TrackerError, TrackerResult};
    pub use crate::state::{SnapshotHandle, StateTracker};

    pub use syncer_core::{
        Diff, DiffOp, InMemoryChannel, Message, PatchOp, PatchOpSet, SyncChannel, SyncState,
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn prelude_imports_work() {
        use crate::prelude::*;

        fn _assert_tracker<T: SyncState, C: SyncChannel>(_: StateTracker<T, C>) {}
        fn _assert_handle_is_shareable<H: Send + Sync + Clone>() {}
        _assert_handle_is_shareable::<SnapshotHandle>();
    }
}
