//! Versioned producer state with diff publication.
//!
//! This module provides [`StateTracker`], which owns the canonical encoded
//! state of a single producer. Each material change is committed as a new
//! version, the cached snapshot is refreshed, and the JSON Patch diff from the
//! previous version is broadcast on the channel.
//!
//! # Architecture
//!
//! Only the snapshot text and its version are shared, behind a
//! `parking_lot::Mutex` inside [`SnapshotHandle`]. The encoded state itself is
//! owned by the tracker and mutated through `&mut self`, so there is exactly
//! one writer while any number of threads answer full-state requests.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use syncer_core::InMemoryChannel;
//! use syncer_server::state::StateTracker;
//! use serde_json::json;
//!
//! let channel = Arc::new(InMemoryChannel::new());
//! let mut tracker = StateTracker::new(Arc::clone(&channel), &json!({"count": 0}))
//!     .expect("object state encodes");
//!
//! let diff = tracker.update(&json!({"count": 1})).expect("object state encodes");
//! assert!(diff.is_some());
//! assert_eq!(tracker.version(), 1);
//!
//! // Same data again: nothing to publish
//! assert!(tracker.update(&json!({"count": 1})).unwrap().is_none());
//! assert_eq!(channel.publish_count(), 2); // reset signal + one diff
//! ```

mod snapshot;
mod tracker;

pub use snapshot::SnapshotHandle;
pub use tracker::StateTracker;
