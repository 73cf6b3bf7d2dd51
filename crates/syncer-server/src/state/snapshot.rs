//! Lock-protected snapshot shared between the writer and request handlers.

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug)]
struct Published {
    snapshot: Bytes,
    version: u64,
}

/// Cheap, cloneable read handle to the last committed snapshot.
///
/// The snapshot text and its version live under one mutex that is held only
/// to swap or copy them out, so a request never waits on diff computation.
/// Handles can be moved to any thread, which is how full-state requests are
/// answered concurrently with [`StateTracker::update`](crate::StateTracker::update).
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use syncer_core::InMemoryChannel;
/// use syncer_server::StateTracker;
/// use serde_json::json;
///
/// let mut tracker = StateTracker::new(Arc::new(InMemoryChannel::new()), &json!({"a": 1}))
///     .expect("object state encodes");
/// let handle = tracker.snapshot_handle();
///
/// std::thread::spawn(move || handle.version()).join().unwrap();
/// tracker.update(&json!({"a": 2})).expect("object state encodes");
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotHandle {
    inner: Arc<Mutex<Published>>,
}

impl SnapshotHandle {
    pub(crate) fn new(snapshot: Bytes, version: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Published { snapshot, version })),
        }
    }

    pub(crate) fn store(&self, snapshot: Bytes, version: u64) {
        let mut guard = self.inner.lock();
        guard.snapshot = snapshot;
        guard.version = version;
    }

    /// Answer a full-state request. The request payload is ignored.
    #[must_use]
    pub fn reply(&self, _request: &[u8]) -> Bytes {
        self.inner.lock().snapshot.clone()
    }

    /// The snapshot text together with the version it encodes, read
    /// atomically.
    #[must_use]
    pub fn read(&self) -> (u64, Bytes) {
        let guard = self.inner.lock();
        (guard.version, guard.snapshot.clone())
    }

    /// The last committed snapshot text.
    #[must_use]
    pub fn snapshot(&self) -> Bytes {
        self.inner.lock().snapshot.clone()
    }

    /// The last committed version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.lock().version
    }
}
