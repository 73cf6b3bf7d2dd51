//! `StateTracker` implementation with versioned diff publication.

use super::snapshot::SnapshotHandle;
use crate::config::TrackerConfig;
use crate::error::{TrackerError, TrackerResult};
use bytes::Bytes;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use syncer_core::{Diff, SyncChannel, SyncState, top_level_pointer};
use tracing::{debug, trace};

/// Authoritative, versioned state of a single producer.
///
/// `StateTracker` encodes producer data of type `T` to JSON, embeds an integer
/// version under a reserved top-level key, and publishes an RFC 6902 diff on
/// the channel every time the data materially changes.
///
/// - Construction caches the version-0 snapshot, registers a full-state
///   responder with the channel and publishes the zero-length reset signal.
/// - [`update`](Self::update) either commits state, version and snapshot
///   together and publishes one diff, or does nothing at all.
/// - Full-state requests are answered from the cached snapshot through a
///   [`SnapshotHandle`], concurrently with updates.
///
/// # Single writer
///
/// `update` takes `&mut self`. Wrap the tracker in a mutex only if several
/// producers really have to share it; full-state reads never need to.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use serde::{Deserialize, Serialize};
/// use syncer_core::{InMemoryChannel, StateRequester};
/// use syncer_server::StateTracker;
///
/// #[derive(Clone, Serialize, Deserialize)]
/// struct Board {
///     title: String,
///     cards: Vec<String>,
/// }
///
/// let channel = Arc::new(InMemoryChannel::new());
/// let mut board = Board { title: "todo".into(), cards: vec![] };
/// let mut tracker = StateTracker::new(Arc::clone(&channel), &board).unwrap();
///
/// board.cards.push("write docs".into());
/// let diff = tracker.update(&board).unwrap().expect("cards changed");
/// assert_eq!(diff.len(), 2); // the new card + the version bump
///
/// let reply = channel.request(b"").unwrap();
/// let state: serde_json::Value = serde_json::from_slice(&reply).unwrap();
/// assert_eq!(state["__syncer_data_version"], 1);
/// ```
pub struct StateTracker<T: SyncState, C: SyncChannel> {
    channel: C,
    config: TrackerConfig,
    version_pointer: String,
    state: Value,
    version: u64,
    published: SnapshotHandle,
    _data: PhantomData<fn(&T)>,
}

impl<T: SyncState, C: SyncChannel> StateTracker<T, C> {
    /// Create a tracker with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `initial` does not encode to a JSON object or
    /// collides with the reserved version key.
    pub fn new(channel: C, initial: &T) -> TrackerResult<Self> {
        Self::with_config(channel, initial, TrackerConfig::default())
    }

    /// Create a tracker with an explicit configuration.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn with_config(channel: C, initial: &T, config: TrackerConfig) -> TrackerResult<Self> {
        let state = encode_state(initial, &config.version_key, 0)?;
        let published = SnapshotHandle::new(encode_snapshot(&state)?, 0);

        let responder = published.clone();
        channel.serve_requests(Arc::new(move |request: &[u8]| {
            trace!(request_len = request.len(), "serving full state");
            responder.reply(request)
        }));

        let tracker = Self {
            channel,
            version_pointer: top_level_pointer(&config.version_key),
            config,
            state,
            version: 0,
            published,
            _data: PhantomData,
        };

        if tracker.config.announce_on_start {
            tracker.announce();
        }

        Ok(tracker)
    }

    /// Update the producer data.
    ///
    /// Encodes `data` with a tentative version of `current + 1` and diffs it
    /// against the committed state. If the diff touches anything besides the
    /// version key the new state is committed, the snapshot refreshed and the
    /// diff published and returned. Otherwise nothing changes and `Ok(None)`
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` cannot be encoded. Nothing is committed or
    /// published in that case.
    pub fn update(&mut self, data: &T) -> TrackerResult<Option<Diff>> {
        let next_version = self.version + 1;
        let next = encode_state(data, &self.config.version_key, next_version)?;

        let diff = Diff::from_patch(&json_patch::diff(&self.state, &next))?;
        if !diff.iter().any(|op| op.path != self.version_pointer) {
            trace!(version = self.version, "state unchanged, nothing to publish");
            return Ok(None);
        }

        let payload = diff.to_bytes()?;
        let snapshot = encode_snapshot(&next)?;

        self.state = next;
        self.version = next_version;
        self.published.store(snapshot, next_version);
        self.channel.publish(payload);

        debug!(version = next_version, ops = diff.len(), "published state diff");
        Ok(Some(diff))
    }

    /// Answer a full-state request with the cached snapshot.
    ///
    /// The request payload is ignored.
    #[must_use]
    pub fn handle_full_state_request(&self, request: &[u8]) -> Bytes {
        self.published.reply(request)
    }

    /// Publish the reset signal, prompting every consumer to request the
    /// full state. Useful after the transport reconnects.
    pub fn announce(&self) {
        debug!(version = self.version, "announcing state owner");
        // zero-length payload: consumers should request the full state
        self.channel.publish(Bytes::new());
    }

    /// A handle answering full-state requests from other threads.
    #[must_use]
    pub fn snapshot_handle(&self) -> SnapshotHandle {
        self.published.clone()
    }

    /// The last committed version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The committed encoded state, version key included.
    #[must_use]
    pub fn state(&self) -> &Value {
        &self.state
    }

    /// The cached snapshot text.
    #[must_use]
    pub fn snapshot(&self) -> Bytes {
        self.published.snapshot()
    }

    /// The tracker configuration.
    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// The underlying channel.
    #[must_use]
    pub fn channel(&self) -> &C {
        &self.channel
    }
}

impl<T: SyncState, C: SyncChannel> std::fmt::Debug for StateTracker<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateTracker")
            .field("version", &self.version)
            .field("version_key", &self.config.version_key)
            .finish_non_exhaustive()
    }
}

fn encode_state<T: SyncState>(data: &T, version_key: &str, version: u64) -> TrackerResult<Value> {
    let value = serde_json::to_value(data).map_err(|e| TrackerError::Serialization {
        reason: format!("failed to encode state: {e}"),
    })?;

    let mut map = match value {
        Value::Object(map) => map,
        other => {
            return Err(TrackerError::NotAnObject {
                found: json_kind(&other),
            });
        }
    };

    if map.contains_key(version_key) {
        return Err(TrackerError::ReservedKey {
            key: version_key.to_string(),
        });
    }

    map.insert(version_key.to_string(), Value::from(version));
    Ok(Value::Object(map))
}

fn encode_snapshot(state: &Value) -> TrackerResult<Bytes> {
    serde_json::to_vec(state)
        .map(Bytes::from)
        .map_err(|e| TrackerError::Serialization {
            reason: format!("failed to encode snapshot: {e}"),
        })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
