//! Consumer-side follower of a replicated state.

use crate::error::{ClientError, ClientResult};
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;
use syncer_core::{DEFAULT_VERSION_KEY, Diff, Message, StateRequester, top_level_pointer};

/// Configuration for a [`Replica`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaConfig {
    /// Top-level key holding the version; must match the producer's.
    pub version_key: String,
}

impl ReplicaConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version_key: DEFAULT_VERSION_KEY.to_string(),
        }
    }

    /// Sets the version key.
    #[must_use]
    pub fn with_version_key(mut self, key: impl Into<String>) -> Self {
        self.version_key = key.into();
        self
    }
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of [`Replica::receive`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReplicaUpdate {
    /// The replica needs a full snapshot before it can apply diffs: the
    /// producer restarted, no snapshot was loaded yet, or a version was
    /// skipped.
    ResyncRequired,
    /// The diff targets a version the replica already has; ignored.
    Stale {
        /// Version the diff would produce.
        version: u64,
    },
    /// The diff was applied.
    Applied {
        /// The new version.
        version: u64,
        /// The applied operations, ready for a
        /// [`PatchDispatcher`](crate::PatchDispatcher).
        diff: Diff,
    },
}

/// A local copy of the producer's state, kept current by applying diffs.
///
/// # Example
///
/// ```rust
/// use syncer_client::{Replica, ReplicaUpdate};
///
/// let mut replica = Replica::new();
/// assert_eq!(replica.receive(b"").unwrap(), ReplicaUpdate::ResyncRequired);
///
/// replica.load_snapshot(br#"{"a":1,"__syncer_data_version":4}"#).unwrap();
/// let update = replica
///     .receive(br#"[{"op":"replace","path":"/a","value":2},{"op":"replace","path":"/__syncer_data_version","value":5}]"#)
///     .unwrap();
///
/// assert!(matches!(update, ReplicaUpdate::Applied { version: 5, .. }));
/// assert_eq!(replica.state().unwrap()["a"], 2);
/// ```
#[derive(Debug, Clone)]
pub struct Replica {
    config: ReplicaConfig,
    version_pointer: String,
    state: Option<Value>,
    version: u64,
    synced: bool,
}

impl Default for Replica {
    fn default() -> Self {
        Self::new()
    }
}

impl Replica {
    /// Create an empty replica with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ReplicaConfig::default())
    }

    /// Create an empty replica.
    #[must_use]
    pub fn with_config(config: ReplicaConfig) -> Self {
        Self {
            version_pointer: top_level_pointer(&config.version_key),
            config,
            state: None,
            version: 0,
            synced: false,
        }
    }

    /// Adopt a full-state reply. Returns the snapshot's version.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a JSON object carrying an
    /// unsigned integer version. The replica is left untouched.
    pub fn load_snapshot(&mut self, payload: &[u8]) -> ClientResult<u64> {
        let state: Value =
            serde_json::from_slice(payload).map_err(|e| ClientError::InvalidSnapshot {
                reason: e.to_string(),
            })?;

        if !state.is_object() {
            return Err(ClientError::InvalidSnapshot {
                reason: "snapshot is not a JSON object".to_string(),
            });
        }

        let version = state
            .get(&self.config.version_key)
            .and_then(Value::as_u64)
            .ok_or_else(|| ClientError::MissingVersion {
                key: self.config.version_key.clone(),
            })?;

        debug!("loaded snapshot at version {version}");
        self.state = Some(state);
        self.version = version;
        self.synced = true;
        Ok(version)
    }

    /// Process one published payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is malformed, the diff carries no
    /// version, or it cannot be applied to the local state. In the last case
    /// the replica keeps its previous state and requires a resync.
    pub fn receive(&mut self, payload: &[u8]) -> ClientResult<ReplicaUpdate> {
        let diff = match Message::decode(payload)? {
            Message::Reset => {
                debug!("producer reset, full state required");
                self.synced = false;
                return Ok(ReplicaUpdate::ResyncRequired);
            }
            Message::Diff(diff) => diff,
        };

        if !self.synced {
            return Ok(ReplicaUpdate::ResyncRequired);
        }

        let target = diff
            .iter()
            .find(|op| op.path == self.version_pointer)
            .and_then(|op| op.value.as_ref())
            .and_then(Value::as_u64)
            .ok_or_else(|| ClientError::MissingVersion {
                key: self.config.version_key.clone(),
            })?;

        if target <= self.version {
            debug!("ignoring stale diff for version {target}, at {}", self.version);
            return Ok(ReplicaUpdate::Stale { version: target });
        }
        if target != self.version + 1 {
            debug!("version gap {} -> {target}, full state required", self.version);
            self.synced = false;
            return Ok(ReplicaUpdate::ResyncRequired);
        }

        let Some(current) = self.state.as_ref() else {
            return Ok(ReplicaUpdate::ResyncRequired);
        };

        let patch = diff.to_patch()?;
        let mut next = current.clone();
        if let Err(err) = json_patch::patch(&mut next, &patch.0) {
            self.synced = false;
            return Err(ClientError::Patch {
                reason: err.to_string(),
            });
        }

        self.state = Some(next);
        self.version = target;
        Ok(ReplicaUpdate::Applied {
            version: target,
            diff,
        })
    }

    /// Request the full state and load it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NoResponder`] if the request is not answered, or
    /// any error from [`load_snapshot`](Self::load_snapshot).
    pub fn resync<R: StateRequester>(&mut self, requester: &R) -> ClientResult<u64> {
        let reply = requester.request(&[]).ok_or(ClientError::NoResponder)?;
        self.load_snapshot(&reply)
    }

    /// Process a payload, resyncing through `requester` when needed.
    ///
    /// Returns the applied diff, or `None` if nothing was applied (stale diff
    /// or a resync took place).
    ///
    /// # Errors
    ///
    /// See [`receive`](Self::receive) and [`resync`](Self::resync).
    pub fn process<R: StateRequester>(
        &mut self,
        payload: &[u8],
        requester: &R,
    ) -> ClientResult<Option<Diff>> {
        match self.receive(payload)? {
            ReplicaUpdate::Applied { diff, .. } => Ok(Some(diff)),
            ReplicaUpdate::Stale { .. } => Ok(None),
            ReplicaUpdate::ResyncRequired => {
                self.resync(requester)?;
                Ok(None)
            }
        }
    }

    /// Decode the replicated data, version key removed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotSynced`] before the first snapshot, or
    /// [`ClientError::Decode`] if the state does not fit `T`.
    pub fn data<T: DeserializeOwned>(&self) -> ClientResult<T> {
        let mut state = self.state.clone().ok_or(ClientError::NotSynced)?;
        if let Some(map) = state.as_object_mut() {
            map.remove(&self.config.version_key);
        }
        serde_json::from_value(state).map_err(ClientError::Decode)
    }

    /// The local state including the version key, if any snapshot was loaded.
    #[must_use]
    pub fn state(&self) -> Option<&Value> {
        self.state.as_ref()
    }

    /// The version of the local state.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether the replica can apply the next diff without a resync.
    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.synced
    }
}
