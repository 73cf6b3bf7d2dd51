//! Tracker configuration.

use syncer_core::DEFAULT_VERSION_KEY;

/// Configuration for a [`StateTracker`](crate::StateTracker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Top-level key under which the version is embedded in every snapshot.
    /// Consumers must be configured with the same key.
    pub version_key: String,
    /// Publish the reset signal right after construction.
    pub announce_on_start: bool,
}

impl TrackerConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version_key: DEFAULT_VERSION_KEY.to_string(),
            announce_on_start: true,
        }
    }

    /// Sets the version key.
    #[must_use]
    pub fn with_version_key(mut self, key: impl Into<String>) -> Self {
        self.version_key = key.into();
        self
    }

    /// Sets whether the reset signal is published on construction.
    #[must_use]
    pub fn with_announce_on_start(mut self, announce: bool) -> Self {
        self.announce_on_start = announce;
        self
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::new()
    }
}
