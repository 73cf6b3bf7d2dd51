//! Published message framing.
//!
//! The producer publishes two kinds of payloads on the broadcast channel:
//!
//! - a zero-length payload: the producer was (re)initialized and consumers
//!   should request a full snapshot
//! - a JSON array of diff operations:
//!
//! ```text
//! [{"op":"replace","path":"/a","value":2},{"op":"remove","path":"/b"}]
//! ```

use crate::error::{CoreError, CoreResult};
use crate::op::DiffOp;
use bytes::Bytes;
use json_patch::Patch;
use serde::{Deserialize, Serialize};

/// An ordered list of diff operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diff(pub Vec<DiffOp>);

impl Diff {
    /// Create an empty diff.
    #[must_use]
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Check if this diff has no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of operations in this diff.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Get the operations in this diff.
    #[must_use]
    pub fn operations(&self) -> &[DiffOp] {
        &self.0
    }

    /// Iterate over the operations in order.
    pub fn iter(&self) -> std::slice::Iter<'_, DiffOp> {
        self.0.iter()
    }

    /// Convert from a `json_patch` patch.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedOp`] if the patch contains move, copy or
    /// test operations.
    pub fn from_patch(patch: &Patch) -> CoreResult<Self> {
        patch
            .0
            .iter()
            .map(DiffOp::try_from)
            .collect::<CoreResult<Vec<_>>>()
            .map(Self)
    }

    /// Convert into a `json_patch` patch that can be applied to a document.
    ///
    /// # Errors
    ///
    /// Returns an error if any operation has an invalid path or lacks a
    /// required value.
    pub fn to_patch(&self) -> CoreResult<Patch> {
        self.0
            .iter()
            .map(DiffOp::to_patch_operation)
            .collect::<CoreResult<Vec<_>>>()
            .map(Patch)
    }

    /// Serialize to the wire format.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Json`] if serialization fails.
    pub fn to_bytes(&self) -> CoreResult<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }
}

impl<'a> IntoIterator for &'a Diff {
    type Item = &'a DiffOp;
    type IntoIter = std::slice::Iter<'a, DiffOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<DiffOp>> for Diff {
    fn from(ops: Vec<DiffOp>) -> Self {
        Self(ops)
    }
}

/// A decoded broadcast payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Zero-length control signal: request a full snapshot.
    Reset,
    /// Incremental update.
    Diff(Diff),
}

impl Message {
    /// Decode a published payload.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Json`] if a non-empty payload is not a diff array.
    ///
    /// # Example
    ///
    /// ```rust
    /// use syncer_core::{Message, PatchOp};
    ///
    /// assert_eq!(Message::decode(b"").unwrap(), Message::Reset);
    ///
    /// let msg = Message::decode(br#"[{"op":"remove","path":"/a"}]"#).unwrap();
    /// match msg {
    ///     Message::Diff(diff) => assert_eq!(diff.operations()[0].op, PatchOp::Remove),
    ///     Message::Reset => unreachable!(),
    /// }
    /// ```
    pub fn decode(payload: &[u8]) -> CoreResult<Self> {
        if payload.is_empty() {
            return Ok(Message::Reset);
        }
        let diff: Diff = serde_json::from_slice(payload).map_err(CoreError::Json)?;
        Ok(Message::Diff(diff))
    }

    /// Encode for publication.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Json`] if serialization fails.
    pub fn encode(&self) -> CoreResult<Bytes> {
        match self {
            Message::Reset => Ok(Bytes::new()),
            Message::Diff(diff) => diff.to_bytes(),
        }
    }
}
