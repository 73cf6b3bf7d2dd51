//! Patch operation kinds, operation masks and single diff operations.

use crate::error::{CoreError, CoreResult};
use json_patch::jsonptr::PointerBuf;
use json_patch::{AddOperation, PatchOperation, RemoveOperation, ReplaceOperation};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// The structural edits a published diff may contain.
///
/// Discriminants are bit values so that kinds compose into a [`PatchOpSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    /// Insert a value at a path.
    Add = 1,
    /// Delete the value at a path.
    Remove = 2,
    /// Overwrite the value at a path.
    Replace = 4,
}

impl PatchOp {
    /// Wire name of the operation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            PatchOp::Add => "add",
            PatchOp::Remove => "remove",
            PatchOp::Replace => "replace",
        }
    }

    const fn bit(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for PatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of [`PatchOp`] kinds, used as the operation mask of a dispatch rule.
///
/// ```rust
/// use syncer_core::{PatchOp, PatchOpSet};
///
/// let mask = PatchOp::Add | PatchOp::Replace;
/// assert!(mask.contains(PatchOp::Replace));
/// assert!(!mask.contains(PatchOp::Remove));
/// assert!(PatchOpSet::ANY.contains(PatchOp::Remove));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PatchOpSet(u8);

impl PatchOpSet {
    /// Matches nothing.
    pub const NONE: PatchOpSet = PatchOpSet(0);
    /// Matches add, remove and replace.
    pub const ANY: PatchOpSet =
        PatchOpSet(PatchOp::Add.bit() | PatchOp::Remove.bit() | PatchOp::Replace.bit());

    /// Build a set from individual operations.
    #[must_use]
    pub fn of(ops: &[PatchOp]) -> Self {
        ops.iter().fold(Self::NONE, |set, op| set | *op)
    }

    /// Check whether `op` belongs to the set.
    #[must_use]
    pub const fn contains(&self, op: PatchOp) -> bool {
        self.0 & op.bit() != 0
    }

    /// Check whether the set is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl From<PatchOp> for PatchOpSet {
    fn from(op: PatchOp) -> Self {
        PatchOpSet(op.bit())
    }
}

impl BitOr for PatchOpSet {
    type Output = PatchOpSet;

    fn bitor(self, rhs: PatchOpSet) -> PatchOpSet {
        PatchOpSet(self.0 | rhs.0)
    }
}

impl BitOr<PatchOp> for PatchOpSet {
    type Output = PatchOpSet;

    fn bitor(self, rhs: PatchOp) -> PatchOpSet {
        PatchOpSet(self.0 | rhs.bit())
    }
}

impl BitOr for PatchOp {
    type Output = PatchOpSet;

    fn bitor(self, rhs: PatchOp) -> PatchOpSet {
        PatchOpSet(self.bit() | rhs.bit())
    }
}

impl BitOrAssign<PatchOp> for PatchOpSet {
    fn bitor_assign(&mut self, rhs: PatchOp) {
        self.0 |= rhs.bit();
    }
}

/// One structural change inside a diff.
///
/// Serializes as `{"op": "...", "path": "...", "value": ...}` with `value`
/// omitted for `remove`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffOp {
    /// Operation kind.
    pub op: PatchOp,
    /// JSON pointer of the affected location.
    pub path: String,
    /// New value; `None` for remove.
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
}

// An explicit `"value": null` is a value, not an absent field.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl DiffOp {
    /// An add operation.
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Add,
            path: path.into(),
            value: Some(value),
        }
    }

    /// A remove operation.
    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: PatchOp::Remove,
            path: path.into(),
            value: None,
        }
    }

    /// A replace operation.
    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Replace,
            path: path.into(),
            value: Some(value),
        }
    }

    /// The value as seen by handlers: `null` when absent.
    #[must_use]
    pub fn value_or_null(&self) -> &Value {
        self.value.as_ref().unwrap_or(&Value::Null)
    }

    /// Convert into a `json_patch` operation for application.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPointer`] for a malformed path and
    /// [`CoreError::MissingValue`] for an add/replace without a value.
    pub fn to_patch_operation(&self) -> CoreResult<PatchOperation> {
        let path = PointerBuf::parse(&self.path).map_err(|e| CoreError::InvalidPointer {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let value = || {
            self.value.clone().ok_or_else(|| CoreError::MissingValue {
                op: self.op.as_str(),
                path: self.path.clone(),
            })
        };

        Ok(match self.op {
            PatchOp::Add => PatchOperation::Add(AddOperation {
                path,
                value: value()?,
            }),
            PatchOp::Remove => PatchOperation::Remove(RemoveOperation { path }),
            PatchOp::Replace => PatchOperation::Replace(ReplaceOperation {
                path,
                value: value()?,
            }),
        })
    }
}

impl TryFrom<&PatchOperation> for DiffOp {
    type Error = CoreError;

    fn try_from(op: &PatchOperation) -> CoreResult<Self> {
        match op {
            PatchOperation::Add(add) => Ok(DiffOp::add(add.path.as_str(), add.value.clone())),
            PatchOperation::Remove(remove) => Ok(DiffOp::remove(remove.path.as_str())),
            PatchOperation::Replace(replace) => {
                Ok(DiffOp::replace(replace.path.as_str(), replace.value.clone()))
            }
            PatchOperation::Move(mv) => Err(CoreError::UnsupportedOp {
                op: "move",
                path: mv.path.as_str().to_owned(),
            }),
            PatchOperation::Copy(copy) => Err(CoreError::UnsupportedOp {
                op: "copy",
                path: copy.path.as_str().to_owned(),
            }),
            PatchOperation::Test(test) => Err(CoreError::UnsupportedOp {
                op: "test",
                path: test.path.as_str().to_owned(),
            }),
        }
    }
}
