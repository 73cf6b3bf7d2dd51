//! Dispatch rules and type-erased handlers.

use log::warn;
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use syncer_core::{PatchOp, PatchOpSet};

/// Uniform dispatch signature shared by every rule.
///
/// Each rule decodes the raw operation value into its own type before calling
/// the user callback, so the dispatcher can keep a single homogeneous list.
pub trait OpHandler<C>: Send + Sync {
    /// Handle one matched operation. `groups` holds the pattern's captures
    /// with the whole path at index 0.
    fn handle(&self, ctx: &C, groups: &Captures<'_>, op: PatchOp, raw: &Value);
}

pub(crate) struct TypedHandler<T, F> {
    callback: F,
    _value: PhantomData<fn() -> T>,
}

impl<T, F> TypedHandler<T, F> {
    pub(crate) fn new(callback: F) -> Self {
        Self {
            callback,
            _value: PhantomData,
        }
    }
}

impl<C, T, F> OpHandler<C> for TypedHandler<T, F>
where
    T: DeserializeOwned + Default,
    F: Fn(&C, &Captures<'_>, PatchOp, T) + Send + Sync,
{
    fn handle(&self, ctx: &C, groups: &Captures<'_>, op: PatchOp, raw: &Value) {
        let value = if op == PatchOp::Remove {
            T::default()
        } else {
            T::deserialize(raw).unwrap_or_else(|err| {
                let path = groups.get(0).map_or("", |m| m.as_str());
                warn!("failed to decode {op} value at '{path}', using default: {err}");
                T::default()
            })
        };

        (self.callback)(ctx, groups, op, value);
    }
}

/// A registered (path pattern, operation mask, handler) triple.
pub struct PatchRule<C> {
    source: String,
    pattern: Regex,
    ops: PatchOpSet,
    handler: Box<dyn OpHandler<C>>,
}

impl<C> PatchRule<C> {
    pub(crate) fn new(
        source: String,
        pattern: Regex,
        ops: PatchOpSet,
        handler: Box<dyn OpHandler<C>>,
    ) -> Self {
        Self {
            source,
            pattern,
            ops,
            handler,
        }
    }

    /// The pattern as registered.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.source
    }

    /// The operation mask.
    #[must_use]
    pub fn ops(&self) -> PatchOpSet {
        self.ops
    }

    /// Match `path` and `op` against this rule, returning the captures of a
    /// whole-path match.
    #[must_use]
    pub fn matches<'p>(&self, path: &'p str, op: PatchOp) -> Option<Captures<'p>> {
        if !self.ops.contains(op) {
            return None;
        }
        self.pattern.captures(path)
    }

    pub(crate) fn handler(&self) -> &dyn OpHandler<C> {
        self.handler.as_ref()
    }
}

impl<C> std::fmt::Debug for PatchRule<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatchRule")
            .field("pattern", &self.source)
            .field("ops", &self.ops)
            .finish_non_exhaustive()
    }
}
