//! Client library for snapshot + diff state replication.
//!
//! - [`Replica`] follows a producer: it loads full snapshots, applies
//!   incoming diffs in version order and asks for a resync when it falls
//!   behind or the producer restarts.
//! - [`PatchDispatcher`] routes the individual operations of a diff to typed
//!   handlers registered per path pattern and operation kind.

pub mod dispatcher;
pub mod error;
pub mod replica;

pub use dispatcher::{OpHandler, PatchDispatcher, PatchRule};
pub use error::{ClientError, ClientResult};
pub use regex::Captures;
pub use replica::{Replica, ReplicaConfig, ReplicaUpdate};

pub use syncer_core::{Diff, DiffOp, PatchOp, PatchOpSet};
