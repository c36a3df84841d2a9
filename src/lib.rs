//! # statesync-kernel
//!
//! Remote-sync subgraph generation for hierarchical animation state graphs.
//!
//! The kernel answers one question:
//!
//! > Given a layer and a code per state, what graph lets an observer replay
//! > another actor's current state from a few synced parameters?
//!
//! ## Core Contract
//!
//! 1. Assign each eligible state a small non-negative code (first wins)
//! 2. Clone the coded states into a mirrored remote cluster
//! 3. Wire the clones into a complete graph guarded by the destination code
//! 4. Attach drivers to the originals so entering a state emits its code
//! 5. Undo a build later by removing every node with the clone prefix
//!
//! ## Architecture
//!
//! ```text
//! SyncRequest → CodeTable → GuardScheme → draft edits → BuildReport
//!                                              ↓
//!                                 DriverSink (host behavior system)
//! ```
//!
//! ## Atomicity
//!
//! A build runs against a draft copy of the document. The caller's document
//! is replaced only when every step succeeds, so a failed build never leaves
//! a half-built graph behind.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod document;
pub mod traversal;
pub mod codec;
pub mod codes;
pub mod sink;
pub mod builder;
pub mod clear;

// Re-exports
pub use types::{
    Behavior, BehaviorId, Driver, DriverMode, GraphId, Guard, Layer, Node, NodeId, Parameter,
    ParameterEntry, ParameterKind, Position, StateGraph, Transition,
};
pub use document::{DocumentError, GraphDocument};
pub use traversal::{enumerate, find_by_path, find_first_by_name, structural_hash, StateEntry};
pub use codec::{decode, encode, minimal_bits, should_suggest_int};
pub use codes::{
    parse_trailing_code, resolve_assignments, resolve_code, Assignment, CodeTable, Collision,
    MarkerNames, MarkerSet, NamedCollision, NO_CODE,
};
pub use sink::{DocumentDriverSink, DriverHandle, DriverSink, DriverSlot, SinkError};
pub use builder::{
    BitWidth, BuildError, BuildOptions, BuildReport, BuildWarning, ConflictPolicy, Severity,
    SyncBuilder, SyncMode, SyncRequest,
};
pub use clear::{clear_by_prefix, clear_layer};

/// Schema version of the serialized document and report formats.
/// Increment on breaking changes to any serialized type.
pub const STATESYNC_SCHEMA_VERSION: &str = "1.0.0";
