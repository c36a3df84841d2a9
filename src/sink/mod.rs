//! Driver capability consumed by the builder.
//!
//! The builder never inspects behavior types. Everything it needs from the
//! host's behavior system goes through [`DriverSink`]: recognising a driver,
//! finding or creating the one driver of a node, and appending entries.

pub mod document;

use crate::document::GraphDocument;
use crate::types::{BehaviorId, NodeId, ParameterEntry};

/// Reference to one node's driver instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DriverHandle {
    /// Node the driver is attached to.
    pub node: NodeId,
    /// Driver behavior instance.
    pub behavior: BehaviorId,
}

/// Result of [`DriverSink::get_or_create_driver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverSlot {
    /// The node already had a driver.
    Existing(DriverHandle),
    /// A new driver was attached.
    Created(DriverHandle),
}

impl DriverSlot {
    /// The driver handle.
    pub fn handle(&self) -> DriverHandle {
        match self {
            Self::Existing(h) | Self::Created(h) => *h,
        }
    }

    /// Whether the driver was created by this call.
    pub fn created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Host adapter for parameter drivers.
///
/// Implementations must never attach a second driver to a node that already
/// has one, and must not append an entry identical to one already present.
pub trait DriverSink {
    /// Error type for sink operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Whether `behavior` is a driver instance.
    fn is_driver(&self, doc: &GraphDocument, behavior: BehaviorId) -> bool;

    /// Reuse the node's driver or attach exactly one new instance.
    fn get_or_create_driver(
        &mut self,
        doc: &mut GraphDocument,
        node: NodeId,
    ) -> Result<DriverSlot, Self::Error>;

    /// Append `entry` unless an identical entry exists. Returns `true` if appended.
    fn append_entry_if_absent(
        &mut self,
        doc: &mut GraphDocument,
        handle: DriverHandle,
        entry: ParameterEntry,
    ) -> Result<bool, Self::Error>;
}

pub use document::{DocumentDriverSink, SinkError};
