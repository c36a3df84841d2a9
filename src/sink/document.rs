//! Driver sink over the crate's own document model.

use crate::document::{DocumentError, GraphDocument};
use crate::types::{Behavior, BehaviorId, NodeId, ParameterEntry};
use super::{DriverHandle, DriverSink, DriverSlot};

/// Error type for the document sink.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SinkError {
    /// Underlying document lookup failed.
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
    /// Handle points at a behavior that is not a driver.
    #[error("{0} is not a parameter driver")]
    NotADriver(BehaviorId),
}

/// Driver sink backed by [`Behavior::ParameterDriver`] instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentDriverSink;

impl DocumentDriverSink {
    /// Create a new sink.
    pub fn new() -> Self {
        Self
    }
}

impl DriverSink for DocumentDriverSink {
    type Error = SinkError;

    fn is_driver(&self, doc: &GraphDocument, behavior: BehaviorId) -> bool {
        matches!(doc.behavior(behavior), Some(Behavior::ParameterDriver { .. }))
    }

    fn get_or_create_driver(
        &mut self,
        doc: &mut GraphDocument,
        node: NodeId,
    ) -> Result<DriverSlot, Self::Error> {
        let view: &GraphDocument = doc;
        let existing = view
            .require_node(node)?
            .behaviors
            .iter()
            .copied()
            .find(|b| self.is_driver(view, *b));

        match existing {
            Some(behavior) => Ok(DriverSlot::Existing(DriverHandle { node, behavior })),
            None => {
                let behavior = doc.attach_driver(node)?;
                Ok(DriverSlot::Created(DriverHandle { node, behavior }))
            }
        }
    }

    fn append_entry_if_absent(
        &mut self,
        doc: &mut GraphDocument,
        handle: DriverHandle,
        entry: ParameterEntry,
    ) -> Result<bool, Self::Error> {
        match doc.require_behavior_mut(handle.behavior)? {
            Behavior::ParameterDriver { driver, .. } => Ok(driver.append_if_absent(entry)),
            Behavior::Opaque { .. } => Err(SinkError::NotADriver(handle.behavior)),
        }
    }
}
