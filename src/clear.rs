//! Undoing a build by name prefix.
//!
//! Removes generated nodes only. Parameters added by a build and driver
//! entries appended to originals are left in place.

use crate::document::{DocumentError, GraphDocument};
use crate::traversal;
use crate::types::{GraphId, NodeId};

/// Remove every node under `root` whose name starts with `prefix`.
///
/// Matching is ordinal and case-sensitive, across every nested graph.
/// Transitions into removed nodes are dropped with them. An empty prefix
/// removes nothing. Returns the number of nodes removed.
pub fn clear_by_prefix(doc: &mut GraphDocument, root: GraphId, prefix: &str) -> Result<usize, DocumentError> {
    doc.require_graph(root)?;
    if prefix.is_empty() {
        return Ok(0);
    }

    let doomed: Vec<NodeId> = traversal::enumerate(doc, root)
        .into_iter()
        .filter(|e| doc.node(e.node).is_some_and(|n| n.name.starts_with(prefix)))
        .map(|e| e.node)
        .collect();

    for id in &doomed {
        doc.remove_node(*id)?;
    }

    tracing::info!(graph = %root, prefix, removed = doomed.len(), "cleared generated nodes");
    Ok(doomed.len())
}

/// [`clear_by_prefix`] on the root graph of a layer.
pub fn clear_layer(doc: &mut GraphDocument, layer_index: usize, prefix: &str) -> Result<usize, DocumentError> {
    let root = doc.layer_root(layer_index)?;
    clear_by_prefix(doc, root, prefix)
}
