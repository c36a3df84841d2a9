//! Packing the remote side into its own child graph.

use crate::document::GraphDocument;
use crate::types::{GraphId, NodeId, Position};

use super::report::{BuildReport, CloneRecord, Edit};
use super::BuildError;

/// Where the packed graph is placed inside the root.
pub const PACK_POSITION: Position = Position { x: -250.0, y: 0.0 };

/// Create a child graph of `root` named `name`, move the remote-entry node
/// and every clone into it, and make the remote entry its default.
pub(crate) fn pack(
    doc: &mut GraphDocument,
    root: GraphId,
    name: &str,
    entry: Option<NodeId>,
    clones: &[CloneRecord],
    report: &mut BuildReport,
) -> Result<GraphId, BuildError> {
    let packed = doc.add_graph(root, name, PACK_POSITION)?;
    report.edits.push(Edit::CreateGraph { graph: packed, name: name.to_string() });

    let moved = entry.into_iter().chain(clones.iter().map(|c| c.clone));
    for node in moved {
        doc.move_node(node, packed)?;
        report.edits.push(Edit::MoveNode { node, to: packed });
    }

    if let Some(entry) = entry {
        doc.set_default_entry(packed, Some(entry))?;
        report.edits.push(Edit::SetDefaultEntry { graph: packed, node: entry });
    }

    tracing::debug!(graph = %packed, nodes = clones.len(), "remote side packed");
    Ok(packed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_pack_moves_entry_and_clones() {
        let mut doc = GraphDocument::new("pack");
        let (_, root) = doc.add_layer("Base");
        let entry = doc.add_node(root, "Remote Tree", Position::new(10.0, 10.0)).unwrap();
        let original = doc.add_node(root, "Wave1", Position::default()).unwrap();
        let clone = doc.add_node(root, "Remote_Wave1", Position::new(-60.0, 0.0)).unwrap();
        doc.set_default_entry(root, Some(entry)).unwrap();
        let records = [CloneRecord { code: 1, original, clone, name: "Remote_Wave1".to_string() }];
        let mut report = BuildReport::new(Uuid::nil(), 0);

        let packed = pack(&mut doc, root, "Remote Sync", Some(entry), &records, &mut report).unwrap();

        let graph = doc.graph(packed).unwrap();
        assert_eq!(graph.name, "Remote Sync");
        assert_eq!(graph.position, PACK_POSITION);
        assert_eq!(graph.nodes, vec![entry, clone]);
        assert_eq!(graph.default_entry, Some(entry));
        assert_eq!(doc.graph(root).unwrap().nodes, vec![original]);
        assert_eq!(doc.graph(root).unwrap().default_entry, None);
        // Positions are kept.
        assert_eq!(doc.node(clone).unwrap().position, Position::new(-60.0, 0.0));
    }

    #[test]
    fn test_pack_without_entry() {
        let mut doc = GraphDocument::new("pack");
        let (_, root) = doc.add_layer("Base");
        let mut report = BuildReport::new(Uuid::nil(), 0);

        let packed = pack(&mut doc, root, "Remote Sync", None, &[], &mut report).unwrap();
        assert_eq!(doc.graph(packed).unwrap().default_entry, None);
        assert_eq!(doc.graph(root).unwrap().children, vec![packed]);
    }
}
