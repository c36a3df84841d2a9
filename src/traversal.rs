//! Depth-first traversal and indexing of a state graph tree.
//!
//! Traversal order is fixed: a graph's own nodes in order, then each child
//! graph recursively in order. Every "first match" lookup and every
//! first-wins code assignment depends on this order.

use xxhash_rust::xxh64::Xxh64;

use crate::document::GraphDocument;
use crate::types::{GraphId, Node, NodeId};

/// Separator between graph names in a node path.
pub const PATH_SEPARATOR: char = '/';

/// A node together with its path and owning graph.
///
/// Paths are not unique: two sibling nodes may share a name. The node id is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry {
    /// Slash-joined path, excluding the root graph name.
    pub path: String,
    /// Node identity.
    pub node: NodeId,
    /// Graph that owns the node.
    pub parent: GraphId,
}

fn join(parent_path: &str, name: &str) -> String {
    if parent_path.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", parent_path, PATH_SEPARATOR, name)
    }
}

fn walk<F>(doc: &GraphDocument, graph: GraphId, parent_path: &str, f: &mut F)
where
    F: FnMut(&str, GraphId, &Node),
{
    let Some(sm) = doc.graph(graph) else { return };

    for node in sm.nodes.iter().filter_map(|id| doc.node(*id)) {
        let path = join(parent_path, &node.name);
        f(&path, graph, node);
    }

    for child in &sm.children {
        let Some(child_graph) = doc.graph(*child) else { continue };
        let next = join(parent_path, &child_graph.name);
        walk(doc, *child, &next, f);
    }
}

/// Visit every node under `root` in traversal order as `(path, parent, node)`.
pub fn visit<F>(doc: &GraphDocument, root: GraphId, mut f: F)
where
    F: FnMut(&str, GraphId, &Node),
{
    walk(doc, root, "", &mut f);
}

/// Enumerate every node under `root` in traversal order.
pub fn enumerate(doc: &GraphDocument, root: GraphId) -> Vec<StateEntry> {
    let mut entries = Vec::new();
    visit(doc, root, |path, parent, node| {
        entries.push(StateEntry {
            path: path.to_string(),
            node: node.id,
            parent,
        });
    });
    entries
}

/// Enumerate nodes whose name does not start with `prefix`.
///
/// An empty prefix keeps everything.
pub fn enumerate_excluding_prefix(doc: &GraphDocument, root: GraphId, prefix: &str) -> Vec<StateEntry> {
    let mut entries = enumerate(doc, root);
    if !prefix.is_empty() {
        entries.retain(|e| doc.node(e.node).is_some_and(|n| !n.name.starts_with(prefix)));
    }
    entries
}

/// Every graph under `root` (inclusive), parents before children.
pub fn graphs(doc: &GraphDocument, root: GraphId) -> Vec<GraphId> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let Some(graph) = doc.graph(id) else { continue };
        out.push(id);
        stack.extend(graph.children.iter().rev().copied());
    }
    out
}

/// First node named exactly `name`, in traversal order.
///
/// Blank names never match.
pub fn find_first_by_name(doc: &GraphDocument, root: GraphId, name: &str) -> Option<NodeId> {
    if name.trim().is_empty() {
        return None;
    }
    let mut found = None;
    visit(doc, root, |_, _, node| {
        if found.is_none() && node.name == name {
            found = Some(node.id);
        }
    });
    found
}

/// Resolve a slash-separated path (graph names then node name) from `root`.
///
/// Empty segments are ignored, so `"/Sub//Idle"` equals `"Sub/Idle"`.
pub fn find_by_path(doc: &GraphDocument, root: GraphId, path: &str) -> Option<NodeId> {
    let parts: Vec<&str> = path.split(PATH_SEPARATOR).filter(|p| !p.is_empty()).collect();
    let (node_name, graph_names) = parts.split_last()?;

    let mut current = doc.graph(root)?;
    for name in graph_names {
        current = current
            .children
            .iter()
            .filter_map(|id| doc.graph(*id))
            .find(|g| g.name == *name)?;
    }

    current
        .nodes
        .iter()
        .filter_map(|id| doc.node(*id))
        .find(|n| n.name == *node_name)
        .map(|n| n.id)
}

/// Composite hash of every `(path, identity)` pair under `root`.
///
/// Changes whenever a node is added, removed, renamed or moved. Intended for
/// cheap change detection by callers that cache enumerations.
pub fn structural_hash(doc: &GraphDocument, root: GraphId) -> u64 {
    let mut hasher = Xxh64::new(0);
    visit(doc, root, |path, _, node| {
        hasher.update(path.as_bytes());
        hasher.update(&[0]);
        hasher.update(&node.id.as_u64().to_le_bytes());
    });
    hasher.digest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position;

    // Root
    //   Idle, Wave
    //   Locomotion/
    //     Walk, Run
    //     Air/
    //       Jump
    //   Emotes/
    //     Wave
    fn build_tree() -> (GraphDocument, GraphId) {
        let mut doc = GraphDocument::new("tree");
        let (_, root) = doc.add_layer("Base");
        doc.add_node(root, "Idle", Position::default()).unwrap();
        doc.add_node(root, "Wave", Position::default()).unwrap();
        let loco = doc.add_graph(root, "Locomotion", Position::default()).unwrap();
        doc.add_node(loco, "Walk", Position::default()).unwrap();
        doc.add_node(loco, "Run", Position::default()).unwrap();
        let air = doc.add_graph(loco, "Air", Position::default()).unwrap();
        doc.add_node(air, "Jump", Position::default()).unwrap();
        let emotes = doc.add_graph(root, "Emotes", Position::default()).unwrap();
        doc.add_node(emotes, "Wave", Position::default()).unwrap();
        (doc, root)
    }

    #[test]
    fn test_enumerate_paths_depth_first() {
        let (doc, root) = build_tree();
        let paths: Vec<String> = enumerate(&doc, root).into_iter().map(|e| e.path).collect();
        assert_eq!(
            paths,
            vec![
                "Idle",
                "Wave",
                "Locomotion/Walk",
                "Locomotion/Run",
                "Locomotion/Air/Jump",
                "Emotes/Wave",
            ]
        );
    }

    #[test]
    fn test_find_first_by_name_uses_traversal_order() {
        let (doc, root) = build_tree();
        let first = find_first_by_name(&doc, root, "Wave").unwrap();
        assert_eq!(doc.node(first).unwrap().parent, root);
        assert_eq!(find_first_by_name(&doc, root, "Missing"), None);
        assert_eq!(find_first_by_name(&doc, root, "  "), None);
    }

    #[test]
    fn test_find_by_path() {
        let (doc, root) = build_tree();
        let jump = find_by_path(&doc, root, "Locomotion/Air/Jump").unwrap();
        assert_eq!(doc.node(jump).unwrap().name, "Jump");
        let nested_wave = find_by_path(&doc, root, "/Emotes//Wave").unwrap();
        assert_ne!(Some(nested_wave), find_first_by_name(&doc, root, "Wave"));
        assert_eq!(find_by_path(&doc, root, "Locomotion/Jump"), None);
        assert_eq!(find_by_path(&doc, root, ""), None);
    }

    #[test]
    fn test_graphs_preorder() {
        let (doc, root) = build_tree();
        let names: Vec<String> = graphs(&doc, root)
            .into_iter()
            .map(|g| doc.graph(g).unwrap().name.clone())
            .collect();
        assert_eq!(names, vec!["Base", "Locomotion", "Air", "Emotes"]);
    }

    #[test]
    fn test_structural_hash_tracks_changes() {
        let (mut doc, root) = build_tree();
        let h1 = structural_hash(&doc, root);
        assert_eq!(h1, structural_hash(&doc, root));

        let idle = find_first_by_name(&doc, root, "Idle").unwrap();
        doc.require_node_mut(idle).unwrap().name = "Idle2".to_string();
        let h2 = structural_hash(&doc, root);
        assert_ne!(h1, h2);

        doc.add_node(root, "Extra", Position::default()).unwrap();
        assert_ne!(h2, structural_hash(&doc, root));
    }

    #[test]
    fn test_enumerate_excluding_prefix() {
        let (mut doc, root) = build_tree();
        doc.add_node(root, "Remote_Idle", Position::default()).unwrap();
        let entries = enumerate_excluding_prefix(&doc, root, "Remote_");
        assert_eq!(entries.len(), 6);
        assert_eq!(enumerate_excluding_prefix(&doc, root, "").len(), 7);
    }
}
