//! Arena-backed graph document.
//!
//! A [`GraphDocument`] owns every node, state graph and behavior instance in
//! id-keyed arenas. Ownership is recorded explicitly: each node carries its
//! parent graph id and each graph lists its child node and child graph ids.
//! Nothing holds a reference into another entity, so a whole document can be
//! cloned into a draft, edited, and swapped back in one assignment.
//!
//! Uses BTreeMap for deterministic iteration order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::types::{
    Behavior, BehaviorId, Driver, GraphId, Layer, Node, NodeId, Parameter, ParameterKind,
    Position, StateGraph, Transition,
};

/// Error type for document operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentError {
    /// Node id does not exist.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
    /// Graph id does not exist.
    #[error("Graph not found: {0}")]
    GraphNotFound(GraphId),
    /// Behavior id does not exist.
    #[error("Behavior not found: {0}")]
    BehaviorNotFound(BehaviorId),
    /// Layer index is out of range.
    #[error("Layer index {index} is out of range (document has {count} layers)")]
    LayerOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of layers.
        count: usize,
    },
    /// Layer exists but has no root state graph.
    #[error("Layer {0} has no state graph")]
    MissingStateGraph(usize),
    /// A parameter with the same name already exists with another kind.
    #[error("Parameter '{name}' already exists as {existing}, requested {requested}")]
    ParameterKindConflict {
        /// Parameter name.
        name: String,
        /// Kind already in the document.
        existing: ParameterKind,
        /// Kind that was requested.
        requested: ParameterKind,
    },
    /// Node is not a direct child of the graph.
    #[error("{node} is not a child of {graph}")]
    NotAChild {
        /// Node id.
        node: NodeId,
        /// Graph id.
        graph: GraphId,
    },
    /// A loaded document breaks an ownership or reference invariant.
    #[error("Malformed document: {0}")]
    Malformed(String),
}

/// A behavior graph document: layers, parameters and the entity arenas.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "DocumentRepr", into = "DocumentRepr")]
pub struct GraphDocument {
    /// Document name.
    pub name: String,
    layers: Vec<Layer>,
    parameters: Vec<Parameter>,
    graphs: BTreeMap<GraphId, StateGraph>,
    nodes: BTreeMap<NodeId, Node>,
    behaviors: BTreeMap<BehaviorId, Behavior>,
    next_id: u64,
}

impl GraphDocument {
    /// Create an empty document.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            next_id: 1,
            ..Self::default()
        }
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }

    // ─────────────────────────────────────────────────────────────────────
    // Layers
    // ─────────────────────────────────────────────────────────────────────

    /// Add a layer with a fresh root graph named after the layer.
    pub fn add_layer(&mut self, name: impl Into<String>) -> (usize, GraphId) {
        let name = name.into();
        let root = GraphId::new(self.allocate());
        self.graphs.insert(root, StateGraph::new(root, name.clone(), None, Position::default()));
        self.layers.push(Layer { name, root: Some(root) });
        (self.layers.len() - 1, root)
    }

    /// Add a layer without a state graph.
    pub fn add_empty_layer(&mut self, name: impl Into<String>) -> usize {
        self.layers.push(Layer { name: name.into(), root: None });
        self.layers.len() - 1
    }

    /// All layers.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Root graph of a layer, bounds-checked.
    pub fn layer_root(&self, index: usize) -> Result<GraphId, DocumentError> {
        let layer = self.layers.get(index).ok_or(DocumentError::LayerOutOfRange {
            index,
            count: self.layers.len(),
        })?;
        let root = layer.root.ok_or(DocumentError::MissingStateGraph(index))?;
        if !self.graphs.contains_key(&root) {
            return Err(DocumentError::MissingStateGraph(index));
        }
        Ok(root)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Graphs
    // ─────────────────────────────────────────────────────────────────────

    /// Get a graph.
    pub fn graph(&self, id: GraphId) -> Option<&StateGraph> {
        self.graphs.get(&id)
    }

    /// Get a graph or fail.
    pub fn require_graph(&self, id: GraphId) -> Result<&StateGraph, DocumentError> {
        self.graphs.get(&id).ok_or(DocumentError::GraphNotFound(id))
    }

    fn require_graph_mut(&mut self, id: GraphId) -> Result<&mut StateGraph, DocumentError> {
        self.graphs.get_mut(&id).ok_or(DocumentError::GraphNotFound(id))
    }

    /// Add a nested graph under `parent`.
    pub fn add_graph(
        &mut self,
        parent: GraphId,
        name: impl Into<String>,
        position: Position,
    ) -> Result<GraphId, DocumentError> {
        self.require_graph(parent)?;
        let id = GraphId::new(self.allocate());
        self.graphs.insert(id, StateGraph::new(id, name, Some(parent), position));
        self.require_graph_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Set or clear the default-entry node of a graph.
    ///
    /// The node must be a direct child of the graph.
    pub fn set_default_entry(&mut self, graph: GraphId, node: Option<NodeId>) -> Result<(), DocumentError> {
        let target = self.require_graph(graph)?;
        if let Some(node) = node {
            if !target.contains_node(node) {
                return Err(DocumentError::NotAChild { node, graph });
            }
        }
        self.require_graph_mut(graph)?.default_entry = node;
        Ok(())
    }

    /// Number of graphs in the document.
    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Nodes
    // ─────────────────────────────────────────────────────────────────────

    /// Get a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get a node or fail.
    pub fn require_node(&self, id: NodeId) -> Result<&Node, DocumentError> {
        self.nodes.get(&id).ok_or(DocumentError::NodeNotFound(id))
    }

    /// Get a node mutably or fail.
    pub fn require_node_mut(&mut self, id: NodeId) -> Result<&mut Node, DocumentError> {
        self.nodes.get_mut(&id).ok_or(DocumentError::NodeNotFound(id))
    }

    /// Add a node to `graph`.
    pub fn add_node(
        &mut self,
        graph: GraphId,
        name: impl Into<String>,
        position: Position,
    ) -> Result<NodeId, DocumentError> {
        self.require_graph(graph)?;
        let id = NodeId::new(self.allocate());
        self.nodes.insert(id, Node::new(id, name, graph, position));
        self.require_graph_mut(graph)?.nodes.push(id);
        Ok(id)
    }

    /// Duplicate `source` into its own parent graph under `name`.
    ///
    /// The copy has no transitions and shares the source's behavior instances.
    pub fn duplicate_node(&mut self, source: NodeId, name: impl Into<String>) -> Result<NodeId, DocumentError> {
        let id = NodeId::new(self.allocate());
        let copy = self.require_node(source)?.duplicate_as(id, name);
        let parent = copy.parent;
        self.require_graph(parent)?;
        self.nodes.insert(id, copy);
        self.require_graph_mut(parent)?.nodes.push(id);
        Ok(id)
    }

    /// Whether a direct child of `graph` is named `name`.
    pub fn has_node_named(&self, graph: GraphId, name: &str) -> bool {
        self.graphs.get(&graph).is_some_and(|g| {
            g.nodes
                .iter()
                .filter_map(|id| self.nodes.get(id))
                .any(|n| n.name == name)
        })
    }

    /// Move a node into another graph, keeping its position.
    pub fn move_node(&mut self, node: NodeId, to: GraphId) -> Result<(), DocumentError> {
        self.require_graph(to)?;
        let from = self.require_node(node)?.parent;
        if from == to {
            return Ok(());
        }

        let old = self.require_graph_mut(from)?;
        old.nodes.retain(|n| *n != node);
        if old.default_entry == Some(node) {
            old.default_entry = None;
        }

        self.require_graph_mut(to)?.nodes.push(node);
        self.require_node_mut(node)?.parent = to;
        Ok(())
    }

    /// Remove a node, any transitions pointing at it, and any default-entry
    /// reference to it.
    ///
    /// Behavior instances stay in the arena; other nodes may share them.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, DocumentError> {
        let node = self.nodes.remove(&id).ok_or(DocumentError::NodeNotFound(id))?;

        if let Some(parent) = self.graphs.get_mut(&node.parent) {
            parent.nodes.retain(|n| *n != id);
            if parent.default_entry == Some(id) {
                parent.default_entry = None;
            }
        }

        for other in self.nodes.values_mut() {
            other.transitions.retain(|t| t.destination != id);
        }

        Ok(node)
    }

    /// Number of nodes in the document.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over all nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────

    /// Append a transition to its source node.
    pub fn add_transition(&mut self, transition: Transition) -> Result<(), DocumentError> {
        self.require_node(transition.destination)?;
        self.require_node_mut(transition.source)?.transitions.push(transition);
        Ok(())
    }

    /// Total number of transitions in the document.
    pub fn transition_count(&self) -> usize {
        self.nodes.values().map(|n| n.transitions.len()).sum()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Behaviors
    // ─────────────────────────────────────────────────────────────────────

    /// Get a behavior instance.
    pub fn behavior(&self, id: BehaviorId) -> Option<&Behavior> {
        self.behaviors.get(&id)
    }

    /// Get a behavior instance mutably or fail.
    pub fn require_behavior_mut(&mut self, id: BehaviorId) -> Result<&mut Behavior, DocumentError> {
        self.behaviors.get_mut(&id).ok_or(DocumentError::BehaviorNotFound(id))
    }

    /// Create an empty parameter driver and attach it to `node`.
    pub fn attach_driver(&mut self, node: NodeId) -> Result<BehaviorId, DocumentError> {
        self.require_node(node)?;
        let id = BehaviorId::new(self.allocate());
        self.behaviors.insert(id, Behavior::ParameterDriver { id, driver: Driver::new() });
        self.require_node_mut(node)?.behaviors.push(id);
        Ok(id)
    }

    /// Create an opaque host behavior and attach it to `node`.
    pub fn attach_opaque(
        &mut self,
        node: NodeId,
        type_name: impl Into<String>,
        data: serde_json::Value,
    ) -> Result<BehaviorId, DocumentError> {
        self.require_node(node)?;
        let id = BehaviorId::new(self.allocate());
        self.behaviors.insert(id, Behavior::Opaque { id, type_name: type_name.into(), data });
        self.require_node_mut(node)?.behaviors.push(id);
        Ok(id)
    }

    /// Detach a behavior from a node without destroying the instance.
    ///
    /// Returns `true` if the node referenced it.
    pub fn detach_behavior(&mut self, node: NodeId, behavior: BehaviorId) -> Result<bool, DocumentError> {
        let node = self.require_node_mut(node)?;
        let before = node.behaviors.len();
        node.behaviors.retain(|b| *b != behavior);
        Ok(node.behaviors.len() != before)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Parameters
    // ─────────────────────────────────────────────────────────────────────

    /// All parameters in declaration order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Find a parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Parameters of one kind, in declaration order.
    pub fn parameters_of_kind(&self, kind: ParameterKind) -> Vec<&Parameter> {
        self.parameters.iter().filter(|p| p.kind == kind).collect()
    }

    /// Check that `name` can hold a `kind` parameter without adding it.
    pub fn check_parameter(&self, name: &str, kind: ParameterKind) -> Result<(), DocumentError> {
        match self.parameter(name) {
            Some(existing) if existing.kind != kind => Err(DocumentError::ParameterKindConflict {
                name: name.to_string(),
                existing: existing.kind,
                requested: kind,
            }),
            _ => Ok(()),
        }
    }

    /// Add the parameter if missing. Returns `true` if it was added.
    pub fn ensure_parameter(&mut self, name: &str, kind: ParameterKind) -> Result<bool, DocumentError> {
        self.check_parameter(name, kind)?;
        if self.parameter(name).is_some() {
            return Ok(false);
        }
        self.parameters.push(Parameter::new(name, kind));
        Ok(true)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Consistency
    // ─────────────────────────────────────────────────────────────────────

    /// Check the ownership and reference invariants every edit maintains.
    ///
    /// Child graphs form a forest rooted at parentless graphs, every node is
    /// listed by exactly the graph named in its `parent`, default entries
    /// are children of their own graph, and every referenced id exists.
    pub fn validate(&self) -> Result<(), DocumentError> {
        let malformed = |msg: String| DocumentError::Malformed(msg);

        let mut graph_owner: BTreeMap<GraphId, GraphId> = BTreeMap::new();
        for graph in self.graphs.values() {
            for child in &graph.children {
                let entry = self
                    .graphs
                    .get(child)
                    .ok_or_else(|| malformed(format!("{} lists missing child {}", graph.id, child)))?;
                if entry.parent != Some(graph.id) {
                    return Err(malformed(format!("{} is listed by {} but names another parent", child, graph.id)));
                }
                if graph_owner.insert(*child, graph.id).is_some() {
                    return Err(malformed(format!("{} is listed more than once", child)));
                }
            }
        }
        for graph in self.graphs.values() {
            if graph.parent.is_some() && !graph_owner.contains_key(&graph.id) {
                return Err(malformed(format!("{} is not listed by its parent", graph.id)));
            }
        }

        // With one owner per graph, anything unreachable from a root sits on a cycle.
        let mut stack: Vec<GraphId> = self.graphs.values().filter(|g| g.parent.is_none()).map(|g| g.id).collect();
        let mut reached = 0usize;
        while let Some(id) = stack.pop() {
            reached += 1;
            if let Some(graph) = self.graphs.get(&id) {
                stack.extend(graph.children.iter().copied());
            }
        }
        if reached != self.graphs.len() {
            return Err(malformed(format!(
                "{} graphs are nested in a cycle",
                self.graphs.len() - reached
            )));
        }

        let mut node_owner: BTreeMap<NodeId, GraphId> = BTreeMap::new();
        for graph in self.graphs.values() {
            for id in &graph.nodes {
                let node = self
                    .nodes
                    .get(id)
                    .ok_or_else(|| malformed(format!("{} lists missing {}", graph.id, id)))?;
                if node.parent != graph.id {
                    return Err(malformed(format!("{} is listed by {} but its parent is {}", id, graph.id, node.parent)));
                }
                if node_owner.insert(*id, graph.id).is_some() {
                    return Err(malformed(format!("{} is listed more than once", id)));
                }
            }
            if let Some(entry) = graph.default_entry {
                if !graph.contains_node(entry) {
                    return Err(DocumentError::NotAChild { node: entry, graph: graph.id });
                }
            }
        }

        for node in self.nodes.values() {
            if !node_owner.contains_key(&node.id) {
                return Err(malformed(format!("{} is not listed by its parent {}", node.id, node.parent)));
            }
            if let Some(missing) = node.behaviors.iter().find(|b| !self.behaviors.contains_key(*b)) {
                return Err(DocumentError::BehaviorNotFound(*missing));
            }
            for transition in &node.transitions {
                if transition.source != node.id {
                    return Err(malformed(format!("{} owns a transition from {}", node.id, transition.source)));
                }
                if !self.nodes.contains_key(&transition.destination) {
                    return Err(DocumentError::NodeNotFound(transition.destination));
                }
            }
        }

        for (index, layer) in self.layers.iter().enumerate() {
            let Some(root) = layer.root else { continue };
            let graph = self.graphs.get(&root).ok_or(DocumentError::GraphNotFound(root))?;
            if graph.parent.is_some() {
                return Err(malformed(format!("layer {} root {} is nested in another graph", index, root)));
            }
        }

        Ok(())
    }
}

/// Serialized form: arenas as ordered lists.
#[derive(Serialize, Deserialize)]
struct DocumentRepr {
    name: String,
    #[serde(default)]
    layers: Vec<Layer>,
    #[serde(default)]
    parameters: Vec<Parameter>,
    #[serde(default)]
    graphs: Vec<StateGraph>,
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    behaviors: Vec<Behavior>,
}

/// Key `items` by id, rejecting repeated ids.
fn arena<K, V>(items: Vec<V>, key: impl Fn(&V) -> K) -> Result<BTreeMap<K, V>, DocumentError>
where
    K: Ord + Copy + fmt::Display,
{
    let mut map = BTreeMap::new();
    for item in items {
        let id = key(&item);
        if map.insert(id, item).is_some() {
            return Err(DocumentError::Malformed(format!("{} appears more than once", id)));
        }
    }
    Ok(map)
}

impl TryFrom<DocumentRepr> for GraphDocument {
    type Error = DocumentError;

    fn try_from(repr: DocumentRepr) -> Result<Self, Self::Error> {
        let graphs = arena(repr.graphs, |g: &StateGraph| g.id)?;
        let nodes = arena(repr.nodes, |n: &Node| n.id)?;
        let behaviors = arena(repr.behaviors, Behavior::id)?;

        let max_id = graphs
            .keys()
            .map(GraphId::as_u64)
            .chain(nodes.keys().map(NodeId::as_u64))
            .chain(behaviors.keys().map(BehaviorId::as_u64))
            .max()
            .unwrap_or(0);

        let doc = Self {
            name: repr.name,
            layers: repr.layers,
            parameters: repr.parameters,
            graphs,
            nodes,
            behaviors,
            next_id: max_id + 1,
        };
        doc.validate()?;
        Ok(doc)
    }
}

impl From<GraphDocument> for DocumentRepr {
    fn from(doc: GraphDocument) -> Self {
        Self {
            name: doc.name,
            layers: doc.layers,
            parameters: doc.parameters,
            graphs: doc.graphs.into_values().collect(),
            nodes: doc.nodes.into_values().collect(),
            behaviors: doc.behaviors.into_values().collect(),
        }
    }
}
