//! Node and state graph types.

use serde::{Deserialize, Serialize};

use super::ids::{BehaviorId, GraphId, NodeId};
use super::transition::Transition;

/// 2-D layout position in editor units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Position {
    /// Create a new position.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Position reflected across the vertical axis.
    pub fn mirrored_x(&self) -> Self {
        Self { x: -self.x, y: self.y }
    }
}

/// A node (animation state) in a state graph.
///
/// Owned by exactly one [`StateGraph`], recorded in `parent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Node identity.
    pub id: NodeId,
    /// Display name.
    pub name: String,
    /// Owning state graph.
    pub parent: GraphId,
    /// Layout position inside the parent graph.
    pub position: Position,
    /// Outgoing transitions, in evaluation order.
    pub transitions: Vec<Transition>,
    /// Attached behavior instances, in execution order.
    pub behaviors: Vec<BehaviorId>,
    /// Motion asset reference played by this node.
    #[serde(default)]
    pub motion: Option<String>,
    /// Playback speed multiplier.
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Free-form tag.
    #[serde(default)]
    pub tag: String,
    /// Whether the node writes default values on entry.
    #[serde(default)]
    pub write_defaults: bool,
}

fn default_speed() -> f32 {
    1.0
}

impl Node {
    /// Create a node with default state properties.
    pub fn new(id: NodeId, name: impl Into<String>, parent: GraphId, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            parent,
            position,
            transitions: Vec::new(),
            behaviors: Vec::new(),
            motion: None,
            speed: default_speed(),
            tag: String::new(),
            write_defaults: false,
        }
    }

    /// Copy every field of `self` onto a new identity, except transitions.
    ///
    /// Behavior ids are copied as-is, so the copy shares behavior instances
    /// with `self`.
    pub fn duplicate_as(&self, id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: self.parent,
            position: self.position,
            transitions: Vec::new(),
            behaviors: self.behaviors.clone(),
            motion: self.motion.clone(),
            speed: self.speed,
            tag: self.tag.clone(),
            write_defaults: self.write_defaults,
        }
    }

    /// Find the first transition leading to `destination`.
    pub fn transition_to(&self, destination: NodeId) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.destination == destination)
    }
}

/// A state graph (state machine): ordered child nodes, nested child graphs
/// and an optional default-entry node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateGraph {
    /// Graph identity.
    pub id: GraphId,
    /// Display name. Forms the path segment for nested nodes.
    pub name: String,
    /// Enclosing graph, `None` for a layer root.
    pub parent: Option<GraphId>,
    /// Layout position inside the parent graph.
    pub position: Position,
    /// Child nodes in order.
    pub nodes: Vec<NodeId>,
    /// Nested child graphs in order.
    pub children: Vec<GraphId>,
    /// Node entered by default.
    pub default_entry: Option<NodeId>,
}

impl StateGraph {
    /// Create an empty graph.
    pub fn new(id: GraphId, name: impl Into<String>, parent: Option<GraphId>, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            parent,
            position,
            nodes: Vec::new(),
            children: Vec::new(),
            default_entry: None,
        }
    }

    /// Whether `node` is a direct child.
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }
}

/// A layer of the document. Each layer optionally owns a root state graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    /// Layer name.
    pub name: String,
    /// Root state graph of the layer.
    pub root: Option<GraphId>,
}
