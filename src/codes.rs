//! Numeric sync code assignment.
//!
//! Every eligible node gets a small non-negative integer code. A code comes
//! from a manual override or, failing that, from the run of decimal digits
//! at the end of the node's name (`"Dance12"` → 12). Codes are first-wins in
//! traversal order: a later node that resolves to a code already taken is a
//! collision and gets no code.
//!
//! Three marker nodes never receive a code: the default entry, the local
//! start marker and the remote start marker.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::document::GraphDocument;
use crate::traversal;
use crate::types::{GraphId, NodeId};

/// Resolved code meaning "not eligible".
pub const NO_CODE: i32 = -1;

fn trailing_digits() -> &'static regex_lite::Regex {
    static RE: OnceLock<regex_lite::Regex> = OnceLock::new();
    RE.get_or_init(|| regex_lite::Regex::new(r"\D(\d+)$").expect("static pattern compiles"))
}

/// Parse the trailing decimal digits of a name.
///
/// Returns [`NO_CODE`] when the name has no digit suffix, consists only of
/// digits, or the suffix does not fit an `i32`.
pub fn parse_trailing_code(name: &str) -> i32 {
    trailing_digits()
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .unwrap_or(NO_CODE)
}

/// Names of the marker nodes, as chosen by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerNames {
    /// Name of the default-entry node. `None` uses the root's default entry.
    pub default_entry: Option<String>,
    /// Name of the local start marker.
    pub local_start: String,
    /// Name of the remote start marker (the remote-entry node).
    pub remote_start: String,
}

impl Default for MarkerNames {
    fn default() -> Self {
        Self {
            default_entry: None,
            local_start: "Local Tree".to_string(),
            remote_start: "Remote Tree".to_string(),
        }
    }
}

/// Marker nodes resolved against a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkerSet {
    /// Default-entry node.
    pub default_entry: Option<NodeId>,
    /// Local start marker.
    pub local_start: Option<NodeId>,
    /// Remote start marker.
    pub remote_start: Option<NodeId>,
}

impl MarkerSet {
    /// Resolve marker names under `root` (first match in traversal order).
    pub fn resolve(doc: &GraphDocument, root: GraphId, names: &MarkerNames) -> Self {
        let default_entry = match names.default_entry.as_deref() {
            Some(name) => traversal::find_first_by_name(doc, root, name),
            None => doc.graph(root).and_then(|g| g.default_entry),
        };
        Self {
            default_entry,
            local_start: traversal::find_first_by_name(doc, root, &names.local_start),
            remote_start: traversal::find_first_by_name(doc, root, &names.remote_start),
        }
    }

    /// Whether `node` is one of the markers.
    pub fn contains(&self, node: NodeId) -> bool {
        [self.default_entry, self.local_start, self.remote_start].contains(&Some(node))
    }
}

/// Resolve one node's code: markers are excluded, then manual overrides win,
/// then the trailing digits of the name.
pub fn resolve_code(
    doc: &GraphDocument,
    node: NodeId,
    overrides: &BTreeMap<NodeId, i32>,
    markers: &MarkerSet,
) -> i32 {
    if markers.contains(node) {
        return NO_CODE;
    }
    if let Some(code) = overrides.get(&node) {
        return (*code).max(NO_CODE);
    }
    doc.node(node)
        .map(|n| parse_trailing_code(&n.name))
        .unwrap_or(NO_CODE)
}

/// A rejected code claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision {
    /// Contested code.
    pub code: u32,
    /// Node that claimed the code first and keeps it.
    pub kept: NodeId,
    /// Node whose claim was rejected.
    pub rejected: NodeId,
}

/// Outcome of offering a code to a [`CodeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// Code was negative; node is not eligible.
    Ineligible,
    /// Code assigned.
    Assigned(u32),
    /// Code already taken.
    Collided(Collision),
}

/// First-wins map from code to node.
#[derive(Debug, Clone, Default)]
pub struct CodeTable {
    entries: Vec<(u32, NodeId)>,
    by_code: BTreeMap<u32, NodeId>,
    collisions: Vec<Collision>,
}

impl CodeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer `code` for `node`. Negative codes are ignored.
    pub fn offer(&mut self, node: NodeId, code: i32) -> Claim {
        let Ok(code) = u32::try_from(code) else {
            return Claim::Ineligible;
        };
        if let Some(kept) = self.by_code.get(&code) {
            let collision = Collision { code, kept: *kept, rejected: node };
            self.collisions.push(collision);
            return Claim::Collided(collision);
        }
        self.by_code.insert(code, node);
        self.entries.push((code, node));
        Claim::Assigned(code)
    }

    /// Build a table from a caller-supplied assignment map.
    ///
    /// Nodes are visited in traversal order under `root`; markers and nodes
    /// absent from `assigned` are skipped.
    pub fn from_assigned(
        doc: &GraphDocument,
        root: GraphId,
        assigned: &BTreeMap<NodeId, i32>,
        markers: &MarkerSet,
    ) -> Self {
        let mut table = Self::new();
        traversal::visit(doc, root, |_, _, node| {
            if markers.contains(node.id) {
                return;
            }
            if let Some(code) = assigned.get(&node.id) {
                table.offer(node.id, *code);
            }
        });
        table
    }

    /// Assigned `(code, node)` pairs in claim order.
    pub fn entries(&self) -> &[(u32, NodeId)] {
        &self.entries
    }

    /// Code assigned to `node`.
    pub fn code_of(&self, node: NodeId) -> Option<u32> {
        self.entries.iter().find(|(_, n)| *n == node).map(|(c, _)| *c)
    }

    /// Node holding `code`.
    pub fn node_for(&self, code: u32) -> Option<NodeId> {
        self.by_code.get(&code).copied()
    }

    /// Rejected claims in the order they happened.
    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    /// Largest assigned code.
    pub fn max_code(&self) -> Option<u32> {
        self.by_code.keys().next_back().copied()
    }

    /// Number of assigned codes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no code is assigned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of resolving codes for a whole tree.
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    /// Every non-negative resolved code, collided ones included. This is the
    /// map handed to the builder.
    pub codes: BTreeMap<NodeId, i32>,
    /// First-wins view of `codes`.
    pub table: CodeTable,
}

/// A collision with both node names, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCollision {
    /// Contested code.
    pub code: u32,
    /// Name of the node that kept the code.
    pub kept: String,
    /// Name of the node that was skipped.
    pub rejected: String,
}

impl Assignment {
    /// Collisions with node names resolved against `doc`.
    pub fn describe_collisions(&self, doc: &GraphDocument) -> Vec<NamedCollision> {
        let name = |id: NodeId| doc.node(id).map(|n| n.name.clone()).unwrap_or_else(|| id.to_string());
        self.table
            .collisions()
            .iter()
            .map(|c| NamedCollision { code: c.code, kept: name(c.kept), rejected: name(c.rejected) })
            .collect()
    }
}

/// Resolve codes for every node under `root`.
///
/// Nodes whose name starts with `exclude_prefix` (typically the clone
/// prefix of an earlier build) are skipped; an empty prefix skips nothing.
pub fn resolve_assignments(
    doc: &GraphDocument,
    root: GraphId,
    overrides: &BTreeMap<NodeId, i32>,
    markers: &MarkerSet,
    exclude_prefix: &str,
) -> Assignment {
    let mut assignment = Assignment::default();
    for entry in traversal::enumerate_excluding_prefix(doc, root, exclude_prefix) {
        let code = resolve_code(doc, entry.node, overrides, markers);
        if code < 0 {
            continue;
        }
        assignment.codes.insert(entry.node, code);
        if let Claim::Collided(c) = assignment.table.offer(entry.node, code) {
            tracing::debug!(code = c.code, kept = %c.kept, rejected = %c.rejected, "code collision");
        }
    }
    assignment
}
