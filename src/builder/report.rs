//! Build outcome: what was created, what was skipped, and why.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codes::Collision;
use crate::types::{BehaviorId, GraphId, NodeId, ParameterKind};

/// Severity of a reported condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational hint.
    Info,
    /// Something was skipped.
    Warn,
}

/// Which marker a [`BuildWarning::MissingMarker`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Local start marker.
    LocalStart,
    /// Remote start marker.
    RemoteStart,
}

impl std::fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LocalStart => write!(f, "local start"),
            Self::RemoteStart => write!(f, "remote start"),
        }
    }
}

/// Non-fatal condition found during a build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildWarning {
    /// The assignment map was empty.
    NoAssignments,
    /// No node ended up with a usable code.
    NoClones,
    /// A marker name matched no node.
    MissingMarker {
        /// Which marker.
        marker: MarkerKind,
        /// Name that was searched for.
        name: String,
    },
    /// A code was claimed twice; the later node was skipped.
    CodeCollision(Collision),
    /// The boolean encoding is wide enough that an int parameter is preferable.
    IntSuggested {
        /// Bit width in use.
        bits: usize,
    },
}

impl BuildWarning {
    /// Severity of this condition.
    pub fn severity(&self) -> Severity {
        match self {
            Self::IntSuggested { .. } => Severity::Info,
            _ => Severity::Warn,
        }
    }

    /// Emit this condition as a tracing event.
    pub(crate) fn log(&self, build_id: Uuid) {
        match self {
            Self::NoAssignments => {
                tracing::warn!(%build_id, "BUILD_WARNING: assignment map is empty");
            }
            Self::NoClones => {
                tracing::warn!(%build_id, "BUILD_WARNING: no node has a usable code, nothing cloned");
            }
            Self::MissingMarker { marker, name } => {
                tracing::warn!(%build_id, %marker, name = %name, "BUILD_WARNING: marker not found");
            }
            Self::CodeCollision(c) => {
                tracing::warn!(
                    %build_id,
                    code = c.code,
                    kept = %c.kept,
                    rejected = %c.rejected,
                    "BUILD_WARNING: code collision, later node skipped"
                );
            }
            Self::IntSuggested { bits } => {
                tracing::info!(%build_id, bits, "boolean encoding is wide; an int parameter is suggested");
            }
        }
    }
}

/// One remote clone and the node it mirrors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneRecord {
    /// Sync code.
    pub code: u32,
    /// Original node.
    pub original: NodeId,
    /// Clone node.
    pub clone: NodeId,
    /// Clone name.
    pub name: String,
}

/// A single document edit, in the order it was applied.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    /// Parameter added.
    AddParameter { name: String, kind: ParameterKind },
    /// Node cloned.
    CloneNode { source: NodeId, clone: NodeId, name: String },
    /// Behavior removed from a clone.
    DetachBehavior { node: NodeId, behavior: BehaviorId },
    /// Node moved left to clear the originals.
    ShiftNode { node: NodeId, dx: f32 },
    /// Child graph created.
    CreateGraph { graph: GraphId, name: String },
    /// Node moved into another graph.
    MoveNode { node: NodeId, to: GraphId },
    /// Default entry set.
    SetDefaultEntry { graph: GraphId, node: NodeId },
    /// Transition added.
    AddTransition { source: NodeId, destination: NodeId },
    /// Driver attached.
    CreateDriver { node: NodeId, behavior: BehaviorId },
    /// Driver entry appended.
    AppendDriverEntry { node: NodeId, behavior: BehaviorId, target: String },
}

/// Full account of one build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    /// Correlation id shared with the build's log events.
    pub build_id: Uuid,
    /// Processed layer.
    pub layer_index: usize,
    /// Clones in creation order.
    pub clones: Vec<CloneRecord>,
    /// Rejected code claims.
    pub collisions: Vec<Collision>,
    /// Non-fatal conditions.
    pub warnings: Vec<BuildWarning>,
    /// Boolean width in use, `None` in int mode.
    pub bit_width: Option<usize>,
    /// Transitions added between clones.
    pub pairwise_transitions: usize,
    /// Transitions added from the remote entry.
    pub entry_transitions: usize,
    /// Drivers attached to originals.
    pub drivers_created: usize,
    /// Driver entries appended.
    pub driver_entries_added: usize,
    /// Parameters added to the document.
    pub parameters_added: Vec<String>,
    /// Child graph holding the remote side, if packed.
    pub packed_graph: Option<GraphId>,
    /// Horizontal shift applied to every clone.
    pub layout_shift: f32,
    /// Applied edits.
    pub edits: Vec<Edit>,
    /// Whether the edits were committed to the caller's document.
    pub committed: bool,
    /// When the build finished.
    pub completed_at: DateTime<Utc>,
}

impl BuildReport {
    pub(crate) fn new(build_id: Uuid, layer_index: usize) -> Self {
        Self {
            build_id,
            layer_index,
            clones: Vec::new(),
            collisions: Vec::new(),
            warnings: Vec::new(),
            bit_width: None,
            pairwise_transitions: 0,
            entry_transitions: 0,
            drivers_created: 0,
            driver_entries_added: 0,
            parameters_added: Vec::new(),
            packed_graph: None,
            layout_shift: 0.0,
            edits: Vec::new(),
            committed: false,
            completed_at: Utc::now(),
        }
    }

    /// Record a warning and log it.
    pub(crate) fn warn(&mut self, warning: BuildWarning) {
        warning.log(self.build_id);
        self.warnings.push(warning);
    }

    /// Total transitions added.
    pub fn transitions_added(&self) -> usize {
        self.pairwise_transitions + self.entry_transitions
    }

    /// Warnings at [`Severity::Warn`].
    pub fn warning_count(&self) -> usize {
        self.warnings.iter().filter(|w| w.severity() == Severity::Warn).count()
    }

    /// Clone of `original`, if one was made.
    pub fn clone_of(&self, original: NodeId) -> Option<NodeId> {
        self.clones.iter().find(|c| c.original == original).map(|c| c.clone)
    }
}
