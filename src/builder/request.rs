//! Build request and options.
//!
//! Everything here is plain data supplied by the configuration layer. All
//! types deserialize from JSON with defaults for omitted fields.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::codes::MarkerNames;
use crate::types::NodeId;

/// Default prefix for clone names.
pub const DEFAULT_CLONE_PREFIX: &str = "Remote_";

/// Default name of the packed child graph.
pub const DEFAULT_PACK_NAME: &str = "Remote Sync";

/// Default shared int parameter.
pub const DEFAULT_SYNC_PARAMETER: &str = "SyncState";

/// Width of the boolean encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitWidth {
    /// One parameter per bit, least significant first.
    Explicit(Vec<String>),
    /// Smallest width that holds every code in use; parameters are named
    /// `{prefix}0`, `{prefix}1`, ...
    Minimal {
        /// Parameter name prefix.
        prefix: String,
    },
}

/// How codes are carried between actors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncMode {
    /// One shared int parameter holds the code.
    Int {
        /// Int parameter name.
        parameter: String,
    },
    /// The code is spread over boolean parameters.
    Boolean {
        /// Bit width and parameter names.
        bits: BitWidth,
    },
}

impl Default for SyncMode {
    fn default() -> Self {
        Self::Int { parameter: DEFAULT_SYNC_PARAMETER.to_string() }
    }
}

/// What to do with soft conditions.
///
/// The lenient default reports collisions and unresolved start markers as
/// warnings and keeps building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictPolicy {
    /// Fail the build on any code collision.
    pub abort_on_collision: bool,
    /// Fail the build when the local or remote start marker is not found.
    pub abort_on_missing_marker: bool,
}

impl ConflictPolicy {
    /// Policy that fails on every soft condition it covers.
    pub fn strict() -> Self {
        Self { abort_on_collision: true, abort_on_missing_marker: true }
    }
}

/// Build flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Prefix for clone names. May be empty.
    pub prefix: String,
    /// Detach driver behaviors from clones.
    pub remove_drivers_from_remote: bool,
    /// Attach code-emitting drivers to the original nodes.
    pub add_driver_for_local_sync_state: bool,
    /// Move the remote-entry node and all clones into a new child graph.
    pub pack_into_subgraph: bool,
    /// Copy timing from the matching transition between originals.
    pub match_transition_times: bool,
    /// Name of the packed child graph.
    pub pack_name: String,
    /// Soft-condition policy.
    pub policy: ConflictPolicy,
    /// Build and report without committing.
    pub dry_run: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_CLONE_PREFIX.to_string(),
            remove_drivers_from_remote: false,
            add_driver_for_local_sync_state: false,
            pack_into_subgraph: false,
            match_transition_times: false,
            pack_name: DEFAULT_PACK_NAME.to_string(),
            policy: ConflictPolicy::default(),
            dry_run: false,
        }
    }
}

/// A complete build request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncRequest {
    /// Layer whose root graph is processed.
    pub layer_index: usize,
    /// Node → code map. Negative codes mean "not eligible".
    #[serde(with = "code_pairs")]
    pub assigned_codes: BTreeMap<NodeId, i32>,
    /// Marker node names.
    pub markers: MarkerNames,
    /// Encoding mode.
    pub mode: SyncMode,
    /// Flags.
    pub options: BuildOptions,
}

impl SyncRequest {
    /// Int-mode request with default options.
    pub fn int(layer_index: usize, parameter: impl Into<String>, assigned_codes: BTreeMap<NodeId, i32>) -> Self {
        Self {
            layer_index,
            assigned_codes,
            mode: SyncMode::Int { parameter: parameter.into() },
            ..Self::default()
        }
    }

    /// Boolean-mode request with explicit parameters and default options.
    pub fn boolean(layer_index: usize, parameters: Vec<String>, assigned_codes: BTreeMap<NodeId, i32>) -> Self {
        Self {
            layer_index,
            assigned_codes,
            mode: SyncMode::Boolean { bits: BitWidth::Explicit(parameters) },
            ..Self::default()
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the marker names.
    pub fn with_markers(mut self, markers: MarkerNames) -> Self {
        self.markers = markers;
        self
    }
}

/// Serializes the code map as `[[node, code], ...]`.
mod code_pairs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    use crate::types::NodeId;

    pub fn serialize<S: Serializer>(map: &BTreeMap<NodeId, i32>, s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(map.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<NodeId, i32>, D::Error> {
        let pairs: Vec<(NodeId, i32)> = Vec::deserialize(d)?;
        Ok(pairs.into_iter().collect())
    }
}
