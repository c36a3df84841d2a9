//! Remote sync subgraph builder.
//!
//! Given a layer and a node → code assignment, the builder generates a
//! mirrored copy of the coded nodes that an observer can drive from a few
//! synchronized parameters.
//!
//! ## Algorithm
//!
//! 1. Validate the layer and resolve the marker nodes
//! 2. Build a first-wins code table in traversal order
//! 3. Fix the encoding (int parameter or boolean bits) and check every code fits
//! 4. On a draft copy of the document:
//!    - Add missing sync parameters
//!    - Clone each coded node with a mirrored X, then shift the clones clear
//!      of the originals
//!    - Optionally pack the remote entry and the clones into a child graph
//!    - Connect every ordered pair of clones, guarded by the destination code
//!    - Fan in from the remote entry to every clone
//!    - Optionally attach code-emitting drivers to the originals
//! 5. Swap the draft in (skipped for dry runs)
//!
//! Nothing is written to the caller's document unless every step succeeds.

mod clone;
mod drivers;
mod pack;
pub mod report;
pub mod request;
mod scheme;
mod wiring;

use uuid::Uuid;

use crate::codec;
use crate::codes::{CodeTable, MarkerSet};
use crate::document::{DocumentError, GraphDocument};
use crate::sink::DriverSink;
use crate::traversal;
use crate::types::{GraphId, ParameterKind};

use scheme::GuardScheme;

pub use clone::LAYOUT_GAP;
pub use pack::PACK_POSITION;
pub use report::{BuildReport, BuildWarning, CloneRecord, Edit, MarkerKind, Severity};
pub use request::{BitWidth, BuildOptions, ConflictPolicy, SyncMode, SyncRequest};

/// Error type for builds.
///
/// Every variant means the caller's document was left untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// Layer index is out of range.
    #[error("Layer index {index} is out of range (document has {count} layers)")]
    LayerOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of layers.
        count: usize,
    },
    /// Layer has no root state graph.
    #[error("Layer {0} has no state graph")]
    MissingStateGraph(usize),
    /// A sync parameter name is blank.
    #[error("Sync parameter name is empty")]
    EmptyParameterName,
    /// The same boolean parameter is listed twice.
    #[error("Sync parameter '{0}' is listed more than once")]
    DuplicateParameterName(String),
    /// A code does not fit the configured boolean width.
    #[error("Code {code} needs {needed} bits but only {available} boolean parameters are configured")]
    CodeNotRepresentable {
        /// Offending code.
        code: u32,
        /// Bits required.
        needed: usize,
        /// Bits configured.
        available: usize,
    },
    /// A sync parameter exists with another kind.
    #[error("Parameter '{name}' already exists as {existing}, requested {requested}")]
    ParameterKindConflict {
        /// Parameter name.
        name: String,
        /// Kind already in the document.
        existing: ParameterKind,
        /// Kind the encoding needs.
        requested: ParameterKind,
    },
    /// Code collision under a strict policy.
    #[error("Code {code} is claimed by both {kept} and {rejected}")]
    CodeCollision {
        /// Contested code.
        code: u32,
        /// First claimant.
        kept: crate::types::NodeId,
        /// Second claimant.
        rejected: crate::types::NodeId,
    },
    /// Missing start marker under a strict policy.
    #[error("The {marker} marker '{name}' was not found")]
    MissingMarker {
        /// Which marker.
        marker: MarkerKind,
        /// Name searched for.
        name: String,
    },
    /// A document edit failed.
    #[error("Document error: {0}")]
    Document(DocumentError),
    /// The driver sink failed.
    #[error("Driver sink error: {0}")]
    Sink(String),
}

impl BuildError {
    /// Create a sink error from any error type.
    pub fn from_sink<E: std::error::Error>(e: E) -> Self {
        Self::Sink(e.to_string())
    }

    /// Whether the error was raised before any edit was attempted.
    pub fn is_precondition(&self) -> bool {
        !matches!(self, Self::Document(_) | Self::Sink(_))
    }
}

impl From<DocumentError> for BuildError {
    fn from(e: DocumentError) -> Self {
        match e {
            DocumentError::LayerOutOfRange { index, count } => Self::LayerOutOfRange { index, count },
            DocumentError::MissingStateGraph(index) => Self::MissingStateGraph(index),
            DocumentError::ParameterKindConflict { name, existing, requested } => {
                Self::ParameterKindConflict { name, existing, requested }
            }
            other => Self::Document(other),
        }
    }
}

/// Everything fixed before the first edit.
struct Plan {
    root: GraphId,
    markers: MarkerSet,
    table: CodeTable,
    scheme: GuardScheme,
    min_original_x: Option<f32>,
}

/// Remote sync subgraph builder.
///
/// Holds the driver sink; one builder can run any number of builds.
#[derive(Debug, Default)]
pub struct SyncBuilder<S: DriverSink> {
    sink: S,
}

impl<S: DriverSink> SyncBuilder<S> {
    /// Create a builder over `sink`.
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Run one build against `doc`.
    ///
    /// On error the document is unchanged. With `dry_run` set the report
    /// describes every edit but the document is unchanged as well.
    pub fn build(&mut self, doc: &mut GraphDocument, request: &SyncRequest) -> Result<BuildReport, BuildError> {
        let build_id = Uuid::new_v4();
        let mut report = BuildReport::new(build_id, request.layer_index);

        let plan = match prepare(doc, request, &mut report) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::error!(
                    %build_id,
                    layer = request.layer_index,
                    error = %e,
                    "BUILD_REJECTED: precondition failed, no edits attempted"
                );
                return Err(e);
            }
        };

        let mut draft = doc.clone();
        if let Err(e) = self.apply(&mut draft, &plan, request, &mut report) {
            tracing::error!(
                %build_id,
                layer = request.layer_index,
                error = %e,
                edits = report.edits.len(),
                "BUILD_FAILED: draft discarded, document unchanged"
            );
            return Err(e);
        }

        if request.options.dry_run {
            tracing::info!(%build_id, edits = report.edits.len(), "dry run, draft discarded");
        } else {
            *doc = draft;
            report.committed = true;
        }
        report.completed_at = chrono::Utc::now();

        tracing::info!(
            %build_id,
            layer = request.layer_index,
            clones = report.clones.len(),
            transitions = report.transitions_added(),
            driver_entries = report.driver_entries_added,
            warnings = report.warning_count(),
            committed = report.committed,
            "sync build completed"
        );
        Ok(report)
    }

    fn apply(
        &mut self,
        draft: &mut GraphDocument,
        plan: &Plan,
        request: &SyncRequest,
        report: &mut BuildReport,
    ) -> Result<(), BuildError> {
        let options = &request.options;

        for (name, kind) in plan.scheme.parameters() {
            if draft.ensure_parameter(name, kind)? {
                report.parameters_added.push(name.to_string());
                report.edits.push(Edit::AddParameter { name: name.to_string(), kind });
            }
        }

        let (clones, max_clone_x) = clone::create_clones(
            draft,
            &self.sink,
            plan.table.entries(),
            &options.prefix,
            options.remove_drivers_from_remote,
            report,
        )?;
        let shift = clone::resolve_overlap(draft, &clones, plan.min_original_x, max_clone_x, report)?;
        report.layout_shift = shift;
        if clones.is_empty() {
            report.warn(BuildWarning::NoClones);
        }

        if options.pack_into_subgraph {
            let packed = pack::pack(
                draft,
                plan.root,
                &options.pack_name,
                plan.markers.remote_start,
                &clones,
                report,
            )?;
            report.packed_graph = Some(packed);
        }

        let pairwise =
            wiring::connect_clones(draft, &clones, &plan.scheme, options.match_transition_times, report)?;
        report.pairwise_transitions = pairwise;
        if let Some(entry) = plan.markers.remote_start {
            let fan_in = wiring::connect_entry(draft, entry, &clones, &plan.scheme, report)?;
            report.entry_transitions = fan_in;
        }

        if options.add_driver_for_local_sync_state {
            drivers::attach_code_drivers(draft, &mut self.sink, plan.table.entries(), &plan.scheme, report)?;
        }

        report.clones = clones;
        Ok(())
    }
}

/// Check preconditions and fix everything the edit steps need.
fn prepare(doc: &GraphDocument, request: &SyncRequest, report: &mut BuildReport) -> Result<Plan, BuildError> {
    let root = doc.layer_root(request.layer_index)?;
    let policy = request.options.policy;

    if request.assigned_codes.is_empty() {
        report.warn(BuildWarning::NoAssignments);
    }

    let markers = MarkerSet::resolve(doc, root, &request.markers);
    let starts = [
        (MarkerKind::LocalStart, markers.local_start, &request.markers.local_start),
        (MarkerKind::RemoteStart, markers.remote_start, &request.markers.remote_start),
    ];
    for (marker, found, name) in starts {
        if found.is_some() {
            continue;
        }
        if policy.abort_on_missing_marker {
            return Err(BuildError::MissingMarker { marker, name: name.clone() });
        }
        report.warn(BuildWarning::MissingMarker { marker, name: name.clone() });
    }

    let table = CodeTable::from_assigned(doc, root, &request.assigned_codes, &markers);
    for c in table.collisions() {
        if policy.abort_on_collision {
            return Err(BuildError::CodeCollision { code: c.code, kept: c.kept, rejected: c.rejected });
        }
        report.collisions.push(*c);
        report.warn(BuildWarning::CodeCollision(*c));
    }

    let scheme = resolve_scheme(&request.mode, &table);
    validate_scheme(doc, &scheme, &table)?;
    if let Some(bits) = scheme.bit_width() {
        report.bit_width = Some(bits);
        if codec::should_suggest_int(bits) {
            report.warn(BuildWarning::IntSuggested { bits });
        }
    }

    let originals = traversal::enumerate(doc, root);
    let min_original_x =
        clone::min_x(originals.iter().filter_map(|e| doc.node(e.node)).map(|n| &n.position));

    Ok(Plan { root, markers, table, scheme, min_original_x })
}

fn resolve_scheme(mode: &SyncMode, table: &CodeTable) -> GuardScheme {
    match mode {
        SyncMode::Int { parameter } => GuardScheme::Int { parameter: parameter.clone() },
        SyncMode::Boolean { bits: BitWidth::Explicit(parameters) } => {
            GuardScheme::Bits { parameters: parameters.clone() }
        }
        SyncMode::Boolean { bits: BitWidth::Minimal { prefix } } => {
            let width = table
                .max_code()
                .map_or(0, codec::bits_for_value)
                .max(codec::minimal_bits(table.len()));
            GuardScheme::Bits { parameters: (0..width).map(|i| format!("{prefix}{i}")).collect() }
        }
    }
}

fn validate_scheme(doc: &GraphDocument, scheme: &GuardScheme, table: &CodeTable) -> Result<(), BuildError> {
    let parameters = scheme.parameters();
    for (i, (name, kind)) in parameters.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(BuildError::EmptyParameterName);
        }
        if parameters[..i].iter().any(|(other, _)| other == name) {
            return Err(BuildError::DuplicateParameterName(name.to_string()));
        }
        doc.check_parameter(name, *kind)?;
    }

    if let Some(code) = table.max_code() {
        if !scheme.can_represent(code) {
            return Err(BuildError::CodeNotRepresentable {
                code,
                needed: codec::bits_for_value(code),
                available: scheme.bit_width().unwrap_or(0),
            });
        }
    }
    Ok(())
}
