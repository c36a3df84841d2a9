//! Transition wiring for the remote side.

use crate::document::GraphDocument;
use crate::types::{NodeId, Transition};

use super::report::{BuildReport, CloneRecord, Edit};
use super::scheme::GuardScheme;
use super::BuildError;

/// Connect every ordered pair of distinct clones.
///
/// The transition into a clone is guarded by that clone's code. With
/// `match_times` set, timing is copied from the first transition between
/// the two originals when one exists.
pub(crate) fn connect_clones(
    doc: &mut GraphDocument,
    clones: &[CloneRecord],
    scheme: &GuardScheme,
    match_times: bool,
    report: &mut BuildReport,
) -> Result<usize, BuildError> {
    let mut added = 0;
    for from in clones {
        for to in clones {
            if from.clone == to.clone {
                continue;
            }
            let mut transition =
                Transition::instant(from.clone, to.clone).with_conditions(scheme.guards(to.code));
            if match_times {
                let timing = doc.require_node(from.original)?.transition_to(to.original).cloned();
                if let Some(timing) = timing {
                    transition.copy_timing_from(&timing);
                }
            }
            doc.add_transition(transition)?;
            report.edits.push(Edit::AddTransition { source: from.clone, destination: to.clone });
            added += 1;
        }
    }
    Ok(added)
}

/// Fan in from the remote-entry node to every clone.
pub(crate) fn connect_entry(
    doc: &mut GraphDocument,
    entry: NodeId,
    clones: &[CloneRecord],
    scheme: &GuardScheme,
    report: &mut BuildReport,
) -> Result<usize, BuildError> {
    for to in clones {
        let transition = Transition::instant(entry, to.clone).with_conditions(scheme.guards(to.code));
        doc.add_transition(transition)?;
        report.edits.push(Edit::AddTransition { source: entry, destination: to.clone });
    }
    Ok(clones.len())
}
