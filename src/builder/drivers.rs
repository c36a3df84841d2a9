//! Code-emitting drivers on the local side.

use crate::document::GraphDocument;
use crate::sink::DriverSink;
use crate::types::NodeId;

use super::report::{BuildReport, Edit};
use super::scheme::GuardScheme;
use super::BuildError;

/// Give every coded original a driver that writes its code.
///
/// Reuses an existing driver where there is one and skips entries that are
/// already present, so repeated builds leave the drivers unchanged.
pub(crate) fn attach_code_drivers<S: DriverSink>(
    doc: &mut GraphDocument,
    sink: &mut S,
    entries: &[(u32, NodeId)],
    scheme: &GuardScheme,
    report: &mut BuildReport,
) -> Result<(), BuildError> {
    for &(code, node) in entries {
        let wanted = scheme.driver_entries(code);
        if wanted.is_empty() {
            continue;
        }

        let slot = sink.get_or_create_driver(doc, node).map_err(BuildError::from_sink)?;
        let handle = slot.handle();
        if slot.created() {
            report.drivers_created += 1;
            report.edits.push(Edit::CreateDriver { node, behavior: handle.behavior });
        }

        for entry in wanted {
            let target = entry.target.clone();
            if sink.append_entry_if_absent(doc, handle, entry).map_err(BuildError::from_sink)? {
                report.driver_entries_added += 1;
                report.edits.push(Edit::AppendDriverEntry { node, behavior: handle.behavior, target });
            }
        }
    }
    Ok(())
}
