//! Clone creation and layout.

use crate::document::GraphDocument;
use crate::sink::DriverSink;
use crate::types::{GraphId, NodeId, Position};

use super::report::{BuildReport, CloneRecord, Edit};
use super::BuildError;

/// Horizontal clearance kept between the clone cluster and the originals.
pub const LAYOUT_GAP: f32 = 50.0;

/// `base`, or `base_1`, `base_2`, ... until no sibling in `graph` has the name.
pub(crate) fn unique_name(doc: &GraphDocument, graph: GraphId, base: &str) -> String {
    let mut name = base.to_string();
    let mut suffix = 1usize;
    while doc.has_node_named(graph, &name) {
        name = format!("{base}_{suffix}");
        suffix += 1;
    }
    name
}

/// Clone every `(code, original)` pair next to its original.
///
/// Clones get a mirrored X coordinate and no transitions. With
/// `remove_drivers` set, driver behaviors are detached from the clone; the
/// instances themselves are left alone since the original still uses them.
/// Returns the records and the largest finite mirrored X.
pub(crate) fn create_clones<S: DriverSink>(
    doc: &mut GraphDocument,
    sink: &S,
    entries: &[(u32, NodeId)],
    prefix: &str,
    remove_drivers: bool,
    report: &mut BuildReport,
) -> Result<(Vec<CloneRecord>, Option<f32>), BuildError> {
    let mut records = Vec::with_capacity(entries.len());
    let mut max_clone_x: Option<f32> = None;

    for &(code, original) in entries {
        let source = doc.require_node(original)?;
        let parent = source.parent;
        let mirrored = source.position.mirrored_x();
        let base = format!("{prefix}{}", source.name);

        let name = unique_name(doc, parent, &base);
        let clone = doc.duplicate_node(original, name.clone())?;
        report.edits.push(Edit::CloneNode { source: original, clone, name: name.clone() });

        if remove_drivers {
            let view: &GraphDocument = doc;
            let drivers: Vec<_> = view
                .require_node(clone)?
                .behaviors
                .iter()
                .copied()
                .filter(|b| sink.is_driver(view, *b))
                .collect();
            for behavior in drivers {
                doc.detach_behavior(clone, behavior)?;
                report.edits.push(Edit::DetachBehavior { node: clone, behavior });
            }
        }

        doc.require_node_mut(clone)?.position = mirrored;
        if mirrored.x.is_finite() {
            max_clone_x = Some(max_clone_x.map_or(mirrored.x, |m| m.max(mirrored.x)));
        }

        tracing::debug!(%original, %clone, code, name = %name, "clone created");
        records.push(CloneRecord { code, original, clone, name });
    }

    Ok((records, max_clone_x))
}

/// Smallest X over `nodes`, ignoring non-finite coordinates.
pub(crate) fn min_x<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Option<f32> {
    positions
        .into_iter()
        .map(|p| p.x)
        .filter(|x| x.is_finite())
        .fold(None, |min, x| Some(min.map_or(x, |m: f32| m.min(x))))
}

/// Shift every clone left so the cluster ends [`LAYOUT_GAP`] units before the
/// leftmost original. Returns the applied shift, 0 when there was no overlap.
pub(crate) fn resolve_overlap(
    doc: &mut GraphDocument,
    clones: &[CloneRecord],
    min_original_x: Option<f32>,
    max_clone_x: Option<f32>,
    report: &mut BuildReport,
) -> Result<f32, BuildError> {
    let (Some(min_x), Some(max_x)) = (min_original_x, max_clone_x) else {
        return Ok(0.0);
    };
    let limit = min_x - LAYOUT_GAP;
    if max_x <= limit {
        return Ok(0.0);
    }

    let shift = max_x - limit;
    for record in clones {
        doc.require_node_mut(record.clone)?.position.x -= shift;
        report.edits.push(Edit::ShiftNode { node: record.clone, dx: -shift });
    }
    Ok(shift)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::DocumentDriverSink;
    use uuid::Uuid;

    #[test]
    fn test_unique_name_suffixes() {
        let mut doc = GraphDocument::new("names");
        let (_, root) = doc.add_layer("Base");
        doc.add_node(root, "Remote_Wave", Position::default()).unwrap();
        doc.add_node(root, "Remote_Wave_1", Position::default()).unwrap();

        assert_eq!(unique_name(&doc, root, "Remote_Wave"), "Remote_Wave_2");
        assert_eq!(unique_name(&doc, root, "Remote_Jump"), "Remote_Jump");
    }

    #[test]
    fn test_clone_detaches_drivers_only() {
        let mut doc = GraphDocument::new("clone");
        let (_, root) = doc.add_layer("Base");
        let wave = doc.add_node(root, "Wave1", Position::new(30.0, 5.0)).unwrap();
        let driver = doc.attach_driver(wave).unwrap();
        let sound = doc.attach_opaque(wave, "Host.Sound", serde_json::Value::Null).unwrap();
        let mut report = BuildReport::new(Uuid::nil(), 0);

        let (records, max_x) =
            create_clones(&mut doc, &DocumentDriverSink::new(), &[(1, wave)], "Remote_", true, &mut report)
                .unwrap();

        let clone = doc.node(records[0].clone).unwrap();
        assert_eq!(clone.name, "Remote_Wave1");
        assert_eq!(clone.position, Position::new(-30.0, 5.0));
        assert_eq!(clone.behaviors, vec![sound]);
        assert_eq!(max_x, Some(-30.0));
        // The original keeps its driver and the instance is still alive.
        assert_eq!(doc.node(wave).unwrap().behaviors, vec![driver, sound]);
        assert!(doc.behavior(driver).is_some());
    }

    #[test]
    fn test_overlap_shift() {
        let mut doc = GraphDocument::new("layout");
        let (_, root) = doc.add_layer("Base");
        let a = doc.add_node(root, "A1", Position::new(-100.0, 0.0)).unwrap();
        let b = doc.add_node(root, "B2", Position::new(-20.0, 0.0)).unwrap();
        let mut report = BuildReport::new(Uuid::nil(), 0);

        let min = min_x(doc.nodes().map(|n| &n.position));
        let (records, max_x) =
            create_clones(&mut doc, &DocumentDriverSink::new(), &[(1, a), (2, b)], "R_", false, &mut report)
                .unwrap();
        // Mirrored: 100 and 20. Limit is -150, so the shift is 250.
        let shift = resolve_overlap(&mut doc, &records, min, max_x, &mut report).unwrap();

        assert_eq!(shift, 250.0);
        assert_eq!(doc.node(records[0].clone).unwrap().position.x, -150.0);
        assert_eq!(doc.node(records[1].clone).unwrap().position.x, -230.0);
    }

    #[test]
    fn test_no_shift_when_clear() {
        let mut doc = GraphDocument::new("layout");
        let (_, root) = doc.add_layer("Base");
        let a = doc.add_node(root, "A1", Position::new(200.0, 0.0)).unwrap();
        let mut report = BuildReport::new(Uuid::nil(), 0);

        let min = min_x(doc.nodes().map(|n| &n.position));
        let (records, max_x) =
            create_clones(&mut doc, &DocumentDriverSink::new(), &[(1, a)], "R_", false, &mut report).unwrap();

        assert_eq!(resolve_overlap(&mut doc, &records, min, max_x, &mut report).unwrap(), 0.0);
        assert_eq!(doc.node(records[0].clone).unwrap().position.x, -200.0);
    }

    #[test]
    fn test_non_finite_clone_is_left_out_of_layout() {
        let mut doc = GraphDocument::new("layout");
        let (_, root) = doc.add_layer("Base");
        let broken = doc.add_node(root, "A1", Position::new(f32::NAN, 0.0)).unwrap();
        let mut report = BuildReport::new(Uuid::nil(), 0);

        let min = min_x(doc.nodes().map(|n| &n.position));
        let (records, max_x) =
            create_clones(&mut doc, &DocumentDriverSink::new(), &[(1, broken)], "R_", false, &mut report)
                .unwrap();

        assert_eq!(max_x, None);
        assert_eq!(resolve_overlap(&mut doc, &records, min, max_x, &mut report).unwrap(), 0.0);
    }

    #[test]
    fn test_non_finite_clone_does_not_hide_finite_ones() {
        let mut doc = GraphDocument::new("layout");
        let (_, root) = doc.add_layer("Base");
        let good = doc.add_node(root, "B2", Position::new(40.0, 0.0)).unwrap();
        let broken = doc.add_node(root, "A1", Position::new(f32::NAN, 0.0)).unwrap();
        let mut report = BuildReport::new(Uuid::nil(), 0);

        let (_, max_x) = create_clones(
            &mut doc,
            &DocumentDriverSink::new(),
            &[(1, broken), (2, good)],
            "R_",
            false,
            &mut report,
        )
        .unwrap();

        assert_eq!(max_x, Some(-40.0));
    }

    #[test]
    fn test_min_x_skips_non_finite() {
        let positions = [Position::new(f32::NAN, 0.0), Position::new(3.0, 0.0), Position::new(-1.0, 0.0)];
        assert_eq!(min_x(positions.iter()), Some(-1.0));
        assert_eq!(min_x(std::iter::empty()), None);
    }
}
