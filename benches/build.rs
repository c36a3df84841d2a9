//! Performance benchmarks for sync builds.
//!
//! Run with: `cargo bench --bench build`
//!
//! ## Performance Targets
//!
//! | Operation | Target | Notes |
//! |-----------|--------|-------|
//! | Int build, 64 codes | <10ms | Dominated by 64·63 pairwise transitions |
//! | Boolean build, 64 codes | <20ms | Six guards per transition |
//! | Code resolution | Linear | One traversal plus suffix parsing |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::BTreeMap;

use statesync_kernel::{
    resolve_assignments, BitWidth, DocumentDriverSink, GraphDocument, GraphId, MarkerNames, MarkerSet,
    NodeId, Position, SyncBuilder, SyncMode, SyncRequest,
};

/// Create a layer with `count` coded states spread over nested graphs of 16.
fn make_document(count: usize) -> (GraphDocument, GraphId, BTreeMap<NodeId, i32>) {
    let mut doc = GraphDocument::new("bench");
    let (_, root) = doc.add_layer("Base");
    doc.add_node(root, "Local Tree", Position::new(0.0, -100.0)).unwrap();
    doc.add_node(root, "Remote Tree", Position::new(0.0, -200.0)).unwrap();

    let mut codes = BTreeMap::new();
    let mut graph = root;
    for i in 0..count {
        if i % 16 == 0 {
            graph = doc.add_graph(root, format!("Group{}", i / 16), Position::default()).unwrap();
        }
        let id = doc
            .add_node(graph, format!("State{i}"), Position::new(40.0 * i as f32, 0.0))
            .unwrap();
        codes.insert(id, i as i32);
    }
    (doc, root, codes)
}

/// Benchmark int-mode builds.
fn bench_int_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("int_build");

    for count in [8, 32, 64] {
        let (doc, _, codes) = make_document(count);
        let request = SyncRequest::int(0, "Sync", codes);

        group.throughput(Throughput::Elements((count * count) as u64));
        group.bench_with_input(BenchmarkId::new("codes", count), &request, |b, request| {
            let mut builder = SyncBuilder::new(DocumentDriverSink::new());
            b.iter(|| {
                let mut working = doc.clone();
                let report = builder.build(&mut working, black_box(request)).unwrap();
                assert_eq!(report.pairwise_transitions, count * (count - 1));
                report
            })
        });
    }

    group.finish();
}

/// Benchmark boolean-mode builds with an automatic width.
fn bench_boolean_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("boolean_build");

    for count in [8, 32, 64] {
        let (doc, _, codes) = make_document(count);
        let mut request = SyncRequest::int(0, "unused", codes);
        request.mode = SyncMode::Boolean { bits: BitWidth::Minimal { prefix: "Bit".to_string() } };

        group.throughput(Throughput::Elements((count * count) as u64));
        group.bench_with_input(BenchmarkId::new("codes", count), &request, |b, request| {
            let mut builder = SyncBuilder::new(DocumentDriverSink::new());
            b.iter(|| {
                let mut working = doc.clone();
                builder.build(&mut working, black_box(request)).unwrap()
            })
        });
    }

    group.finish();
}

/// Benchmark code resolution over the whole tree.
fn bench_resolve_assignments(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_assignments");

    for count in [64, 512] {
        let (doc, root, _) = make_document(count);
        let markers = MarkerSet::resolve(&doc, root, &MarkerNames::default());
        let overrides = BTreeMap::new();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("states", count), &doc, |b, doc| {
            b.iter(|| resolve_assignments(black_box(doc), root, &overrides, &markers, "Remote_"))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_int_build, bench_boolean_build, bench_resolve_assignments);
criterion_main!(benches);
