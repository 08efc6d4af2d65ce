//! Criterion benchmarks for label/badge culling and polygon restyle.
//!
//! Benchmarks:
//!   - label rebuild over 5,000 communities at zoom 10.5 (spread cull)
//!   - label rebuild over 5,000 communities at zoom 14 (viewport cull only)
//!   - restyle of 5,000 polygons after a hover change
//!
//! Run with: cargo bench -p map_engine --features bench --bench lod_bench

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use map_engine::geo::LatLng;
use map_engine::labels::LabelLayer;
use map_engine::model::{normalize_communities, CommunityId};
use map_engine::polygon_layer::PolygonLayer;
use map_engine::selection::SelectionState;
use map_engine::test_harness::square_community;
use map_engine::ViewportState;

const COMMUNITY_COUNT: usize = 5_000;

fn polygons() -> PolygonLayer {
    // 100 x 50 grid of small squares around Phoenix.
    let records: Vec<_> = (0..COMMUNITY_COUNT)
        .map(|i| {
            let row = (i / 100) as f64;
            let col = (i % 100) as f64;
            let size = if i % 3 == 0 { 0.02 } else { 0.004 };
            square_community(
                &format!("c{i}"),
                &format!("Community {i}"),
                33.0 + row * 0.02,
                -112.5 + col * 0.02,
                size,
                (i % 120) as i64,
            )
        })
        .collect();
    let (communities, _) = normalize_communities(&records);
    let mut layer = PolygonLayer::default();
    layer.rebuild(&communities, &SelectionState::default());
    layer
}

// ---------------------------------------------------------------------------
// Benchmark: label rebuild
// ---------------------------------------------------------------------------

fn bench_label_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("label_rebuild");
    let polygons = polygons();
    let selection = SelectionState::default();

    for zoom in [10.5, 14.0] {
        let view = ViewportState::new(
            LatLng::new(33.5, -112.0),
            zoom,
            bevy::math::DVec2::new(1920.0, 1080.0),
        );
        let visible = view.bounds();
        let mut labels = LabelLayer::default();
        group.bench_function(format!("zoom_{zoom}"), |b| {
            b.iter(|| {
                labels.rebuild(
                    black_box(&polygons.polygons),
                    &visible,
                    black_box(zoom),
                    &selection,
                );
                black_box(labels.labels.len())
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: hover restyle
// ---------------------------------------------------------------------------

fn bench_restyle(c: &mut Criterion) {
    let mut group = c.benchmark_group("polygon_restyle");
    let mut polygons = polygons();
    let hovered = SelectionState {
        hovered_community: Some(CommunityId::new("c2500")),
        ..Default::default()
    };
    let idle = SelectionState::default();

    group.bench_function("hover_toggle", |b| {
        b.iter(|| {
            black_box(polygons.restyle(&hovered));
            black_box(polygons.restyle(&idle));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_label_rebuild, bench_restyle);
criterion_main!(benches);
