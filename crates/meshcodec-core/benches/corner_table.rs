//! Benchmarks for corner table construction and mesh traversal.
//!
//! Run with: cargo bench -p meshcodec-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use meshcodec_core::corner_table::CornerTable;
use meshcodec_core::data_type::DataType;
use meshcodec_core::geometry_attribute::{GeometryAttributeType, PointAttribute};
use meshcodec_core::geometry_indices::PointIndex;
use meshcodec_core::mesh::Mesh;
use meshcodec_core::mesh_traversal_sequencer::MeshTraversalSequencer;
use meshcodec_core::traverser::TraversalMethod;

/// Closed `n` x `n` torus with one point per vertex.
fn torus(n: u32) -> Mesh {
    let mut mesh = Mesh::new();
    for i in 0..n {
        for j in 0..n {
            let v00 = i * n + j;
            let v10 = ((i + 1) % n) * n + j;
            let v01 = i * n + (j + 1) % n;
            let v11 = ((i + 1) % n) * n + (j + 1) % n;
            mesh.add_face([PointIndex(v00), PointIndex(v10), PointIndex(v01)]);
            mesh.add_face([PointIndex(v10), PointIndex(v11), PointIndex(v01)]);
        }
    }
    mesh.add_attribute(PointAttribute::new(
        GeometryAttributeType::Position,
        3,
        DataType::Float32,
        false,
        (n * n) as usize,
    ));
    mesh
}

fn bench_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("corner_table_create");
    for n in [16u32, 64, 128] {
        let mesh = torus(n);
        let faces = mesh.faces_mapped_through(0);
        group.throughput(Throughput::Elements(faces.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &faces, |b, faces| {
            b.iter(|| CornerTable::create(black_box(faces)));
        });
    }
    group.finish();
}

fn bench_sequence(c: &mut Criterion) {
    let mut group = c.benchmark_group("traversal_sequence");
    for n in [16u32, 64] {
        let mesh = torus(n);
        let Ok(table) = CornerTable::create(&mesh.faces_mapped_through(0)) else {
            continue;
        };
        group.throughput(Throughput::Elements((n * n) as u64));
        for (name, method) in [
            ("depth_first", TraversalMethod::DepthFirst),
            ("max_prediction_degree", TraversalMethod::MaxPredictionDegree),
        ] {
            group.bench_with_input(BenchmarkId::new(name, n), &method, |b, &method| {
                b.iter(|| MeshTraversalSequencer::new(&mesh, &table, method).generate_sequence());
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_create, bench_sequence);
criterion_main!(benches);
