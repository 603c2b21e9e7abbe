//! Read and write throughput of the point cloud codecs
//!
//! Every iteration goes through the path-based API, so the numbers include
//! buffered file I/O and the atomic rename on write.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use meshport_core::{Color3d, Point3d, PointCloud, Vector3d};
use meshport_io::{
    read_point_cloud, write_point_cloud, ReadPointCloudOptions, WritePointCloudOptions,
};
use tempfile::TempDir;

const SIZES: [usize; 3] = [1_000, 10_000, 100_000];

/// Points on a helix with normals and colors
fn generate_test_point_cloud(num_points: usize) -> PointCloud {
    let points = (0..num_points)
        .map(|i| {
            let t = i as f64 * 0.1;
            Point3d::new(t.sin(), t.cos(), i as f64 * 0.001)
        })
        .collect::<Vec<_>>();
    let normals = points
        .iter()
        .map(|p| Vector3d::new(p.x, p.y, 0.0))
        .collect();
    let colors = (0..num_points)
        .map(|i| Color3d::new((i % 256) as f64 / 255.0, 0.5, 1.0))
        .collect();
    PointCloud::from_points(points)
        .with_normals(normals)
        .with_colors(colors)
}

fn variants() -> Vec<(&'static str, WritePointCloudOptions)> {
    vec![
        ("ply_binary", WritePointCloudOptions::default().with_format("ply")),
        ("ply_ascii", WritePointCloudOptions::ascii().with_format("ply")),
        ("pcd_binary", WritePointCloudOptions::default().with_format("pcd")),
        ("pcd_compressed", WritePointCloudOptions::compressed().with_format("pcd")),
        ("xyzn", WritePointCloudOptions::default().with_format("xyzn")),
    ]
}

fn benchmark_writing(c: &mut Criterion) {
    let dir = TempDir::new().expect("Failed to create scratch directory");
    let mut group = c.benchmark_group("point_cloud_write");

    for size in SIZES {
        let cloud = generate_test_point_cloud(size);
        group.throughput(Throughput::Elements(size as u64));
        for (name, options) in variants() {
            let path = dir.path().join(format!("{}_{}", name, size));
            group.bench_with_input(BenchmarkId::new(name, size), &cloud, |b, cloud| {
                b.iter(|| black_box(write_point_cloud(&path, cloud, &options)))
            });
        }
    }
    group.finish();
}

fn benchmark_reading(c: &mut Criterion) {
    let dir = TempDir::new().expect("Failed to create scratch directory");
    let mut group = c.benchmark_group("point_cloud_read");

    for size in SIZES {
        let cloud = generate_test_point_cloud(size);
        group.throughput(Throughput::Elements(size as u64));
        for (name, options) in variants() {
            let path = dir.path().join(format!("{}_{}", name, size));
            assert!(write_point_cloud(&path, &cloud, &options), "Failed to write {}", name);

            let read_options = ReadPointCloudOptions::default().with_format(options.format.clone());
            group.bench_with_input(BenchmarkId::new(name, size), &path, |b, path| {
                b.iter(|| black_box(read_point_cloud(path, &read_options)))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, benchmark_writing, benchmark_reading);
criterion_main!(benches);
