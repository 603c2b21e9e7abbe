//! Round trips through the path-based API for every registered format
//!
//! Each case writes an entity to a scratch directory, reads it back with
//! format detection from the extension and compares against what the format
//! is documented to preserve.

use approx::assert_relative_eq;
use meshport_core::{
    color_from_u8, Color3d, Feature, Image, LineSet, Matrix4d, Matrix6d, PinholeCameraIntrinsic,
    PinholeCameraParameters, PinholeCameraTrajectory, Point3d, PointCloud, PoseGraph,
    PoseGraphEdge, PoseGraphNode, Transform3D, TriangleMesh, UnitQuaternion, Vector3d, Voxel,
    VoxelGrid,
};
use meshport_io::*;
use rstest::rstest;
use std::path::PathBuf;
use tempfile::TempDir;

/// Colors that survive 8-bit quantization unchanged
fn color(r: u8, g: u8, b: u8) -> Color3d {
    Color3d::new(color_from_u8(r), color_from_u8(g), color_from_u8(b))
}

/// Coordinates chosen to be exact in single precision
fn sample_cloud(normals: bool, colors: bool) -> PointCloud {
    let mut cloud = PointCloud::from_points(vec![
        Point3d::new(0.0, 0.0, 0.0),
        Point3d::new(1.5, -2.25, 3.125),
        Point3d::new(-0.5, 0.75, 100.0),
        Point3d::new(1024.0, 0.0625, -7.0),
    ]);
    if normals {
        cloud = cloud.with_normals(vec![
            Vector3d::x(),
            Vector3d::y(),
            Vector3d::z(),
            Vector3d::new(0.0, -1.0, 0.0),
        ]);
    }
    if colors {
        cloud = cloud.with_colors(vec![
            color(255, 0, 0),
            color(0, 255, 0),
            color(0, 0, 255),
            color(12, 200, 99),
        ]);
    }
    cloud
}

fn sample_mesh() -> TriangleMesh {
    let mut mesh = TriangleMesh::from_vertices_and_faces(
        vec![
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(1.0, 1.0, 0.0),
            Point3d::new(0.0, 1.0, 0.5),
        ],
        vec![[0, 1, 2], [0, 2, 3]],
    );
    mesh.set_normals(vec![Vector3d::z(); 4]);
    mesh.set_colors(vec![color(255, 0, 0), color(0, 255, 0), color(0, 0, 255), color(128, 128, 128)]);
    mesh
}

fn sample_trajectory() -> PinholeCameraTrajectory {
    let intrinsic = PinholeCameraIntrinsic::prime_sense_default();
    let poses = [
        Transform3D::identity(),
        Transform3D::from_translation_rotation(
            Vector3d::new(0.25, 0.5, -1.0),
            UnitQuaternion::from_euler_angles(0.0, 0.3, -0.2),
        ),
        Transform3D::from_translation_rotation(
            Vector3d::new(2.0, 0.0, 1.0),
            UnitQuaternion::from_euler_angles(1.0, 0.0, 0.5),
        ),
    ];
    PinholeCameraTrajectory {
        parameters: poses
            .iter()
            .map(|pose| PinholeCameraParameters::new(intrinsic, pose.inverse().unwrap().matrix))
            .collect(),
    }
}

fn scratch(name: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(name);
    (dir, path)
}

#[rstest]
#[case("ply", true, true)]
#[case("pcd", true, true)]
#[case("xyz", false, false)]
#[case("xyzn", true, false)]
#[case("xyzrgb", false, true)]
#[case("pts", false, true)]
fn test_point_cloud_round_trip(#[case] extension: &str, #[case] normals: bool, #[case] colors: bool) {
    let (_dir, path) = scratch(&format!("cloud.{}", extension));
    let cloud = sample_cloud(normals, colors);

    assert!(write_point_cloud(&path, &cloud, &WritePointCloudOptions::default()));
    let (back, ok) = read_point_cloud(&path, &ReadPointCloudOptions::default());
    assert!(ok);
    assert_eq!(back, cloud);
}

#[rstest]
#[case(WritePointCloudOptions::ascii())]
#[case(WritePointCloudOptions::compressed())]
#[case(WritePointCloudOptions::default())]
fn test_pcd_data_encodings(#[case] options: WritePointCloudOptions) {
    let (_dir, path) = scratch("cloud.pcd");
    let cloud = sample_cloud(true, true);

    try_write_point_cloud(&path, &cloud, &options).unwrap();
    let back = try_read_point_cloud(&path, &ReadPointCloudOptions::default()).unwrap();
    assert_eq!(back, cloud);
}

#[rstest]
#[case(WritePointCloudOptions::ascii())]
#[case(WritePointCloudOptions::default())]
fn test_ply_point_cloud_encodings(#[case] options: WritePointCloudOptions) {
    let (_dir, path) = scratch("cloud.ply");
    let cloud = sample_cloud(true, true);

    try_write_point_cloud(&path, &cloud, &options).unwrap();
    assert_eq!(try_read_point_cloud(&path, &ReadPointCloudOptions::default()).unwrap(), cloud);
}

#[rstest]
#[case("ply", true, true)]
#[case("obj", true, true)]
#[case("off", true, true)]
fn test_triangle_mesh_round_trip(#[case] extension: &str, #[case] normals: bool, #[case] colors: bool) {
    let (_dir, path) = scratch(&format!("mesh.{}", extension));
    let mesh = sample_mesh();

    assert!(write_triangle_mesh(&path, &mesh, &WriteTriangleMeshOptions::default()));
    let (back, ok) = read_triangle_mesh(&path, &ReadOptions::default());
    assert!(ok);
    assert_eq!(back.vertices, mesh.vertices);
    assert_eq!(back.faces, mesh.faces);
    assert_eq!(back.has_normals(), normals);
    assert_eq!(back.has_colors(), colors);
    if normals {
        assert_eq!(back.normals, mesh.normals);
    }
    if colors {
        assert_eq!(back.colors, mesh.colors);
    }
}

#[rstest]
#[case(WriteTriangleMeshOptions::default())]
#[case(WriteTriangleMeshOptions::ascii())]
fn test_stl_stores_unshared_triangles(#[case] options: WriteTriangleMeshOptions) {
    let (_dir, path) = scratch("mesh.stl");
    let mesh = sample_mesh();

    try_write_triangle_mesh(&path, &mesh, &options).unwrap();
    let back = try_read_triangle_mesh(&path, &ReadOptions::default()).unwrap();
    assert_eq!(back.face_count(), 2);
    assert_eq!(back.vertex_count(), 6);
    assert!(!back.has_normals() && !back.has_colors());
    for (face, original) in back.faces.iter().zip(&mesh.faces) {
        for (corner, index) in face.iter().zip(original) {
            assert_eq!(back.vertices[*corner], mesh.vertices[*index]);
        }
    }
}

#[test]
fn test_line_set_round_trip() {
    let (_dir, path) = scratch("lines.ply");
    let mut lines = LineSet::from_points_and_lines(
        vec![Point3d::origin(), Point3d::new(1.0, 2.0, 3.0), Point3d::new(-1.0, 0.5, 0.0)],
        vec![[0, 1], [1, 2], [2, 0]],
    );
    lines.colors = vec![color(10, 20, 30), color(40, 50, 60), color(70, 80, 90)];

    assert!(write_line_set(&path, &lines, &WriteLineSetOptions::ascii()));
    let (back, ok) = read_line_set(&path, &ReadOptions::default());
    assert!(ok);
    assert_eq!(back, lines);
}

#[test]
fn test_voxel_grid_round_trip() {
    let (_dir, path) = scratch("grid.ply");
    let mut grid = VoxelGrid::new(0.05, Point3d::new(-1.0, 2.0, 0.5));
    grid.insert(Voxel::with_color([0, 0, 0], color(255, 255, 0)));
    grid.insert(Voxel::with_color([-3, 7, 2], color(0, 64, 128)));
    grid.insert(Voxel::with_color([10, -10, 100], color(1, 2, 3)));

    assert!(write_voxel_grid(&path, &grid, &WriteVoxelGridOptions::default()));
    let (back, ok) = read_voxel_grid(&path, &ReadOptions::default());
    assert!(ok);
    assert_eq!(back, grid);
}

#[test]
fn test_png_round_trip() {
    let (_dir, path) = scratch("depth.png");
    let data: Vec<u8> = (0..16 * 8 * 2).map(|i| (i * 7 % 256) as u8).collect();
    let image = Image::from_data(16, 8, 1, 2, data).unwrap();

    assert!(write_image(&path, &image, &WriteImageOptions::default()));
    let (back, ok) = read_image(&path, &ReadOptions::default());
    assert!(ok);
    assert_eq!(back, image);
}

#[test]
fn test_jpeg_round_trip_keeps_shape() {
    let (_dir, path) = scratch("color.JPEG");
    let data: Vec<u8> = (0..32 * 16 * 3).map(|i| (i % 200) as u8).collect();
    let image = Image::from_data(32, 16, 3, 1, data).unwrap();

    assert!(write_image(&path, &image, &WriteImageOptions::default().with_quality(95)));
    let (back, ok) = read_image(&path, &ReadOptions::default());
    assert!(ok);
    assert_eq!((back.width, back.height, back.num_of_channels, back.bytes_per_channel), (32, 16, 3, 1));
}

#[test]
fn test_camera_json_round_trips() {
    let (_dir, path) = scratch("camera.json");
    let intrinsic = PinholeCameraIntrinsic::new(1280, 720, 910.5, 911.25, 640.0, 360.0);
    assert!(write_pinhole_camera_intrinsic(&path, &intrinsic, &WriteOptions::default()));
    assert_eq!(read_pinhole_camera_intrinsic(&path, &ReadOptions::default()), (intrinsic, true));

    let parameters = sample_trajectory().parameters[1];
    assert!(write_pinhole_camera_parameters(&path, &parameters, &WriteOptions::default()));
    assert_eq!(read_pinhole_camera_parameters(&path, &ReadOptions::default()), (parameters, true));

    let trajectory = sample_trajectory();
    assert!(write_pinhole_camera_trajectory(&path, &trajectory, &WriteOptions::default()));
    assert_eq!(read_pinhole_camera_trajectory(&path, &ReadOptions::default()), (trajectory, true));
}

#[rstest]
#[case("trajectory.log", 1e-7)]
#[case("trajectory.txt", 1e-9)]
#[case("trajectory.tum", 1e-9)]
fn test_pose_only_trajectories(#[case] name: &str, #[case] epsilon: f64) {
    let (_dir, path) = scratch(name);
    let trajectory = sample_trajectory();

    try_write_pinhole_camera_trajectory(&path, &trajectory, &WriteOptions::default()).unwrap();
    let back = try_read_pinhole_camera_trajectory(&path, &ReadOptions::default()).unwrap();
    assert_eq!(back.len(), trajectory.len());
    for (a, b) in back.parameters.iter().zip(&trajectory.parameters) {
        assert_relative_eq!(a.extrinsic, b.extrinsic, epsilon = epsilon);
        assert_eq!(a.intrinsic, PinholeCameraIntrinsic::prime_sense_default());
    }
}

#[test]
fn test_feature_round_trip() {
    let (_dir, path) = scratch("fpfh.bin");
    let values: Vec<f64> = (0..33 * 5).map(|i| i as f64 * 0.1 - 4.0).collect();
    let feature = Feature::from_row_slice(5, 33, &values);

    assert!(write_feature(&path, &feature, &WriteOptions::default()));
    assert_eq!(read_feature(&path, &ReadOptions::default()), (feature, true));
}

#[test]
fn test_pose_graph_round_trip() {
    let (_dir, path) = scratch("graph.json");
    let mut pose = Matrix4d::identity();
    pose[(1, 3)] = -0.75;
    let graph = PoseGraph {
        nodes: vec![PoseGraphNode::default(), PoseGraphNode::new(pose), PoseGraphNode::new(pose * pose)],
        edges: vec![
            PoseGraphEdge::new(0, 1, pose, Matrix6d::identity(), false, 1.0),
            PoseGraphEdge::new(0, 2, pose * pose, Matrix6d::identity() * 2.5, true, 0.2),
        ],
    };

    assert!(write_pose_graph(&path, &graph, &WriteOptions::default()));
    assert_eq!(read_pose_graph(&path, &ReadOptions::default()), (graph, true));
}
