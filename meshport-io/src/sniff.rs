//! Extension-based format detection

use crate::registry::{formats_for, Kind};
use std::path::Path;

/// Tag that asks the facade to pick the format from the file extension
pub const AUTO: &str = "auto";

/// Infer the canonical format tag for `kind` from the file name alone.
///
/// The extension after the last `.` is compared case-insensitively with the
/// kind's tags and aliases; anything unknown falls back to the kind's
/// default. The file itself is never opened.
pub fn sniff<P: AsRef<Path>>(kind: Kind, path: P) -> &'static str {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    extension
        .and_then(|ext| formats_for(kind).find(|entry| entry.matches(&ext)))
        .map(|entry| entry.tag())
        .unwrap_or_else(|| kind.default_format().tag())
}

/// Resolve a caller-supplied format string: `auto` (or empty) goes through
/// [`sniff`], anything else is passed through for registry lookup.
pub fn resolve_tag<'a, P: AsRef<Path>>(kind: Kind, path: P, format: &'a str) -> &'a str {
    let format = format.trim();
    if format.is_empty() || format.eq_ignore_ascii_case(AUTO) {
        sniff(kind, path)
    } else {
        format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_is_case_insensitive() {
        assert_eq!(sniff(Kind::PointCloud, "cloud.PLY"), "ply");
        assert_eq!(sniff(Kind::PointCloud, "cloud.ply"), "ply");
        assert_eq!(sniff(Kind::PointCloud, "/data/scan.Pcd"), "pcd");
        assert_eq!(sniff(Kind::Image, "photo.JPEG"), "jpg");
    }

    #[test]
    fn test_sniff_falls_back_to_kind_default() {
        assert_eq!(sniff(Kind::PointCloud, "cloud.unknown"), "ply");
        assert_eq!(sniff(Kind::TriangleMesh, "mesh"), "ply");
        assert_eq!(sniff(Kind::Image, "picture.bmp"), "png");
        assert_eq!(sniff(Kind::PoseGraph, "graph.txt"), "json");
        assert_eq!(sniff(Kind::PinholeCameraTrajectory, "traj.txt"), "tum");
        assert_eq!(sniff(Kind::Feature, "fpfh"), "bin");
    }

    #[test]
    fn test_sniff_uses_last_extension_of_file_name() {
        assert_eq!(sniff(Kind::TriangleMesh, "archive.ply.obj"), "obj");
        assert_eq!(sniff(Kind::TriangleMesh, "dir.stl/mesh"), "ply");
    }

    #[test]
    fn test_resolve_tag() {
        assert_eq!(resolve_tag(Kind::PointCloud, "a.xyz", "auto"), "xyz");
        assert_eq!(resolve_tag(Kind::PointCloud, "a.xyz", "AUTO"), "xyz");
        assert_eq!(resolve_tag(Kind::PointCloud, "a.xyz", ""), "xyz");
        assert_eq!(resolve_tag(Kind::PointCloud, "a.xyz", "pcd"), "pcd");
    }
}
