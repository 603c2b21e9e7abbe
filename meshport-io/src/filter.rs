//! Post-read filtering of degenerate point cloud data

use crate::options::ReadPointCloudOptions;
use meshport_core::{Point3d, PointCloud};

fn has_nan(point: &Point3d) -> bool {
    point.iter().any(|c| c.is_nan())
}

fn has_infinite(point: &Point3d) -> bool {
    point.iter().any(|c| c.is_infinite())
}

/// Drop NaN points, then infinite points, as requested by `options`.
///
/// Normals and colors lose the same indices as the points. Returns the total
/// number of points removed.
pub fn remove_non_finite(cloud: &mut PointCloud, options: &ReadPointCloudOptions) -> usize {
    let mut removed = 0;
    if options.remove_nan_points {
        let count = cloud.retain_points(|p| !has_nan(p));
        if count > 0 {
            log::debug!("removed {} points with NaN coordinates", count);
        }
        removed += count;
    }
    if options.remove_infinite_points {
        let count = cloud.retain_points(|p| !has_infinite(p));
        if count > 0 {
            log::debug!("removed {} points with infinite coordinates", count);
        }
        removed += count;
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshport_core::{Color3d, Vector3d};

    fn cloud_with_bad_points() -> PointCloud {
        PointCloud::from_points(vec![
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(f64::NAN, 1.0, 1.0),
            Point3d::new(2.0, 2.0, 2.0),
            Point3d::new(3.0, f64::INFINITY, 3.0),
            Point3d::new(4.0, 4.0, 4.0),
        ])
        .with_normals((0..5).map(|i| Vector3d::new(i as f64, 0.0, 0.0)).collect())
        .with_colors((0..5).map(|i| Color3d::new(0.0, i as f64 / 4.0, 0.0)).collect())
    }

    #[test]
    fn test_removes_nan_then_infinite() {
        let mut cloud = cloud_with_bad_points();
        let removed = remove_non_finite(&mut cloud, &ReadPointCloudOptions::default());

        assert_eq!(removed, 2);
        assert_eq!(cloud.len(), 3);
        let xs: Vec<f64> = cloud.normals.iter().map(|n| n.x).collect();
        assert_eq!(xs, vec![0.0, 2.0, 4.0]);
        assert_eq!(cloud.colors[2], Color3d::new(0.0, 1.0, 0.0));
        assert!(cloud.validate().is_ok());
    }

    #[test]
    fn test_flags_are_independent() {
        let mut cloud = cloud_with_bad_points();
        let options = ReadPointCloudOptions {
            remove_nan_points: false,
            ..Default::default()
        };
        assert_eq!(remove_non_finite(&mut cloud, &options), 1);
        assert!(cloud.points[1].x.is_nan());

        let mut cloud = cloud_with_bad_points();
        assert_eq!(remove_non_finite(&mut cloud, &ReadPointCloudOptions::unfiltered()), 0);
        assert_eq!(cloud.len(), 5);
    }
}
