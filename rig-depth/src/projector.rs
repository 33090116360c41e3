//! Projection of solver depth fields into colored world point clouds.

use glam::{DMat3, DQuat, DVec3};
use image::RgbImage;
use rig_data::{CameraExtrinsic, DepthField, RigPose, WorldPoint, WorldPointCloud, is_valid_depth, pack_rgb};
use std::num::NonZeroUsize;
use tracing::{debug, error};

/// Rigid transform taking camera-frame points to the world frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraToWorld {
    pub rotation: DMat3,
    pub translation: DVec3,
}

impl CameraToWorld {
    pub fn new(rotation: DMat3, translation: DVec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(DMat3::IDENTITY, DVec3::ZERO)
    }

    /// Chain a camera into the world through the rig pose.
    ///
    /// The extrinsic translation is applied in the body frame first, then the
    /// rig rotation and translation: `R_rig · R_cam` and `R_rig · t_cam + P_rig`.
    pub fn from_rig(pose: &RigPose, camera_rotation: DQuat, extrinsic: &CameraExtrinsic) -> Self {
        Self::new(
            DMat3::from_quat(pose.rotation * camera_rotation),
            pose.transform_point(extrinsic.translation),
        )
    }

    pub fn rotation_quat(&self) -> DQuat {
        DQuat::from_mat3(&self.rotation).normalize()
    }

    pub fn apply(&self, point: DVec3) -> DVec3 {
        self.rotation * point + self.translation
    }
}

/// Project every `stride`-th row and column of `depth` into the world frame.
///
/// Rows are scanned outermost. Pixels failing the depth sentinel are skipped;
/// the rest become one point each, colored from `color` at the same pixel.
/// `color` must have the dimensions of `depth`. A mismatch is a caller bug:
/// debug builds abort, release builds log it and drop pixels outside `color`.
pub fn project_to_world(
    depth: &DepthField,
    camera_to_world: &CameraToWorld,
    color: &RgbImage,
    stride: NonZeroUsize,
    timestamp: f64,
) -> WorldPointCloud {
    let aligned = depth.dimensions() == color.dimensions();
    debug_assert!(
        aligned,
        "depth field {:?} is not aligned with color image {:?}",
        depth.dimensions(),
        color.dimensions()
    );
    if !aligned {
        error!(
            "Depth field {:?} is not aligned with color image {:?}; out-of-range pixels are dropped",
            depth.dimensions(),
            color.dimensions()
        );
    }

    let step = stride.get();
    let (width, height) = depth.dimensions();
    let capacity = (height as usize).div_ceil(step) * (width as usize).div_ceil(step);
    let mut cloud = WorldPointCloud::with_capacity(timestamp, capacity);

    for v in (0..height).step_by(step) {
        for u in (0..width).step_by(step) {
            let Some(local) = depth.get(u, v) else {
                continue;
            };
            if !is_valid_depth(local.z) {
                continue;
            }
            let Some(pixel) = color.get_pixel_checked(u, v) else {
                continue;
            };
            let world = camera_to_world.apply(local.as_dvec3());
            let [r, g, b] = pixel.0;
            cloud.push(WorldPoint::new(world.as_vec3(), pack_rgb(r, g, b), u, v));
        }
    }

    debug!(
        "Projected {} of {} sampled pixels (stride {})",
        cloud.len(),
        capacity,
        step
    );
    cloud
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use image::Rgb;
    use rig_data::MIN_VALID_DEPTH;

    fn stride(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn gray_color(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([1, 2, 3]))
    }

    #[test]
    fn test_identity_projection_preserves_points() {
        let depth = DepthField::from_fn(5, 3, |u, v| Vec3::new(u as f32 * 0.5, v as f32 - 1.0, 1.0));
        let cloud = project_to_world(&depth, &CameraToWorld::identity(), &gray_color(5, 3), stride(1), 0.0);
        assert_eq!(cloud.len(), 15);
        for (point, local) in cloud.iter().zip(depth.points()) {
            assert_eq!(point.position(), *local);
        }
    }

    #[test]
    fn test_threshold_boundary() {
        let depth = DepthField::from_fn(2, 1, |u, _| {
            let z = if u == 0 { MIN_VALID_DEPTH } else { MIN_VALID_DEPTH + 1e-4 };
            Vec3::new(0.0, 0.0, z)
        });
        let cloud = project_to_world(&depth, &CameraToWorld::identity(), &gray_color(2, 1), stride(1), 0.0);
        assert_eq!(cloud.len(), 1);
        assert_eq!(cloud.points[0].u, 1);
    }

    #[test]
    fn test_stride_law() {
        let (w, h) = (10u32, 7u32);
        let depth = DepthField::filled(w, h, Vec3::Z);
        let color = gray_color(w, h);
        for s in 1..=5usize {
            let cloud = project_to_world(&depth, &CameraToWorld::identity(), &color, stride(s), 0.0);
            let bound = (h as usize).div_ceil(s) * (w as usize).div_ceil(s);
            assert!(cloud.len() <= bound);
            assert_eq!(cloud.len(), bound);
            assert!(cloud.iter().all(|p| p.u as usize % s == 0 && p.v as usize % s == 0));
        }

        let big = DepthField::filled(64, 64, Vec3::Z);
        let big_color = gray_color(64, 64);
        let s2 = project_to_world(&big, &CameraToWorld::identity(), &big_color, stride(2), 0.0).len();
        let s4 = project_to_world(&big, &CameraToWorld::identity(), &big_color, stride(4), 0.0).len();
        assert_eq!(s2, 4 * s4);
    }

    #[test]
    fn test_scan_order_is_rows_then_columns() {
        let depth = DepthField::filled(3, 2, Vec3::Z);
        let cloud = project_to_world(&depth, &CameraToWorld::identity(), &gray_color(3, 2), stride(1), 0.0);
        let coords: Vec<(u32, u32)> = cloud.iter().map(|p| (p.u, p.v)).collect();
        assert_eq!(coords, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let depth = DepthField::filled(4, 4, Vec3::new(0.0, 0.0, 1.0));
        let color = RgbImage::from_pixel(4, 4, Rgb([10, 20, 30]));
        let transform = CameraToWorld::new(DMat3::IDENTITY, DVec3::new(1.0, 0.0, 0.0));
        let cloud = project_to_world(&depth, &transform, &color, stride(1), 2.5);

        assert_eq!(cloud.len(), 16);
        assert_eq!(cloud.timestamp, 2.5);
        assert_eq!(cloud.frame_id, "world");
        let mut seen = Vec::new();
        for p in cloud.iter() {
            assert_eq!(p.position(), Vec3::new(1.0, 0.0, 1.0));
            assert_eq!(p.color(), [10, 20, 30]);
            seen.push((p.u, p.v));
        }
        seen.sort();
        let mut expected: Vec<(u32, u32)> = (0..4).flat_map(|u| (0..4).map(move |v| (u, v))).collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_rotation_then_translation() {
        let depth = DepthField::filled(1, 1, Vec3::new(0.0, 0.0, 2.0));
        let transform = CameraToWorld::new(DMat3::from_rotation_y(std::f64::consts::FRAC_PI_2), DVec3::new(0.0, 1.0, 0.0));
        let cloud = project_to_world(&depth, &transform, &gray_color(1, 1), stride(1), 0.0);
        assert!(cloud.points[0].position().abs_diff_eq(Vec3::new(2.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn test_from_rig_convention() {
        let pose = RigPose::new(DQuat::from_rotation_z(std::f64::consts::FRAC_PI_2), DVec3::new(10.0, 0.0, 0.0), 0.0);
        let extrinsic = CameraExtrinsic::new(DQuat::IDENTITY, DVec3::new(1.0, 0.0, 0.0));
        let transform = CameraToWorld::from_rig(&pose, DQuat::IDENTITY, &extrinsic);
        // Extrinsic offset is rotated by the rig before the rig translation.
        assert!(transform.translation.abs_diff_eq(DVec3::new(10.0, 1.0, 0.0), 1e-12));
        assert!(transform.apply(DVec3::X).abs_diff_eq(DVec3::new(10.0, 2.0, 0.0), 1e-12));
    }

    #[test]
    fn test_colors_follow_source_pixels() {
        let depth = DepthField::filled(2, 2, Vec3::Z);
        let color = RgbImage::from_fn(2, 2, |x, y| Rgb([x as u8, y as u8, 200]));
        let cloud = project_to_world(&depth, &CameraToWorld::identity(), &color, stride(1), 0.0);
        for p in cloud.iter() {
            assert_eq!(p.color(), [p.u as u8, p.v as u8, 200]);
        }
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn test_misaligned_color_is_bounds_checked() {
        let depth = DepthField::filled(4, 4, Vec3::Z);
        let cloud = project_to_world(&depth, &CameraToWorld::identity(), &gray_color(2, 4), stride(1), 0.0);
        assert_eq!(cloud.len(), 8);
        assert!(cloud.iter().all(|p| p.u < 2));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "not aligned")]
    fn test_misaligned_color_panics_in_debug() {
        let depth = DepthField::filled(4, 4, Vec3::Z);
        project_to_world(&depth, &CameraToWorld::identity(), &gray_color(2, 4), stride(1), 0.0);
    }
}
