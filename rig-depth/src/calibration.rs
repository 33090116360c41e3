//! Synthetic rectified-stereo calibration for external depth backends.

use crate::config::SideIntrinsics;
use glam::{DMat3, DQuat, DVec3};
use rig_capture::scaled_dimension;
use rig_data::{Facet, SyntheticCameraInfo};

/// Pinhole parameters of the downsampled, reoriented facet images.
///
/// The reorientation transposes the image, so the principal point and image
/// size are stored axis-swapped relative to the raw facet capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticIntrinsics {
    pub focal_length: f64,
    pub cx: f64,
    pub cy: f64,
    pub width: u32,
    pub height: u32,
}

impl SyntheticIntrinsics {
    pub fn from_side(side: &SideIntrinsics, downsample_ratio: f64) -> Self {
        Self {
            focal_length: side.focal_length * downsample_ratio,
            cx: side.cy * downsample_ratio,
            cy: side.cx * downsample_ratio,
            width: scaled_dimension(side.height, downsample_ratio),
            height: scaled_dimension(side.width, downsample_ratio),
        }
    }

    /// `[[f, 0, cx], [0, f, cy], [0, 0, 1]]`
    pub fn matrix(&self) -> DMat3 {
        DMat3::from_cols(
            DVec3::new(self.focal_length, 0.0, 0.0),
            DVec3::new(0.0, self.focal_length, 0.0),
            DVec3::new(self.cx, self.cy, 1.0),
        )
    }
}

/// Frame id of the upper camera of a facet pair.
pub fn facet_frame_id(facet: Facet) -> String {
    format!("camera_up_{}", facet)
}

/// Camera-info records for the upper and lower synthetic cameras.
///
/// The pair is treated as rectified along its baseline: only the x component
/// of `baseline` enters the lower camera's projection matrix.
pub fn build_stereo_camera_info(
    intrinsics: &SyntheticIntrinsics,
    baseline: DVec3,
    relative_rotation: DQuat,
    frame_id: &str,
    timestamp: f64,
) -> (SyntheticCameraInfo, SyntheticCameraInfo) {
    let upper = SyntheticCameraInfo::from_intrinsics(
        frame_id,
        timestamp,
        intrinsics.width,
        intrinsics.height,
        intrinsics.matrix(),
    );

    let mut lower = upper.clone();
    lower.set_rotation(DMat3::from_quat(relative_rotation));
    lower.set_projection(0, 3, -intrinsics.focal_length * baseline.x);

    (upper, lower)
}
