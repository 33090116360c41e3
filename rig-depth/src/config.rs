//! Manager configuration and the rig calibration file.

use crate::error::DepthError;
use rig_data::{CameraExtrinsic, Facet};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::num::NonZeroUsize;
use std::path::Path;
use tracing::{debug, info};

/// Runtime switches of the depth manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthConfig {
    /// Estimate depth on the front facet pair.
    pub estimate_front: bool,
    /// Estimate depth on the left facet pair.
    pub estimate_left: bool,
    /// Estimate depth on the right facet pair.
    pub estimate_right: bool,
    /// Scale applied to facet images before stereo, in (0, 1].
    pub downsample_ratio: f64,
    /// Keep every `cloud_stride`-th row and column when building point clouds.
    pub cloud_stride: usize,
    /// Export the prepared pair and synthetic calibration for external backends.
    pub publish_raw_stereo: bool,
    pub publish_depth_image: bool,
    pub publish_camera_pose: bool,
    /// Forwarded to the solver.
    pub solver_debug: bool,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            estimate_front: true,
            estimate_left: false,
            estimate_right: false,
            downsample_ratio: 0.5,
            cloud_stride: 1,
            publish_raw_stereo: false,
            publish_depth_image: true,
            publish_camera_pose: true,
            solver_debug: false,
        }
    }
}

impl DepthConfig {
    /// Facets to process each tick, in a fixed order.
    pub fn enabled_facets(&self) -> Vec<Facet> {
        [
            (Facet::Front, self.estimate_front),
            (Facet::Left, self.estimate_left),
            (Facet::Right, self.estimate_right),
        ]
        .into_iter()
        .filter_map(|(facet, enabled)| enabled.then_some(facet))
        .collect()
    }

    pub fn validate(&self) -> Result<(), DepthError> {
        if !(self.downsample_ratio > 0.0 && self.downsample_ratio <= 1.0) {
            return Err(DepthError::Configuration(format!(
                "downsample ratio must be in (0, 1], got {}",
                self.downsample_ratio
            )));
        }
        self.stride()?;
        Ok(())
    }

    pub fn stride(&self) -> Result<NonZeroUsize, DepthError> {
        NonZeroUsize::new(self.cloud_stride)
            .ok_or_else(|| DepthError::Configuration("point cloud stride must be at least 1".into()))
    }
}

/// Full-resolution pinhole parameters shared by all undistorted side facets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SideIntrinsics {
    pub focal_length: f64,
    pub cx: f64,
    pub cy: f64,
    /// Side facet image width in pixels, before reorientation.
    pub width: u32,
    /// Side facet image height in pixels, before reorientation.
    pub height: u32,
}

impl SideIntrinsics {
    pub fn validate(&self) -> Result<(), DepthError> {
        if !(self.focal_length > 0.0) {
            return Err(DepthError::Configuration(format!(
                "focal length must be positive, got {}",
                self.focal_length
            )));
        }
        if !(self.cx > 0.0 && self.cy > 0.0) {
            return Err(DepthError::Configuration(format!(
                "principal point must be positive, got ({}, {})",
                self.cx, self.cy
            )));
        }
        Ok(())
    }
}

/// Calibration of one stacked fisheye pair, as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigCalibration {
    pub side: SideIntrinsics,
    pub upper: CameraExtrinsic,
    pub lower: CameraExtrinsic,
    #[serde(default)]
    pub depth: DepthConfig,
}

impl RigCalibration {
    pub fn from_json_str(json: &str) -> Result<Self, DepthError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String, DepthError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DepthError> {
        let file = File::open(path.as_ref())?;
        let calibration: Self = serde_json::from_reader(BufReader::new(file))?;
        info!(
            "Loaded rig calibration: f={:.2} c=({:.1}, {:.1}) {}x{}",
            calibration.side.focal_length,
            calibration.side.cx,
            calibration.side.cy,
            calibration.side.width,
            calibration.side.height
        );
        debug!("Depth config: {:?}", calibration.depth);
        Ok(calibration)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DepthError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}
