//! Synthetic stereo pairs built from two facets of a stacked fisheye rig.

use crate::error::DepthError;
use crate::mounting::MountingRotationTable;
use glam::{DQuat, DVec3};
use image::{GrayImage, RgbImage};
use rig_capture::{FacetImage, RigFrame};
use rig_data::{CameraExtrinsic, CameraSide, Facet};
use tracing::debug;

/// Relative pose of the lower facet camera seen from the upper one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoGeometry {
    /// Effective camera-to-body rotation of the upper camera.
    pub upper_rotation: DQuat,
    /// Effective camera-to-body rotation of the lower camera.
    pub lower_rotation: DQuat,
    /// Lower optical center minus upper, in the upper camera frame.
    pub baseline: DVec3,
    /// Upper-to-lower rotation.
    pub relative_rotation: DQuat,
}

impl StereoGeometry {
    /// Compose the mounting table with the current extrinsics.
    ///
    /// Extrinsics may drift under online calibration, so this is evaluated
    /// every tick.
    pub fn compute(
        table: &MountingRotationTable,
        facet: Facet,
        upper: &CameraExtrinsic,
        lower: &CameraExtrinsic,
    ) -> Self {
        let upper_rotation = table.compose_facet(upper, facet, CameraSide::Upper);
        let lower_rotation = table.compose_facet(lower, facet, CameraSide::Lower);
        let to_upper = upper_rotation.inverse();
        Self {
            upper_rotation,
            lower_rotation,
            baseline: to_upper * (lower.translation - upper.translation),
            relative_rotation: (to_upper * lower_rotation).normalize(),
        }
    }
}

/// Reoriented single-channel image pair plus its relative pose.
#[derive(Debug, Clone)]
pub struct SyntheticStereoPair {
    pub upper: GrayImage,
    pub lower: GrayImage,
    pub baseline: DVec3,
    pub relative_rotation: DQuat,
}

impl SyntheticStereoPair {
    pub fn dimensions(&self) -> (u32, u32) {
        self.upper.dimensions()
    }
}

/// Output of [`StereoFramePreparer::prepare`] for one facet.
#[derive(Debug, Clone)]
pub struct PreparedFacet {
    pub facet: Facet,
    pub pair: SyntheticStereoPair,
    /// Upper image in color, aligned pixel for pixel with the pair.
    pub color: RgbImage,
    pub geometry: StereoGeometry,
}

/// Turn a landscape capture into the portrait orientation the solver expects:
/// transpose, then flip top to bottom.
pub fn reorient_portrait<I: FacetImage>(image: &I) -> I {
    image.transpose().flip_vertical()
}

fn single_channel<I: FacetImage>(image: I) -> I {
    if image.channels() > 1 { image.to_gray() } else { image }
}

/// Builds the downsampled, reoriented pair for a facet.
#[derive(Debug, Clone, Copy)]
pub struct StereoFramePreparer {
    downsample_ratio: f64,
}

impl StereoFramePreparer {
    pub fn new(downsample_ratio: f64) -> Self {
        Self { downsample_ratio }
    }

    pub fn downsample_ratio(&self) -> f64 {
        self.downsample_ratio
    }

    pub fn prepare<I: FacetImage>(
        &self,
        table: &MountingRotationTable,
        facet: Facet,
        frame: &RigFrame<I>,
        upper: &CameraExtrinsic,
        lower: &CameraExtrinsic,
    ) -> Result<PreparedFacet, DepthError> {
        let slot = facet.image_slot();
        let upper_raw = frame
            .facet_image(CameraSide::Upper, slot)
            .ok_or(DepthError::MissingFacet {
                facet,
                camera: CameraSide::Upper,
                slot,
            })?;
        let lower_raw = frame
            .facet_image(CameraSide::Lower, slot)
            .ok_or(DepthError::MissingFacet {
                facet,
                camera: CameraSide::Lower,
                slot,
            })?;

        let upper_small = upper_raw.resize(self.downsample_ratio);
        let lower_small = lower_raw.resize(self.downsample_ratio);

        let color = reorient_portrait(&upper_small).download().to_rgb();
        let upper_gray = reorient_portrait(&single_channel(upper_small)).download().into_gray();
        let lower_gray = reorient_portrait(&single_channel(lower_small)).download().into_gray();

        if upper_gray.dimensions() != lower_gray.dimensions() {
            return Err(DepthError::PairMismatch {
                facet,
                upper: upper_gray.dimensions(),
                lower: lower_gray.dimensions(),
            });
        }

        let geometry = StereoGeometry::compute(table, facet, upper, lower);
        debug!(
            "Prepared {} pair {:?}, baseline {:?}",
            facet,
            upper_gray.dimensions(),
            geometry.baseline
        );

        Ok(PreparedFacet {
            facet,
            pair: SyntheticStereoPair {
                upper: upper_gray,
                lower: lower_gray,
                baseline: geometry.baseline,
                relative_rotation: geometry.relative_rotation,
            },
            color,
            geometry,
        })
    }
}
