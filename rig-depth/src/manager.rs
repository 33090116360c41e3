//! Per-tick orchestration of facet stereo depth.

use crate::calibration::{SyntheticIntrinsics, build_stereo_camera_info, facet_frame_id};
use crate::config::{DepthConfig, RigCalibration, SideIntrinsics};
use crate::error::DepthError;
use crate::mounting::MountingRotationTable;
use crate::projector::{CameraToWorld, project_to_world};
use crate::sink::{DepthSinks, StereoExport};
use crate::solver::{DepthRequest, DepthSolver};
use crate::stereo::{PreparedFacet, StereoFramePreparer};
use rig_capture::{FacetImage, RigFrame, RigSource};
use rig_data::{CameraExtrinsic, CameraPoseRecord, DepthImage, Facet, RigPose, WorldPointCloud};
use std::num::NonZeroUsize;
use tracing::{debug, info, warn};

/// Per-facet outcome of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacetReport {
    pub facet: Facet,
    /// Points in the published cloud.
    pub points: usize,
    /// Pixels of the depth field passing the depth sentinel.
    pub valid_depth: usize,
}

/// Totals of [`DepthCamManager::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: usize,
    pub skipped: usize,
    pub points: usize,
}

/// Everything computed for one facet, held back until the whole tick succeeded.
struct FacetOutput {
    facet: Facet,
    cloud: WorldPointCloud,
    depth_image: Option<DepthImage>,
    stereo: Option<StereoExport>,
    pose: Option<CameraPoseRecord>,
    valid_depth: usize,
}

/// Drives the stereo preparer, the external solver and the projector for a
/// stacked fisheye pair.
///
/// Rotation constants and intrinsics are fixed at construction. The tick entry
/// point takes `&mut self`, so overlapping ticks on one manager are ruled out.
pub struct DepthCamManager {
    table: MountingRotationTable,
    intrinsics: SyntheticIntrinsics,
    config: DepthConfig,
    preparer: StereoFramePreparer,
    stride: NonZeroUsize,
    solver: Box<dyn DepthSolver>,
    sinks: DepthSinks,
}

impl DepthCamManager {
    pub fn new(
        side: SideIntrinsics,
        config: DepthConfig,
        solver: impl DepthSolver + 'static,
        sinks: DepthSinks,
    ) -> Result<Self, DepthError> {
        side.validate()?;
        config.validate()?;
        let stride = config.stride()?;
        let intrinsics = SyntheticIntrinsics::from_side(&side, config.downsample_ratio);

        info!(
            "Depth manager: facets {:?}, ratio {}, stride {}, raw stereo {}",
            config.enabled_facets(),
            config.downsample_ratio,
            stride,
            config.publish_raw_stereo
        );
        debug!("Synthetic intrinsics: {:?}", intrinsics);

        Ok(Self {
            table: MountingRotationTable::new(),
            intrinsics,
            preparer: StereoFramePreparer::new(config.downsample_ratio),
            config,
            stride,
            solver: Box::new(solver),
            sinks,
        })
    }

    pub fn from_calibration(
        calibration: &RigCalibration,
        solver: impl DepthSolver + 'static,
        sinks: DepthSinks,
    ) -> Result<Self, DepthError> {
        Self::new(calibration.side, calibration.depth.clone(), solver, sinks)
    }

    pub fn config(&self) -> &DepthConfig {
        &self.config
    }

    pub fn intrinsics(&self) -> &SyntheticIntrinsics {
        &self.intrinsics
    }

    pub fn table(&self) -> &MountingRotationTable {
        &self.table
    }

    /// Process one rig frame.
    ///
    /// Nothing is published unless every enabled facet succeeds. A
    /// [`DepthError::MissingFacet`] and [`DepthError::PairMismatch`] mean the
    /// tick should be skipped.
    #[tracing::instrument(skip_all, fields(frame = frame.frame_number, t = frame.timestamp()))]
    pub fn update_images<I: FacetImage>(
        &mut self,
        frame: &RigFrame<I>,
        upper: &CameraExtrinsic,
        lower: &CameraExtrinsic,
    ) -> Result<Vec<FacetReport>, DepthError> {
        let prepared = self
            .config
            .enabled_facets()
            .into_iter()
            .map(|facet| self.preparer.prepare(&self.table, facet, frame, upper, lower))
            .collect::<Result<Vec<_>, _>>()?;

        let mut outputs = Vec::with_capacity(prepared.len());
        for facet in prepared {
            outputs.push(self.process_facet(facet, &frame.pose, upper)?);
        }

        self.publish(outputs)
    }

    /// Drain `source`, skipping ticks whose facet images are missing or
    /// cannot be paired.
    pub fn run<S: RigSource>(
        &mut self,
        source: &mut S,
        upper: &CameraExtrinsic,
        lower: &CameraExtrinsic,
    ) -> Result<RunSummary, DepthError> {
        let mut summary = RunSummary::default();
        while let Some(frame) = source.next_frame()? {
            summary.ticks += 1;
            match self.update_images(&frame, upper, lower) {
                Ok(reports) => summary.points += reports.iter().map(|r| r.points).sum::<usize>(),
                Err(err @ (DepthError::MissingFacet { .. } | DepthError::PairMismatch { .. })) => {
                    warn!("Skipping frame {}: {}", frame.frame_number, err);
                    summary.skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }
        info!(
            "Processed {} ticks ({} skipped), {} points",
            summary.ticks, summary.skipped, summary.points
        );
        Ok(summary)
    }

    fn process_facet(
        &mut self,
        prepared: PreparedFacet,
        pose: &RigPose,
        upper: &CameraExtrinsic,
    ) -> Result<FacetOutput, DepthError> {
        let PreparedFacet {
            facet,
            pair,
            color,
            geometry,
        } = prepared;

        let request = DepthRequest {
            translation: -pair.baseline,
            rotation: pair.relative_rotation,
            intrinsics: self.intrinsics.matrix(),
            debug: self.config.solver_debug,
        };
        let depth = self
            .solver
            .compute_depth_cloud(&request, &pair.upper, &pair.lower)?;
        if depth.dimensions() != pair.dimensions() {
            warn!(
                "Solver returned {:?} depth field for {:?} {} pair",
                depth.dimensions(),
                pair.dimensions(),
                facet
            );
        }

        let camera_to_world = CameraToWorld::from_rig(pose, geometry.upper_rotation, upper);
        let cloud = project_to_world(&depth, &camera_to_world, &color, self.stride, pose.timestamp);
        let frame_id = facet_frame_id(facet);

        let stereo = self.config.publish_raw_stereo.then(|| {
            let (width, height) = pair.dimensions();
            let intrinsics = SyntheticIntrinsics {
                width,
                height,
                ..self.intrinsics
            };
            let (upper_info, lower_info) = build_stereo_camera_info(
                &intrinsics,
                pair.baseline,
                pair.relative_rotation,
                &frame_id,
                pose.timestamp,
            );
            StereoExport {
                upper_info,
                lower_info,
                upper_image: pair.upper.clone(),
                lower_image: pair.lower.clone(),
            }
        });

        let camera_pose = self.config.publish_camera_pose.then(|| CameraPoseRecord {
            parent_frame: WorldPointCloud::WORLD_FRAME.to_string(),
            child_frame: frame_id.clone(),
            translation: camera_to_world.translation,
            rotation: camera_to_world.rotation_quat(),
            timestamp: pose.timestamp,
        });

        Ok(FacetOutput {
            facet,
            depth_image: self.config.publish_depth_image.then(|| depth.to_depth_image()),
            valid_depth: depth.valid_count(),
            cloud,
            stereo,
            pose: camera_pose,
        })
    }

    fn publish(&mut self, outputs: Vec<FacetOutput>) -> Result<Vec<FacetReport>, DepthError> {
        let mut reports = Vec::with_capacity(outputs.len());
        for output in outputs {
            let timestamp = output.cloud.timestamp;
            if let Some(export) = &output.stereo {
                self.sinks.image.publish_stereo(output.facet, export)?;
            }
            self.sinks.cloud.publish_cloud(output.facet, &output.cloud)?;
            if let Some(image) = &output.depth_image {
                self.sinks
                    .image
                    .publish_depth_image(output.facet, image, timestamp)?;
            }
            if let Some(record) = &output.pose {
                self.sinks.transform.publish_pose(record)?;
            }

            debug!(
                "{}: {} points from {} valid pixels",
                output.facet,
                output.cloud.len(),
                output.valid_depth
            );
            reports.push(FacetReport {
                facet: output.facet,
                points: output.cloud.len(),
                valid_depth: output.valid_depth,
            });
        }
        Ok(reports)
    }
}
