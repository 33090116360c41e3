//! Boundary to the external dense stereo solver.

use crate::error::SolverError;
use glam::{DMat3, DQuat, DVec3};
use image::GrayImage;
use rig_data::DepthField;

/// Relative pose and intrinsics handed to the solver with an image pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthRequest {
    /// Negated baseline, in the upper camera frame.
    pub translation: DVec3,
    /// Upper-to-lower rotation.
    pub rotation: DQuat,
    /// Intrinsic matrix of the reoriented images.
    pub intrinsics: DMat3,
    /// Ask the solver for its own diagnostics.
    pub debug: bool,
}

/// Dense depth estimation from a synthetic stereo pair.
///
/// Implementations return one local 3D point per pixel of `upper`, in the
/// upper camera frame. Unresolved pixels should carry z ≤ 0.2.
pub trait DepthSolver {
    fn compute_depth_cloud(
        &mut self,
        request: &DepthRequest,
        upper: &GrayImage,
        lower: &GrayImage,
    ) -> Result<DepthField, SolverError>;
}

impl<F> DepthSolver for F
where
    F: FnMut(&DepthRequest, &GrayImage, &GrayImage) -> Result<DepthField, SolverError>,
{
    fn compute_depth_cloud(
        &mut self,
        request: &DepthRequest,
        upper: &GrayImage,
        lower: &GrayImage,
    ) -> Result<DepthField, SolverError> {
        self(request, upper, lower)
    }
}
