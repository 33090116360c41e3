//! Stand-in depth solver for dry runs without a stereo backend.

use glam::Vec3;
use image::GrayImage;
use rig_data::DepthField;
use rig_depth::{DepthRequest, DepthSolver, SolverError};
use tracing::debug;

/// Reports every pixel on a fronto-parallel plane at a fixed depth.
#[derive(Debug, Clone, Copy)]
pub struct PlaneDepthSolver {
    depth: f32,
}

impl PlaneDepthSolver {
    pub fn new(depth: f32) -> Self {
        Self { depth }
    }
}

impl DepthSolver for PlaneDepthSolver {
    fn compute_depth_cloud(
        &mut self,
        request: &DepthRequest,
        upper: &GrayImage,
        lower: &GrayImage,
    ) -> Result<DepthField, SolverError> {
        if upper.dimensions() != lower.dimensions() {
            return Err(SolverError(format!(
                "pair size mismatch: {:?} vs {:?}",
                upper.dimensions(),
                lower.dimensions()
            )));
        }

        let k = request.intrinsics;
        let (f, cx, cy) = (k.x_axis.x as f32, k.z_axis.x as f32, k.z_axis.y as f32);
        if f <= 0.0 {
            return Err(SolverError(format!("invalid focal length {}", f)));
        }
        if request.debug {
            debug!(
                "Plane solver: depth {}, baseline {:?}, {:?}",
                self.depth,
                -request.translation,
                upper.dimensions()
            );
        }

        let z = self.depth;
        let (width, height) = upper.dimensions();
        Ok(DepthField::from_fn(width, height, |u, v| {
            Vec3::new((u as f32 - cx) / f * z, (v as f32 - cy) / f * z, z)
        }))
    }
}
