//! Dense depth fields returned by the stereo solver.

use crate::error::DataError;
use glam::Vec3;
use image::{ImageBuffer, Luma};

/// Points at or below this depth are treated as unresolved or implausibly close.
pub const MIN_VALID_DEPTH: f32 = 0.2;

/// Encoding tag attached to published depth images.
pub const DEPTH_IMAGE_ENCODING: &str = "32FC1";

/// Single-channel floating point depth image.
pub type DepthImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Whether a local depth value passes the sentinel check.
#[inline]
pub fn is_valid_depth(z: f32) -> bool {
    z > MIN_VALID_DEPTH
}

/// Row-major grid of local 3D points, one per pixel of the stereo pair.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthField {
    width: u32,
    height: u32,
    points: Vec<Vec3>,
}

impl DepthField {
    /// Wrap a row-major point buffer.
    pub fn new(width: u32, height: u32, points: Vec<Vec3>) -> Result<Self, DataError> {
        let expected = width as usize * height as usize;
        if points.len() != expected {
            return Err(DataError::LengthMismatch {
                width,
                height,
                expected,
                actual: points.len(),
            });
        }
        Ok(Self {
            width,
            height,
            points,
        })
    }

    /// Build a field by evaluating `f(u, v)` at every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Vec3) -> Self {
        let mut points = Vec::with_capacity(width as usize * height as usize);
        for v in 0..height {
            for u in 0..width {
                points.push(f(u, v));
            }
        }
        Self {
            width,
            height,
            points,
        }
    }

    /// Field with the same point at every pixel.
    pub fn filled(width: u32, height: u32, point: Vec3) -> Self {
        Self::from_fn(width, height, |_, _| point)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// (width, height), matching `image::GenericImageView::dimensions`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Local point at column `u`, row `v`.
    pub fn get(&self, u: u32, v: u32) -> Option<Vec3> {
        if u >= self.width || v >= self.height {
            return None;
        }
        self.points
            .get(v as usize * self.width as usize + u as usize)
            .copied()
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Number of pixels passing the depth sentinel.
    pub fn valid_count(&self) -> usize {
        self.points.iter().filter(|p| is_valid_depth(p.z)).count()
    }

    /// Per-pixel local z, with invalid pixels set to zero.
    pub fn to_depth_image(&self) -> DepthImage {
        ImageBuffer::from_fn(self.width, self.height, |u, v| {
            let z = self.get(u, v).map(|p| p.z).unwrap_or(0.0);
            Luma([if is_valid_depth(z) { z } else { 0.0 }])
        })
    }
}
