//! Colored world-frame point clouds.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Pack an 8-bit color triplet as `R<<16 | G<<8 | B`.
#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Inverse of [`pack_rgb`]. The high byte is ignored.
#[inline]
pub fn unpack_rgb(packed: u32) -> [u8; 3] {
    [
        ((packed >> 16) & 0xff) as u8,
        ((packed >> 8) & 0xff) as u8,
        (packed & 0xff) as u8,
    ]
}

/// One projected point.
/// Layout is fixed so transports can ship a cloud as raw bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize)]
pub struct WorldPoint {
    /// Position in the world frame.
    pub position: [f32; 3],
    /// Packed color, see [`pack_rgb`].
    pub rgb: u32,
    /// Source pixel column in the stereo pair.
    pub u: u32,
    /// Source pixel row in the stereo pair.
    pub v: u32,
}

impl WorldPoint {
    pub fn new(position: Vec3, rgb: u32, u: u32, v: u32) -> Self {
        Self {
            position: position.to_array(),
            rgb,
            u,
            v,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn color(&self) -> [u8; 3] {
        unpack_rgb(self.rgb)
    }

    /// Packed color reinterpreted as an `f32`, for float-only point channels.
    pub fn rgb_as_f32(&self) -> f32 {
        f32::from_bits(self.rgb)
    }
}

/// Points projected from one depth field during one tick.
///
/// Order is the scan order of the projector. Duplicate positions are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldPointCloud {
    pub frame_id: String,
    pub timestamp: f64,
    pub points: Vec<WorldPoint>,
}

impl WorldPointCloud {
    pub const WORLD_FRAME: &'static str = "world";

    pub fn new(timestamp: f64) -> Self {
        Self::with_capacity(timestamp, 0)
    }

    pub fn with_capacity(timestamp: f64, capacity: usize) -> Self {
        Self {
            frame_id: Self::WORLD_FRAME.to_string(),
            timestamp,
            points: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, point: WorldPoint) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorldPoint> {
        self.points.iter()
    }

    /// Raw point records, 24 bytes each.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_layout() {
        assert_eq!(pack_rgb(0x12, 0x34, 0x56), 0x0012_3456);
        assert_eq!(pack_rgb(255, 0, 0), 0x00ff_0000);
        assert_eq!(pack_rgb(0, 0, 255), 0x0000_00ff);
    }

    #[test]
    fn test_pack_unpack_round_trip() {
        for r in (0..=255u8).step_by(17) {
            for g in (0..=255u8).step_by(15) {
                for b in [0u8, 1, 127, 128, 254, 255] {
                    assert_eq!(unpack_rgb(pack_rgb(r, g, b)), [r, g, b]);
                }
            }
        }
    }

    #[test]
    fn test_rgb_float_reinterpretation_keeps_bits() {
        let p = WorldPoint::new(Vec3::ZERO, pack_rgb(10, 20, 30), 0, 0);
        assert_eq!(p.rgb_as_f32().to_bits(), p.rgb);
    }

    #[test]
    fn test_cloud_bytes_layout() {
        let mut cloud = WorldPointCloud::new(1.0);
        cloud.push(WorldPoint::new(Vec3::new(1.0, 2.0, 3.0), 7, 4, 5));
        cloud.push(WorldPoint::new(Vec3::ONE, 8, 6, 7));
        assert_eq!(std::mem::size_of::<WorldPoint>(), 24);
        assert_eq!(cloud.as_bytes().len(), 48);
        assert_eq!(cloud.frame_id, "world");
    }
}
