//! Pose and facet types for the multi-facet fisheye rig.
//!
//! Rotations are unit quaternions and translations are in the length units of
//! the rig calibration. Everything here is `f64`: these values are composed
//! several times per tick and feed the epipolar geometry of the stereo solver.

use glam::{DMat3, DQuat, DVec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the fixed viewing directions around the fisheye side ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facet {
    Left,
    Front,
    Right,
    Rear,
}

impl Facet {
    /// Number of facets around the side ring.
    pub const COUNT: usize = 4;

    /// Position of the facet around the side ring, in 90° yaw steps from `Left`.
    pub fn ring_index(self) -> usize {
        match self {
            Facet::Left => 0,
            Facet::Front => 1,
            Facet::Right => 2,
            Facet::Rear => 3,
        }
    }

    /// Slot of the facet in a per-camera image set.
    ///
    /// Slot 0 holds the top (center) view of the fisheye, so side facets are
    /// shifted by one.
    pub fn image_slot(self) -> usize {
        self.ring_index() + 1
    }

    /// Lowercase name used in frame ids and file names.
    pub fn name(self) -> &'static str {
        match self {
            Facet::Left => "left",
            Facet::Front => "front",
            Facet::Right => "right",
            Facet::Rear => "rear",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Facet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Facet::Left),
            "front" => Ok(Facet::Front),
            "right" => Ok(Facet::Right),
            "rear" => Ok(Facet::Rear),
            other => Err(format!("unknown facet '{}'", other)),
        }
    }
}

/// Which fisheye of a stacked pairing a camera belongs to.
///
/// The lower fisheye is mounted upside down relative to the upper one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraSide {
    Upper,
    Lower,
}

impl fmt::Display for CameraSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraSide::Upper => f.write_str("upper"),
            CameraSide::Lower => f.write_str("lower"),
        }
    }
}

/// Pose of the vehicle body in the world frame at one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigPose {
    /// Body-to-world rotation.
    pub rotation: DQuat,
    /// Body origin in world coordinates.
    pub translation: DVec3,
    /// Timestamp in seconds.
    pub timestamp: f64,
}

impl RigPose {
    pub fn new(rotation: DQuat, translation: DVec3, timestamp: f64) -> Self {
        Self {
            rotation,
            translation,
            timestamp,
        }
    }

    /// Body frame coincident with the world frame.
    pub fn identity(timestamp: f64) -> Self {
        Self::new(DQuat::IDENTITY, DVec3::ZERO, timestamp)
    }

    /// Map a body-frame point into the world frame.
    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.rotation * point + self.translation
    }
}

/// Rotation and translation of a logical camera relative to the body frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraExtrinsic {
    /// Camera-to-body rotation.
    pub rotation: DQuat,
    /// Camera optical center in body coordinates.
    pub translation: DVec3,
}

impl CameraExtrinsic {
    pub fn new(rotation: DQuat, translation: DVec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(DQuat::IDENTITY, DVec3::ZERO)
    }

    /// Build from a rotation matrix, as calibration tools usually report it.
    pub fn from_matrix(rotation: DMat3, translation: DVec3) -> Self {
        Self::new(DQuat::from_mat3(&rotation).normalize(), translation)
    }
}

impl Default for CameraExtrinsic {
    fn default() -> Self {
        Self::identity()
    }
}

/// World pose of a camera, published for visualization tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraPoseRecord {
    pub parent_frame: String,
    pub child_frame: String,
    pub translation: DVec3,
    pub rotation: DQuat,
    pub timestamp: f64,
}
