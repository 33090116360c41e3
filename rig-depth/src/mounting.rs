//! Fixed mounting rotations of the fisheye rig.
//!
//! The side facets of each fisheye are arranged in 90° yaw steps around the
//! vertical (camera Y) axis. Facet images are captured landscape but the depth
//! solver works on portrait images, which costs a 90° turn about the optical
//! (Z) axis. The lower fisheye hangs upside down, a 180° turn about the
//! horizontal (X) axis.
//!
//! The effective rotation of a facet camera is
//! `extrinsic · facet(k) · axis_relabel · [lower_flip]`.

use glam::{DQuat, DVec3};
use rig_data::{CameraExtrinsic, CameraSide, Facet};
use std::f64::consts::{FRAC_PI_2, PI};

/// Rotation constants derived once from the rig geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct MountingRotationTable {
    yaw_step: DQuat,
    facets: [DQuat; Facet::COUNT],
    axis_relabel: DQuat,
    lower_flip: DQuat,
}

impl MountingRotationTable {
    pub fn new() -> Self {
        let yaw_step = DQuat::from_axis_angle(DVec3::Y, FRAC_PI_2);
        let mut facets = [DQuat::IDENTITY; Facet::COUNT];
        for k in 1..Facet::COUNT {
            facets[k] = (facets[k - 1] * yaw_step).normalize();
        }
        Self {
            yaw_step,
            facets,
            axis_relabel: DQuat::from_axis_angle(DVec3::Z, FRAC_PI_2),
            lower_flip: DQuat::from_axis_angle(DVec3::X, PI),
        }
    }

    /// The 90° yaw between neighbouring facets.
    pub fn yaw_step(&self) -> DQuat {
        self.yaw_step
    }

    /// Rotation of side facet `index` relative to facet 0. Indices wrap around
    /// the ring.
    pub fn facet_rotation(&self, index: usize) -> DQuat {
        self.facets[index % Facet::COUNT]
    }

    /// Landscape to portrait relabeling about the optical axis.
    pub fn axis_relabel(&self) -> DQuat {
        self.axis_relabel
    }

    /// Top/bottom flip of the lower fisheye.
    pub fn lower_flip(&self) -> DQuat {
        self.lower_flip
    }

    /// Effective camera-to-body rotation of one facet camera.
    pub fn compose_extrinsic(&self, extrinsic: &CameraExtrinsic, facet_index: usize, side: CameraSide) -> DQuat {
        let rotation = extrinsic.rotation * self.facet_rotation(facet_index) * self.axis_relabel;
        let rotation = match side {
            CameraSide::Upper => rotation,
            CameraSide::Lower => rotation * self.lower_flip,
        };
        rotation.normalize()
    }

    pub fn compose_facet(&self, extrinsic: &CameraExtrinsic, facet: Facet, side: CameraSide) -> DQuat {
        self.compose_extrinsic(extrinsic, facet.ring_index(), side)
    }
}

impl Default for MountingRotationTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn close(a: DVec3, b: DVec3) -> bool {
        a.abs_diff_eq(b, EPS)
    }

    #[test]
    fn test_facet_zero_is_identity() {
        let table = MountingRotationTable::new();
        assert!(table.facet_rotation(0).abs_diff_eq(DQuat::IDENTITY, EPS));
    }

    #[test]
    fn test_yaw_step_on_basis_vectors() {
        let table = MountingRotationTable::new();
        let step = table.yaw_step();
        assert!(close(step * DVec3::X, -DVec3::Z));
        assert!(close(step * DVec3::Z, DVec3::X));
        assert!(close(step * DVec3::Y, DVec3::Y));
    }

    #[test]
    fn test_facet_k_is_k_yaw_steps() {
        let table = MountingRotationTable::new();
        for k in 0..Facet::COUNT {
            let mut expected = DQuat::IDENTITY;
            for _ in 0..k {
                expected = expected * table.yaw_step();
            }
            for basis in [DVec3::X, DVec3::Y, DVec3::Z] {
                assert!(close(table.facet_rotation(k) * basis, expected * basis));
            }
        }
        assert!(close(table.facet_rotation(2) * DVec3::X, -DVec3::X));
        assert!(close(table.facet_rotation(4) * DVec3::X, DVec3::X));
    }

    #[test]
    fn test_lower_flip_is_half_turn_roll() {
        let table = MountingRotationTable::new();
        let flip = table.lower_flip();
        assert!(close(flip * DVec3::X, DVec3::X));
        assert!(close(flip * DVec3::Y, -DVec3::Y));
        assert!(close(flip * DVec3::Z, -DVec3::Z));
    }

    #[test]
    fn test_axis_relabel_turns_about_optical_axis() {
        let table = MountingRotationTable::new();
        let relabel = table.axis_relabel();
        assert!(close(relabel * DVec3::X, DVec3::Y));
        assert!(close(relabel * DVec3::Y, -DVec3::X));
        assert!(close(relabel * DVec3::Z, DVec3::Z));
    }

    #[test]
    fn test_compose_order() {
        let table = MountingRotationTable::new();
        let extrinsic = CameraExtrinsic::new(DQuat::from_rotation_z(0.3), DVec3::ZERO);
        let upper = table.compose_extrinsic(&extrinsic, 1, CameraSide::Upper);
        let lower = table.compose_extrinsic(&extrinsic, 1, CameraSide::Lower);
        let expected_upper = extrinsic.rotation * table.facet_rotation(1) * table.axis_relabel();
        let expected_lower = expected_upper * table.lower_flip();
        for basis in [DVec3::X, DVec3::Y, DVec3::Z] {
            assert!(close(upper * basis, expected_upper * basis));
            assert!(close(lower * basis, expected_lower * basis));
        }
    }

    #[test]
    fn test_compose_is_call_order_independent() {
        let table = MountingRotationTable::new();
        let extrinsic = CameraExtrinsic::new(DQuat::from_rotation_y(-0.7), DVec3::ONE);
        let first = table.compose_facet(&extrinsic, Facet::Front, CameraSide::Lower);
        let _ = table.compose_facet(&extrinsic, Facet::Right, CameraSide::Upper);
        let second = table.compose_facet(&extrinsic, Facet::Front, CameraSide::Lower);
        assert_eq!(first, second);
    }
}
