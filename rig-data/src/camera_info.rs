//! Camera calibration records for external stereo backends.

use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

/// Intrinsic, projection and rectification matrices of one synthetic camera.
///
/// Matrices are stored row-major, the layout stereo tooling expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticCameraInfo {
    pub frame_id: String,
    pub timestamp: f64,
    pub width: u32,
    pub height: u32,
    /// 3x3 intrinsic matrix.
    pub k: [f64; 9],
    /// 3x4 projection matrix.
    pub p: [f64; 12],
    /// 3x3 rectification rotation.
    pub r: [f64; 9],
}

impl SyntheticCameraInfo {
    /// Build from an intrinsic matrix with `P = [K | 0]` and `R = I`.
    pub fn from_intrinsics(frame_id: impl Into<String>, timestamp: f64, width: u32, height: u32, k: DMat3) -> Self {
        let k_rows = row_major(k);
        let mut p = [0.0; 12];
        for row in 0..3 {
            p[row * 4..row * 4 + 3].copy_from_slice(&k_rows[row * 3..row * 3 + 3]);
        }
        Self {
            frame_id: frame_id.into(),
            timestamp,
            width,
            height,
            k: k_rows,
            p,
            r: row_major(DMat3::IDENTITY),
        }
    }

    pub fn set_rotation(&mut self, rotation: DMat3) {
        self.r = row_major(rotation);
    }

    /// Projection matrix entry at `(row, col)`.
    pub fn projection(&self, row: usize, col: usize) -> f64 {
        self.p[row * 4 + col]
    }

    pub fn set_projection(&mut self, row: usize, col: usize, value: f64) {
        self.p[row * 4 + col] = value;
    }

    pub fn intrinsic_matrix(&self) -> DMat3 {
        from_row_major(&self.k)
    }

    pub fn rotation_matrix(&self) -> DMat3 {
        from_row_major(&self.r)
    }
}

fn row_major(m: DMat3) -> [f64; 9] {
    m.transpose().to_cols_array()
}

fn from_row_major(rows: &[f64; 9]) -> DMat3 {
    DMat3::from_cols(
        DVec3::new(rows[0], rows[3], rows[6]),
        DVec3::new(rows[1], rows[4], rows[7]),
        DVec3::new(rows[2], rows[5], rows[8]),
    )
}
