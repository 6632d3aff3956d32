//! Rotation matrix <-> quaternion conversion between the ephemeris convention
//! (scalar-first) and the renderer convention (vector-first, trailing scalar).
//!
//! Rotation matrices follow the ephemeris-toolkit meaning: `pxform(from, to)`
//! maps coordinates expressed in `from` into `to`. Converted with
//! [`matrix_to_quaternion`] they give a scalar-first quaternion whose standard
//! (Hamilton) rotation matrix is the input matrix. Scene nodes need the
//! opposite sense (local -> parent), which is the conjugate: that is what
//! [`EphemerisQuat::to_renderer`] produces.

use glam::{DMat3, DQuat, DVec3};
use std::f64::consts::PI;

use crate::constants::ROTATION_TOLERANCE;
use crate::error::{CoreError, CoreResult};

/// Coordinate axis used by elementary frame rotations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Scalar-first unit quaternion as produced from ephemeris rotation matrices
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EphemerisQuat {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl EphemerisQuat {
    pub const IDENTITY: Self = Self { w: 1.0, x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    pub fn norm(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Rotation matrix of this quaternion (inverse of [`matrix_to_quaternion`])
    pub fn to_matrix(&self) -> DMat3 {
        let (w, x, y, z) = (self.w, self.x, self.y, self.z);
        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);

        from_rows(
            [1.0 - 2.0 * (yy + zz), 2.0 * (xy - wz), 2.0 * (xz + wy)],
            [2.0 * (xy + wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz - wx)],
            [2.0 * (xz - wy), 2.0 * (yz + wx), 1.0 - 2.0 * (xx + yy)],
        )
    }

    /// Renderer convention: vector part negated, scalar moved last.
    /// `(w, x, y, z) -> (-x, -y, -z, w)`
    pub fn to_renderer(&self) -> DQuat {
        DQuat::from_xyzw(-self.x, -self.y, -self.z, self.w)
    }

    /// Exact inverse of [`Self::to_renderer`]
    pub fn from_renderer(q: DQuat) -> Self {
        Self::new(q.w, -q.x, -q.y, -q.z)
    }
}

/// Build a matrix from rows (glam stores columns)
pub fn from_rows(r0: [f64; 3], r1: [f64; 3], r2: [f64; 3]) -> DMat3 {
    DMat3::from_cols(
        DVec3::new(r0[0], r1[0], r2[0]),
        DVec3::new(r0[1], r1[1], r2[1]),
        DVec3::new(r0[2], r1[2], r2[2]),
    )
}

#[inline]
fn at(m: &DMat3, row: usize, col: usize) -> f64 {
    m.col(col)[row]
}

/// Check determinant +1 and orthonormal columns within `tolerance`
pub fn is_rotation(m: &DMat3, tolerance: f64) -> bool {
    let (det, ortho) = rotation_defects(m);
    (det - 1.0).abs() <= tolerance && ortho <= tolerance
}

fn rotation_defects(m: &DMat3) -> (f64, f64) {
    let gram = m.transpose() * *m;
    let mut ortho: f64 = 0.0;
    for c in 0..3 {
        for r in 0..3 {
            let expected = if r == c { 1.0 } else { 0.0 };
            ortho = ortho.max((at(&gram, r, c) - expected).abs());
        }
    }
    (m.determinant(), ortho)
}

/// Convert a rotation matrix to a scalar-first quaternion.
///
/// Uses the largest of the four squared-component estimates to pick the
/// branch, so traces near -1 never divide by a near-zero scalar part.
/// The returned quaternion has a non-negative scalar part.
pub fn matrix_to_quaternion(m: &DMat3) -> CoreResult<EphemerisQuat> {
    if !m.is_finite() {
        return Err(CoreError::NonFinite("rotation matrix"));
    }
    let (determinant, orthogonality) = rotation_defects(m);
    if (determinant - 1.0).abs() > ROTATION_TOLERANCE || orthogonality > ROTATION_TOLERANCE {
        return Err(CoreError::NotARotation { determinant, orthogonality });
    }

    let (m11, m12, m13) = (at(m, 0, 0), at(m, 0, 1), at(m, 0, 2));
    let (m21, m22, m23) = (at(m, 1, 0), at(m, 1, 1), at(m, 1, 2));
    let (m31, m32, m33) = (at(m, 2, 0), at(m, 2, 1), at(m, 2, 2));

    let trace = m11 + m22 + m33;
    let mtrace = 1.0 - trace;

    // 4x the squares of w, x, y, z; they sum to 4 so at least one is >= 1
    let cc4 = 1.0 + trace;
    let s114 = mtrace + 2.0 * m11;
    let s224 = mtrace + 2.0 * m22;
    let s334 = mtrace + 2.0 * m33;

    let q = if cc4 >= 1.0 {
        let w = (cc4 * 0.25).sqrt();
        let f = 1.0 / (4.0 * w);
        EphemerisQuat::new(w, (m32 - m23) * f, (m13 - m31) * f, (m21 - m12) * f)
    } else if s114 >= 1.0 {
        let x = (s114 * 0.25).sqrt();
        let f = 1.0 / (4.0 * x);
        EphemerisQuat::new((m32 - m23) * f, x, (m12 + m21) * f, (m13 + m31) * f)
    } else if s224 >= 1.0 {
        let y = (s224 * 0.25).sqrt();
        let f = 1.0 / (4.0 * y);
        EphemerisQuat::new((m13 - m31) * f, (m12 + m21) * f, y, (m23 + m32) * f)
    } else {
        let z = (s334 * 0.25).sqrt();
        let f = 1.0 / (4.0 * z);
        EphemerisQuat::new((m21 - m12) * f, (m13 + m31) * f, (m23 + m32) * f, z)
    };

    if q.w < 0.0 {
        Ok(EphemerisQuat::new(-q.w, -q.x, -q.y, -q.z))
    } else {
        Ok(q)
    }
}

/// Frame rotation by `angle` about `axis` (coordinates of a fixed vector in
/// the rotated frame), e.g. about X: `[[1,0,0],[0,c,s],[0,-s,c]]`
pub fn rotation_about(angle: f64, axis: Axis) -> DMat3 {
    let (s, c) = angle.sin_cos();
    match axis {
        Axis::X => from_rows([1.0, 0.0, 0.0], [0.0, c, s], [0.0, -s, c]),
        Axis::Y => from_rows([c, 0.0, -s], [0.0, 1.0, 0.0], [s, 0.0, c]),
        Axis::Z => from_rows([c, s, 0.0], [-s, c, 0.0], [0.0, 0.0, 1.0]),
    }
}

/// Euler angles to matrix: `[a3]ax3 * [a2]ax2 * [a1]ax1` for
/// `angles = [a3, a2, a1]`, `axes = [ax3, ax2, ax1]`
pub fn euler_to_matrix(angles: [f64; 3], axes: [Axis; 3]) -> DMat3 {
    rotation_about(angles[0], axes[0])
        * rotation_about(angles[1], axes[1])
        * rotation_about(angles[2], axes[2])
}

/// 180 deg about X: turns an instrument +Z boresight into the renderer's -Z look axis
pub fn boresight_flip() -> DMat3 {
    euler_to_matrix([PI, 0.0, 0.0], [Axis::X, Axis::Y, Axis::Z])
}
