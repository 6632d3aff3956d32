//! Directional light frame whose +Z axis points toward the illumination source

use glam::{DMat3, DQuat, DVec3};

use crate::constants::{COLINEAR_TOLERANCE, LIGHT_REFERENCE_UP, MIN_DIRECTION_NORM};
use crate::error::{CoreError, CoreResult};
use crate::rotation::matrix_to_quaternion;

/// Right-handed orthonormal basis with `z` toward the light source
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightBasis {
    pub x: DVec3,
    pub y: DVec3,
    pub z: DVec3,
}

impl LightBasis {
    /// Build the basis from a direction toward the source (any non-zero length).
    ///
    /// `x` is the reference up axis with its `z` component projected out,
    /// `y = z × x`. Fails when the direction is colinear with the reference axis.
    pub fn from_direction(direction: DVec3) -> CoreResult<Self> {
        if !direction.is_finite() {
            return Err(CoreError::NonFinite("light direction"));
        }
        let norm = direction.length();
        if norm < MIN_DIRECTION_NORM {
            return Err(CoreError::ZeroVector("light direction"));
        }
        let z = direction / norm;

        let x_raw = LIGHT_REFERENCE_UP - LIGHT_REFERENCE_UP.dot(z) * z;
        let x_norm = x_raw.length();
        if x_norm < COLINEAR_TOLERANCE {
            return Err(CoreError::DegenerateLightBasis { norm: x_norm });
        }
        let x = x_raw / x_norm;
        let y = z.cross(x);

        Ok(Self { x, y, z })
    }

    /// Basis matrix with columns `x, y, z` (light-local -> scene)
    pub fn matrix(&self) -> DMat3 {
        DMat3::from_cols(self.x, self.y, self.z)
    }

    /// Light node orientation in renderer convention.
    ///
    /// The basis matrix is inverted (transposed) before the ephemeris-style
    /// conversion; the renderer flip then yields a node rotation that carries
    /// local +Z onto the source direction.
    pub fn orientation(&self) -> CoreResult<DQuat> {
        let q = matrix_to_quaternion(&self.matrix().transpose())?;
        Ok(q.to_renderer())
    }
}
