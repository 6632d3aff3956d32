//! Geometry core: orientation conventions, light frames and time sampling.

pub mod constants;
pub mod error;
pub mod light;
pub mod rotation;
pub mod sampling;

#[cfg(test)]
mod tests;

pub use error::{CoreError, CoreResult};
pub use light::LightBasis;
pub use rotation::{
    boresight_flip, euler_to_matrix, is_rotation, matrix_to_quaternion, rotation_about, Axis,
    EphemerisQuat,
};
pub use sampling::uniform_samples;
