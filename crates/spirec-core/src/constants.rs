use glam::DVec3;

/// Reference "up" axis projected out of the light direction to seed the light basis
pub const LIGHT_REFERENCE_UP: DVec3 = DVec3::Z;

/// Below this norm the projected reference axis is treated as colinear with the light
pub const COLINEAR_TOLERANCE: f64 = 1e-8;

/// Allowed deviation from orthonormality / unit determinant for rotation matrices
pub const ROTATION_TOLERANCE: f64 = 1e-6;

/// Shortest direction vector accepted for normalization
pub const MIN_DIRECTION_NORM: f64 = 1e-12;
