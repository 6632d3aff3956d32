use approx::assert_relative_eq;
use glam::{DMat3, DQuat, DVec3};
use std::f64::consts::{FRAC_PI_2, PI};

use crate::error::CoreError;
use crate::light::LightBasis;
use crate::rotation::*;
use crate::sampling::uniform_samples;

/// Deterministic pseudo-random stream in [0, 1)
fn lcg(seed: u64) -> impl FnMut() -> f64 {
    let mut state = seed;
    move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn sampled_rotations(count: usize) -> Vec<DMat3> {
    let mut rand = lcg(7);
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let axis = DVec3::new(rand() - 0.5, rand() - 0.5, rand() - 0.5).normalize();
        let angle = (rand() * 2.0 - 1.0) * PI;
        out.push(DMat3::from_axis_angle(axis, angle));
    }
    // Traces at and near -1 (half turns) exercise the non-scalar branches
    out.push(rotation_about(PI, Axis::X));
    out.push(rotation_about(PI, Axis::Y));
    out.push(rotation_about(PI, Axis::Z));
    out.push(DMat3::from_axis_angle(DVec3::new(1.0, 1.0, 0.0).normalize(), PI - 1e-9));
    out.push(DMat3::IDENTITY);
    out
}

fn assert_mat_eq(a: &DMat3, b: &DMat3, eps: f64) {
    for c in 0..3 {
        for r in 0..3 {
            assert_relative_eq!(a.col(c)[r], b.col(c)[r], epsilon = eps);
        }
    }
}

#[test]
fn test_quaternion_roundtrip_to_matrix() {
    for m in sampled_rotations(200) {
        let q = matrix_to_quaternion(&m).unwrap();
        assert_relative_eq!(q.norm(), 1.0, epsilon = 1e-12);
        assert!(q.w >= 0.0);
        assert_mat_eq(&q.to_matrix(), &m, 1e-9);
    }
}

#[test]
fn test_renderer_convention_composes_back() {
    for m in sampled_rotations(200) {
        let renderer = matrix_to_quaternion(&m).unwrap().to_renderer();
        // Renderer quaternion is the node (local -> parent) rotation: the transpose
        let back = DMat3::from_quat(renderer).transpose();
        assert_mat_eq(&back, &m, 1e-9);
    }
}

#[test]
fn test_renderer_component_order() {
    let q = EphemerisQuat::new(0.5, 0.1, -0.2, 0.3);
    let r = q.to_renderer();
    assert_eq!([r.x, r.y, r.z, r.w], [-0.1, 0.2, -0.3, 0.5]);
    assert_eq!(EphemerisQuat::from_renderer(r), q);
}

#[test]
fn test_quaternion_matches_glam_for_vector_rotation() {
    // A vector rotation about +Z by 90 deg: scalar-first (cos45, 0, 0, sin45)
    let m = DMat3::from_rotation_z(FRAC_PI_2);
    let q = matrix_to_quaternion(&m).unwrap();
    let s = (0.5f64).sqrt();
    assert_relative_eq!(q.w, s, epsilon = 1e-12);
    assert_relative_eq!(q.z, s, epsilon = 1e-12);
    assert_relative_eq!(q.x, 0.0, epsilon = 1e-12);
    assert_relative_eq!(q.y, 0.0, epsilon = 1e-12);
}

#[test]
fn test_rejects_reflection() {
    let reflection = DMat3::from_diagonal(DVec3::new(1.0, 1.0, -1.0));
    assert!(matches!(
        matrix_to_quaternion(&reflection),
        Err(CoreError::NotARotation { .. })
    ));
    assert!(!is_rotation(&reflection, 1e-6));
    assert!(matrix_to_quaternion(&(DMat3::IDENTITY * 2.0)).is_err());
}

#[test]
fn test_frame_rotation_sense() {
    // Frame rotated +90 deg about Z sees the old +X axis along its -Y
    let m = rotation_about(FRAC_PI_2, Axis::Z);
    let v = m * DVec3::X;
    assert_relative_eq!(v.x, 0.0, epsilon = 1e-12);
    assert_relative_eq!(v.y, -1.0, epsilon = 1e-12);
}

#[test]
fn test_euler_order() {
    let angles = [0.3, -0.7, 1.1];
    let m = euler_to_matrix(angles, [Axis::Z, Axis::X, Axis::Z]);
    let expected = rotation_about(0.3, Axis::Z) * rotation_about(-0.7, Axis::X) * rotation_about(1.1, Axis::Z);
    assert_mat_eq(&m, &expected, 1e-15);
    assert!(is_rotation(&m, 1e-12));
}

#[test]
fn test_boresight_flip() {
    let flip = boresight_flip();
    assert_mat_eq(&flip, &DMat3::from_diagonal(DVec3::new(1.0, -1.0, -1.0)), 1e-12);

    // Instrument boresight (+Z) ends up on the renderer look axis (-Z)
    let camera = matrix_to_quaternion(&flip).unwrap().to_renderer();
    let look = camera * DVec3::NEG_Z;
    assert_relative_eq!(look.z, 1.0, epsilon = 1e-12);
}

#[test]
fn test_light_basis_orthonormal() {
    let mut rand = lcg(11);
    for _ in 0..500 {
        let dir = DVec3::new(rand() - 0.5, rand() - 0.5, rand() - 0.5);
        if dir.length() < 1e-3 || dir.normalize().z.abs() > 0.999999 {
            continue;
        }
        let b = LightBasis::from_direction(dir).unwrap();
        assert_relative_eq!(b.x.length(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(b.y.length(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(b.z.length(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(b.x.dot(b.y), 0.0, epsilon = 1e-12);
        assert_relative_eq!(b.x.dot(b.z), 0.0, epsilon = 1e-12);
        assert_relative_eq!(b.y.dot(b.z), 0.0, epsilon = 1e-12);
        let handed = b.x.cross(b.y);
        assert_relative_eq!(handed.dot(b.z), 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_light_basis_colinear() {
    let err = LightBasis::from_direction(DVec3::Z).unwrap_err();
    assert!(matches!(err, CoreError::DegenerateLightBasis { .. }));
    assert!(err.to_string().contains("colinear"));
    assert!(LightBasis::from_direction(DVec3::NEG_Z * 3.0).is_err());
    assert!(matches!(
        LightBasis::from_direction(DVec3::ZERO),
        Err(CoreError::ZeroVector(_))
    ));
}

#[test]
fn test_light_orientation_points_at_source() {
    let dirs = [
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(0.2, -0.9, 0.4),
        DVec3::new(-3.0, 2.0, -1.0),
    ];
    for dir in dirs {
        let q: DQuat = LightBasis::from_direction(dir).unwrap().orientation().unwrap();
        let local_z = q * DVec3::Z;
        assert_relative_eq!(local_z.dot(dir.normalize()), 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_uniform_samples() {
    assert_eq!(uniform_samples(0.0, 40.0, 5).unwrap(), vec![0.0, 10.0, 20.0, 30.0, 40.0]);
    assert_eq!(uniform_samples(12.5, 99.0, 1).unwrap(), vec![12.5]);

    let grid = uniform_samples(-1.0e8, 3.3e8, 1000).unwrap();
    assert_eq!(grid.len(), 1000);
    assert_eq!(grid[0], -1.0e8);
    assert_eq!(grid[999], 3.3e8);
    assert!(grid.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn test_uniform_samples_rejects_bad_grids() {
    assert_eq!(uniform_samples(0.0, 1.0, 0), Err(CoreError::EmptySampleGrid));
    assert!(matches!(
        uniform_samples(5.0, 5.0, 3),
        Err(CoreError::NonIncreasingInterval { .. })
    ));
    assert!(uniform_samples(5.0, 1.0, 2).is_err());
    assert!(uniform_samples(f64::NAN, 1.0, 2).is_err());
}

#[test]
fn test_uniform_samples_rejects_sub_resolution_step() {
    // ~4.6e8 s past J2000 has a spacing of ~6e-8 s between f64 values
    let start = 4.6e8;
    let err = uniform_samples(start, start + 1e-6, 100).unwrap_err();
    assert!(matches!(err, CoreError::UnresolvableStep { .. }));

    let grid = uniform_samples(start, start + 1.0, 100).unwrap();
    assert!(grid.windows(2).all(|w| w[1] > w[0]));
}
