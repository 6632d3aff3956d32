//! Camera math with floating origin and reverse-Z depth.
//!
//! Node positions stay in f64 until they are made camera-relative, then go to
//! the GPU as f32.

use glam::{DMat4, DQuat, DVec3, Mat4};

use crate::gpu_types::{FrameUniform, NodeUniform};
use crate::scene::{CameraPose, LightNode, TargetPose};

/// World-to-camera rotation, camera at the origin
pub fn view_matrix(orientation: DQuat) -> Mat4 {
    DMat4::from_quat(orientation.inverse()).as_mat4()
}

/// Reverse-Z infinite far plane projection: near maps to 1.0, infinity to 0.0
pub fn reverse_z_infinite_projection(fov_y: f32, aspect: f32, near: f32) -> Mat4 {
    let f = 1.0 / (fov_y / 2.0).tan();

    Mat4::from_cols_array(&[
        f / aspect, 0.0, 0.0, 0.0,
        0.0, f, 0.0, 0.0,
        0.0, 0.0, 0.0, -1.0,
        0.0, 0.0, near, 0.0,
    ])
}

/// Node transform relative to the camera position
pub fn camera_relative_model(camera: &CameraPose, position: DVec3, orientation: DQuat) -> Mat4 {
    DMat4::from_rotation_translation(orientation, position - camera.position).as_mat4()
}

impl FrameUniform {
    pub fn new(camera: &CameraPose, light: &LightNode) -> Self {
        let view = view_matrix(camera.orientation);
        let proj = reverse_z_infinite_projection(
            camera.yfov as f32,
            camera.aspect_ratio as f32,
            camera.znear as f32,
        );
        let toward_light = (light.orientation * DVec3::Z).as_vec3();

        Self {
            view_proj: (proj * view).to_cols_array_2d(),
            light_dir: toward_light.to_array(),
            intensity: light.intensity as f32,
        }
    }
}

impl NodeUniform {
    pub fn new(camera: &CameraPose, target: &TargetPose) -> Self {
        Self {
            model: camera_relative_model(camera, target.position, target.orientation).to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::{Vec3, Vec4};

    #[test]
    fn test_reverse_z_depth_range() {
        let proj = reverse_z_infinite_projection(1.0, 1.5, 0.05);

        let near = proj * Vec4::new(0.0, 0.0, -0.05, 1.0);
        assert_relative_eq!(near.z / near.w, 1.0, epsilon = 1e-6);

        let far = proj * Vec4::new(0.0, 0.0, -1.0e9, 1.0);
        assert!(far.z / far.w < 1e-9);
        assert!(far.z / far.w >= 0.0);
    }

    #[test]
    fn test_view_of_flipped_camera() {
        // Camera rotated pi about X looks along world +Z with world -Y up
        let q = DQuat::from_rotation_x(std::f64::consts::PI);
        let view = view_matrix(q);

        let ahead = view.transform_vector3(Vec3::Z);
        assert_relative_eq!(ahead.z, -1.0, epsilon = 1e-6);
        let up = view.transform_vector3(Vec3::NEG_Y);
        assert_relative_eq!(up.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_model_is_camera_relative() {
        let camera = CameraPose {
            position: DVec3::new(1.0e8, 0.0, 0.0),
            orientation: DQuat::IDENTITY,
            yfov: 0.5,
            aspect_ratio: 1.0,
            znear: 0.05,
        };
        let model = camera_relative_model(&camera, DVec3::new(1.0e8 + 12.5, 0.0, -3.0), DQuat::IDENTITY);
        let origin = model.transform_point3(Vec3::ZERO);
        assert_relative_eq!(origin.x, 12.5, epsilon = 1e-4);
        assert_relative_eq!(origin.z, -3.0, epsilon = 1e-4);
    }

    #[test]
    fn test_frame_uniform_light_direction() {
        let camera = CameraPose {
            position: DVec3::ZERO,
            orientation: DQuat::IDENTITY,
            yfov: 0.5,
            aspect_ratio: 1.0,
            znear: 0.05,
        };
        let light = LightNode::toward(DVec3::new(1.0, 1.0, 0.0), 10.0).unwrap();
        let uniform = FrameUniform::new(&camera, &light);
        let dir = Vec3::from_array(uniform.light_dir);
        assert_relative_eq!(dir.x, std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-6);
        assert_relative_eq!(dir.y, std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-6);
        assert_eq!(uniform.intensity, 10.0);
    }
}
