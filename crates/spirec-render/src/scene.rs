//! Renderer-agnostic scene description.
//!
//! A [`SceneDescription`] is built once per time sample from the poses the
//! ephemeris produced, handed to a [`crate::SceneRenderer`], then dropped.
//! Positions are kilometres, orientations are node-to-parent rotations in
//! renderer convention (cameras look down local -Z with +Y up).

use glam::{DQuat, DVec3};
use spirec_core::{CoreResult, LightBasis};

use crate::error::{SceneError, SceneResult};

/// Output image size in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Handle to a mesh registered with a renderer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(usize);

impl MeshId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Perspective camera node
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: DVec3,
    pub orientation: DQuat,
    /// Vertical field of view, radians
    pub yfov: f64,
    /// Width / height
    pub aspect_ratio: f64,
    /// Near plane, km
    pub znear: f64,
}

impl CameraPose {
    /// Viewing direction in the scene frame
    pub fn forward(&self) -> DVec3 {
        self.orientation * DVec3::NEG_Z
    }
}

/// One target body placed in the scene
#[derive(Clone, Debug, PartialEq)]
pub struct TargetPose {
    pub name: String,
    pub frame: String,
    pub mesh: MeshId,
    pub position: DVec3,
    pub orientation: DQuat,
}

/// Directional light. Sits at the origin; only its orientation matters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightNode {
    /// Unit vector toward the source
    pub direction: DVec3,
    /// Carries local +Z onto `direction`
    pub orientation: DQuat,
    pub intensity: f64,
}

impl LightNode {
    pub fn toward(direction: DVec3, intensity: f64) -> CoreResult<Self> {
        let basis = LightBasis::from_direction(direction)?;
        Ok(Self {
            direction: basis.z,
            orientation: basis.orientation()?,
            intensity,
        })
    }

    pub fn translation(&self) -> DVec3 {
        DVec3::ZERO
    }
}

/// Everything a renderer needs for one frame
#[derive(Clone, Debug, PartialEq)]
pub struct SceneDescription {
    pub camera: CameraPose,
    pub targets: Vec<TargetPose>,
    pub light: LightNode,
    pub resolution: Resolution,
}

/// Validate and compose one camera, the targets (order kept) and one light.
///
/// Orientations are renormalized; anything non-finite is rejected.
pub fn assemble(
    mut camera: CameraPose,
    mut targets: Vec<TargetPose>,
    mut light: LightNode,
    resolution: Resolution,
) -> SceneResult<SceneDescription> {
    if resolution.width == 0 || resolution.height == 0 {
        return Err(SceneError::ZeroResolution {
            width: resolution.width,
            height: resolution.height,
        });
    }

    if !camera.yfov.is_finite() || camera.yfov <= 0.0 || camera.yfov >= std::f64::consts::PI {
        return Err(SceneError::InvalidFieldOfView(camera.yfov));
    }
    if !camera.aspect_ratio.is_finite() || camera.aspect_ratio <= 0.0 {
        return Err(SceneError::InvalidAspectRatio(camera.aspect_ratio));
    }
    if !camera.znear.is_finite() || camera.znear <= 0.0 {
        return Err(SceneError::InvalidNearPlane(camera.znear));
    }
    if !camera.position.is_finite() {
        return Err(SceneError::NonFinitePosition("camera".to_string()));
    }
    camera.orientation = normalized(camera.orientation, "camera")?;

    for target in targets.iter_mut() {
        if !target.position.is_finite() {
            return Err(SceneError::NonFinitePosition(target.name.clone()));
        }
        target.orientation = normalized(target.orientation, &target.name)?;
    }

    if !light.intensity.is_finite() || light.intensity < 0.0 {
        return Err(SceneError::InvalidIntensity(light.intensity));
    }
    light.orientation = normalized(light.orientation, "light")?;

    Ok(SceneDescription {
        camera,
        targets,
        light,
        resolution,
    })
}

fn normalized(q: DQuat, node: &str) -> SceneResult<DQuat> {
    let len = q.length();
    if !len.is_finite() || len < 1e-12 {
        return Err(SceneError::InvalidOrientation(node.to_string()));
    }
    Ok(q / len)
}
