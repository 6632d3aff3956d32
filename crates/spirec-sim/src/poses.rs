//! Per-sample poses computed from ephemeris geometry.
//!
//! Two scene layouts are supported. With the observer at the origin the scene
//! frame is the camera frame and every target is placed around the camera.
//! With the target at the origin the scene frame is the target's body-fixed
//! frame and the camera moves around it.

use glam::{DMat3, DQuat, DVec3};
use hifitime::Epoch;

use spirec_core::{boresight_flip, matrix_to_quaternion};
use spirec_ephem::{illumination_direction, relative_pose, Correction, EphemerisSource};
use spirec_render::{assemble, CameraPose, LightNode, MeshId, SceneDescription, TargetPose};

use crate::camera::ResolvedCamera;
use crate::config::{SceneConfig, SceneOrigin, TargetConfig};
use crate::error::{PipelineError, PipelineResult};

/// A target as registered for the run; immutable across samples
#[derive(Clone, Debug, PartialEq)]
pub struct TargetBody {
    pub name: String,
    pub frame: String,
    pub mesh: MeshId,
}

/// Placement of one target in the scene frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub position: DVec3,
    pub orientation: DQuat,
}

/// Camera, targets and illumination for one sample (scene frame, km)
#[derive(Clone, Debug, PartialEq)]
pub struct SamplePoses {
    pub camera_position: DVec3,
    /// Renderer convention
    pub camera_orientation: DQuat,
    /// Same order as the configured targets
    pub targets: Vec<Placement>,
    /// Unit vector toward the illumination source
    pub illumination: DVec3,
}

impl SamplePoses {
    /// Scene for the renderer. `bodies` must line up with `self.targets`.
    pub fn scene(
        &self,
        bodies: &[TargetBody],
        camera: &ResolvedCamera,
        light_factor: f64,
    ) -> PipelineResult<SceneDescription> {
        if bodies.len() != self.targets.len() {
            return Err(PipelineError::config(format!(
                "{} target poses for {} registered bodies",
                self.targets.len(),
                bodies.len()
            )));
        }

        let camera_pose = CameraPose {
            position: self.camera_position,
            orientation: self.camera_orientation,
            yfov: camera.yfov,
            aspect_ratio: camera.aspect_ratio,
            znear: camera.znear,
        };
        let targets = bodies
            .iter()
            .zip(&self.targets)
            .map(|(body, placement)| TargetPose {
                name: body.name.clone(),
                frame: body.frame.clone(),
                mesh: body.mesh,
                position: placement.position,
                orientation: placement.orientation,
            })
            .collect();
        let light = LightNode::toward(self.illumination, light_factor)?;

        Ok(assemble(camera_pose, targets, light, camera.resolution)?)
    }
}

/// Renderer-convention orientation of a frame-transform matrix
fn node_orientation(m: &DMat3) -> PipelineResult<DQuat> {
    Ok(matrix_to_quaternion(m)?.to_renderer())
}

/// Poses for the configured scene layout
pub fn compute_poses<S: EphemerisSource + ?Sized>(
    source: &S,
    epoch: Epoch,
    config: &SceneConfig,
    camera: &ResolvedCamera,
) -> PipelineResult<SamplePoses> {
    match config.origin {
        SceneOrigin::Observer => observer_centered(
            source,
            epoch,
            &config.observer,
            &camera.frame,
            &config.targets,
            &config.illumination_source,
            config.aberration,
        ),
        SceneOrigin::Target => {
            let target = config
                .targets
                .first()
                .ok_or_else(|| PipelineError::config("no target configured"))?;
            target_centered(
                source,
                epoch,
                &config.observer,
                &camera.frame,
                target,
                &config.illumination_source,
                config.aberration,
            )
        }
    }
}

/// Camera at the origin looking down camera-frame +Z
pub fn observer_centered<S: EphemerisSource + ?Sized>(
    source: &S,
    epoch: Epoch,
    observer: &str,
    camera_frame: &str,
    targets: &[TargetConfig],
    illuminator: &str,
    correction: Correction,
) -> PipelineResult<SamplePoses> {
    let placements = targets
        .iter()
        .map(|target| {
            let (position, rotation) = relative_pose(
                source,
                epoch,
                &target.name,
                observer,
                camera_frame,
                &target.frame,
                correction,
            )?;
            Ok(Placement {
                position,
                orientation: node_orientation(&rotation)?,
            })
        })
        .collect::<PipelineResult<Vec<_>>>()?;

    Ok(SamplePoses {
        camera_position: DVec3::ZERO,
        camera_orientation: node_orientation(&boresight_flip())?,
        targets: placements,
        illumination: illumination_direction(source, epoch, illuminator, observer, camera_frame, correction)?,
    })
}

/// Target at the origin in its body-fixed frame, camera placed around it
pub fn target_centered<S: EphemerisSource + ?Sized>(
    source: &S,
    epoch: Epoch,
    observer: &str,
    camera_frame: &str,
    target: &TargetConfig,
    illuminator: &str,
    correction: Correction,
) -> PipelineResult<SamplePoses> {
    let (camera_position, rotation) = relative_pose(
        source,
        epoch,
        observer,
        &target.name,
        &target.frame,
        camera_frame,
        correction,
    )?;

    Ok(SamplePoses {
        camera_position,
        camera_orientation: node_orientation(&(boresight_flip() * rotation))?,
        targets: vec![Placement {
            position: DVec3::ZERO,
            orientation: DQuat::IDENTITY,
        }],
        illumination: illumination_direction(source, epoch, illuminator, observer, &target.frame, correction)?,
    })
}
