//! Error types for scene assembly and rendering

use std::path::PathBuf;
use thiserror::Error;

use crate::scene::MeshId;

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Result type for scene assembly
pub type SceneResult<T> = Result<T, SceneError>;

/// Invalid scene content, detected before anything reaches the GPU
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("Resolution must be non-zero, got {width}x{height}")]
    ZeroResolution { width: u32, height: u32 },

    #[error("Vertical field of view must be in (0, pi) radians, got {0}")]
    InvalidFieldOfView(f64),

    #[error("Aspect ratio must be finite and positive, got {0}")]
    InvalidAspectRatio(f64),

    #[error("Near plane must be finite and positive, got {0}")]
    InvalidNearPlane(f64),

    #[error("Non-finite position for {0}")]
    NonFinitePosition(String),

    #[error("Orientation of {0} is not a normalizable quaternion")]
    InvalidOrientation(String),

    #[error("Light intensity must be finite and non-negative, got {0}")]
    InvalidIntensity(f64),
}

/// Errors from mesh loading and the GPU renderer
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No GPU adapter available")]
    NoAdapter,

    #[error("GPU device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("Frame capture failed: {0}")]
    Capture(String),

    #[error("Mesh {path:?}: {reason}")]
    Mesh { path: PathBuf, reason: String },

    #[error("Texture {path:?}: {source}")]
    Texture {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Unknown mesh handle {0:?}")]
    UnknownMesh(MeshId),

    #[error("Invalid scene: {0}")]
    Scene(#[from] SceneError),
}
