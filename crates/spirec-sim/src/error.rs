//! Error types for the timeline driver

use std::path::PathBuf;
use thiserror::Error;

use spirec_core::CoreError;
use spirec_ephem::EphemerisError;
use spirec_render::{RenderError, SceneError};

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Missing or invalid setting; raised before the first sample
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Geometry error: {0}")]
    Geometry(#[from] EphemerisError),

    #[error("Numeric degeneracy: {0}")]
    Degenerate(#[from] CoreError),

    #[error("Sample id {id} does not fit in {width} digits")]
    SampleIdOverflow { id: u64, width: usize },

    #[error("Sample ids start at 1, got {0}")]
    InvalidSampleId(u32),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Invalid scene: {0}")]
    Scene(#[from] SceneError),

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write image {path:?}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
