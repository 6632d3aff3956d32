//! Timeline driver for synthetic camera image generation.
//!
//! Resolves the camera from config and instrument kernels, samples the time
//! interval uniformly, and for each sample turns ephemeris geometry into a
//! scene, an image and an optional label row.

pub mod camera;
pub mod config;
pub mod driver;
pub mod error;
pub mod label;
pub mod poses;
pub mod sample_id;
pub mod timeline;

pub use camera::{resolve_camera, ResolvedCamera};
pub use config::{ImageNaming, SceneConfig, SceneOrigin, TargetConfig};
pub use driver::{run, Pipeline, RunSummary};
pub use error::{PipelineError, PipelineResult};
pub use label::{LabelWriter, LABEL_FILE_NAME, LABEL_HEADER};
pub use poses::{compute_poses, observer_centered, target_centered, Placement, SamplePoses, TargetBody};
pub use sample_id::{SampleId, MAX_SAMPLE_ID, SAMPLE_ID_WIDTH};
pub use timeline::{format_utc, parse_epoch, TimeSample, Timeline};
