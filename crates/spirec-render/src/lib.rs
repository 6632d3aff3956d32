//! Scene description and offscreen rendering for synthetic camera images.

pub mod camera;
pub mod capture;
pub mod error;
pub mod gpu_types;
pub mod headless;
pub mod mesh;
pub mod pipeline;
pub mod scene;

pub use error::{RenderError, RenderResult, SceneError, SceneResult};
pub use headless::HeadlessRenderer;
pub use mesh::MeshData;
pub use scene::{assemble, CameraPose, LightNode, MeshId, Resolution, SceneDescription, TargetPose};

use image::RgbaImage;

/// Anything that can turn a [`SceneDescription`] into pixels.
///
/// Meshes are registered once per run; scenes refer to them by [`MeshId`].
pub trait SceneRenderer {
    fn register_mesh(&mut self, mesh: &MeshData) -> RenderResult<MeshId>;

    /// Render one frame at `scene.resolution`
    fn render(&mut self, scene: &SceneDescription) -> RenderResult<RgbaImage>;
}
