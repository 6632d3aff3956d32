//! Headless wgpu renderer (no window)

use image::RgbaImage;
use wgpu::util::DeviceExt;

use crate::capture::FrameCapture;
use crate::error::{RenderError, RenderResult};
use crate::gpu_types::{FrameUniform, NodeUniform};
use crate::mesh::MeshData;
use crate::pipeline::{create_color_texture, create_depth_texture, MeshPipeline};
use crate::scene::{MeshId, Resolution, SceneDescription};
use crate::SceneRenderer;

/// Mesh resident on the GPU
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    texture_view: wgpu::TextureView,
}

/// Color/depth targets for one resolution
struct RenderTargets {
    resolution: Resolution,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    _depth: wgpu::Texture,
    depth_view: wgpu::TextureView,
    capture: FrameCapture,
}

impl RenderTargets {
    fn new(device: &wgpu::Device, resolution: Resolution) -> Self {
        let (color, color_view) = create_color_texture(device, resolution.width, resolution.height);
        let (depth, depth_view) = create_depth_texture(device, resolution.width, resolution.height);
        Self {
            resolution,
            color,
            color_view,
            _depth: depth,
            depth_view,
            capture: FrameCapture::new(device, resolution.width, resolution.height),
        }
    }
}

/// Offscreen rasterizer: Lambertian meshes, one directional light, black sky
pub struct HeadlessRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: MeshPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    meshes: Vec<GpuMesh>,
    targets: Option<RenderTargets>,
}

impl HeadlessRenderer {
    pub async fn new() -> RenderResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        tracing::info!("GPU adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Spirec Headless"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let pipeline = MeshPipeline::new(&device);

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniform"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &pipeline.frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        Ok(Self {
            device,
            queue,
            pipeline,
            frame_buffer,
            frame_bind_group,
            meshes: Vec::new(),
            targets: None,
        })
    }

    fn upload_texture(&self, mesh: &MeshData) -> wgpu::TextureView {
        let white = RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        let max_dim = self.device.limits().max_texture_dimension_2d;

        let image = match &mesh.texture {
            None => white,
            Some(tex) if tex.width() > max_dim || tex.height() > max_dim => {
                let scale = max_dim as f64 / tex.width().max(tex.height()) as f64;
                let (w, h) = (
                    ((tex.width() as f64 * scale) as u32).max(1),
                    ((tex.height() as f64 * scale) as u32).max(1),
                );
                tracing::warn!(
                    "Texture of {} is {}x{}, downscaling to {}x{}",
                    mesh.name,
                    tex.width(),
                    tex.height(),
                    w,
                    h
                );
                image::imageops::resize(tex, w, h, image::imageops::FilterType::Triangle)
            }
            Some(tex) => tex.clone(),
        };

        let size = wgpu::Extent3d {
            width: image.width(),
            height: image.height(),
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Albedo Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width()),
                rows_per_image: Some(image.height()),
            },
            size,
        );
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn ensure_targets(&mut self, resolution: Resolution) {
        let stale = self
            .targets
            .as_ref()
            .map(|t| t.resolution != resolution)
            .unwrap_or(true);
        if stale {
            tracing::debug!("Allocating {}x{} render targets", resolution.width, resolution.height);
            self.targets = Some(RenderTargets::new(&self.device, resolution));
        }
    }
}

impl SceneRenderer for HeadlessRenderer {
    fn register_mesh(&mut self, mesh: &MeshData) -> RenderResult<MeshId> {
        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertices"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Indices"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let texture_view = self.upload_texture(mesh);

        let id = MeshId::new(self.meshes.len());
        self.meshes.push(GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            texture_view,
        });
        Ok(id)
    }

    fn render(&mut self, scene: &SceneDescription) -> RenderResult<RgbaImage> {
        for target in &scene.targets {
            if target.mesh.index() >= self.meshes.len() {
                return Err(RenderError::UnknownMesh(target.mesh));
            }
        }

        let frame = FrameUniform::new(&scene.camera, &scene.light);
        self.queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame));

        let node_bind_groups: Vec<wgpu::BindGroup> = scene
            .targets
            .iter()
            .map(|target| {
                let uniform = NodeUniform::new(&scene.camera, target);
                let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Node Uniform"),
                    contents: bytemuck::bytes_of(&uniform),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
                self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Node Bind Group"),
                    layout: &self.pipeline.node_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: buffer.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(
                                &self.meshes[target.mesh.index()].texture_view,
                            ),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::Sampler(&self.pipeline.sampler),
                        },
                    ],
                })
            })
            .collect();

        self.ensure_targets(scene.resolution);
        let targets = self
            .targets
            .as_ref()
            .ok_or_else(|| RenderError::Capture("render targets missing".to_string()))?;

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Scene Encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &targets.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &targets.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.pipeline.pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for (target, bind_group) in scene.targets.iter().zip(&node_bind_groups) {
                let mesh = &self.meshes[target.mesh.index()];
                pass.set_bind_group(1, bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        targets.capture.capture(&self.device, &self.queue, &targets.color)
    }
}
