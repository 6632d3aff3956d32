//! Frame capture from the render target

use image::RgbaImage;
use wgpu::{Device, Queue, Texture};

use crate::error::{RenderError, RenderResult};

const BYTES_PER_PIXEL: u32 = 4;

/// Staging buffer for GPU -> CPU readback of one RGBA8 frame
pub struct FrameCapture {
    staging_buffer: wgpu::Buffer,
    width: u32,
    height: u32,
    /// Bytes per row (aligned)
    bytes_per_row: u32,
}

impl FrameCapture {
    pub fn new(device: &Device, width: u32, height: u32) -> Self {
        let bytes_per_row = padded_bytes_per_row(width);

        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Capture Staging Buffer"),
            size: (bytes_per_row * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Self {
            staging_buffer,
            width,
            height,
            bytes_per_row,
        }
    }

    /// Copy `source` into the staging buffer, wait, and read it back
    pub fn capture(&self, device: &Device, queue: &Queue, source: &Texture) -> RenderResult<RgbaImage> {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Capture Encoder"),
        });

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: source,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &self.staging_buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(self.bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );

        queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = self.staging_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| RenderError::Capture(e.to_string()))?
            .map_err(|e| RenderError::Capture(e.to_string()))?;

        let rgba = {
            let data = buffer_slice.get_mapped_range();
            unpad_rows(&data, self.width, self.height, self.bytes_per_row)
        };
        self.staging_buffer.unmap();

        RgbaImage::from_raw(self.width, self.height, rgba)
            .ok_or_else(|| RenderError::Capture("readback size mismatch".to_string()))
    }
}

/// wgpu requires 256-byte row alignment for texture copies
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Strip row padding from a mapped buffer
pub fn unpad_rows(data: &[u8], width: u32, height: u32, bytes_per_row: u32) -> Vec<u8> {
    let row_len = (width * BYTES_PER_PIXEL) as usize;
    let mut rgba = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let start = row * bytes_per_row as usize;
        rgba.extend_from_slice(&data[start..start + row_len]);
    }
    rgba
}
