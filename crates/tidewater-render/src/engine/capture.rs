//! Offscreen color target standing in for the window surface, with readback.

use glam::Vec4;
use half::f16;

use crate::error::{RenderError, RenderResult};

/// Format of the headless screen target.
pub const CAPTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

const BYTES_PER_PIXEL: u32 = 4;

/// Bytes per RGBA8 row padded to wgpu's copy alignment.
#[must_use]
pub fn aligned_bytes_per_row(width: u32) -> u32 {
    padded_bytes_per_row(width * BYTES_PER_PIXEL)
}

fn padded_bytes_per_row(row_bytes: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    row_bytes.div_ceil(align) * align
}

/// Drops the per-row padding of a mapped RGBA8 readback buffer.
#[must_use]
pub fn strip_row_padding(padded: &[u8], width: u32, height: u32) -> Vec<u8> {
    strip_padding(padded, width * BYTES_PER_PIXEL, height)
}

fn strip_padding(padded: &[u8], row_bytes: u32, height: u32) -> Vec<u8> {
    let padded_row = padded_bytes_per_row(row_bytes) as usize;
    let row_bytes = row_bytes as usize;
    let mut result = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * padded_row;
        result.extend_from_slice(&padded[start..start + row_bytes]);
    }
    result
}

/// Decodes tightly packed `Rgba16Float` texels.
#[must_use]
pub fn decode_rgba16f(bytes: &[u8]) -> Vec<Vec4> {
    bytes
        .chunks_exact(8)
        .map(|texel| {
            let channel = |i: usize| f16::from_le_bytes([texel[2 * i], texel[2 * i + 1]]).to_f32();
            Vec4::new(channel(0), channel(1), channel(2), channel(3))
        })
        .collect()
}

/// Decodes tightly packed `R32Float` texels.
#[must_use]
pub fn decode_r32f(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|texel| f32::from_le_bytes([texel[0], texel[1], texel[2], texel[3]]))
        .collect()
}

/// Copies a whole single-sample 2D texture into a mappable buffer and returns
/// its tightly packed texels.
///
/// Blocks until the GPU has finished all submitted work.
pub fn read_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    bytes_per_pixel: u32,
) -> RenderResult<Vec<u8>> {
    let (width, height) = (texture.width(), texture.height());
    let row_bytes = width * bytes_per_pixel;
    let bytes_per_row = padded_bytes_per_row(row_bytes);
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Capture Readback"),
        size: u64::from(bytes_per_row) * u64::from(height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("capture copy encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let buffer_slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        // receiver outlives the poll below
        let _ = tx.send(result);
    });
    let _ = device.poll(wgpu::Maintain::Wait);
    rx.recv()
        .map_err(|e| RenderError::CaptureFailed(e.to_string()))?
        .map_err(|e| RenderError::CaptureFailed(e.to_string()))?;

    let data = buffer_slice.get_mapped_range();
    let texels = strip_padding(&data, row_bytes, height);
    drop(data);
    buffer.unmap();

    Ok(texels)
}

/// The below-water pass's outputs as read back from the GPU.
#[derive(Debug, Clone, PartialEq)]
pub struct BelowWaterCapture {
    pub width: u32,
    pub height: u32,
    /// Linear color, row by row from the top-left.
    pub color: Vec<Vec4>,
    /// Normalized device depth in `[0, 1]`, same layout as `color`.
    pub depth: Vec<f32>,
}

impl BelowWaterCapture {
    fn index(&self, x: u32, y: u32) -> usize {
        (y.min(self.height - 1) * self.width + x.min(self.width - 1)) as usize
    }

    /// Color of texel `(x, y)`, clamped to the edges.
    #[must_use]
    pub fn color_at(&self, x: u32, y: u32) -> Vec4 {
        self.color[self.index(x, y)]
    }

    /// Depth of texel `(x, y)`, clamped to the edges.
    #[must_use]
    pub fn depth_at(&self, x: u32, y: u32) -> f32 {
        self.depth[self.index(x, y)]
    }
}

/// The texture the composite pass draws to when there is no window.
pub struct CaptureTarget {
    texture: wgpu::Texture,
    width: u32,
    height: u32,
}

impl CaptureTarget {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Capture Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: CAPTURE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        Self {
            texture,
            width,
            height,
        }
    }

    pub fn create_view(&self) -> wgpu::TextureView {
        self.texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Copies the target into a mappable buffer and returns tightly packed RGBA8.
    ///
    /// Blocks until the GPU has finished all submitted work.
    pub fn read_pixels(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> RenderResult<Vec<u8>> {
        read_texture(device, queue, &self.texture, BYTES_PER_PIXEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_alignment() {
        assert_eq!(aligned_bytes_per_row(1), 256);
        assert_eq!(aligned_bytes_per_row(64), 256);
        assert_eq!(aligned_bytes_per_row(65), 512);
        assert_eq!(aligned_bytes_per_row(800), 3328);
    }

    #[test]
    fn test_strip_row_padding() {
        // 2x2 image: each 8-byte row padded to 256
        let mut padded = vec![0u8; 512];
        padded[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        padded[256..264].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);
        let packed = strip_row_padding(&padded, 2, 2);
        assert_eq!(packed, (1..=16).collect::<Vec<u8>>());
    }

    #[test]
    fn test_decode_float_texels() {
        let mut bytes = Vec::new();
        for value in [0.5f32, 1.0, 0.25, 1.0] {
            bytes.extend_from_slice(&f16::from_f32(value).to_le_bytes());
        }
        assert_eq!(decode_rgba16f(&bytes), vec![Vec4::new(0.5, 1.0, 0.25, 1.0)]);

        let depth: Vec<u8> = [0.75f32, 1.0].iter().flat_map(|d| d.to_le_bytes()).collect();
        assert_eq!(decode_r32f(&depth), vec![0.75, 1.0]);
    }

    #[test]
    fn test_below_water_capture_clamps_lookups() {
        let capture = BelowWaterCapture {
            width: 2,
            height: 1,
            color: vec![Vec4::ZERO, Vec4::ONE],
            depth: vec![0.1, 0.9],
        };
        assert_eq!(capture.color_at(1, 0), Vec4::ONE);
        assert_eq!(capture.depth_at(5, 3), 0.9);
        assert_eq!(capture.depth_at(0, 0), 0.1);
    }
}
