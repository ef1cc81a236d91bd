//! GPU upload of static textures and the samplers used to read them.

use glam::Vec3;
use half::f16;
use tidewater_core::{EnvironmentMap, TextureImage};

/// A texture together with its default view.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

/// Uploads an RGBA8 image as linear (non-sRGB) data.
///
/// Foam masks and normal maps hold data rather than colors, so no sRGB decode
/// is applied.
pub fn upload_rgba8(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    image: &TextureImage,
) -> GpuTexture {
    let size = wgpu::Extent3d {
        width: image.width(),
        height: image.height(),
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        image.data(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(image.width() * 4),
            rows_per_image: Some(image.height()),
        },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture { texture, view }
}

/// Uploads an equirectangular environment as `Rgba16Float`.
pub fn upload_environment(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    environment: &EnvironmentMap,
) -> GpuTexture {
    let size = wgpu::Extent3d {
        width: environment.width,
        height: environment.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Environment Texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba16Float,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    let texels: Vec<u16> = environment
        .texels
        .iter()
        .flat_map(|texel| texel.map(|c| f16::from_f32(c).to_bits()))
        .collect();

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(&texels),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(environment.width * 8),
            rows_per_image: Some(environment.height),
        },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture { texture, view }
}

/// A vertical sky gradient used as the environment until the real one loads.
#[must_use]
pub fn gradient_environment(width: u32, height: u32) -> EnvironmentMap {
    let width = width.max(1);
    let height = height.max(2);
    let zenith = Vec3::new(0.18, 0.36, 0.62);
    let horizon = Vec3::new(0.75, 0.85, 0.92);
    let ground = Vec3::new(0.22, 0.2, 0.18);

    let mut texels = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        // v = 0 is straight up, v = 1 straight down
        let v = y as f32 / (height - 1) as f32;
        let color = if v < 0.5 {
            zenith.lerp(horizon, (v / 0.5).powf(2.0))
        } else {
            horizon.lerp(ground, ((v - 0.5) / 0.5).sqrt())
        };
        texels.extend(std::iter::repeat(color.extend(1.0).to_array()).take(width as usize));
    }
    EnvironmentMap {
        width,
        height,
        texels,
    }
}

/// Linear sampler with repeat addressing, for tiling textures.
pub fn create_wrap_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

/// Linear sampler with clamp-to-edge addressing, for screen-space targets.
pub fn create_clamp_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_environment_shape() {
        let env = gradient_environment(8, 16);
        assert_eq!(env.texels.len(), 8 * 16);
        // sky brighter at the horizon than the ground below it
        let horizon = env.texels[8 * 7][0];
        let bottom = env.texels[8 * 15][0];
        assert!(horizon > bottom);
        assert!(env.texels.iter().all(|t| t[3] == 1.0));
    }

    #[test]
    fn test_gradient_environment_degenerate() {
        let env = gradient_environment(0, 0);
        assert_eq!((env.width, env.height), (1, 2));
        assert_eq!(env.texels.len(), 2);
    }
}
