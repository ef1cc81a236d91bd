//! GPU side of the water program.
//!
//! Group 1 of `water.wgsl`:
//!
//! | Binding | Resource |
//! |---|---|
//! | 0 | [`WaterUniforms`] |
//! | 1 | below-water color |
//! | 2 | below-water depth copy, `R32Float` (`textureLoad`) |
//! | 3 | reflection color |
//! | 4 | clamp sampler for the screen-space targets |
//! | 5 | foam mask |
//! | 6 | normal map |
//! | 7 | repeat sampler for the static textures |
//!
//! The bind group references render-target views, so it is rebuilt whenever the
//! targets' generation moves past the one it was built for.

use tidewater_core::{PassTarget, TextureImage, WaterUniformState, WaterUniforms};
use wgpu::util::DeviceExt;

use crate::render_target::RenderTargetSet;
use crate::scene_render::{color_targets, create_mesh_pipeline, MeshRenderData};
use crate::textures::{create_clamp_sampler, create_wrap_sampler, upload_rgba8, GpuTexture};

/// Uniform buffer, textures and pipeline of the water surface.
pub struct WaterRenderer {
    layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    screen_sampler: wgpu::Sampler,
    wrap_sampler: wgpu::Sampler,
    foam_mask: GpuTexture,
    normal_map: GpuTexture,
    bind_group: Option<(u64, wgpu::BindGroup)>,
    pipeline: wgpu::RenderPipeline,
}

impl WaterRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view_layout: &wgpu::BindGroupLayout,
        screen_format: wgpu::TextureFormat,
        state: &WaterUniformState,
    ) -> Self {
        let layout = create_water_bind_group_layout(device);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Water Uniforms"),
            contents: bytemuck::cast_slice(&[state.gpu_uniforms()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Water Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/water.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Water Pipeline Layout"),
            bind_group_layouts: &[view_layout, &layout],
            push_constant_ranges: &[],
        });
        let pipeline = create_mesh_pipeline(
            device,
            "Water Pipeline",
            &shader,
            &pipeline_layout,
            "fs_main",
            &color_targets(PassTarget::Screen, screen_format),
        );

        Self {
            layout,
            uniform_buffer,
            screen_sampler: create_clamp_sampler(device, "Water Screen Sampler"),
            wrap_sampler: create_wrap_sampler(device, "Water Wrap Sampler"),
            foam_mask: upload_rgba8(device, queue, "Foam Mask", state.foam_mask()),
            normal_map: upload_rgba8(device, queue, "Normal Map", state.normal_map()),
            bind_group: None,
            pipeline,
        }
    }

    /// Re-uploads the static textures and drops the bind group that referenced the old ones.
    pub fn set_static_textures(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        foam_mask: &TextureImage,
        normal_map: &TextureImage,
    ) {
        self.foam_mask = upload_rgba8(device, queue, "Foam Mask", foam_mask);
        self.normal_map = upload_rgba8(device, queue, "Normal Map", normal_map);
        self.bind_group = None;
    }

    /// Writes both uniform groups to the GPU.
    pub fn upload_uniforms(&self, queue: &wgpu::Queue, uniforms: &WaterUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[*uniforms]));
    }

    /// Makes sure the bind group points at the current render targets.
    pub fn prepare(&mut self, device: &wgpu::Device, targets: &RenderTargetSet) {
        let generation = targets.generation();
        if matches!(&self.bind_group, Some((built_for, _)) if *built_for == generation) {
            return;
        }
        let below = targets.below_water();
        let Some(below_depth) = below.depth_value_view() else {
            log::warn!("below-water target has no depth copy; water bind group not built");
            return;
        };
        log::debug!("rebuilding water bind group for target generation {generation}");
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Water Bind Group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(below.color_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(below_depth),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(targets.reflection().color_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.screen_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::TextureView(&self.foam_mask.view),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: wgpu::BindingResource::TextureView(&self.normal_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 7,
                    resource: wgpu::BindingResource::Sampler(&self.wrap_sampler),
                },
            ],
        });
        self.bind_group = Some((generation, bind_group));
    }

    /// Generation of the targets the bind group currently references.
    #[must_use]
    pub fn bound_generation(&self) -> Option<u64> {
        self.bind_group.as_ref().map(|(generation, _)| *generation)
    }

    /// Records the water draw. Group 0 must already hold the pass's view.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, mesh: &MeshRenderData) {
        let Some((_, bind_group)) = &self.bind_group else {
            log::warn!("water bind group missing; skipping water draw");
            return;
        };
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(1, bind_group, &[]);
        mesh.draw(pass);
    }
}

/// How the water shader reads the depth copy: unfiltered, via `textureLoad`.
const DEPTH_VALUE_SAMPLE_TYPE: wgpu::TextureSampleType =
    wgpu::TextureSampleType::Float { filterable: false };

fn texture_entry(binding: u32, sample_type: wgpu::TextureSampleType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

/// Creates the group 1 layout of the water program.
pub fn create_water_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let filterable = wgpu::TextureSampleType::Float { filterable: true };

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Water Bind Group Layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            texture_entry(1, filterable),
            texture_entry(2, DEPTH_VALUE_SAMPLE_TYPE),
            texture_entry(3, filterable),
            sampler_entry(4),
            texture_entry(5, filterable),
            texture_entry(6, filterable),
            sampler_entry(7),
        ],
    })
}
