//! Environment background drawn first in every pass.

use tidewater_core::{EnvironmentMap, PassTarget};

use crate::render_target::DEPTH_FORMAT;
use crate::scene_render::{color_targets, fragment_entry};
use crate::textures::{create_wrap_sampler, gradient_environment, upload_environment, GpuTexture};

/// Sky pipelines and the environment texture they sample.
pub struct SkyRenderer {
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    environment: GpuTexture,
    bind_group: wgpu::BindGroup,
    below_water: wgpu::RenderPipeline,
    reflection: wgpu::RenderPipeline,
    screen: wgpu::RenderPipeline,
}

impl SkyRenderer {
    /// Creates the renderer with the gradient placeholder environment.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view_layout: &wgpu::BindGroupLayout,
        screen_format: wgpu::TextureFormat,
    ) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sky Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let sampler = create_wrap_sampler(device, "Sky Sampler");
        let environment = upload_environment(device, queue, &gradient_environment(4, 64));
        let bind_group = create_bind_group(device, &layout, &environment.view, &sampler);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sky Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sky.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sky Pipeline Layout"),
            bind_group_layouts: &[view_layout, &layout],
            push_constant_ranges: &[],
        });
        let build = |target| create_sky_pipeline(device, &shader, &pipeline_layout, target, screen_format);
        let below_water = build(PassTarget::BelowWater);
        let reflection = build(PassTarget::Reflection);
        let screen = build(PassTarget::Screen);

        Self {
            layout,
            sampler,
            environment,
            bind_group,
            below_water,
            reflection,
            screen,
        }
    }

    /// Replaces the environment texture.
    pub fn set_environment(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        environment: &EnvironmentMap,
    ) {
        self.environment = upload_environment(device, queue, environment);
        self.bind_group = create_bind_group(device, &self.layout, &self.environment.view, &self.sampler);
        log::info!(
            "environment map applied ({}x{})",
            environment.width,
            environment.height
        );
    }

    /// Records the background draw. Group 0 must already hold the pass's view.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, target: PassTarget) {
        let pipeline = match target {
            PassTarget::BelowWater => &self.below_water,
            PassTarget::Reflection => &self.reflection,
            PassTarget::Screen => &self.screen,
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(1, &self.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Sky Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn create_sky_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    target: PassTarget,
    screen_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Sky Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry(target)),
            targets: &color_targets(target, screen_format),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        // drawn first, behind everything, without touching depth
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Always,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
