//! Opaque scene meshes and the per-pass view uniforms shared by every pipeline.

use glam::{Mat4, Vec3};
use tidewater_core::{ClipPlaneUniforms, MeshData, MeshSlot, PassTarget};
use wgpu::util::DeviceExt;

use crate::camera::Camera;
use crate::render_target::{DEPTH_FORMAT, DEPTH_VALUE_FORMAT, OFFSCREEN_COLOR_FORMAT};

/// Vertex layout shared by scene meshes and the water plane.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl SceneVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    /// Vertex buffer layout for pipelines.
    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SceneVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// Interleaves a mesh's positions and normals.
    #[must_use]
    pub fn from_mesh(mesh: &MeshData) -> Vec<SceneVertex> {
        mesh.positions
            .iter()
            .enumerate()
            .map(|(i, p)| SceneVertex {
                position: p.to_array(),
                normal: mesh.normals.get(i).copied().unwrap_or(Vec3::Y).to_array(),
            })
            .collect()
    }
}

/// Camera and clip state of one pass.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PassViewUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub clip: ClipPlaneUniforms,
}

impl PassViewUniforms {
    #[must_use]
    pub fn new(camera: &Camera, clip: ClipPlaneUniforms) -> Self {
        let view_proj = camera.view_projection_matrix();
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            camera_position: camera.position.extend(1.0).to_array(),
            clip,
        }
    }
}

/// Per-mesh transform and material color.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshUniforms {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl MeshUniforms {
    #[must_use]
    pub fn new(model: Mat4, color: Vec3) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            color: color.extend(1.0).to_array(),
        }
    }
}

/// Default material color of a slot.
#[must_use]
pub fn default_slot_color(slot: MeshSlot) -> Vec3 {
    match slot {
        MeshSlot::PoolBig => Vec3::new(0.82, 0.8, 0.72),
        MeshSlot::PoolSmall => Vec3::new(0.62, 0.7, 0.78),
        MeshSlot::Decor => Vec3::new(0.8, 0.3, 0.2),
        MeshSlot::Water => Vec3::new(0.1, 0.4, 0.6),
    }
}

/// A view uniform buffer and its bind group. One exists per pass, because
/// buffer writes made while recording all land before the single submit.
pub struct ViewBinding {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl ViewBinding {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&[PassViewUniforms::new(
                &Camera::default(),
                ClipPlaneUniforms::DISABLED,
            )]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }

    pub fn write(&self, queue: &wgpu::Queue, uniforms: &PassViewUniforms) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[*uniforms]));
    }
}

/// GPU buffers of one mesh.
pub struct MeshRenderData {
    pub slot: MeshSlot,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: Option<wgpu::BindGroup>,
}

impl MeshRenderData {
    /// Uploads a mesh. `mesh_layout` is `None` for meshes drawn without
    /// per-mesh uniforms (the water plane).
    pub fn new(
        device: &wgpu::Device,
        mesh_layout: Option<&wgpu::BindGroupLayout>,
        slot: MeshSlot,
        mesh: &MeshData,
        color: Vec3,
    ) -> Self {
        let label = slot.name();
        let vertices = SceneVertex::from_mesh(mesh);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertices")),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Uniforms")),
            contents: bytemuck::cast_slice(&[MeshUniforms::new(Mat4::IDENTITY, color)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = mesh_layout.map(|layout| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{label} Bind Group")),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            })
        });

        Self {
            slot,
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            uniform_buffer,
            bind_group,
        }
    }

    /// Changes the material color.
    pub fn set_color(&self, queue: &wgpu::Queue, color: Vec3) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[MeshUniforms::new(Mat4::IDENTITY, color)]),
        );
    }

    /// Records the draw. The pipeline and group 0 must already be set.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if let Some(bind_group) = &self.bind_group {
            pass.set_bind_group(1, bind_group, &[]);
        }
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Creates the group 0 layout holding [`PassViewUniforms`].
pub fn create_view_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("View Bind Group Layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// Pipelines for opaque meshes, one per pass target.
pub struct ScenePipelines {
    pub mesh_layout: wgpu::BindGroupLayout,
    below_water: wgpu::RenderPipeline,
    reflection: wgpu::RenderPipeline,
    screen: wgpu::RenderPipeline,
}

impl ScenePipelines {
    pub fn new(
        device: &wgpu::Device,
        view_layout: &wgpu::BindGroupLayout,
        screen_format: wgpu::TextureFormat,
    ) -> Self {
        let mesh_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mesh Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[view_layout, &mesh_layout],
            push_constant_ranges: &[],
        });

        let build = |label: &str, target: PassTarget| {
            create_mesh_pipeline(
                device,
                label,
                &shader,
                &layout,
                fragment_entry(target),
                &color_targets(target, screen_format),
            )
        };

        Self {
            below_water: build("Scene Pipeline (below water)", PassTarget::BelowWater),
            reflection: build("Scene Pipeline (reflection)", PassTarget::Reflection),
            screen: build("Scene Pipeline (screen)", PassTarget::Screen),
            mesh_layout,
        }
    }

    /// The pipeline matching a pass target's color attachments.
    #[must_use]
    pub fn pipeline(&self, target: PassTarget) -> &wgpu::RenderPipeline {
        match target {
            PassTarget::BelowWater => &self.below_water,
            PassTarget::Reflection => &self.reflection,
            PassTarget::Screen => &self.screen,
        }
    }
}

/// Fragment entry point for a pass target.
///
/// Below-water passes use `fs_capture`, which also writes the depth copy.
#[must_use]
pub fn fragment_entry(target: PassTarget) -> &'static str {
    match target {
        PassTarget::BelowWater => "fs_capture",
        PassTarget::Reflection | PassTarget::Screen => "fs_main",
    }
}

/// Color attachments written by a pass drawing into `target`.
#[must_use]
pub fn color_targets(
    target: PassTarget,
    screen_format: wgpu::TextureFormat,
) -> Vec<Option<wgpu::ColorTargetState>> {
    let color = |format: wgpu::TextureFormat| {
        Some(wgpu::ColorTargetState {
            format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        })
    };
    match target {
        PassTarget::BelowWater => vec![
            color(OFFSCREEN_COLOR_FORMAT),
            Some(wgpu::ColorTargetState {
                format: DEPTH_VALUE_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            }),
        ],
        PassTarget::Reflection => vec![color(OFFSCREEN_COLOR_FORMAT)],
        PassTarget::Screen => vec![color(screen_format)],
    }
}

/// Builds a depth-tested pipeline over [`SceneVertex`] with `vs_main` and `fragment_entry`.
pub(crate) fn create_mesh_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    fragment_entry: &str,
    targets: &[Option<wgpu::ColorTargetState>],
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[SceneVertex::layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // the mirrored camera flips winding, so nothing is culled
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
