//! The rendering engine: device, surface, render targets and renderers.

mod capture;
mod recorder;

pub use capture::{
    aligned_bytes_per_row, decode_r32f, decode_rgba16f, read_texture, strip_row_padding,
    BelowWaterCapture, CaptureTarget, CAPTURE_FORMAT,
};
pub use recorder::{view_slot, GpuPassRecorder};

use std::sync::Arc;

use glam::Vec3;
use tidewater_core::shading::WATER_PLANE_SIZE;
use tidewater_core::{AssetManifest, MeshData, MeshSlot, SceneVisibility, Viewport, WaterTuning};

use crate::camera::Camera;
use crate::error::{RenderError, RenderResult};
use crate::frame::{FramePipeline, NoopObserver, PassObserver};
use crate::render_target::RenderTargetSet;
use crate::scene_render::{
    create_view_bind_group_layout, default_slot_color, MeshRenderData, ScenePipelines, ViewBinding,
};
use crate::sky_render::SkyRenderer;
use crate::water_render::WaterRenderer;

/// Where the composite pass ends up.
enum Presentation {
    Surface(wgpu::Surface<'static>),
    Capture(CaptureTarget),
}

/// What happened to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// All three passes were submitted.
    Rendered,
    /// The surface was lost or outdated and has been reconfigured; try again next frame.
    Skipped,
}

/// The water rendering engine backed by wgpu.
pub struct RenderEngine {
    /// The wgpu device.
    pub device: wgpu::Device,
    /// The wgpu queue.
    pub queue: wgpu::Queue,
    presentation: Presentation,
    surface_config: wgpu::SurfaceConfiguration,
    targets: RenderTargetSet,
    views: [ViewBinding; 3],
    scene: ScenePipelines,
    sky: SkyRenderer,
    water: WaterRenderer,
    meshes: Vec<MeshRenderData>,
    water_mesh: MeshRenderData,
    frame: FramePipeline,
    decor_color: Vec3,
}

impl RenderEngine {
    /// Creates an engine presenting to a window.
    pub async fn new_windowed(
        window: Arc<winit::window::Window>,
        tuning: WaterTuning,
        visibility: SceneVisibility,
    ) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::AdapterCreationFailed)?;

        let (device, queue) = request_device(&adapter, "tidewater device").await?;

        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::SurfaceConfigurationFailed)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        log::info!(
            "render engine ready: {} ({:?}), {width}x{height}, {surface_format:?}",
            adapter.get_info().name,
            adapter.get_info().backend
        );

        Self::from_parts(
            device,
            queue,
            Presentation::Surface(surface),
            surface_config,
            tuning,
            visibility,
        )
        .await
    }

    /// Creates an engine that renders into an offscreen capture target.
    pub async fn new_headless(
        width: u32,
        height: u32,
        tuning: WaterTuning,
        visibility: SceneVisibility,
    ) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::AdapterCreationFailed)?;

        let (device, queue) = request_device(&adapter, "tidewater device (headless)").await?;

        let width = width.max(1);
        let height = height.max(1);
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            format: CAPTURE_FORMAT,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        let capture = CaptureTarget::new(&device, width, height);

        log::info!(
            "headless render engine ready: {} ({:?}), {width}x{height}",
            adapter.get_info().name,
            adapter.get_info().backend
        );

        Self::from_parts(
            device,
            queue,
            Presentation::Capture(capture),
            surface_config,
            tuning,
            visibility,
        )
        .await
    }

    /// Builds targets, pipelines and placeholder content.
    ///
    /// Shader and pipeline validation errors are captured and returned instead
    /// of reaching the device's uncaptured error handler.
    async fn from_parts(
        device: wgpu::Device,
        queue: wgpu::Queue,
        presentation: Presentation,
        surface_config: wgpu::SurfaceConfiguration,
        tuning: WaterTuning,
        visibility: SceneVisibility,
    ) -> RenderResult<Self> {
        let (width, height) = (surface_config.width, surface_config.height);
        let screen_format = surface_config.format;
        let viewport = Viewport::new(width, height);
        let camera = Camera::new(viewport.aspect_ratio());
        let frame = FramePipeline::new(viewport, &camera, tuning, visibility);

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let targets = RenderTargetSet::new(&device, width, height);
        let view_layout = create_view_bind_group_layout(&device);
        let views = [
            ViewBinding::new(&device, &view_layout, "Below Water View"),
            ViewBinding::new(&device, &view_layout, "Reflection View"),
            ViewBinding::new(&device, &view_layout, "Composite View"),
        ];
        let scene = ScenePipelines::new(&device, &view_layout, screen_format);
        let sky = SkyRenderer::new(&device, &queue, &view_layout, screen_format);
        let water = WaterRenderer::new(&device, &queue, &view_layout, screen_format, frame.water());

        // placeholder content until the asset loader delivers
        let placeholders = AssetManifest::new();
        let decor_color = placeholders.decor_color;
        let meshes = build_scene_meshes(&device, &scene, &placeholders, decor_color);
        let water_mesh = build_water_mesh(&device, &placeholders);
        if let Some(err) = device.pop_error_scope().await {
            return Err(RenderError::PipelineCreationFailed(err.to_string()));
        }

        Ok(Self {
            device,
            queue,
            presentation,
            surface_config,
            targets,
            views,
            scene,
            sky,
            water,
            meshes,
            water_mesh,
            frame,
            decor_color,
        })
    }

    /// Reconfigures the surface or capture target. Render targets follow on the next frame.
    ///
    /// Zero sizes are clamped to 1; repeating the current size does nothing.
    pub fn resize(&mut self, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        if (self.surface_config.width, self.surface_config.height) == (width, height) {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;

        match &mut self.presentation {
            Presentation::Surface(surface) => surface.configure(&self.device, &self.surface_config),
            Presentation::Capture(capture) => *capture = CaptureTarget::new(&self.device, width, height),
        }
    }

    /// Current output size.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    /// Renders one frame through the three passes.
    pub fn render_frame(&mut self, camera: &mut Camera, time: f32) -> RenderResult<FrameStatus> {
        self.render_frame_observed(camera, time, &mut NoopObserver)
    }

    /// Renders one frame, reporting pass boundaries to `observer`.
    pub fn render_frame_observed<O: PassObserver>(
        &mut self,
        camera: &mut Camera,
        time: f32,
        observer: &mut O,
    ) -> RenderResult<FrameStatus> {
        let (width, height) = self.dimensions();
        self.frame.check_resize(width, height, camera);
        self.targets.resize(&self.device, width, height);

        self.frame
            .begin_frame(time, camera, self.targets.texture_handles());
        self.water
            .upload_uniforms(&self.queue, &self.frame.water().gpu_uniforms());
        self.water.prepare(&self.device, &self.targets);

        let surface_texture = match &self.presentation {
            Presentation::Surface(surface) => match surface.get_current_texture() {
                Ok(texture) => Some(texture),
                Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                    log::warn!("{err}; reconfiguring surface");
                    surface.configure(&self.device, &self.surface_config);
                    return Ok(FrameStatus::Skipped);
                }
                Err(err) => return Err(err.into()),
            },
            Presentation::Capture(_) => None,
        };
        let screen_view = match (&surface_texture, &self.presentation) {
            (Some(texture), _) => texture
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default()),
            (None, Presentation::Capture(capture)) => capture.create_view(),
            (None, Presentation::Surface(_)) => return Err(RenderError::SurfaceLost),
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tidewater frame encoder"),
            });
        let mut recorder = GpuPassRecorder {
            queue: &self.queue,
            encoder: &mut encoder,
            screen_view: &screen_view,
            targets: &self.targets,
            views: &self.views,
            scene: &self.scene,
            sky: &self.sky,
            water: &self.water,
            meshes: &self.meshes,
            water_mesh: &self.water_mesh,
        };
        self.frame.run_passes(camera, &mut recorder, observer)?;

        self.queue.submit(std::iter::once(encoder.finish()));
        if let Some(texture) = surface_texture {
            texture.present();
        }
        Ok(FrameStatus::Rendered)
    }

    /// Reads back the last frame rendered by a headless engine.
    pub fn capture_frame(&self) -> RenderResult<Vec<u8>> {
        match &self.presentation {
            Presentation::Capture(capture) => capture.read_pixels(&self.device, &self.queue),
            Presentation::Surface(_) => Err(RenderError::CaptureFailed(
                "frame capture needs a headless engine".to_string(),
            )),
        }
    }

    /// Reads back the below-water color and depth copy of the last frame.
    pub fn capture_below_water(&self) -> RenderResult<BelowWaterCapture> {
        let below = self.targets.below_water();
        let (width, height) = below.size();
        let depth_texture = below
            .depth_value_texture()
            .ok_or_else(|| RenderError::CaptureFailed("below-water target has no depth copy".to_string()))?;

        let color = read_texture(&self.device, &self.queue, below.color_texture(), 8)?;
        let depth = read_texture(&self.device, &self.queue, depth_texture, 4)?;
        Ok(BelowWaterCapture {
            width,
            height,
            color: decode_rgba16f(&color),
            depth: decode_r32f(&depth),
        })
    }

    /// Swaps placeholder content for loaded assets.
    pub fn apply_assets(&mut self, manifest: &AssetManifest) {
        self.decor_color = manifest.decor_color;
        self.meshes = build_scene_meshes(&self.device, &self.scene, manifest, self.decor_color);
        self.water_mesh = build_water_mesh(&self.device, manifest);

        if let Some(environment) = &manifest.environment {
            self.sky.set_environment(&self.device, &self.queue, environment);
        }

        let foam_mask = manifest.foam_mask_or_placeholder();
        let normal_map = manifest.normal_map_or_placeholder();
        self.water
            .set_static_textures(&self.device, &self.queue, &foam_mask, &normal_map);
        self.frame
            .water_mut()
            .set_static_textures(foam_mask, normal_map);

        log::info!(
            "assets applied: {} scene meshes, environment {}",
            self.meshes.len(),
            if manifest.environment.is_some() { "loaded" } else { "placeholder" }
        );
    }

    /// Changes the decorative mesh's material color.
    pub fn set_decor_color(&mut self, color: Vec3) {
        self.decor_color = color;
        for mesh in self.meshes.iter().filter(|m| m.slot == MeshSlot::Decor) {
            mesh.set_color(&self.queue, color);
        }
    }

    #[must_use]
    pub fn decor_color(&self) -> Vec3 {
        self.decor_color
    }

    /// Frame-level state: tuning, visibility, reflection camera.
    #[must_use]
    pub fn frame(&self) -> &FramePipeline {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut FramePipeline {
        &mut self.frame
    }

    #[must_use]
    pub fn targets(&self) -> &RenderTargetSet {
        &self.targets
    }

    /// Generation of the targets the water bind group references.
    #[must_use]
    pub fn water_bound_generation(&self) -> Option<u64> {
        self.water.bound_generation()
    }
}

async fn request_device(
    adapter: &wgpu::Adapter,
    label: &str,
) -> RenderResult<(wgpu::Device, wgpu::Queue)> {
    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some(label),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        )
        .await?;
    Ok((device, queue))
}

fn build_scene_meshes(
    device: &wgpu::Device,
    scene: &ScenePipelines,
    manifest: &AssetManifest,
    decor_color: Vec3,
) -> Vec<MeshRenderData> {
    MeshSlot::SCENE
        .into_iter()
        .filter(|slot| *slot != MeshSlot::Water)
        .filter_map(|slot| {
            let mesh = manifest.mesh(slot)?;
            let color = if slot == MeshSlot::Decor {
                decor_color
            } else {
                default_slot_color(slot)
            };
            Some(MeshRenderData::new(
                device,
                Some(&scene.mesh_layout),
                slot,
                &mesh,
                color,
            ))
        })
        .collect()
}

fn build_water_mesh(device: &wgpu::Device, manifest: &AssetManifest) -> MeshRenderData {
    let mesh = manifest
        .mesh(MeshSlot::Water)
        .unwrap_or_else(|| MeshData::plane(WATER_PLANE_SIZE));
    MeshRenderData::new(device, None, MeshSlot::Water, &mesh, Vec3::ONE)
}
