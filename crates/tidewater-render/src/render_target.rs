//! Offscreen render targets for the below-water and reflection passes.
//!
//! [`RenderTargetSet::resize`] is the only place the targets are reallocated.
//! Each reallocation bumps a generation counter; consumers holding bind groups
//! over the old views compare generations to know when to rebuild.

use tidewater_core::{PassTarget, TargetTextures, Viewport};

/// Color format of the offscreen targets.
pub const OFFSCREEN_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Depth format of every depth attachment.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Format of the below-water depth copy the water shader reads with `textureLoad`.
///
/// Holds normalized device depth in `[0, 1]`, written as a second color output
/// of the below-water pass. Depth textures cannot be loaded on every backend.
pub const DEPTH_VALUE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;

/// Value the depth copy is cleared to (the far plane).
pub const DEPTH_VALUE_CLEAR: f64 = 1.0;

/// Size bookkeeping for a resizable set of textures, independent of the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeGate {
    viewport: Viewport,
    generation: u64,
}

impl ResizeGate {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: Viewport::new(width, height),
            generation: 0,
        }
    }

    /// Records a requested size. Returns `true` when reallocation is needed.
    pub fn request(&mut self, width: u32, height: u32) -> bool {
        if self.viewport.update(width, height) {
            self.generation += 1;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.viewport.size()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Depth attachment of a target plus the float copy shaders read.
struct DepthBuffers {
    attachment: (wgpu::Texture, wgpu::TextureView),
    value: (wgpu::Texture, wgpu::TextureView),
}

/// A color texture with optional depth buffers of the same size.
pub struct RenderTarget {
    color_texture: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth: Option<DepthBuffers>,
    width: u32,
    height: u32,
}

impl RenderTarget {
    /// Allocates the target. With depth, it also gets an `R32Float` depth copy.
    pub fn new(device: &wgpu::Device, label: &str, width: u32, height: u32, with_depth: bool) -> Self {
        let color_texture = create_texture(
            device,
            &format!("{label} Color"),
            width,
            height,
            OFFSCREEN_COLOR_FORMAT,
            wgpu::TextureUsages::COPY_SRC,
        );
        let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth = with_depth.then(|| DepthBuffers {
            attachment: create_depth_texture(device, &format!("{label} Depth"), width, height),
            value: create_depth_value_texture(device, &format!("{label} Depth Value"), width, height),
        });

        Self {
            color_texture,
            color_view,
            depth,
            width,
            height,
        }
    }

    #[must_use]
    pub fn color_texture(&self) -> &wgpu::Texture {
        &self.color_texture
    }

    #[must_use]
    pub fn color_view(&self) -> &wgpu::TextureView {
        &self.color_view
    }

    /// The depth attachment.
    #[must_use]
    pub fn depth_view(&self) -> Option<&wgpu::TextureView> {
        self.depth.as_ref().map(|depth| &depth.attachment.1)
    }

    /// The `R32Float` copy of the depth attachment.
    #[must_use]
    pub fn depth_value_texture(&self) -> Option<&wgpu::Texture> {
        self.depth.as_ref().map(|depth| &depth.value.0)
    }

    #[must_use]
    pub fn depth_value_view(&self) -> Option<&wgpu::TextureView> {
        self.depth.as_ref().map(|depth| &depth.value.1)
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Views a pass attaches. The pass "binds" the target by opening a render pass
/// over these views and "unbinds" it by ending that pass.
pub struct TargetAttachments<'a> {
    pub color: &'a wgpu::TextureView,
    pub depth: &'a wgpu::TextureView,
    /// Second color attachment receiving the depth copy, if the target keeps one.
    pub depth_value: Option<&'a wgpu::TextureView>,
}

/// The two offscreen targets plus a scratch depth buffer.
///
/// The reflection target owns no depth; the reflection and screen passes share
/// the scratch depth, which is never sampled.
pub struct RenderTargetSet {
    gate: ResizeGate,
    below_water: RenderTarget,
    reflection: RenderTarget,
    scratch_depth: (wgpu::Texture, wgpu::TextureView),
}

impl RenderTargetSet {
    /// Allocates all targets at the given size (clamped to at least 1x1).
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let gate = ResizeGate::new(width, height);
        let (width, height) = gate.size();
        Self {
            gate,
            below_water: RenderTarget::new(device, "Below Water Target", width, height, true),
            reflection: RenderTarget::new(device, "Reflection Target", width, height, false),
            scratch_depth: create_depth_texture(device, "Scratch Depth", width, height),
        }
    }

    /// Reallocates every target if the (clamped) size changed.
    ///
    /// Returns `true` if a reallocation happened.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        if !self.gate.request(width, height) {
            return false;
        }
        let (width, height) = self.gate.size();
        self.below_water = RenderTarget::new(device, "Below Water Target", width, height, true);
        self.reflection = RenderTarget::new(device, "Reflection Target", width, height, false);
        self.scratch_depth = create_depth_texture(device, "Scratch Depth", width, height);
        log::info!(
            "render targets reallocated at {width}x{height} (generation {})",
            self.gate.generation()
        );
        true
    }

    /// Number of reallocations so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.gate.generation()
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.gate.size()
    }

    #[must_use]
    pub fn below_water(&self) -> &RenderTarget {
        &self.below_water
    }

    #[must_use]
    pub fn reflection(&self) -> &RenderTarget {
        &self.reflection
    }

    /// Depth buffer for passes whose target has none of its own.
    #[must_use]
    pub fn scratch_depth_view(&self) -> &wgpu::TextureView {
        &self.scratch_depth.1
    }

    /// Views to attach for an offscreen pass; `None` for the screen.
    #[must_use]
    pub fn attachments(&self, target: PassTarget) -> Option<TargetAttachments<'_>> {
        match target {
            PassTarget::BelowWater => Some(TargetAttachments {
                color: self.below_water.color_view(),
                depth: self
                    .below_water
                    .depth_view()
                    .unwrap_or(self.scratch_depth_view()),
                depth_value: self.below_water.depth_value_view(),
            }),
            PassTarget::Reflection => Some(TargetAttachments {
                color: self.reflection.color_view(),
                depth: self.scratch_depth_view(),
                depth_value: None,
            }),
            PassTarget::Screen => None,
        }
    }

    /// Typed handles to the current textures.
    #[must_use]
    pub fn texture_handles(&self) -> TargetTextures {
        TargetTextures::at_generation(self.generation())
    }
}

fn create_texture(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    extra_usage: wgpu::TextureUsages,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | extra_usage,
        view_formats: &[],
    })
}

/// Creates a depth texture and its view.
pub fn create_depth_texture(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = create_texture(
        device,
        label,
        width,
        height,
        DEPTH_FORMAT,
        wgpu::TextureUsages::empty(),
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn create_depth_value_texture(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = create_texture(
        device,
        label,
        width,
        height,
        DEPTH_VALUE_FORMAT,
        wgpu::TextureUsages::COPY_SRC,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}
