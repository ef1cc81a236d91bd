//! Water shading parameters.
//!
//! [`WaterUniformState`] holds two disjoint field groups:
//! - [`FrameInputs`], rewritten once per frame by [`WaterUniformState::refresh`]
//! - [`WaterTuning`], written only through [`WaterUniformState::tuning_mut`]
//!
//! plus the two static textures (foam mask and normal map).

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::texture::TextureImage;

/// The offscreen textures the water program samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetTexture {
    /// Color of everything under the water, seen from the main camera.
    BelowWaterColor,
    /// Depth of everything under the water, seen from the main camera.
    BelowWaterDepth,
    /// Color of the scene mirrored across the water plane.
    ReflectionColor,
}

/// Reference to a render-target texture at a given allocation generation.
///
/// Render targets are reallocated on resize; the generation tells the GPU side
/// whether its bind group still points at current views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetTextureHandle {
    pub kind: TargetTexture,
    pub generation: u64,
}

impl TargetTextureHandle {
    pub fn new(kind: TargetTexture, generation: u64) -> Self {
        Self { kind, generation }
    }
}

/// The three texture references refreshed every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetTextures {
    pub below_color: TargetTextureHandle,
    pub below_depth: TargetTextureHandle,
    pub reflection_color: TargetTextureHandle,
}

impl TargetTextures {
    /// Handles for all three targets at one generation.
    pub fn at_generation(generation: u64) -> Self {
        Self {
            below_color: TargetTextureHandle::new(TargetTexture::BelowWaterColor, generation),
            below_depth: TargetTextureHandle::new(TargetTexture::BelowWaterDepth, generation),
            reflection_color: TargetTextureHandle::new(TargetTexture::ReflectionColor, generation),
        }
    }
}

impl Default for TargetTextures {
    fn default() -> Self {
        Self::at_generation(0)
    }
}

/// The time-varying field group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInputs {
    /// Seconds since start.
    pub time: f32,
    /// Viewport size in pixels.
    pub viewport_size: Vec2,
    pub textures: TargetTextures,
    /// Inverse of the main camera's projection matrix.
    pub camera_inverse_projection: Mat4,
    /// Main camera's camera-to-world matrix (inverse view).
    pub camera_world_matrix: Mat4,
}

impl FrameInputs {
    /// World-space camera position, taken from the world matrix translation.
    pub fn camera_position(&self) -> Vec3 {
        self.camera_world_matrix.w_axis.truncate()
    }
}

impl Default for FrameInputs {
    fn default() -> Self {
        Self {
            time: 0.0,
            viewport_size: Vec2::ONE,
            textures: TargetTextures::default(),
            camera_inverse_projection: Mat4::IDENTITY,
            camera_world_matrix: Mat4::IDENTITY,
        }
    }
}

/// The user-tunable field group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterTuning {
    pub distortion_frequency: f32,
    pub distortion_amplitude: f32,
    /// Depth below the surface at which the tint reaches `color2`.
    pub max_depth: f32,
    /// Depth below the surface at which foam disappears.
    pub foam_depth: f32,
    pub foam_tiling: f32,
    pub foam_speed: f32,
    /// Shallow tint.
    pub color1: Vec3,
    /// Deep tint.
    pub color2: Vec3,
    pub fresnel_factor: f32,
    pub foam_color: Vec3,
    pub solid_foam: bool,
    pub reflection_enabled: bool,
    pub specular_enabled: bool,
}

impl WaterTuning {
    /// Amount added or removed per amplitude key press.
    pub const AMPLITUDE_STEP: f32 = 0.001;
    /// Amount added or removed per max-depth key press.
    pub const MAX_DEPTH_STEP: f32 = 0.25;
}

impl Default for WaterTuning {
    fn default() -> Self {
        Self {
            distortion_frequency: 20.0,
            distortion_amplitude: 0.005,
            max_depth: 2.5,
            foam_depth: 0.25,
            foam_tiling: 8.0,
            foam_speed: 0.05,
            color1: Vec3::new(0.09, 0.52, 0.62),
            color2: Vec3::new(0.02, 0.13, 0.25),
            fresnel_factor: 0.5,
            foam_color: Vec3::ONE,
            solid_foam: false,
            reflection_enabled: true,
            specular_enabled: true,
        }
    }
}

/// Bits of [`WaterUniforms::flags`].
pub mod flags {
    pub const REFLECTION: u32 = 1;
    pub const SPECULAR: u32 = 1 << 1;
    pub const SOLID_FOAM: u32 = 1 << 2;
}

/// GPU uniform block for the water program. Layout matches `WaterUniforms` in `water.wgsl`.
#[repr(C)]
#[allow(clippy::pub_underscore_fields)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct WaterUniforms {
    pub inverse_projection: [[f32; 4]; 4],
    pub camera_world: [[f32; 4]; 4],
    pub color1: [f32; 4],
    pub color2: [f32; 4],
    pub foam_color: [f32; 4],
    pub camera_position: [f32; 4],
    pub viewport_size: [f32; 2],
    pub time: f32,
    pub distortion_frequency: f32,
    pub distortion_amplitude: f32,
    pub max_depth: f32,
    pub foam_depth: f32,
    pub foam_tiling: f32,
    pub foam_speed: f32,
    pub fresnel_factor: f32,
    pub flags: u32,
    pub _padding: f32,
}

/// All shading parameters of one water mesh.
#[derive(Debug, Clone)]
pub struct WaterUniformState {
    frame: FrameInputs,
    tuning: WaterTuning,
    foam_mask: TextureImage,
    normal_map: TextureImage,
}

impl WaterUniformState {
    /// Creates the state with procedural static textures.
    pub fn new(tuning: WaterTuning) -> Self {
        Self {
            frame: FrameInputs::default(),
            tuning,
            foam_mask: TextureImage::procedural_foam(128),
            normal_map: TextureImage::procedural_normal_map(128),
        }
    }

    /// Overwrites the time-varying group. Tuning is left untouched.
    pub fn refresh(&mut self, inputs: FrameInputs) {
        self.frame = inputs;
    }

    pub fn frame(&self) -> &FrameInputs {
        &self.frame
    }

    pub fn tuning(&self) -> &WaterTuning {
        &self.tuning
    }

    /// Mutable access for the tuning collaborator.
    pub fn tuning_mut(&mut self) -> &mut WaterTuning {
        &mut self.tuning
    }

    pub fn foam_mask(&self) -> &TextureImage {
        &self.foam_mask
    }

    pub fn normal_map(&self) -> &TextureImage {
        &self.normal_map
    }

    /// Replaces the static textures once the real images have loaded.
    pub fn set_static_textures(&mut self, foam_mask: TextureImage, normal_map: TextureImage) {
        self.foam_mask = foam_mask;
        self.normal_map = normal_map;
    }

    /// Packs both field groups for upload.
    pub fn gpu_uniforms(&self) -> WaterUniforms {
        let t = &self.tuning;
        let mut bits = 0;
        if t.reflection_enabled {
            bits |= flags::REFLECTION;
        }
        if t.specular_enabled {
            bits |= flags::SPECULAR;
        }
        if t.solid_foam {
            bits |= flags::SOLID_FOAM;
        }

        WaterUniforms {
            inverse_projection: self.frame.camera_inverse_projection.to_cols_array_2d(),
            camera_world: self.frame.camera_world_matrix.to_cols_array_2d(),
            color1: t.color1.extend(1.0).to_array(),
            color2: t.color2.extend(1.0).to_array(),
            foam_color: t.foam_color.extend(1.0).to_array(),
            camera_position: self.frame.camera_position().extend(1.0).to_array(),
            viewport_size: self.frame.viewport_size.to_array(),
            time: self.frame.time,
            distortion_frequency: t.distortion_frequency,
            distortion_amplitude: t.distortion_amplitude,
            max_depth: t.max_depth,
            foam_depth: t.foam_depth,
            foam_tiling: t.foam_tiling,
            foam_speed: t.foam_speed,
            fresnel_factor: t.fresnel_factor,
            flags: bits,
            _padding: 0.0,
        }
    }
}

impl Default for WaterUniformState {
    fn default() -> Self {
        Self::new(WaterTuning::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_size_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<WaterUniforms>(), 240);
        assert_eq!(std::mem::size_of::<WaterUniforms>() % 16, 0);
    }

    #[test]
    fn test_refresh_leaves_tuning_untouched() {
        let mut state = WaterUniformState::default();
        state.tuning_mut().distortion_amplitude = 0.02;
        state.tuning_mut().solid_foam = true;
        let before = *state.tuning();

        state.refresh(FrameInputs {
            time: 3.5,
            viewport_size: Vec2::new(800.0, 600.0),
            textures: TargetTextures::at_generation(4),
            camera_inverse_projection: Mat4::perspective_rh(1.0, 1.3, 0.1, 100.0).inverse(),
            camera_world_matrix: Mat4::from_translation(Vec3::new(0.0, 4.0, 12.0)),
        });

        assert_eq!(*state.tuning(), before);
        assert_eq!(state.frame().time, 3.5);
        assert_eq!(state.frame().textures.below_depth.generation, 4);
        assert_eq!(state.frame().camera_position(), Vec3::new(0.0, 4.0, 12.0));
    }

    #[test]
    fn test_tuning_defaults() {
        let t = WaterTuning::default();
        assert_eq!(t.distortion_frequency, 20.0);
        assert_eq!(t.max_depth, 2.5);
        assert!(t.reflection_enabled && t.specular_enabled && !t.solid_foam);
    }

    #[test]
    fn test_gpu_uniform_flags() {
        let mut state = WaterUniformState::default();
        assert_eq!(state.gpu_uniforms().flags, flags::REFLECTION | flags::SPECULAR);

        state.tuning_mut().reflection_enabled = false;
        state.tuning_mut().specular_enabled = false;
        state.tuning_mut().solid_foam = true;
        assert_eq!(state.gpu_uniforms().flags, flags::SOLID_FOAM);
    }

    #[test]
    fn test_gpu_uniforms_carry_camera_position() {
        let mut state = WaterUniformState::default();
        state.refresh(FrameInputs {
            camera_world_matrix: Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            ..FrameInputs::default()
        });
        assert_eq!(state.gpu_uniforms().camera_position, [1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn test_tuning_json_partial() {
        let t: WaterTuning = serde_json::from_str(r#"{"max_depth": 4.0}"#).unwrap();
        assert_eq!(t.max_depth, 4.0);
        assert_eq!(t.foam_tiling, 8.0);
    }
}
