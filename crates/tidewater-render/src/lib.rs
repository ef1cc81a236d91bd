//! Rendering backend for tidewater.
//!
//! This crate provides the wgpu-based water pipeline, including:
//! - Main and mirrored reflection cameras
//! - The below-water and reflection render targets
//! - Scene, sky and water pipelines (WGSL)
//! - Per-frame pass orchestration with GPU-free hooks ([`frame`])
//! - Headless capture and image export

pub mod camera;
pub mod engine;
pub mod error;
pub mod frame;
pub mod reflection;
pub mod render_target;
pub mod scene_render;
pub mod screenshot;
pub mod sky_render;
pub mod textures;
pub mod water_render;

pub use camera::Camera;
pub use engine::{BelowWaterCapture, FrameStatus, RenderEngine};
pub use error::{RenderError, RenderResult};
pub use frame::{FramePipeline, NoopObserver, PassObserver, PassRecorder, PassSetup};
pub use reflection::{mirror_camera, reflection_matrix, water_reflection_matrix, ReflectionCameraController};
pub use render_target::{
    RenderTarget, RenderTargetSet, ResizeGate, DEPTH_FORMAT, DEPTH_VALUE_FORMAT, OFFSCREEN_COLOR_FORMAT,
};
pub use scene_render::{MeshRenderData, MeshUniforms, PassViewUniforms, SceneVertex};
pub use screenshot::{encode_png, save_image, ImageFileFormat};
pub use sky_render::SkyRenderer;
pub use water_render::WaterRenderer;
