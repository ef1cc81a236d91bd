//! Core abstractions for tidewater.
//!
//! This crate holds everything about the water pipeline that does not need a GPU:
//! - [`WaterUniformState`] with its frame-driven and user-tunable field groups
//! - The per-frame pass table ([`PassKind`], [`PassConfig`]) and draw-item filtering
//! - [`ClipPlaneController`] for the reflection pass
//! - Gradient [`noise`] shared with the water shader
//! - [`Viewport`] tracking with degenerate-size clamping
//! - A CPU evaluation of the water shading model ([`shading`])
//! - Typed asset manifest, mesh and texture data, and configuration options

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Options structs legitimately have many boolean flags
#![allow(clippy::struct_excessive_bools)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Pixel and texel math converts between integer and float freely
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod assets;
pub mod clip_plane;
pub mod error;
pub mod mesh;
pub mod noise;
pub mod options;
pub mod pass;
pub mod shading;
pub mod texture;
pub mod viewport;
pub mod water;

pub use assets::{AssetManifest, EnvironmentMap, MeshSlot, SceneVisibility};
pub use clip_plane::{ClipPlane, ClipPlaneController, ClipPlaneUniforms};
pub use error::{Result, TidewaterError};
pub use mesh::MeshData;
pub use options::{AssetPaths, CameraOptions, Options};
pub use pass::{PassCamera, PassConfig, PassKind, PassTarget};
pub use shading::{ScreenTextures, ShadedPixel, ShadingTerms};
pub use texture::TextureImage;
pub use viewport::Viewport;
pub use water::{
    FrameInputs, TargetTexture, TargetTextureHandle, TargetTextures, WaterTuning,
    WaterUniformState, WaterUniforms,
};

// Re-export glam types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};
