//! tidewater: real-time stylized water rendering.
//!
//! A water plane is shaded from two offscreen captures of the scene: what lies
//! below the surface (color and depth) and a planar reflection from a camera
//! mirrored across `y = 0`. The water shader combines them with animated
//! distortion, a depth tint, shoreline foam, a Fresnel term and specular.
//!
//! # Quick Start
//!
//! ```no_run
//! use tidewater::*;
//!
//! fn main() -> Result<()> {
//!     let options = Options::from_env_or_args(std::env::args());
//!     // Opens the window and blocks until it closes
//!     run(options)
//! }
//! ```
//!
//! # Frame
//!
//! Each frame runs three passes in order:
//! - **below water**: pools and decor into an offscreen color and depth target
//! - **reflection**: decor through the mirrored camera, clipped at the surface
//! - **composite**: everything plus the water surface to the screen
//!
//! Without a window, [`render_to_image`] and [`render_to_file`] run the same frame
//! on an offscreen target.

mod app;
pub mod assets;
pub mod headless;
pub mod tuning;

// Re-export core types
pub use tidewater_core::{
    AssetManifest, AssetPaths, CameraOptions, MeshData, MeshSlot, Options, Result,
    SceneVisibility, TextureImage, TidewaterError, WaterTuning, Mat4, Vec2, Vec3, Vec4,
};

// Re-export render types
pub use tidewater_render::{Camera, FrameStatus, RenderEngine, RenderError};

pub use assets::{load_bundle, AssetBundle, AssetLoader};
pub use headless::{render_to_file, render_to_image};
pub use tuning::TuningAction;

/// Opens the viewer window.
///
/// This function blocks until the window is closed.
pub fn run(options: Options) -> Result<()> {
    let _ = env_logger::try_init();
    log::info!("tidewater starting");
    app::run_app(options)
}
