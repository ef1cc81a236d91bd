//! Headless rendering API for tidewater.
//!
//! Renders the water scene to an image buffer or file without opening a
//! window. Assets named in the options are loaded synchronously first.

use std::path::Path;

use pollster::FutureExt;
use tidewater_core::{AssetManifest, Options, Result};
use tidewater_render::{Camera, RenderEngine};

use crate::assets::load_bundle;

/// Renders one frame at `time` seconds to a raw RGBA pixel buffer.
///
/// The returned buffer has `width * height * 4` bytes, ordered row by row from
/// the top-left. Zero sizes are clamped to 1.
///
/// # Example
/// ```no_run
/// use tidewater::*;
///
/// let pixels = render_to_image(&Options::default(), 800, 600, 0.0).unwrap();
/// assert_eq!(pixels.len(), 800 * 600 * 4);
/// ```
pub fn render_to_image(options: &Options, width: u32, height: u32, time: f32) -> Result<Vec<u8>> {
    let width = width.max(1);
    let height = height.max(1);

    let mut engine = RenderEngine::new_headless(width, height, options.tuning, options.visibility)
        .block_on()?;

    let manifest = if options.assets.is_empty() {
        let mut manifest = AssetManifest::new();
        manifest.decor_color = options.decor_color;
        manifest
    } else {
        load_bundle(&options.assets, options.decor_color).manifest
    };
    engine.apply_assets(&manifest);

    let mut camera = Camera::from_options(&options.camera, width as f32 / height as f32);
    engine.render_frame(&mut camera, time)?;
    Ok(engine.capture_frame()?)
}

/// Renders one frame and saves it as PNG or JPEG (chosen by extension).
pub fn render_to_file(
    options: &Options,
    path: impl AsRef<Path>,
    width: u32,
    height: u32,
    time: f32,
) -> Result<()> {
    let data = render_to_image(options, width, height, time)?;
    tidewater_render::save_image(path, &data, width.max(1), height.max(1))?;
    Ok(())
}
