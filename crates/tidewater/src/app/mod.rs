//! Application window and event loop management.

mod input;

use std::sync::Arc;
use std::time::Instant;

use winit::event_loop::EventLoop;
use winit::window::Window;

use tidewater_core::{Options, Result, TidewaterError};
use tidewater_render::{Camera, RenderEngine, RenderError};

use crate::assets::AssetLoader;
use crate::tuning::TuningAction;

/// Radians of orbit per pixel of drag.
const ORBIT_SPEED: f32 = 0.01;
/// Distance change per scroll line.
const ZOOM_SPEED: f32 = 0.5;

/// The tidewater application state.
pub struct App {
    pub(super) options: Options,
    pub(super) window: Option<Arc<Window>>,
    pub(super) engine: Option<RenderEngine>,
    pub(super) camera: Camera,
    pub(super) loader: Option<AssetLoader>,
    pub(super) start: Instant,
    pub(super) close_requested: bool,
    // Mouse state for camera control
    pub(super) mouse_pos: (f64, f64),
    pub(super) left_mouse_down: bool,
}

impl App {
    /// Creates the application and starts loading assets in the background.
    pub fn new(options: Options) -> Self {
        let aspect = options.window_width.max(1) as f32 / options.window_height.max(1) as f32;
        let camera = Camera::from_options(&options.camera, aspect);

        let loader = if options.assets.is_empty() {
            log::info!("no asset paths configured; using procedural scene");
            None
        } else {
            match AssetLoader::spawn(options.assets.clone(), options.decor_color) {
                Ok(loader) => Some(loader),
                Err(e) => {
                    log::warn!("could not start asset loader: {e}");
                    None
                }
            }
        };

        Self {
            options,
            window: None,
            engine: None,
            camera,
            loader,
            start: Instant::now(),
            close_requested: false,
            mouse_pos: (0.0, 0.0),
            left_mouse_down: false,
        }
    }

    /// Hands delivered assets to the engine.
    fn poll_assets(&mut self) {
        let (Some(loader), Some(engine)) = (&mut self.loader, &mut self.engine) else {
            return;
        };
        if let Some(bundle) = loader.poll() {
            engine.apply_assets(&bundle.manifest);
            if !bundle.failures.is_empty() {
                log::warn!("{} asset(s) fell back to placeholders", bundle.failures.len());
            }
        }
        if !loader.is_pending() {
            self.loader = None;
        }
    }

    /// Renders one frame.
    fn render(&mut self) {
        self.poll_assets();
        let Some(engine) = &mut self.engine else {
            return;
        };
        let time = self.start.elapsed().as_secs_f32();
        match engine.render_frame(&mut self.camera, time) {
            Ok(_) => {}
            Err(RenderError::OutOfMemory) => {
                log::error!("GPU out of memory; exiting");
                self.close_requested = true;
            }
            Err(e) => log::warn!("frame dropped: {e}"),
        }
    }

    /// Applies a tuning key to the live frame state.
    fn apply_tuning(&mut self, action: TuningAction) {
        let Some(engine) = &mut self.engine else {
            return;
        };
        let (tuning, visibility) = engine.frame_mut().tunables_mut();
        let description = action.apply(tuning, visibility);
        log::info!("{description}");
    }
}

/// Runs the windowed application until the window closes.
pub fn run_app(options: Options) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|e| TidewaterError::RenderError(format!("event loop: {e}")))?;
    let mut app = App::new(options);

    event_loop
        .run_app(&mut app)
        .map_err(|e| TidewaterError::RenderError(format!("event loop: {e}")))
}
