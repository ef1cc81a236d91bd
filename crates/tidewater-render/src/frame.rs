//! Per-frame orchestration of the three passes.
//!
//! Each frame:
//! 1. [`FramePipeline::check_resize`] applies the host's size (no-op if unchanged)
//! 2. [`FramePipeline::begin_frame`] re-derives the reflection camera and
//!    refreshes the time-varying water uniforms
//! 3. [`FramePipeline::run_passes`] walks [`PassKind::ORDER`], enabling the clip
//!    plane strictly around the reflection pass
//!
//! Recording is delegated to a [`PassRecorder`] so the ordering and visibility
//! rules can be exercised without a GPU.

use tidewater_core::{
    ClipPlaneController, FrameInputs, MeshSlot, PassCamera, PassConfig, PassKind,
    SceneVisibility, TargetTextures, Viewport, WaterTuning, WaterUniformState,
};

use crate::camera::Camera;
use crate::reflection::ReflectionCameraController;
use crate::scene_render::PassViewUniforms;

/// Everything a recorder needs to encode one pass.
#[derive(Debug, Clone)]
pub struct PassSetup<'a> {
    pub kind: PassKind,
    pub config: PassConfig,
    /// Camera the pass renders through.
    pub camera: &'a Camera,
    /// View uniforms with the clip plane snapshot for this pass.
    pub view: PassViewUniforms,
    /// Meshes to draw, after combining the pass table with user visibility.
    pub slots: Vec<MeshSlot>,
}

impl PassSetup<'_> {
    /// Whether the clip plane was active while this pass was set up.
    #[must_use]
    pub fn clip_active(&self) -> bool {
        self.view.clip.enabled > 0.5
    }
}

/// Encodes one pass.
pub trait PassRecorder {
    type Error;

    fn record_pass(&mut self, setup: &PassSetup<'_>) -> Result<(), Self::Error>;
}

/// Hooks at pass boundaries.
pub trait PassObserver {
    fn pass_started(&mut self, _setup: &PassSetup<'_>) {}

    fn pass_finished(&mut self, _kind: PassKind) {}
}

/// Observer that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PassObserver for NoopObserver {}

/// Frame-level state of the water pipeline.
#[derive(Debug, Clone)]
pub struct FramePipeline {
    viewport: Viewport,
    reflection: ReflectionCameraController,
    clip: ClipPlaneController,
    water: WaterUniformState,
    visibility: SceneVisibility,
    frame_index: u64,
}

impl FramePipeline {
    pub fn new(
        viewport: Viewport,
        camera: &Camera,
        tuning: WaterTuning,
        visibility: SceneVisibility,
    ) -> Self {
        Self {
            viewport,
            reflection: ReflectionCameraController::new(camera),
            clip: ClipPlaneController::water(),
            water: WaterUniformState::new(tuning),
            visibility,
            frame_index: 0,
        }
    }

    /// Applies the host's current size and keeps the camera aspect in sync.
    ///
    /// Returns `true` only if the viewport changed; render targets must then be resized.
    pub fn check_resize(&mut self, width: u32, height: u32, camera: &mut Camera) -> bool {
        let changed = self.viewport.update(width, height);
        camera.set_aspect_ratio(self.viewport.aspect_ratio());
        changed
    }

    /// Updates everything derived from the main camera and the clock.
    pub fn begin_frame(&mut self, time: f32, camera: &Camera, textures: TargetTextures) {
        self.reflection.update(camera);
        self.water.refresh(FrameInputs {
            time,
            viewport_size: self.viewport.as_vec2(),
            textures,
            camera_inverse_projection: camera.inverse_projection_matrix(),
            camera_world_matrix: camera.world_matrix(),
        });
    }

    /// Runs the three passes in order.
    ///
    /// The clip plane is enabled right before the reflection pass is set up and
    /// disabled right after it is recorded, including when recording fails.
    pub fn run_passes<R, O>(
        &mut self,
        camera: &Camera,
        recorder: &mut R,
        observer: &mut O,
    ) -> Result<(), R::Error>
    where
        R: PassRecorder,
        O: PassObserver,
    {
        for kind in PassKind::ORDER {
            let config = kind.config();
            if config.clip_plane {
                self.clip.enable();
            }

            let pass_camera = match config.camera {
                PassCamera::Main => camera,
                PassCamera::Reflection => self.reflection.camera(),
            };
            let setup = PassSetup {
                kind,
                config,
                camera: pass_camera,
                view: PassViewUniforms::new(pass_camera, self.clip.uniforms()),
                slots: config.drawn_slots(&self.visibility),
            };

            log::debug!("{}: drawing {:?}", kind.label(), setup.slots);
            observer.pass_started(&setup);
            let result = recorder.record_pass(&setup);
            observer.pass_finished(kind);

            if config.clip_plane {
                self.clip.disable();
            }
            result?;
        }
        self.frame_index += 1;
        Ok(())
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn water(&self) -> &WaterUniformState {
        &self.water
    }

    pub fn water_mut(&mut self) -> &mut WaterUniformState {
        &mut self.water
    }

    #[must_use]
    pub fn visibility(&self) -> &SceneVisibility {
        &self.visibility
    }

    pub fn visibility_mut(&mut self) -> &mut SceneVisibility {
        &mut self.visibility
    }

    /// The state a tuning collaborator may change between frames.
    pub fn tunables_mut(&mut self) -> (&mut WaterTuning, &mut SceneVisibility) {
        (self.water.tuning_mut(), &mut self.visibility)
    }

    #[must_use]
    pub fn reflection_camera(&self) -> &Camera {
        self.reflection.camera()
    }

    #[must_use]
    pub fn clip(&self) -> &ClipPlaneController {
        &self.clip
    }

    /// Number of frames fully recorded.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}
