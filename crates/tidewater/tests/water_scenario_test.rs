//! End-to-end checks of the water model without a GPU.
//!
//! The frame pipeline drives the uniform state exactly as the renderer does;
//! the CPU shading model then evaluates pixels against synthetic screen textures.

use tidewater::{Camera, MeshSlot, SceneVisibility, TuningAction, Vec2, Vec3, WaterTuning};
use tidewater_core::shading::{shade, ScreenTextures};
use tidewater_core::{PassKind, TargetTextures, Viewport};
use tidewater_render::{FramePipeline, NoopObserver, PassRecorder, PassSetup};

struct ConstantScreen {
    beneath: Vec3,
    depth: f32,
    reflection: Vec3,
}

impl ScreenTextures for ConstantScreen {
    fn below_color(&self, _uv: Vec2) -> Vec3 {
        self.beneath
    }

    fn below_depth(&self, _uv: Vec2) -> f32 {
        self.depth
    }

    fn reflection_color(&self, _uv: Vec2) -> Vec3 {
        self.reflection
    }
}

fn quiet_tuning() -> WaterTuning {
    WaterTuning {
        distortion_amplitude: 0.0,
        foam_depth: 0.0,
        reflection_enabled: false,
        specular_enabled: false,
        ..WaterTuning::default()
    }
}

fn pipeline_800x600(tuning: WaterTuning) -> (FramePipeline, Camera) {
    let mut camera = Camera::default();
    let mut frame = FramePipeline::new(
        Viewport::new(1, 1),
        &camera,
        tuning,
        SceneVisibility::default(),
    );
    frame.check_resize(800, 600, &mut camera);
    frame.begin_frame(1.0, &camera, TargetTextures::at_generation(1));
    (frame, camera)
}

fn screen_for(camera: &Camera, below: Vec3) -> ConstantScreen {
    ConstantScreen {
        beneath: Vec3::new(0.2, 0.4, 0.6),
        depth: camera.view_projection_matrix().project_point3(below).z,
        reflection: Vec3::ONE,
    }
}

#[test]
fn centre_pixel_of_800x600_frame() {
    let (frame, camera) = pipeline_800x600(quiet_tuning());
    assert_eq!(camera.position, Vec3::new(0.0, 4.0, 12.0));
    assert!((camera.aspect_ratio - 800.0 / 600.0).abs() < 1e-6);

    // on the central view ray, 1.5 below the surface
    let screen = screen_for(&camera, Vec3::new(0.0, -1.5, -4.5));
    let pixel = shade(frame.water(), Vec2::new(400.0, 300.0), Vec3::ZERO, &screen);

    assert_eq!(pixel.terms.scene_coord, Vec2::new(0.5, 0.5));
    assert_eq!(pixel.terms.distorted_coord, pixel.terms.scene_coord);
    assert!((pixel.terms.height_diff - 0.4).abs() < 1e-2);

    let tuning = frame.water().tuning();
    let expected = screen.beneath * 0.8 + tuning.color2.lerp(tuning.color1, 0.4) * 0.2;
    assert!(
        (pixel.color.truncate() - expected).length() < 1e-2,
        "got {}, expected {expected}",
        pixel.color
    );
}

#[test]
fn deeper_floor_tints_toward_deep_color() {
    let (frame, camera) = pipeline_800x600(quiet_tuning());
    let shallow = shade(
        frame.water(),
        Vec2::new(400.0, 300.0),
        Vec3::ZERO,
        &screen_for(&camera, Vec3::new(0.0, -0.5, -1.5)),
    );
    let deep = shade(
        frame.water(),
        Vec2::new(400.0, 300.0),
        Vec3::ZERO,
        &screen_for(&camera, Vec3::new(0.0, -2.0, -6.0)),
    );
    assert!(shallow.terms.height_diff > deep.terms.height_diff);
    assert!(deep.terms.height_diff >= 0.0);
}

#[test]
fn reflection_key_changes_the_next_frame() {
    let (mut frame, camera) = pipeline_800x600(quiet_tuning());
    {
        let (tuning, visibility) = frame.tunables_mut();
        let message = TuningAction::ToggleReflection.apply(tuning, visibility);
        assert_eq!(message, "reflection on");
    }
    frame.begin_frame(2.0, &camera, TargetTextures::at_generation(1));

    let screen = screen_for(&camera, Vec3::new(0.0, -1.5, -4.5));
    let pixel = shade(frame.water(), Vec2::new(400.0, 300.0), Vec3::ZERO, &screen);
    let expected = pixel.terms.base.lerp(Vec3::ONE, 1.0 - pixel.terms.fresnel);
    assert!((pixel.color.truncate() - expected).length() < 1e-5);
}

#[derive(Default)]
struct SlotLog(Vec<(PassKind, Vec<MeshSlot>)>);

impl PassRecorder for SlotLog {
    type Error = std::convert::Infallible;

    fn record_pass(&mut self, setup: &PassSetup<'_>) -> Result<(), Self::Error> {
        self.0.push((setup.kind, setup.slots.clone()));
        Ok(())
    }
}

#[test]
fn visibility_keys_reach_every_pass() {
    let (mut frame, camera) = pipeline_800x600(quiet_tuning());
    {
        let (tuning, visibility) = frame.tunables_mut();
        TuningAction::TogglePoolBig.apply(tuning, visibility);
        TuningAction::TogglePoolSmall.apply(tuning, visibility);
    }

    let mut log = SlotLog::default();
    frame
        .run_passes(&camera, &mut log, &mut NoopObserver)
        .unwrap();

    for (kind, slots) in &log.0 {
        assert!(!slots.contains(&MeshSlot::PoolBig), "{kind:?} drew poolBig");
        if *kind == PassKind::Reflection {
            assert!(!slots.contains(&MeshSlot::PoolSmall));
        }
    }
    assert!(log.0[0].1.contains(&MeshSlot::PoolSmall));
    assert!(log.0[2].1.contains(&MeshSlot::PoolSmall));
    assert!(log.0[2].1.contains(&MeshSlot::Water));
}
