//! CPU evaluation of the water surface shading.
//!
//! [`shade`] runs the same per-pixel steps as the fragment stage of `water.wgsl`
//! and is what the tests check the shading rules against. The GPU program is
//! authoritative for what ends up on screen; keep both in step when changing
//! either.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::noise::distortion_offset;
use crate::water::{FrameInputs, WaterUniformState};

/// Depths at or below this are treated as "immediate full effect".
pub const DEPTH_EPSILON: f32 = 1e-4;

/// Side length of the water plane mesh.
pub const WATER_PLANE_SIZE: f32 = 20.0;

/// Weight of the refracted scene in the base color; the tint gets the rest.
pub const SCENE_WEIGHT: f32 = 0.8;

/// Exponent of the specular highlight.
pub const SPECULAR_EXPONENT: f32 = 256.0;

/// Fixed offset decorrelating the second normal-map sample.
pub const NORMAL_SAMPLE_SHIFT: Vec2 = Vec2::new(0.37, 0.61);

/// Direction the single overhead light travels.
pub const LIGHT_DIRECTION: Vec3 = Vec3::NEG_Y;

/// Screen-space texture reads needed by the water program.
///
/// `uv` is in [0, 1] with the origin at the top-left, as in wgpu texture space.
pub trait ScreenTextures {
    fn below_color(&self, uv: Vec2) -> Vec3;
    /// Normalized device depth in [0, 1].
    fn below_depth(&self, uv: Vec2) -> f32;
    fn reflection_color(&self, uv: Vec2) -> Vec3;
}

/// Intermediate values of one shaded pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingTerms {
    pub scene_coord: Vec2,
    pub offset: Vec2,
    pub distorted_coord: Vec2,
    pub distorted_reflection_coord: Vec2,
    pub world_position: Vec3,
    pub height_diff: f32,
    pub foam_factor: f32,
    pub foam_density: f32,
    pub fresnel: f32,
    pub specular: f32,
    pub base: Vec3,
}

/// Final color plus the terms that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadedPixel {
    pub color: Vec4,
    pub terms: ShadingTerms,
}

/// How far below the water line `world_y` is, as a fraction of `depth` in [0, 1].
///
/// A `depth` at or below [`DEPTH_EPSILON`] turns this into a step: 0 at or above
/// the water line, 1 below it.
pub fn depth_ratio(world_y: f32, depth: f32) -> f32 {
    let below = 0.0 - world_y;
    if depth <= DEPTH_EPSILON {
        return if below > 0.0 { 1.0 } else { 0.0 };
    }
    let ratio = below / depth;
    if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, 1.0)
    }
}

/// 1 at the water line, fading to 0 at `max_depth` below it.
pub fn height_diff(world_y: f32, max_depth: f32) -> f32 {
    1.0 - depth_ratio(world_y, max_depth)
}

/// 1 at the water line, fading to 0 at `foam_depth` below it.
pub fn foam_factor(world_y: f32, foam_depth: f32) -> f32 {
    1.0 - depth_ratio(world_y, foam_depth)
}

/// Binary foam flag: the mask value passes when it reaches `1 - foam_factor`.
pub fn foam_density(mask: f32, foam_factor: f32) -> f32 {
    if mask >= 1.0 - foam_factor {
        1.0
    } else {
        0.0
    }
}

/// Un-projects a screen-space point through the inverse projection and the
/// camera world matrix, dividing by w after each.
pub fn reconstruct_world_position(
    uv: Vec2,
    depth: f32,
    inverse_projection: Mat4,
    camera_world: Mat4,
) -> Vec3 {
    let clip = Vec4::new(uv.x * 2.0 - 1.0, (1.0 - uv.y) * 2.0 - 1.0, depth, 1.0);
    let view = perspective_divide(inverse_projection * clip);
    perspective_divide(camera_world * view).truncate()
}

fn perspective_divide(v: Vec4) -> Vec4 {
    if v.w.abs() <= f32::EPSILON {
        v
    } else {
        v / v.w
    }
}

/// `pow` that stays finite: a zero base yields 0 (or 1 for a zero exponent).
fn safe_pow(base: f32, exponent: f32) -> f32 {
    if base <= 0.0 {
        if exponent <= 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        base.powf(exponent)
    }
}

/// Fresnel weight; 1 looking straight down, 0 at grazing angles.
pub fn fresnel(view_dir: Vec3, fresnel_factor: f32) -> f32 {
    safe_pow(view_dir.dot(Vec3::Y).max(0.0), fresnel_factor).clamp(0.0, 1.0)
}

/// Decodes a normal-map texel: X from red, Z from green, Y from blue.
pub fn unpack_normal(texel: Vec4) -> Vec3 {
    Vec3::new(texel.x * 2.0 - 1.0, texel.z * 2.0 - 1.0, texel.y * 2.0 - 1.0).normalize_or(Vec3::Y)
}

/// Highlight of the overhead light reflected off `normal`.
pub fn specular(view_dir: Vec3, normal: Vec3, fresnel: f32) -> f32 {
    let reflected = LIGHT_DIRECTION - 2.0 * LIGHT_DIRECTION.dot(normal) * normal;
    safe_pow(view_dir.dot(reflected).max(0.0), SPECULAR_EXPONENT) * (1.0 - fresnel)
}

/// Texture coordinate of a point on the water plane.
pub fn surface_uv(surface_position: Vec3) -> Vec2 {
    Vec2::new(surface_position.x, surface_position.z) / WATER_PLANE_SIZE + 0.5
}

/// Screen-space coordinate of a fragment.
pub fn scene_coord(frag_coord: Vec2, frame: &FrameInputs) -> Vec2 {
    frag_coord / frame.viewport_size.max(Vec2::ONE)
}

/// Shades one water fragment.
///
/// `frag_coord` is the pixel position (top-left origin) and `surface_position`
/// the world position of the water surface under that pixel.
pub fn shade<S: ScreenTextures>(
    state: &WaterUniformState,
    frag_coord: Vec2,
    surface_position: Vec3,
    screen: &S,
) -> ShadedPixel {
    let frame = state.frame();
    let tuning = state.tuning();
    let time = frame.time;

    let coord = scene_coord(frag_coord, frame);
    let offset = distortion_offset(
        coord,
        tuning.distortion_frequency,
        tuning.distortion_amplitude,
        time,
    );
    let distorted_coord = coord + offset;
    let distorted_reflection_coord = Vec2::new(1.0 - coord.x, coord.y) + offset;

    let scene_beneath = screen.below_color(distorted_coord);
    let reflection = screen.reflection_color(distorted_reflection_coord);

    let depth = screen.below_depth(coord);
    let world = reconstruct_world_position(
        coord,
        depth,
        frame.camera_inverse_projection,
        frame.camera_world_matrix,
    );

    let height = height_diff(world.y, tuning.max_depth);
    let tint = tuning.color2.lerp(tuning.color1, height);
    let base = scene_beneath * SCENE_WEIGHT + tint * (1.0 - SCENE_WEIGHT);

    let uv = surface_uv(surface_position);
    let foam = foam_factor(world.y, tuning.foam_depth);
    let mask_uv = uv * tuning.foam_tiling + Vec2::splat(time * tuning.foam_speed);
    let density = foam_density(state.foam_mask().sample_wrap(mask_uv).x, foam);
    let foam_color = if tuning.solid_foam {
        tuning.foam_color * density
    } else {
        tuning.foam_color * foam * density
    };

    let view_dir = (frame.camera_position() - world).normalize_or(Vec3::Y);
    let fresnel = fresnel(view_dir, tuning.fresnel_factor);

    let n1 = state.normal_map().sample_wrap(uv * 0.5 + offset);
    let n2 = state
        .normal_map()
        .sample_wrap(uv * 0.8 - offset * 0.5 + NORMAL_SAMPLE_SHIFT);
    let normal = unpack_normal((n1 + n2) * 0.5);
    let spec = specular(view_dir, normal, fresnel);

    let mut color = base;
    if tuning.specular_enabled {
        color += Vec3::splat(spec);
    }
    if tuning.reflection_enabled {
        color = color.lerp(reflection, 1.0 - fresnel);
    }
    color += foam_color;

    let color = if color.is_finite() {
        color.clamp(Vec3::ZERO, Vec3::ONE)
    } else {
        Vec3::ZERO
    };

    ShadedPixel {
        color: color.extend(1.0),
        terms: ShadingTerms {
            scene_coord: coord,
            offset,
            distorted_coord,
            distorted_reflection_coord,
            world_position: world,
            height_diff: height,
            foam_factor: foam,
            foam_density: density,
            fresnel,
            specular: spec,
            base,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::TextureImage;
    use crate::water::{TargetTextures, WaterTuning};

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

    fn camera_matrices(eye: Vec3, aspect: f32) -> (Mat4, Mat4, Mat4) {
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(75f32.to_radians(), aspect, 0.01, 1000.0);
        (view, proj, proj * view)
    }

    fn frame_for(eye: Vec3, size: Vec2, time: f32) -> FrameInputs {
        let (view, proj, _) = camera_matrices(eye, size.x / size.y);
        FrameInputs {
            time,
            viewport_size: size,
            textures: TargetTextures::default(),
            camera_inverse_projection: proj.inverse(),
            camera_world_matrix: view.inverse(),
        }
    }

    fn quiet_state(tuning: WaterTuning) -> WaterUniformState {
        let mut state = WaterUniformState::new(tuning);
        state.set_static_textures(
            TextureImage::solid([128, 128, 128, 255]),
            TextureImage::flat_normal_map(),
        );
        state
    }

    #[test]
    fn test_depth_ratio_zero_depth_is_step() {
        assert_eq!(depth_ratio(0.0, 0.0), 0.0);
        assert_eq!(depth_ratio(0.5, 0.0), 0.0);
        assert_eq!(depth_ratio(-0.001, 0.0), 1.0);
        assert_eq!(depth_ratio(-3.0, -1.0), 1.0);
    }

    #[test]
    fn test_height_diff_at_surface_is_one() {
        assert_eq!(height_diff(0.0, 2.5), 1.0);
        assert!((height_diff(-1.5, 2.5) - 0.4).abs() < 1e-6);
        assert_eq!(height_diff(-10.0, 2.5), 0.0);
    }

    #[test]
    fn test_foam_threshold_inclusive() {
        let f = 0.25;
        assert_eq!(foam_density(1.0 - f, f), 1.0);
        assert_eq!(foam_density(0.749, f), 0.0);
        assert_eq!(foam_density(0.0, 1.0), 1.0);
    }

    #[test]
    fn test_fresnel_straight_down_and_grazing() {
        assert!((fresnel(Vec3::Y, 0.5) - 1.0).abs() < 1e-6);
        assert_eq!(fresnel(Vec3::X, 0.5), 0.0);
        assert_eq!(fresnel(Vec3::X, 0.0), 1.0);
        assert_eq!(fresnel(Vec3::NEG_Y, 2.0), 0.0);
    }

    #[test]
    fn test_unpack_flat_normal() {
        let n = unpack_normal(TextureImage::flat_normal_map().texel(0, 0));
        assert!(n.dot(Vec3::Y) > 0.999);
    }

    #[test]
    fn test_specular_peaks_on_mirror_direction() {
        // light travels down, a flat surface bounces it straight up
        let top = specular(Vec3::Y, Vec3::Y, 0.0);
        assert!((top - 1.0).abs() < 1e-5);
        let side = specular(Vec3::new(1.0, 1.0, 0.0).normalize(), Vec3::Y, 0.0);
        assert!(side < 1e-6);
        assert_eq!(specular(Vec3::Y, Vec3::Y, 1.0), 0.0);
    }

    #[test]
    fn test_reconstruct_round_trip() {
        let eye = Vec3::new(0.0, 4.0, 12.0);
        let (view, proj, view_proj) = camera_matrices(eye, 4.0 / 3.0);
        let point = Vec3::new(1.2, -0.7, -2.0);
        let ndc = view_proj.project_point3(point);
        let uv = Vec2::new(ndc.x * 0.5 + 0.5, 1.0 - (ndc.y * 0.5 + 0.5));
        let world = reconstruct_world_position(uv, ndc.z, proj.inverse(), view.inverse());
        assert!((world - point).length() < 1e-2, "got {world}");
    }

    #[test]
    fn test_zero_amplitude_leaves_coords_undistorted() {
        let tuning = WaterTuning {
            distortion_amplitude: 0.0,
            ..WaterTuning::default()
        };
        let mut state = quiet_state(tuning);
        state.refresh(frame_for(Vec3::new(0.0, 4.0, 12.0), Vec2::new(800.0, 600.0), 7.25));
        let screen = ConstantScreen {
            beneath: Vec3::splat(0.5),
            depth: 0.999,
            reflection: Vec3::ONE,
        };
        let pixel = shade(&state, Vec2::new(123.0, 456.0), Vec3::ZERO, &screen);
        assert_eq!(pixel.terms.distorted_coord, pixel.terms.scene_coord);
        assert_eq!(pixel.terms.offset, Vec2::ZERO);
        assert_eq!(
            pixel.terms.distorted_reflection_coord,
            Vec2::new(1.0 - pixel.terms.scene_coord.x, pixel.terms.scene_coord.y)
        );
    }

    #[test]
    fn test_end_to_end_centre_pixel() {
        let eye = Vec3::new(0.0, 4.0, 12.0);
        let size = Vec2::new(800.0, 600.0);
        let tuning = WaterTuning {
            distortion_amplitude: 0.0,
            foam_depth: 0.0,
            reflection_enabled: false,
            specular_enabled: false,
            ..WaterTuning::default()
        };
        let mut state = quiet_state(tuning);
        state.refresh(frame_for(eye, size, 1.0));

        // on the central view ray
        let below = Vec3::new(0.0, -1.5, -4.5);
        let (_, _, view_proj) = camera_matrices(eye, size.x / size.y);
        let depth = view_proj.project_point3(below).z;
        let screen = ConstantScreen {
            beneath: Vec3::new(0.2, 0.4, 0.6),
            depth,
            reflection: Vec3::ONE,
        };

        let pixel = shade(&state, Vec2::new(400.0, 300.0), Vec3::new(0.0, 0.0, 1.0), &screen);
        assert_eq!(pixel.terms.scene_coord, Vec2::new(0.5, 0.5));
        assert!((pixel.terms.world_position.y + 1.5).abs() < 1e-2);
        assert!((pixel.terms.height_diff - 0.4).abs() < 1e-2);
        assert_eq!(pixel.terms.foam_density, 0.0);

        let t = state.tuning();
        let expected = screen.beneath * 0.8 + t.color2.lerp(t.color1, 0.4) * 0.2;
        assert!(
            (pixel.color.truncate() - expected).length() < 1e-3,
            "got {}, expected {expected}",
            pixel.color
        );
        assert_eq!(pixel.color.w, 1.0);
    }

    #[test]
    fn test_reflection_blends_toward_reflection_color() {
        let eye = Vec3::new(0.0, 4.0, 12.0);
        let size = Vec2::new(800.0, 600.0);
        let mut state = quiet_state(WaterTuning {
            distortion_amplitude: 0.0,
            foam_depth: 0.0,
            specular_enabled: false,
            ..WaterTuning::default()
        });
        state.refresh(frame_for(eye, size, 0.0));
        let screen = ConstantScreen {
            beneath: Vec3::ZERO,
            depth: 0.9995,
            reflection: Vec3::ONE,
        };
        let pixel = shade(&state, Vec2::new(400.0, 300.0), Vec3::ZERO, &screen);
        let expected = pixel.terms.base.lerp(Vec3::ONE, 1.0 - pixel.terms.fresnel);
        assert!((pixel.color.truncate() - expected).length() < 1e-5);
        assert!(pixel.terms.fresnel > 0.0 && pixel.terms.fresnel < 1.0);
    }

    #[test]
    fn test_solid_foam_at_water_line() {
        let eye = Vec3::new(0.0, 4.0, 12.0);
        let size = Vec2::new(800.0, 600.0);
        let mut state = quiet_state(WaterTuning {
            distortion_amplitude: 0.0,
            reflection_enabled: false,
            specular_enabled: false,
            solid_foam: true,
            ..WaterTuning::default()
        });
        state.refresh(frame_for(eye, size, 0.0));

        // a point right on the water line gives foam factor 1, so any mask passes
        let (_, _, view_proj) = camera_matrices(eye, size.x / size.y);
        let depth = view_proj.project_point3(Vec3::ZERO).z;
        let screen = ConstantScreen {
            beneath: Vec3::ZERO,
            depth,
            reflection: Vec3::ZERO,
        };
        let pixel = shade(&state, Vec2::new(400.0, 300.0), Vec3::ZERO, &screen);
        assert!(pixel.terms.foam_factor > 0.9);
        assert_eq!(pixel.terms.foam_density, 1.0);
        assert_eq!(pixel.color.truncate(), Vec3::ONE);
    }
}
