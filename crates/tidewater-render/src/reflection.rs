//! Planar reflection utilities.
//!
//! The reflection pass renders the scene through a camera mirrored across the
//! water plane y = 0. The camera's up vector is flipped as well, so the captured
//! image comes out mirrored left to right, which the water shader undoes by
//! sampling at `(1 - u, v)`.

use glam::{Mat4, Vec3, Vec4};

use crate::camera::Camera;

/// Computes a reflection matrix for a plane.
///
/// The plane is defined by a point on the plane and its normal.
/// The resulting matrix reflects points across this plane.
pub fn reflection_matrix(plane_point: Vec3, plane_normal: Vec3) -> Mat4 {
    let n = plane_normal.normalize();
    let d = -plane_point.dot(n);

    Mat4::from_cols(
        Vec4::new(1.0 - 2.0 * n.x * n.x, -2.0 * n.x * n.y, -2.0 * n.x * n.z, 0.0),
        Vec4::new(-2.0 * n.x * n.y, 1.0 - 2.0 * n.y * n.y, -2.0 * n.y * n.z, 0.0),
        Vec4::new(-2.0 * n.x * n.z, -2.0 * n.y * n.z, 1.0 - 2.0 * n.z * n.z, 0.0),
        Vec4::new(-2.0 * n.x * d, -2.0 * n.y * d, -2.0 * n.z * d, 1.0),
    )
}

/// Reflection across the water plane y = 0.
pub fn water_reflection_matrix() -> Mat4 {
    reflection_matrix(Vec3::ZERO, Vec3::Y)
}

/// Keeps a camera mirrored across the water plane in sync with the main camera.
#[derive(Debug, Clone)]
pub struct ReflectionCameraController {
    camera: Camera,
}

impl ReflectionCameraController {
    /// Creates the controller with a camera already mirrored from `main`.
    #[must_use]
    pub fn new(main: &Camera) -> Self {
        Self {
            camera: mirror_camera(main),
        }
    }

    /// Re-derives the reflection camera from the main camera. Called once per frame.
    pub fn update(&mut self, main: &Camera) {
        self.camera = mirror_camera(main);
    }

    /// The current reflection camera.
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }
}

/// Mirrors `main` across y = 0.
///
/// The position and the look-at point `position + forward` are reflected, the up
/// vector becomes -Y, and the lens settings are copied.
#[must_use]
pub fn mirror_camera(main: &Camera) -> Camera {
    let mirror = water_reflection_matrix();
    let look_point = main.position + main.forward();
    Camera {
        position: mirror.transform_point3(main.position),
        target: mirror.transform_point3(look_point),
        up: Vec3::NEG_Y,
        fov: main.fov,
        aspect_ratio: main.aspect_ratio,
        near: main.near,
        far: main.far,
    }
}
