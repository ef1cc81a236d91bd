//! Camera and view management.

use glam::{Mat4, Vec3};
use tidewater_core::CameraOptions;

/// A perspective camera for viewing the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
}

impl Camera {
    /// Creates a camera looking at the origin from (0, 4, 12) with a 75° field of view.
    #[must_use]
    pub fn new(aspect_ratio: f32) -> Self {
        Self::from_options(&CameraOptions::default(), aspect_ratio)
    }

    /// Creates a camera from configured defaults.
    #[must_use]
    pub fn from_options(options: &CameraOptions, aspect_ratio: f32) -> Self {
        let mut camera = Self {
            position: options.position,
            target: options.target,
            up: Vec3::Y,
            fov: options.fov_degrees.to_radians(),
            aspect_ratio,
            near: options.near,
            far: options.far,
        };
        camera.set_fov(camera.fov);
        camera.set_near(camera.near);
        camera.set_far(camera.far);
        camera
    }

    /// Sets the aspect ratio.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Returns the view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Returns the projection matrix (depth range [0, 1]).
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
    }

    /// Returns the combined view-projection matrix.
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Returns the camera-to-world matrix.
    #[must_use]
    pub fn world_matrix(&self) -> Mat4 {
        self.view_matrix().inverse()
    }

    /// Returns the inverse of the projection matrix.
    #[must_use]
    pub fn inverse_projection_matrix(&self) -> Mat4 {
        self.projection_matrix().inverse()
    }

    /// Returns the unit view direction.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Z)
    }

    /// Orbits around the target, keeping the distance.
    pub fn orbit(&mut self, delta_x: f32, delta_y: f32) {
        let radius = (self.position - self.target).length();
        if radius <= f32::EPSILON {
            return;
        }
        let mut theta = (self.position.x - self.target.x).atan2(self.position.z - self.target.z);
        let mut phi = ((self.position.y - self.target.y) / radius)
            .clamp(-1.0, 1.0)
            .acos();

        theta -= delta_x;
        phi = (phi - delta_y).clamp(0.01, std::f32::consts::PI - 0.01);

        self.position = self.target
            + Vec3::new(
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
                radius * phi.sin() * theta.cos(),
            );
    }

    /// Moves toward (positive delta) or away from the target.
    pub fn zoom(&mut self, delta: f32) {
        let direction = self.forward();
        let distance = (self.position - self.target).length();
        let new_distance = (distance - delta).max(0.1);
        self.position = self.target - direction * new_distance;
    }

    /// Sets the field of view in radians.
    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov.clamp(0.1, std::f32::consts::PI - 0.1);
    }

    /// Sets the near clipping plane.
    pub fn set_near(&mut self, near: f32) {
        self.near = near.max(0.001);
    }

    /// Sets the far clipping plane.
    pub fn set_far(&mut self, far: f32) {
        self.far = far.max(self.near + 0.1);
    }

    /// Returns FOV in degrees.
    #[must_use]
    pub fn fov_degrees(&self) -> f32 {
        self.fov.to_degrees()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}
