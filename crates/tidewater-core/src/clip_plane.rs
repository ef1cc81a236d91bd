//! Clip plane used while capturing the mirrored scene.
//!
//! The reflection pass must only see geometry above the water line, so a
//! half-space clip is switched on for exactly that pass. Fragments with
//! `dot(normal, p) + offset < 0` are discarded by the scene shader.

use glam::Vec3;

/// An oriented plane `dot(normal, p) + offset = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlane {
    /// Normal pointing toward kept geometry.
    pub normal: Vec3,
    /// Plane offset along the normal.
    pub offset: f32,
}

impl ClipPlane {
    /// The water surface: y = 0, keeping everything above it.
    pub const WATER: Self = Self {
        normal: Vec3::Y,
        offset: 0.0,
    };

    /// Creates a plane, normalizing `normal`.
    pub fn new(normal: Vec3, offset: f32) -> Self {
        Self {
            normal: normal.normalize_or(Vec3::Y),
            offset,
        }
    }

    /// Returns the signed distance from a point to the plane.
    ///
    /// Positive values are on the normal side (kept), negative on the opposite (discarded).
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.offset
    }

    /// Returns whether a point survives clipping.
    pub fn is_kept(&self, point: Vec3) -> bool {
        self.signed_distance(point) >= 0.0
    }
}

impl Default for ClipPlane {
    fn default() -> Self {
        Self::WATER
    }
}

/// GPU-compatible clip plane uniforms.
#[repr(C)]
#[allow(clippy::pub_underscore_fields)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ClipPlaneUniforms {
    /// Normal direction of the plane.
    pub normal: [f32; 3],
    /// Plane offset.
    pub offset: f32,
    /// Whether the plane is enabled (1.0) or disabled (0.0).
    pub enabled: f32,
    /// Padding for alignment.
    pub _padding: [f32; 3],
}

impl ClipPlaneUniforms {
    /// Uniforms for a disabled plane.
    pub const DISABLED: Self = Self {
        normal: [0.0, 1.0, 0.0],
        offset: 0.0,
        enabled: 0.0,
        _padding: [0.0; 3],
    };
}

impl From<&ClipPlane> for ClipPlaneUniforms {
    fn from(plane: &ClipPlane) -> Self {
        Self {
            normal: plane.normal.to_array(),
            offset: plane.offset,
            enabled: 1.0,
            _padding: [0.0; 3],
        }
    }
}

impl Default for ClipPlaneUniforms {
    fn default() -> Self {
        Self::DISABLED
    }
}

/// Holds the configured clip plane and whether it is currently applied.
///
/// The frame pipeline enables it right before the reflection pass and disables
/// it right after, so passes 1 and 3 never observe an active plane.
#[derive(Debug, Clone)]
pub struct ClipPlaneController {
    plane: ClipPlane,
    active: bool,
}

impl ClipPlaneController {
    /// Creates an inactive controller for the given plane.
    pub fn new(plane: ClipPlane) -> Self {
        Self {
            plane,
            active: false,
        }
    }

    /// Creates an inactive controller for the water surface plane.
    pub fn water() -> Self {
        Self::new(ClipPlane::WATER)
    }

    /// Activates the clip plane.
    pub fn enable(&mut self) {
        self.active = true;
    }

    /// Deactivates the clip plane.
    pub fn disable(&mut self) {
        self.active = false;
    }

    /// Returns whether the plane is currently applied.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the configured plane regardless of activation.
    pub fn plane(&self) -> ClipPlane {
        self.plane
    }

    /// Returns the plane if it is currently applied.
    pub fn active_plane(&self) -> Option<ClipPlane> {
        self.active.then_some(self.plane)
    }

    /// Snapshot of the current state for a pass's view uniforms.
    pub fn uniforms(&self) -> ClipPlaneUniforms {
        self.active_plane()
            .as_ref()
            .map_or(ClipPlaneUniforms::DISABLED, ClipPlaneUniforms::from)
    }
}

impl Default for ClipPlaneController {
    fn default() -> Self {
        Self::water()
    }
}
