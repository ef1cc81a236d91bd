//! Viewport size tracking.

use glam::Vec2;

/// Smallest extent a viewport (and every render target derived from it) may have.
pub const MIN_VIEWPORT_EXTENT: u32 = 1;

/// Pixel size of the visible drawing area.
///
/// Width and height are always at least [`MIN_VIEWPORT_EXTENT`]; a host reporting
/// a zero-sized area (e.g. a minimized window) is clamped rather than propagated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    /// Creates a viewport, clamping degenerate extents.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(MIN_VIEWPORT_EXTENT),
            height: height.max(MIN_VIEWPORT_EXTENT),
        }
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the size as a float vector, as fed to shaders.
    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Returns width / height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Applies the host's current size.
    ///
    /// Returns `true` only if the (clamped) size differs from the current one, so
    /// re-reporting the same size is a no-op.
    pub fn update(&mut self, width: u32, height: u32) -> bool {
        let next = Self::new(width, height);
        if next == *self {
            return false;
        }
        log::debug!(
            "viewport resized {}x{} -> {}x{}",
            self.width,
            self.height,
            next.width,
            next.height
        );
        *self = next;
        true
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_degenerate_size_is_clamped() {
        let viewport = Viewport::new(0, 0);
        assert_eq!(viewport.size(), (1, 1));
        assert!(viewport.aspect_ratio().is_finite());
    }

    #[test]
    fn test_update_same_size_is_noop() {
        let mut viewport = Viewport::new(800, 600);
        assert!(!viewport.update(800, 600));
        assert!(viewport.update(1024, 768));
        assert!(!viewport.update(1024, 768));
    }

    #[test]
    fn test_update_zero_after_clamp() {
        let mut viewport = Viewport::new(1, 1);
        // 0x0 clamps to the current 1x1, nothing changes
        assert!(!viewport.update(0, 0));
    }

    proptest! {
        #[test]
        fn prop_update_tracks_size(w in 1u32..8192, h in 1u32..8192) {
            let mut viewport = Viewport::default();
            viewport.update(w, h);
            prop_assert_eq!(viewport.size(), (w, h));
            prop_assert!((viewport.aspect_ratio() - w as f32 / h as f32).abs() < 1e-6);
            prop_assert!(!viewport.update(w, h));
        }
    }
}
