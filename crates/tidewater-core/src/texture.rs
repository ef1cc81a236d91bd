//! CPU-side RGBA8 images for the water's static textures.
//!
//! The foam mask and the normal perturbation map are sampled with repeat
//! addressing. Until the real images arrive, procedural stand-ins built from
//! [`noise`](crate::noise::noise) are used.

use glam::{Vec2, Vec3, Vec4};

use crate::error::{Result, TidewaterError};
use crate::noise::noise;

/// An 8-bit RGBA image stored row-major, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl TextureImage {
    /// Wraps raw RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(TidewaterError::InvalidAsset(format!(
                "texture has zero extent ({width}x{height})"
            )));
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(TidewaterError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A 1x1 image of a single color.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            data: rgba.to_vec(),
        }
    }

    /// A normal map whose every texel encodes the +Y normal.
    pub fn flat_normal_map() -> Self {
        Self::solid([128, 128, 255, 255])
    }

    /// Tileable noise mask used for foam before the real mask is loaded.
    pub fn procedural_foam(size: u32) -> Self {
        let size = size.max(1);
        let cells = 8.0;
        Self::generate(size, |uv| {
            let v = tileable_noise(uv, cells) * 0.5 + 0.5;
            let byte = to_byte(v);
            [byte, byte, byte, 255]
        })
    }

    /// Tileable normal map derived from the noise gradient.
    ///
    /// Encoding matches the water shader: X in red, Z in green, Y in blue.
    pub fn procedural_normal_map(size: u32) -> Self {
        let size = size.max(1);
        let cells = 6.0;
        let step = 1.0 / size as f32;
        let strength = 0.6;
        Self::generate(size, |uv| {
            let dx = tileable_noise(uv + Vec2::new(step, 0.0), cells)
                - tileable_noise(uv - Vec2::new(step, 0.0), cells);
            let dz = tileable_noise(uv + Vec2::new(0.0, step), cells)
                - tileable_noise(uv - Vec2::new(0.0, step), cells);
            let n = Vec3::new(-dx * strength, 1.0, -dz * strength).normalize();
            [
                to_byte(n.x * 0.5 + 0.5),
                to_byte(n.z * 0.5 + 0.5),
                to_byte(n.y * 0.5 + 0.5),
                255,
            ]
        })
    }

    fn generate(size: u32, mut texel: impl FnMut(Vec2) -> [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(size as usize * size as usize * 4);
        for y in 0..size {
            for x in 0..size {
                let uv = Vec2::new(
                    (x as f32 + 0.5) / size as f32,
                    (y as f32 + 0.5) / size as f32,
                );
                data.extend_from_slice(&texel(uv));
            }
        }
        Self {
            width: size,
            height: size,
            data,
        }
    }

    /// Returns the width in texels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height in texels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the raw RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns one texel as normalized floats.
    pub fn texel(&self, x: u32, y: u32) -> Vec4 {
        let i = (y.min(self.height - 1) as usize * self.width as usize
            + x.min(self.width - 1) as usize)
            * 4;
        Vec4::new(
            f32::from(self.data[i]),
            f32::from(self.data[i + 1]),
            f32::from(self.data[i + 2]),
            f32::from(self.data[i + 3]),
        ) / 255.0
    }

    /// Bilinear sample with repeat addressing, `uv` in texture space.
    pub fn sample_wrap(&self, uv: Vec2) -> Vec4 {
        if !uv.is_finite() {
            return self.texel(0, 0);
        }
        let px = uv.x * self.width as f32 - 0.5;
        let py = uv.y * self.height as f32 - 0.5;
        let x0 = px.floor();
        let y0 = py.floor();
        let tx = px - x0;
        let ty = py - y0;

        let wrap = |v: f32, n: u32| -> u32 { (v as i64).rem_euclid(i64::from(n)) as u32 };
        let (xa, xb) = (wrap(x0, self.width), wrap(x0 + 1.0, self.width));
        let (ya, yb) = (wrap(y0, self.height), wrap(y0 + 1.0, self.height));

        let top = self.texel(xa, ya).lerp(self.texel(xb, ya), tx);
        let bottom = self.texel(xa, yb).lerp(self.texel(xb, yb), tx);
        top.lerp(bottom, ty)
    }
}

/// Noise that repeats with period 1 in both axes, by blending four shifted copies.
fn tileable_noise(uv: Vec2, cells: f32) -> f32 {
    let uv = uv - uv.floor();
    let p = uv * cells;
    let a = noise(p);
    let b = noise(p - Vec2::new(cells, 0.0));
    let c = noise(p - Vec2::new(0.0, cells));
    let d = noise(p - Vec2::splat(cells));
    let top = a + (b - a) * uv.x;
    let bottom = c + (d - c) * uv.x;
    top + (bottom - top) * uv.y
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba8_validates_length() {
        let err = TextureImage::from_rgba8(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            TidewaterError::SizeMismatch {
                expected: 16,
                actual: 15
            }
        ));
        assert!(TextureImage::from_rgba8(0, 4, Vec::new()).is_err());
        assert!(TextureImage::from_rgba8(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn test_solid_samples_constant() {
        let image = TextureImage::solid([255, 0, 51, 255]);
        for uv in [Vec2::ZERO, Vec2::new(0.3, 7.9), Vec2::new(-4.2, 1.5)] {
            let c = image.sample_wrap(uv);
            assert!((c - Vec4::new(1.0, 0.0, 0.2, 1.0)).length() < 1e-5);
        }
    }

    #[test]
    fn test_sample_wraps() {
        let image = TextureImage::from_rgba8(
            2,
            1,
            vec![0, 0, 0, 255, 255, 255, 255, 255],
        )
        .unwrap();
        let a = image.sample_wrap(Vec2::new(0.25, 0.5));
        let b = image.sample_wrap(Vec2::new(3.25, 0.5));
        let c = image.sample_wrap(Vec2::new(-0.75, 0.5));
        assert!((a - b).length() < 1e-5);
        assert!((a - c).length() < 1e-5);
        // texel centre of the first texel is black
        assert!(a.x < 1e-5);
    }

    #[test]
    fn test_sample_bilinear_midpoint() {
        let image = TextureImage::from_rgba8(
            2,
            1,
            vec![0, 0, 0, 255, 255, 255, 255, 255],
        )
        .unwrap();
        let mid = image.sample_wrap(Vec2::new(0.5, 0.5));
        assert!((mid.x - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_procedural_foam_has_contrast() {
        let foam = TextureImage::procedural_foam(64);
        assert_eq!(foam.data().len(), 64 * 64 * 4);
        let reds: Vec<u8> = foam.data().chunks(4).map(|t| t[0]).collect();
        let min = reds.iter().copied().min().unwrap_or(0);
        let max = reds.iter().copied().max().unwrap_or(0);
        assert!(max - min > 40, "foam mask too flat: {min}..{max}");
    }

    #[test]
    fn test_procedural_normal_map_points_up() {
        let normals = TextureImage::procedural_normal_map(32);
        for chunk in normals.data().chunks(4) {
            // blue channel stores Y, which must stay the dominant positive axis
            assert!(chunk[2] > 180, "normal not upward: {chunk:?}");
        }
    }

    #[test]
    fn test_tileable_noise_repeats() {
        let a = tileable_noise(Vec2::new(0.2, 0.7), 8.0);
        let b = tileable_noise(Vec2::new(1.2, -0.3), 8.0);
        assert!((a - b).abs() < 1e-4);
    }
}
