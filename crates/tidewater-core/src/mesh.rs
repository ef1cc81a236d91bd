//! Triangle mesh data and the procedural stand-ins used before assets load.

use glam::Vec3;

use crate::error::{Result, TidewaterError};

/// Indexed triangle mesh with per-vertex normals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Builds a mesh, computing normals when none are supplied.
    pub fn new(positions: Vec<Vec3>, normals: Vec<Vec3>, indices: Vec<u32>) -> Result<Self> {
        let mesh = Self {
            positions,
            normals,
            indices,
        };
        mesh.validate()?;
        if mesh.normals.len() == mesh.positions.len() {
            Ok(mesh)
        } else {
            Ok(mesh.with_computed_normals())
        }
    }

    /// Checks index bounds and triangle count.
    pub fn validate(&self) -> Result<()> {
        if self.indices.len() % 3 != 0 {
            return Err(TidewaterError::InvalidAsset(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        let count = self.positions.len();
        if let Some(&bad) = self.indices.iter().find(|&&i| i as usize >= count) {
            return Err(TidewaterError::InvalidAsset(format!(
                "index {bad} out of range for {count} vertices"
            )));
        }
        Ok(())
    }

    /// Returns the number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// A flat `size` x `size` square in the XZ plane at y = 0, facing +Y.
    pub fn plane(size: f32) -> Self {
        let h = size * 0.5;
        Self {
            positions: vec![
                Vec3::new(-h, 0.0, -h),
                Vec3::new(h, 0.0, -h),
                Vec3::new(h, 0.0, h),
                Vec3::new(-h, 0.0, h),
            ],
            normals: vec![Vec3::Y; 4],
            indices: vec![0, 2, 1, 0, 3, 2],
        }
    }

    /// An open-topped box: a floor at `-depth` and four walls rising slightly
    /// above the water line, with normals facing into the basin.
    pub fn pool_basin(half_extent: f32, depth: f32) -> Self {
        let rim = 0.25;
        let (e, bottom) = (half_extent, -depth.abs());
        let mut mesh = Self::default();

        // floor
        mesh.push_quad(
            [
                Vec3::new(-e, bottom, -e),
                Vec3::new(-e, bottom, e),
                Vec3::new(e, bottom, e),
                Vec3::new(e, bottom, -e),
            ],
            Vec3::Y,
        );
        // walls: +X, -X, +Z, -Z
        mesh.push_quad(
            [
                Vec3::new(e, bottom, -e),
                Vec3::new(e, bottom, e),
                Vec3::new(e, rim, e),
                Vec3::new(e, rim, -e),
            ],
            Vec3::NEG_X,
        );
        mesh.push_quad(
            [
                Vec3::new(-e, bottom, e),
                Vec3::new(-e, bottom, -e),
                Vec3::new(-e, rim, -e),
                Vec3::new(-e, rim, e),
            ],
            Vec3::X,
        );
        mesh.push_quad(
            [
                Vec3::new(e, bottom, e),
                Vec3::new(-e, bottom, e),
                Vec3::new(-e, rim, e),
                Vec3::new(e, rim, e),
            ],
            Vec3::NEG_Z,
        );
        mesh.push_quad(
            [
                Vec3::new(-e, bottom, -e),
                Vec3::new(e, bottom, -e),
                Vec3::new(e, rim, -e),
                Vec3::new(-e, rim, -e),
            ],
            Vec3::Z,
        );
        mesh
    }

    /// A UV sphere centred at `center`.
    pub fn uv_sphere(center: Vec3, radius: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut mesh = Self::default();

        for r in 0..=rings {
            let phi = std::f32::consts::PI * r as f32 / rings as f32;
            for s in 0..=segments {
                let theta = std::f32::consts::TAU * s as f32 / segments as f32;
                let n = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                mesh.positions.push(center + n * radius);
                mesh.normals.push(n);
            }
        }

        let stride = segments + 1;
        for r in 0..rings {
            for s in 0..segments {
                let a = r * stride + s;
                let b = a + stride;
                mesh.indices
                    .extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }
        mesh
    }

    /// Replaces the normals with area-weighted vertex normals.
    pub fn with_computed_normals(mut self) -> Self {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let n = (self.positions[b] - self.positions[a])
                .cross(self.positions[c] - self.positions[a]);
            normals[a] += n;
            normals[b] += n;
            normals[c] += n;
        }
        self.normals = normals
            .into_iter()
            .map(|n| n.normalize_or(Vec3::Y))
            .collect();
        self
    }

    /// Returns the axis-aligned bounds, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p))),
        )
    }

    /// Appends a quad (counter-clockwise seen from the side `normal` points to).
    fn push_quad(&mut self, corners: [Vec3; 4], normal: Vec3) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&corners);
        self.normals.extend_from_slice(&[normal; 4]);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_normal(mesh: &MeshData, tri: usize) -> Vec3 {
        let i = &mesh.indices[tri * 3..tri * 3 + 3];
        let [a, b, c] = [
            mesh.positions[i[0] as usize],
            mesh.positions[i[1] as usize],
            mesh.positions[i[2] as usize],
        ];
        (b - a).cross(c - a).normalize()
    }

    #[test]
    fn test_plane_is_flat_and_faces_up() {
        let plane = MeshData::plane(20.0);
        assert!(plane.validate().is_ok());
        assert_eq!(plane.triangle_count(), 2);
        let (lo, hi) = plane.bounds().unwrap();
        assert_eq!(lo, Vec3::new(-10.0, 0.0, -10.0));
        assert_eq!(hi, Vec3::new(10.0, 0.0, 10.0));
        for tri in 0..plane.triangle_count() {
            assert!(face_normal(&plane, tri).dot(Vec3::Y) > 0.99);
        }
    }

    #[test]
    fn test_pool_basin_winding_matches_normals() {
        let pool = MeshData::pool_basin(3.0, 2.0);
        assert!(pool.validate().is_ok());
        assert_eq!(pool.triangle_count(), 10);
        for tri in 0..pool.triangle_count() {
            let stored = pool.normals[pool.indices[tri * 3] as usize];
            assert!(
                face_normal(&pool, tri).dot(stored) > 0.99,
                "triangle {tri} winding disagrees with its normal"
            );
        }
        let (lo, hi) = pool.bounds().unwrap();
        assert_eq!(lo.y, -2.0);
        assert!(hi.y > 0.0);
    }

    #[test]
    fn test_sphere_normals_point_outward() {
        let center = Vec3::new(1.0, -0.5, 0.0);
        let sphere = MeshData::uv_sphere(center, 0.5, 16, 8);
        assert!(sphere.validate().is_ok());
        for (p, n) in sphere.positions.iter().zip(&sphere.normals) {
            assert!(((*p - center).normalize() - *n).length() < 1e-4);
        }
    }

    #[test]
    fn test_new_computes_missing_normals() {
        let mesh = MeshData::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            Vec::new(),
            vec![0, 2, 1],
        )
        .unwrap();
        for n in &mesh.normals {
            assert!((*n - Vec3::Y).length() < 1e-6);
        }
    }

    #[test]
    fn test_validate_rejects_bad_indices() {
        assert!(MeshData::new(vec![Vec3::ZERO], Vec::new(), vec![0, 1, 2]).is_err());
        assert!(MeshData::new(vec![Vec3::ZERO], Vec::new(), vec![0, 0]).is_err());
    }
}
