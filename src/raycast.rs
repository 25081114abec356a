//! Downward ray queries against triangle meshes
//!
//! The generator repeatedly needs "what is below (x, z)": shoreline heights
//! over placed rocks, path tracing across the terrain, node projection.
//! [`SurfaceRaycaster`] answers this with a parry3d [`TriMesh`] and its
//! bounding volume hierarchy.

use glam::Vec3;
use parry3d::math::{Point, Vector};
use parry3d::query::{Ray, RayCast};
use parry3d::shape::{FeatureId, TriMesh};

/// Result of a downward ray query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// World-space hit position
    pub point: Vec3,
    /// Unit face normal, oriented upward (towards the ray origin)
    pub normal: Vec3,
    /// Index of the hit triangle
    pub triangle: usize,
}

/// Trait for surfaces that can be queried from above
pub trait SurfaceQuery {
    /// Nearest intersection of a vertical, downward ray at (x, z)
    fn cast_down(&self, x: f32, z: f32) -> Option<SurfaceHit>;

    /// Surface height at (x, z), if the ray hits anything
    fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        self.cast_down(x, z).map(|hit| hit.point.y)
    }
}

/// Downward ray caster over a triangle mesh
#[derive(Clone)]
pub struct SurfaceRaycaster {
    /// `None` for an empty triangle set, which parry cannot represent
    mesh: Option<TriMesh>,
    top_y: f32,
    depth: f32,
}

impl SurfaceRaycaster {
    /// Build from an indexed mesh (`indices.len()` must be a multiple of 3)
    pub fn new(positions: &[[f32; 3]], indices: &[u32]) -> Self {
        let vertices: Vec<Point<f32>> = positions.iter().map(|p| Point::new(p[0], p[1], p[2])).collect();
        let triangles: Vec<[u32; 3]> = indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]]).collect();
        Self::from_buffers(vertices, triangles)
    }

    /// Build from a triangle soup
    pub fn from_triangles(soup: Vec<[Vec3; 3]>) -> Self {
        let vertices: Vec<Point<f32>> = soup
            .iter()
            .flat_map(|tri| tri.iter().map(|v| Point::new(v.x, v.y, v.z)))
            .collect();
        let triangles: Vec<[u32; 3]> = (0..soup.len() as u32).map(|i| [3 * i, 3 * i + 1, 3 * i + 2]).collect();
        Self::from_buffers(vertices, triangles)
    }

    fn from_buffers(vertices: Vec<Point<f32>>, triangles: Vec<[u32; 3]>) -> Self {
        if triangles.is_empty() {
            return Self {
                mesh: None,
                top_y: 0.0,
                depth: 0.0,
            };
        }

        let (min_y, max_y) = triangles
            .iter()
            .flatten()
            .map(|&i| vertices[i as usize].y)
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), y| (lo.min(y), hi.max(y)));

        Self {
            mesh: Some(TriMesh::new(vertices, triangles)),
            top_y: max_y + 1.0,
            depth: (max_y - min_y) + 2.0,
        }
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.mesh.as_ref().map_or(0, |mesh| mesh.indices().len())
    }
}

impl SurfaceQuery for SurfaceRaycaster {
    fn cast_down(&self, x: f32, z: f32) -> Option<SurfaceHit> {
        let mesh = self.mesh.as_ref()?;
        let ray = Ray::new(Point::new(x, self.top_y, z), Vector::new(0.0, -1.0, 0.0));
        let hit = mesh.cast_local_ray_and_get_normal(&ray, self.depth, true)?;

        // Back-face hits are reported past the end of the index buffer
        let count = mesh.indices().len();
        let triangle = match hit.feature {
            FeatureId::Face(i) => i as usize % count,
            _ => 0,
        };

        let normal = Vec3::new(hit.normal.x, hit.normal.y, hit.normal.z).normalize_or_zero();
        let normal = if normal == Vec3::ZERO {
            Vec3::Y
        } else if normal.y < 0.0 {
            -normal
        } else {
            normal
        };

        Some(SurfaceHit {
            point: Vec3::new(x, self.top_y - hit.time_of_impact, z),
            normal,
            triangle,
        })
    }
}
