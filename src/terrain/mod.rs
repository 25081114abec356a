//! Radial terrain mesh construction
//!
//! The island surface is a fan around the contour centroid: one centre
//! vertex, `num_rings` interior rings and a final ring lying on the terrain
//! contour. A separate skirt closes the island down to sea level.
//!
//! Heights come from [`HeightProfile`]; depressions are carved into the
//! surface positions before [`TerrainMeshBuilder::finish`] groups triangles
//! and computes shading.

mod profile;
mod skirt;

pub use profile::{HeightProfile, InteriorHeight};
pub use skirt::build_skirt;

use glam::Vec3;

use crate::config::IslandConfig;
use crate::contour::ContourResult;
use crate::mesh::{MaterialRole, MeshData, MeshGroup};
use crate::raycast::{SurfaceHit, SurfaceQuery, SurfaceRaycaster};

/// Mud influence above which a surface triangle is drawn as mud
pub const MUD_GROUP_THRESHOLD: f32 = 0.05;

/// Vertex layout of the radial surface mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingLayout {
    /// Interior rings (the contour ring comes after them)
    pub num_rings: usize,
    /// Vertices per ring
    pub num_segments: usize,
}

impl RingLayout {
    /// Vertex index of ring `ring`, segment `segment`
    ///
    /// Ring `num_rings` is the contour ring.
    #[inline]
    pub fn vertex(&self, ring: usize, segment: usize) -> u32 {
        (1 + ring * self.num_segments + segment % self.num_segments) as u32
    }

    /// Vertices in the surface mesh, including the centre
    #[inline]
    pub fn vertex_count(&self) -> usize {
        1 + (self.num_rings + 1) * self.num_segments
    }

    /// Radial fraction of an interior ring, `(r+1)/(num_rings+1)`
    #[inline]
    pub fn ring_fraction(&self, ring: usize) -> f32 {
        (ring + 1) as f32 / (self.num_rings + 1) as f32
    }
}

/// Append two triangles per quad between two rows of equal length
///
/// Rows are stitched so faces point "left" of the row direction: upward for
/// counter-clockwise rings with `outer` outside `inner`, outward for a wall
/// with `outer` below `inner`.
pub(crate) fn stitch_rows(indices: &mut Vec<u32>, inner: &[u32], outer: &[u32]) {
    let n = inner.len().min(outer.len());
    for s in 0..n {
        stitch_quad(indices, inner, outer, s, (s + 1) % n);
    }
}

/// Like [`stitch_rows`] without the closing quad from the last column back
/// to the first
pub(crate) fn stitch_open_rows(indices: &mut Vec<u32>, inner: &[u32], outer: &[u32]) {
    let n = inner.len().min(outer.len());
    for s in 1..n {
        stitch_quad(indices, inner, outer, s - 1, s);
    }
}

#[inline]
fn stitch_quad(indices: &mut Vec<u32>, inner: &[u32], outer: &[u32], s: usize, s1: usize) {
    indices.extend_from_slice(&[inner[s], inner[s1], outer[s]]);
    indices.extend_from_slice(&[inner[s1], outer[s1], outer[s]]);
}

/// Builds the surface and skirt meshes of one island
pub struct TerrainMeshBuilder<'a> {
    config: &'a IslandConfig,
    contour: &'a ContourResult,
    profile: HeightProfile,
}

impl<'a> TerrainMeshBuilder<'a> {
    pub fn new(config: &'a IslandConfig, contour: &'a ContourResult) -> Self {
        let profile = HeightProfile::new(
            InteriorHeight::from_config(config),
            contour.centroid,
            contour.centroid_height,
            contour.terrain_contour.points().to_vec(),
        );
        Self {
            config,
            contour,
            profile,
        }
    }

    #[inline]
    pub fn profile(&self) -> &HeightProfile {
        &self.profile
    }

    pub fn layout(&self) -> RingLayout {
        RingLayout {
            num_rings: self.config.terrain.num_rings,
            num_segments: self.contour.terrain_contour.len(),
        }
    }

    /// Radial surface mesh with pre-carve heights and planar UVs
    ///
    /// Normals are left empty; they are computed by [`finish`](Self::finish)
    /// once carving is done.
    pub fn build_surface(&self) -> MeshData {
        let layout = self.layout();
        let tiling = self.config.terrain.uv_tiling;
        let center = self.profile.center;
        let contour = self.contour.terrain_contour.points();

        let mut mesh = MeshData::default();
        let uv = |p: Vec3| [p.x * tiling, p.z * tiling];

        let c = Vec3::new(center.x, self.profile.blended(center.x, center.y, 0.0, 0.0), center.y);
        mesh.push_vertex(c, uv(c));

        for ring in 0..layout.num_rings {
            let t = layout.ring_fraction(ring);
            for edge in contour {
                let x = center.x + (edge.x - center.x) * t;
                let z = center.y + (edge.z - center.y) * t;
                let p = Vec3::new(x, self.profile.blended(x, z, t, edge.y), z);
                mesh.push_vertex(p, uv(p));
            }
        }
        for edge in contour {
            mesh.push_vertex(*edge, uv(*edge));
        }

        // Centre fan, wound to face up for a counter-clockwise contour
        for s in 0..layout.num_segments {
            mesh.indices.extend_from_slice(&[0, layout.vertex(0, s + 1), layout.vertex(0, s)]);
        }

        for ring in 0..layout.num_rings {
            let inner: Vec<u32> = (0..layout.num_segments).map(|s| layout.vertex(ring, s)).collect();
            let outer: Vec<u32> = (0..layout.num_segments).map(|s| layout.vertex(ring + 1, s)).collect();
            stitch_rows(&mut mesh.indices, &inner, &outer);
        }

        mesh.set_single_group(MaterialRole::Grass);
        mesh
    }

    /// Shoreline band and cliff wall
    pub fn build_skirt(&self) -> MeshData {
        build_skirt(
            &self.contour.terrain_contour,
            &self.contour.shoreline,
            self.contour.centroid,
            self.config.terrain.uv_tiling,
        )
    }

    /// Group surface triangles, merge the skirt and compute shading
    ///
    /// `mud_influence` is indexed by surface vertex; triangles touching
    /// influence above [`MUD_GROUP_THRESHOLD`] move to the mud group.
    pub fn finish(&self, surface: MeshData, mud_influence: &[f32], skirt: MeshData) -> MeshData {
        let mut mesh = regroup_mud(surface, mud_influence);
        mesh.append(skirt);
        mesh.recompute_shading();
        mesh
    }
}

fn regroup_mud(mut surface: MeshData, mud_influence: &[f32]) -> MeshData {
    let is_mud = |tri: &[u32]| {
        tri.iter()
            .any(|&v| mud_influence.get(v as usize).copied().unwrap_or(0.0) > MUD_GROUP_THRESHOLD)
    };

    let (mud, grass): (Vec<&[u32]>, Vec<&[u32]>) = surface.indices.chunks_exact(3).partition(|t| is_mud(t));
    let grass_count = grass.len();
    let mud_count = mud.len();
    let indices: Vec<u32> = grass.into_iter().chain(mud).flatten().copied().collect();

    surface.indices = indices;
    surface.groups.clear();
    if grass_count > 0 {
        surface.groups.push(MeshGroup {
            role: MaterialRole::Grass,
            start: 0,
            count: grass_count,
        });
    }
    if mud_count > 0 {
        surface.groups.push(MeshGroup {
            role: MaterialRole::Mud,
            start: grass_count,
            count: mud_count,
        });
    }
    surface
}

/// Finished terrain: mesh, boundary curves, height law and ray queries
///
/// Handed explicitly to the foliage and path stages.
#[derive(Clone)]
pub struct TerrainResult {
    pub mesh: MeshData,
    pub contour: ContourResult,
    pub profile: HeightProfile,
    pub layout: RingLayout,
    surface: SurfaceRaycaster,
}

impl TerrainResult {
    pub fn new(mesh: MeshData, contour: ContourResult, profile: HeightProfile, layout: RingLayout) -> Self {
        let surface = SurfaceRaycaster::new(&mesh.positions, &mesh.indices);
        Self {
            mesh,
            contour,
            profile,
            layout,
            surface,
        }
    }

    #[inline]
    pub fn surface(&self) -> &SurfaceRaycaster {
        &self.surface
    }
}

impl SurfaceQuery for TerrainResult {
    fn cast_down(&self, x: f32, z: f32) -> Option<SurfaceHit> {
        self.surface.cast_down(x, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{BlueprintId, ModelBlueprint, ModelPools};
    use crate::config::IslandConfigBuilder;
    use crate::contour::ContourBuilder;
    use crate::diagnostics::Diagnostics;

    fn setup() -> (IslandConfig, ContourResult) {
        let config = IslandConfigBuilder::new().seed(21).build().unwrap();
        let rock = |i| {
            ModelBlueprint::from_bounds(BlueprintId(i), "rock", Vec3::new(-1.0, 0.0, -1.0), Vec3::ONE)
        };
        let pools = ModelPools::new(vec![rock(0)], vec![rock(1)]);
        let contour = ContourBuilder::new(&config, &pools).build(&mut Diagnostics::new());
        (config, contour)
    }

    #[test]
    fn test_surface_layout() {
        let (config, contour) = setup();
        let builder = TerrainMeshBuilder::new(&config, &contour);
        let layout = builder.layout();
        let surface = builder.build_surface();

        assert_eq!(surface.vertex_count(), layout.vertex_count());
        assert_eq!(
            surface.triangle_count(),
            layout.num_segments + 2 * layout.num_segments * layout.num_rings
        );
        // Outermost ring sits exactly on the contour
        for (s, p) in contour.terrain_contour.points().iter().enumerate() {
            assert_eq!(surface.position(layout.vertex(layout.num_rings, s)), *p);
        }
    }

    #[test]
    fn test_surface_heights_follow_profile() {
        let (config, contour) = setup();
        let builder = TerrainMeshBuilder::new(&config, &contour);
        let surface = builder.build_surface();
        for p in surface.positions.iter().step_by(37) {
            let h = builder.profile().height_at(p[0], p[2]);
            assert!((h - p[1]).abs() < 1e-3, "mesh {} vs analytic {}", p[1], h);
        }
    }

    #[test]
    fn test_surface_faces_up() {
        let (config, contour) = setup();
        let builder = TerrainMeshBuilder::new(&config, &contour);
        let mut surface = builder.build_surface();
        surface.recompute_shading();
        let up = surface.normals.iter().filter(|n| n[1] > 0.0).count();
        assert_eq!(up, surface.vertex_count());
    }

    #[test]
    fn test_every_triangle_in_one_group() {
        let (config, contour) = setup();
        let builder = TerrainMeshBuilder::new(&config, &contour);
        let surface = builder.build_surface();
        let mut mud = vec![0.0; surface.vertex_count()];
        mud[0] = 1.0;
        let mesh = builder.finish(surface, &mud, builder.build_skirt());

        let mut covered = vec![0u8; mesh.triangle_count()];
        for group in &mesh.groups {
            for t in group.start..group.start + group.count {
                covered[t] += 1;
            }
        }
        assert!(covered.iter().all(|&c| c == 1));
        // The centre fan touches vertex 0
        assert_eq!(mesh.group_triangle_count(MaterialRole::Mud), builder.layout().num_segments);
        assert!(mesh.group_triangle_count(MaterialRole::Skirt) > 0);
        assert_eq!(mesh.normals.len(), mesh.vertex_count());
    }
}
