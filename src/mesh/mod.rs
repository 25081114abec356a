//! Engine-agnostic indexed mesh output
//!
//! Vertex attributes are plain arrays so they can be handed to any renderer:
//! - Bevy: insert as `Mesh` attributes
//! - Godot: convert to `ArrayMesh` arrays
//! - wgpu: upload directly as vertex/index buffers

mod normals;

pub use normals::{compute_normals, compute_tangents};

use glam::Vec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Material role of a triangle range
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialRole {
    /// Shoreline band and cliff wall down to sea level
    Skirt,
    /// Island surface
    Grass,
    /// Surface under mud puddles
    Mud,
    /// Path ribbons
    Path,
}

/// Contiguous range of triangles sharing one material role
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshGroup {
    pub role: MaterialRole,
    /// First triangle of the range
    pub start: usize,
    /// Number of triangles
    pub count: usize,
}

/// Indexed triangle mesh with grouped material ranges
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    /// xyz tangent plus handedness in w
    pub tangents: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
    pub groups: Vec<MeshGroup>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Push a vertex, returning its index
    pub fn push_vertex(&mut self, position: Vec3, uv: [f32; 2]) -> u32 {
        let idx = self.positions.len() as u32;
        self.positions.push(position.to_array());
        self.uvs.push(uv);
        idx
    }

    #[inline]
    pub fn position(&self, idx: u32) -> Vec3 {
        Vec3::from(self.positions[idx as usize])
    }

    /// Iterate triangles as index triples
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Replace all groups with one group covering every triangle
    pub fn set_single_group(&mut self, role: MaterialRole) {
        self.groups = vec![MeshGroup {
            role,
            start: 0,
            count: self.triangle_count(),
        }];
    }

    /// Total triangles assigned to a role
    pub fn group_triangle_count(&self, role: MaterialRole) -> usize {
        self.groups.iter().filter(|g| g.role == role).map(|g| g.count).sum()
    }

    /// Append another mesh, offsetting its indices and groups
    pub fn append(&mut self, other: MeshData) {
        let vertex_offset = self.positions.len() as u32;
        let triangle_offset = self.triangle_count();

        self.positions.extend(other.positions);
        self.normals.extend(other.normals);
        self.uvs.extend(other.uvs);
        self.tangents.extend(other.tangents);
        self.indices.extend(other.indices.into_iter().map(|i| i + vertex_offset));
        self.groups.extend(other.groups.into_iter().map(|g| MeshGroup {
            start: g.start + triangle_offset,
            ..g
        }));
    }

    /// Recompute normals and tangents from the current positions
    pub fn recompute_shading(&mut self) {
        self.normals = compute_normals(&self.positions, &self.indices);
        self.tangents = compute_tangents(&self.positions, &self.normals, &self.uvs, &self.indices);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(role: MaterialRole, offset: f32) -> MeshData {
        let mut mesh = MeshData::default();
        mesh.push_vertex(Vec3::new(offset, 0.0, 0.0), [0.0, 0.0]);
        mesh.push_vertex(Vec3::new(offset + 1.0, 0.0, 0.0), [1.0, 0.0]);
        mesh.push_vertex(Vec3::new(offset + 1.0, 0.0, 1.0), [1.0, 1.0]);
        mesh.push_vertex(Vec3::new(offset, 0.0, 1.0), [0.0, 1.0]);
        mesh.indices = vec![0, 2, 1, 0, 3, 2];
        mesh.set_single_group(role);
        mesh
    }

    #[test]
    fn test_append_offsets_indices_and_groups() {
        let mut mesh = quad(MaterialRole::Grass, 0.0);
        mesh.append(quad(MaterialRole::Skirt, 2.0));

        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 4);
        assert_eq!(&mesh.indices[6..], &[4, 6, 5, 4, 7, 6]);
        assert_eq!(mesh.groups.len(), 2);
        assert_eq!(mesh.groups[1].start, 2);
        assert_eq!(mesh.group_triangle_count(MaterialRole::Skirt), 2);
    }

    #[test]
    fn test_recompute_shading() {
        let mut mesh = quad(MaterialRole::Grass, 0.0);
        mesh.recompute_shading();
        assert_eq!(mesh.normals.len(), mesh.vertex_count());
        assert_eq!(mesh.tangents.len(), mesh.vertex_count());
        for n in &mesh.normals {
            assert!((n[1] - 1.0).abs() < 1e-5);
        }
    }
}
