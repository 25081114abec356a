//! Path ribbon meshes

use glam::Vec3;

use crate::mesh::{MaterialRole, MeshData};

/// Lift above the terrain so the ribbon does not z-fight with it
pub const PATH_Y_OFFSET: f32 = 0.05;

/// Extrude a strip of `width` along a centreline
///
/// Two vertices per centreline point, offset by ±`width/2` along
/// `tangent × normal`. U is 0 on the left edge and 1 on the right; V is the
/// travelled arc length divided by `width`. Returns an empty mesh for fewer
/// than two points.
///
/// # Arguments
///
/// * `points` - Centreline on the terrain surface
/// * `normals` - Surface normal at each point (same length as `points`)
/// * `width` - Ribbon width
pub fn build_ribbon(points: &[Vec3], normals: &[Vec3], width: f32) -> MeshData {
    let mut mesh = MeshData::default();
    let n = points.len();
    if n < 2 {
        return mesh;
    }

    let half = width * 0.5;
    let lift = Vec3::new(0.0, PATH_Y_OFFSET, 0.0);
    let mut travelled = 0.0;

    for i in 0..n {
        let tangent = if i + 1 < n {
            points[i + 1] - points[i]
        } else {
            points[i] - points[i - 1]
        };
        if i > 0 {
            travelled += points[i].distance(points[i - 1]);
        }

        let normal = normals.get(i).copied().unwrap_or(Vec3::Y);
        let right = tangent
            .cross(normal)
            .try_normalize()
            .or_else(|| tangent.cross(Vec3::Y).try_normalize())
            .unwrap_or(Vec3::X);

        let v = if width > 0.0 { travelled / width } else { 0.0 };
        let center = points[i] + lift;
        mesh.push_vertex(center - right * half, [0.0, v]);
        mesh.push_vertex(center + right * half, [1.0, v]);
    }

    for i in 0..n as u32 - 1 {
        let (l0, r0, l1, r1) = (2 * i, 2 * i + 1, 2 * i + 2, 2 * i + 3);
        mesh.indices.extend_from_slice(&[l0, r0, l1, r0, r1, l1]);
    }

    mesh.set_single_group(MaterialRole::Path);
    mesh.recompute_shading();
    mesh
}
