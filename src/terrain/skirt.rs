//! Shoreline band and cliff wall around the terrain surface

use glam::{Vec2, Vec3};

use super::{stitch_open_rows, stitch_rows};
use crate::contour::BoundaryCurve;
use crate::geometry::xz;
use crate::mesh::{MaterialRole, MeshData};

/// Build the skirt closing the island down to sea level
///
/// For every contour point a row partner on the shoreline is found by
/// casting from `centroid` through the point, so the two curves do not need
/// matching point counts. The band between them is planar-mapped like the
/// surface; the vertical wall from the shoreline down to `y = 0` uses its
/// running length as U.
///
/// # Arguments
///
/// * `contour` - Terrain contour, counter-clockwise
/// * `shoreline` - Curve through the shoreline anchors, enclosing `contour`
/// * `centroid` - Interior point both curves are star-shaped around
/// * `uv_tiling` - World units to UV scale
pub fn build_skirt(
    contour: &BoundaryCurve,
    shoreline: &BoundaryCurve,
    centroid: Vec2,
    uv_tiling: f32,
) -> MeshData {
    let mut mesh = MeshData::default();
    let n = contour.len();
    if n < 3 {
        return mesh;
    }

    let shore: Vec<Vec3> = contour
        .points()
        .iter()
        .map(|p| {
            let dir = xz(*p) - centroid;
            match shoreline.ray_crossing(centroid, dir) {
                Some((dist, hit)) if dist * dist >= dir.length_squared() => hit,
                // Shoreline missing or inside the contour here; keep the band flat
                _ => *p,
            }
        })
        .collect();

    let planar = |p: Vec3| [p.x * uv_tiling, p.z * uv_tiling];

    let inner: Vec<u32> = contour.points().iter().map(|p| mesh.push_vertex(*p, planar(*p))).collect();
    let outer: Vec<u32> = shore.iter().map(|p| mesh.push_vertex(*p, planar(*p))).collect();
    stitch_rows(&mut mesh.indices, &inner, &outer);

    // The wall seam gets its own column at U = full run so the texture
    // does not wrap back across the last quad
    let mut run = 0.0;
    let mut top = Vec::with_capacity(n + 1);
    let mut bottom = Vec::with_capacity(n + 1);
    for (i, p) in shore.iter().chain(shore.first()).enumerate() {
        if i > 0 {
            run += xz(*p).distance(xz(shore[i - 1]));
        }
        let u = run * uv_tiling;
        top.push(mesh.push_vertex(*p, [u, p.y * uv_tiling]));
        bottom.push(mesh.push_vertex(Vec3::new(p.x, 0.0, p.z), [u, 0.0]));
    }
    stitch_open_rows(&mut mesh.indices, &top, &bottom);

    mesh.set_single_group(MaterialRole::Skirt);
    mesh
}
