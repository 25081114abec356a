//! Per-vertex normal and tangent generation

use glam::{Vec2, Vec3};

/// Area-weighted smooth vertex normals
///
/// Vertices not referenced by any triangle get +Y.
pub fn compute_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut accum = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let pa = Vec3::from(positions[a]);
        let pb = Vec3::from(positions[b]);
        let pc = Vec3::from(positions[c]);
        // Unnormalized cross product weights by twice the area
        let face = (pb - pa).cross(pc - pa);
        accum[a] += face;
        accum[b] += face;
        accum[c] += face;
    }

    accum
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

/// Per-vertex tangents from UV gradients, Gram-Schmidt orthogonalized
pub fn compute_tangents(
    positions: &[[f32; 3]],
    normals: &[[f32; 3]],
    uvs: &[[f32; 2]],
    indices: &[u32],
) -> Vec<[f32; 4]> {
    let n = positions.len();
    let mut tan = vec![Vec3::ZERO; n];
    let mut bitan = vec![Vec3::ZERO; n];

    if uvs.len() == n {
        for tri in indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let e1 = Vec3::from(positions[b]) - Vec3::from(positions[a]);
            let e2 = Vec3::from(positions[c]) - Vec3::from(positions[a]);
            let d1 = Vec2::from(uvs[b]) - Vec2::from(uvs[a]);
            let d2 = Vec2::from(uvs[c]) - Vec2::from(uvs[a]);

            let det = d1.x * d2.y - d2.x * d1.y;
            if det.abs() <= 1e-12 {
                continue;
            }
            let r = 1.0 / det;
            let t = (e1 * d2.y - e2 * d1.y) * r;
            let bt = (e2 * d1.x - e1 * d2.x) * r;
            for v in [a, b, c] {
                tan[v] += t;
                bitan[v] += bt;
            }
        }
    }

    (0..n)
        .map(|i| {
            let normal = normals.get(i).map(|v| Vec3::from(*v)).unwrap_or(Vec3::Y);
            let t = tan[i] - normal * normal.dot(tan[i]);
            let t = t.try_normalize().unwrap_or_else(|| normal.any_orthonormal_vector());
            let w = if normal.cross(t).dot(bitan[i]) < 0.0 { -1.0 } else { 1.0 };
            [t.x, t.y, t.z, w]
        })
        .collect()
}
