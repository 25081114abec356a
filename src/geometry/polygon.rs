//! Closed polygon queries on the XZ plane
//!
//! Polygons are slices of 3D points; only their X and Z components are used.
//! The closing edge from the last point back to the first is implicit.

use glam::{Vec2, Vec3};

#[inline]
pub fn xz(p: Vec3) -> Vec2 {
    Vec2::new(p.x, p.z)
}

/// Even-odd point-in-polygon test
pub fn contains_xz(polygon: &[Vec3], x: f32, z: f32) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (xi, zi) = (polygon[i].x, polygon[i].z);
        let (xj, zj) = (polygon[j].x, polygon[j].z);
        if (zi > z) != (zj > z) && x < (xj - xi) * (z - zi) / (zj - zi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Signed shoelace area; positive when X→Z winding is counter-clockwise
pub fn signed_area_xz(polygon: &[Vec3]) -> f32 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        sum += a.x * b.z - b.x * a.z;
    }
    sum * 0.5
}

/// Area centroid, falling back to the vertex mean for degenerate polygons
pub fn centroid_xz(polygon: &[Vec3]) -> Vec2 {
    let n = polygon.len();
    if n == 0 {
        return Vec2::ZERO;
    }

    let area = signed_area_xz(polygon);
    if area.abs() <= 1e-6 {
        let sum: Vec2 = polygon.iter().map(|p| xz(*p)).sum();
        return sum / n as f32;
    }

    let mut c = Vec2::ZERO;
    for i in 0..n {
        let a = xz(polygon[i]);
        let b = xz(polygon[(i + 1) % n]);
        let cross = a.x * b.y - b.x * a.y;
        c += (a + b) * cross;
    }
    c / (6.0 * area)
}

/// Farthest crossing of a ray from `origin` along `dir` with the polygon
///
/// Returns the distance along the normalized direction and the crossing
/// point, with Y interpolated along the crossed edge.
pub fn ray_intersection_xz(polygon: &[Vec3], origin: Vec2, dir: Vec2) -> Option<(f32, Vec3)> {
    let dir = dir.try_normalize()?;
    let n = polygon.len();
    let mut best: Option<(f32, Vec3)> = None;

    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let pa = xz(a);
        let edge = xz(b) - pa;

        let denom = dir.perp_dot(edge);
        if denom.abs() <= 1e-9 {
            continue;
        }
        let diff = pa - origin;
        let t = diff.perp_dot(edge) / denom;
        let s = diff.perp_dot(dir) / denom;
        if t < 0.0 || !(0.0..=1.0).contains(&s) {
            continue;
        }
        if best.map_or(true, |(bt, _)| t > bt) {
            let hit = a.lerp(b, s);
            best = Some((t, Vec3::new(origin.x + dir.x * t, hit.y, origin.y + dir.y * t)));
        }
    }

    best
}

/// Shortest distance from a point to any polygon edge
pub fn distance_to_edges_xz(polygon: &[Vec3], p: Vec2) -> f32 {
    let n = polygon.len();
    let mut best = f32::INFINITY;
    for i in 0..n {
        let a = xz(polygon[i]);
        let b = xz(polygon[(i + 1) % n]);
        let ab = b - a;
        let len_sq = ab.length_squared();
        let t = if len_sq > 0.0 {
            ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        best = best.min(p.distance(a + ab * t));
    }
    best
}

/// Axis-aligned XZ bounds as `(min, max)`
pub fn bounds_xz(points: &[Vec3]) -> (Vec2, Vec2) {
    points.iter().fold(
        (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
        |(min, max), p| (min.min(xz(*p)), max.max(xz(*p))),
    )
}
