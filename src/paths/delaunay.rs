//! Incremental Bowyer-Watson triangulation
//!
//! Works on indices into the caller's point slice. Circumcircles are computed
//! in f64 and cached per triangle.

use glam::{DVec2, Vec2};
use std::collections::{BTreeMap, HashSet};

/// Points closer than this are treated as duplicates
const DUPLICATE_EPSILON: f64 = 1e-9;
/// Circumcircle determinant below this marks a degenerate triangle
const DEGENERATE_EPSILON: f64 = 1e-12;

/// Result of [`triangulate`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Triangulation {
    /// Triangles as indices into the input points
    pub triangles: Vec<[usize; 3]>,
    /// Inputs that could not be inserted (duplicates or degenerate)
    pub skipped: Vec<usize>,
}

impl Triangulation {
    /// Undirected edges, each once, as `(low, high)` index pairs
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<(usize, usize)> = self
            .triangles
            .iter()
            .flat_map(|t| [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])])
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }
}

#[derive(Debug, Clone, Copy)]
struct Triangle {
    v: [usize; 3],
    center: DVec2,
    radius_sq: f64,
}

impl Triangle {
    fn new(v: [usize; 3], vertices: &[DVec2]) -> Option<Self> {
        let (center, radius_sq) = circumcircle(vertices[v[0]], vertices[v[1]], vertices[v[2]])?;
        Some(Self { v, center, radius_sq })
    }

    fn circumcircle_contains(&self, p: DVec2) -> bool {
        self.center.distance_squared(p) < self.radius_sq
    }

    /// Whether any corner is a super-triangle vertex (index `>= first_super`)
    fn touches_super(&self, first_super: usize) -> bool {
        self.v.iter().any(|&i| i >= first_super)
    }
}

fn circumcircle(a: DVec2, b: DVec2, c: DVec2) -> Option<(DVec2, f64)> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < DEGENERATE_EPSILON {
        return None;
    }
    let (a2, b2, c2) = (a.length_squared(), b.length_squared(), c.length_squared());
    let center = DVec2::new(
        (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d,
        (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d,
    );
    Some((center, center.distance_squared(a)))
}

/// Twice the signed area of `(o, a, b)`, positive when counter-clockwise
fn orient(o: DVec2, a: DVec2, b: DVec2) -> f64 {
    (a - o).perp_dot(b - o)
}

/// Enclosing triangle built from 20× the point extent
fn super_triangle(points: &[DVec2]) -> [DVec2; 3] {
    let (min, max) = points.iter().fold(
        (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
        |(min, max), p| (min.min(*p), max.max(*p)),
    );
    let extent = (max - min).max_element().max(1.0) * 2.0;
    let mid = (min + max) * 0.5;
    [
        DVec2::new(mid.x - 20.0 * extent, mid.y - extent),
        DVec2::new(mid.x, mid.y + 20.0 * extent),
        DVec2::new(mid.x + 20.0 * extent, mid.y - extent),
    ]
}

/// Delaunay triangulation of a point set
///
/// Each point is inserted in order: triangles whose circumcircle contains it
/// are removed and the boundary of the hole is fanned to the new point. A
/// point that duplicates an earlier one, or whose fan would contain a
/// degenerate triangle, is skipped. Triangles touching the enclosing
/// super-triangle are dropped at the end, and the concave pockets this can
/// leave along the hull of flat point sets are filled in again.
///
/// # Example
///
/// ```
/// use procedural_island::paths::triangulate;
/// use glam::Vec2;
///
/// let square = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)];
/// let result = triangulate(&square);
/// assert_eq!(result.triangles.len(), 2);
/// assert_eq!(result.edges().len(), 5);
/// ```
pub fn triangulate(points: &[Vec2]) -> Triangulation {
    let n = points.len();
    let mut result = Triangulation::default();
    if n < 3 {
        result.skipped = (0..n).collect();
        return result;
    }

    let mut vertices: Vec<DVec2> = points.iter().map(|p| p.as_dvec2()).collect();
    let corners = super_triangle(&vertices);
    vertices.extend(corners);

    let Some(root) = Triangle::new([n, n + 1, n + 2], &vertices) else {
        result.skipped = (0..n).collect();
        return result;
    };
    let mut triangles = vec![root];
    let mut inserted: Vec<usize> = Vec::with_capacity(n);

    for i in 0..n {
        let p = vertices[i];
        if inserted
            .iter()
            .any(|&j| vertices[j].distance_squared(p) < DUPLICATE_EPSILON * DUPLICATE_EPSILON)
        {
            result.skipped.push(i);
            continue;
        }

        let (bad, good): (Vec<Triangle>, Vec<Triangle>) =
            triangles.iter().copied().partition(|t| t.circumcircle_contains(p));
        if bad.is_empty() {
            result.skipped.push(i);
            continue;
        }

        let mut edge_count: BTreeMap<(usize, usize), (usize, usize, u32)> = BTreeMap::new();
        for t in &bad {
            for (a, b) in [(t.v[0], t.v[1]), (t.v[1], t.v[2]), (t.v[2], t.v[0])] {
                edge_count
                    .entry((a.min(b), a.max(b)))
                    .and_modify(|e| e.2 += 1)
                    .or_insert((a, b, 1));
            }
        }

        let fan: Option<Vec<Triangle>> = edge_count
            .values()
            .filter(|e| e.2 == 1)
            .map(|&(a, b, _)| Triangle::new([a, b, i], &vertices))
            .collect();

        match fan {
            Some(fan) => {
                triangles = good;
                triangles.extend(fan);
                inserted.push(i);
            }
            None => result.skipped.push(i),
        }
    }

    result.triangles = triangles
        .into_iter()
        .filter(|t| !t.touches_super(n))
        .map(|t| t.v)
        .collect();
    close_hull(&mut result.triangles, &vertices, &inserted);
    result
}

/// Boundary of the triangulated region as a counter-clockwise vertex cycle
///
/// `None` unless the boundary is one simple loop.
fn boundary_cycle(triangles: &[[usize; 3]], vertices: &[DVec2]) -> Option<Vec<usize>> {
    let mut directed: HashSet<(usize, usize)> = HashSet::with_capacity(triangles.len() * 3);
    for t in triangles {
        let [a, b, c] = *t;
        let [a, b, c] = if orient(vertices[a], vertices[b], vertices[c]) < 0.0 {
            [a, c, b]
        } else {
            [a, b, c]
        };
        directed.extend([(a, b), (b, c), (c, a)]);
    }

    let mut next: BTreeMap<usize, usize> = BTreeMap::new();
    for &(a, b) in &directed {
        if !directed.contains(&(b, a)) && next.insert(a, b).is_some() {
            return None;
        }
    }

    let (&start, _) = next.iter().next()?;
    let mut cycle = vec![start];
    loop {
        let following = *next.get(cycle.last()?)?;
        if following == start {
            break;
        }
        if cycle.len() >= next.len() {
            return None;
        }
        cycle.push(following);
    }
    (cycle.len() == next.len()).then_some(cycle)
}

/// Fill reflex dents in the outer boundary until it is convex
///
/// Super-triangle corners are finite, so for flat sets some circumcircles of
/// true hull triangles reach past them and those triangles are lost with the
/// corners. Each dent is closed with the triangle over its reflex corner,
/// preferring one whose circumcircle holds no inserted point.
fn close_hull(triangles: &mut Vec<[usize; 3]>, vertices: &[DVec2], inserted: &[usize]) {
    let Some(mut cycle) = boundary_cycle(triangles, vertices) else {
        return;
    };

    while cycle.len() > 3 {
        let m = cycle.len();
        let mut fallback = None;
        let mut chosen = None;

        for k in 0..m {
            let (a, b, c) = (cycle[(k + m - 1) % m], cycle[k], cycle[(k + 1) % m]);
            let (pa, pb, pc) = (vertices[a], vertices[b], vertices[c]);
            if orient(pa, pb, pc) >= -DEGENERATE_EPSILON {
                continue;
            }
            let blocked = cycle.iter().any(|&w| {
                let pw = vertices[w];
                w != a
                    && w != b
                    && w != c
                    && orient(pa, pc, pw) > 0.0
                    && orient(pc, pb, pw) > 0.0
                    && orient(pb, pa, pw) > 0.0
            });
            if blocked {
                continue;
            }
            let Some(triangle) = Triangle::new([a, c, b], vertices) else {
                continue;
            };
            let empty = inserted
                .iter()
                .filter(|&&j| j != a && j != b && j != c)
                .all(|&j| triangle.center.distance_squared(vertices[j]) >= triangle.radius_sq * (1.0 - 1e-9));
            if empty {
                chosen = Some((k, triangle.v));
                break;
            }
            if fallback.is_none() {
                fallback = Some((k, triangle.v));
            }
        }

        let Some((k, v)) = chosen.or(fallback) else {
            break;
        };
        triangles.push(v);
        cycle.remove(k);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    /// No input point lies strictly inside any triangle's circumcircle
    fn assert_empty_circumcircles(points: &[Vec2], result: &Triangulation) {
        let vertices: Vec<DVec2> = points.iter().map(|p| p.as_dvec2()).collect();
        for t in &result.triangles {
            let (center, r2) = circumcircle(vertices[t[0]], vertices[t[1]], vertices[t[2]])
                .expect("output triangles are non-degenerate");
            for (i, p) in vertices.iter().enumerate() {
                if t.contains(&i) || result.skipped.contains(&i) {
                    continue;
                }
                assert!(
                    center.distance_squared(*p) >= r2 * (1.0 - 1e-9),
                    "point {} inside circumcircle of {:?}",
                    i,
                    t
                );
            }
        }
    }

    #[test]
    fn test_square() {
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let result = triangulate(&points);
        assert_eq!(result.triangles.len(), 2);
        assert!(result.skipped.is_empty());
        assert_empty_circumcircles(&points, &result);
    }

    #[test]
    fn test_random_points_are_delaunay() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let points: Vec<Vec2> = (0..40)
            .map(|_| Vec2::new(rng.gen_range(-20.0..20.0), rng.gen_range(-20.0..20.0)))
            .collect();
        let result = triangulate(&points);
        assert!(result.skipped.is_empty());
        assert_empty_circumcircles(&points, &result);

        let used: std::collections::HashSet<usize> = result.triangles.iter().flatten().copied().collect();
        assert_eq!(used.len(), points.len());
    }

    #[test]
    fn test_convex_polygon_count() {
        let points: Vec<Vec2> = (0..7)
            .map(|i| {
                let a = std::f32::consts::TAU * i as f32 / 7.0;
                Vec2::new(5.0 * a.cos(), 3.0 * a.sin())
            })
            .collect();
        assert_eq!(triangulate(&points).triangles.len(), 5);
    }

    /// Convex hull size by monotone chain, collinear points excluded
    fn hull_size(points: &[Vec2]) -> usize {
        let mut sorted: Vec<DVec2> = points.iter().map(|p| p.as_dvec2()).collect();
        sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        let chain = |iter: &mut dyn Iterator<Item = &DVec2>| {
            let mut half: Vec<DVec2> = Vec::new();
            for &p in iter {
                while half.len() >= 2 && orient(half[half.len() - 2], half[half.len() - 1], p) <= 0.0 {
                    half.pop();
                }
                half.push(p);
            }
            half.len() - 1
        };
        chain(&mut sorted.iter()) + chain(&mut sorted.iter().rev())
    }

    #[test]
    fn test_flat_sets_keep_hull_triangles() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..60 {
            let n = rng.gen_range(5..30);
            let points: Vec<Vec2> = (0..n)
                .map(|_| Vec2::new(rng.gen_range(-50.0..50.0), rng.gen_range(-5.0..5.0)))
                .collect();
            let result = triangulate(&points);
            assert!(result.skipped.is_empty());
            assert_eq!(result.triangles.len(), 2 * n - 2 - hull_size(&points));
            assert_empty_circumcircles(&points, &result);
        }
    }

    #[test]
    fn test_duplicates_skipped() {
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(0.0, 3.0),
            Vec2::new(4.0, 0.0),
        ];
        let result = triangulate(&points);
        assert_eq!(result.skipped, vec![3]);
        assert_eq!(result.triangles.len(), 1);
    }

    #[test]
    fn test_collinear_gives_no_triangles() {
        let points = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0)];
        assert!(triangulate(&points).triangles.is_empty());
        assert!(triangulate(&points[..2]).triangles.is_empty());
    }

    #[test]
    fn test_edges_deduplicated() {
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(0.0, 3.0),
        ];
        assert_eq!(triangulate(&points).edges(), vec![(0, 1), (0, 2), (1, 2)]);
    }
}
