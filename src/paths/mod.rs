//! Path network across the island interior
//!
//! # Algorithm
//!
//! 1. Rejection-sample nodes inside the foliage boundary and outside lakes,
//!    projected down onto the terrain
//! 2. Delaunay-triangulate the nodes in XZ ([`triangulate`])
//! 3. Drop edges whose endpoints or midpoint fall in a lake
//! 4. Kruskal minimum spanning forest, plus a shuffled share of the
//!    cycle-forming edges as loops
//! 5. Trace each edge across the surface, smooth it with a spline and
//!    re-project it, then extrude a ribbon ([`build_ribbon`])

mod delaunay;
mod ribbon;

pub use delaunay::{triangulate, Triangulation};
pub use ribbon::{build_ribbon, PATH_Y_OFFSET};

use glam::{Vec2, Vec3};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::PathConfig;
use crate::contour::BoundaryCurve;
use crate::diagnostics::{DiagnosticKind, Diagnostics, Stage};
use crate::geometry::{bounds_xz, contains_xz, sample_open, xz};
use crate::mesh::MeshData;
use crate::raycast::SurfaceQuery;
use crate::spatial::SpacingIndex;
use crate::union_find::UnionFind;

/// Stage index used to derive the path RNG stream
pub(crate) const PATHS_STAGE: u64 = 4;

/// Candidate attempts per requested node
const ATTEMPTS_PER_NODE: usize = 100;
/// Straight-line samples checked against lakes before tracing
const LAKE_CHECK_SAMPLES: usize = 10;

/// Why an edge is part of the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Minimum spanning forest edge
    Spanning,
    /// Cycle-forming edge added back for loops
    Loop,
}

/// Selected edge between two nodes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathEdge {
    pub a: usize,
    pub b: usize,
    /// Squared planar distance
    pub weight: f32,
    pub kind: EdgeKind,
}

/// Traced, smoothed and meshed path along one edge
#[derive(Debug, Clone)]
pub struct PathRibbon {
    pub edge: PathEdge,
    /// Smoothed centreline on the surface
    pub points: Vec<Vec3>,
    /// Surface normal per centreline point
    pub normals: Vec<Vec3>,
    pub mesh: MeshData,
}

/// Nodes, selected edges and ribbons
#[derive(Debug, Clone, Default)]
pub struct PathNetwork {
    pub nodes: Vec<Vec3>,
    pub edges: Vec<PathEdge>,
    pub ribbons: Vec<PathRibbon>,
}

impl PathNetwork {
    pub fn spanning_edges(&self) -> impl Iterator<Item = &PathEdge> {
        self.edges.iter().filter(|e| e.kind == EdgeKind::Spanning)
    }

    pub fn loop_edges(&self) -> impl Iterator<Item = &PathEdge> {
        self.edges.iter().filter(|e| e.kind == EdgeKind::Loop)
    }

    /// Whether the selected edges connect every node
    pub fn is_connected(&self) -> bool {
        let mut uf = UnionFind::new(self.nodes.len());
        for e in &self.edges {
            uf.union(e.a, e.b);
        }
        uf.component_count() <= 1
    }
}

/// Builds a path network over a finished terrain surface
pub struct PathNetworkBuilder<'a> {
    config: &'a PathConfig,
    surface: &'a dyn SurfaceQuery,
    boundary: &'a BoundaryCurve,
    lakes: Vec<&'a [Vec3]>,
}

impl<'a> PathNetworkBuilder<'a> {
    /// # Arguments
    ///
    /// * `config` - Path parameters
    /// * `surface` - Terrain to trace on
    /// * `boundary` - Nodes are sampled inside this curve
    /// * `lakes` - Lake outline polygons paths must avoid
    pub fn new(
        config: &'a PathConfig,
        surface: &'a dyn SurfaceQuery,
        boundary: &'a BoundaryCurve,
        lakes: Vec<&'a [Vec3]>,
    ) -> Self {
        Self {
            config,
            surface,
            boundary,
            lakes,
        }
    }

    fn in_lake(&self, p: Vec2) -> bool {
        self.lakes.iter().any(|lake| contains_xz(lake, p.x, p.y))
    }

    /// Sample nodes and build the network
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R, diagnostics: &mut Diagnostics) -> PathNetwork {
        let nodes = self.sample_nodes(rng);
        self.build_from_nodes(nodes, rng, diagnostics)
    }

    /// Rejection-sample up to `num_points` surface nodes
    ///
    /// At most `100 × num_points` candidates are tried.
    pub fn sample_nodes<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Vec3> {
        let target = self.config.num_points;
        if target == 0 || self.boundary.len() < 3 {
            return Vec::new();
        }

        let (min, max) = bounds_xz(self.boundary.points());
        let mut spacing = SpacingIndex::new(self.config.min_node_spacing);
        let mut nodes = Vec::with_capacity(target);

        for _ in 0..ATTEMPTS_PER_NODE * target {
            if nodes.len() >= target {
                break;
            }
            let p = Vec2::new(rng.gen_range(min.x..=max.x), rng.gen_range(min.y..=max.y));
            if !self.boundary.contains_xz(p.x, p.y) || self.in_lake(p) || !spacing.is_clear(p) {
                continue;
            }
            if let Some(hit) = self.surface.cast_down(p.x, p.y) {
                spacing.try_insert(p);
                nodes.push(hit.point);
            }
        }
        log::debug!("paths: sampled {} of {} nodes", nodes.len(), target);
        nodes
    }

    /// Build the network over an explicit node set
    ///
    /// Fewer than 3 nodes aborts with an `InsufficientInput` diagnostic and
    /// an edgeless network.
    pub fn build_from_nodes<R: Rng + ?Sized>(
        &self,
        nodes: Vec<Vec3>,
        rng: &mut R,
        diagnostics: &mut Diagnostics,
    ) -> PathNetwork {
        let mut network = PathNetwork {
            nodes,
            ..PathNetwork::default()
        };
        if network.nodes.len() < 3 {
            diagnostics.push(
                Stage::Paths,
                DiagnosticKind::InsufficientInput,
                format!("only {} path nodes placed, need at least 3", network.nodes.len()),
            );
            return network;
        }

        network.edges = self.select_edges(&network.nodes, rng, diagnostics);

        let mut rejected = 0;
        for edge in &network.edges {
            let (a, b) = (network.nodes[edge.a], network.nodes[edge.b]);
            match self.trace(a, b) {
                Some((raw, raw_normals)) => {
                    let (points, normals) = self.smooth(&raw, &raw_normals);
                    let mesh = build_ribbon(&points, &normals, self.config.width);
                    network.ribbons.push(PathRibbon {
                        edge: *edge,
                        points,
                        normals,
                        mesh,
                    });
                }
                None => rejected += 1,
            }
        }

        log::info!(
            "paths: {} nodes, {} edges ({} loops), {} ribbons, {} rejected at tracing",
            network.nodes.len(),
            network.edges.len(),
            network.loop_edges().count(),
            network.ribbons.len(),
            rejected
        );
        network
    }

    /// Triangulate, filter and select spanning plus loop edges
    pub fn select_edges<R: Rng + ?Sized>(
        &self,
        nodes: &[Vec3],
        rng: &mut R,
        diagnostics: &mut Diagnostics,
    ) -> Vec<PathEdge> {
        let planar: Vec<Vec2> = nodes.iter().map(|p| xz(*p)).collect();
        let triangulation = triangulate(&planar);
        if !triangulation.skipped.is_empty() {
            diagnostics.push(
                Stage::Paths,
                DiagnosticKind::GeometricDegeneracy,
                format!("{} path nodes skipped by triangulation", triangulation.skipped.len()),
            );
        }

        let mut candidates: Vec<(usize, usize, f32)> = triangulation
            .edges()
            .into_iter()
            .filter(|&(a, b)| {
                let (pa, pb) = (planar[a], planar[b]);
                !(self.in_lake(pa) || self.in_lake(pb) || self.in_lake((pa + pb) * 0.5))
            })
            .map(|(a, b)| (a, b, planar[a].distance_squared(planar[b])))
            .collect();
        candidates.sort_by(|x, y| x.2.total_cmp(&y.2));

        let mut uf = UnionFind::new(nodes.len());
        let mut selected = Vec::new();
        let mut cycle_forming = Vec::new();
        for (a, b, weight) in candidates {
            let edge = PathEdge {
                a,
                b,
                weight,
                kind: EdgeKind::Spanning,
            };
            if uf.union(a, b) {
                selected.push(edge);
            } else {
                cycle_forming.push(PathEdge {
                    kind: EdgeKind::Loop,
                    ..edge
                });
            }
        }

        cycle_forming.shuffle(rng);
        let share = (self.config.loop_percentage.clamp(0.0, 100.0) / 100.0 * cycle_forming.len() as f32).round();
        selected.extend(cycle_forming.into_iter().take(share as usize));
        selected
    }

    /// Raw surface-hugging path between two nodes
    ///
    /// Returns `None` when the straight segment or any traced point falls in
    /// a lake. Raycast misses keep the straight-line point with an up normal.
    pub fn trace(&self, a: Vec3, b: Vec3) -> Option<(Vec<Vec3>, Vec<Vec3>)> {
        let (pa, pb) = (xz(a), xz(b));
        let crosses_lake = (0..LAKE_CHECK_SAMPLES)
            .map(|i| pa.lerp(pb, i as f32 / (LAKE_CHECK_SAMPLES - 1) as f32))
            .any(|p| self.in_lake(p));
        if crosses_lake {
            return None;
        }

        let steps = ((pa.distance(pb) / self.config.step_length).ceil() as usize).max(1);
        let mut points = Vec::with_capacity(steps + 1);
        let mut normals = Vec::with_capacity(steps + 1);
        for i in 0..=steps {
            let straight = a.lerp(b, i as f32 / steps as f32);
            if self.in_lake(xz(straight)) {
                return None;
            }
            match self.surface.cast_down(straight.x, straight.z) {
                Some(hit) => {
                    points.push(hit.point);
                    normals.push(hit.normal);
                }
                None => {
                    points.push(straight);
                    normals.push(Vec3::Y);
                }
            }
        }
        Some((points, normals))
    }

    /// Spline-smooth a raw path at twice its resolution and re-project it
    ///
    /// Paths with fewer than 3 points are returned unchanged.
    pub fn smooth(&self, raw: &[Vec3], raw_normals: &[Vec3]) -> (Vec<Vec3>, Vec<Vec3>) {
        if raw.len() < 3 {
            return (raw.to_vec(), raw_normals.to_vec());
        }
        sample_open(raw, raw.len() * 2)
            .into_iter()
            .map(|p| match self.surface.cast_down(p.x, p.z) {
                Some(hit) => (hit.point, hit.normal),
                None => (p, Vec3::Y),
            })
            .unzip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raycast::SurfaceRaycaster;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn flat_surface(half: f32, height: f32) -> SurfaceRaycaster {
        SurfaceRaycaster::from_triangles(vec![
            [
                Vec3::new(-half, height, -half),
                Vec3::new(-half, height, half),
                Vec3::new(half, height, -half),
            ],
            [
                Vec3::new(half, height, -half),
                Vec3::new(-half, height, half),
                Vec3::new(half, height, half),
            ],
        ])
    }

    fn square(half: f32) -> BoundaryCurve {
        BoundaryCurve::new(vec![
            Vec3::new(-half, 0.0, -half),
            Vec3::new(-half, 0.0, half),
            Vec3::new(half, 0.0, half),
            Vec3::new(half, 0.0, -half),
        ])
    }

    fn config(loop_percentage: f32) -> PathConfig {
        PathConfig {
            loop_percentage,
            ..PathConfig::default()
        }
    }

    #[test]
    fn test_right_triangle() {
        let surface = flat_surface(20.0, 1.0);
        let boundary = square(15.0);
        let config = config(0.0);
        let builder = PathNetworkBuilder::new(&config, &surface, &boundary, Vec::new());

        let nodes = vec![Vec3::new(0.0, 1.0, 0.0), Vec3::new(6.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 8.0)];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let network = builder.build_from_nodes(nodes, &mut rng, &mut Diagnostics::new());

        assert_eq!(network.edges.len(), 2);
        assert!(network.edges.iter().all(|e| e.kind == EdgeKind::Spanning));
        // The hypotenuse is the heaviest edge
        assert!(network.edges.iter().all(|e| !(e.a == 1 && e.b == 2)));
        assert!(network.is_connected());

        assert_eq!(network.ribbons.len(), 2);
        for ribbon in &network.ribbons {
            assert_eq!(ribbon.mesh.vertex_count(), 2 * ribbon.points.len());
            assert_eq!(ribbon.points.len(), ribbon.normals.len());
            assert!(ribbon.points.iter().all(|p| (p.y - 1.0).abs() < 1e-4));
        }
    }

    #[test]
    fn test_pure_mst_is_connected() {
        let surface = flat_surface(30.0, 2.0);
        let boundary = square(25.0);
        let config = PathConfig {
            num_points: 25,
            loop_percentage: 0.0,
            ..PathConfig::default()
        };
        let builder = PathNetworkBuilder::new(&config, &surface, &boundary, Vec::new());
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let network = builder.build(&mut rng, &mut Diagnostics::new());

        assert_eq!(network.nodes.len(), 25);
        assert_eq!(network.edges.len(), 24);
        assert!(network.is_connected());
        assert_eq!(network.loop_edges().count(), 0);
    }

    #[test]
    fn test_loop_share() {
        let surface = flat_surface(30.0, 0.0);
        let boundary = square(25.0);
        let config = PathConfig {
            num_points: 20,
            loop_percentage: 100.0,
            ..PathConfig::default()
        };
        let builder = PathNetworkBuilder::new(&config, &surface, &boundary, Vec::new());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let nodes = builder.sample_nodes(&mut rng);
        let planar: Vec<Vec2> = nodes.iter().map(|p| xz(*p)).collect();
        let all_edges = triangulate(&planar).edges().len();

        let edges = builder.select_edges(&nodes, &mut rng, &mut Diagnostics::new());
        assert_eq!(edges.len(), all_edges);
        assert_eq!(edges.iter().filter(|e| e.kind == EdgeKind::Spanning).count(), nodes.len() - 1);
    }

    #[test]
    fn test_nodes_avoid_lakes_and_keep_spacing() {
        let surface = flat_surface(30.0, 0.0);
        let boundary = square(20.0);
        let lake = square(6.0).points().to_vec();
        let config = PathConfig {
            num_points: 30,
            min_node_spacing: 2.0,
            ..PathConfig::default()
        };
        let builder = PathNetworkBuilder::new(&config, &surface, &boundary, vec![&lake]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let nodes = builder.sample_nodes(&mut rng);

        assert!(!nodes.is_empty());
        for (i, a) in nodes.iter().enumerate() {
            assert!(!contains_xz(&lake, a.x, a.z));
            for b in &nodes[i + 1..] {
                assert!(xz(*a).distance(xz(*b)) >= 2.0);
            }
        }
    }

    #[test]
    fn test_trace_rejects_lake_crossing() {
        let surface = flat_surface(30.0, 0.0);
        let boundary = square(20.0);
        let lake = square(2.0).points().to_vec();
        let config = config(0.0);
        let builder = PathNetworkBuilder::new(&config, &surface, &boundary, vec![&lake]);

        assert!(builder.trace(Vec3::new(-10.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0)).is_none());
        let (points, normals) = builder
            .trace(Vec3::new(-10.0, 0.0, 5.0), Vec3::new(10.0, 0.0, 5.0))
            .unwrap();
        // 20 units at step 0.5
        assert_eq!(points.len(), 41);
        assert!(normals.iter().all(|n| (*n - Vec3::Y).length() < 1e-5));
    }

    #[test]
    fn test_too_few_nodes_aborts() {
        let surface = flat_surface(10.0, 0.0);
        let boundary = square(5.0);
        let config = config(0.0);
        let builder = PathNetworkBuilder::new(&config, &surface, &boundary, Vec::new());
        let mut diagnostics = Diagnostics::new();
        let network = builder.build_from_nodes(
            vec![Vec3::ZERO, Vec3::X],
            &mut ChaCha8Rng::seed_from_u64(0),
            &mut diagnostics,
        );
        assert!(network.edges.is_empty());
        assert!(diagnostics.has_kind(DiagnosticKind::InsufficientInput));
    }

    #[test]
    fn test_smoothing_doubles_resolution() {
        let surface = flat_surface(10.0, 3.0);
        let boundary = square(5.0);
        let config = config(0.0);
        let builder = PathNetworkBuilder::new(&config, &surface, &boundary, Vec::new());
        let raw: Vec<Vec3> = (0..5).map(|i| Vec3::new(i as f32, 3.0, 0.0)).collect();
        let (points, normals) = builder.smooth(&raw, &vec![Vec3::Y; 5]);
        assert_eq!(points.len(), 10);
        assert_eq!(normals.len(), 10);
        assert!(points.iter().all(|p| (p.y - 3.0).abs() < 1e-4));

        let (short, _) = builder.smooth(&raw[..2], &[Vec3::Y; 2]);
        assert_eq!(short.len(), 2);
    }
}
