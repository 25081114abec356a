//! Island boundary construction
//!
//! Places a ring of large "anchor" rocks around the island radius, derives
//! the terrain contour from a smoothed spline through them, pushes a second
//! ring of small rocks outward to form the shoreline, and pulls the contour
//! inward to get the foliage boundary.
//!
//! # Algorithm
//!
//! 1. Inner anchors at even angles, radius perturbed by periodic noise
//! 2. Closed spline through the anchor bases, heights from 2D noise
//! 3. Moving-average smoothing with wrap-around, then a second spline fit
//! 4. Shoreline anchors interpolated from the inner ring and offset outward,
//!    their height sampled by a downward ray against the placed inner rocks
//! 5. Foliage boundary: every contour point moved towards the centroid

use glam::{Vec2, Vec3};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f32::consts::TAU;

use crate::assets::{BlueprintId, InstanceTransform, ModelBlueprint, ModelPools};
use crate::config::IslandConfig;
use crate::diagnostics::{DiagnosticKind, Diagnostics, Stage};
use crate::geometry::{self, lerp, sample_closed, xz};
use crate::noise::{generate_noise, HeightNoise, DEFAULT_HARMONICS};
use crate::raycast::{SurfaceQuery, SurfaceRaycaster};
use crate::terrain::InteriorHeight;

/// Stage index used to derive the contour RNG stream
pub(crate) const CONTOUR_STAGE: u64 = 1;

const COINCIDENT_EPSILON: f32 = 1e-5;
const YAW_JITTER: f32 = 0.35;

/// Number of anchors on a ring: `max(3, round(k·radius^p))`
///
/// ```
/// use procedural_island::contour::anchor_count;
///
/// assert_eq!(anchor_count(3.75, 20.0, 1.0), 75);
/// assert_eq!(anchor_count(3.75, 25.0, 1.0), 94);
/// assert_eq!(anchor_count(0.01, 5.0, 1.0), 3);
/// ```
pub fn anchor_count(density: f32, radius: f32, exponent: f32) -> usize {
    ((density * radius.powf(exponent)).round().max(0.0) as usize).max(3)
}

/// Closed, ordered curve on the island
///
/// The closing segment from the last point back to the first is implicit;
/// no two consecutive points (including last/first) coincide.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryCurve {
    points: Vec<Vec3>,
}

impl BoundaryCurve {
    /// Build a curve, dropping consecutive duplicates
    pub fn new(points: Vec<Vec3>) -> Self {
        let mut deduped: Vec<Vec3> = Vec::with_capacity(points.len());
        for p in points {
            if deduped.last().map_or(true, |last| last.distance(p) > COINCIDENT_EPSILON) {
                deduped.push(p);
            }
        }
        while deduped.len() > 1 {
            let (first, last) = (deduped[0], deduped[deduped.len() - 1]);
            if first.distance(last) > COINCIDENT_EPSILON {
                break;
            }
            deduped.pop();
        }
        Self { points: deduped }
    }

    #[inline]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points with the first one repeated at the end, for line-strip output
    pub fn closed(&self) -> Vec<Vec3> {
        let mut pts = self.points.clone();
        if let Some(first) = self.points.first() {
            pts.push(*first);
        }
        pts
    }

    pub fn contains_xz(&self, x: f32, z: f32) -> bool {
        geometry::contains_xz(&self.points, x, z)
    }

    pub fn centroid_xz(&self) -> Vec2 {
        geometry::centroid_xz(&self.points)
    }

    pub fn signed_area_xz(&self) -> f32 {
        geometry::signed_area_xz(&self.points)
    }

    /// Farthest crossing along a direction from an interior point
    pub fn ray_crossing(&self, origin: Vec2, dir: Vec2) -> Option<(f32, Vec3)> {
        geometry::ray_intersection_xz(&self.points, origin, dir)
    }
}

/// A placed boundary rock
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    /// Source model; `None` when the pool was empty
    pub blueprint: Option<BlueprintId>,
    pub transform: InstanceTransform,
    /// Outward unit normal of the ring at this anchor (XZ plane)
    pub normal: Vec3,
}

impl Anchor {
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.transform.translation
    }
}

/// All boundary geometry of one island
#[derive(Debug, Clone)]
pub struct ContourResult {
    /// Large rocks along the island radius
    pub inner_anchors: Vec<Anchor>,
    /// Small rocks along the shoreline
    pub outer_anchors: Vec<Anchor>,
    /// Outer edge of the terrain surface
    pub terrain_contour: BoundaryCurve,
    /// Curve through the shoreline anchors at ring height
    pub shoreline: BoundaryCurve,
    /// Inner edge of the vegetation band
    pub foliage_boundary: BoundaryCurve,
    /// Area centroid of the terrain contour
    pub centroid: Vec2,
    /// Interior noise height at the centroid
    pub centroid_height: f32,
}

impl ContourResult {
    /// True when the terrain contour has fewer than 3 points and no surface
    /// can be built on it
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.terrain_contour.len() < 3
    }
}

/// Builds anchors and boundary curves from the configuration and model pools
pub struct ContourBuilder<'a> {
    config: &'a IslandConfig,
    pools: &'a ModelPools,
    interior: InteriorHeight,
    edge_noise: HeightNoise,
}

impl<'a> ContourBuilder<'a> {
    pub fn new(config: &'a IslandConfig, pools: &'a ModelPools) -> Self {
        Self {
            config,
            pools,
            interior: InteriorHeight::from_config(config),
            edge_noise: HeightNoise::new(config.seed.wrapping_add(101), config.height_noise),
        }
    }

    /// Run the whole contour stage
    ///
    /// A terrain contour that collapses to fewer than 3 distinct points is
    /// reported as insufficient input; the result is then
    /// [degenerate](ContourResult::is_degenerate) and carries no shoreline
    /// or foliage boundary.
    pub fn build(&self, diagnostics: &mut Diagnostics) -> ContourResult {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.stage_seed(CONTOUR_STAGE));
        let contour_cfg = &self.config.contour;

        if self.pools.large.is_empty() {
            diagnostics.push(
                Stage::Contour,
                DiagnosticKind::InsufficientInput,
                "no large models available, inner anchors placed without rocks",
            );
        }
        if self.pools.small.is_empty() {
            diagnostics.push(
                Stage::Contour,
                DiagnosticKind::InsufficientInput,
                "no small models available, shoreline anchors placed without rocks",
            );
        }

        let inner_anchors = self.place_inner_anchors(&mut rng);
        let terrain_contour = self.terrain_contour(&inner_anchors);
        if terrain_contour.len() < 3 {
            diagnostics.push(
                Stage::Contour,
                DiagnosticKind::InsufficientInput,
                format!("terrain contour has only {} distinct points", terrain_contour.len()),
            );
            let points = terrain_contour.points();
            let centroid = points.iter().map(|p| Vec2::new(p.x, p.z)).sum::<Vec2>() / points.len().max(1) as f32;
            return ContourResult {
                inner_anchors,
                outer_anchors: Vec::new(),
                centroid_height: self.interior.height(centroid.x, centroid.y),
                centroid,
                terrain_contour,
                shoreline: BoundaryCurve::default(),
                foliage_boundary: BoundaryCurve::default(),
            };
        }

        let rock_surface = self.inner_rock_surface(&inner_anchors);
        let outer_anchors = self.place_outer_anchors(&inner_anchors, &rock_surface, &mut rng);
        let shoreline = ccw_curve(sample_closed(
            &outer_anchors.iter().map(Anchor::position).collect::<Vec<_>>(),
            contour_cfg.resolution,
        ));

        let centroid = terrain_contour.centroid_xz();
        let centroid_height = self.interior.height(centroid.x, centroid.y);
        let foliage_boundary = foliage_boundary(
            &terrain_contour,
            centroid,
            centroid_height,
            contour_cfg.foliage_band_width,
        );
        if foliage_boundary.len() < 3 {
            diagnostics.push(
                Stage::Contour,
                DiagnosticKind::InsufficientInput,
                format!(
                    "foliage band width {} leaves fewer than 3 boundary points",
                    contour_cfg.foliage_band_width
                ),
            );
        }

        log::info!(
            "contour: {} inner anchors, {} shoreline anchors, {} contour points",
            inner_anchors.len(),
            outer_anchors.len(),
            terrain_contour.len()
        );

        ContourResult {
            inner_anchors,
            outer_anchors,
            terrain_contour,
            shoreline,
            foliage_boundary,
            centroid,
            centroid_height,
        }
    }

    fn place_inner_anchors(&self, rng: &mut ChaCha8Rng) -> Vec<Anchor> {
        let cfg = &self.config.contour;
        let radius = self.config.island_radius;
        let count = anchor_count(cfg.anchor_density, radius, cfg.anchor_exponent);

        let phase = rng.gen_range(0.0..TAU);
        let noise = generate_noise(count, phase, &DEFAULT_HARMONICS, rng);

        let positions: Vec<Vec3> = (0..count)
            .map(|i| {
                let angle = TAU * i as f32 / count as f32;
                let r = radius * (1.0 + noise[i] * cfg.irregularity);
                Vec3::new(r * angle.cos(), 0.0, r * angle.sin())
            })
            .collect();
        let normals = ring_normals(&positions);

        positions
            .into_iter()
            .zip(normals)
            .enumerate()
            .map(|(i, (position, normal))| {
                let angle = TAU * i as f32 / count as f32;
                let yaw = -angle + rng.gen_range(-YAW_JITTER..YAW_JITTER);
                Anchor {
                    blueprint: self.pools.large.choose(rng).map(|b| b.id),
                    transform: InstanceTransform::from_yaw(
                        position,
                        yaw,
                        Vec3::new(1.0, cfg.rock_height_scale, 1.0),
                    ),
                    normal,
                }
            })
            .collect()
    }

    fn inner_rock_surface(&self, anchors: &[Anchor]) -> SurfaceRaycaster {
        let triangles: Vec<[Vec3; 3]> = anchors
            .iter()
            .filter_map(|a| a.blueprint.and_then(|id| find_blueprint(&self.pools.large, id)).map(|b| (a, b)))
            .flat_map(|(anchor, blueprint)| blueprint.world_triangles(&anchor.transform).collect::<Vec<_>>())
            .collect();
        SurfaceRaycaster::from_triangles(triangles)
    }

    fn terrain_contour(&self, anchors: &[Anchor]) -> BoundaryCurve {
        let cfg = &self.config.contour;
        let bases: Vec<Vec3> = anchors.iter().map(Anchor::position).collect();

        let with_height: Vec<Vec3> = sample_closed(&bases, cfg.resolution)
            .into_iter()
            .map(|p| {
                let y = cfg.base_height + self.edge_noise.sample(p.x, p.z) * cfg.edge_noise_strength;
                Vec3::new(p.x, y, p.z)
            })
            .collect();

        let smoothed = moving_average_closed(&with_height, cfg.smoothing_window);
        ccw_curve(sample_closed(&smoothed, cfg.resolution))
    }

    fn place_outer_anchors(
        &self,
        inner: &[Anchor],
        rock_surface: &SurfaceRaycaster,
        rng: &mut ChaCha8Rng,
    ) -> Vec<Anchor> {
        let cfg = &self.config.contour;
        let count = anchor_count(cfg.anchor_density, self.config.shoreline_radius(), cfg.anchor_exponent);
        let n = inner.len();

        let phase = rng.gen_range(0.0..TAU);
        let noise = generate_noise(count, phase, &DEFAULT_HARMONICS, rng);

        (0..count)
            .map(|j| {
                let f = j as f32 / count as f32 * n as f32;
                let i0 = (f.floor() as usize).min(n - 1);
                let i1 = (i0 + 1) % n;
                let s = f - i0 as f32;

                let base = inner[i0].position().lerp(inner[i1].position(), s);
                let normal = inner[i0]
                    .normal
                    .lerp(inner[i1].normal, s)
                    .try_normalize()
                    .unwrap_or(inner[i0].normal);
                let offset = cfg.shoreline_offset * (1.0 + noise[j] * cfg.offset_irregularity);
                let mut position = base + normal * offset;

                let ring_height = rock_surface
                    .height_at(position.x, position.z)
                    .unwrap_or(cfg.min_shoreline_height)
                    .max(cfg.min_shoreline_height);
                position.y = ring_height;

                let yaw = -normal.z.atan2(normal.x) + rng.gen_range(-YAW_JITTER..YAW_JITTER);
                Anchor {
                    blueprint: self.pools.small.choose(rng).map(|b| b.id),
                    transform: InstanceTransform::from_yaw(
                        position,
                        yaw,
                        Vec3::new(1.0, cfg.rock_height_scale, 1.0),
                    ),
                    normal,
                }
            })
            .collect()
    }
}

fn find_blueprint(pool: &[ModelBlueprint], id: BlueprintId) -> Option<&ModelBlueprint> {
    pool.iter().find(|b| b.id == id)
}

/// Outward XZ normals of a counter-clockwise ring
fn ring_normals(ring: &[Vec3]) -> Vec<Vec3> {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let tangent = ring[(i + 1) % n] - ring[(i + n - 1) % n];
            Vec3::new(tangent.z, 0.0, -tangent.x)
                .try_normalize()
                .unwrap_or_else(|| Vec3::new(ring[i].x, 0.0, ring[i].z).normalize_or_zero())
        })
        .collect()
}

/// Moving average over a closed sequence with half-width `window`
pub fn moving_average_closed(points: &[Vec3], window: usize) -> Vec<Vec3> {
    let n = points.len();
    if window == 0 || n < 3 {
        return points.to_vec();
    }
    let window = window.min((n - 1) / 2);
    let span = (2 * window + 1) as f32;

    (0..n)
        .map(|i| {
            let sum: Vec3 = (0..=2 * window)
                .map(|k| points[(i + n + k - window) % n])
                .sum();
            sum / span
        })
        .collect()
}

/// Curve with counter-clockwise XZ winding (angle increasing from +X to +Z)
fn ccw_curve(mut points: Vec<Vec3>) -> BoundaryCurve {
    if geometry::signed_area_xz(&points) < 0.0 {
        points.reverse();
    }
    BoundaryCurve::new(points)
}

/// Pull every contour point towards the centroid by `band_width`
///
/// Points that would pass the centroid stop on it. Height is blended towards
/// the centroid height by the fraction of the distance travelled.
pub fn foliage_boundary(
    contour: &BoundaryCurve,
    centroid: Vec2,
    centroid_height: f32,
    band_width: f32,
) -> BoundaryCurve {
    let points = contour
        .points()
        .iter()
        .map(|p| {
            let offset = xz(*p) - centroid;
            let dist = offset.length();
            if dist <= f32::EPSILON {
                return Vec3::new(centroid.x, centroid_height, centroid.y);
            }
            let remaining = (dist - band_width).max(0.0);
            let moved_fraction = (dist - remaining) / dist;
            let q = centroid + offset * (remaining / dist);
            Vec3::new(q.x, lerp(p.y, centroid_height, moved_fraction), q.y)
        })
        .collect();
    BoundaryCurve::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IslandConfigBuilder;

    fn pools(count: usize) -> ModelPools {
        let make = |offset: usize| -> Vec<ModelBlueprint> {
            (0..count)
                .map(|i| {
                    ModelBlueprint::from_bounds(
                        BlueprintId(offset + i),
                        format!("rock{}", offset + i),
                        Vec3::new(-1.0, 0.0, -1.0),
                        Vec3::new(1.0, 2.0, 1.0),
                    )
                })
                .collect()
        };
        ModelPools::new(make(100), make(0))
    }

    fn config() -> IslandConfig {
        IslandConfigBuilder::new()
            .seed(9)
            .island_radius(20.0)
            .unwrap()
            .shoreline_offset(5.0)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_anchor_counts() {
        let config = config();
        let pools = pools(10);
        let mut diagnostics = Diagnostics::new();
        let result = ContourBuilder::new(&config, &pools).build(&mut diagnostics);

        assert_eq!(result.inner_anchors.len(), 75);
        assert_eq!(result.outer_anchors.len(), 94);
        assert!(diagnostics.is_empty());
        assert!(result.inner_anchors.iter().all(|a| a.blueprint.map_or(false, |b| b.0 < 100)));
        assert!(result.outer_anchors.iter().all(|a| a.blueprint.map_or(false, |b| b.0 >= 100)));
    }

    #[test]
    fn test_curves_closed_without_coincident_points() {
        let config = config();
        let pools = pools(3);
        let result = ContourBuilder::new(&config, &pools).build(&mut Diagnostics::new());

        for curve in [&result.terrain_contour, &result.shoreline, &result.foliage_boundary] {
            assert!(curve.len() >= 3);
            let closed = curve.closed();
            assert_eq!(closed.first(), closed.last());
            for pair in closed.windows(2) {
                assert!(pair[0].distance(pair[1]) > COINCIDENT_EPSILON);
            }
            assert!(curve.signed_area_xz() > 0.0);
        }
    }

    #[test]
    fn test_shoreline_outside_contour_and_above_floor() {
        let config = config();
        let pools = pools(3);
        let result = ContourBuilder::new(&config, &pools).build(&mut Diagnostics::new());

        for anchor in &result.outer_anchors {
            assert!(anchor.position().y >= config.contour.min_shoreline_height);
        }
        assert!(result.shoreline.signed_area_xz() > result.terrain_contour.signed_area_xz());
        assert!(result.terrain_contour.signed_area_xz() > result.foliage_boundary.signed_area_xz());
    }

    #[test]
    fn test_collapsed_contour_is_reported() {
        let config = IslandConfigBuilder::new()
            .seed(9)
            .island_radius(1e-6)
            .unwrap()
            .build()
            .unwrap();
        let mut diagnostics = Diagnostics::new();
        let result = ContourBuilder::new(&config, &pools(3)).build(&mut diagnostics);

        assert!(result.is_degenerate());
        assert!(result.shoreline.is_empty());
        assert!(result.foliage_boundary.is_empty());
        assert!(diagnostics
            .for_stage(Stage::Contour)
            .any(|d| d.kind == DiagnosticKind::InsufficientInput));
    }

    #[test]
    fn test_missing_models_is_not_fatal() {
        let config = config();
        let pools = ModelPools::default();
        let mut diagnostics = Diagnostics::new();
        let result = ContourBuilder::new(&config, &pools).build(&mut diagnostics);

        assert_eq!(result.inner_anchors.len(), 75);
        assert!(result.inner_anchors.iter().all(|a| a.blueprint.is_none()));
        assert!(diagnostics.has_kind(DiagnosticKind::InsufficientInput));
        // Shoreline falls back to the minimum height without rocks to hit
        for anchor in &result.outer_anchors {
            assert_eq!(anchor.position().y, config.contour.min_shoreline_height);
        }
    }

    #[test]
    fn test_foliage_boundary_clamps_at_centroid() {
        let contour = BoundaryCurve::new(vec![
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 2.0),
            Vec3::new(-2.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, -2.0),
        ]);
        let band = foliage_boundary(&contour, Vec2::ZERO, 5.0, 10.0);
        // Every point collapses onto the centroid and duplicates are dropped
        assert_eq!(band.len(), 1);
        assert_eq!(band.points()[0], Vec3::new(0.0, 5.0, 0.0));

        let band = foliage_boundary(&contour, Vec2::ZERO, 5.0, 1.0);
        assert_eq!(band.len(), 4);
        assert!((band.points()[0] - Vec3::new(1.0, 3.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_moving_average_wraps() {
        let points = vec![
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::ZERO,
        ];
        let smoothed = moving_average_closed(&points, 1);
        assert!((smoothed[1].x - 1.0).abs() < 1e-6);
        assert!((smoothed[4].x - 1.0).abs() < 1e-6);
        assert!((smoothed[0].x - 1.0).abs() < 1e-6);
        assert_eq!(smoothed[2].x, 0.0);
    }

    #[test]
    fn test_boundary_curve_drops_closing_duplicate() {
        let curve = BoundaryCurve::new(vec![Vec3::ZERO, Vec3::X, Vec3::X, Vec3::Z, Vec3::ZERO]);
        assert_eq!(curve.points(), &[Vec3::ZERO, Vec3::X, Vec3::Z]);
    }
}
