//! Area-weighted vegetation scatter
//!
//! Terrain triangles are filtered by slope, submersion and the vegetation
//! band between the foliage boundary and the terrain contour. Instances are
//! then drawn with probability proportional to triangle area and placed at
//! uniform barycentric positions, aligned to the face normal.

use glam::{Quat, Vec3};
use rand::seq::SliceRandom;
use rand::Rng;
use std::f32::consts::TAU;
use std::fmt;

use crate::assets::{BlueprintId, InstanceTransform, ModelBlueprint};
use crate::config::FoliageConfig;
use crate::contour::BoundaryCurve;
use crate::diagnostics::{DiagnosticKind, Diagnostics, Stage};
use crate::mesh::MeshData;
use crate::terrain::TerrainResult;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stage index used to derive the foliage RNG stream
pub(crate) const FOLIAGE_STAGE: u64 = 3;

/// Usable area unit that `density` is expressed against
const AREA_UNIT: f32 = 100.0;
const SCALE_JITTER_MIN: f32 = 0.8;
const SCALE_JITTER_MAX: f32 = 1.2;

/// One placed vegetation model
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoliageInstance {
    pub blueprint: BlueprintId,
    pub transform: InstanceTransform,
    /// Terrain triangle the instance stands on
    pub triangle: usize,
}

impl FoliageInstance {
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.transform.translation
    }
}

/// Why a triangle was excluded from scattering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooSteep,
    Submerged,
    OutsideContour,
    InsideFoliageBoundary,
}

/// Structured summary of one scatter pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScatterReport {
    pub triangles: usize,
    pub accepted: usize,
    pub too_steep: usize,
    pub submerged: usize,
    pub outside_contour: usize,
    pub inside_boundary: usize,
    pub usable_area: f32,
    /// Instance count before the optional cap
    pub requested: usize,
    pub placed: usize,
    /// Pivot of every placed instance
    pub pivots: Vec<Vec3>,
    /// Explanation when nothing could be placed
    pub note: Option<String>,
}

impl ScatterReport {
    fn reject(&mut self, reason: Rejection) {
        match reason {
            Rejection::TooSteep => self.too_steep += 1,
            Rejection::Submerged => self.submerged += 1,
            Rejection::OutsideContour => self.outside_contour += 1,
            Rejection::InsideFoliageBoundary => self.inside_boundary += 1,
        }
    }
}

impl fmt::Display for ScatterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "foliage: {}/{} triangles usable ({:.1} area), placed {} of {}",
            self.accepted, self.triangles, self.usable_area, self.placed, self.requested
        )?;
        writeln!(
            f,
            "  rejected: {} steep, {} submerged, {} outside contour, {} inside boundary",
            self.too_steep, self.submerged, self.outside_contour, self.inside_boundary
        )?;
        if let Some(note) = &self.note {
            writeln!(f, "  {}", note)?;
        }
        Ok(())
    }
}

/// Scattered instances with their report
#[derive(Debug, Clone, Default)]
pub struct FoliageResult {
    pub instances: Vec<FoliageInstance>,
    pub report: ScatterReport,
}

/// Scatters foliage blueprints over a finished terrain
pub struct FoliageScatter<'a> {
    config: &'a FoliageConfig,
    pool: &'a [ModelBlueprint],
}

impl<'a> FoliageScatter<'a> {
    pub fn new(config: &'a FoliageConfig, pool: &'a [ModelBlueprint]) -> Self {
        Self { config, pool }
    }

    /// Scatter over the band between the terrain contour and foliage boundary
    pub fn scatter<R: Rng + ?Sized>(
        &self,
        terrain: &TerrainResult,
        rng: &mut R,
        diagnostics: &mut Diagnostics,
    ) -> FoliageResult {
        self.scatter_mesh(
            &terrain.mesh,
            &terrain.contour.terrain_contour,
            &terrain.contour.foliage_boundary,
            rng,
            diagnostics,
        )
    }

    /// Scatter over any mesh between an outer and inner boundary
    pub fn scatter_mesh<R: Rng + ?Sized>(
        &self,
        mesh: &MeshData,
        outer: &BoundaryCurve,
        inner: &BoundaryCurve,
        rng: &mut R,
        diagnostics: &mut Diagnostics,
    ) -> FoliageResult {
        let mut result = FoliageResult::default();
        let report = &mut result.report;
        report.triangles = mesh.triangle_count();

        if self.pool.is_empty() {
            let msg = "no foliage models available, scatter skipped";
            diagnostics.push(Stage::Foliage, DiagnosticKind::InsufficientInput, msg);
            report.note = Some(msg.to_string());
            return result;
        }

        let min_up = self.config.max_slope_degrees.to_radians().cos();
        let mut accepted: Vec<(usize, [Vec3; 3], Vec3)> = Vec::new();
        let mut cumulative: Vec<f32> = Vec::new();

        for (t, tri) in mesh.triangles().enumerate() {
            let [a, b, c] = tri.map(|i| mesh.position(i));
            let cross = (b - a).cross(c - a);
            let area = cross.length() * 0.5;
            let normal = cross.try_normalize().unwrap_or(Vec3::Y);
            let centroid = (a + b + c) / 3.0;

            let rejection = if normal.y < min_up {
                Some(Rejection::TooSteep)
            } else if a.y <= 0.0 && b.y <= 0.0 && c.y <= 0.0 {
                Some(Rejection::Submerged)
            } else if !outer.contains_xz(centroid.x, centroid.z) {
                Some(Rejection::OutsideContour)
            } else if inner.len() >= 3 && inner.contains_xz(centroid.x, centroid.z) {
                Some(Rejection::InsideFoliageBoundary)
            } else {
                None
            };

            match rejection {
                Some(reason) => report.reject(reason),
                None if area > 0.0 => {
                    report.usable_area += area;
                    cumulative.push(report.usable_area);
                    accepted.push((t, [a, b, c], normal));
                }
                None => {}
            }
        }
        report.accepted = accepted.len();

        if report.usable_area <= 0.0 {
            let msg = "no usable foliage area: every triangle was rejected";
            diagnostics.push(Stage::Foliage, DiagnosticKind::GeometricDegeneracy, msg);
            report.note = Some(msg.to_string());
            return result;
        }

        report.requested = (report.usable_area / AREA_UNIT * self.config.density).floor() as usize;
        let count = self
            .config
            .max_count
            .map_or(report.requested, |cap| report.requested.min(cap));

        for _ in 0..count {
            let r = rng.gen_range(0.0..report.usable_area);
            let pick = cumulative.partition_point(|c| *c <= r).min(accepted.len() - 1);
            let (triangle, [a, b, c], normal) = accepted[pick];

            let (mut u, mut v) = (rng.gen::<f32>(), rng.gen::<f32>());
            if u + v > 1.0 {
                u = 1.0 - u;
                v = 1.0 - v;
            }
            let position = a + (b - a) * u + (c - a) * v;

            let yaw = rng.gen_range(0.0..TAU);
            let rotation = Quat::from_rotation_arc(Vec3::Y, normal) * Quat::from_rotation_y(yaw);
            let scale = self.config.scale * rng.gen_range(SCALE_JITTER_MIN..=SCALE_JITTER_MAX);

            let Some(blueprint) = self.pool.choose(rng) else {
                break;
            };
            result.instances.push(FoliageInstance {
                blueprint: blueprint.id,
                transform: InstanceTransform {
                    translation: position,
                    rotation,
                    scale: Vec3::splat(scale),
                },
                triangle,
            });
            report.pivots.push(position);
        }
        report.placed = result.instances.len();

        log::info!(
            "foliage: {} instances over {:.1} usable area ({} of {} triangles)",
            report.placed,
            report.usable_area,
            report.accepted,
            report.triangles
        );
        result
    }
}
