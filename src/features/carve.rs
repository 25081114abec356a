//! Depression carving and masked relaxation
//!
//! Direct clamping alone leaves faceted crater walls and uniform smoothing
//! alone loses depth, so carving is followed by three ordered stages on a
//! masked region of the vertex graph:
//!
//! 1. Influence-weighted Laplacian smoothing with a tapering blend
//! 2. Blend towards the analytic crater profile
//! 3. Low-strength Laplacian polish
//!
//! Vertices end up no higher than before the carve, and carved vertices no
//! lower than their crater profile.

use glam::Vec2;

use super::{FeatureKind, FeatureSet, WaterFeature};
use crate::config::RelaxationConfig;
use crate::diagnostics::{DiagnosticKind, Diagnostics, Stage};
use crate::mesh::MeshData;

/// Summary of one carving pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarveReport {
    /// Per-vertex carve influence of mud puddles, for material grouping
    pub mud_influence: Vec<f32>,
    /// Vertices lowered by direct carving
    pub carved: usize,
    /// Vertices in the dilated relaxation mask
    pub relaxed: usize,
}

/// Carves every contoured feature into a surface mesh
pub struct DepressionCarver<'a> {
    config: &'a RelaxationConfig,
    features: Vec<&'a WaterFeature>,
}

impl<'a> DepressionCarver<'a> {
    /// Carver over the features of `set` that have a resolved outline
    pub fn new(config: &'a RelaxationConfig, set: &'a FeatureSet) -> Self {
        Self {
            config,
            features: set.iter().filter(|f| f.outline().is_some()).collect(),
        }
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Carve and relax the vertex heights of `mesh` in place
    ///
    /// Only positions change; normals are expected to be computed afterwards.
    pub fn carve(&self, mesh: &mut MeshData, diagnostics: &mut Diagnostics) -> CarveReport {
        let n = mesh.vertex_count();
        let mut report = CarveReport {
            mud_influence: vec![0.0; n],
            ..CarveReport::default()
        };
        if self.features.is_empty() || n == 0 {
            return report;
        }

        let has_mud = self.features.iter().any(|f| f.kind() == FeatureKind::MudPuddle);
        let pre: Vec<f32> = mesh.positions.iter().map(|p| p[1]).collect();
        let mut heights = pre.clone();
        let mut influence = vec![0.0f32; n];
        let mut soft = vec![0.0f32; n];
        // Ideal crater height; equal to `pre` where nothing carves
        let mut target = pre.clone();

        for (v, p) in mesh.positions.iter().enumerate() {
            let q = Vec2::new(p[0], p[2]);
            for feature in &self.features {
                let reach = match feature.kind() {
                    FeatureKind::Lake => self.config.soft_reach,
                    FeatureKind::MudPuddle => self.config.soft_reach_mud,
                };
                soft[v] = soft[v].max(feature.soft_influence_at(q, reach));

                let inf = feature.influence_at(q);
                if inf <= 0.0 {
                    continue;
                }
                influence[v] = influence[v].max(inf);
                if feature.kind() == FeatureKind::MudPuddle {
                    report.mud_influence[v] = report.mud_influence[v].max(inf);
                }
                if let Some(h) = feature.target_height(inf) {
                    target[v] = target[v].min(h);
                }
            }
            if target[v] < heights[v] {
                heights[v] = target[v];
                report.carved += 1;
            }
        }

        if report.carved == 0 {
            diagnostics.push(
                Stage::Carving,
                DiagnosticKind::GeometricDegeneracy,
                format!("{} features carved no vertices", self.features.len()),
            );
        }

        let adjacency = vertex_adjacency(n, &mesh.indices);
        let dilation = if has_mud {
            self.config.dilation_passes_mud
        } else {
            self.config.dilation_passes
        };
        let mask = build_mask(&influence, &soft, &adjacency, dilation);
        report.relaxed = mask.iter().filter(|m| **m).count();

        let (smooth, polish) = if has_mud {
            (self.config.smooth_passes_mud, self.config.polish_passes_mud)
        } else {
            (self.config.smooth_passes, self.config.polish_passes)
        };

        laplacian(&mut heights, &adjacency, &mask, &soft, smooth, self.config.smooth_strength);
        for v in 0..n {
            if mask[v] && influence[v] > 0.0 {
                let blend = (self.config.retarget_strength * influence[v]).min(1.0);
                heights[v] += (target[v] - heights[v]) * blend;
            }
        }
        laplacian(&mut heights, &adjacency, &mask, &soft, polish, self.config.polish_strength);

        for v in 0..n {
            if !mask[v] {
                continue;
            }
            let mut h = heights[v].min(pre[v]);
            if influence[v] > 0.0 {
                h = h.max(target[v]);
            }
            mesh.positions[v][1] = h;
        }

        log::info!(
            "carving: {} features, {} vertices carved, {} relaxed",
            self.features.len(),
            report.carved,
            report.relaxed
        );
        report
    }
}

/// Neighbour lists from a triangle index buffer
pub(crate) fn vertex_adjacency(vertex_count: usize, indices: &[u32]) -> Vec<Vec<u32>> {
    let mut adjacency = vec![Vec::new(); vertex_count];
    for tri in indices.chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            adjacency[a as usize].push(b);
            adjacency[b as usize].push(a);
        }
    }
    for list in &mut adjacency {
        list.sort_unstable();
        list.dedup();
    }
    adjacency
}

/// Carved vertices grown along edges into a transition ring
///
/// Growth stops at vertices no feature reaches at all, so the soft reach
/// bounds the ring however many passes are requested.
fn build_mask(influence: &[f32], soft: &[f32], adjacency: &[Vec<u32>], passes: usize) -> Vec<bool> {
    let mut mask: Vec<bool> = influence.iter().map(|i| *i > 0.0).collect();
    for _ in 0..passes {
        let grown: Vec<bool> = (0..mask.len())
            .map(|v| mask[v] || (soft[v] > 0.0 && adjacency[v].iter().any(|&u| mask[u as usize])))
            .collect();
        if grown == mask {
            break;
        }
        mask = grown;
    }
    mask
}

/// Jacobi Laplacian passes on masked vertices
///
/// Each vertex moves towards its neighbour average by
/// `strength · taper · weight`, where the taper falls linearly over passes.
fn laplacian(
    heights: &mut [f32],
    adjacency: &[Vec<u32>],
    mask: &[bool],
    weights: &[f32],
    passes: usize,
    strength: f32,
) {
    for pass in 0..passes {
        let taper = 1.0 - pass as f32 / passes as f32;
        let snapshot = heights.to_vec();
        for v in 0..heights.len() {
            if !mask[v] || adjacency[v].is_empty() {
                continue;
            }
            let avg = adjacency[v].iter().map(|&u| snapshot[u as usize]).sum::<f32>() / adjacency[v].len() as f32;
            let blend = (strength * taper * weights[v]).clamp(0.0, 1.0);
            heights[v] = snapshot[v] + (avg - snapshot[v]) * blend;
        }
    }
}
