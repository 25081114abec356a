//! Feature centre placement and outline resolution

use glam::{Vec2, Vec3};
use rand::Rng;
use std::f32::consts::TAU;

use super::{FeatureOutline, FeatureSet, FeatureStateName, WaterFeature};
use crate::contour::BoundaryCurve;
use crate::diagnostics::{DiagnosticKind, Diagnostics, Stage};
use crate::geometry::{bounds_xz, distance_to_edges_xz};
use crate::noise::generate_noise;
use crate::terrain::HeightProfile;

/// Rejection-sampling attempts per feature before giving up
pub const MAX_PLACEMENT_ATTEMPTS: usize = 200;

/// Assign centres to every `Requested` feature
///
/// A candidate is accepted when the feature's maximum radius fits inside
/// `boundary` and does not overlap any feature placed before it. Features
/// that exhaust [`MAX_PLACEMENT_ATTEMPTS`] stay `Requested` and produce a
/// `PlacementFailed` diagnostic. Returns the number of features placed.
pub fn place_features<R: Rng + ?Sized>(
    features: &mut FeatureSet,
    boundary: &BoundaryCurve,
    rng: &mut R,
    diagnostics: &mut Diagnostics,
) -> usize {
    let pending = features
        .iter()
        .filter(|f| f.state().name() == FeatureStateName::Requested)
        .count();
    if pending == 0 {
        return 0;
    }
    if boundary.len() < 3 {
        diagnostics.push(
            Stage::Features,
            DiagnosticKind::InsufficientInput,
            format!("foliage boundary too small to place {} features", pending),
        );
        return 0;
    }

    let (min, max) = bounds_xz(boundary.points());
    let mut placed = 0;

    let ids: Vec<u32> = features.iter().map(WaterFeature::id).collect();
    for id in ids {
        let (radius, requested) = match features.get(id) {
            Ok(f) => (f.max_radius(), f.state().name() == FeatureStateName::Requested),
            Err(_) => continue,
        };
        if !requested {
            continue;
        }

        let occupied: Vec<(Vec2, f32)> = features
            .iter()
            .filter_map(|f| f.center().map(|c| (c, f.max_radius())))
            .collect();

        let found = (0..MAX_PLACEMENT_ATTEMPTS).find_map(|_| {
            let candidate = Vec2::new(rng.gen_range(min.x..=max.x), rng.gen_range(min.y..=max.y));
            let fits = boundary.contains_xz(candidate.x, candidate.y)
                && distance_to_edges_xz(boundary.points(), candidate) >= radius
                && occupied.iter().all(|(c, r)| c.distance(candidate) >= r + radius);
            fits.then_some(candidate)
        });

        match (found, features.get_mut(id)) {
            (Some(center), Ok(feature)) => {
                if feature.place(center).is_ok() {
                    log::debug!("placed {:?} {} at {}", feature.kind(), id, center);
                    placed += 1;
                }
            }
            _ => diagnostics.push(
                Stage::Features,
                DiagnosticKind::PlacementFailed,
                format!(
                    "feature {} (radius {:.2}) found no free spot in {} attempts",
                    id, radius, MAX_PLACEMENT_ATTEMPTS
                ),
            ),
        }
    }
    placed
}

/// Noise-perturbed closed outline around a centre
///
/// Heights and the rim height are taken from the pre-carve `profile`.
pub fn generate_outline<R: Rng + ?Sized>(
    feature: &WaterFeature,
    center: Vec2,
    profile: &HeightProfile,
    rng: &mut R,
) -> FeatureOutline {
    let kind = feature.kind();
    let n = kind.outline_points();
    let phase = rng.gen_range(0.0..TAU);
    let noise = generate_noise(n, phase, kind.harmonics(), rng);

    let radii: Vec<f32> = noise
        .iter()
        .map(|v| feature.base_radius() * (1.0 + v * kind.irregularity()))
        .collect();
    let points: Vec<Vec3> = radii
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let angle = TAU * i as f32 / n as f32;
            let x = center.x + r * angle.cos();
            let z = center.y + r * angle.sin();
            Vec3::new(x, profile.height_at(x, z), z)
        })
        .collect();
    let rim_height = points.iter().map(|p| p.y).sum::<f32>() / n as f32;

    FeatureOutline {
        points,
        radii,
        rim_height,
    }
}

/// Resolve outlines of every `Centered` feature; returns how many changed
pub fn resolve_outlines<R: Rng + ?Sized>(
    features: &mut FeatureSet,
    profile: &HeightProfile,
    rng: &mut R,
) -> usize {
    let mut resolved = 0;
    for feature in features.iter_mut() {
        let center = match feature.state().name() {
            FeatureStateName::Centered => feature.center(),
            _ => None,
        };
        if let Some(center) = center {
            let outline = generate_outline(feature, center, profile, rng);
            log::debug!(
                "feature {} outline: {} points, rim {:.3}",
                feature.id(),
                outline.points.len(),
                outline.rim_height
            );
            if feature.resolve_outline(outline).is_ok() {
                resolved += 1;
            }
        }
    }
    resolved
}
