//! Lakes and mud puddles
//!
//! Each feature moves through an explicit lifecycle:
//!
//! ```text
//! Requested --place--> Centered --resolve_outline--> Contoured
//!                          ^                            |
//!                          +-----invalidate_outline-----+
//! ```
//!
//! The centre is kept when the outline is invalidated, so a feature stays
//! where it was while the terrain noise is re-rolled underneath it.

mod carve;
mod placement;

pub use carve::{CarveReport, DepressionCarver};
pub use placement::{generate_outline, place_features, resolve_outlines, MAX_PLACEMENT_ATTEMPTS};

use glam::{Vec2, Vec3};
use std::f32::consts::TAU;

use crate::error::{IslandError, Result};
use crate::geometry::smoothstep;
use crate::noise::{Harmonic, LAKE_HARMONICS, MUD_HARMONICS};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stage index used to derive the feature placement RNG stream
pub(crate) const FEATURES_STAGE: u64 = 2;

/// Fraction of a lake's depth its water surface sits below the rim
pub const WATER_LEVEL_FRACTION: f32 = 0.2;

/// Lake influence is full inside this fraction of the base radius
const LAKE_FLAT_FRACTION: f32 = 0.6;

/// Kind of depression
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Lake,
    MudPuddle,
}

impl FeatureKind {
    /// Points on the generated outline
    pub fn outline_points(self) -> usize {
        match self {
            FeatureKind::Lake => 32,
            FeatureKind::MudPuddle => 200,
        }
    }

    /// Relative radius perturbation of the outline
    pub fn irregularity(self) -> f32 {
        match self {
            FeatureKind::Lake => 0.25,
            FeatureKind::MudPuddle => 0.35,
        }
    }

    pub fn harmonics(self) -> &'static [Harmonic] {
        match self {
            FeatureKind::Lake => &LAKE_HARMONICS,
            FeatureKind::MudPuddle => &MUD_HARMONICS,
        }
    }
}

/// Name of a lifecycle state, for errors and logging
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureStateName {
    Requested,
    Centered,
    Contoured,
}

/// Resolved outline of a placed feature
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureOutline {
    /// Closed polygon at pre-carve terrain height
    pub points: Vec<Vec3>,
    /// Radius of each outline point, evenly spaced in angle from +X
    pub radii: Vec<f32>,
    /// Mean pre-carve terrain height along the outline
    pub rim_height: f32,
}

impl FeatureOutline {
    /// Outline radius at an angle, interpolated between samples
    pub fn radius_at_angle(&self, angle: f32) -> f32 {
        let n = self.radii.len();
        if n == 0 {
            return 0.0;
        }
        let f = angle.rem_euclid(TAU) / TAU * n as f32;
        let i0 = (f.floor() as usize) % n;
        let i1 = (i0 + 1) % n;
        let s = f - f.floor();
        self.radii[i0] + (self.radii[i1] - self.radii[i0]) * s
    }
}

/// Lifecycle state carrying the data resolved so far
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureState {
    /// Created, not yet placed
    Requested,
    /// Centre chosen; outline pending
    Centered { center: Vec2 },
    /// Centre and outline known
    Contoured { center: Vec2, outline: FeatureOutline },
}

impl FeatureState {
    pub fn name(&self) -> FeatureStateName {
        match self {
            FeatureState::Requested => FeatureStateName::Requested,
            FeatureState::Centered { .. } => FeatureStateName::Centered,
            FeatureState::Contoured { .. } => FeatureStateName::Contoured,
        }
    }
}

/// A lake or mud puddle carved into the terrain
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct WaterFeature {
    id: u32,
    kind: FeatureKind,
    base_radius: f32,
    depth: f32,
    state: FeatureState,
}

impl WaterFeature {
    fn new(id: u32, kind: FeatureKind, base_radius: f32, depth: f32) -> Self {
        Self {
            id,
            kind,
            base_radius,
            depth,
            state: FeatureState::Requested,
        }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    #[inline]
    pub fn base_radius(&self) -> f32 {
        self.base_radius
    }

    #[inline]
    pub fn depth(&self) -> f32 {
        self.depth
    }

    #[inline]
    pub fn state(&self) -> &FeatureState {
        &self.state
    }

    /// Largest radius any outline of this feature can reach
    pub fn max_radius(&self) -> f32 {
        self.base_radius * (1.0 + self.kind.irregularity())
    }

    pub fn center(&self) -> Option<Vec2> {
        match &self.state {
            FeatureState::Requested => None,
            FeatureState::Centered { center } | FeatureState::Contoured { center, .. } => Some(*center),
        }
    }

    pub fn outline(&self) -> Option<&FeatureOutline> {
        match &self.state {
            FeatureState::Contoured { outline, .. } => Some(outline),
            _ => None,
        }
    }

    pub fn rim_height(&self) -> Option<f32> {
        self.outline().map(|o| o.rim_height)
    }

    /// Water surface height; lakes only
    pub fn water_level(&self) -> Option<f32> {
        match self.kind {
            FeatureKind::Lake => self.rim_height().map(|rim| rim - WATER_LEVEL_FRACTION * self.depth),
            FeatureKind::MudPuddle => None,
        }
    }

    /// Assign the centre
    ///
    /// # Errors
    ///
    /// `InvalidFeatureState` unless the feature is `Requested`.
    pub fn place(&mut self, center: Vec2) -> Result<()> {
        self.expect_state(FeatureStateName::Requested)?;
        self.state = FeatureState::Centered { center };
        Ok(())
    }

    /// Attach a resolved outline
    ///
    /// # Errors
    ///
    /// `InvalidFeatureState` unless the feature is `Centered`.
    pub fn resolve_outline(&mut self, outline: FeatureOutline) -> Result<()> {
        self.expect_state(FeatureStateName::Centered)?;
        if let FeatureState::Centered { center } = self.state {
            self.state = FeatureState::Contoured { center, outline };
        }
        Ok(())
    }

    /// Drop the outline and rim height, keeping the centre
    ///
    /// Features that are not `Contoured` are left unchanged.
    pub fn invalidate_outline(&mut self) {
        if let FeatureState::Contoured { center, .. } = self.state {
            self.state = FeatureState::Centered { center };
        }
    }

    /// Carve influence in `[0, 1]` at a point
    ///
    /// Lakes fall off with `1 - smoothstep(0.6·base, max_radius, d)`; mud
    /// puddles with `1 - smoothstep(0, 1, d / r(θ))` where `r(θ)` is the
    /// noisy outline radius. Zero until the outline is resolved.
    pub fn influence_at(&self, p: Vec2) -> f32 {
        let (center, outline) = match &self.state {
            FeatureState::Contoured { center, outline } => (*center, outline),
            _ => return 0.0,
        };
        let offset = p - center;
        let d = offset.length();
        match self.kind {
            FeatureKind::Lake => {
                let max_r = self.max_radius();
                if d >= max_r {
                    return 0.0;
                }
                1.0 - smoothstep(LAKE_FLAT_FRACTION * self.base_radius, max_r, d)
            }
            FeatureKind::MudPuddle => {
                let r = outline.radius_at_angle(offset.y.atan2(offset.x));
                if r <= f32::EPSILON || d >= r {
                    return 0.0;
                }
                1.0 - smoothstep(0.0, 1.0, d / r)
            }
        }
    }

    /// Wide, soft falloff used to mask and weight relaxation
    ///
    /// `reach` is a multiple of the carve radius.
    pub fn soft_influence_at(&self, p: Vec2, reach: f32) -> f32 {
        let (center, outline) = match &self.state {
            FeatureState::Contoured { center, outline } => (*center, outline),
            _ => return 0.0,
        };
        let offset = p - center;
        let radius = match self.kind {
            FeatureKind::Lake => self.max_radius(),
            FeatureKind::MudPuddle => outline.radius_at_angle(offset.y.atan2(offset.x)),
        };
        let outer = radius * reach;
        if outer <= f32::EPSILON {
            return 0.0;
        }
        1.0 - smoothstep(0.0, outer, offset.length())
    }

    /// Carved height for a given influence, `rim - depth·influence`
    pub fn target_height(&self, influence: f32) -> Option<f32> {
        self.rim_height().map(|rim| rim - self.depth * influence)
    }

    fn expect_state(&self, expected: FeatureStateName) -> Result<()> {
        let found = self.state.name();
        if found == expected {
            Ok(())
        } else {
            Err(IslandError::InvalidFeatureState {
                id: self.id,
                expected,
                found,
            })
        }
    }
}

/// Owned list of water and mud features
///
/// Only mutated between generation passes; [`Island::generate`](crate::Island::generate)
/// borrows it mutably for the duration of one pass.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    features: Vec<WaterFeature>,
    next_id: u32,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a lake
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a non-positive radius or negative depth.
    pub fn add_lake(&mut self, base_radius: f32, depth: f32) -> Result<u32> {
        self.add(FeatureKind::Lake, base_radius, depth)
    }

    /// Request a mud puddle
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a non-positive radius or negative depth.
    pub fn add_mud_puddle(&mut self, base_radius: f32, depth: f32) -> Result<u32> {
        self.add(FeatureKind::MudPuddle, base_radius, depth)
    }

    fn add(&mut self, kind: FeatureKind, base_radius: f32, depth: f32) -> Result<u32> {
        if !(base_radius > 0.0) {
            return Err(IslandError::InvalidConfig(format!(
                "feature radius must be positive, got {}",
                base_radius
            )));
        }
        if !(depth >= 0.0) {
            return Err(IslandError::InvalidConfig(format!(
                "feature depth must be non-negative, got {}",
                depth
            )));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.features.push(WaterFeature::new(id, kind, base_radius, depth));
        log::debug!("requested {:?} {} (radius {}, depth {})", kind, id, base_radius, depth);
        Ok(id)
    }

    /// Remove a feature, returning it
    pub fn remove(&mut self, id: u32) -> Result<WaterFeature> {
        let idx = self
            .features
            .iter()
            .position(|f| f.id == id)
            .ok_or(IslandError::FeatureNotFound(id))?;
        Ok(self.features.remove(idx))
    }

    pub fn get(&self, id: u32) -> Result<&WaterFeature> {
        self.features
            .iter()
            .find(|f| f.id == id)
            .ok_or(IslandError::FeatureNotFound(id))
    }

    pub fn get_mut(&mut self, id: u32) -> Result<&mut WaterFeature> {
        self.features
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(IslandError::FeatureNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &WaterFeature> {
        self.features.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut WaterFeature> {
        self.features.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Invalidate every outline, keeping centres
    pub fn invalidate_outlines(&mut self) {
        self.features.iter_mut().for_each(WaterFeature::invalidate_outline);
    }

    /// Outline polygons of every contoured lake
    pub fn lake_outlines(&self) -> Vec<&[Vec3]> {
        self.features
            .iter()
            .filter(|f| f.kind == FeatureKind::Lake)
            .filter_map(|f| f.outline().map(|o| o.points.as_slice()))
            .collect()
    }

    /// Whether any contoured mud puddle exists
    pub fn has_mud(&self) -> bool {
        self.features
            .iter()
            .any(|f| f.kind == FeatureKind::MudPuddle && f.outline().is_some())
    }
}
