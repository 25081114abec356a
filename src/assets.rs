//! Placeable model blueprints supplied by the caller
//!
//! Model files are parsed elsewhere; the generator only needs each model's
//! triangle geometry (for ray queries against placed rocks) and its bounding
//! box (for pool partitioning). Placed objects refer to blueprints by
//! [`BlueprintId`] and never copy their geometry.

use glam::{Quat, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of a blueprint in the caller's model library
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlueprintId(pub usize);

/// Axis-aligned bounding box in model space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn from_points(points: &[Vec3]) -> Self {
        let (min, max) = points.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), p| (min.min(*p), max.max(*p)),
        );
        if points.is_empty() {
            Self {
                min: Vec3::ZERO,
                max: Vec3::ZERO,
            }
        } else {
            Self { min, max }
        }
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        (self.max - self.min).max(Vec3::ZERO)
    }

    #[inline]
    pub fn volume(&self) -> f32 {
        let s = self.size();
        s.x * s.y * s.z
    }
}

/// A loaded model: local triangle geometry plus its bounding box
#[derive(Debug, Clone)]
pub struct ModelBlueprint {
    pub id: BlueprintId,
    pub name: String,
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub bounds: Bounds,
}

impl ModelBlueprint {
    pub fn new(id: BlueprintId, name: impl Into<String>, positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let bounds = Bounds::from_points(&positions);
        Self {
            id,
            name: name.into(),
            positions,
            indices,
            bounds,
        }
    }

    /// Box-shaped stand-in geometry covering `min..max`
    pub fn from_bounds(id: BlueprintId, name: impl Into<String>, min: Vec3, max: Vec3) -> Self {
        let positions = vec![
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(max.x, max.y, max.z),
            Vec3::new(min.x, max.y, max.z),
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 1, 2, 0, 2, 3, // bottom
            4, 6, 5, 4, 7, 6, // top
            0, 5, 1, 0, 4, 5,
            1, 6, 2, 1, 5, 6,
            2, 7, 3, 2, 6, 7,
            3, 4, 0, 3, 7, 4,
        ];
        Self::new(id, name, positions, indices)
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// World-space triangles for an instance of this blueprint
    pub fn world_triangles(&self, transform: &InstanceTransform) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        let transform = *transform;
        self.indices.chunks_exact(3).map(move |tri| {
            [
                transform.apply(self.positions[tri[0] as usize]),
                transform.apply(self.positions[tri[1] as usize]),
                transform.apply(self.positions[tri[2] as usize]),
            ]
        })
    }
}

/// Translation, rotation and non-uniform scale of a placed instance
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl InstanceTransform {
    pub fn from_yaw(translation: Vec3, yaw: f32, scale: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::from_rotation_y(yaw),
            scale,
        }
    }

    #[inline]
    pub fn apply(&self, local: Vec3) -> Vec3 {
        self.translation + self.rotation * (local * self.scale)
    }
}

/// Blueprints split into small and large pools by bounding-box volume
#[derive(Debug, Clone, Default)]
pub struct ModelPools {
    pub small: Vec<ModelBlueprint>,
    pub large: Vec<ModelBlueprint>,
}

impl ModelPools {
    /// Default share of blueprints classed as small
    pub const DEFAULT_SMALL_PERCENTILE: f32 = 0.4;

    pub fn new(small: Vec<ModelBlueprint>, large: Vec<ModelBlueprint>) -> Self {
        Self { small, large }
    }

    /// Partition by volume: the bottom `small_percentile` share becomes the
    /// small pool, the rest the large pool
    ///
    /// With at least two blueprints both pools receive at least one entry.
    pub fn partition(mut blueprints: Vec<ModelBlueprint>, small_percentile: f32) -> Self {
        blueprints.sort_by(|a, b| a.bounds.volume().total_cmp(&b.bounds.volume()));

        let n = blueprints.len();
        let mut cut = (n as f32 * small_percentile.clamp(0.0, 1.0)).round() as usize;
        if n >= 2 {
            cut = cut.clamp(1, n - 1);
        }
        let large = blueprints.split_off(cut.min(n));

        Self {
            small: blueprints,
            large,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.small.is_empty() && self.large.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(id: usize, size: f32) -> ModelBlueprint {
        ModelBlueprint::from_bounds(BlueprintId(id), format!("cube{}", id), Vec3::ZERO, Vec3::splat(size))
    }

    #[test]
    fn test_bounds_volume() {
        let bp = cube(0, 2.0);
        assert_eq!(bp.bounds.volume(), 8.0);
        assert_eq!(bp.triangle_count(), 12);
    }

    #[test]
    fn test_partition_by_volume() {
        let blueprints: Vec<_> = (0..10).map(|i| cube(i, 1.0 + i as f32)).collect();
        let pools = ModelPools::partition(blueprints, ModelPools::DEFAULT_SMALL_PERCENTILE);

        assert_eq!(pools.small.len(), 4);
        assert_eq!(pools.large.len(), 6);
        let max_small = pools.small.iter().map(|b| b.bounds.volume()).fold(0.0, f32::max);
        let min_large = pools.large.iter().map(|b| b.bounds.volume()).fold(f32::INFINITY, f32::min);
        assert!(max_small <= min_large);
    }

    #[test]
    fn test_partition_keeps_both_pools() {
        let pools = ModelPools::partition(vec![cube(0, 1.0), cube(1, 1.0)], 0.0);
        assert_eq!(pools.small.len(), 1);
        assert_eq!(pools.large.len(), 1);
    }

    #[test]
    fn test_instance_transform() {
        let t = InstanceTransform::from_yaw(Vec3::new(10.0, 0.0, 0.0), std::f32::consts::FRAC_PI_2, Vec3::splat(2.0));
        let p = t.apply(Vec3::X);
        // +X rotated a quarter turn about Y points along -Z
        assert!((p - Vec3::new(10.0, 0.0, -2.0)).length() < 1e-5);
    }
}
