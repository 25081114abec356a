//! Analytic terrain height
//!
//! The blended height law lives here once and is shared by mesh building
//! and by anything that needs the pre-carve height at an arbitrary point
//! (rim heights of lakes and mud puddles).

use glam::{Vec2, Vec3};

use crate::config::IslandConfig;
use crate::geometry::{ease_out_quad, lerp, ray_intersection_xz};
use crate::noise::HeightNoise;

/// Noisy interior height: `base + noise(x, z)·strength`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteriorHeight {
    pub noise: HeightNoise,
    pub base_height: f32,
    pub strength: f32,
}

impl InteriorHeight {
    pub fn from_config(config: &IslandConfig) -> Self {
        Self {
            noise: HeightNoise::new(config.seed, config.height_noise),
            base_height: config.terrain.base_height,
            strength: config.terrain.noise_strength,
        }
    }

    #[inline]
    pub fn height(&self, x: f32, z: f32) -> f32 {
        self.base_height + self.noise.sample(x, z) * self.strength
    }
}

/// Radial blend between interior noise and the contour height
#[derive(Debug, Clone, PartialEq)]
pub struct HeightProfile {
    pub interior: InteriorHeight,
    pub center: Vec2,
    pub center_height: f32,
    contour: Vec<Vec3>,
}

impl HeightProfile {
    pub fn new(interior: InteriorHeight, center: Vec2, center_height: f32, contour: Vec<Vec3>) -> Self {
        Self {
            interior,
            center,
            center_height,
            contour,
        }
    }

    /// Height at radial fraction `t` (0 = centre, 1 = contour)
    ///
    /// With `ring = 1-(1-t)²` and `blend = ring²`:
    /// `lerp(interior(x,z), lerp(center, edge, ring), blend)`. Near the
    /// centre the noise dominates, near the edge the contour height does.
    pub fn blended(&self, x: f32, z: f32, t: f32, edge_height: f32) -> f32 {
        let ring = ease_out_quad(t.clamp(0.0, 1.0));
        let blend = ring * ring;
        let radial = lerp(self.center_height, edge_height, ring);
        lerp(self.interior.height(x, z), radial, blend)
    }

    /// Pre-carve height at any point inside the contour
    ///
    /// Finds the radial fraction by casting from the centre through (x, z)
    /// to the contour. Points beyond the contour clamp to `t = 1`.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let offset = Vec2::new(x, z) - self.center;
        let dist = offset.length();
        if dist <= f32::EPSILON {
            return self.blended(x, z, 0.0, self.center_height);
        }

        match ray_intersection_xz(&self.contour, self.center, offset) {
            Some((edge_dist, edge)) if edge_dist > f32::EPSILON => {
                self.blended(x, z, dist / edge_dist, edge.y)
            }
            _ => self.interior.height(x, z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::HeightNoiseConfig;

    fn flat_profile() -> HeightProfile {
        let interior = InteriorHeight {
            noise: HeightNoise::new(1, HeightNoiseConfig::default()),
            base_height: 4.0,
            strength: 0.0,
        };
        let contour = vec![
            Vec3::new(10.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 10.0),
            Vec3::new(-10.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, -10.0),
        ];
        HeightProfile::new(interior, Vec2::ZERO, 4.0, contour)
    }

    #[test]
    fn test_blend_endpoints() {
        let profile = flat_profile();
        assert_eq!(profile.blended(0.0, 0.0, 0.0, 1.0), 4.0);
        assert!((profile.blended(5.0, 0.0, 1.0, 1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_height_at_matches_blend_law() {
        let profile = flat_profile();
        // Halfway to the contour: ring = 0.75, blend = 0.5625
        let expected = lerp(4.0, lerp(4.0, 1.0, 0.75), 0.5625);
        assert!((profile.height_at(5.0, 0.0) - expected).abs() < 1e-5);
        assert!((profile.height_at(0.0, 0.0) - 4.0).abs() < 1e-6);
        assert!((profile.height_at(10.0, 0.0) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_monotone_towards_lower_edge() {
        let profile = flat_profile();
        let mut last = f32::INFINITY;
        for i in 0..=10 {
            let h = profile.height_at(i as f32, 0.0);
            assert!(h <= last + 1e-6);
            last = h;
        }
    }
}
