//! 2D Perlin height noise
//!
//! Seeded gradient noise over the XZ plane with fractal Brownian motion.
//! Uses the standard Ken Perlin permutation table so terrain stays
//! deterministic for a given seed.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::easing::lerp;

/// Configuration for the terrain height noise
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightNoiseConfig {
    /// World-space frequency (lower = broader hills)
    pub scale: f32,
    /// Number of fBm octaves
    pub octaves: usize,
    /// Amplitude decay per octave
    pub persistence: f32,
    /// Frequency multiplier per octave
    pub lacunarity: f32,
}

impl Default for HeightNoiseConfig {
    fn default() -> Self {
        Self {
            scale: 0.06,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

const PERM: [u8; 256] = [
    151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225, 140, 36, 103, 30, 69,
    142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148, 247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219,
    203, 117, 35, 11, 32, 57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68, 175,
    74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111, 229, 122, 60, 211, 133, 230,
    220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54, 65, 25, 63, 161, 1, 216, 80, 73, 209, 76,
    132, 187, 208, 89, 18, 169, 200, 196, 135, 130, 116, 188, 159, 86, 164, 100, 109, 198, 173,
    186, 3, 64, 52, 217, 226, 250, 124, 123, 5, 202, 38, 147, 118, 126, 255, 82, 85, 212, 207, 206,
    59, 227, 47, 16, 58, 17, 182, 189, 28, 42, 223, 183, 170, 213, 119, 248, 152, 2, 44, 154, 163,
    70, 221, 153, 101, 155, 167, 43, 172, 9, 129, 22, 39, 253, 19, 98, 108, 110, 79, 113, 224, 232,
    178, 185, 112, 104, 218, 246, 97, 228, 251, 34, 242, 193, 238, 210, 144, 12, 191, 179, 162,
    241, 81, 51, 145, 235, 249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157, 184, 84, 204,
    176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93, 222, 114, 67, 29, 24, 72, 243, 141,
    128, 195, 78, 66, 215, 61, 156, 180,
];

#[inline]
fn hash(x: i32, z: i32, seed: u32) -> u8 {
    let seed_hash = seed.wrapping_mul(1103515245).wrapping_add(12345) >> 8;
    let ix = ((x as u32) ^ seed_hash) & 255;
    let iz = ((z as u32) ^ (seed_hash >> 8)) & 255;
    let a = PERM[ix as usize] as u32;
    PERM[((a + iz) & 255) as usize]
}

/// Dot product with one of eight unit-ish gradient directions
#[inline]
fn gradient(hash_value: u8, x: f32, z: f32) -> f32 {
    match hash_value & 7 {
        0 => x + z,
        1 => -x + z,
        2 => x - z,
        3 => -x - z,
        4 => x,
        5 => -x,
        6 => z,
        _ => -z,
    }
}

#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Raw single-octave Perlin noise, roughly in [-1, 1]
pub fn perlin_2d(x: f32, z: f32, seed: u32) -> f32 {
    let x0 = x.floor() as i32;
    let z0 = z.floor() as i32;
    let xf = x - x.floor();
    let zf = z - z.floor();

    let u = fade(xf);
    let v = fade(zf);

    let g00 = gradient(hash(x0, z0, seed), xf, zf);
    let g10 = gradient(hash(x0 + 1, z0, seed), xf - 1.0, zf);
    let g01 = gradient(hash(x0, z0 + 1, seed), xf, zf - 1.0);
    let g11 = gradient(hash(x0 + 1, z0 + 1, seed), xf - 1.0, zf - 1.0);

    lerp(lerp(g00, g10, u), lerp(g01, g11, u), v)
}

/// Seeded fBm height noise sampler
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightNoise {
    pub seed: u32,
    pub config: HeightNoiseConfig,
}

impl HeightNoise {
    pub fn new(seed: u32, config: HeightNoiseConfig) -> Self {
        Self { seed, config }
    }

    /// Sample normalized fBm at a world XZ position, approximately [-1, 1]
    pub fn sample(&self, x: f32, z: f32) -> f32 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.config.scale;
        let mut max_value = 0.0;

        for octave in 0..self.config.octaves.max(1) {
            let octave_seed = self.seed.wrapping_add(octave as u32 * 7919);
            total += perlin_2d(x * frequency, z * frequency, octave_seed) * amplitude;
            max_value += amplitude;
            amplitude *= self.config.persistence;
            frequency *= self.config.lacunarity;
        }

        (total / max_value).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let noise = HeightNoise::new(42, HeightNoiseConfig::default());
        assert_eq!(noise.sample(3.5, -7.25), noise.sample(3.5, -7.25));
    }

    #[test]
    fn test_range() {
        let noise = HeightNoise::new(12345, HeightNoiseConfig::default());
        for i in -20..20 {
            for j in -20..20 {
                let v = noise.sample(i as f32 * 1.7, j as f32 * 2.3);
                assert!((-1.0..=1.0).contains(&v), "value {} out of range", v);
            }
        }
    }

    #[test]
    fn test_zero_at_lattice_points() {
        // Gradient noise vanishes on integer lattice points
        assert_eq!(perlin_2d(3.0, -4.0, 9), 0.0);
    }

    #[test]
    fn test_different_seeds() {
        let a = HeightNoise::new(1, HeightNoiseConfig::default());
        let b = HeightNoise::new(999, HeightNoiseConfig::default());
        let differs = (0..50).any(|i| {
            let x = i as f32 * 3.3 + 0.4;
            a.sample(x, x * 0.5) != b.sample(x, x * 0.5)
        });
        assert!(differs, "different seeds should produce different terrain");
    }
}
