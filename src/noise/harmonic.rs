//! Periodic multi-harmonic noise
//!
//! Produces a closed (wrap-around) sequence of values by summing a few sine
//! harmonics with random phase jitter. Used to perturb the radius of anchor
//! rings and water/mud outlines so the first and last samples blend
//! seamlessly.

use rand::Rng;
use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One sine component: integer-like frequency (cycles per loop) and weight
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Harmonic {
    pub frequency: f32,
    pub amplitude: f32,
}

impl Harmonic {
    pub const fn new(frequency: f32, amplitude: f32) -> Self {
        Self {
            frequency,
            amplitude,
        }
    }
}

/// Four decreasing detail octaves used for island contours
pub const DEFAULT_HARMONICS: [Harmonic; 4] = [
    Harmonic::new(2.0, 1.0),
    Harmonic::new(3.0, 0.5),
    Harmonic::new(5.0, 0.25),
    Harmonic::new(8.0, 0.125),
];

/// Low-frequency lobes for lake outlines
pub const LAKE_HARMONICS: [Harmonic; 3] = [
    Harmonic::new(2.0, 1.0),
    Harmonic::new(3.0, 0.6),
    Harmonic::new(5.0, 0.3),
];

/// Busier rim for mud puddles
pub const MUD_HARMONICS: [Harmonic; 4] = [
    Harmonic::new(3.0, 1.0),
    Harmonic::new(5.0, 0.6),
    Harmonic::new(9.0, 0.35),
    Harmonic::new(17.0, 0.2),
];

/// Generate `count` periodic noise samples
///
/// Each harmonic contributes `amplitude * sin(2π·i/count·frequency + phase + jitter)`
/// where `jitter` is drawn once per harmonic. The sum is divided by the total
/// amplitude, so every sample lies in `[-1, 1]`.
///
/// # Example
///
/// ```
/// use procedural_island::noise::{generate_noise, DEFAULT_HARMONICS};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let mut rng = ChaCha8Rng::seed_from_u64(7);
/// let values = generate_noise(64, 0.0, &DEFAULT_HARMONICS, &mut rng);
/// assert_eq!(values.len(), 64);
/// assert!(values.iter().all(|v| v.abs() <= 1.0 + 1e-5));
/// ```
pub fn generate_noise<R: Rng + ?Sized>(
    count: usize,
    phase_offset: f32,
    harmonics: &[Harmonic],
    rng: &mut R,
) -> Vec<f32> {
    if count == 0 {
        return Vec::new();
    }

    let total_amplitude: f32 = harmonics.iter().map(|h| h.amplitude.abs()).sum();
    if total_amplitude <= f32::EPSILON {
        return vec![0.0; count];
    }

    let jitters: Vec<f32> = harmonics.iter().map(|_| rng.gen_range(0.0..TAU)).collect();

    (0..count)
        .map(|i| {
            let base = TAU * i as f32 / count as f32;
            let sum: f32 = harmonics
                .iter()
                .zip(&jitters)
                .map(|(h, jitter)| h.amplitude * (base * h.frequency + phase_offset + jitter).sin())
                .sum();
            sum / total_amplitude
        })
        .collect()
}
