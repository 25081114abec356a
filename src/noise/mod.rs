//! Noise sources
//!
//! - [`harmonic`]: periodic 1D noise for closed outlines
//! - [`perlin`]: 2D gradient noise for terrain heights

mod harmonic;
mod perlin;

pub use harmonic::{generate_noise, Harmonic, DEFAULT_HARMONICS, LAKE_HARMONICS, MUD_HARMONICS};
pub use perlin::{perlin_2d, HeightNoise, HeightNoiseConfig};
