//! Island configuration and builder
//!
//! All generation parameters live here. The same configuration (including
//! the seed) always produces the same island for the same model pools and
//! feature set.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{IslandError, Result};
use crate::noise::HeightNoiseConfig;

/// Anchor ring and boundary curve parameters
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourConfig {
    /// Distance from the inner anchor ring to the shoreline ring
    pub shoreline_offset: f32,
    /// Lowest allowed shoreline ring height
    pub min_shoreline_height: f32,
    /// Base height of the terrain contour
    pub base_height: f32,
    /// Height noise amplitude applied along the contour
    pub edge_noise_strength: f32,
    /// Anchor count coefficient `k` in `max(3, round(k·R^p))`
    pub anchor_density: f32,
    /// Anchor count exponent `p`
    pub anchor_exponent: f32,
    /// Relative radius noise of the inner ring
    pub irregularity: f32,
    /// Relative noise of the shoreline offset
    pub offset_irregularity: f32,
    /// Number of samples on the terrain contour
    pub resolution: usize,
    /// Half-width of the moving-average window along the contour
    pub smoothing_window: usize,
    /// Vertical scale applied to placed rocks
    pub rock_height_scale: f32,
    /// Inward offset from the terrain contour to the foliage boundary
    pub foliage_band_width: f32,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            shoreline_offset: 5.0,
            min_shoreline_height: 0.4,
            base_height: 2.0,
            edge_noise_strength: 0.8,
            anchor_density: 3.75,
            anchor_exponent: 1.0,
            irregularity: 0.15,
            offset_irregularity: 0.3,
            resolution: 160,
            smoothing_window: 3,
            rock_height_scale: 1.0,
            foliage_band_width: 4.0,
        }
    }
}

/// Radial terrain mesh parameters
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainConfig {
    /// Interior rings between the centre vertex and the contour ring
    pub num_rings: usize,
    /// Height around which interior noise varies
    pub base_height: f32,
    /// Interior height noise amplitude
    pub noise_strength: f32,
    /// Planar UV scale (texture repeats per world unit)
    pub uv_tiling: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            num_rings: 24,
            base_height: 3.0,
            noise_strength: 2.5,
            uv_tiling: 0.25,
        }
    }
}

/// Tuned constants of the depression relaxation stages
///
/// These shape crater walls visually; they carry no correctness meaning.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxationConfig {
    /// Mask dilation passes without / with mud puddles
    pub dilation_passes: usize,
    pub dilation_passes_mud: usize,
    /// Stage 1 Laplacian passes without / with mud puddles
    pub smooth_passes: usize,
    pub smooth_passes_mud: usize,
    pub smooth_strength: f32,
    /// Stage 2 blend towards the analytic crater profile
    pub retarget_strength: f32,
    /// Stage 3 Laplacian passes without / with mud puddles
    pub polish_passes: usize,
    pub polish_passes_mud: usize,
    pub polish_strength: f32,
    /// Soft influence reach as a multiple of the carve radius
    pub soft_reach: f32,
    pub soft_reach_mud: f32,
}

impl Default for RelaxationConfig {
    fn default() -> Self {
        Self {
            dilation_passes: 3,
            dilation_passes_mud: 6,
            smooth_passes: 6,
            smooth_passes_mud: 16,
            smooth_strength: 0.6,
            retarget_strength: 0.85,
            polish_passes: 6,
            polish_passes_mud: 12,
            polish_strength: 0.45,
            soft_reach: 1.5,
            soft_reach_mud: 2.0,
        }
    }
}

/// Vegetation scatter parameters
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoliageConfig {
    /// Instances per 100 square units of usable area
    pub density: f32,
    /// Optional cap on the instance count
    pub max_count: Option<usize>,
    /// Steepest accepted face, in degrees from horizontal
    pub max_slope_degrees: f32,
    /// Base instance scale (jittered by ±20%)
    pub scale: f32,
}

impl Default for FoliageConfig {
    fn default() -> Self {
        Self {
            density: 4.0,
            max_count: None,
            max_slope_degrees: 35.0,
            scale: 1.0,
        }
    }
}

/// Path network parameters
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathConfig {
    /// Target number of path nodes
    pub num_points: usize,
    /// Share (0-100) of cycle-forming edges added back as loops
    pub loop_percentage: f32,
    /// Ribbon width
    pub width: f32,
    /// Distance between raw trace samples
    pub step_length: f32,
    /// Minimum distance between sampled nodes (0 disables)
    pub min_node_spacing: f32,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            num_points: 12,
            loop_percentage: 20.0,
            width: 1.2,
            step_length: 0.5,
            min_node_spacing: 2.0,
        }
    }
}

/// Complete island generation configuration
///
/// # Example
///
/// ```rust
/// use procedural_island::*;
///
/// let config = IslandConfigBuilder::new()
///     .seed(42)
///     .island_radius(20.0).unwrap()
///     .shoreline_offset(5.0).unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(config.shoreline_radius(), 25.0);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct IslandConfig {
    /// Master seed; every stage derives its own stream from it
    pub seed: u32,
    /// Base radius of the inner anchor ring
    pub island_radius: f32,
    pub contour: ContourConfig,
    pub height_noise: HeightNoiseConfig,
    pub terrain: TerrainConfig,
    pub relaxation: RelaxationConfig,
    pub foliage: FoliageConfig,
    pub paths: PathConfig,
}

impl IslandConfig {
    /// Radius of the shoreline anchor ring
    #[inline]
    pub fn shoreline_radius(&self) -> f32 {
        self.island_radius + self.contour.shoreline_offset
    }

    /// Seed for one pipeline stage
    #[inline]
    pub fn stage_seed(&self, stage: u64) -> u64 {
        (self.seed as u64) ^ stage.wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }
}

impl Default for IslandConfig {
    fn default() -> Self {
        IslandConfigBuilder::new()
            .seed(0)
            .build()
            .expect("default configuration is valid")
    }
}

fn check(ok: bool, msg: impl FnOnce() -> String) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(IslandError::InvalidConfig(msg()))
    }
}

/// Builder for [`IslandConfig`] with range validation
#[derive(Debug, Clone)]
pub struct IslandConfigBuilder {
    seed: Option<u32>,
    island_radius: f32,
    contour: ContourConfig,
    height_noise: HeightNoiseConfig,
    terrain: TerrainConfig,
    relaxation: RelaxationConfig,
    foliage: FoliageConfig,
    paths: PathConfig,
}

impl IslandConfigBuilder {
    /// Create a new builder with default values
    ///
    /// Defaults:
    /// - seed: random
    /// - island_radius: 20
    /// - shoreline offset 5, anchor density 3.75 (75 inner / 94 shoreline anchors)
    /// - 24 terrain rings, 160 contour samples
    pub fn new() -> Self {
        Self {
            seed: None,
            island_radius: 20.0,
            contour: ContourConfig::default(),
            height_noise: HeightNoiseConfig::default(),
            terrain: TerrainConfig::default(),
            relaxation: RelaxationConfig::default(),
            foliage: FoliageConfig::default(),
            paths: PathConfig::default(),
        }
    }

    pub fn seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    /// # Errors
    ///
    /// Returns `InvalidConfig` if radius <= 0
    pub fn island_radius(mut self, radius: f32) -> Result<Self> {
        check(radius > 0.0, || format!("island radius must be positive (got {})", radius))?;
        self.island_radius = radius;
        Ok(self)
    }

    pub fn shoreline_offset(mut self, offset: f32) -> Result<Self> {
        check(offset >= 0.0, || format!("shoreline offset must be >= 0 (got {})", offset))?;
        self.contour.shoreline_offset = offset;
        Ok(self)
    }

    pub fn shoreline_height(mut self, height: f32) -> Result<Self> {
        check(height >= 0.0, || format!("shoreline height must be >= 0 (got {})", height))?;
        self.contour.min_shoreline_height = height;
        Ok(self)
    }

    pub fn contour_base_height(mut self, height: f32) -> Self {
        self.contour.base_height = height;
        self
    }

    pub fn noise_strength(mut self, strength: f32) -> Result<Self> {
        check(strength >= 0.0, || format!("noise strength must be >= 0 (got {})", strength))?;
        self.terrain.noise_strength = strength;
        Ok(self)
    }

    pub fn noise_scale(mut self, scale: f32) -> Result<Self> {
        check(scale > 0.0, || format!("noise scale must be positive (got {})", scale))?;
        self.height_noise.scale = scale;
        Ok(self)
    }

    /// Half-width of the contour smoothing window (0 disables smoothing)
    pub fn smoothing_window(mut self, half_width: usize) -> Result<Self> {
        check(half_width <= 64, || format!("smoothing window must be <= 64 (got {})", half_width))?;
        self.contour.smoothing_window = half_width;
        Ok(self)
    }

    pub fn rock_height_scale(mut self, scale: f32) -> Result<Self> {
        check(scale > 0.0, || format!("rock height scale must be positive (got {})", scale))?;
        self.contour.rock_height_scale = scale;
        Ok(self)
    }

    pub fn foliage_band_width(mut self, width: f32) -> Result<Self> {
        check(width >= 0.0, || format!("foliage band width must be >= 0 (got {})", width))?;
        self.contour.foliage_band_width = width;
        Ok(self)
    }

    pub fn foliage_density(mut self, density: f32) -> Result<Self> {
        check(density >= 0.0, || format!("foliage density must be >= 0 (got {})", density))?;
        self.foliage.density = density;
        Ok(self)
    }

    pub fn foliage_max_count(mut self, max_count: Option<usize>) -> Self {
        self.foliage.max_count = max_count;
        self
    }

    pub fn foliage_max_slope(mut self, degrees: f32) -> Result<Self> {
        check((0.0..=90.0).contains(&degrees), || {
            format!("foliage max slope must be within 0..=90 degrees (got {})", degrees)
        })?;
        self.foliage.max_slope_degrees = degrees;
        Ok(self)
    }

    pub fn foliage_scale(mut self, scale: f32) -> Result<Self> {
        check(scale > 0.0, || format!("foliage scale must be positive (got {})", scale))?;
        self.foliage.scale = scale;
        Ok(self)
    }

    pub fn path_point_count(mut self, count: usize) -> Self {
        self.paths.num_points = count;
        self
    }

    pub fn path_loop_percentage(mut self, percentage: f32) -> Result<Self> {
        check((0.0..=100.0).contains(&percentage), || {
            format!("loop percentage must be within 0..=100 (got {})", percentage)
        })?;
        self.paths.loop_percentage = percentage;
        Ok(self)
    }

    pub fn path_width(mut self, width: f32) -> Result<Self> {
        check(width > 0.0, || format!("path width must be positive (got {})", width))?;
        self.paths.width = width;
        Ok(self)
    }

    pub fn contour(mut self, contour: ContourConfig) -> Self {
        self.contour = contour;
        self
    }

    pub fn height_noise(mut self, noise: HeightNoiseConfig) -> Self {
        self.height_noise = noise;
        self
    }

    pub fn terrain(mut self, terrain: TerrainConfig) -> Self {
        self.terrain = terrain;
        self
    }

    pub fn relaxation(mut self, relaxation: RelaxationConfig) -> Self {
        self.relaxation = relaxation;
        self
    }

    pub fn foliage(mut self, foliage: FoliageConfig) -> Self {
        self.foliage = foliage;
        self
    }

    pub fn paths(mut self, paths: PathConfig) -> Self {
        self.paths = paths;
        self
    }

    /// Build the configuration
    ///
    /// Checks cross-field constraints of wholesale-replaced sub-configs. If
    /// no seed was provided, a random one is drawn.
    pub fn build(self) -> Result<IslandConfig> {
        check(self.contour.resolution >= 3, || {
            format!("contour resolution must be >= 3 (got {})", self.contour.resolution)
        })?;
        check(self.terrain.num_rings >= 1, || "terrain needs at least one ring".to_string())?;
        check(self.paths.step_length > 0.0, || {
            format!("path step length must be positive (got {})", self.paths.step_length)
        })?;

        let seed = self.seed.unwrap_or_else(rand::random);

        Ok(IslandConfig {
            seed,
            island_radius: self.island_radius,
            contour: self.contour,
            height_noise: self.height_noise,
            terrain: self.terrain,
            relaxation: self.relaxation,
            foliage: self.foliage,
            paths: self.paths,
        })
    }
}

impl Default for IslandConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = IslandConfigBuilder::new().seed(7).build().unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.island_radius, 20.0);
        assert_eq!(config.contour.shoreline_offset, 5.0);
        assert_eq!(config.shoreline_radius(), 25.0);
        assert_eq!(config.relaxation.retarget_strength, 0.85);
    }

    #[test]
    fn test_builder_custom() {
        let config = IslandConfigBuilder::new()
            .seed(1)
            .island_radius(30.0)
            .unwrap()
            .foliage_max_count(Some(50))
            .path_loop_percentage(0.0)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.island_radius, 30.0);
        assert_eq!(config.foliage.max_count, Some(50));
        assert_eq!(config.paths.loop_percentage, 0.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(IslandConfigBuilder::new().island_radius(0.0).is_err());
        assert!(IslandConfigBuilder::new().shoreline_offset(-1.0).is_err());
        assert!(IslandConfigBuilder::new().foliage_max_slope(91.0).is_err());
        assert!(IslandConfigBuilder::new().path_loop_percentage(101.0).is_err());
        assert!(IslandConfigBuilder::new().path_width(0.0).is_err());
        assert!(IslandConfigBuilder::new().smoothing_window(65).is_err());
    }

    #[test]
    fn test_build_checks_sub_configs() {
        let contour = ContourConfig {
            resolution: 2,
            ..Default::default()
        };
        assert!(IslandConfigBuilder::new().contour(contour).build().is_err());
    }

    #[test]
    fn test_stage_seeds_differ() {
        let config = IslandConfig::default();
        assert_ne!(config.stage_seed(1), config.stage_seed(2));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serialization() {
        let config = IslandConfigBuilder::new().seed(12345).build().unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let restored: IslandConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }
}
