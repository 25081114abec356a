//! Procedural island generation
//!
//! Turns a handful of numeric parameters and a pool of rock/vegetation
//! models into a closed island: a grouped terrain mesh, boundary curves,
//! carved lakes and mud puddles, scattered foliage and a path network.
//! Output is engine-agnostic vertex/index data (Bevy, Godot, wgpu, ...).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use procedural_island::*;
//! use glam::Vec3;
//!
//! let config = IslandConfigBuilder::new()
//!     .seed(42)
//!     .island_radius(20.0).unwrap()
//!     .shoreline_offset(5.0).unwrap()
//!     .build().unwrap();
//!
//! // Caller-loaded models, split into small and large rocks by volume
//! let rocks: Vec<ModelBlueprint> = (0..10)
//!     .map(|i| ModelBlueprint::from_bounds(BlueprintId(i), "rock", Vec3::ZERO, Vec3::splat(1.0 + i as f32 * 0.2)))
//!     .collect();
//! let pools = ModelPools::partition(rocks, ModelPools::DEFAULT_SMALL_PERCENTILE);
//! let bushes = vec![ModelBlueprint::from_bounds(BlueprintId(100), "bush", Vec3::ZERO, Vec3::ONE)];
//!
//! let mut features = FeatureSet::new();
//! features.add_lake(3.0, 1.0).unwrap();
//!
//! let island = Island::generate(&config, &pools, &bushes, &mut features);
//! println!("{} triangles, {} bushes", island.mesh().triangle_count(), island.foliage.instances.len());
//! print!("{}", island.diagnostics);
//! ```
//!
//! # Pipeline
//!
//! 1. [`ContourBuilder`]: anchor rocks, terrain contour, shoreline, foliage boundary
//! 2. [`TerrainMeshBuilder`]: radial surface and skirt
//! 3. [`place_features`] / [`resolve_outlines`]: lake and mud puddle placement
//! 4. [`DepressionCarver`]: carving plus masked relaxation
//! 5. [`FoliageScatter`] and [`PathNetworkBuilder`] on the finished terrain
//!
//! # Features
//!
//! - `spatial-index` (default): KD-tree backed [`SpacingIndex`] via kiddo
//! - `serde`: Serialization of configuration, feature records and instances

// Modules
pub mod assets;
pub mod config;
pub mod contour;
pub mod diagnostics;
pub mod error;
pub mod features;
pub mod foliage;
pub mod geometry;
pub mod island;
pub mod mesh;
pub mod noise;
pub mod paths;
pub mod raycast;
pub mod spatial;
pub mod terrain;
pub mod union_find;

// Re-export core types for convenience
pub use assets::{BlueprintId, Bounds, InstanceTransform, ModelBlueprint, ModelPools};
pub use config::{
    ContourConfig, FoliageConfig, IslandConfig, IslandConfigBuilder, PathConfig, RelaxationConfig, TerrainConfig,
};
pub use contour::{anchor_count, Anchor, BoundaryCurve, ContourBuilder, ContourResult};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Stage};
pub use error::{IslandError, Result};
pub use features::{
    place_features, resolve_outlines, CarveReport, DepressionCarver, FeatureKind, FeatureOutline, FeatureSet,
    FeatureState, FeatureStateName, WaterFeature,
};
pub use foliage::{FoliageInstance, FoliageResult, FoliageScatter, ScatterReport};
pub use island::Island;
pub use mesh::{MaterialRole, MeshData, MeshGroup};
pub use noise::{generate_noise, Harmonic, HeightNoise, HeightNoiseConfig};
pub use paths::{EdgeKind, PathEdge, PathNetwork, PathNetworkBuilder, PathRibbon};
pub use raycast::{SurfaceHit, SurfaceQuery, SurfaceRaycaster};
pub use spatial::SpacingIndex;
pub use terrain::{HeightProfile, InteriorHeight, RingLayout, TerrainMeshBuilder, TerrainResult};
pub use union_find::UnionFind;

// Re-export glam types used throughout the API
pub use glam::{Quat, Vec2, Vec3};
