//! Island generation pipeline
//!
//! Runs every stage in order on the calling thread:
//! contour → terrain surface → feature placement and outlines → carving and
//! relaxation → grouping and shading → foliage and paths.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::assets::{ModelBlueprint, ModelPools};
use crate::config::IslandConfig;
use crate::contour::{ContourBuilder, ContourResult};
use crate::diagnostics::Diagnostics;
use crate::features::{place_features, resolve_outlines, CarveReport, DepressionCarver, FeatureSet, FEATURES_STAGE};
use crate::foliage::{FoliageResult, FoliageScatter, FOLIAGE_STAGE};
use crate::mesh::MeshData;
use crate::paths::{PathNetwork, PathNetworkBuilder, PATHS_STAGE};
use crate::terrain::{TerrainMeshBuilder, TerrainResult};

/// A fully generated island
pub struct Island {
    pub terrain: TerrainResult,
    pub foliage: FoliageResult,
    pub paths: PathNetwork,
    pub carving: CarveReport,
    /// Local failures collected across all stages
    pub diagnostics: Diagnostics,
}

impl Island {
    /// Generate an island
    ///
    /// Requested features are placed inside the foliage boundary and get
    /// their outlines resolved against the new terrain; features that already
    /// have an outline keep it. Call [`FeatureSet::invalidate_outlines`]
    /// after changing terrain parameters so rim heights are recomputed.
    ///
    /// # Arguments
    ///
    /// * `config` - Generation parameters
    /// * `pools` - Rock models for the inner (large) and shoreline (small) rings
    /// * `foliage_pool` - Vegetation models
    /// * `features` - Lakes and mud puddles, updated in place
    ///
    /// Failures are local and end up in [`Island::diagnostics`]. A terrain
    /// contour that collapses below 3 points skips every later stage and
    /// yields an island with an empty mesh.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use procedural_island::*;
    /// use glam::Vec3;
    ///
    /// let config = IslandConfigBuilder::new().seed(7).build().unwrap();
    /// let rocks: Vec<ModelBlueprint> = (0..6)
    ///     .map(|i| ModelBlueprint::from_bounds(BlueprintId(i), "rock", Vec3::ZERO, Vec3::splat(1.0 + i as f32)))
    ///     .collect();
    /// let pools = ModelPools::partition(rocks, ModelPools::DEFAULT_SMALL_PERCENTILE);
    ///
    /// let mut features = FeatureSet::new();
    /// features.add_lake(3.0, 1.0).unwrap();
    ///
    /// let island = Island::generate(&config, &pools, &[], &mut features);
    /// println!("{} triangles", island.mesh().triangle_count());
    /// ```
    pub fn generate(
        config: &IslandConfig,
        pools: &ModelPools,
        foliage_pool: &[ModelBlueprint],
        features: &mut FeatureSet,
    ) -> Self {
        let mut diagnostics = Diagnostics::new();

        let contour = ContourBuilder::new(config, pools).build(&mut diagnostics);
        let builder = TerrainMeshBuilder::new(config, &contour);
        if contour.is_degenerate() {
            let terrain = TerrainResult::new(
                MeshData::default(),
                contour.clone(),
                builder.profile().clone(),
                builder.layout(),
            );
            return Self {
                terrain,
                foliage: FoliageResult::default(),
                paths: PathNetwork::default(),
                carving: CarveReport::default(),
                diagnostics,
            };
        }
        let mut surface = builder.build_surface();
        log::debug!(
            "terrain: {} surface vertices, {} triangles",
            surface.vertex_count(),
            surface.triangle_count()
        );

        let mut rng = ChaCha8Rng::seed_from_u64(config.stage_seed(FEATURES_STAGE));
        place_features(features, &contour.foliage_boundary, &mut rng, &mut diagnostics);
        resolve_outlines(features, builder.profile(), &mut rng);

        let carving = DepressionCarver::new(&config.relaxation, features).carve(&mut surface, &mut diagnostics);
        let mesh = builder.finish(surface, &carving.mud_influence, builder.build_skirt());
        let profile = builder.profile().clone();
        let layout = builder.layout();

        let terrain = TerrainResult::new(mesh, contour, profile, layout);

        let mut rng = ChaCha8Rng::seed_from_u64(config.stage_seed(FOLIAGE_STAGE));
        let foliage = FoliageScatter::new(&config.foliage, foliage_pool).scatter(&terrain, &mut rng, &mut diagnostics);

        let mut rng = ChaCha8Rng::seed_from_u64(config.stage_seed(PATHS_STAGE));
        let paths = PathNetworkBuilder::new(
            &config.paths,
            &terrain,
            &terrain.contour.foliage_boundary,
            features.lake_outlines(),
        )
        .build(&mut rng, &mut diagnostics);

        log::info!(
            "island: {} triangles, {} foliage instances, {} path ribbons, {} diagnostics",
            terrain.mesh.triangle_count(),
            foliage.instances.len(),
            paths.ribbons.len(),
            diagnostics.len()
        );

        Self {
            terrain,
            foliage,
            paths,
            carving,
            diagnostics,
        }
    }

    #[inline]
    pub fn mesh(&self) -> &MeshData {
        &self.terrain.mesh
    }

    #[inline]
    pub fn contour(&self) -> &ContourResult {
        &self.terrain.contour
    }
}
