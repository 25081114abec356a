//! Complete workflow demonstration for procedural_island
//!
//! Run with `RUST_LOG=debug` to see per-stage progress.

use glam::Vec3;
use procedural_island::*;

fn rock(id: usize, size: f32) -> ModelBlueprint {
    ModelBlueprint::from_bounds(
        BlueprintId(id),
        format!("rock_{}", id),
        Vec3::new(-size, 0.0, -size),
        Vec3::new(size, size * 1.5, size),
    )
}

fn main() -> Result<()> {
    env_logger::init();
    println!("=== procedural_island Demo ===\n");

    // Step 1: Configure island
    println!("Step 1: Configuring island...");
    let config = IslandConfigBuilder::new()
        .seed(12345)
        .island_radius(20.0)?
        .shoreline_offset(5.0)?
        .foliage_density(6.0)?
        .path_point_count(10)
        .path_loop_percentage(25.0)?
        .build()?;
    println!("  Seed: {}", config.seed);
    println!("  Radius: {} (shoreline {})", config.island_radius, config.shoreline_radius());

    // Step 2: Models, normally loaded by the caller
    let rocks: Vec<ModelBlueprint> = (0..20).map(|i| rock(i, 0.5 + i as f32 * 0.1)).collect();
    let pools = ModelPools::partition(rocks, ModelPools::DEFAULT_SMALL_PERCENTILE);
    let bushes: Vec<ModelBlueprint> = (0..3)
        .map(|i| ModelBlueprint::from_bounds(BlueprintId(100 + i), "bush", Vec3::splat(-0.5), Vec3::splat(0.5)))
        .collect();
    println!("\nStep 2: {} small / {} large rock models", pools.small.len(), pools.large.len());

    // Step 3: Features
    let mut features = FeatureSet::new();
    let lake = features.add_lake(3.0, 1.0)?;
    features.add_mud_puddle(1.5, 0.3)?;

    // Step 4: Generate
    println!("\nStep 3: Generating island...");
    let island = Island::generate(&config, &pools, &bushes, &mut features);
    let mesh = island.mesh();
    println!("  Vertices: {}", mesh.vertex_count());
    println!("  Triangles: {}", mesh.triangle_count());
    for role in [MaterialRole::Grass, MaterialRole::Mud, MaterialRole::Skirt] {
        println!("    {:?}: {}", role, mesh.group_triangle_count(role));
    }
    println!(
        "  Anchors: {} inner, {} shoreline",
        island.contour().inner_anchors.len(),
        island.contour().outer_anchors.len()
    );

    if let Ok(lake) = features.get(lake) {
        match (lake.rim_height(), lake.water_level()) {
            (Some(rim), Some(water)) => println!("  Lake rim {:.2}, water level {:.2}", rim, water),
            _ => println!("  Lake could not be placed"),
        }
    }

    println!("\nStep 4: Foliage");
    print!("{}", island.foliage.report);

    println!("\nStep 5: Paths");
    println!(
        "  {} nodes, {} spanning + {} loop edges, {} ribbons",
        island.paths.nodes.len(),
        island.paths.spanning_edges().count(),
        island.paths.loop_edges().count(),
        island.paths.ribbons.len()
    );

    if !island.diagnostics.is_empty() {
        println!("\nDiagnostics:");
        print!("{}", island.diagnostics);
    }

    // Probe the finished surface
    let centre = island.contour().centroid;
    if let Some(h) = island.terrain.height_at(centre.x, centre.y) {
        println!("\nHeight at centre: {:.2}", h);
    }

    println!("\n=== Demo Complete ===");
    Ok(())
}
