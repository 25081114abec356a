use glam::{Vec2, Vec3};
use procedural_island::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn equal_rocks(offset: usize) -> Vec<ModelBlueprint> {
    (0..10)
        .map(|i| {
            ModelBlueprint::from_bounds(
                BlueprintId(offset + i),
                format!("rock_{}", offset + i),
                Vec3::new(-1.0, 0.0, -1.0),
                Vec3::new(1.0, 1.5, 1.0),
            )
        })
        .collect()
}

fn pools() -> ModelPools {
    ModelPools::new(equal_rocks(0), equal_rocks(10))
}

fn bushes() -> Vec<ModelBlueprint> {
    vec![ModelBlueprint::from_bounds(BlueprintId(100), "bush", Vec3::splat(-0.5), Vec3::splat(0.5))]
}

fn config(seed: u32) -> IslandConfig {
    IslandConfigBuilder::new()
        .seed(seed)
        .island_radius(20.0)
        .unwrap()
        .shoreline_offset(5.0)
        .unwrap()
        .build()
        .unwrap()
}

/// Surface positions as they were before carving
fn pre_carve_surface(config: &IslandConfig, island: &Island) -> MeshData {
    TerrainMeshBuilder::new(config, island.contour()).build_surface()
}

#[test]
fn test_anchor_counts() {
    let config = config(1);
    let island = Island::generate(&config, &pools(), &bushes(), &mut FeatureSet::new());

    assert_eq!(island.contour().inner_anchors.len(), 75);
    assert_eq!(island.contour().outer_anchors.len(), 94);
}

#[test]
fn test_every_triangle_in_exactly_one_group() {
    let config = config(2);
    let mut features = FeatureSet::new();
    features.add_mud_puddle(2.0, 0.3).unwrap();
    let island = Island::generate(&config, &pools(), &bushes(), &mut features);

    let mesh = island.mesh();
    let mut covered = vec![0u32; mesh.triangle_count()];
    for group in &mesh.groups {
        for t in group.start..group.start + group.count {
            covered[t] += 1;
        }
    }
    assert!(covered.iter().all(|&c| c == 1));
    assert!(mesh.group_triangle_count(MaterialRole::Skirt) > 0);
    assert!(mesh.group_triangle_count(MaterialRole::Mud) > 0);
    assert_eq!(mesh.normals.len(), mesh.vertex_count());
    assert_eq!(mesh.tangents.len(), mesh.vertex_count());
}

#[test]
fn test_lake_lowers_terrain_and_sets_water_level() {
    let config = config(3);
    let mut features = FeatureSet::new();
    let lake = features.add_lake(3.0, 1.0).unwrap();
    let island = Island::generate(&config, &pools(), &bushes(), &mut features);

    let lake = features.get(lake).unwrap();
    assert_eq!(lake.state().name(), FeatureStateName::Contoured);
    let rim = lake.rim_height().unwrap();
    assert!((lake.water_level().unwrap() - (rim - 0.2)).abs() < 1e-6);

    let pre = pre_carve_surface(&config, &island);
    let mut lowered = 0;
    for (i, before) in pre.positions.iter().enumerate() {
        let after = island.mesh().positions[i];
        assert_eq!([after[0], after[2]], [before[0], before[2]]);
        assert!(after[1] <= before[1] + 1e-6);
        if lake.influence_at(Vec2::new(before[0], before[2])) > 0.0 && after[1] < before[1] {
            lowered += 1;
        }
    }
    assert!(lowered > 0);
    assert!(island.carving.carved > 0);
}

#[test]
fn test_relaxation_leaves_unreached_vertices_alone() {
    let config = config(4);
    let mut features = FeatureSet::new();
    features.add_lake(2.5, 1.2).unwrap();
    features.add_mud_puddle(1.5, 0.4).unwrap();
    let island = Island::generate(&config, &pools(), &bushes(), &mut features);
    let pre = pre_carve_surface(&config, &island);

    for (i, before) in pre.positions.iter().enumerate() {
        let q = Vec2::new(before[0], before[2]);
        let reached = features.iter().any(|f| {
            let reach = match f.kind() {
                FeatureKind::Lake => config.relaxation.soft_reach,
                FeatureKind::MudPuddle => config.relaxation.soft_reach_mud,
            };
            f.soft_influence_at(q, reach) > 0.0
        });
        if !reached {
            assert_eq!(island.mesh().positions[i], *before);
        }
    }
}

#[test]
fn test_invalidation_keeps_centres() {
    let mut features = FeatureSet::new();
    let lake = features.add_lake(3.0, 1.0).unwrap();
    Island::generate(&config(5), &pools(), &bushes(), &mut features);
    let centre = features.get(lake).unwrap().center().unwrap();

    features.invalidate_outlines();
    assert_eq!(features.get(lake).unwrap().state().name(), FeatureStateName::Centered);

    Island::generate(&config(6), &pools(), &bushes(), &mut features);
    let lake = features.get(lake).unwrap();
    assert_eq!(lake.center(), Some(centre));
    assert!(lake.outline().is_some());
}

#[test]
fn test_foliage_cap_and_band() {
    let config = IslandConfigBuilder::new()
        .seed(7)
        .foliage_density(20.0)
        .unwrap()
        .foliage_max_count(Some(15))
        .build()
        .unwrap();
    let island = Island::generate(&config, &pools(), &bushes(), &mut FeatureSet::new());

    let instances = &island.foliage.instances;
    assert!(instances.len() <= 15);
    assert_eq!(island.foliage.report.placed, instances.len());

    let mesh = island.mesh();
    let contour = &island.contour().terrain_contour;
    let inner = &island.contour().foliage_boundary;
    for instance in instances {
        let tri = &mesh.indices[instance.triangle * 3..instance.triangle * 3 + 3];
        let centroid = tri.iter().map(|&i| mesh.position(i)).sum::<Vec3>() / 3.0;
        assert!(contour.contains_xz(centroid.x, centroid.z));
        assert!(!inner.contains_xz(centroid.x, centroid.z));
    }
}

#[test]
fn test_pure_spanning_tree_connects_all_nodes() {
    let config = IslandConfigBuilder::new()
        .seed(8)
        .path_point_count(10)
        .path_loop_percentage(0.0)
        .unwrap()
        .build()
        .unwrap();
    let island = Island::generate(&config, &pools(), &bushes(), &mut FeatureSet::new());

    let paths = &island.paths;
    assert!(paths.nodes.len() >= 3);
    let mut uf = UnionFind::new(paths.nodes.len());
    for edge in &paths.edges {
        uf.union(edge.a, edge.b);
    }
    assert_eq!(uf.component_count(), 1);
    assert_eq!(paths.edges.len(), paths.nodes.len() - 1);
}

#[test]
fn test_right_triangle_paths_on_terrain() {
    let config = IslandConfigBuilder::new()
        .seed(9)
        .path_loop_percentage(0.0)
        .unwrap()
        .build()
        .unwrap();
    let island = Island::generate(&config, &pools(), &bushes(), &mut FeatureSet::new());
    let terrain = &island.terrain;

    let origin = island.contour().centroid.round();
    let nodes: Vec<Vec3> = [origin, origin + Vec2::new(4.0, 0.0), origin + Vec2::new(0.0, 5.0)]
        .iter()
        .map(|p| terrain.cast_down(p.x, p.y).unwrap().point)
        .collect();

    let builder = PathNetworkBuilder::new(
        &config.paths,
        terrain,
        &terrain.contour.foliage_boundary,
        Vec::new(),
    );
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let network = builder.build_from_nodes(nodes, &mut rng, &mut Diagnostics::new());

    assert_eq!(network.edges.len(), 2);
    assert_eq!(network.ribbons.len(), 2);
    for ribbon in &network.ribbons {
        let length = ribbon.edge.weight.sqrt();
        let raw = (length / config.paths.step_length).ceil() as usize + 1;
        assert_eq!(ribbon.points.len(), 2 * raw);
        assert_eq!(ribbon.mesh.vertex_count(), 2 * ribbon.points.len());
    }
}

#[test]
fn test_generation_is_deterministic() {
    let config = config(10);
    let mut a_features = FeatureSet::new();
    a_features.add_lake(2.0, 1.0).unwrap();
    let mut b_features = a_features.clone();

    let a = Island::generate(&config, &pools(), &bushes(), &mut a_features);
    let b = Island::generate(&config, &pools(), &bushes(), &mut b_features);

    assert_eq!(a.mesh().positions, b.mesh().positions);
    assert_eq!(a.mesh().indices, b.mesh().indices);
    assert_eq!(a.foliage.instances, b.foliage.instances);
    assert_eq!(a_features, b_features);
}

#[test]
fn test_missing_models_reported_not_fatal() {
    let config = config(11);
    let island = Island::generate(&config, &ModelPools::default(), &[], &mut FeatureSet::new());

    assert!(island.diagnostics.has_kind(DiagnosticKind::InsufficientInput));
    assert!(island.foliage.instances.is_empty());
    assert!(island.mesh().triangle_count() > 0);
}

#[test]
fn test_collapsed_contour_skips_later_stages() {
    let config = IslandConfigBuilder::new()
        .seed(12)
        .island_radius(1e-6)
        .unwrap()
        .build()
        .unwrap();
    let mut features = FeatureSet::new();
    let lake = features.add_lake(3.0, 1.0).unwrap();
    let island = Island::generate(&config, &pools(), &bushes(), &mut features);

    assert!(island.contour().is_degenerate());
    assert!(island.mesh().is_empty());
    assert!(island.foliage.instances.is_empty());
    assert!(island.paths.nodes.is_empty());
    assert!(island.diagnostics.has_kind(DiagnosticKind::InsufficientInput));
    assert_eq!(features.get(lake).unwrap().state().name(), FeatureStateName::Requested);
    assert_eq!(island.terrain.height_at(0.0, 0.0), None);
}
