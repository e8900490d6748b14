//! Octree Query Demo
//!
//! Scatters a forest of trees over a large world and walks a player through
//! it, asking the octree for nearby trees along the way:
//! - radius and k-nearest searches around the player
//! - the same queries answered by a linear scan, for timing and cross-checks
//! - trees being felled (destroyed) and replanted (moved)
//!
//! Usage: `octree_demo [config.toml|config.ron] [tree count]`

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sparse_octree::prelude::*;

// World settings
const WORLD_EXTENT: f32 = 4_000.0;
const DEFAULT_TREE_COUNT: usize = 50_000;

// Player settings
const WALK_STEPS: usize = 200;
const STEP_LENGTH: f32 = 40.0;
const VIEW_RADIUS: f32 = 150.0;
const NEAREST_COUNT: usize = 8;

/// A tree in the forest
#[derive(Debug, Clone, PartialEq)]
struct Tree {
    id: usize,
    height: f32,
}

/// Accumulated timings for one index
#[derive(Debug, Default)]
struct QueryTimings {
    radius: Duration,
    nearest: Duration,
    found: usize,
}

fn load_config(path: Option<&str>) -> Result<OctreeConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            log::info!("Loading octree configuration from {path}");
            Ok(OctreeConfig::load_from_file(path)?)
        }
        None => Ok(OctreeConfig::default()),
    }
}

fn random_position(rng: &mut StdRng) -> Vec3 {
    Vec3::new(
        rng.gen_range(-WORLD_EXTENT..WORLD_EXTENT),
        rng.gen_range(-20.0..20.0),
        rng.gen_range(-WORLD_EXTENT..WORLD_EXTENT),
    )
}

fn plant_forest<Q: SpatialQuery<Tree>>(
    index: &mut Q,
    count: usize,
    seed: u64,
) -> Result<Vec<NodeHandle>, OctreeError> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|id| {
            let tree = Tree {
                id,
                height: rng.gen_range(2.0..30.0),
            };
            index.insert(random_position(&mut rng), tree)
        })
        .collect()
}

fn walk<Q: SpatialQuery<Tree>>(index: &Q, path: &[Vec3]) -> Result<QueryTimings, OctreeError> {
    let mut timings = QueryTimings::default();
    for &position in path {
        let start = Instant::now();
        let visible = index.query_sphere(position, VIEW_RADIUS)?;
        timings.radius += start.elapsed();
        timings.found += visible.len();

        let start = Instant::now();
        let nearest = index.query_nearest(position, NEAREST_COUNT, VIEW_RADIUS)?;
        timings.nearest += start.elapsed();

        let farthest = nearest.last().map_or(0.0, |(_, squared)| squared.sqrt());
        log::trace!(
            "At {:?}: {} trees in view, nearest {} within {farthest:.1}",
            position.as_slice(),
            visible.len(),
            nearest.len()
        );
    }
    Ok(timings)
}

fn player_path(seed: u64) -> Vec<Vec3> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut position = Vec3::zeros();
    (0..WALK_STEPS)
        .map(|_| {
            let heading: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
            position += Vec3::new(heading.cos(), 0.0, heading.sin()) * STEP_LENGTH;
            position
        })
        .collect()
}

fn run(config: OctreeConfig, tree_count: usize) -> Result<(), Box<dyn std::error::Error>> {
    let mut octree = Octree::with_config(config)?;
    let mut linear = LinearScan::new();

    let start = Instant::now();
    let handles = plant_forest(&mut octree, tree_count, 1)?;
    log::info!(
        "Planted {} trees in {:.2?}: {} roots, {} regions",
        octree.len(),
        start.elapsed(),
        octree.root_count(),
        octree.region_count()
    );
    plant_forest(&mut linear, tree_count, 1)?;

    let path = player_path(2);
    let octree_timings = walk(&octree, &path)?;
    let linear_timings = walk(&linear, &path)?;
    log::info!(
        "Octree: radius {:.2?}, nearest {:.2?} over {} steps",
        octree_timings.radius,
        octree_timings.nearest,
        path.len()
    );
    log::info!(
        "Linear scan: radius {:.2?}, nearest {:.2?} over {} steps",
        linear_timings.radius,
        linear_timings.nearest,
        path.len()
    );
    if octree_timings.found != linear_timings.found {
        return Err(format!(
            "octree saw {} trees along the path, linear scan saw {}",
            octree_timings.found, linear_timings.found
        )
        .into());
    }

    // Fell the trees closest to the start and replant a few others far away
    let mut rng = StdRng::seed_from_u64(3);
    let felled: Vec<NodeHandle> = octree
        .k_nearest_neighbors_search(Vec3::zeros(), 100, VIEW_RADIUS * 4.0)?
        .handles();
    let mut timber = 0.0;
    for handle in &felled {
        timber += octree.destroy(*handle)?.height;
    }
    log::info!("Felled {} trees ({timber:.0} m of timber)", felled.len());

    let mut replanted = 0;
    for &handle in handles.iter().step_by(97) {
        if let Ok(mut node) = octree.node_mut(handle) {
            node.set_position(random_position(&mut rng) * 2.0)?;
            replanted += 1;
        }
    }
    log::info!(
        "Replanted {replanted} trees: {} roots, {} regions",
        octree.root_count(),
        octree.region_count()
    );

    if let Some(&first) = handles.iter().find(|&&handle| octree.contains(handle)) {
        let node = octree.node(first)?;
        let neighbours = node.k_nearest_neighbors_search(NEAREST_COUNT, VIEW_RADIUS)?;
        log::info!(
            "Tree #{} has {} neighbours within {VIEW_RADIUS} (itself included)",
            node.object().id,
            neighbours.len()
        );
    }

    let start = Instant::now();
    let all = octree.get_all_nodes().len();
    log::info!("Listed {all} trees in {:.2?}", start.elapsed());

    octree.clear_all_nodes();
    log::info!("Cleared: {} trees, {} regions", octree.len(), octree.region_count());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config(args.first().map(String::as_str))?;
    let tree_count = match args.get(1) {
        Some(count) => count.parse()?,
        None => DEFAULT_TREE_COUNT,
    };

    println!("=== Octree Query Demo ===");
    println!("  Root size: {}", config.root_size);
    println!("  Max depth: {}", config.max_depth);
    println!("  Trees:     {tree_count}");
    println!();

    run(config, tree_count)
}
