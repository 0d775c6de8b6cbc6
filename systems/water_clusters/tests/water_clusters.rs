use gated_caves_core::{Grid, Position};
use gated_caves_system_cave_generation::wall_neighbor_count;
use gated_caves_system_water_clusters::{
    cluster_step, seed, water_neighbor_count, WaterClusterGenerator, WaterConfig,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn open_cave(size: u32) -> Grid<bool> {
    Grid::filled(size, size, false)
}

#[test]
fn walls_never_receive_water_seeds() {
    let cave = Grid::from_fn(8, 8, |position| position.x() % 2 == 0);
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    let water = seed(&cave, 1.0, &mut rng);

    for (position, &wet) in water.iter() {
        let wall = cave.value(position).expect("aligned");
        assert_eq!(wet, !wall, "cell {position:?}");
    }
}

#[test]
fn zero_seed_probability_leaves_the_cave_dry() {
    let cave = open_cave(10);
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    let water = seed(&cave, 0.0, &mut rng);

    assert_eq!(water.count(|wet| *wet), 0);
}

#[test]
fn isolated_water_dries_out() {
    let cave = open_cave(5);
    let mut water = Grid::filled(5, 5, false);
    assert!(water.set(Position::new(2, 2), true));

    let next = cluster_step(&cave, &water).expect("aligned");

    assert_eq!(next.count(|wet| *wet), 0);
}

#[test]
fn water_with_two_or_three_neighbors_keeps_its_state() {
    let cave = open_cave(5);
    let block = Grid::from_fn(5, 5, |p| (1..3).contains(&p.x()) && (1..3).contains(&p.y()));

    let next = cluster_step(&cave, &block).expect("aligned");

    assert_eq!(next, block);
}

#[test]
fn surrounded_floor_floods() {
    let cave = open_cave(3);
    let ring = Grid::from_fn(3, 3, |p| p != Position::new(1, 1));

    let next = cluster_step(&cave, &ring).expect("aligned");

    assert_eq!(next.value(Position::new(1, 1)), Some(true));
}

#[test]
fn walls_are_forced_dry_during_clustering() {
    let mut cave = open_cave(3);
    assert!(cave.set(Position::new(1, 1), true));
    let soaked = Grid::filled(3, 3, true);

    let next = cluster_step(&cave, &soaked).expect("aligned");

    assert_eq!(next.value(Position::new(1, 1)), Some(false));
    assert_eq!(next.value(Position::new(0, 0)), Some(true));
}

#[test]
fn edge_policy_differs_from_cave_smoothing() {
    let saturated = Grid::filled(3, 3, true);
    let corner = Position::new(0, 0);
    let edge = Position::new(1, 0);

    assert_eq!(wall_neighbor_count(&saturated, corner), 8);
    assert_eq!(water_neighbor_count(&saturated, corner), 3);
    assert_ne!(
        wall_neighbor_count(&saturated, edge),
        water_neighbor_count(&saturated, edge)
    );
    assert_eq!(
        wall_neighbor_count(&saturated, Position::new(1, 1)),
        water_neighbor_count(&saturated, Position::new(1, 1)),
        "interior cells see no difference",
    );
}

#[test]
fn generation_is_reproducible_and_aligned() {
    let config = WaterConfig::new(0.15, 3).expect("valid config");
    let generator = WaterClusterGenerator::new(config);
    let cave = Grid::from_fn(40, 30, |p| (p.x() * 7 + p.y() * 3) % 11 == 0);

    let first = generator.generate(cave.clone(), &mut ChaCha8Rng::seed_from_u64(100));
    let second = generator.generate(cave.clone(), &mut ChaCha8Rng::seed_from_u64(100));

    assert_eq!(first, second);
    assert_eq!(first.dimensions(), cave.dimensions());
    for (position, &wet) in first.iter() {
        if wet {
            assert_eq!(
                cave.value(position),
                Some(false),
                "water on wall at {position:?}"
            );
        }
    }
}

#[test]
fn stepping_matches_full_generation() {
    let config = WaterConfig::new(0.3, 4).expect("valid config");
    let generator = WaterClusterGenerator::new(config);
    let cave = open_cave(20);

    let full = generator.generate(cave.clone(), &mut ChaCha8Rng::seed_from_u64(8));

    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let mut simulation = generator.begin(cave.clone(), &mut rng);
    for step in 1..=4 {
        assert!(!simulation.is_complete(&config));
        let overlay = simulation.step().clone();
        assert_eq!(simulation.steps_run(), step);
        assert_eq!(simulation.water(), &overlay);
    }
    assert!(simulation.is_complete(&config));
    assert_eq!(simulation.cave(), &cave);

    let (returned_cave, water) = simulation.into_parts();
    assert_eq!(returned_cave, cave);
    assert_eq!(water, full);
}
