#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Water overlay generator that grows clustered pools on cave floor.
//!
//! Water is seeded on floor cells at random and then clustered with a
//! majority-style automaton. Unlike the cave pass, neighbours outside the grid
//! are ignored rather than counted, so pools do not cling to the map border.

use gated_caves_core::{ensure_positive, ensure_probability, ConfigError, Grid, Position};
use log::debug;
use rand::Rng;

/// Water neighbour count at or above which a cell floods.
const FLOOD_THRESHOLD: u8 = 4;
/// Water neighbour count at or below which a cell dries out.
const DRY_THRESHOLD: u8 = 1;

/// Validated parameters of the water pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaterConfig {
    seed_probability: f64,
    simulation_steps: u32,
}

impl WaterConfig {
    /// Creates a configuration from the seed chance and number of clustering steps.
    pub fn new(seed_probability: f64, simulation_steps: u32) -> Result<Self, ConfigError> {
        Ok(Self {
            seed_probability: ensure_probability("water_seed_probability", seed_probability)?,
            simulation_steps: ensure_positive("water_steps", simulation_steps)?,
        })
    }
}

/// Produces water overlays aligned with a finished cave grid.
#[derive(Clone, Copy, Debug)]
pub struct WaterClusterGenerator {
    config: WaterConfig,
}

impl WaterClusterGenerator {
    /// Creates a generator using the provided configuration.
    #[must_use]
    pub const fn new(config: WaterConfig) -> Self {
        Self { config }
    }

    /// Seeds water on `cave` and returns a simulation ready to be stepped.
    pub fn begin<R>(&self, cave: Grid<bool>, rng: &mut R) -> WaterSimulation
    where
        R: Rng + ?Sized,
    {
        let water = seed(&cave, self.config.seed_probability, rng);
        debug!("seeded {} water cells", water.count(|wet| *wet));
        WaterSimulation {
            cave,
            water,
            steps_run: 0,
        }
    }

    /// Seeds water and runs every configured clustering step.
    ///
    /// The returned grid has the cave's dimensions; `true` marks water.
    pub fn generate<R>(&self, cave: Grid<bool>, rng: &mut R) -> Grid<bool>
    where
        R: Rng + ?Sized,
    {
        let mut simulation = self.begin(cave, rng);
        while !simulation.is_complete(&self.config) {
            let _ = simulation.step();
        }
        simulation.into_parts().1
    }
}

/// In-progress water pass that owns the cave it floods.
#[derive(Clone, Debug)]
pub struct WaterSimulation {
    cave: Grid<bool>,
    water: Grid<bool>,
    steps_run: u32,
}

impl WaterSimulation {
    /// Runs one clustering step and returns the new overlay.
    pub fn step(&mut self) -> &Grid<bool> {
        self.water = cluster(&self.cave, &self.water);
        self.steps_run = self.steps_run.saturating_add(1);
        debug!(
            "water clustering step {} left {} water cells",
            self.steps_run,
            self.water.count(|wet| *wet)
        );
        &self.water
    }

    /// Cave the water is confined to. `true` marks a wall.
    #[must_use]
    pub fn cave(&self) -> &Grid<bool> {
        &self.cave
    }

    /// Current overlay. `true` marks water.
    #[must_use]
    pub fn water(&self) -> &Grid<bool> {
        &self.water
    }

    /// Number of clustering steps applied so far.
    #[must_use]
    pub const fn steps_run(&self) -> u32 {
        self.steps_run
    }

    /// Reports whether every step `config` asks for has run.
    #[must_use]
    pub const fn is_complete(&self, config: &WaterConfig) -> bool {
        self.steps_run >= config.simulation_steps
    }

    /// Ends the simulation, yielding the cave and its overlay.
    #[must_use]
    pub fn into_parts(self) -> (Grid<bool>, Grid<bool>) {
        (self.cave, self.water)
    }
}

/// Marks each floor cell of `cave` as water with probability `probability`.
///
/// Wall cells never receive water.
pub fn seed<R>(cave: &Grid<bool>, probability: f64, rng: &mut R) -> Grid<bool>
where
    R: Rng + ?Sized,
{
    cave.map(|_, &wall| !wall && rng.gen::<f64>() < probability)
}

/// Runs one clustering step, rejecting overlays that do not align with the cave.
pub fn cluster_step(cave: &Grid<bool>, water: &Grid<bool>) -> Result<Grid<bool>, ConfigError> {
    if cave.dimensions() != water.dimensions() {
        return Err(ConfigError::GridMismatch {
            expected: cave.dimensions(),
            actual: water.dimensions(),
        });
    }
    Ok(cluster(cave, water))
}

fn cluster(cave: &Grid<bool>, water: &Grid<bool>) -> Grid<bool> {
    water.map(|position, &wet| {
        if cave.value(position).unwrap_or(true) {
            return false;
        }

        let neighbors = water_neighbor_count(water, position);
        if neighbors >= FLOOD_THRESHOLD {
            true
        } else if neighbors <= DRY_THRESHOLD {
            false
        } else {
            wet
        }
    })
}

/// Counts water among the eight surrounding cells, ignoring cells outside the grid.
#[must_use]
pub fn water_neighbor_count(water: &Grid<bool>, position: Position) -> u8 {
    let mut count = 0;
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }

            let neighbor = Position::new(position.x() + dx, position.y() + dy);
            if water.value(neighbor).unwrap_or(false) {
                count += 1;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_rejects_zero_steps() {
        assert_eq!(
            WaterConfig::new(0.15, 0),
            Err(ConfigError::NonPositive {
                field: "water_steps",
            })
        );
    }

    #[test]
    fn config_rejects_negative_probability() {
        assert!(WaterConfig::new(-0.01, 3).is_err());
    }

    #[test]
    fn mismatched_overlay_is_rejected() {
        let cave = Grid::filled(4, 4, false);
        let water = Grid::filled(3, 4, false);

        assert_eq!(
            cluster_step(&cave, &water),
            Err(ConfigError::GridMismatch {
                expected: (4, 4),
                actual: (3, 4),
            })
        );
    }

    #[test]
    fn out_of_bounds_neighbors_are_not_counted() {
        let water = Grid::filled(3, 3, true);

        assert_eq!(water_neighbor_count(&water, Position::new(0, 0)), 3);
        assert_eq!(water_neighbor_count(&water, Position::new(1, 0)), 5);
        assert_eq!(water_neighbor_count(&water, Position::new(1, 1)), 8);
    }
}
