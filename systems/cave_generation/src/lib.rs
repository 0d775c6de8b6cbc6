#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Cellular automaton cave generator.
//!
//! The generator works on a binary grid where `true` marks a wall and `false`
//! marks floor. A run starts from random noise ([`CaveGenerator::randomize_map`])
//! and is smoothed one step at a time ([`CaveGenerator::smooth_map`]) so the
//! caller decides how many iterations to run and may pause between them.

use gated_caves_core::{ensure_positive, ensure_probability, ConfigError, Grid, Position};
use log::debug;
use rand::Rng;

/// Wall count above which a cell turns into a wall.
const WALL_THRESHOLD: u8 = 4;

/// Validated parameters of a cave generation run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaveConfig {
    fill_probability: f64,
    size: u32,
}

impl CaveConfig {
    /// Creates a configuration for a square `size`×`size` cave.
    ///
    /// `fill_probability` is the chance that a cell starts out as a wall.
    pub fn new(fill_probability: f64, size: u32) -> Result<Self, ConfigError> {
        Ok(Self {
            fill_probability: ensure_probability("fill_probability", fill_probability)?,
            size: ensure_positive("size", size)?,
        })
    }
}

/// Holds the current cave snapshot between smoothing steps.
#[derive(Clone, Debug)]
pub struct CaveGenerator {
    config: CaveConfig,
    map: Grid<bool>,
    iterations: u32,
}

impl CaveGenerator {
    /// Creates a generator whose map starts out as open floor.
    #[must_use]
    pub fn new(config: CaveConfig) -> Self {
        Self {
            map: Grid::filled(config.size, config.size, false),
            config,
            iterations: 0,
        }
    }

    /// Replaces the map with fresh noise drawn from `rng`.
    pub fn randomize_map<R>(&mut self, rng: &mut R) -> &Grid<bool>
    where
        R: Rng + ?Sized,
    {
        self.map = randomize(&self.config, rng);
        self.iterations = 0;
        &self.map
    }

    /// Applies a single smoothing step to the whole map.
    pub fn smooth_map(&mut self) -> &Grid<bool> {
        self.map = smooth(&self.map);
        self.iterations = self.iterations.saturating_add(1);
        debug!(
            "cave smoothing step {} left {} wall cells",
            self.iterations,
            self.map.count(|wall| *wall)
        );
        &self.map
    }

    /// Current cave snapshot. `true` marks a wall.
    #[must_use]
    pub fn map(&self) -> &Grid<bool> {
        &self.map
    }

    /// Number of smoothing steps applied since the last randomization.
    #[must_use]
    pub const fn iterations_run(&self) -> u32 {
        self.iterations
    }

    /// Consumes the generator, yielding the current snapshot.
    #[must_use]
    pub fn into_map(self) -> Grid<bool> {
        self.map
    }
}

/// Draws a noise grid where every cell is a wall with the configured probability.
pub fn randomize<R>(config: &CaveConfig, rng: &mut R) -> Grid<bool>
where
    R: Rng + ?Sized,
{
    Grid::from_fn(config.size, config.size, |_| {
        rng.gen_bool(config.fill_probability)
    })
}

/// Computes the next automaton generation from an immutable snapshot.
///
/// Cells with more than four wall neighbours become walls, cells with fewer
/// become floor and cells with exactly four keep their state.
#[must_use]
pub fn smooth(map: &Grid<bool>) -> Grid<bool> {
    map.map(|position, &wall| {
        let walls = wall_neighbor_count(map, position);
        match walls.cmp(&WALL_THRESHOLD) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => wall,
        }
    })
}

/// Counts walls among the eight surrounding cells.
///
/// Neighbours outside the grid count as walls, which pulls map edges shut.
#[must_use]
pub fn wall_neighbor_count(map: &Grid<bool>, position: Position) -> u8 {
    let mut count = 0;
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }

            let neighbor = Position::new(position.x() + dx, position.y() + dy);
            if map.value(neighbor).unwrap_or(true) {
                count += 1;
            }
        }
    }
    count
}
