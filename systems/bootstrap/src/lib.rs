#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level pipeline that drives every generation stage from a single seed.
//!
//! The pipeline randomizes and smooths a cave, grows water on its floor,
//! composes the final tile grid and then searches for a spawn point and item
//! cells. Each call to [`LevelPipeline::advance`] performs one unit of work so
//! an external scheduler can pace or visualise the stages; [`generate_level`]
//! runs them all at once.

use gated_caves_core::{
    ensure_positive, ensure_probability, CellKind, ConfigError, Grid, Inventory, Item, Position,
};
use gated_caves_system_cave_generation::{CaveConfig, CaveGenerator};
use gated_caves_system_placement::PlacementSearch;
use gated_caves_system_water_clusters::{WaterClusterGenerator, WaterConfig, WaterSimulation};
use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound of the roll that yields shallow water.
const SHALLOW_WATER_ROLL: f64 = 0.33;
/// Upper bound of the roll that yields medium water.
const MEDIUM_WATER_ROLL: f64 = 0.66;

/// Every tunable knob of a generation run.
///
/// Missing fields fall back to their defaults when deserialized, so a
/// configuration file only needs to name the settings it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    /// Side length of the square map.
    pub grid_size: u32,
    /// Chance that a cell starts out as a wall.
    pub fill_probability: f64,
    /// Number of cave smoothing steps.
    pub cave_steps: u32,
    /// Chance that a floor cell starts out as water.
    pub water_seed_probability: f64,
    /// Number of water clustering steps.
    pub water_steps: u32,
    /// Chance that a generated wall cell becomes a mountain instead of a wall.
    pub mountain_share: f64,
    /// Cells a spawn point must reach without any items.
    pub min_reachable_tiles: u32,
    /// Cells sampled per placement query before giving up.
    pub max_placement_tries: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            grid_size: 100,
            fill_probability: 0.5,
            cave_steps: 20,
            water_seed_probability: 0.15,
            water_steps: 3,
            mountain_share: 1.0,
            min_reachable_tiles: 100,
            max_placement_tries: 1000,
        }
    }
}

impl GenerationConfig {
    /// Checks every setting, reporting the first invalid one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let _ = self.stages()?;
        Ok(())
    }

    fn stages(&self) -> Result<Stages, ConfigError> {
        let cave = CaveConfig::new(self.fill_probability, self.grid_size)?;
        let _ = ensure_positive("cave_steps", self.cave_steps)?;
        let water = WaterConfig::new(self.water_seed_probability, self.water_steps)?;
        let mountain_share = ensure_probability("mountain_share", self.mountain_share)?;
        let _ = ensure_positive("min_reachable_tiles", self.min_reachable_tiles)?;
        let search = PlacementSearch::new(self.max_placement_tries)?;

        Ok(Stages {
            cave,
            water,
            mountain_share,
            search,
        })
    }
}

/// Validated per-stage settings derived from a [`GenerationConfig`].
#[derive(Clone, Copy, Debug)]
struct Stages {
    cave: CaveConfig,
    water: WaterConfig,
    mountain_share: f64,
    search: PlacementSearch,
}

/// Reasons a generation run produced no level.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GenerationError {
    /// The configuration was rejected before any work started.
    #[error("invalid generation config: {0}")]
    Config(#[from] ConfigError),
    /// No sampled cell reached enough tiles to host the player.
    #[error("no spawn point reaching {min_reachable} tiles after {attempts} attempts")]
    SpawnNotFound {
        /// Reachable tile threshold that every candidate missed.
        min_reachable: u32,
        /// Number of candidates sampled.
        attempts: u32,
    },
    /// The pipeline already produced its level or stopped on an earlier error.
    #[error("the level pipeline has already finished")]
    Finished,
}

/// Item lying on a level cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    /// Item waiting to be collected.
    pub item: Item,
    /// Cell the item lies on.
    pub position: Position,
}

/// Finished level ready to be handed to a session or an adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    seed: u64,
    tiles: Grid<CellKind>,
    spawn: Position,
    items: Vec<Placement>,
}

impl Level {
    /// Assembles a level from its parts.
    #[must_use]
    pub fn new(seed: u64, tiles: Grid<CellKind>, spawn: Position, items: Vec<Placement>) -> Self {
        Self {
            seed,
            tiles,
            spawn,
            items,
        }
    }

    /// Seed the level was generated from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Composed tile grid.
    #[must_use]
    pub fn tiles(&self) -> &Grid<CellKind> {
        &self.tiles
    }

    /// Cell the player starts on.
    #[must_use]
    pub const fn spawn(&self) -> Position {
        self.spawn
    }

    /// Items placed on the level in placement order.
    #[must_use]
    pub fn items(&self) -> &[Placement] {
        &self.items
    }

    /// Cell holding the provided item, or `None` when it could not be placed.
    #[must_use]
    pub fn item(&self, item: Item) -> Option<Position> {
        self.items
            .iter()
            .find(|placement| placement.item == item)
            .map(|placement| placement.position)
    }

    /// Splits the level into its tiles, spawn and items.
    #[must_use]
    pub fn into_parts(self) -> (Grid<CellKind>, Position, Vec<Placement>) {
        (self.tiles, self.spawn, self.items)
    }
}

/// Unit of work reported by [`LevelPipeline::advance`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Progress {
    /// A cave smoothing step finished.
    CaveSmoothed {
        /// Number of smoothing steps applied so far.
        iteration: u32,
    },
    /// A water clustering step finished.
    WaterClustered {
        /// Number of clustering steps applied so far.
        step: u32,
    },
    /// The cave and water overlay were composed into tiles.
    TilesComposed,
    /// The spawn and items were placed; the level is complete.
    LevelReady(Level),
}

enum Stage {
    Cave(CaveGenerator),
    Water(WaterSimulation),
    Compose {
        cave: Grid<bool>,
        water: Grid<bool>,
    },
    Place(Grid<CellKind>),
    Done,
}

/// Step-wise driver over every generation stage.
pub struct LevelPipeline {
    config: GenerationConfig,
    stages: Stages,
    seed: u64,
    rng: ChaCha8Rng,
    stage: Stage,
}

impl LevelPipeline {
    /// Validates `config` and randomizes the initial cave from `seed`.
    pub fn new(config: GenerationConfig, seed: u64) -> Result<Self, GenerationError> {
        let stages = config.stages()?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut generator = CaveGenerator::new(stages.cave);
        let _ = generator.randomize_map(&mut rng);

        Ok(Self {
            config,
            stages,
            seed,
            rng,
            stage: Stage::Cave(generator),
        })
    }

    /// Seed the pipeline was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Cave snapshot while the cave, water and compose stages are running.
    #[must_use]
    pub fn cave_map(&self) -> Option<&Grid<bool>> {
        match &self.stage {
            Stage::Cave(generator) => Some(generator.map()),
            Stage::Water(simulation) => Some(simulation.cave()),
            Stage::Compose { cave, .. } => Some(cave),
            Stage::Place(_) | Stage::Done => None,
        }
    }

    /// Water overlay while the water and compose stages are running.
    #[must_use]
    pub fn water_map(&self) -> Option<&Grid<bool>> {
        match &self.stage {
            Stage::Water(simulation) => Some(simulation.water()),
            Stage::Compose { water, .. } => Some(water),
            Stage::Cave(_) | Stage::Place(_) | Stage::Done => None,
        }
    }

    /// Reports whether every stage has run.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.stage, Stage::Done)
    }

    /// Performs the next unit of work.
    ///
    /// Returns `Ok(None)` once the level has been produced or the run failed.
    pub fn advance(&mut self) -> Result<Option<Progress>, GenerationError> {
        let progress = match std::mem::replace(&mut self.stage, Stage::Done) {
            Stage::Cave(mut generator) => {
                let _ = generator.smooth_map();
                let iteration = generator.iterations_run();
                self.stage = if iteration >= self.config.cave_steps {
                    info!("cave simulation completed after {iteration} steps");
                    let water = WaterClusterGenerator::new(self.stages.water);
                    Stage::Water(water.begin(generator.into_map(), &mut self.rng))
                } else {
                    Stage::Cave(generator)
                };
                Progress::CaveSmoothed { iteration }
            }
            Stage::Water(mut simulation) => {
                let _ = simulation.step();
                let step = simulation.steps_run();
                self.stage = if simulation.is_complete(&self.stages.water) {
                    let (cave, water) = simulation.into_parts();
                    info!(
                        "water clustering completed with {} water cells",
                        water.count(|wet| *wet)
                    );
                    Stage::Compose { cave, water }
                } else {
                    Stage::Water(simulation)
                };
                Progress::WaterClustered { step }
            }
            Stage::Compose { cave, water } => {
                let tiles =
                    compose_tiles(&cave, &water, self.stages.mountain_share, &mut self.rng)?;
                self.stage = Stage::Place(tiles);
                Progress::TilesComposed
            }
            Stage::Place(tiles) => Progress::LevelReady(self.place(tiles)?),
            Stage::Done => return Ok(None),
        };
        Ok(Some(progress))
    }

    /// Runs every remaining stage and returns the finished level.
    pub fn run(mut self) -> Result<Level, GenerationError> {
        loop {
            match self.advance()? {
                Some(Progress::LevelReady(level)) => return Ok(level),
                Some(_) => {}
                None => return Err(GenerationError::Finished),
            }
        }
    }

    fn place(&mut self, tiles: Grid<CellKind>) -> Result<Level, GenerationError> {
        let search = self.stages.search;
        let min_reachable = usize::try_from(self.config.min_reachable_tiles).unwrap_or(usize::MAX);

        let spawn = search
            .find_spawn(&tiles, &Inventory::EMPTY, min_reachable, &mut self.rng)
            .ok_or(GenerationError::SpawnNotFound {
                min_reachable: self.config.min_reachable_tiles,
                attempts: search.max_tries(),
            })?;
        info!("placed player at {spawn:?}");

        let items = place_items(&search, &tiles, &mut self.rng);
        info!(
            "level generated from seed {} with {} of {} items placed",
            self.seed,
            items.len(),
            Item::ALL.len()
        );
        Ok(Level::new(self.seed, tiles, spawn, items))
    }
}

/// Generates a complete level for `seed` in one go.
pub fn generate_level(config: &GenerationConfig, seed: u64) -> Result<Level, GenerationError> {
    LevelPipeline::new(config.clone(), seed)?.run()
}

/// Composes the final tile grid from a cave and its water overlay.
///
/// Cave walls become mountains with probability `mountain_share` and plain
/// walls otherwise. Water cells receive a cosmetic depth drawn from `rng`.
pub fn compose_tiles<R>(
    cave: &Grid<bool>,
    water: &Grid<bool>,
    mountain_share: f64,
    rng: &mut R,
) -> Result<Grid<CellKind>, ConfigError>
where
    R: Rng + ?Sized,
{
    if cave.dimensions() != water.dimensions() {
        return Err(ConfigError::GridMismatch {
            expected: cave.dimensions(),
            actual: water.dimensions(),
        });
    }
    let mountain_share = ensure_probability("mountain_share", mountain_share)?;

    Ok(cave.map(|position, &wall| {
        if wall {
            if rng.gen_bool(mountain_share) {
                CellKind::Mountain
            } else {
                CellKind::Wall
            }
        } else if water.value(position) == Some(true) {
            water_depth(rng.gen::<f64>())
        } else {
            CellKind::Floor
        }
    }))
}

fn water_depth(roll: f64) -> CellKind {
    if roll < SHALLOW_WATER_ROLL {
        CellKind::ShallowWater
    } else if roll < MEDIUM_WATER_ROLL {
        CellKind::MediumWater
    } else {
        CellKind::DeepWater
    }
}

/// Places the boat by the water, the goat by the rock and the pickaxe anywhere
/// on the floor. Items that find no cell are left out.
fn place_items<R>(search: &PlacementSearch, tiles: &Grid<CellKind>, rng: &mut R) -> Vec<Placement>
where
    R: Rng + ?Sized,
{
    let is_floor = |kind: CellKind| kind == CellKind::Floor;

    Item::ALL
        .into_iter()
        .filter_map(|item| {
            let position = match item {
                Item::Boat => search.find_cell_with_neighbor_matching(
                    tiles,
                    rng,
                    is_floor,
                    CellKind::is_water,
                ),
                Item::Goat => search.find_cell_with_neighbor_matching(
                    tiles,
                    rng,
                    is_floor,
                    CellKind::is_rock,
                ),
                Item::Pickaxe => search.find_cell_matching(tiles, rng, is_floor),
            };
            match position {
                Some(position) => info!("the {item:?} is at {position:?}"),
                None => warn!("the {item:?} could not be placed"),
            }
            position.map(|position| Placement { item, position })
        })
        .collect()
}
