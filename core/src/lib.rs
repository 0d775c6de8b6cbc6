#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gated Caves generator.
//!
//! This crate holds the plain data that flows between the generation stages
//! and the session world: the dense [`Grid`], the [`CellKind`] tiles composed
//! from it, the player's [`Inventory`] snapshot and the [`Position`] keys used
//! by graph searches. Two small traits describe the boundary collaborators:
//! [`TileMap`] stands in for whatever stores tiles (an in-memory grid, a
//! rendered tilemap) and [`WalkGraph`] describes the implicit movement graph
//! consumed by reachability queries.
//!
//! Adapters drive the session world by submitting [`Command`] values and
//! observe the outcome through the [`Event`] values it broadcasts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Integer grid coordinate. Signed so neighbours of edge cells stay representable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    x: i32,
    y: i32,
}

impl Position {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate of the position.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical coordinate of the position. Larger values are further up.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the position one step away in the provided direction.
    #[must_use]
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }
}

/// Axis-aligned movement directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing `x`.
    Left,
    /// Movement toward increasing `x`.
    Right,
    /// Movement toward decreasing `y`.
    Down,
    /// Movement toward increasing `y`.
    Up,
}

impl Direction {
    /// Every direction in the order graph traversals visit neighbours.
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Down,
        Direction::Up,
    ];

    /// Coordinate delta applied when stepping in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::Down => (0, -1),
            Self::Up => (0, 1),
        }
    }
}

/// Tile kinds that can occupy a single cell of a composed level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Open ground, always passable.
    Floor,
    /// Impassable rock.
    Wall,
    /// Rock that a goat can climb or a pickaxe can break through.
    Mountain,
    /// Shallow water.
    ShallowWater,
    /// Medium depth water.
    MediumWater,
    /// Deep water.
    DeepWater,
}

impl CellKind {
    /// Cosmetic water depths, shallow first.
    pub const WATER_DEPTHS: [CellKind; 3] = [
        CellKind::ShallowWater,
        CellKind::MediumWater,
        CellKind::DeepWater,
    ];

    /// Traversal class of the tile. Water depths collapse into [`Terrain::Water`].
    #[must_use]
    pub const fn terrain(self) -> Terrain {
        match self {
            Self::Floor => Terrain::Floor,
            Self::Wall => Terrain::Wall,
            Self::Mountain => Terrain::Mountain,
            Self::ShallowWater | Self::MediumWater | Self::DeepWater => Terrain::Water,
        }
    }

    /// Reports whether the tile is any of the water depths.
    #[must_use]
    pub const fn is_water(self) -> bool {
        matches!(self.terrain(), Terrain::Water)
    }

    /// Reports whether the tile is rock, gated or not.
    #[must_use]
    pub const fn is_rock(self) -> bool {
        matches!(self.terrain(), Terrain::Wall | Terrain::Mountain)
    }
}

/// Traversal classes that movement rules are expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Terrain {
    /// Passable without equipment.
    Floor,
    /// Passable with a boat.
    Water,
    /// Passable with a goat or a pickaxe.
    Mountain,
    /// Never passable.
    Wall,
}

/// Items that can be collected to unlock gated terrain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Item {
    /// Lets the player cross water.
    Boat,
    /// Lets the player climb mountains.
    Goat,
    /// Lets the player cross and dig mountains.
    Pickaxe,
}

impl Item {
    /// Every item in placement order.
    pub const ALL: [Item; 3] = [Item::Boat, Item::Goat, Item::Pickaxe];
}

/// Snapshot of the capabilities the player currently holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Inventory {
    /// Whether the player owns a boat.
    pub has_boat: bool,
    /// Whether the player owns a goat.
    pub has_goat: bool,
    /// Whether the player owns a pickaxe.
    pub has_pickaxe: bool,
}

impl Inventory {
    /// Inventory holding no items.
    pub const EMPTY: Inventory = Inventory {
        has_boat: false,
        has_goat: false,
        has_pickaxe: false,
    };

    /// Returns a new snapshot that additionally holds the provided item.
    #[must_use]
    pub const fn with_item(self, item: Item) -> Self {
        match item {
            Item::Boat => Self {
                has_boat: true,
                ..self
            },
            Item::Goat => Self {
                has_goat: true,
                ..self
            },
            Item::Pickaxe => Self {
                has_pickaxe: true,
                ..self
            },
        }
    }

    /// Reports whether the snapshot holds the provided item.
    #[must_use]
    pub const fn has(&self, item: Item) -> bool {
        match item {
            Item::Boat => self.has_boat,
            Item::Goat => self.has_goat,
            Item::Pickaxe => self.has_pickaxe,
        }
    }
}

/// Dense row-major two-dimensional array with fixed dimensions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid<T> {
    width: u32,
    height: u32,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Creates a grid with every cell set to `value`.
    #[must_use]
    pub fn filled(width: u32, height: u32, value: T) -> Self {
        let count = cell_count(width, height);
        Self {
            width,
            height,
            cells: vec![value; count],
        }
    }

    /// Builds a grid from rows indexed by `y`.
    ///
    /// Returns `None` when the rows are ragged.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<T>>) -> Option<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return None;
        }

        let height = u32::try_from(rows.len()).ok()?;
        let width = u32::try_from(width).ok()?;
        let cells = rows.into_iter().flatten().collect();
        Some(Self {
            width,
            height,
            cells,
        })
    }
}

impl<T> Grid<T> {
    /// Creates a grid by evaluating `init` for every position in row-major order.
    #[must_use]
    pub fn from_fn(width: u32, height: u32, mut init: impl FnMut(Position) -> T) -> Self {
        let mut cells = Vec::with_capacity(cell_count(width, height));
        for position in positions(width, height) {
            cells.push(init(position));
        }
        Self {
            width,
            height,
            cells,
        }
    }

    /// Width and height of the grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Value stored at the position, if it lies inside the grid.
    #[must_use]
    pub fn get(&self, position: Position) -> Option<&T> {
        self.index(position).and_then(|index| self.cells.get(index))
    }

    /// Overwrites the value at the position. Returns `false` when out of bounds.
    pub fn set(&mut self, position: Position, value: T) -> bool {
        let Some(slot) = self
            .index(position)
            .and_then(|index| self.cells.get_mut(index))
        else {
            return false;
        };
        *slot = value;
        true
    }

    /// Iterates every position of the grid in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        positions(self.width, self.height)
    }

    /// Iterates every position together with its value in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &T)> + '_ {
        self.positions().zip(self.cells.iter())
    }

    /// Cells stored in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// Produces a same-sized grid by mapping every cell.
    #[must_use]
    pub fn map<U>(&self, mut f: impl FnMut(Position, &T) -> U) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            cells: self
                .iter()
                .map(|(position, value)| f(position, value))
                .collect(),
        }
    }

    /// Counts the cells whose value satisfies the predicate.
    #[must_use]
    pub fn count(&self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        self.cells.iter().filter(|value| predicate(value)).count()
    }

    fn index(&self, position: Position) -> Option<usize> {
        let x = u32::try_from(position.x()).ok()?;
        let y = u32::try_from(position.y()).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }

        let width = usize::try_from(self.width).ok()?;
        let row = usize::try_from(y).ok()?;
        let column = usize::try_from(x).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

impl<T: Copy> Grid<T> {
    /// Copy of the value stored at the position, if it lies inside the grid.
    #[must_use]
    pub fn value(&self, position: Position) -> Option<T> {
        self.get(position).copied()
    }
}

fn cell_count(width: u32, height: u32) -> usize {
    let count = u64::from(width) * u64::from(height);
    usize::try_from(count).unwrap_or(0)
}

fn positions(width: u32, height: u32) -> impl Iterator<Item = Position> {
    let width = i32::try_from(width).unwrap_or(i32::MAX);
    let height = i32::try_from(height).unwrap_or(i32::MAX);
    (0..height).flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
}

/// Tile storage collaborator used by movement rules and digging.
///
/// Any backing store qualifies: the in-memory [`Grid`] implements it directly
/// and an engine tilemap can implement it by forwarding to its own lookups.
pub trait TileMap {
    /// Width and height of the addressable area.
    fn dimensions(&self) -> (u32, u32);

    /// Kind stored at the position, or `None` for out-of-bounds or unset cells.
    fn kind_at(&self, position: Position) -> Option<CellKind>;

    /// Replaces the kind stored at the position. Returns `false` when out of bounds.
    fn set_kind(&mut self, position: Position, kind: CellKind) -> bool;
}

impl TileMap for Grid<CellKind> {
    fn dimensions(&self) -> (u32, u32) {
        Grid::dimensions(self)
    }

    fn kind_at(&self, position: Position) -> Option<CellKind> {
        self.value(position)
    }

    fn set_kind(&mut self, position: Position, kind: CellKind) -> bool {
        self.set(position, kind)
    }
}

/// Implicit movement graph over grid positions.
pub trait WalkGraph {
    /// Reports whether the position can be stood on.
    fn is_walkable(&self, position: Position) -> bool;

    /// Walkable axis-aligned neighbours in [`Direction::ALL`] order.
    fn neighbors(&self, position: Position) -> Neighbors {
        Neighbors::filtered(position, |candidate| self.is_walkable(candidate))
    }
}

/// Iterator over up to four axis-aligned neighbours of a position.
#[derive(Clone, Debug)]
pub struct Neighbors {
    candidates: [Option<Position>; 4],
    cursor: usize,
}

impl Neighbors {
    /// All four axis-aligned neighbours, regardless of bounds.
    #[must_use]
    pub fn all(origin: Position) -> Self {
        Self::filtered(origin, |_| true)
    }

    /// Axis-aligned neighbours accepted by `keep`, in [`Direction::ALL`] order.
    pub fn filtered(origin: Position, mut keep: impl FnMut(Position) -> bool) -> Self {
        let mut candidates = [None; 4];
        for (slot, direction) in candidates.iter_mut().zip(Direction::ALL) {
            let candidate = origin.step(direction);
            if keep(candidate) {
                *slot = Some(candidate);
            }
        }
        Self {
            candidates,
            cursor: 0,
        }
    }
}

impl Iterator for Neighbors {
    type Item = Position;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(candidate) = self.candidates.get(self.cursor).copied() {
            self.cursor += 1;
            if candidate.is_some() {
                return candidate;
            }
        }
        None
    }
}

/// Result of attempting to dig a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigOutcome {
    /// The mountain was broken and the cell is now floor.
    Dug,
    /// The inventory holds no pickaxe, so nothing changed.
    MissingPickaxe,
    /// The cell is not a mountain, so nothing changed.
    NotMountain,
}

/// Commands that express all permissible session mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Requests that the player advance a single cell.
    MovePlayer {
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Requests that the player dig the cell they stand on.
    Dig,
    /// Grants an item to the player without walking to it.
    CollectItem {
        /// Item added to the inventory.
        item: Item,
    },
}

/// Events broadcast by the session world after processing commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that the player moved between two cells.
    PlayerMoved {
        /// Cell occupied before moving.
        from: Position,
        /// Cell occupied after moving.
        to: Position,
    },
    /// Reports that the destination cell was not walkable.
    MoveBlocked {
        /// Cell the player remains on.
        from: Position,
        /// Cell the player attempted to enter.
        attempted: Position,
    },
    /// Confirms that an item was added to the inventory.
    ItemCollected {
        /// Item that was collected.
        item: Item,
        /// Inventory snapshot after collecting the item.
        inventory: Inventory,
    },
    /// Confirms that a mountain was turned into floor.
    TileDug {
        /// Cell that changed.
        cell: Position,
    },
    /// Reports that a dig request left the map unchanged.
    DigRejected {
        /// Cell the dig targeted.
        cell: Position,
        /// Reason nothing changed.
        outcome: DigOutcome,
    },
}

/// Reasons a configuration value is rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A size, count or budget was zero.
    #[error("`{field}` must be positive")]
    NonPositive {
        /// Name of the offending setting.
        field: &'static str,
    },
    /// A probability fell outside `[0, 1]` or was not a number.
    #[error("`{field}` must lie within [0, 1], got {value}")]
    ProbabilityOutOfRange {
        /// Name of the offending setting.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// Two grids that must align have different dimensions.
    #[error("grid dimensions {actual:?} do not match the expected {expected:?}")]
    GridMismatch {
        /// Dimensions the stage was configured for.
        expected: (u32, u32),
        /// Dimensions that were supplied.
        actual: (u32, u32),
    },
}

/// Validates that `value` is a probability.
pub fn ensure_probability(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::ProbabilityOutOfRange { field, value })
    }
}

/// Validates that `value` is strictly positive.
pub fn ensure_positive(field: &'static str, value: u32) -> Result<u32, ConfigError> {
    if value == 0 {
        Err(ConfigError::NonPositive { field })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn grid_indexes_rows_by_y() {
        let grid = Grid::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]]).expect("rectangular");

        assert_eq!(grid.dimensions(), (3, 2));
        assert_eq!(grid.value(Position::new(0, 0)), Some(1));
        assert_eq!(grid.value(Position::new(2, 1)), Some(6));
        assert_eq!(grid.value(Position::new(3, 0)), None);
        assert_eq!(grid.value(Position::new(0, -1)), None);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(Grid::from_rows(vec![vec![1, 2], vec![3]]).is_none());
    }

    #[test]
    fn set_ignores_out_of_bounds_positions() {
        let mut grid = Grid::filled(2, 2, CellKind::Floor);

        assert!(!grid.set(Position::new(2, 0), CellKind::Wall));
        assert!(grid.set(Position::new(1, 1), CellKind::Wall));
        assert_eq!(grid.count(|kind| *kind == CellKind::Wall), 1);
    }

    #[test]
    fn positions_follow_row_major_order() {
        let grid = Grid::filled(2, 2, ());
        let positions: Vec<_> = grid.positions().collect();

        assert_eq!(
            positions,
            vec![
                Position::new(0, 0),
                Position::new(1, 0),
                Position::new(0, 1),
                Position::new(1, 1),
            ]
        );
    }

    #[test]
    fn neighbors_follow_left_right_down_up_order() {
        let origin = Position::new(5, 5);
        let neighbors: Vec<_> = Neighbors::all(origin).collect();

        assert_eq!(
            neighbors,
            vec![
                Position::new(4, 5),
                Position::new(6, 5),
                Position::new(5, 4),
                Position::new(5, 6),
            ]
        );
    }

    #[test]
    fn filtered_neighbors_skip_rejected_cells() {
        let origin = Position::new(0, 0);
        let neighbors: Vec<_> =
            Neighbors::filtered(origin, |p| p.x() >= 0 && p.y() >= 0).collect();

        assert_eq!(neighbors, vec![Position::new(1, 0), Position::new(0, 1)]);
    }

    #[test]
    fn water_depths_share_the_water_terrain() {
        for kind in CellKind::WATER_DEPTHS {
            assert_eq!(kind.terrain(), Terrain::Water);
            assert!(kind.is_water());
        }
        assert!(CellKind::Mountain.is_rock());
        assert!(!CellKind::Floor.is_rock());
    }

    #[test]
    fn with_item_sets_only_the_matching_flag() {
        let inventory = Inventory::EMPTY.with_item(Item::Goat);

        assert!(inventory.has(Item::Goat));
        assert!(!inventory.has(Item::Boat));
        assert!(!inventory.has(Item::Pickaxe));
    }

    #[test]
    fn probability_validation_rejects_nan_and_out_of_range() {
        assert!(ensure_probability("p", 0.0).is_ok());
        assert!(ensure_probability("p", 1.0).is_ok());
        assert!(ensure_probability("p", -0.1).is_err());
        assert!(ensure_probability("p", 1.5).is_err());
        assert!(ensure_probability("p", f64::NAN).is_err());
    }

    #[test]
    fn positive_validation_rejects_zero() {
        assert_eq!(
            ensure_positive("size", 0),
            Err(ConfigError::NonPositive { field: "size" })
        );
        assert_eq!(ensure_positive("size", 3), Ok(3));
    }

    #[test]
    fn grid_round_trips_through_bincode() {
        let grid = Grid::from_rows(vec![
            vec![CellKind::Floor, CellKind::DeepWater],
            vec![CellKind::Mountain, CellKind::Wall],
        ])
        .expect("rectangular");
        assert_round_trip(&grid);
    }

    #[test]
    fn inventory_round_trips_through_bincode() {
        assert_round_trip(&Inventory::EMPTY.with_item(Item::Pickaxe));
    }
}
