#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Inventory-gated movement rules and the walkability graph built on them.

use gated_caves_core::{CellKind, DigOutcome, Inventory, Position, Terrain, TileMap, WalkGraph};
use log::debug;

/// Reports whether a tile of the provided kind can be entered with `inventory`.
///
/// Floor is always open, water needs a boat, mountains need a goat or a
/// pickaxe and walls stay closed regardless of equipment.
#[must_use]
pub const fn is_walkable(kind: CellKind, inventory: &Inventory) -> bool {
    match kind.terrain() {
        Terrain::Floor => true,
        Terrain::Water => inventory.has_boat,
        Terrain::Mountain => inventory.has_goat || inventory.has_pickaxe,
        Terrain::Wall => false,
    }
}

/// Movement graph over a tile map as seen with a fixed inventory snapshot.
///
/// The graph borrows the map, so results describe the map and inventory at
/// construction time. Build a new graph after either changes.
#[derive(Debug)]
pub struct WalkabilityGraph<'map, M: ?Sized> {
    map: &'map M,
    inventory: Inventory,
}

impl<'map, M> WalkabilityGraph<'map, M>
where
    M: TileMap + ?Sized,
{
    /// Binds the tile map to an inventory snapshot.
    #[must_use]
    pub const fn new(map: &'map M, inventory: Inventory) -> Self {
        Self { map, inventory }
    }
}

impl<M> WalkGraph for WalkabilityGraph<'_, M>
where
    M: TileMap + ?Sized,
{
    fn is_walkable(&self, position: Position) -> bool {
        self.map
            .kind_at(position)
            .map_or(false, |kind| is_walkable(kind, &self.inventory))
    }
}

/// Breaks the mountain at `position` when the inventory holds a pickaxe.
///
/// Only the targeted cell can change; the inventory is read, never consumed.
pub fn dig<M>(map: &mut M, position: Position, inventory: &Inventory) -> DigOutcome
where
    M: TileMap + ?Sized,
{
    if !inventory.has_pickaxe {
        return DigOutcome::MissingPickaxe;
    }

    if map.kind_at(position) != Some(CellKind::Mountain) {
        debug!("no mountain to dig at {position:?}");
        return DigOutcome::NotMountain;
    }

    if !map.set_kind(position, CellKind::Floor) {
        return DigOutcome::NotMountain;
    }

    debug!("turned mountain into floor at {position:?}");
    DigOutcome::Dug
}

#[cfg(test)]
mod tests {
    use super::*;
    use gated_caves_core::{Grid, Item};

    const KINDS: [CellKind; 6] = [
        CellKind::Floor,
        CellKind::Wall,
        CellKind::Mountain,
        CellKind::ShallowWater,
        CellKind::MediumWater,
        CellKind::DeepWater,
    ];

    fn every_inventory() -> Vec<Inventory> {
        let mut inventories = Vec::new();
        for mask in 0u8..8 {
            inventories.push(Inventory {
                has_boat: mask & 1 != 0,
                has_goat: mask & 2 != 0,
                has_pickaxe: mask & 4 != 0,
            });
        }
        inventories
    }

    #[test]
    fn walkability_follows_the_inventory_rules() {
        for inventory in every_inventory() {
            for kind in KINDS {
                let expected = match kind.terrain() {
                    Terrain::Floor => true,
                    Terrain::Water => inventory.has(Item::Boat),
                    Terrain::Mountain => inventory.has(Item::Goat) || inventory.has(Item::Pickaxe),
                    Terrain::Wall => false,
                };
                assert_eq!(
                    is_walkable(kind, &inventory),
                    expected,
                    "{kind:?} with {inventory:?}"
                );
            }
        }
    }

    #[test]
    fn out_of_bounds_is_never_walkable() {
        let map = Grid::filled(2, 2, CellKind::Floor);
        let graph = WalkabilityGraph::new(&map, Inventory::EMPTY);

        assert!(graph.is_walkable(Position::new(1, 1)));
        assert!(!graph.is_walkable(Position::new(-1, 0)));
        assert!(!graph.is_walkable(Position::new(0, 2)));
    }

    #[test]
    fn dig_without_pickaxe_leaves_the_map_untouched() {
        let mut map = Grid::filled(2, 1, CellKind::Mountain);
        let before = map.clone();

        let outcome = dig(&mut map, Position::new(1, 0), &Inventory::EMPTY);

        assert_eq!(outcome, DigOutcome::MissingPickaxe);
        assert_eq!(map, before);
    }

    #[test]
    fn dig_on_floor_is_rejected() {
        let mut map = Grid::filled(1, 1, CellKind::Floor);
        let inventory = Inventory::EMPTY.with_item(Item::Pickaxe);

        assert_eq!(
            dig(&mut map, Position::new(0, 0), &inventory),
            DigOutcome::NotMountain
        );
        assert_eq!(
            dig(&mut map, Position::new(4, 4), &inventory),
            DigOutcome::NotMountain
        );
    }
}
