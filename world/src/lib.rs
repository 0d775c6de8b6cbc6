#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for a generated cave level.

use gated_caves_core::{CellKind, Command, DigOutcome, Event, Grid, Inventory, Item, Position};
use gated_caves_system_bootstrap::{Level, Placement};
use gated_caves_system_movement::{dig, is_walkable};
use log::debug;

/// Represents the authoritative state of a play session.
#[derive(Clone, Debug)]
pub struct World {
    terrain: Grid<CellKind>,
    player: Position,
    items: Vec<Placement>,
    inventory: Inventory,
}

impl World {
    /// Starts a session on the level with an empty inventory.
    #[must_use]
    pub fn new(level: Level) -> Self {
        let (terrain, player, items) = level.into_parts();
        Self {
            terrain,
            player,
            items,
            inventory: Inventory::EMPTY,
        }
    }

    fn take_item_at(&mut self, position: Position) -> Option<Item> {
        let index = self
            .items
            .iter()
            .position(|placement| placement.position == position)?;
        Some(self.items.remove(index).item)
    }

    fn collect(&mut self, item: Item, out_events: &mut Vec<Event>) {
        self.inventory = self.inventory.with_item(item);
        debug!("picked up {item:?}, inventory is now {:?}", self.inventory);
        out_events.push(Event::ItemCollected {
            item,
            inventory: self.inventory,
        });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::MovePlayer { direction } => {
            let from = world.player;
            let to = from.step(direction);
            let open = world
                .terrain
                .value(to)
                .map_or(false, |kind| is_walkable(kind, &world.inventory));

            if !open {
                out_events.push(Event::MoveBlocked {
                    from,
                    attempted: to,
                });
                return;
            }

            world.player = to;
            out_events.push(Event::PlayerMoved { from, to });

            while let Some(item) = world.take_item_at(to) {
                world.collect(item, out_events);
            }
        }
        Command::Dig => {
            let cell = world.player;
            match dig(&mut world.terrain, cell, &world.inventory) {
                DigOutcome::Dug => out_events.push(Event::TileDug { cell }),
                outcome => out_events.push(Event::DigRejected { cell, outcome }),
            }
        }
        Command::CollectItem { item } => {
            world.items.retain(|placement| placement.item != item);
            world.collect(item, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use gated_caves_core::{CellKind, Grid, Inventory, Item, Position};
    use gated_caves_system_bootstrap::Placement;
    use gated_caves_system_movement::WalkabilityGraph;
    use gated_caves_system_reachability::count_reachable;

    use super::World;

    /// Provides read-only access to the current terrain.
    #[must_use]
    pub fn terrain(world: &World) -> &Grid<CellKind> {
        &world.terrain
    }

    /// Snapshot of the items the player holds.
    #[must_use]
    pub fn inventory(world: &World) -> Inventory {
        world.inventory
    }

    /// Cell the player currently stands on.
    #[must_use]
    pub fn player(world: &World) -> Position {
        world.player
    }

    /// Items still lying on the map.
    #[must_use]
    pub fn items(world: &World) -> &[Placement] {
        &world.items
    }

    /// Item lying on the provided cell, if any.
    #[must_use]
    pub fn item_at(world: &World, position: Position) -> Option<Item> {
        world
            .items
            .iter()
            .find(|placement| placement.position == position)
            .map(|placement| placement.item)
    }

    /// Counts cells reachable from the player with the current inventory, stopping at `cap`.
    #[must_use]
    pub fn reachable_tile_count(world: &World, cap: usize) -> usize {
        let graph = WalkabilityGraph::new(&world.terrain, world.inventory);
        count_reachable(&graph, world.player, cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gated_caves_core::Direction;

    fn corridor() -> World {
        let terrain = Grid::from_rows(vec![vec![
            CellKind::Floor,
            CellKind::Floor,
            CellKind::Mountain,
            CellKind::Floor,
        ]])
        .expect("single row");
        let items = vec![Placement {
            item: Item::Pickaxe,
            position: Position::new(1, 0),
        }];
        World::new(Level::new(0, terrain, Position::new(0, 0), items))
    }

    #[test]
    fn new_world_starts_empty_handed_on_the_spawn() {
        let world = corridor();

        assert_eq!(query::player(&world), Position::new(0, 0));
        assert_eq!(query::inventory(&world), Inventory::EMPTY);
        assert_eq!(query::items(&world).len(), 1);
    }

    #[test]
    fn moving_onto_an_item_collects_it() {
        let mut world = corridor();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MovePlayer {
                direction: Direction::Right,
            },
            &mut events,
        );

        let expected_inventory = Inventory::EMPTY.with_item(Item::Pickaxe);
        assert_eq!(
            events,
            vec![
                Event::PlayerMoved {
                    from: Position::new(0, 0),
                    to: Position::new(1, 0),
                },
                Event::ItemCollected {
                    item: Item::Pickaxe,
                    inventory: expected_inventory,
                },
            ]
        );
        assert!(query::items(&world).is_empty());
        assert_eq!(query::item_at(&world, Position::new(1, 0)), None);
    }

    #[test]
    fn leaving_the_map_is_blocked() {
        let mut world = corridor();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MovePlayer {
                direction: Direction::Down,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::MoveBlocked {
                from: Position::new(0, 0),
                attempted: Position::new(0, -1),
            }]
        );
        assert_eq!(query::player(&world), Position::new(0, 0));
    }

    #[test]
    fn granting_an_item_clears_it_from_the_map() {
        let mut world = corridor();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::CollectItem {
                item: Item::Pickaxe,
            },
            &mut events,
        );

        assert!(query::inventory(&world).has_pickaxe);
        assert!(query::items(&world).is_empty());
        assert_eq!(events.len(), 1);
    }
}
