#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bounded random-sampling search for spawn points and item cells.
//!
//! Every search draws uniformly random in-bounds cells until one satisfies its
//! predicate or the try budget runs out. Acceptance is greedy: the first
//! qualifying cell wins. Running out of tries is an ordinary `None` result that
//! the caller answers with its own fallback, such as regenerating the map.

use gated_caves_core::{
    ensure_positive, CellKind, ConfigError, Inventory, Neighbors, Position, TileMap,
};
use gated_caves_system_movement::WalkabilityGraph;
use gated_caves_system_reachability::ReachabilityAnalyzer;
use log::{debug, warn};
use rand::Rng;

/// Random-sampling searcher with a fixed try budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementSearch {
    max_tries: u32,
}

impl PlacementSearch {
    /// Creates a searcher that samples at most `max_tries` cells per query.
    pub fn new(max_tries: u32) -> Result<Self, ConfigError> {
        Ok(Self {
            max_tries: ensure_positive("max_placement_tries", max_tries)?,
        })
    }

    /// Number of cells sampled before a query gives up.
    #[must_use]
    pub const fn max_tries(&self) -> u32 {
        self.max_tries
    }

    /// Finds a cell from which at least `min_reachable` cells can be reached.
    ///
    /// Each candidate runs a bounded search capped at `min_reachable`, so a
    /// query never explores more than that many cells per sample. The spawn
    /// itself must be walkable, so a threshold of zero still rejects rock and
    /// gated cells.
    pub fn find_spawn<M, R>(
        &self,
        map: &M,
        inventory: &Inventory,
        min_reachable: usize,
        rng: &mut R,
    ) -> Option<Position>
    where
        M: TileMap + ?Sized,
        R: Rng + ?Sized,
    {
        let graph = WalkabilityGraph::new(map, *inventory);
        let mut analyzer = ReachabilityAnalyzer::new();

        let found = self.search(map.dimensions(), rng, |candidate| {
            let reached = analyzer.count(&graph, candidate, min_reachable);
            reached > 0 && reached >= min_reachable
        });

        match found {
            Some(spawn) => debug!("spawn {spawn:?} reaches at least {min_reachable} cells"),
            None => warn!(
                "no spawn point reaching {min_reachable} tiles after {} attempts",
                self.max_tries
            ),
        }
        found
    }

    /// Finds a cell whose kind satisfies `cell_predicate` and which has at
    /// least one axis-aligned neighbour satisfying `neighbor_predicate`.
    ///
    /// Neighbours outside the map never match.
    pub fn find_cell_with_neighbor_matching<M, R, C, N>(
        &self,
        map: &M,
        rng: &mut R,
        cell_predicate: C,
        neighbor_predicate: N,
    ) -> Option<Position>
    where
        M: TileMap + ?Sized,
        R: Rng + ?Sized,
        C: Fn(CellKind) -> bool,
        N: Fn(CellKind) -> bool,
    {
        let found = self.search(map.dimensions(), rng, |candidate| {
            map.kind_at(candidate).map_or(false, &cell_predicate)
                && Neighbors::all(candidate)
                    .filter_map(|neighbor| map.kind_at(neighbor))
                    .any(&neighbor_predicate)
        });

        if found.is_none() {
            warn!(
                "no cell with a matching neighbour found after {} attempts",
                self.max_tries
            );
        }
        found
    }

    /// Finds a cell whose kind satisfies `predicate`.
    pub fn find_cell_matching<M, R, P>(
        &self,
        map: &M,
        rng: &mut R,
        predicate: P,
    ) -> Option<Position>
    where
        M: TileMap + ?Sized,
        R: Rng + ?Sized,
        P: Fn(CellKind) -> bool,
    {
        let found = self.search(map.dimensions(), rng, |candidate| {
            map.kind_at(candidate).map_or(false, &predicate)
        });

        if found.is_none() {
            warn!("no matching cell found after {} attempts", self.max_tries);
        }
        found
    }

    fn search<R, F>(&self, dimensions: (u32, u32), rng: &mut R, mut accept: F) -> Option<Position>
    where
        R: Rng + ?Sized,
        F: FnMut(Position) -> bool,
    {
        let (width, height) = dimensions;
        if width == 0 || height == 0 {
            return None;
        }

        for _ in 0..self.max_tries {
            let candidate = sample(width, height, rng);
            if accept(candidate) {
                return Some(candidate);
            }
        }
        None
    }
}

fn sample<R>(width: u32, height: u32, rng: &mut R) -> Position
where
    R: Rng + ?Sized,
{
    let x = rng.gen_range(0..width);
    let y = rng.gen_range(0..height);
    Position::new(
        i32::try_from(x).unwrap_or(i32::MAX),
        i32::try_from(y).unwrap_or(i32::MAX),
    )
}
