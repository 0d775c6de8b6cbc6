#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bounded breadth-first reachability queries over a movement graph.
//!
//! The search answers "is this area at least `cap` cells large?" without
//! paying for a full flood fill: it stops as soon as the visited set reaches
//! the cap, so results above the cap are never reported.

use std::collections::{HashSet, VecDeque};

use gated_caves_core::{Position, WalkGraph};

/// Reusable breadth-first search workspace.
///
/// Keeping one analyzer around between queries reuses the visited set and
/// frontier allocations, which matters when a placement search probes many
/// candidates in a row.
#[derive(Clone, Debug, Default)]
pub struct ReachabilityAnalyzer {
    visited: HashSet<Position>,
    frontier: VecDeque<Position>,
    order: Vec<Position>,
}

impl ReachabilityAnalyzer {
    /// Creates an analyzer with empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts the distinct cells reachable from `start`, stopping at `cap`.
    ///
    /// Returns zero when `start` itself is not walkable. A walkable start
    /// always counts once, even when `cap` is zero.
    pub fn count<G>(&mut self, graph: &G, start: Position, cap: usize) -> usize
    where
        G: WalkGraph + ?Sized,
    {
        self.explore(graph, start, cap);
        self.order.len()
    }

    /// Cells reached by the most recent query, in discovery order.
    #[must_use]
    pub fn visited(&self) -> &[Position] {
        &self.order
    }

    fn explore<G>(&mut self, graph: &G, start: Position, cap: usize)
    where
        G: WalkGraph + ?Sized,
    {
        self.visited.clear();
        self.frontier.clear();
        self.order.clear();

        if !graph.is_walkable(start) {
            return;
        }

        self.mark(start);

        while self.order.len() < cap {
            let Some(current) = self.frontier.pop_front() else {
                break;
            };

            for neighbor in graph.neighbors(current) {
                if self.visited.contains(&neighbor) {
                    continue;
                }

                self.mark(neighbor);
                if self.order.len() >= cap {
                    break;
                }
            }
        }
    }

    fn mark(&mut self, position: Position) {
        if self.visited.insert(position) {
            self.order.push(position);
            self.frontier.push_back(position);
        }
    }
}

/// Counts the distinct cells reachable from `start`, stopping at `cap`.
///
/// Convenience wrapper around a throwaway [`ReachabilityAnalyzer`].
#[must_use]
pub fn count_reachable<G>(graph: &G, start: Position, cap: usize) -> usize
where
    G: WalkGraph + ?Sized,
{
    ReachabilityAnalyzer::new().count(graph, start, cap)
}

/// Cells reachable from `start` in discovery order, stopping at `cap`.
#[must_use]
pub fn reachable_positions<G>(graph: &G, start: Position, cap: usize) -> Vec<Position>
where
    G: WalkGraph + ?Sized,
{
    let mut analyzer = ReachabilityAnalyzer::new();
    let _ = analyzer.count(graph, start, cap);
    analyzer.order
}
