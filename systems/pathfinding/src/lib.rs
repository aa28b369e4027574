#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Breadth-first next-hop search used by creatures at the start of every step.
//!
//! A search always answers with a single coordinate: either one cardinal step
//! toward the goal or the start cell unchanged. When the goal cannot be reached
//! through cells the creature may enter right now, a second search that only
//! honours grid membership decides which way the creature should lean; the
//! lean is taken only if its first cell is itself enterable.

use std::collections::{HashMap, VecDeque};

use menagerie_core::{Coordinate, TerrainQuery};

/// Result of planning a single hop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HopOutcome {
    /// No goal is set, or the creature already stands on it.
    Idle,
    /// The goal is reachable; the hop is the first step of a shortest path.
    Direct(Coordinate),
    /// The goal is only reachable by ignoring terrain and occupancy, but the
    /// first step of that path is enterable.
    Leaning(Coordinate),
    /// The goal is only reachable by ignoring terrain and occupancy, and the
    /// first step of that path is not enterable this step.
    Blocked,
    /// The goal is not connected to the start at all.
    Unreachable,
}

impl HopOutcome {
    /// Cell the creature occupies after the hop.
    #[must_use]
    pub fn destination(self, start: Coordinate) -> Coordinate {
        match self {
            Self::Direct(next) | Self::Leaning(next) => next,
            Self::Idle | Self::Blocked | Self::Unreachable => start,
        }
    }

    /// Reports whether the outcome leaves the creature where it stands even
    /// though it has somewhere to go.
    #[must_use]
    pub fn is_stalled(self) -> bool {
        matches!(self, Self::Blocked | Self::Unreachable)
    }
}

/// Reusable breadth-first search workspace.
///
/// Parent links and the frontier are kept between calls so repeated searches
/// do not reallocate.
#[derive(Debug, Default)]
pub struct PathSearch {
    parents: HashMap<Coordinate, Coordinate>,
    frontier: VecDeque<Coordinate>,
}

impl PathSearch {
    /// Creates a search workspace with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plans the next hop from `start` toward `goal`.
    ///
    /// `is_valid` answers whether the creature may occupy a cell right now. The
    /// relaxed fallback search only consults `terrain` membership.
    pub fn plan<T, V>(
        &mut self,
        terrain: &T,
        start: Coordinate,
        goal: Option<Coordinate>,
        mut is_valid: V,
    ) -> HopOutcome
    where
        T: TerrainQuery + ?Sized,
        V: FnMut(Coordinate) -> bool,
    {
        let Some(goal) = goal else {
            return HopOutcome::Idle;
        };
        if goal == start {
            return HopOutcome::Idle;
        }

        if let Some(next) = self.first_step(start, goal, &mut is_valid) {
            return HopOutcome::Direct(next);
        }

        let mut contains = |cell: Coordinate| terrain.contains(cell);
        match self.first_step(start, goal, &mut contains) {
            Some(next) if is_valid(next) => HopOutcome::Leaning(next),
            Some(_) => HopOutcome::Blocked,
            None => HopOutcome::Unreachable,
        }
    }

    /// Plans the next hop and returns only the resulting cell.
    pub fn next_hop<T, V>(
        &mut self,
        terrain: &T,
        start: Coordinate,
        goal: Option<Coordinate>,
        is_valid: V,
    ) -> Coordinate
    where
        T: TerrainQuery + ?Sized,
        V: FnMut(Coordinate) -> bool,
    {
        self.plan(terrain, start, goal, is_valid).destination(start)
    }

    /// Reports whether `goal` can be reached from `start` through valid cells.
    pub fn can_reach<V>(&mut self, start: Coordinate, goal: Coordinate, mut is_valid: V) -> bool
    where
        V: FnMut(Coordinate) -> bool,
    {
        goal == start || self.search(start, goal, &mut is_valid)
    }

    fn first_step<P>(
        &mut self,
        start: Coordinate,
        goal: Coordinate,
        predicate: &mut P,
    ) -> Option<Coordinate>
    where
        P: FnMut(Coordinate) -> bool,
    {
        if !self.search(start, goal, predicate) {
            return None;
        }

        let mut next = goal;
        while let Some(&parent) = self.parents.get(&next) {
            if parent == start {
                debug_assert!(
                    next.is_adjacent(start),
                    "hop {next} is not a cardinal neighbour of {start}"
                );
                return Some(next);
            }
            next = parent;
        }
        None
    }

    /// Runs a breadth-first search, recording parent links, until `goal` is
    /// discovered or the frontier empties.
    ///
    /// Stopping on discovery rather than on dequeue does not change the parent
    /// recorded for `goal`: a cell is only ever linked to the node that first
    /// discovers it.
    fn search<P>(&mut self, start: Coordinate, goal: Coordinate, predicate: &mut P) -> bool
    where
        P: FnMut(Coordinate) -> bool,
    {
        self.parents.clear();
        self.frontier.clear();
        self.frontier.push_back(start);

        while let Some(current) = self.frontier.pop_front() {
            for neighbor in current.neighbors() {
                if neighbor == start || self.parents.contains_key(&neighbor) {
                    continue;
                }
                if !predicate(neighbor) {
                    continue;
                }

                let _ = self.parents.insert(neighbor, current);
                if neighbor == goal {
                    return true;
                }
                self.frontier.push_back(neighbor);
            }
        }

        false
    }
}
