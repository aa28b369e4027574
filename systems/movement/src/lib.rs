#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that plans one hop per creature each step.
//!
//! Planning reads a frozen snapshot of the world: the creature view, the
//! terrain, and the occupancy as of the last committed step. Every hop of the
//! pass is collected into a single [`Command::CommitStep`], so no creature can
//! observe a hop chosen by another creature earlier in the same pass.

use menagerie_core::{
    Command, Coordinate, CreatureSnapshot, CreatureView, Event, HopPlan, OccupancyQuery,
    StepIndex, TerrainQuery,
};
use menagerie_system_pathfinding::{HopOutcome, PathSearch};

/// Pure system that reacts to step events and emits hop commits.
#[derive(Debug, Default)]
pub struct Movement {
    search: PathSearch,
}

impl Movement {
    /// Creates a movement system with empty search buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes world events and immutable views to emit movement commands.
    ///
    /// A commit is emitted only when the batch contains a step start; planning
    /// targets the most recent one.
    pub fn handle<T, O>(
        &mut self,
        events: &[Event],
        creatures: &CreatureView,
        terrain: &T,
        occupancy: &O,
        out: &mut Vec<Command>,
    ) where
        T: TerrainQuery + ?Sized,
        O: OccupancyQuery + ?Sized,
    {
        let Some(step) = events.iter().rev().find_map(|event| match event {
            Event::StepStarted { step } => Some(*step),
            _ => None,
        }) else {
            return;
        };

        let hops = self.plan_pass(step, creatures, terrain, occupancy);
        out.push(Command::CommitStep { step, hops });
    }

    /// Reports whether `creature` could reach `goal` through cells it may enter right now.
    pub fn can_reach<T, O>(
        &mut self,
        creature: &CreatureSnapshot,
        goal: Coordinate,
        terrain: &T,
        occupancy: &O,
    ) -> bool
    where
        T: TerrainQuery + ?Sized,
        O: OccupancyQuery + ?Sized,
    {
        self.search.can_reach(creature.position, goal, |cell| {
            is_enterable(creature, cell, terrain, occupancy)
        })
    }

    fn plan_pass<T, O>(
        &mut self,
        step: StepIndex,
        creatures: &CreatureView,
        terrain: &T,
        occupancy: &O,
    ) -> Vec<HopPlan>
    where
        T: TerrainQuery + ?Sized,
        O: OccupancyQuery + ?Sized,
    {
        let mut hops = Vec::with_capacity(creatures.len());
        for creature in creatures.iter() {
            let outcome = self.plan_hop(creature, terrain, occupancy);
            if outcome.is_stalled() {
                log::debug!(
                    "step {}: creature {} at {} stalled toward {:?} ({outcome:?})",
                    step.get(),
                    creature.id,
                    creature.position,
                    creature.goal
                );
            }
            hops.push(HopPlan {
                creature: creature.id,
                to: outcome.destination(creature.position),
            });
        }
        hops
    }

    fn plan_hop<T, O>(
        &mut self,
        creature: &CreatureSnapshot,
        terrain: &T,
        occupancy: &O,
    ) -> HopOutcome
    where
        T: TerrainQuery + ?Sized,
        O: OccupancyQuery + ?Sized,
    {
        self.search.plan(terrain, creature.position, creature.goal, |cell| {
            is_enterable(creature, cell, terrain, occupancy)
        })
    }
}

/// Strict validity: the cell is part of the grid, its terrain is allowed for
/// the creature, and no other creature holds it.
fn is_enterable<T, O>(
    creature: &CreatureSnapshot,
    cell: Coordinate,
    terrain: &T,
    occupancy: &O,
) -> bool
where
    T: TerrainQuery + ?Sized,
    O: OccupancyQuery + ?Sized,
{
    terrain
        .terrain_at(cell)
        .map_or(false, |kind| creature.allowed_terrain().contains(kind))
        && occupancy.is_free_for(cell, creature.id)
}
