#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless driver that owns the world and its systems and advances time
//! explicitly.
//!
//! Callers feed elapsed time into [`Simulation::advance`]; the driver turns it
//! into whole steps, runs the movement pass for each, and forwards every
//! resulting [`Event`] to the registered [`Observer`]s once the pass is
//! complete.

use std::{sync::mpsc::Sender, time::Duration};

use menagerie_core::{
    Command, Coordinate, CreatureId, CreatureSnapshot, CreatureView, Event, SpawnRejection,
    StepIndex,
};
use menagerie_system_movement::Movement;
use menagerie_system_scheduler::{Config, StepScheduler};
use menagerie_world::{self as world, query, World};

mod level;

pub use level::{CreaturePlacement, Level, LevelError};

/// Receives every event the simulation produces, in emission order.
pub trait Observer {
    /// Handles a single event.
    fn notify(&mut self, event: &Event);
}

impl<F> Observer for F
where
    F: FnMut(&Event),
{
    fn notify(&mut self, event: &Event) {
        self(event);
    }
}

impl Observer for Sender<Event> {
    fn notify(&mut self, event: &Event) {
        if self.send(event.clone()).is_err() {
            log::debug!("observer channel closed; dropping {event:?}");
        }
    }
}

/// Owns the world, the step scheduler and the movement system.
pub struct Simulation {
    world: World,
    scheduler: StepScheduler,
    movement: Movement,
    observers: Vec<Box<dyn Observer>>,
}

impl Simulation {
    /// Creates a simulation over an existing world.
    #[must_use]
    pub fn new(world: World, config: Config) -> Self {
        Self {
            world,
            scheduler: StepScheduler::new(config),
            movement: Movement::new(),
            observers: Vec::new(),
        }
    }

    /// Builds the world described by `level`, spawning its creatures and
    /// assigning their goals.
    pub fn from_level(level: &Level) -> Result<Self, LevelError> {
        let world = World::with_terrain(level.cells().iter().copied());
        let mut simulation = Self::new(world, level.config());

        for (index, placement) in level.creatures().iter().enumerate() {
            let creature = simulation.spawn(index, placement)?;
            if placement.goal.is_some() {
                simulation.set_goal(creature, placement.goal);
            }
        }

        Ok(simulation)
    }

    /// Registers an observer that receives every subsequent event.
    pub fn subscribe<O>(&mut self, observer: O)
    where
        O: Observer + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Applies an externally issued command and publishes its events.
    ///
    /// Step lifecycle commands are owned by the driver and are ignored here.
    pub fn submit(&mut self, command: Command) {
        if matches!(command, Command::BeginStep | Command::CommitStep { .. }) {
            log::warn!("ignoring externally submitted step command {command:?}");
            return;
        }

        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        self.scheduler.handle(&events);
        self.publish(&events);
    }

    /// Assigns or clears the goal of `creature`.
    pub fn set_goal(&mut self, creature: CreatureId, goal: Option<Coordinate>) {
        self.submit(Command::SetGoal { creature, goal });
    }

    /// Advances simulated time by `dt`, running every step that becomes due.
    ///
    /// Returns the number of steps that fired.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        self.submit(Command::Tick { dt });

        let mut fired = 0;
        while self.scheduler.try_begin_step() {
            self.run_pass();
            self.scheduler.finish_step();
            fired += 1;
        }
        fired
    }

    /// Advances time by exactly `steps` intervals.
    pub fn run_steps(&mut self, steps: u32) -> u32 {
        let interval = self.scheduler.step_interval();
        (0..steps).map(|_| self.advance(interval)).sum()
    }

    /// Reports whether `creature` could currently reach `goal` through cells
    /// it may enter. Unknown creatures cannot reach anything.
    pub fn can_reach(&mut self, creature: CreatureId, goal: Coordinate) -> bool {
        let Some(snapshot) = query::creature(&self.world, creature) else {
            return false;
        };
        let terrain = query::terrain(&self.world);
        let occupancy = query::occupancy(&self.world);
        self.movement.can_reach(&snapshot, goal, &terrain, &occupancy)
    }

    /// Read-only access to the world state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Snapshot of every creature.
    #[must_use]
    pub fn creatures(&self) -> CreatureView {
        query::creature_view(&self.world)
    }

    /// Snapshot of a single creature.
    #[must_use]
    pub fn creature(&self, creature: CreatureId) -> Option<CreatureSnapshot> {
        query::creature(&self.world, creature)
    }

    /// Index of the most recently started step.
    #[must_use]
    pub fn step(&self) -> StepIndex {
        query::step(&self.world)
    }

    /// Simulated time covered by a single step.
    #[must_use]
    pub fn step_interval(&self) -> Duration {
        self.scheduler.step_interval()
    }

    fn spawn(
        &mut self,
        index: usize,
        placement: &CreaturePlacement,
    ) -> Result<CreatureId, LevelError> {
        let CreaturePlacement { kind, at, .. } = *placement;
        query::can_spawn(&self.world, kind, at).map_err(|reason| {
            LevelError::CreatureRejected {
                index,
                kind,
                at,
                reason,
            }
        })?;

        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::SpawnCreature { kind, at },
            &mut events,
        );
        self.publish(&events);

        events
            .iter()
            .find_map(|event| match event {
                Event::CreatureSpawned { creature, .. } => Some(*creature),
                _ => None,
            })
            .ok_or(LevelError::CreatureRejected {
                index,
                kind,
                at,
                reason: SpawnRejection::Occupied,
            })
    }

    fn run_pass(&mut self) {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::BeginStep, &mut events);

        let mut commands = Vec::new();
        {
            let creatures = query::creature_view(&self.world);
            let terrain = query::terrain(&self.world);
            let occupancy = query::occupancy(&self.world);
            self.movement
                .handle(&events, &creatures, &terrain, &occupancy, &mut commands);
        }

        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }

        log::trace!(
            "step {} produced {} events",
            query::step(&self.world).get(),
            events.len()
        );
        self.publish(&events);
    }

    fn publish(&mut self, events: &[Event]) {
        for event in events {
            for observer in &mut self.observers {
                observer.notify(event);
            }
        }
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("world", &self.world)
            .field("scheduler", &self.scheduler)
            .field("observers", &self.observers.len())
            .finish()
    }
}
