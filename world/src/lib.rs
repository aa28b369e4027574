#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Menagerie.
//!
//! The world owns the terrain grid, the creature roster and the step counter.
//! It is only ever mutated through [`apply`]; systems observe it through the
//! read-only views in [`query`]. Each creature carries two positions: the
//! committed `position` used for collision during the current step, and the
//! pending `next_position` it will occupy once the following step begins.

use std::collections::{HashMap, HashSet};

use menagerie_core::{
    Command, Coordinate, CreatureId, CreatureKind, CreatureSnapshot, Direction, Event, HopPlan,
    HopRejection, SpawnRejection, StepIndex, TerrainKind,
};

mod terrain;

use terrain::TerrainMap;

/// Represents the authoritative Menagerie world state.
#[derive(Debug, Default)]
pub struct World {
    terrain: TerrainMap,
    creatures: Vec<Creature>,
    occupancy: OccupancyIndex,
    next_creature_id: u32,
    step: StepIndex,
}

impl World {
    /// Creates an empty world with no cells and no creatures.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a world whose grid consists of the provided cells.
    #[must_use]
    pub fn with_terrain<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = (Coordinate, TerrainKind)>,
    {
        Self {
            terrain: TerrainMap::from_cells(cells),
            ..Self::default()
        }
    }

    fn creature_index(&self, creature: CreatureId) -> Option<usize> {
        self.creatures
            .binary_search_by_key(&creature, |entry| entry.id)
            .ok()
    }

    fn spawn_rejection(&self, kind: CreatureKind, at: Coordinate) -> Option<SpawnRejection> {
        let Some(terrain) = self.terrain.get(at) else {
            return Some(SpawnRejection::OutOfBounds);
        };
        if !kind.definition().allowed_terrain.contains(terrain) {
            return Some(SpawnRejection::TerrainNotAllowed);
        }
        let claimed = self.occupancy.occupant(at).is_some()
            || self
                .creatures
                .iter()
                .any(|creature| creature.next_position == at);
        claimed.then_some(SpawnRejection::Occupied)
    }

    fn begin_step(&mut self, out_events: &mut Vec<Event>) {
        for creature in &mut self.creatures {
            creature.position = creature.next_position;
        }
        self.occupancy.fill_with(&self.creatures);
        self.step = self.step.next();
        log::trace!("step {} started", self.step.get());
        out_events.push(Event::StepStarted { step: self.step });
    }

    fn commit_step(
        &mut self,
        step: StepIndex,
        mut hops: Vec<HopPlan>,
        out_events: &mut Vec<Event>,
    ) {
        if step != self.step {
            log::warn!(
                "ignoring hops planned for step {} during step {}",
                step.get(),
                self.step.get()
            );
            return;
        }

        hops.sort_by_key(|hop| hop.creature);
        hops.dedup_by_key(|hop| hop.creature);

        let mut claimed: HashSet<Coordinate> = HashSet::new();
        for hop in hops {
            let Some(index) = self.creature_index(hop.creature) else {
                continue;
            };

            let verdict = self.judge_hop(&self.creatures[index], hop.to, &claimed);
            let creature = &mut self.creatures[index];
            match verdict {
                HopVerdict::Stay => creature.settle(out_events),
                HopVerdict::Reject(reason) => {
                    log::debug!(
                        "creature {} hop to {} rejected: {reason:?}",
                        creature.id,
                        hop.to
                    );
                    out_events.push(Event::HopRejected {
                        creature: creature.id,
                        to: hop.to,
                        reason,
                    });
                    creature.settle(out_events);
                }
                HopVerdict::Advance(direction) => {
                    let _ = claimed.insert(hop.to);
                    creature.advance(hop.to, direction, out_events);
                }
            }
        }

        out_events.push(Event::StepCompleted { step });
    }

    fn judge_hop(
        &self,
        creature: &Creature,
        to: Coordinate,
        claimed: &HashSet<Coordinate>,
    ) -> HopVerdict {
        if to == creature.position {
            return HopVerdict::Stay;
        }
        if !creature.position.is_adjacent(to) {
            return HopVerdict::Reject(HopRejection::NotAdjacent);
        }
        let Ok(direction) = Direction::try_from(to - creature.position) else {
            return HopVerdict::Reject(HopRejection::NotAdjacent);
        };

        let allowed = creature.kind.definition().allowed_terrain;
        let enterable = self
            .terrain
            .get(to)
            .map_or(false, |terrain| allowed.contains(terrain))
            && self.occupancy.is_free_for(to, creature.id);
        if !enterable {
            return HopVerdict::Reject(HopRejection::Blocked);
        }
        if claimed.contains(&to) {
            return HopVerdict::Reject(HopRejection::Contested);
        }

        HopVerdict::Advance(direction)
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::BeginStep => world.begin_step(out_events),
        Command::CommitStep { step, hops } => world.commit_step(step, hops, out_events),
        Command::SpawnCreature { kind, at } => {
            if let Some(reason) = world.spawn_rejection(kind, at) {
                log::debug!("spawn of {kind:?} at {at} rejected: {reason:?}");
                out_events.push(Event::SpawnRejected { kind, at, reason });
                return;
            }

            let creature = CreatureId::new(world.next_creature_id);
            world.next_creature_id = world.next_creature_id.saturating_add(1);
            world.creatures.push(Creature::spawn(creature, kind, at));
            world.occupancy.occupy(creature, at);
            out_events.push(Event::CreatureSpawned { creature, kind, at });
        }
        Command::DespawnCreature { creature } => {
            let Some(index) = world.creature_index(creature) else {
                return;
            };
            let removed = world.creatures.remove(index);
            world.occupancy.vacate(removed.position, removed.id);
            out_events.push(Event::CreatureDespawned {
                creature,
                at: removed.position,
            });
        }
        Command::SetGoal { creature, goal } => {
            let Some(index) = world.creature_index(creature) else {
                return;
            };
            world.creatures[index].goal = goal;
            out_events.push(Event::GoalChanged { creature, goal });
        }
        Command::SetTerrain { at, terrain } => {
            if world.terrain.set(at, terrain) != Some(terrain) {
                out_events.push(Event::TerrainChanged { at, terrain });
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use menagerie_core::{
        Coordinate, CreatureId, CreatureKind, CreatureSnapshot, CreatureView, OccupancyQuery,
        SpawnRejection, StepIndex, TerrainKind, TerrainQuery,
    };

    use super::{OccupancyIndex, TerrainMap, World};

    /// Index of the most recently started step.
    #[must_use]
    pub fn step(world: &World) -> StepIndex {
        world.step
    }

    /// Exposes a read-only view of the terrain grid.
    #[must_use]
    pub fn terrain(world: &World) -> TerrainView<'_> {
        TerrainView {
            map: &world.terrain,
        }
    }

    /// Exposes a read-only view of committed creature positions.
    #[must_use]
    pub fn occupancy(world: &World) -> OccupancyView<'_> {
        OccupancyView {
            index: &world.occupancy,
        }
    }

    /// Captures a read-only view of every creature in the world.
    #[must_use]
    pub fn creature_view(world: &World) -> CreatureView {
        CreatureView::from_snapshots(world.creatures.iter().map(|c| c.snapshot()).collect())
    }

    /// Captures a single creature, if it exists.
    #[must_use]
    pub fn creature(world: &World, creature: CreatureId) -> Option<CreatureSnapshot> {
        world
            .creature_index(creature)
            .map(|index| world.creatures[index].snapshot())
    }

    /// Reports whether a creature of `kind` could be spawned at `at` right now.
    pub fn can_spawn(
        world: &World,
        kind: CreatureKind,
        at: Coordinate,
    ) -> Result<(), SpawnRejection> {
        world.spawn_rejection(kind, at).map_or(Ok(()), Err)
    }

    /// Read-only view into the terrain grid.
    #[derive(Clone, Copy, Debug)]
    pub struct TerrainView<'a> {
        map: &'a TerrainMap,
    }

    impl<'a> TerrainView<'a> {
        /// Number of cells making up the world.
        #[must_use]
        pub fn len(&self) -> usize {
            self.map.len()
        }

        /// Reports whether the world has no cells.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.map.len() == 0
        }

        /// Iterates every cell and its terrain in unspecified order.
        pub fn iter(&self) -> impl Iterator<Item = (Coordinate, TerrainKind)> + 'a {
            self.map.iter()
        }

        /// Smallest rectangle enclosing every cell, as `(min, max)` corners.
        #[must_use]
        pub fn bounds(&self) -> Option<(Coordinate, Coordinate)> {
            self.map.bounds()
        }
    }

    impl TerrainQuery for TerrainView<'_> {
        fn terrain_at(&self, at: Coordinate) -> Option<TerrainKind> {
            self.map.get(at)
        }
    }

    /// Read-only view into committed creature positions.
    #[derive(Clone, Copy, Debug)]
    pub struct OccupancyView<'a> {
        index: &'a OccupancyIndex,
    }

    impl OccupancyQuery for OccupancyView<'_> {
        fn creature_at(&self, at: Coordinate) -> Option<CreatureId> {
            self.index.occupant(at)
        }
    }
}

#[derive(Clone, Debug)]
struct Creature {
    id: CreatureId,
    kind: CreatureKind,
    position: Coordinate,
    next_position: Coordinate,
    goal: Option<Coordinate>,
    facing: Option<Direction>,
    moving: bool,
}

impl Creature {
    fn spawn(id: CreatureId, kind: CreatureKind, at: Coordinate) -> Self {
        Self {
            id,
            kind,
            position: at,
            next_position: at,
            goal: None,
            facing: None,
            moving: false,
        }
    }

    fn snapshot(&self) -> CreatureSnapshot {
        CreatureSnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            next_position: self.next_position,
            goal: self.goal,
            facing: self.facing,
            moving: self.moving,
        }
    }

    fn advance(&mut self, to: Coordinate, direction: Direction, out_events: &mut Vec<Event>) {
        self.next_position = to;
        self.facing = Some(direction);
        out_events.push(Event::CreatureAdvanced {
            creature: self.id,
            from: self.position,
            to,
            facing: direction,
        });
        if !self.moving {
            self.moving = true;
            out_events.push(Event::CreatureStartedMoving { creature: self.id });
        }
    }

    fn settle(&mut self, out_events: &mut Vec<Event>) {
        self.next_position = self.position;
        if self.moving {
            self.moving = false;
            out_events.push(Event::CreatureStoppedMoving { creature: self.id });
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HopVerdict {
    Stay,
    Reject(HopRejection),
    Advance(Direction),
}

/// Committed creature positions keyed by cell.
#[derive(Clone, Debug, Default)]
struct OccupancyIndex {
    cells: HashMap<Coordinate, CreatureId>,
}

impl OccupancyIndex {
    fn fill_with(&mut self, creatures: &[Creature]) {
        self.cells.clear();
        for creature in creatures {
            self.occupy(creature.id, creature.position);
        }
    }

    fn occupant(&self, at: Coordinate) -> Option<CreatureId> {
        self.cells.get(&at).copied()
    }

    fn is_free_for(&self, at: Coordinate, creature: CreatureId) -> bool {
        self.occupant(at).map_or(true, |occupant| occupant == creature)
    }

    fn occupy(&mut self, creature: CreatureId, at: Coordinate) {
        let _ = self.cells.insert(at, creature);
    }

    fn vacate(&mut self, at: Coordinate, creature: CreatureId) {
        if self.occupant(at) == Some(creature) {
            let _ = self.cells.remove(&at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use menagerie_core::{OccupancyQuery, TerrainQuery};

    fn land(width: i32, height: i32) -> World {
        World::with_terrain(
            (0..width)
                .flat_map(|x| (0..height).map(move |z| (Coordinate::new(x, z), TerrainKind::Land))),
        )
    }

    fn spawn(world: &mut World, kind: CreatureKind, at: Coordinate) -> CreatureId {
        let mut events = Vec::new();
        apply(world, Command::SpawnCreature { kind, at }, &mut events);
        match events.as_slice() {
            [Event::CreatureSpawned { creature, .. }] => *creature,
            other => panic!("unexpected spawn events: {other:?}"),
        }
    }

    #[test]
    fn spawn_rejections_cover_bounds_terrain_and_occupancy() {
        let mut world = land(3, 3);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetTerrain {
                at: Coordinate::new(2, 2),
                terrain: TerrainKind::Water,
            },
            &mut events,
        );
        let _ = spawn(&mut world, CreatureKind::Horse, Coordinate::new(0, 0));

        assert_eq!(
            query::can_spawn(&world, CreatureKind::Horse, Coordinate::new(5, 5)),
            Err(SpawnRejection::OutOfBounds)
        );
        assert_eq!(
            query::can_spawn(&world, CreatureKind::Horse, Coordinate::new(2, 2)),
            Err(SpawnRejection::TerrainNotAllowed)
        );
        assert_eq!(
            query::can_spawn(&world, CreatureKind::Crane, Coordinate::new(0, 0)),
            Err(SpawnRejection::Occupied)
        );
        assert_eq!(
            query::can_spawn(&world, CreatureKind::Crane, Coordinate::new(2, 2)),
            Ok(())
        );
    }

    #[test]
    fn identifiers_are_allocated_monotonically() {
        let mut world = land(3, 1);
        let first = spawn(&mut world, CreatureKind::Crane, Coordinate::new(0, 0));
        let second = spawn(&mut world, CreatureKind::Crane, Coordinate::new(1, 0));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::DespawnCreature { creature: first },
            &mut events,
        );
        let third = spawn(&mut world, CreatureKind::Crane, Coordinate::new(0, 0));

        assert!(first < second && second < third);
    }

    #[test]
    fn despawn_releases_occupancy_immediately() {
        let mut world = land(2, 1);
        let creature = spawn(&mut world, CreatureKind::Crane, Coordinate::new(0, 0));
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::DespawnCreature { creature },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::CreatureDespawned {
                creature,
                at: Coordinate::new(0, 0),
            }]
        );
        assert_eq!(
            query::occupancy(&world).creature_at(Coordinate::new(0, 0)),
            None
        );
        assert!(query::creature(&world, creature).is_none());
    }

    #[test]
    fn begin_step_promotes_pending_hops() {
        let mut world = land(3, 1);
        let creature = spawn(&mut world, CreatureKind::Crane, Coordinate::new(0, 0));
        let mut events = Vec::new();

        apply(&mut world, Command::BeginStep, &mut events);
        apply(
            &mut world,
            Command::CommitStep {
                step: StepIndex::new(1),
                hops: vec![HopPlan {
                    creature,
                    to: Coordinate::new(1, 0),
                }],
            },
            &mut events,
        );
        let snapshot = query::creature(&world, creature).expect("creature exists");
        assert_eq!(snapshot.position, Coordinate::new(0, 0));
        assert_eq!(snapshot.next_position, Coordinate::new(1, 0));
        assert_eq!(snapshot.facing, Some(Direction::Right));

        apply(&mut world, Command::BeginStep, &mut events);
        let snapshot = query::creature(&world, creature).expect("creature exists");
        assert_eq!(snapshot.position, Coordinate::new(1, 0));
        assert_eq!(
            query::occupancy(&world).creature_at(Coordinate::new(1, 0)),
            Some(creature)
        );
        assert_eq!(query::step(&world), StepIndex::new(2));
    }

    #[test]
    fn contested_cell_goes_to_lowest_identifier() {
        let mut world = land(3, 1);
        let left = spawn(&mut world, CreatureKind::Crane, Coordinate::new(0, 0));
        let right = spawn(&mut world, CreatureKind::Crane, Coordinate::new(2, 0));
        let middle = Coordinate::new(1, 0);
        let mut events = Vec::new();
        apply(&mut world, Command::BeginStep, &mut events);
        events.clear();

        apply(
            &mut world,
            Command::CommitStep {
                step: StepIndex::new(1),
                hops: vec![
                    HopPlan {
                        creature: right,
                        to: middle,
                    },
                    HopPlan {
                        creature: left,
                        to: middle,
                    },
                ],
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::CreatureAdvanced {
                    creature: left,
                    from: Coordinate::new(0, 0),
                    to: middle,
                    facing: Direction::Right,
                },
                Event::CreatureStartedMoving { creature: left },
                Event::HopRejected {
                    creature: right,
                    to: middle,
                    reason: HopRejection::Contested,
                },
                Event::StepCompleted {
                    step: StepIndex::new(1),
                },
            ]
        );
        let right_snapshot = query::creature(&world, right).expect("creature exists");
        assert_eq!(right_snapshot.next_position, Coordinate::new(2, 0));
    }

    #[test]
    fn only_the_first_hop_per_creature_counts() {
        let mut world = land(3, 1);
        let creature = spawn(&mut world, CreatureKind::Crane, Coordinate::new(1, 0));
        let mut events = Vec::new();
        apply(&mut world, Command::BeginStep, &mut events);
        events.clear();

        apply(
            &mut world,
            Command::CommitStep {
                step: StepIndex::new(1),
                hops: vec![
                    HopPlan {
                        creature,
                        to: Coordinate::new(2, 0),
                    },
                    HopPlan {
                        creature,
                        to: Coordinate::new(0, 0),
                    },
                ],
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::CreatureAdvanced {
                    creature,
                    from: Coordinate::new(1, 0),
                    to: Coordinate::new(2, 0),
                    facing: Direction::Right,
                },
                Event::CreatureStartedMoving { creature },
                Event::StepCompleted {
                    step: StepIndex::new(1),
                },
            ]
        );
    }

    #[test]
    fn hops_never_wrap_around_the_coordinate_range() {
        let edge = Coordinate::new(i32::MAX, 0);
        let wrapped = Coordinate::new(i32::MIN, 0);
        let mut world =
            World::with_terrain([(edge, TerrainKind::Land), (wrapped, TerrainKind::Land)]);
        let creature = spawn(&mut world, CreatureKind::Crane, edge);
        let mut events = Vec::new();
        apply(&mut world, Command::BeginStep, &mut events);
        events.clear();

        apply(
            &mut world,
            Command::CommitStep {
                step: StepIndex::new(1),
                hops: vec![HopPlan {
                    creature,
                    to: wrapped,
                }],
            },
            &mut events,
        );

        assert!(events.contains(&Event::HopRejected {
            creature,
            to: wrapped,
            reason: HopRejection::NotAdjacent,
        }));
        assert_eq!(
            query::creature(&world, creature).map(|snapshot| snapshot.next_position),
            Some(edge)
        );
    }

    #[test]
    fn invalid_hops_are_rejected() {
        let mut world = land(3, 3);
        let walker = spawn(&mut world, CreatureKind::Elephant, Coordinate::new(1, 1));
        let _ = spawn(&mut world, CreatureKind::Crane, Coordinate::new(1, 2));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetTerrain {
                at: Coordinate::new(2, 1),
                terrain: TerrainKind::Tree,
            },
            &mut events,
        );
        apply(&mut world, Command::BeginStep, &mut events);

        let verdict = |world: &World, to| {
            let creature = &world.creatures[world.creature_index(walker).expect("walker")];
            world.judge_hop(creature, to, &HashSet::new())
        };

        assert_eq!(
            verdict(&world, Coordinate::new(2, 2)),
            HopVerdict::Reject(HopRejection::NotAdjacent)
        );
        assert_eq!(
            verdict(&world, Coordinate::new(1, 2)),
            HopVerdict::Reject(HopRejection::Blocked)
        );
        assert_eq!(
            verdict(&world, Coordinate::new(2, 1)),
            HopVerdict::Reject(HopRejection::Blocked)
        );
        assert_eq!(
            verdict(&world, Coordinate::new(1, 0)),
            HopVerdict::Advance(Direction::Down)
        );
        assert_eq!(verdict(&world, Coordinate::new(1, 1)), HopVerdict::Stay);
    }

    #[test]
    fn stale_commits_are_ignored() {
        let mut world = land(2, 1);
        let creature = spawn(&mut world, CreatureKind::Crane, Coordinate::new(0, 0));
        let mut events = Vec::new();
        apply(&mut world, Command::BeginStep, &mut events);
        apply(&mut world, Command::BeginStep, &mut events);
        events.clear();

        apply(
            &mut world,
            Command::CommitStep {
                step: StepIndex::new(1),
                hops: vec![HopPlan {
                    creature,
                    to: Coordinate::new(1, 0),
                }],
            },
            &mut events,
        );

        assert!(events.is_empty());
        assert_eq!(
            query::creature(&world, creature).map(|snapshot| snapshot.next_position),
            Some(Coordinate::new(0, 0))
        );
    }

    #[test]
    fn stopping_is_edge_triggered() {
        let mut world = land(3, 1);
        let creature = spawn(&mut world, CreatureKind::Crane, Coordinate::new(0, 0));
        let mut events = Vec::new();
        let run_step = |world: &mut World, to: Coordinate, events: &mut Vec<Event>| {
            events.clear();
            apply(world, Command::BeginStep, events);
            let step = query::step(world);
            apply(
                world,
                Command::CommitStep {
                    step,
                    hops: vec![HopPlan { creature, to }],
                },
                events,
            );
        };

        run_step(&mut world, Coordinate::new(1, 0), &mut events);
        assert!(events.contains(&Event::CreatureStartedMoving { creature }));

        run_step(&mut world, Coordinate::new(2, 0), &mut events);
        assert!(!events.contains(&Event::CreatureStartedMoving { creature }));

        run_step(&mut world, Coordinate::new(2, 0), &mut events);
        assert!(events.contains(&Event::CreatureStoppedMoving { creature }));

        run_step(&mut world, Coordinate::new(2, 0), &mut events);
        assert!(!events.contains(&Event::CreatureStoppedMoving { creature }));
    }

    #[test]
    fn terrain_view_answers_membership() {
        let world = land(2, 2);
        let terrain = query::terrain(&world);
        assert!(terrain.contains(Coordinate::new(1, 1)));
        assert!(!terrain.contains(Coordinate::new(2, 1)));
        assert_eq!(terrain.len(), 4);
        assert!(!terrain.is_empty());
    }
}
