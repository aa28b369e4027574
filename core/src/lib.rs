#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Menagerie simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! observers to react to deterministically. Systems consume event streams,
//! query immutable snapshots, and respond exclusively with new command batches.

use std::{
    fmt,
    ops::{Add, Sub},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod creatures;

pub use creatures::{Ability, CreatureDefinition, CreatureKind, CreatureSpeed, SpeedRule};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Opens a new step, promoting every pending hop into the creature's position.
    BeginStep,
    /// Applies every hop planned during a movement pass in a single batch.
    CommitStep {
        /// Step the hops were planned for. Stale batches are ignored.
        step: StepIndex,
        /// Planned destinations, one per creature that was considered.
        hops: Vec<HopPlan>,
    },
    /// Requests that a creature of the provided kind be placed into the world.
    SpawnCreature {
        /// Archetype of the creature to create.
        kind: CreatureKind,
        /// Cell the creature should occupy.
        at: Coordinate,
    },
    /// Removes a creature from the world.
    DespawnCreature {
        /// Identifier of the creature to remove.
        creature: CreatureId,
    },
    /// Assigns or clears the goal a creature paths toward.
    SetGoal {
        /// Identifier of the creature being directed.
        creature: CreatureId,
        /// New goal, or `None` to stop the creature.
        goal: Option<Coordinate>,
    },
    /// Inserts a cell into the grid or changes the terrain of an existing one.
    SetTerrain {
        /// Cell being modified.
        at: Coordinate,
        /// Terrain the cell holds afterwards.
        terrain: TerrainKind,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a new step opened and movement should be planned.
    StepStarted {
        /// Index of the step that just began.
        step: StepIndex,
    },
    /// Announces that every creature was advanced for the step.
    StepCompleted {
        /// Index of the step that finished.
        step: StepIndex,
    },
    /// Confirms that a creature was placed into the world.
    CreatureSpawned {
        /// Identifier assigned to the creature.
        creature: CreatureId,
        /// Archetype of the creature.
        kind: CreatureKind,
        /// Cell the creature occupies.
        at: Coordinate,
    },
    /// Reports that a spawn request was refused.
    SpawnRejected {
        /// Archetype that was requested.
        kind: CreatureKind,
        /// Requested cell.
        at: Coordinate,
        /// Specific reason the spawn failed.
        reason: SpawnRejection,
    },
    /// Confirms that a creature left the world.
    CreatureDespawned {
        /// Identifier of the removed creature.
        creature: CreatureId,
        /// Cell the creature occupied when it was removed.
        at: Coordinate,
    },
    /// Confirms a goal assignment.
    GoalChanged {
        /// Identifier of the directed creature.
        creature: CreatureId,
        /// Goal now assigned to the creature.
        goal: Option<Coordinate>,
    },
    /// Confirms a terrain modification.
    TerrainChanged {
        /// Cell that changed.
        at: Coordinate,
        /// Terrain the cell now holds.
        terrain: TerrainKind,
    },
    /// Confirms that a creature committed to a hop for the current step.
    CreatureAdvanced {
        /// Identifier of the moving creature.
        creature: CreatureId,
        /// Cell the creature occupies during the step.
        from: Coordinate,
        /// Cell the creature will occupy once the next step begins.
        to: Coordinate,
        /// Direction the creature now faces.
        facing: Direction,
    },
    /// Edge-triggered notification fired when a stationary creature starts moving.
    CreatureStartedMoving {
        /// Identifier of the creature.
        creature: CreatureId,
    },
    /// Edge-triggered notification fired when a moving creature comes to rest.
    CreatureStoppedMoving {
        /// Identifier of the creature.
        creature: CreatureId,
    },
    /// Reports that a planned hop was refused during commit.
    HopRejected {
        /// Identifier of the creature whose hop was refused.
        creature: CreatureId,
        /// Destination that was requested.
        to: Coordinate,
        /// Specific reason the hop failed.
        reason: HopRejection,
    },
}

/// Location of a single grid cell. `z` grows "up", `x` grows "right".
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coordinate {
    x: i32,
    z: i32,
}

impl Coordinate {
    /// The origin offset.
    pub const ZERO: Self = Self::new(0, 0);

    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Horizontal component.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical component.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.z
    }

    /// Coordinate one cell away in the provided direction, or `None` when that
    /// cell lies beyond the addressable range.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<Self> {
        let offset = direction.offset();
        Some(Coordinate::new(
            self.x.checked_add(offset.x)?,
            self.z.checked_add(offset.z)?,
        ))
    }

    /// The cardinal neighbours in canonical search order. Neighbours past the
    /// edge of the coordinate range are skipped.
    pub fn neighbors(self) -> impl Iterator<Item = Coordinate> {
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| self.step(direction))
    }

    /// Computes the Manhattan distance between two coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: Coordinate) -> u32 {
        self.x.abs_diff(other.x) + self.z.abs_diff(other.z)
    }

    /// Reports whether `other` is exactly one cardinal step away.
    #[must_use]
    pub fn is_adjacent(self, other: Coordinate) -> bool {
        self.manhattan_distance(other) == 1
    }
}

impl Add for Coordinate {
    type Output = Coordinate;

    fn add(self, rhs: Self) -> Self::Output {
        Coordinate::new(self.x.wrapping_add(rhs.x), self.z.wrapping_add(rhs.z))
    }
}

impl Sub for Coordinate {
    type Output = Coordinate;

    fn sub(self, rhs: Self) -> Self::Output {
        Coordinate::new(self.x.wrapping_sub(rhs.x), self.z.wrapping_sub(rhs.z))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Cardinal movement directions. There is no diagonal adjacency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward increasing `z`.
    Up,
    /// Toward decreasing `z`.
    Down,
    /// Toward increasing `x`.
    Right,
    /// Toward decreasing `x`.
    Left,
}

impl Direction {
    /// All directions in the order searches expand them.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Right,
        Direction::Left,
    ];

    /// Unit offset of the direction.
    #[must_use]
    pub const fn offset(self) -> Coordinate {
        match self {
            Self::Up => Coordinate::new(0, 1),
            Self::Down => Coordinate::new(0, -1),
            Self::Right => Coordinate::new(1, 0),
            Self::Left => Coordinate::new(-1, 0),
        }
    }

    /// Yaw in degrees a presentation layer should rotate a model to face this way.
    #[must_use]
    pub const fn yaw_degrees(self) -> f32 {
        match self {
            Self::Up => -90.0,
            Self::Right => 0.0,
            Self::Down => 90.0,
            Self::Left => 180.0,
        }
    }
}

/// Raised when an offset that is not a unit cardinal step is used as a direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("offset {0} is not a cardinal direction")]
pub struct NotCardinal(pub Coordinate);

impl TryFrom<Coordinate> for Direction {
    type Error = NotCardinal;

    fn try_from(offset: Coordinate) -> Result<Self, Self::Error> {
        Direction::ALL
            .into_iter()
            .find(|direction| direction.offset() == offset)
            .ok_or(NotCardinal(offset))
    }
}

/// Terrain classification of a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TerrainKind {
    /// Open ground.
    Land,
    /// Open water.
    Water,
    /// Rocky ground.
    Rock,
    /// Forested ground.
    Tree,
}

impl TerrainKind {
    /// Every terrain classification.
    pub const ALL: [TerrainKind; 4] = [Self::Land, Self::Water, Self::Rock, Self::Tree];

    /// Single-character glyph used by level files and text renderings.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Land => '.',
            Self::Water => '~',
            Self::Rock => '^',
            Self::Tree => 'T',
        }
    }

    /// Parses a glyph produced by [`TerrainKind::glyph`].
    #[must_use]
    pub fn from_glyph(glyph: char) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.glyph() == glyph)
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Compact set of terrain classifications.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TerrainSet(u8);

impl TerrainSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Builds a set from a list of terrain kinds.
    #[must_use]
    pub const fn of(kinds: &[TerrainKind]) -> Self {
        let mut bits = 0;
        let mut index = 0;
        while index < kinds.len() {
            bits |= kinds[index].bit();
            index += 1;
        }
        Self(bits)
    }

    /// Reports whether the set includes `kind`.
    #[must_use]
    pub const fn contains(self, kind: TerrainKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Reports whether the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the members of the set in declaration order.
    pub fn iter(self) -> impl Iterator<Item = TerrainKind> {
        TerrainKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

/// Unique identifier assigned to a creature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CreatureId(u32);

impl CreatureId {
    /// Creates a new creature identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for CreatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic counter of fired simulation steps.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct StepIndex(u64);

impl StepIndex {
    /// Creates a step index with the provided value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the step.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// The index of the step that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Destination a creature should occupy once the next step begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopPlan {
    /// Creature the plan belongs to.
    pub creature: CreatureId,
    /// Planned destination. Equal to the current position when standing still.
    pub to: Coordinate,
}

/// Reasons a spawn request may be refused by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnRejection {
    /// The cell is not part of the grid.
    OutOfBounds,
    /// The creature may not stand on the cell's terrain.
    TerrainNotAllowed,
    /// Another creature already occupies the cell.
    Occupied,
}

/// Reasons a planned hop may be refused during commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HopRejection {
    /// The destination is not a cardinal neighbour of the creature.
    NotAdjacent,
    /// The destination is missing from the grid, disallowed, or occupied.
    Blocked,
    /// A creature with a lower identifier claimed the destination first.
    Contested,
}

/// Immutable representation of a single creature's state used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatureSnapshot {
    /// Unique identifier assigned to the creature.
    pub id: CreatureId,
    /// Archetype of the creature.
    pub kind: CreatureKind,
    /// Authoritative cell for logic and collision during the current step.
    pub position: Coordinate,
    /// Cell the creature will occupy when the next step begins.
    pub next_position: Coordinate,
    /// Cell the creature paths toward, if any.
    pub goal: Option<Coordinate>,
    /// Direction of the creature's most recent hop.
    pub facing: Option<Direction>,
    /// Whether the creature's most recent hop left its cell.
    pub moving: bool,
}

impl CreatureSnapshot {
    /// Terrain the creature is allowed to stand on.
    #[must_use]
    pub fn allowed_terrain(&self) -> TerrainSet {
        self.kind.definition().allowed_terrain
    }
}

/// Read-only snapshot describing every creature in the world.
#[derive(Clone, Debug, Default)]
pub struct CreatureView {
    snapshots: Vec<CreatureSnapshot>,
}

impl CreatureView {
    /// Creates a new creature view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<CreatureSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &CreatureSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a single creature.
    #[must_use]
    pub fn get(&self, creature: CreatureId) -> Option<&CreatureSnapshot> {
        self.snapshots
            .binary_search_by_key(&creature, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Number of creatures captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no creatures.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<CreatureSnapshot> {
        self.snapshots
    }
}

/// Answers which cells make up the world and what terrain each holds.
pub trait TerrainQuery {
    /// Terrain at the provided cell, or `None` when the cell is not part of the world.
    fn terrain_at(&self, at: Coordinate) -> Option<TerrainKind>;

    /// Reports whether the cell is part of the world.
    fn contains(&self, at: Coordinate) -> bool {
        self.terrain_at(at).is_some()
    }
}

/// Answers which creature, if any, holds a cell as of the last committed step.
pub trait OccupancyQuery {
    /// Creature occupying the provided cell, if any.
    fn creature_at(&self, at: Coordinate) -> Option<CreatureId>;

    /// Reports whether `creature` could stand on the cell without colliding.
    fn is_free_for(&self, at: Coordinate, creature: CreatureId) -> bool {
        self.creature_at(at).map_or(true, |occupant| occupant == creature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn neighbors_follow_search_order() {
        let origin = Coordinate::new(3, -2);
        let neighbors: Vec<_> = origin.neighbors().collect();
        assert_eq!(
            neighbors,
            vec![
                Coordinate::new(3, -1),
                Coordinate::new(3, -3),
                Coordinate::new(4, -2),
                Coordinate::new(2, -2),
            ]
        );
    }

    #[test]
    fn neighbors_stop_at_the_coordinate_range() {
        let corner = Coordinate::new(i32::MAX, i32::MIN);
        let neighbors: Vec<_> = corner.neighbors().collect();
        assert_eq!(
            neighbors,
            vec![
                Coordinate::new(i32::MAX, i32::MIN + 1),
                Coordinate::new(i32::MAX - 1, i32::MIN),
            ]
        );
        assert!(neighbors.iter().all(|&cell| corner.is_adjacent(cell)));
        assert_eq!(corner.step(Direction::Right), None);
        assert_eq!(corner.step(Direction::Down), None);
    }

    #[test]
    fn coordinate_arithmetic_is_component_wise() {
        let a = Coordinate::new(2, 5);
        let b = Coordinate::new(-1, 3);
        assert_eq!(a + b, Coordinate::new(1, 8));
        assert_eq!(a - b, Coordinate::new(3, 2));
        assert_eq!(a.manhattan_distance(b), 5);
        assert!(a.is_adjacent(Coordinate::new(2, 4)));
        assert!(!a.is_adjacent(Coordinate::new(3, 6)));
        assert!(!a.is_adjacent(a));
    }

    #[test]
    fn direction_round_trips_through_offsets() {
        for direction in Direction::ALL {
            assert_eq!(Direction::try_from(direction.offset()), Ok(direction));
        }
    }

    #[test]
    fn non_cardinal_offsets_are_rejected() {
        let diagonal = Coordinate::new(1, 1);
        assert_eq!(Direction::try_from(diagonal), Err(NotCardinal(diagonal)));
        assert_eq!(
            Direction::try_from(Coordinate::ZERO),
            Err(NotCardinal(Coordinate::ZERO))
        );
        assert_eq!(
            NotCardinal(diagonal).to_string(),
            "offset (1, 1) is not a cardinal direction"
        );
    }

    #[test]
    fn terrain_set_membership() {
        let set = TerrainSet::of(&[TerrainKind::Land, TerrainKind::Rock]);
        assert!(set.contains(TerrainKind::Land));
        assert!(set.contains(TerrainKind::Rock));
        assert!(!set.contains(TerrainKind::Water));
        assert!(TerrainSet::EMPTY.is_empty());
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![TerrainKind::Land, TerrainKind::Rock]
        );
    }

    #[test]
    fn terrain_glyphs_are_unique() {
        for kind in TerrainKind::ALL {
            assert_eq!(TerrainKind::from_glyph(kind.glyph()), Some(kind));
        }
        assert_eq!(TerrainKind::from_glyph('#'), None);
    }

    #[test]
    fn creature_view_is_sorted_and_searchable() {
        let snapshot = |id: u32| CreatureSnapshot {
            id: CreatureId::new(id),
            kind: CreatureKind::Crane,
            position: Coordinate::new(id as i32, 0),
            next_position: Coordinate::new(id as i32, 0),
            goal: None,
            facing: None,
            moving: false,
        };
        let view = CreatureView::from_snapshots(vec![snapshot(7), snapshot(2), snapshot(4)]);
        let ids: Vec<u32> = view.iter().map(|snapshot| snapshot.id.get()).collect();
        assert_eq!(ids, vec![2, 4, 7]);
        assert_eq!(
            view.get(CreatureId::new(4)).map(|snapshot| snapshot.position),
            Some(Coordinate::new(4, 0))
        );
        assert!(view.get(CreatureId::new(5)).is_none());
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn commit_command_round_trips_through_bincode() {
        assert_round_trip(&Command::CommitStep {
            step: StepIndex::new(9),
            hops: vec![HopPlan {
                creature: CreatureId::new(3),
                to: Coordinate::new(-4, 12),
            }],
        });
    }
}
