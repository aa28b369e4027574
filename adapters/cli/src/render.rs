//! Plain-text presentation of the world and its events.

use std::{collections::HashMap, fmt::Write as _};

use menagerie_core::{Coordinate, CreatureKind, Event, TerrainQuery};
use menagerie_headless::Simulation;
use menagerie_world::query;

/// Renders the grid with every creature drawn at its pending position.
pub(crate) fn grid(simulation: &Simulation) -> String {
    let terrain = query::terrain(simulation.world());
    let Some((min, max)) = terrain.bounds() else {
        return String::new();
    };
    let creatures: HashMap<Coordinate, CreatureKind> = simulation
        .creatures()
        .iter()
        .map(|creature| (creature.next_position, creature.kind))
        .collect();

    let mut rendered = String::new();
    for z in (min.z()..=max.z()).rev() {
        for x in min.x()..=max.x() {
            let cell = Coordinate::new(x, z);
            let glyph = match creatures.get(&cell) {
                Some(kind) => creature_glyph(*kind),
                None => terrain.terrain_at(cell).map_or(' ', |kind| kind.glyph()),
            };
            rendered.push(glyph);
        }
        rendered.push('\n');
    }
    rendered
}

/// One-line human description of an event.
pub(crate) fn describe(event: &Event) -> String {
    let mut line = String::new();
    let _ = match event {
        Event::TimeAdvanced { dt } => write!(line, "time +{}ms", dt.as_millis()),
        Event::StepStarted { step } => write!(line, "step {} started", step.get()),
        Event::StepCompleted { step } => write!(line, "step {} completed", step.get()),
        Event::CreatureSpawned { creature, kind, at } => {
            write!(line, "{creature} {kind:?} spawned at {at}")
        }
        Event::SpawnRejected { kind, at, reason } => {
            write!(line, "{kind:?} not spawned at {at}: {reason:?}")
        }
        Event::CreatureDespawned { creature, at } => {
            write!(line, "{creature} despawned from {at}")
        }
        Event::GoalChanged {
            creature,
            goal: Some(goal),
        } => write!(line, "{creature} heading for {goal}"),
        Event::GoalChanged {
            creature,
            goal: None,
        } => write!(line, "{creature} goal cleared"),
        Event::TerrainChanged { at, terrain } => {
            write!(line, "{at} is now {terrain:?}")
        }
        Event::CreatureAdvanced {
            creature,
            from,
            to,
            facing,
        } => write!(line, "{creature} {from} -> {to} facing {facing:?}"),
        Event::CreatureStartedMoving { creature } => write!(line, "{creature} started moving"),
        Event::CreatureStoppedMoving { creature } => write!(line, "{creature} stopped"),
        Event::HopRejected {
            creature,
            to,
            reason,
        } => write!(line, "{creature} could not enter {to}: {reason:?}"),
    };
    line
}

const fn creature_glyph(kind: CreatureKind) -> char {
    match kind {
        CreatureKind::Crane => 'C',
        CreatureKind::Turtle => 't',
        CreatureKind::Horse => 'H',
        CreatureKind::Elephant => 'E',
        CreatureKind::Crab => 'x',
        CreatureKind::Wolf => 'W',
        CreatureKind::Flower => 'f',
        CreatureKind::Beaver => 'B',
        CreatureKind::Dolphin => 'D',
        CreatureKind::Alligator => 'A',
        CreatureKind::Lion => 'L',
        CreatureKind::Camel => 'M',
    }
}
