use std::{
    cell::RefCell,
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    rc::Rc,
    time::Duration,
};

use menagerie_core::{Coordinate, Event};
use menagerie_headless::{Level, Simulation};

const CROSSING: &str = r#"
    [simulation]
    step_interval_ms = 100

    [terrain]
    rows = [
        "........",
        "..~~~...",
        "..~^T...",
        "........",
    ]

    [[creatures]]
    kind = "crane"
    at = [0, 0]
    goal = [7, 3]

    [[creatures]]
    kind = "horse"
    at = [7, 3]
    goal = [0, 0]

    [[creatures]]
    kind = "turtle"
    at = [1, 3]
    goal = [3, 2]

    [[creatures]]
    kind = "elephant"
    at = [6, 0]
    goal = [0, 1]
"#;

#[test]
fn replay_is_identical_across_runs() {
    let deliveries = vec![Duration::from_millis(100); 16];
    let first = replay(&deliveries);
    let second = replay(&deliveries);

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[test]
fn replay_does_not_depend_on_tick_granularity() {
    let even = replay(&vec![Duration::from_millis(100); 16]);
    let ragged: Vec<Duration> = [30, 250, 5, 415, 100, 0, 600, 200]
        .into_iter()
        .map(Duration::from_millis)
        .collect();
    assert_eq!(ragged.iter().sum::<Duration>(), Duration::from_millis(1_600));
    let uneven = replay(&ragged);

    assert_eq!(even.steps, 16);
    assert_eq!(even.without_time(), uneven.without_time());
}

#[test]
fn every_creature_reaches_its_goal() {
    let outcome = replay(&[Duration::from_millis(1_600)]);

    assert_eq!(
        outcome.positions,
        vec![
            Coordinate::new(7, 3),
            Coordinate::new(0, 0),
            Coordinate::new(3, 2),
            Coordinate::new(0, 1),
        ]
    );
    assert!(
        !outcome
            .events
            .iter()
            .any(|event| matches!(event, Event::HopRejected { .. })),
        "hops planned against committed positions should all commit"
    );
}

fn replay(deliveries: &[Duration]) -> ReplayOutcome {
    let level = Level::parse(CROSSING).expect("level parses");
    let mut simulation = Simulation::from_level(&level).expect("level instantiates");
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    simulation.subscribe(move |event: &Event| sink.borrow_mut().push(event.clone()));

    let steps = deliveries
        .iter()
        .map(|dt| simulation.advance(*dt))
        .sum();

    let positions = simulation
        .creatures()
        .iter()
        .map(|creature| creature.next_position)
        .collect();
    let events = log.borrow().clone();

    ReplayOutcome {
        steps,
        positions,
        events,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    steps: u32,
    positions: Vec<Coordinate>,
    events: Vec<Event>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    fn without_time(&self) -> Vec<Event> {
        self.events
            .iter()
            .filter(|event| !matches!(event, Event::TimeAdvanced { .. }))
            .cloned()
            .collect()
    }
}
