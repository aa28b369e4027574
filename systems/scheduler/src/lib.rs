#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-interval step scheduler.
//!
//! Elapsed time is accumulated from [`Event::TimeAdvanced`] notifications and
//! converted into discrete steps. Each fired step consumes exactly one
//! interval from the accumulator, so any surplus carries over and the number
//! of steps fired for a total elapsed time `T` is always `floor(T / I)`.

use std::time::Duration;

use menagerie_core::Event;
use thiserror::Error;

/// Configuration parameters required to construct the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    step_interval: Duration,
}

impl Config {
    /// Creates a configuration that fires one step per `step_interval`.
    pub fn new(step_interval: Duration) -> Result<Self, ConfigError> {
        if step_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(Self { step_interval })
    }

    /// Simulated time covered by a single step.
    #[must_use]
    pub const fn step_interval(&self) -> Duration {
        self.step_interval
    }
}

/// Reasons a scheduler configuration is refused.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A zero interval would fire infinitely many steps per tick.
    #[error("step interval must be greater than zero")]
    ZeroInterval,
}

/// Lifecycle of the scheduler between ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for enough time to elapse.
    Idle,
    /// A movement pass is in progress and must be finished before another starts.
    Stepping,
}

/// Converts elapsed time into discrete step boundaries.
#[derive(Debug)]
pub struct StepScheduler {
    step_interval: Duration,
    accumulator: Duration,
    phase: Phase,
    fired: u64,
}

impl StepScheduler {
    /// Creates a new idle scheduler using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            step_interval: config.step_interval,
            accumulator: Duration::ZERO,
            phase: Phase::Idle,
            fired: 0,
        }
    }

    /// Consumes world events, banking every reported time advance.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                self.accumulate(*dt);
            }
        }
    }

    /// Adds `dt` to the pending time debt.
    pub fn accumulate(&mut self, dt: Duration) {
        self.accumulator = self.accumulator.saturating_add(dt);
    }

    /// Enters [`Phase::Stepping`] if at least one interval of time is banked.
    ///
    /// Returns `false` while idle with insufficient time, and while a previous
    /// step has not been finished yet.
    pub fn try_begin_step(&mut self) -> bool {
        if self.phase == Phase::Stepping {
            log::warn!("step requested while step {} is still running", self.fired);
            return false;
        }
        if self.accumulator < self.step_interval {
            return false;
        }

        self.accumulator -= self.step_interval;
        self.phase = Phase::Stepping;
        self.fired += 1;
        true
    }

    /// Returns to [`Phase::Idle`] after the movement pass completed.
    pub fn finish_step(&mut self) {
        debug_assert_eq!(self.phase, Phase::Stepping, "no step is running");
        self.phase = Phase::Idle;
    }

    /// Number of whole steps the banked time still owes, saturating at
    /// `u32::MAX`.
    #[must_use]
    pub fn pending_steps(&self) -> u32 {
        let steps = self.accumulator.as_nanos() / self.step_interval.as_nanos();
        u32::try_from(steps).unwrap_or(u32::MAX)
    }

    /// Time banked toward the next step.
    #[must_use]
    pub const fn accumulated(&self) -> Duration {
        self.accumulator
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Total number of steps fired since construction.
    #[must_use]
    pub const fn fired(&self) -> u64 {
        self.fired
    }

    /// Simulated time covered by a single step.
    #[must_use]
    pub const fn step_interval(&self) -> Duration {
        self.step_interval
    }
}
