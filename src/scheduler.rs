//! Deadline bookkeeping for the three session timers.
//!
//! Nothing here sleeps or reads the clock. The controller asks for the next
//! due timer, fires it at its own deadline and re-arms it, so a late
//! `advance` catches up deterministically.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::session::SESSION_SECS;

pub const CLOCK_PERIOD: Duration = Duration::from_millis(1000);
pub const EXPIRY_POLL: Duration = Duration::from_millis(100);

pub const SPAWN_BASE_MS: u64 = 1000;
pub const SPAWN_STEP_MS: u64 = 10;
pub const SPAWN_FLOOR_MS: u64 = 400;

pub const OPENING_SPAWNS: u32 = 3;
pub const OPENING_STAGGER: Duration = Duration::from_millis(300);

/// Spawn cadence for the given countdown value, never below the floor
pub fn spawn_period(time_left: u32) -> Duration {
    let elapsed = u64::from(SESSION_SECS.saturating_sub(time_left));
    let ms = SPAWN_BASE_MS
        .saturating_sub(elapsed * SPAWN_STEP_MS)
        .max(SPAWN_FLOOR_MS);
    Duration::from_millis(ms)
}

/// Declaration order is the tie-break when deadlines coincide
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimerKind {
    Expiry,
    Clock,
    OpeningSpawn,
    Spawn,
}

#[derive(Debug, Default)]
pub struct Schedule {
    clock: Option<Instant>,
    spawn: Option<Instant>,
    expiry: Option<Instant>,
    opening: VecDeque<Instant>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm every timer for a session starting at `now`
    pub fn arm(&mut self, now: Instant, time_left: u32) {
        self.clock = Some(now + CLOCK_PERIOD);
        self.spawn = Some(now + spawn_period(time_left));
        self.expiry = Some(now + EXPIRY_POLL);
        self.opening = (0..OPENING_SPAWNS)
            .map(|i| now + OPENING_STAGGER * i)
            .collect();
    }

    pub fn disarm(&mut self) {
        self.clock = None;
        self.spawn = None;
        self.expiry = None;
        self.opening.clear();
    }

    pub fn is_armed(&self) -> bool {
        self.clock.is_some()
            || self.spawn.is_some()
            || self.expiry.is_some()
            || !self.opening.is_empty()
    }

    pub fn next_due(&self) -> Option<(Instant, TimerKind)> {
        [
            self.expiry.map(|at| (at, TimerKind::Expiry)),
            self.clock.map(|at| (at, TimerKind::Clock)),
            self.opening
                .front()
                .map(|&at| (at, TimerKind::OpeningSpawn)),
            self.spawn.map(|at| (at, TimerKind::Spawn)),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Move a fired timer on to its next deadline
    pub fn rearm(&mut self, kind: TimerKind, fired_at: Instant, time_left: u32) {
        match kind {
            TimerKind::Expiry => self.expiry = Some(fired_at + EXPIRY_POLL),
            TimerKind::Clock => self.clock = Some(fired_at + CLOCK_PERIOD),
            TimerKind::OpeningSpawn => {
                self.opening.pop_front();
            }
            TimerKind::Spawn => self.spawn = Some(fired_at + spawn_period(time_left)),
        }
    }

    /// Restart the spawn interval after the countdown moved
    pub fn restart_spawn(&mut self, now: Instant, time_left: u32) {
        if self.spawn.is_some() {
            self.spawn = Some(now + spawn_period(time_left));
        }
    }

    pub fn spawn_due(&self) -> Option<Instant> {
        self.spawn
    }

    pub fn pending_opening_spawns(&self) -> usize {
        self.opening.len()
    }
}
