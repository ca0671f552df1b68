use chrono::{DateTime, Local, TimeDelta};

use crate::core::cell::Cell;

/// Discrete simulation tick, one simulated second.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    derive_more::Display,
    derive_more::From,
    derive_more::FromStr,
    derive_more::Into,
    serde::Deserialize,
    serde::Serialize,
)]
#[serde(transparent)]
pub struct Tick(pub u64);

impl Tick {
    /// Number of ticks passed since the `earlier` one.
    #[must_use]
    pub const fn since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Tick counter and run state shared by all cells of a session.
#[must_use]
#[derive(Clone, Debug, Default)]
pub struct Clock {
    tick: Tick,
    is_running: bool,

    /// Wall-clock moment of the first start.
    started_at: Option<DateTime<Local>>,
}

impl Clock {
    pub fn start(&mut self, now: DateTime<Local>) {
        self.is_running = true;
        self.started_at.get_or_insert(now);
    }

    pub const fn pause(&mut self) {
        self.is_running = false;
    }

    /// Stop the clock, rewind it to zero and interrupt the active tasks of the cells.
    ///
    /// Queued tasks are kept.
    pub fn reset<'a>(&mut self, cells: impl IntoIterator<Item = &'a mut Cell>) {
        self.is_running = false;
        self.tick = Tick::default();
        self.started_at = None;
        for cell in cells {
            cell.interrupt();
        }
    }

    /// Move on to the next tick.
    pub const fn advance(&mut self) {
        self.tick = self.tick.next();
    }

    pub const fn tick(&self) -> Tick {
        self.tick
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.is_running
    }

    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    /// Wall-clock time since the first start.
    #[must_use]
    pub fn runtime(&self, now: DateTime<Local>) -> Option<TimeDelta> {
        self.started_at.map(|started_at| now - started_at)
    }
}
