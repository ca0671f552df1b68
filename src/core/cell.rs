use std::{
    collections::VecDeque,
    fmt::{Display, Formatter},
};

use bon::bon;
use rand::Rng;

use crate::{
    core::{
        chemistry::Chemistry,
        clock::Tick,
        task::{Task, TaskKind},
    },
    quantity::{
        current::Amperes,
        proportions::Percent,
        temperature::Celsius,
        voltage::Volts,
    },
};

#[derive(
    Clone,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    derive_more::Display,
    derive_more::From,
    serde::Deserialize,
    serde::Serialize,
)]
#[serde(transparent)]
pub struct CellId(String);

impl AsRef<str> for CellId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CellId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Idle,
    Charging,
    Discharging,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Charging => write!(f, "charging"),
            Self::Discharging => write!(f, "discharging"),
        }
    }
}

/// Simulator state derived from the current task.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    /// No current task.
    Idle,

    Charging,
    Discharging,

    /// Rest task: electrically idle, but still progressing through the queue.
    Resting,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Charging => write!(f, "Charging"),
            Self::Discharging => write!(f, "Discharging"),
            Self::Resting => write!(f, "Resting"),
        }
    }
}

/// Progress of the queue head.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
enum TaskState {
    /// No current task, the queue head (if any) has not been picked up yet.
    #[default]
    Inactive,

    /// The queue head is the current task, but it has not run a single tick.
    Pending,

    Running { started_at: Tick },
}

/// Simulated battery cell.
#[must_use]
#[derive(Clone, Debug)]
pub struct Cell {
    pub id: CellId,
    pub chemistry: Chemistry,
    pub voltage: Volts,

    /// Positive while charging, negative while discharging.
    pub current: Amperes,

    pub temperature: Celsius,

    /// State-of-charge proxy, `0..=100`.
    pub capacity: Percent,

    pub status: Status,

    min_voltage: Volts,
    max_voltage: Volts,
    queue: VecDeque<Task>,
    state: TaskState,
}

#[bon]
impl Cell {
    /// Cell with explicit initial parameters, unspecified ones fall back to the chemistry nominals.
    #[builder]
    pub fn with_state(
        #[builder(start_fn)] id: CellId,
        #[builder(start_fn)] chemistry: Chemistry,
        voltage: Option<Volts>,
        temperature: Option<Celsius>,
        capacity: Option<Percent>,
    ) -> Self {
        let profile = chemistry.voltage_profile();
        Self {
            id,
            chemistry,
            voltage: voltage.unwrap_or(profile.nominal),
            current: Amperes::ZERO,
            temperature: temperature.unwrap_or(Celsius(25.0)),
            capacity: capacity.unwrap_or(Percent::FULL),
            status: Status::Idle,
            min_voltage: profile.min,
            max_voltage: profile.max,
            queue: VecDeque::new(),
            state: TaskState::Inactive,
        }
    }
}

impl Cell {
    /// Fresh idle cell with the chemistry's nominal voltage and randomized parameters.
    pub fn create(id: CellId, chemistry: Chemistry, rng: &mut impl Rng) -> Self {
        let mut cell = Self::with_state(id, chemistry).call();
        cell.randomize(rng);
        cell
    }

    /// Re-roll the voltage, temperature and capacity around the chemistry nominals.
    pub fn randomize(&mut self, rng: &mut impl Rng) {
        self.voltage = self.chemistry.voltage_profile().nominal + Volts(rng.gen_range(-0.1..=0.1));
        self.temperature = Celsius(rng.gen_range(25.0..=35.0));
        self.capacity = Percent(rng.gen_range(90.0..=100.0));
    }

    pub const fn min_voltage(&self) -> Volts {
        self.min_voltage
    }

    pub const fn max_voltage(&self) -> Volts {
        self.max_voltage
    }

    pub fn enqueue(&mut self, task: Task) {
        self.queue.push_back(task);
    }

    /// Drop all the queued tasks including the current one.
    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.interrupt();
    }

    #[must_use]
    pub const fn queue(&self) -> &VecDeque<Task> {
        &self.queue
    }

    /// The active task, always the queue head.
    #[must_use]
    pub fn current_task(&self) -> Option<&Task> {
        match self.state {
            TaskState::Inactive => None,
            TaskState::Pending | TaskState::Running { .. } => self.queue.front(),
        }
    }

    /// Tick of the current task's first active tick.
    #[must_use]
    pub const fn task_started_at(&self) -> Option<Tick> {
        match self.state {
            TaskState::Running { started_at } => Some(started_at),
            TaskState::Inactive | TaskState::Pending => None,
        }
    }

    pub fn phase(&self) -> Phase {
        match self.current_task().map(Task::kind) {
            None => Phase::Idle,
            Some(TaskKind::ChargeCcCv) => Phase::Charging,
            Some(TaskKind::DischargeCc) => Phase::Discharging,
            Some(TaskKind::Rest) => Phase::Resting,
        }
    }

    /// Whether the cell has nothing left to do.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.queue.is_empty()
    }

    /// Forget the current task progress while keeping the queue.
    pub(crate) fn interrupt(&mut self) {
        self.state = TaskState::Inactive;
        self.current = Amperes::ZERO;
        self.status = Status::Idle;
    }

    /// Make the queue head the current task, if there is no current task yet.
    ///
    /// Returns the current task.
    pub(crate) fn promote(&mut self) -> Option<&Task> {
        if self.state == TaskState::Inactive && !self.queue.is_empty() {
            self.state = TaskState::Pending;
        }
        self.current_task()
    }

    /// Mark the first active tick of the current task, returns the actual start.
    pub(crate) const fn start(&mut self, tick: Tick) -> Tick {
        match self.state {
            TaskState::Running { started_at } => started_at,
            TaskState::Inactive | TaskState::Pending => {
                self.state = TaskState::Running { started_at: tick };
                tick
            }
        }
    }

    /// Drop the finished queue head and promote the next task.
    pub(crate) fn complete(&mut self) -> Option<Task> {
        self.interrupt();
        let task = self.queue.pop_front();
        self.promote();
        task
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn create_within_factory_ranges() {
        let mut rng = StdRng::seed_from_u64(42);
        for chemistry in Chemistry::ALL {
            for _ in 0..100 {
                let cell = Cell::create("cell_1".into(), chemistry, &mut rng);
                let nominal = chemistry.voltage_profile().nominal;
                assert!(cell.voltage >= nominal - Volts(0.1 + 1e-9));
                assert!(cell.voltage <= nominal + Volts(0.1 + 1e-9));
                assert!((Celsius(25.0)..=Celsius(35.0)).contains(&cell.temperature));
                assert!((Percent(90.0)..=Percent(100.0)).contains(&cell.capacity));
                assert_eq!(cell.current, Amperes::ZERO);
                assert_eq!(cell.status, Status::Idle);
                assert!(cell.queue().is_empty());
                assert!(cell.current_task().is_none());
            }
        }
    }

    #[test]
    fn limits_follow_chemistry() {
        let cell = Cell::with_state("cell_1".into(), Chemistry::Lto).call();
        assert_eq!(cell.min_voltage(), Volts(1.5));
        assert_eq!(cell.max_voltage(), Volts(2.8));
        assert_eq!(cell.voltage, Volts(2.4));
    }

    #[test]
    fn queue_head_is_current_task() -> crate::core::Result {
        let mut cell = Cell::with_state("cell_1".into(), Chemistry::Nmc).call();
        assert!(cell.promote().is_none());

        let first = Task::rest(3)?;
        let second = Task::discharge(5, Amperes(1.0))?;
        cell.enqueue(first);
        cell.enqueue(second);
        assert!(cell.current_task().is_none());

        assert_eq!(cell.promote(), Some(&first));
        assert_eq!(cell.phase(), Phase::Resting);
        assert_eq!(cell.start(Tick(7)), Tick(7));
        assert_eq!(cell.start(Tick(8)), Tick(7));
        assert_eq!(cell.task_started_at(), Some(Tick(7)));

        assert_eq!(cell.complete(), Some(first));
        assert_eq!(cell.current_task(), Some(&second));
        assert_eq!(cell.phase(), Phase::Discharging);
        assert_eq!(cell.task_started_at(), None);
        assert_eq!(cell.queue().len(), 1);
        Ok(())
    }

    #[test]
    fn clear_queue_idles_the_cell() -> crate::core::Result {
        let mut cell = Cell::with_state("cell_1".into(), Chemistry::LiIon).call();
        cell.enqueue(Task::charge(10, Amperes(1.5), Volts(4.2))?);
        cell.promote();
        cell.start(Tick(0));
        cell.current = Amperes(1.5);
        cell.status = Status::Charging;

        cell.clear_queue();
        assert!(cell.queue().is_empty());
        assert!(cell.current_task().is_none());
        assert_eq!(cell.current, Amperes::ZERO);
        assert_eq!(cell.status, Status::Idle);
        Ok(())
    }
}
