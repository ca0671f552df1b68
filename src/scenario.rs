//! Bench configuration files: the cells with their initial parameters and task queues.

use std::{fs, path::Path, str::FromStr};

use itertools::Itertools;

use crate::{
    core::{
        self,
        cell::{Cell, CellId},
        chemistry::Chemistry,
        session::Session,
        task::{Operation, Task, TaskKind},
    },
    prelude::*,
    quantity::{
        current::Amperes,
        proportions::Percent,
        temperature::Celsius,
        voltage::Volts,
    },
};

#[must_use]
#[derive(Default, serde::Serialize, serde::Deserialize)]
pub struct Scenario {
    #[serde(default, rename = "cell")]
    pub cells: Vec<CellConfig>,
}

/// Cell configuration, missing parameters are randomized like for a fresh cell.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CellConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CellId>,

    pub chemistry: Chemistry,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<Volts>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Celsius>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<Percent>,

    #[serde(default, rename = "task", skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<TaskConfig>,
}

impl From<&Cell> for CellConfig {
    fn from(cell: &Cell) -> Self {
        Self {
            id: Some(cell.id.clone()),
            chemistry: cell.chemistry,
            voltage: Some(cell.voltage),
            temperature: Some(cell.temperature),
            capacity: Some(cell.capacity),
            tasks: cell.queue().iter().map(TaskConfig::from).collect(),
        }
    }
}

/// Flat task representation, kind-specific fields are only present for the respective kinds.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TaskConfig {
    pub kind: TaskKind,

    /// Seconds.
    pub duration: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<Amperes>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<Volts>,
}

impl From<&Task> for TaskConfig {
    fn from(task: &Task) -> Self {
        let (current, voltage) = match *task.operation() {
            Operation::Rest => (None, None),
            Operation::ChargeCcCv { current, voltage } => (Some(current), Some(voltage)),
            Operation::DischargeCc { current } => (Some(current), None),
        };
        Self { kind: task.kind(), duration: task.duration(), current, voltage }
    }
}

impl TryFrom<TaskConfig> for Task {
    type Error = core::Error;

    fn try_from(config: TaskConfig) -> core::Result<Self> {
        let missing = |what: &str| {
            core::Error::InvalidTask(format!("{} requires a target {what}", config.kind))
        };
        let unexpected = |what: &str| {
            core::Error::InvalidTask(format!("{} does not accept a target {what}", config.kind))
        };
        match config.kind {
            TaskKind::Rest => {
                if config.current.is_some() {
                    return Err(unexpected("current"));
                }
                if config.voltage.is_some() {
                    return Err(unexpected("voltage"));
                }
                Self::rest(config.duration)
            }
            TaskKind::ChargeCcCv => Self::charge(
                config.duration,
                config.current.ok_or_else(|| missing("current"))?,
                config.voltage.ok_or_else(|| missing("voltage"))?,
            ),
            TaskKind::DischargeCc => {
                if config.voltage.is_some() {
                    return Err(unexpected("voltage"));
                }
                Self::discharge(config.duration, config.current.ok_or_else(|| missing("current"))?)
            }
        }
    }
}

/// Parse `KIND:DURATION[:CURRENT[:VOLTAGE]]`, for example `CC_CV:1800:1.5:4.2`.
impl FromStr for TaskConfig {
    type Err = core::Error;

    fn from_str(value: &str) -> core::Result<Self> {
        let invalid = |reason: &str| core::Error::InvalidTask(format!("`{value}`: {reason}"));
        let parts = value.split(':').map(str::trim).collect_vec();
        let (kind, duration, current, voltage) = match parts.as_slice() {
            [kind, duration] => (kind, duration, None, None),
            [kind, duration, current] => (kind, duration, Some(current), None),
            [kind, duration, current, voltage] => (kind, duration, Some(current), Some(voltage)),
            _ => return Err(invalid("expected KIND:DURATION[:CURRENT[:VOLTAGE]]")),
        };
        let config = Self {
            kind: kind.parse()?,
            duration: duration.parse().map_err(|_| invalid("invalid duration"))?,
            current: current
                .map(|current| current.parse().map(Amperes))
                .transpose()
                .map_err(|_| invalid("invalid current"))?,
            voltage: voltage
                .map(|voltage| voltage.parse().map(Volts))
                .transpose()
                .map_err(|_| invalid("invalid voltage"))?,
        };
        // Validate early, so that the command line is rejected before anything runs:
        let _task = Task::try_from(config)?;
        Ok(config)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum FileFormat {
    Toml,
    Json,
}

impl FileFormat {
    fn of(path: &Path) -> Result<Self> {
        match path.extension().and_then(|extension| extension.to_str()) {
            Some(extension) if extension.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            Some(extension) if extension.eq_ignore_ascii_case("json") => Ok(Self::Json),
            _ => bail!("`{}`: expected a `.toml` or `.json` file", path.display()),
        }
    }
}

impl Scenario {
    /// Snapshot the cells with their current parameters and queues.
    pub fn from_cells(cells: &[Cell]) -> Self {
        Self { cells: cells.iter().map(CellConfig::from).collect() }
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Result<Self> {
        let format = FileFormat::of(path)?;
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        let scenario: Self = match format {
            FileFormat::Toml => toml::from_str(&contents)?,
            FileFormat::Json => serde_json::from_str(&contents)?,
        };
        info!(n_cells = scenario.cells.len(), "loaded the scenario");
        Ok(scenario)
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn write_to(&self, path: &Path) -> Result {
        let contents = match FileFormat::of(path)? {
            FileFormat::Toml => toml::to_string_pretty(self)?,
            FileFormat::Json => serde_json::to_string_pretty(self)?,
        };
        fs::write(path, contents).with_context(|| format!("failed to write `{}`", path.display()))?;
        info!(n_cells = self.cells.len(), "saved the scenario");
        Ok(())
    }

    /// Create a session with the configured cells and their queued tasks.
    pub fn build_session(&self, seed: Option<u64>) -> Result<Session> {
        let mut session = Session::with_seed(seed);
        for config in &self.cells {
            let cell = match &config.id {
                Some(id) => session.add_named_cell(id.clone(), config.chemistry)?,
                None => {
                    let id = session.add_cell(config.chemistry).id.clone();
                    session.cell_mut(&id)?
                }
            };
            let id = cell.id.clone();
            if let Some(voltage) = config.voltage {
                ensure!(
                    (cell.min_voltage()..=cell.max_voltage()).contains(&voltage),
                    "cell `{id}`: voltage must be within {}..={}, got {voltage}",
                    cell.min_voltage(),
                    cell.max_voltage(),
                );
                cell.voltage = voltage;
            }
            if let Some(temperature) = config.temperature {
                ensure!(temperature.is_finite(), "cell `{id}`: invalid temperature {temperature}");
                cell.temperature = temperature;
            }
            if let Some(capacity) = config.capacity {
                ensure!(
                    (Percent::ZERO..=Percent::FULL).contains(&capacity),
                    "cell `{id}`: capacity must be within 0..=100%, got {capacity}",
                );
                cell.capacity = capacity;
            }
            for task in &config.tasks {
                let task =
                    Task::try_from(*task).with_context(|| format!("cell `{id}`: bad task"))?;
                cell.enqueue(task);
            }
        }
        Ok(session)
    }
}
