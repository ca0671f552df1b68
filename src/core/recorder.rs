use crate::{
    core::{
        Error,
        Result,
        cell::{Cell, CellId},
        clock::{Clock, Tick},
    },
    quantity::{
        current::Amperes,
        proportions::Percent,
        temperature::Celsius,
        voltage::Volts,
    },
};

/// Electrical state of a single cell at a tick.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Snapshot {
    pub id: CellId,
    pub voltage: Volts,
    pub current: Amperes,
    pub temperature: Celsius,
    pub capacity: Percent,
}

impl From<&Cell> for Snapshot {
    fn from(cell: &Cell) -> Self {
        Self {
            id: cell.id.clone(),
            voltage: cell.voltage,
            current: cell.current,
            temperature: cell.temperature,
            capacity: cell.capacity,
        }
    }
}

/// All the live cells at a tick.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Row {
    pub tick: Tick,
    pub cells: Vec<Snapshot>,
}

impl Row {
    #[must_use]
    pub fn get(&self, id: &CellId) -> Option<&Snapshot> {
        self.cells.iter().find(|snapshot| &snapshot.id == id)
    }
}

/// Append-only time series, one row per running tick.
#[derive(Default)]
pub struct Recorder {
    rows: Vec<Row>,
}

impl Recorder {
    /// Record the cells at the current clock tick.
    ///
    /// Must be called after all the cells have been advanced for the tick.
    pub fn tick<'a>(
        &mut self,
        clock: &Clock,
        cells: impl IntoIterator<Item = &'a Cell>,
    ) -> Result<&Row> {
        if !clock.is_running() {
            return Err(Error::ClockStopped);
        }
        let cells = cells.into_iter().map(Snapshot::from).collect();
        self.rows.push(Row { tick: clock.tick(), cells });
        let Some(row) = self.rows.last() else {
            unreachable!("the row has just been recorded");
        };
        Ok(row)
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}
