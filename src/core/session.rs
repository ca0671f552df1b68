use chrono::{DateTime, Local, TimeDelta};
use tracing::{debug, info};

use crate::core::{
    Error,
    Result,
    cell::{Cell, CellId},
    chemistry::Chemistry,
    clock::Clock,
    recorder::{Recorder, Row},
    simulator::Simulator,
    task::Task,
};

/// Simulation run: the cells together with their shared clock, recorder and simulator.
pub struct Session {
    cells: Vec<Cell>,
    clock: Clock,
    recorder: Recorder,
    simulator: Simulator,

    /// Sequence number of the last automatically assigned cell identifier.
    last_cell_number: usize,
}

impl Session {
    #[must_use]
    pub fn new(simulator: Simulator) -> Self {
        Self {
            cells: Vec::new(),
            clock: Clock::default(),
            recorder: Recorder::default(),
            simulator,
            last_cell_number: 0,
        }
    }

    /// Session with a reproducible random sequence, or an entropy-seeded one.
    #[must_use]
    pub fn with_seed(seed: Option<u64>) -> Self {
        Self::new(seed.map_or_else(Simulator::from_entropy, Simulator::seeded))
    }

    /// Create a randomized cell under the next free `cell_<n>` identifier.
    pub fn add_cell(&mut self, chemistry: Chemistry) -> &Cell {
        let id = self.next_cell_id();
        let cell = Cell::create(id, chemistry, self.simulator.rng_mut());
        debug!(id = %cell.id, %chemistry, voltage = %cell.voltage, "created cell");
        self.cells.push(cell);
        let Some(cell) = self.cells.last() else {
            unreachable!("the cell has just been added");
        };
        cell
    }

    /// Create a randomized cell under the specified identifier.
    pub fn add_named_cell(&mut self, id: CellId, chemistry: Chemistry) -> Result<&mut Cell> {
        let cell = Cell::create(id, chemistry, self.simulator.rng_mut());
        self.insert_cell(cell)?;
        let Some(cell) = self.cells.last_mut() else {
            unreachable!("the cell has just been added");
        };
        Ok(cell)
    }

    pub fn insert_cell(&mut self, cell: Cell) -> Result {
        if self.cells.iter().any(|existing| existing.id == cell.id) {
            return Err(Error::DuplicateCell(cell.id));
        }
        self.cells.push(cell);
        Ok(())
    }

    pub fn remove_cell(&mut self, id: &CellId) -> Result<Cell> {
        let index = self.index_of(id)?;
        Ok(self.cells.remove(index))
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, id: &CellId) -> Result<&Cell> {
        Ok(&self.cells[self.index_of(id)?])
    }

    pub fn cell_mut(&mut self, id: &CellId) -> Result<&mut Cell> {
        let index = self.index_of(id)?;
        Ok(&mut self.cells[index])
    }

    pub fn enqueue(&mut self, id: &CellId, task: Task) -> Result {
        self.cell_mut(id)?.enqueue(task);
        Ok(())
    }

    pub fn clear_queue(&mut self, id: &CellId) -> Result {
        self.cell_mut(id)?.clear_queue();
        Ok(())
    }

    pub fn clear_queues(&mut self) {
        self.cells.iter_mut().for_each(Cell::clear_queue);
    }

    /// Re-roll the cell parameters like a freshly created one.
    pub fn randomize_cell(&mut self, id: &CellId) -> Result {
        let index = self.index_of(id)?;
        self.cells[index].randomize(self.simulator.rng_mut());
        Ok(())
    }

    #[must_use]
    pub const fn clock(&self) -> &Clock {
        &self.clock
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        self.recorder.rows()
    }

    pub fn start(&mut self, now: DateTime<Local>) {
        self.clock.start(now);
        info!(tick = %self.clock.tick(), n_cells = self.cells.len(), "started");
    }

    pub fn pause(&mut self) {
        self.clock.pause();
        info!(tick = %self.clock.tick(), "paused");
    }

    /// Rewind the clock, interrupt the active tasks and drop the recorded series.
    ///
    /// Queued tasks survive, see [`Self::reset_all`].
    pub fn reset(&mut self) {
        self.clock.reset(&mut self.cells);
        self.recorder.clear();
        info!("reset");
    }

    /// Reset and clear every task queue.
    pub fn reset_all(&mut self) {
        self.reset();
        self.clear_queues();
    }

    /// Advance all the cells by one tick and record them.
    pub fn step(&mut self) -> Result<&Row> {
        if !self.clock.is_running() {
            return Err(Error::ClockStopped);
        }
        let tick = self.clock.tick();
        for cell in &mut self.cells {
            self.simulator.advance(cell, tick);
        }
        let row = self.recorder.tick(&self.clock, &self.cells)?;
        self.clock.advance();
        Ok(row)
    }

    /// Whether every cell has run out of tasks.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.cells.iter().all(Cell::is_settled)
    }

    #[must_use]
    pub fn runtime(&self, now: DateTime<Local>) -> Option<TimeDelta> {
        self.clock.runtime(now)
    }

    fn next_cell_id(&mut self) -> CellId {
        loop {
            self.last_cell_number += 1;
            let id = CellId::from(format!("cell_{}", self.last_cell_number));
            if self.cells.iter().all(|cell| cell.id != id) {
                break id;
            }
        }
    }

    fn index_of(&self, id: &CellId) -> Result<usize> {
        self.cells
            .iter()
            .position(|cell| &cell.id == id)
            .ok_or_else(|| Error::MissingCell(id.clone()))
    }
}
