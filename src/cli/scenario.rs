use std::path::PathBuf;

use cellbench::{
    core::{chemistry::Chemistry, session::Session, task::Task},
    prelude::*,
    scenario::{Scenario, TaskConfig},
};
use clap::Parser;

#[derive(Parser)]
pub struct ScenarioArgs {
    /// Cell chemistries, one randomized cell per entry: `LFP`, `Li-ion`, `NMC`, or `LTO`.
    #[clap(long = "chemistry", value_delimiter = ',', num_args = 1.., required = true)]
    chemistries: Vec<Chemistry>,

    /// Tasks to queue on every cell: `KIND:DURATION[:CURRENT[:VOLTAGE]]`.
    #[clap(long = "tasks", alias = "task", value_delimiter = ',', num_args = 1..)]
    tasks: Vec<TaskConfig>,

    /// Output file, TOML or JSON depending on the extension.
    #[clap(long, short)]
    output: PathBuf,

    /// Random seed for reproducible cells.
    #[clap(long, env = "SEED")]
    seed: Option<u64>,
}

impl ScenarioArgs {
    pub fn run(self) -> Result {
        let mut session = Session::with_seed(self.seed);
        for chemistry in self.chemistries {
            let id = session.add_cell(chemistry).id.clone();
            for config in &self.tasks {
                session.enqueue(&id, Task::try_from(*config)?)?;
            }
        }
        Scenario::from_cells(session.cells()).write_to(&self.output)?;
        info!(n_cells = session.cells().len(), path = %self.output.display(), "written");
        Ok(())
    }
}
