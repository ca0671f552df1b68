use std::path::PathBuf;

use cellbench::{
    prelude::*,
    scenario::Scenario,
    tables::{build_cells_table, build_queue_table},
};
use clap::Parser;

#[derive(Parser)]
pub struct InspectArgs {
    #[clap(long, env = "SCENARIO_PATH")]
    scenario: PathBuf,

    /// Random seed for the unspecified cell parameters.
    #[clap(long, env = "SEED")]
    seed: Option<u64>,
}

impl InspectArgs {
    pub fn run(self) -> Result {
        let session = Scenario::read_from(&self.scenario)?.build_session(self.seed)?;
        println!("{}", build_cells_table(session.cells(), session.clock().tick()));
        println!("{}", build_queue_table(session.cells()));
        Ok(())
    }
}
