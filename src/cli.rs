mod export;
mod inspect;
mod run;
mod scenario;

use clap::{Parser, Subcommand};

use crate::cli::{inspect::InspectArgs, run::RunArgs, scenario::ScenarioArgs};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: load the bench, run the queued tasks, and report on the cells.
    #[clap(name = "run")]
    Run(Box<RunArgs>),

    /// Generate a bench configuration with randomized cells.
    #[clap(name = "scenario")]
    Scenario(Box<ScenarioArgs>),

    /// Print the configured cells and their task queues.
    #[clap(name = "inspect")]
    Inspect(Box<InspectArgs>),
}
