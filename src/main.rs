mod cli;

use cellbench::prelude::*;
use clap::{Parser, crate_version};

use crate::cli::{Args, Command};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    match Args::parse().command {
        Command::Run(args) => args.run().await,
        Command::Scenario(args) => args.run(),
        Command::Inspect(args) => args.run(),
    }
}
