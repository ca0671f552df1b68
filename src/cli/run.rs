use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use cellbench::{
    core::{clock::Tick, session::Session},
    prelude::*,
    scenario::Scenario,
    statistics::summarize,
    tables::{build_cells_table, build_statistics_table},
};
use chrono::Local;
use clap::Parser;
use signal_hook::consts::{SIGINT, SIGTERM};
use tokio::time::{MissedTickBehavior, interval};

use crate::cli::export::ExportArgs;

#[derive(Parser)]
pub struct RunArgs {
    /// Bench configuration: the cells and their task queues, TOML or JSON.
    #[clap(long, env = "SCENARIO_PATH")]
    scenario: PathBuf,

    /// Run exactly this number of ticks. By default, run until every cell settles.
    #[clap(long)]
    ticks: Option<u64>,

    /// Safety limit when running until the cells settle.
    #[clap(long, env = "MAX_TICKS", default_value = "86400")]
    max_ticks: u64,

    /// Pace the ticks with the wall clock.
    #[clap(long, env = "REALTIME")]
    realtime: bool,

    /// Wall-clock tick period in the real-time mode.
    #[clap(long, env = "TICK_PERIOD", default_value = "1s")]
    period: humantime::Duration,

    /// Random seed for reproducible runs.
    #[clap(long, env = "SEED")]
    seed: Option<u64>,

    #[clap(flatten)]
    export: ExportArgs,
}

impl RunArgs {
    #[instrument(skip_all, fields(scenario = %self.scenario.display()))]
    pub async fn run(self) -> Result {
        let mut session = Scenario::read_from(&self.scenario)?.build_session(self.seed)?;

        let should_terminate = Arc::new(AtomicBool::new(false));
        signal_hook::flag::register(SIGTERM, Arc::clone(&should_terminate))?;
        signal_hook::flag::register(SIGINT, Arc::clone(&should_terminate))?;

        session.start(Local::now());
        info!(n_cells = session.cells().len(), realtime = self.realtime, "running…");
        self.run_loop(&mut session, &should_terminate).await?;
        session.pause();

        let tick = session.clock().tick();
        if let Some(runtime) = session.runtime(Local::now()) {
            info!(%tick, runtime = %humantime::format_duration(runtime.to_std()?), "stopped");
        }
        println!("{}", build_cells_table(session.cells(), tick));
        println!("{}", build_statistics_table(&summarize(session.rows())));
        self.export.export(&session)
    }

    async fn run_loop(&self, session: &mut Session, should_terminate: &AtomicBool) -> Result {
        let mut interval = self.realtime.then(|| {
            let mut interval = interval(self.period.into());
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        let reason = loop {
            if should_terminate.load(Ordering::Relaxed) {
                break StopReason::Interrupted;
            }
            let tick = session.clock().tick();
            if let Some(reason) =
                StopReason::check(self.ticks, self.max_ticks, tick, session.is_settled())
            {
                break reason;
            }
            if let Some(interval) = &mut interval {
                interval.tick().await;
            }
            session.step()?;
        };
        let tick = session.clock().tick();
        match reason {
            StopReason::TickCount => info!(%tick, "done"),
            StopReason::Settled => info!(%tick, "all cells have settled"),
            StopReason::TickLimit => warn!(%tick, "the cells have not settled, stopping"),
            StopReason::Interrupted => warn!(%tick, "interrupted"),
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum StopReason {
    /// The requested number of ticks has been run.
    TickCount,

    Settled,

    /// The cells have not settled within the safety limit.
    TickLimit,

    Interrupted,
}

impl StopReason {
    /// Decide whether the loop stops before running the `tick`.
    ///
    /// A fixed tick count runs regardless of the cells, otherwise the loop runs until they settle.
    const fn check(
        n_ticks: Option<u64>,
        max_ticks: u64,
        tick: Tick,
        is_settled: bool,
    ) -> Option<Self> {
        match n_ticks {
            Some(n_ticks) if tick.0 >= n_ticks => Some(Self::TickCount),
            Some(_) => None,
            None if is_settled => Some(Self::Settled),
            None if tick.0 >= max_ticks => Some(Self::TickLimit),
            None => None,
        }
    }
}
