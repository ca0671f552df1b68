use std::path::PathBuf;

use cellbench::{
    core::{self, cell::CellId, clock::Tick, session::Session},
    export::{Export, Field, Format},
    prelude::*,
    scenario::CellConfig,
};
use clap::Parser;

#[derive(Parser)]
pub struct ExportArgs {
    /// Export the recorded time series into the file.
    #[clap(long = "export", env = "EXPORT_PATH")]
    path: Option<PathBuf>,

    /// Export format, guessed from the file extension by default.
    #[clap(long, value_enum, env = "EXPORT_FORMAT")]
    format: Option<Format>,

    /// Exported per-cell quantities.
    #[clap(
        long,
        env = "EXPORT_COLUMNS",
        value_delimiter = ',',
        num_args = 1..,
        default_value = "voltage,current,temperature,capacity",
    )]
    columns: Vec<Field>,

    /// First exported tick, inclusive.
    #[clap(long = "from")]
    since: Option<Tick>,

    /// Last exported tick, inclusive.
    #[clap(long = "to")]
    until: Option<Tick>,

    /// Exported cell identifiers, all cells by default.
    #[clap(long, value_delimiter = ',', num_args = 1..)]
    cells: Vec<CellId>,
}

impl ExportArgs {
    /// Export the session series if requested, an empty selection is only a warning.
    pub fn export(&self, session: &Session) -> Result {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let Some(format) = self.format.or_else(|| Format::of(path)) else {
            bail!("cannot guess the export format of `{}`, specify `--format`", path.display());
        };
        let result = Export::builder()
            .rows(session.rows())
            .fields(self.columns.iter().copied().collect())
            .maybe_since(self.since)
            .maybe_until(self.until)
            .cells(self.cells.clone())
            .configs(session.cells().iter().map(CellConfig::from).collect())
            .build()
            .write_to(path, format);
        match result {
            Err(error)
                if matches!(
                    error.downcast_ref::<core::Error>(),
                    Some(core::Error::EmptyExportRequest)
                ) =>
            {
                warn!("nothing to export");
                Ok(())
            }
            result => result,
        }
    }
}
