use crate::core::cell::CellId;

pub type Result<T = (), E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unrecognized chemistry or task kind.
    #[error("invalid {what} kind `{value}`, expected one of: {expected}")]
    InvalidKind { what: &'static str, value: String, expected: &'static str },

    /// Task parameters violate the construction contract.
    #[error("invalid task: {0}")]
    InvalidTask(String),

    #[error("nothing to export: no recorded rows match the request")]
    EmptyExportRequest,

    #[error("cell `{0}` does not exist")]
    MissingCell(CellId),

    #[error("cell `{0}` already exists")]
    DuplicateCell(CellId),

    /// Recording requires a running clock.
    #[error("the simulation clock is not running")]
    ClockStopped,
}
