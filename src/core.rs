//! Task-driven cell simulation engine.

pub mod cell;
pub mod chemistry;
pub mod clock;
mod error;
pub mod recorder;
pub mod session;
pub mod simulator;
pub mod task;

pub use self::error::{Error, Result};
