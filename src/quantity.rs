#[macro_use]
mod macros;

pub mod current;
pub mod energy;
pub mod power;
pub mod proportions;
pub mod temperature;
pub mod time;
pub mod voltage;
