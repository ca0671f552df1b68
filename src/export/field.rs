use std::fmt::{Display, Formatter};

use crate::core::recorder::Snapshot;

/// Recorded per-cell quantity.
#[derive(Debug, Hash, clap::ValueEnum, enumset::EnumSetType)]
pub enum Field {
    Voltage,
    Current,
    Temperature,
    Capacity,
}

impl Field {
    #[must_use]
    pub const fn value(self, snapshot: &Snapshot) -> f64 {
        match self {
            Self::Voltage => snapshot.voltage.0,
            Self::Current => snapshot.current.0,
            Self::Temperature => snapshot.temperature.0,
            Self::Capacity => snapshot.capacity.0,
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Voltage => write!(f, "voltage"),
            Self::Current => write!(f, "current"),
            Self::Temperature => write!(f, "temperature"),
            Self::Capacity => write!(f, "capacity"),
        }
    }
}
