use std::{
    fmt::{Display, Formatter},
    num::NonZeroU32,
    str::FromStr,
};

use crate::{
    core::{Error, Result},
    quantity::{current::Amperes, voltage::Volts},
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String")]
pub enum TaskKind {
    /// Constant current, then constant voltage charging.
    #[serde(rename = "CC_CV")]
    ChargeCcCv,

    /// Constant current discharging.
    #[serde(rename = "CC_CD")]
    DischargeCc,

    /// Rest.
    #[serde(rename = "IDLE")]
    Rest,
}

impl TaskKind {
    pub const ALL: [Self; 3] = [Self::ChargeCcCv, Self::DischargeCc, Self::Rest];

    pub const fn name(self) -> &'static str {
        match self {
            Self::ChargeCcCv => "CC_CV",
            Self::DischargeCc => "CC_CD",
            Self::Rest => "IDLE",
        }
    }
}

impl Display for TaskKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaskKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Self::ALL.into_iter().find(|kind| kind.name().eq_ignore_ascii_case(value)).ok_or_else(|| {
            Error::InvalidKind {
                what: "task",
                value: value.to_string(),
                expected: "CC_CV, CC_CD, IDLE",
            }
        })
    }
}

impl TryFrom<String> for TaskKind {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Kind-specific task parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Rest,

    ChargeCcCv {
        /// Constant-current phase current.
        current: Amperes,

        /// Constant-voltage phase ceiling.
        voltage: Volts,
    },

    DischargeCc {
        /// Drawn current, positive.
        current: Amperes,
    },
}

impl Operation {
    pub const fn kind(&self) -> TaskKind {
        match self {
            Self::Rest => TaskKind::Rest,
            Self::ChargeCcCv { .. } => TaskKind::ChargeCcCv,
            Self::DischargeCc { .. } => TaskKind::DischargeCc,
        }
    }

    fn validate(&self) -> Result {
        match *self {
            Self::Rest => Ok(()),
            Self::ChargeCcCv { current, voltage } => {
                validate_current(current)?;
                if !voltage.is_finite() || voltage <= Volts::ZERO {
                    return Err(Error::InvalidTask(format!("invalid target voltage {voltage}")));
                }
                Ok(())
            }
            Self::DischargeCc { current } => validate_current(current),
        }
    }
}

fn validate_current(current: Amperes) -> Result {
    if current.is_finite() && current > Amperes::ZERO {
        Ok(())
    } else {
        Err(Error::InvalidTask(format!("invalid target current {current}")))
    }
}

/// Scheduled operation on a cell. Immutable once constructed.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Task {
    duration: NonZeroU32,
    operation: Operation,
}

impl Task {
    pub fn try_new(duration: u32, operation: Operation) -> Result<Self> {
        let duration = NonZeroU32::new(duration)
            .ok_or_else(|| Error::InvalidTask("duration must be at least one second".into()))?;
        operation.validate()?;
        Ok(Self { duration, operation })
    }

    pub fn rest(duration: u32) -> Result<Self> {
        Self::try_new(duration, Operation::Rest)
    }

    pub fn charge(duration: u32, current: Amperes, voltage: Volts) -> Result<Self> {
        Self::try_new(duration, Operation::ChargeCcCv { current, voltage })
    }

    pub fn discharge(duration: u32, current: Amperes) -> Result<Self> {
        Self::try_new(duration, Operation::DischargeCc { current })
    }

    /// Duration in ticks.
    #[must_use]
    pub const fn duration(&self) -> u32 {
        self.duration.get()
    }

    pub const fn operation(&self) -> &Operation {
        &self.operation
    }

    pub const fn kind(&self) -> TaskKind {
        self.operation.kind()
    }
}

impl Display for Task {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.operation {
            Operation::Rest => write!(f, "{} {}s", self.kind(), self.duration),
            Operation::ChargeCcCv { current, voltage } => {
                write!(f, "{} {}s {current} → {voltage}", self.kind(), self.duration)
            }
            Operation::DischargeCc { current } => {
                write!(f, "{} {}s {current}", self.kind(), self.duration)
            }
        }
    }
}
