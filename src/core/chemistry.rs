use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use crate::{
    core::{Error, Result},
    quantity::voltage::Volts,
};

/// Battery chemistry, fixes the nominal voltage and the allowed voltage window.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String")]
pub enum Chemistry {
    #[serde(rename = "LFP")]
    Lfp,

    #[serde(rename = "Li-ion")]
    LiIon,

    #[serde(rename = "NMC")]
    Nmc,

    #[serde(rename = "LTO")]
    Lto,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct VoltageProfile {
    pub nominal: Volts,
    pub min: Volts,
    pub max: Volts,
}

impl Chemistry {
    pub const ALL: [Self; 4] = [Self::Lfp, Self::LiIon, Self::Nmc, Self::Lto];

    const EXPECTED: &'static str = "LFP, Li-ion, NMC, LTO";

    pub const fn voltage_profile(self) -> VoltageProfile {
        match self {
            Self::Lfp => VoltageProfile { nominal: Volts(3.2), min: Volts(2.8), max: Volts(3.6) },
            Self::LiIon => VoltageProfile { nominal: Volts(3.7), min: Volts(2.5), max: Volts(4.2) },
            Self::Nmc => VoltageProfile { nominal: Volts(3.6), min: Volts(3.0), max: Volts(4.2) },
            Self::Lto => VoltageProfile { nominal: Volts(2.4), min: Volts(1.5), max: Volts(2.8) },
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Lfp => "LFP",
            Self::LiIon => "Li-ion",
            Self::Nmc => "NMC",
            Self::Lto => "LTO",
        }
    }
}

impl Display for Chemistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Chemistry {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Self::ALL.into_iter().find(|chemistry| chemistry.name().eq_ignore_ascii_case(value)).ok_or_else(
            || Error::InvalidKind {
                what: "chemistry",
                value: value.to_string(),
                expected: Self::EXPECTED,
            },
        )
    }
}

impl TryFrom<String> for Chemistry {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}
