use std::fmt::{Display, Formatter};

use enumset::{EnumSet, enum_set};

/// Physical plug class.
#[derive(Debug, Hash, PartialOrd, Ord, clap::ValueEnum, enumset::EnumSetType)]
pub enum ConnectorType {
    /// North American Charging Standard (SAE J3400, Tesla).
    Nacs,

    /// Combined Charging System.
    Ccs,

    /// Level 2 AC (SAE J1772).
    J1772,
}

impl Display for ConnectorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nacs => write!(f, "NACS"),
            Self::Ccs => write!(f, "CCS"),
            Self::J1772 => write!(f, "J1772"),
        }
    }
}

impl ConnectorType {
    /// Station connectors a vehicle with this inlet can use.
    ///
    /// NACS vehicles are assumed to carry adapters for everything else.
    pub fn usable_by_vehicle(self) -> EnumSet<Self> {
        match self {
            Self::Nacs => enum_set!(Self::Nacs | Self::Ccs | Self::J1772),
            Self::Ccs => enum_set!(Self::Ccs | Self::J1772),
            Self::J1772 => enum_set!(Self::J1772),
        }
    }

    /// Whether a vehicle with this inlet can charge at a station offering `connectors`.
    pub fn is_compatible_with(self, connectors: EnumSet<Self>) -> bool {
        !self.usable_by_vehicle().is_disjoint(connectors)
    }
}
