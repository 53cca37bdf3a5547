use std::fmt::{Display, Formatter};

use enumset::EnumSet;
use serde::{Deserialize, Serialize};

use crate::{core::connector::ConnectorType, geo::Coordinates, quantity::power::Kilowatts};

/// Assumed power of a charger that does not report it.
pub const DEFAULT_POWER: Kilowatts = Kilowatts(50.0);

/// Assumed number of stalls of a charger that does not report it.
pub const DEFAULT_STALL_COUNT: u32 = 4;

/// Network name for stations without a recognizable operator.
pub const UNKNOWN_NETWORK: &str = "Unknown";

/// Provider-stable station identifier.
#[derive(
    Clone,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
pub struct StationId(String);

impl StationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for StationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for StationId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Coarse live-availability class.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Availability {
    Low,
    Medium,
    High,
}

impl Availability {
    /// Classify the free-stall ratio: `≥ 0.6` is high, `≥ 0.3` is medium, anything else is low.
    #[must_use]
    pub fn from_stalls(available_stalls: u32, stall_count: u32) -> Self {
        if stall_count == 0 {
            return Self::Low;
        }
        let ratio = f64::from(available_stalls) / f64::from(stall_count);
        if ratio >= 0.6 {
            Self::High
        } else if ratio >= 0.3 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl Display for Availability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Station record as returned by a discovery provider, with possibly missing attributes.
#[must_use]
#[derive(Clone, Debug, bon::Builder)]
pub struct DiscoveredStation {
    #[builder(into)]
    pub id: StationId,

    #[builder(into)]
    pub name: Option<String>,

    pub location: Coordinates,

    #[builder(into)]
    pub operator: Option<String>,

    #[builder(default)]
    pub connectors: EnumSet<ConnectorType>,

    pub max_power: Option<Kilowatts>,
    pub stall_count: Option<u32>,

    /// Live number of free stalls, if the provider knows it.
    pub available_stalls: Option<u32>,
}

/// Charging station candidate with all attributes resolved.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub location: Coordinates,

    /// Normalized operator brand.
    pub network: String,

    pub connectors: EnumSet<ConnectorType>,
    pub max_power: Kilowatts,
    pub stall_count: u32,
    pub available_stalls: u32,
}

impl Station {
    pub fn availability(&self) -> Availability {
        Availability::from_stalls(self.available_stalls, self.stall_count)
    }
}

impl From<DiscoveredStation> for Station {
    fn from(discovered: DiscoveredStation) -> Self {
        let network = normalize_network(discovered.operator.as_deref());
        let connectors = if discovered.connectors.is_empty() {
            infer_connectors(network)
        } else {
            discovered.connectors
        };
        let max_power = discovered
            .max_power
            .filter(|power| power.0.is_finite() && *power > Kilowatts::ZERO)
            .unwrap_or(DEFAULT_POWER);
        let stall_count =
            discovered.stall_count.filter(|count| *count != 0).unwrap_or(DEFAULT_STALL_COUNT);
        let available_stalls = discovered.available_stalls.map_or_else(
            || simulate_available_stalls(&discovered.id, stall_count),
            |available| available.min(stall_count),
        );
        Self {
            name: discovered.name.unwrap_or_else(|| format!("{network} {}", discovered.id)),
            id: discovered.id,
            location: discovered.location,
            network: network.to_owned(),
            connectors,
            max_power,
            stall_count,
            available_stalls,
        }
    }
}

/// Map a free-form operator title onto a brand name.
#[must_use]
pub fn normalize_network(operator: Option<&str>) -> &'static str {
    const BRANDS: [(&str, &str); 6] = [
        ("tesla", "Tesla"),
        ("electrify america", "Electrify America"),
        ("chargepoint", "ChargePoint"),
        ("evgo", "EVgo"),
        ("blink", "Blink"),
        ("ionna", "IONNA"),
    ];
    let Some(operator) = operator else {
        return UNKNOWN_NETWORK;
    };
    let operator = operator.to_lowercase();
    BRANDS
        .into_iter()
        .find(|(needle, _)| operator.contains(needle))
        .map_or(UNKNOWN_NETWORK, |(_, brand)| brand)
}

fn infer_connectors(network: &str) -> EnumSet<ConnectorType> {
    if network == "Tesla" {
        EnumSet::only(ConnectorType::Nacs)
    } else {
        EnumSet::only(ConnectorType::Ccs)
    }
}

/// Deterministic stand-in for live availability: a pure function of the id and stall count.
#[must_use]
pub fn simulate_available_stalls(id: &StationId, stall_count: u32) -> u32 {
    let digest = md5::compute(id.as_str().as_bytes());
    let mut seed = [0; 8];
    seed.copy_from_slice(&digest.0[..8]);
    let value = split_mix_64(u64::from_le_bytes(seed)) % (u64::from(stall_count) + 1);
    u32::try_from(value).unwrap_or(stall_count)
}

/// One step of the SplitMix64 generator.
const fn split_mix_64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use enumset::enum_set;

    use super::*;

    fn discovered(id: &str) -> DiscoveredStation {
        DiscoveredStation::builder().id(id).location(Coordinates::new(40.0, -100.0)).build()
    }

    #[test]
    fn availability_thresholds_ok() {
        assert_eq!(Availability::from_stalls(6, 10), Availability::High);
        assert_eq!(Availability::from_stalls(5, 10), Availability::Medium);
        assert_eq!(Availability::from_stalls(3, 10), Availability::Medium);
        assert_eq!(Availability::from_stalls(2, 10), Availability::Low);
        assert_eq!(Availability::from_stalls(0, 0), Availability::Low);
    }

    #[test]
    fn availability_ordering_ok() {
        assert!(Availability::High > Availability::Medium);
        assert!(Availability::Medium > Availability::Low);
    }

    #[test]
    fn simulation_is_deterministic() {
        let id = StationId::from("ocm-123456");
        assert_eq!(simulate_available_stalls(&id, 8), simulate_available_stalls(&id, 8));
    }

    #[test]
    fn simulated_availability_is_bounded() {
        for n in 0..500 {
            let id = StationId::from(format!("station-{n}"));
            let stall_count = n % 13;
            let station = Station::from(DiscoveredStation {
                stall_count: Some(stall_count),
                ..discovered(id.as_str())
            });
            assert!(station.available_stalls <= station.stall_count);
            let ratio = f64::from(station.available_stalls) / f64::from(station.stall_count);
            let expected = if ratio >= 0.6 {
                Availability::High
            } else if ratio >= 0.3 {
                Availability::Medium
            } else {
                Availability::Low
            };
            assert_eq!(station.availability(), expected);
        }
    }

    #[test]
    fn simulation_spreads_values() {
        let values: std::collections::BTreeSet<u32> = (0..200)
            .map(|n| simulate_available_stalls(&StationId::from(format!("s{n}")), 10))
            .collect();
        assert!(values.len() > 5);
    }

    #[test]
    fn defaults_filled_in() {
        let station = Station::from(discovered("abc"));
        assert_eq!(station.network, UNKNOWN_NETWORK);
        assert_eq!(station.connectors, enum_set!(ConnectorType::Ccs));
        assert_eq!(station.max_power, DEFAULT_POWER);
        assert_eq!(station.stall_count, DEFAULT_STALL_COUNT);
        assert!(station.available_stalls <= DEFAULT_STALL_COUNT);
    }

    #[test]
    fn tesla_connectors_inferred() {
        let station = Station::from(DiscoveredStation {
            operator: Some("Tesla Motors (Worldwide)".to_owned()),
            ..discovered("sc")
        });
        assert_eq!(station.network, "Tesla");
        assert_eq!(station.connectors, enum_set!(ConnectorType::Nacs));
    }

    #[test]
    fn live_availability_preferred_and_capped() {
        let station = Station::from(DiscoveredStation {
            stall_count: Some(4),
            available_stalls: Some(9),
            ..discovered("live")
        });
        assert_eq!(station.available_stalls, 4);
        assert_eq!(station.availability(), Availability::High);
    }

    #[test]
    fn normalize_network_ok() {
        assert_eq!(normalize_network(Some("Electrify America LLC")), "Electrify America");
        assert_eq!(normalize_network(Some("EVgo Services")), "EVgo");
        assert_eq!(normalize_network(Some("Some Municipality")), UNKNOWN_NETWORK);
        assert_eq!(normalize_network(None), UNKNOWN_NETWORK);
    }
}
