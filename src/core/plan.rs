use std::fmt::{Display, Formatter};

use crate::{
    core::station::Station,
    geo::Coordinates,
    quantity::{distance::Miles, percent::Percent, time::Minutes},
};

/// Stable identity of a charging-stop position, independent of where the stop is listed.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    derive_more::Display,
    derive_more::From,
    derive_more::FromStr,
)]
pub struct SlotIndex(pub usize);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StopKind {
    Origin,
    Charger,
    Destination,
}

impl Display for StopKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Origin => write!(f, "Origin"),
            Self::Charger => write!(f, "Charger"),
            Self::Destination => write!(f, "Destination"),
        }
    }
}

#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct PlanStop {
    pub kind: StopKind,
    pub location: Coordinates,

    /// Negative when the vehicle cannot actually get here.
    pub arrive_soc: Percent,

    pub depart_soc: Percent,
    pub charge_time: Minutes,

    /// Set for chargers only.
    pub station: Option<Station>,

    /// Set for chargers only.
    pub slot: Option<SlotIndex>,

    /// Driving distance from the previous stop.
    pub leg_distance: Miles,

    /// Driving distance from this stop to the destination.
    pub remaining_distance: Miles,

    /// The charger stays on the list, but the vehicle drives past it.
    pub is_skipped: bool,
}

impl PlanStop {
    pub const fn origin(location: Coordinates, soc: Percent, remaining_distance: Miles) -> Self {
        Self {
            kind: StopKind::Origin,
            location,
            arrive_soc: soc,
            depart_soc: soc,
            charge_time: Minutes::ZERO,
            station: None,
            slot: None,
            leg_distance: Miles::ZERO,
            remaining_distance,
            is_skipped: false,
        }
    }

    pub const fn destination(
        location: Coordinates,
        arrive_soc: Percent,
        leg_distance: Miles,
    ) -> Self {
        Self {
            kind: StopKind::Destination,
            location,
            arrive_soc,
            depart_soc: arrive_soc,
            charge_time: Minutes::ZERO,
            station: None,
            slot: None,
            leg_distance,
            remaining_distance: Miles::ZERO,
            is_skipped: false,
        }
    }

    pub fn charger(
        station: Station,
        arrive_soc: Percent,
        depart_soc: Percent,
        charge_time: Minutes,
        leg_distance: Miles,
        remaining_distance: Miles,
    ) -> Self {
        Self {
            kind: StopKind::Charger,
            location: station.location,
            arrive_soc,
            depart_soc,
            charge_time,
            station: Some(station),
            slot: None,
            leg_distance,
            remaining_distance,
            is_skipped: false,
        }
    }

    pub fn is_charging(&self) -> bool {
        self.charge_time > Minutes::ZERO
    }
}

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Summary {
    /// Pure driving time as reported by the routing service.
    pub drive_time: Minutes,

    pub charge_time: Minutes,

    /// Number of stops where the vehicle actually charges.
    pub n_charging_stops: usize,
}

impl Summary {
    pub fn total_time(&self) -> Minutes {
        self.drive_time + self.charge_time
    }
}

/// Ordered stop list for a trip.
///
/// Charging stops live in a slot-indexed arena, the visiting order is a projection over it.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct Plan {
    origin: PlanStop,
    slots: Vec<PlanStop>,
    order: Vec<SlotIndex>,
    destination: PlanStop,
    summary: Summary,
}

impl Plan {
    /// Assemble the plan, assigning slots to the charging stops in the given order.
    pub fn new(
        origin: PlanStop,
        chargers: Vec<PlanStop>,
        destination: PlanStop,
        drive_time: Minutes,
    ) -> Self {
        let slots: Vec<PlanStop> = chargers
            .into_iter()
            .enumerate()
            .map(|(index, stop)| PlanStop { slot: Some(SlotIndex(index)), ..stop })
            .collect();
        let order = (0..slots.len()).map(SlotIndex).collect();
        let summary = Summary {
            drive_time,
            charge_time: slots.iter().map(|stop| stop.charge_time).sum(),
            n_charging_stops: slots.iter().filter(|stop| stop.is_charging()).count(),
        };
        Self { origin, slots, order, destination, summary }
    }

    pub const fn origin(&self) -> &PlanStop {
        &self.origin
    }

    pub const fn destination(&self) -> &PlanStop {
        &self.destination
    }

    pub const fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn slot(&self, slot: SlotIndex) -> Option<&PlanStop> {
        self.slots.get(slot.0)
    }

    /// Charging stops in visiting order.
    pub fn charging_stops(&self) -> impl Iterator<Item = &PlanStop> {
        self.order.iter().map(|slot| &self.slots[slot.0])
    }

    /// All stops from the origin to the destination.
    pub fn stops(&self) -> impl Iterator<Item = &PlanStop> {
        std::iter::once(&self.origin)
            .chain(self.charging_stops())
            .chain(std::iter::once(&self.destination))
    }

    /// The vehicle gets to the destination.
    pub fn is_feasible(&self) -> bool {
        self.destination.arrive_soc >= Percent::EMPTY
    }

    /// First stop the vehicle cannot reach, if any.
    pub fn first_stranded_stop(&self) -> Option<&PlanStop> {
        self.stops().find(|stop| stop.arrive_soc < Percent::EMPTY)
    }
}
