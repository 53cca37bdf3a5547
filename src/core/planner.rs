use std::{cmp::Reverse, collections::BTreeMap};

use bon::Builder;

use crate::{
    core::{
        plan::{Plan, PlanStop, SlotIndex},
        request::Snapshot,
        route::Route,
        station::{Availability, Station, StationId},
        vehicle::VehicleProfile,
    },
    geo::Coordinates,
    prelude::*,
    quantity::{distance::Miles, percent::Percent, power::Kilowatts},
};

/// Hard cap on charging stops, guarantees termination.
pub const MAX_CHARGING_STOPS: usize = 12;

/// Share of the current range the planner is willing to drive in one leg.
const LEG_SAFETY_MARGIN: f64 = 0.9;

/// Allowed overshoot of the leg budget for the final leg.
const REACH_TOLERANCE: f64 = 1.05;

/// Multiplier on the remaining distance when estimating the charge needed to finish.
const TRIP_BUFFER: f64 = 1.1;

/// Candidate search radii around the frontier, widened until something is found.
const SEARCH_RADII: [Miles; 3] = [Miles(50.0), Miles(100.0), Miles(f64::INFINITY)];

/// A pinned station is only honored this close to the frontier.
pub const OVERRIDE_RADIUS: Miles = Miles(100.0);

/// User-pinned stations by charging slot.
pub type Overrides = BTreeMap<SlotIndex, StationId>;

/// Greedy forward segmentation of a route into charging legs.
#[derive(Builder)]
#[builder(finish_fn(vis = ""))]
pub struct Planner<'a> {
    snapshot: &'a Snapshot,
    overrides: Option<&'a Overrides>,
}

impl<S: planner_builder::IsComplete> PlannerBuilder<'_, S> {
    pub fn plan(self) -> Plan {
        self.build().plan()
    }
}

/// Station projected onto the route.
#[derive(Copy, Clone)]
struct Candidate<'a> {
    station: &'a Station,

    /// Nearest polyline index.
    index: usize,

    /// Road distance between the polyline and the station, one way.
    detour: Miles,
}

/// Where the vehicle is between iterations.
#[derive(Copy, Clone)]
struct Position {
    index: usize,

    /// Distance to get back onto the route from the last stop.
    detour: Miles,

    soc: Percent,
}

impl<'a> Planner<'a> {
    #[instrument(
        skip_all,
        name = "Planning…",
        fields(
            start_soc = %self.snapshot.request.start_soc,
            distance = %self.snapshot.route.total_distance(),
            n_stations = self.snapshot.stations.len(),
        ),
    )]
    fn plan(self) -> Plan {
        let snapshot = self.snapshot;
        let request = &snapshot.request;
        let route = &snapshot.route;
        let vehicle = &request.vehicle;
        let total_distance = route.total_distance();

        let origin = PlanStop::origin(request.origin, request.start_soc, total_distance);

        let required_range = total_distance * TRIP_BUFFER + vehicle.range(request.reserve_soc);
        let direct_arrival = vehicle.soc_after_consuming(request.start_soc, total_distance);
        let is_direct = vehicle.range(request.start_soc) > required_range
            && direct_arrival >= request.reserve_soc;
        if is_direct {
            info!(%direct_arrival, "No charging needed");
            let destination =
                PlanStop::destination(request.destination, direct_arrival, total_distance);
            return Plan::new(origin, Vec::new(), destination, route.duration());
        }

        let candidates: Vec<Candidate<'_>> = snapshot
            .stations
            .eligible(&request.filters, vehicle.connector)
            .map(|station| self.project(station))
            .collect();
        debug!(n_candidates = candidates.len(), "Projected the candidates");

        let mut position = Position { index: 0, detour: Miles::ZERO, soc: request.start_soc };
        let mut chargers = Vec::new();

        for slot in (0..MAX_CHARGING_STOPS).map(SlotIndex) {
            let leg_budget = vehicle.range(position.soc) * LEG_SAFETY_MARGIN;
            let (frontier, _) = route.frontier(position.index, leg_budget);

            let to_destination = position.detour + route.remaining_from(position.index);
            if to_destination <= leg_budget * REACH_TOLERANCE
                && vehicle.soc_after_consuming(position.soc, to_destination) >= request.reserve_soc
            {
                debug!(%slot, "The destination is within reach");
                break;
            }

            let Some(candidate) =
                self.choose(slot, &candidates, position, route.point(frontier))
            else {
                warn!(%slot, frontier, "No charger found ahead, giving up");
                break;
            };

            let leg_distance = Self::leg_distance(route, position, candidate);
            let arrive_soc = vehicle.soc_after_consuming(position.soc, leg_distance);
            let remaining_distance = candidate.detour + route.remaining_from(candidate.index);
            let depart_soc = target_departure(
                vehicle,
                arrive_soc,
                remaining_distance,
                request.reserve_soc,
                request.target_soc,
            );
            let charge_time =
                vehicle.charge_time(arrive_soc, depart_soc, candidate.station.max_power);
            debug!(
                %slot,
                station_id = %candidate.station.id,
                %arrive_soc,
                %depart_soc,
                %charge_time,
                "Added a charging stop",
            );
            chargers.push(PlanStop::charger(
                candidate.station.clone(),
                arrive_soc,
                depart_soc,
                charge_time,
                leg_distance,
                remaining_distance,
            ));
            position =
                Position { index: candidate.index, detour: candidate.detour, soc: depart_soc };
        }

        let leg_distance = position.detour + route.remaining_from(position.index);
        let arrive_soc = vehicle.soc_after_consuming(position.soc, leg_distance);
        if arrive_soc < Percent::EMPTY {
            warn!(%arrive_soc, n_chargers = chargers.len(), "The trip is not feasible");
        }
        let destination = PlanStop::destination(request.destination, arrive_soc, leg_distance);
        Plan::new(origin, chargers, destination, route.duration())
    }

    fn project(&self, station: &'a Station) -> Candidate<'a> {
        let (index, detour) = self.snapshot.route.project(station.location);
        Candidate { station, index, detour }
    }

    fn leg_distance(route: &Route, position: Position, candidate: Candidate<'_>) -> Miles {
        position.detour + route.distance_between(position.index, candidate.index) + candidate.detour
    }

    /// Pick the station for the slot.
    ///
    /// A valid pinned station wins. Otherwise, stations the vehicle can actually reach are
    /// preferred, and within each group the search radius around the frontier is widened
    /// until something turns up.
    fn choose(
        &self,
        slot: SlotIndex,
        candidates: &[Candidate<'a>],
        position: Position,
        frontier: Coordinates,
    ) -> Option<Candidate<'a>> {
        if let Some(pinned) = self.pinned(slot, position, frontier) {
            return Some(pinned);
        }
        let route = &self.snapshot.route;
        let vehicle = &self.snapshot.request.vehicle;
        for reachable_only in [true, false] {
            for radius in SEARCH_RADII {
                let best = candidates
                    .iter()
                    .filter(|candidate| candidate.index > position.index)
                    .filter(|candidate| frontier.haversine(candidate.station.location) <= radius)
                    .filter(|candidate| {
                        !reachable_only
                            || vehicle.soc_after_consuming(
                                position.soc,
                                Self::leg_distance(route, position, **candidate),
                            ) >= Percent::EMPTY
                    })
                    .min_by_key(|candidate| Self::rank(candidate, frontier));
                if let Some(best) = best {
                    trace!(%slot, reachable_only, %radius, station_id = %best.station.id, "Found");
                    return Some(*best);
                }
            }
        }
        None
    }

    /// Sort key: more free stalls, then more power, then closer to the frontier, then by id.
    fn rank(
        candidate: &Candidate<'a>,
        frontier: Coordinates,
    ) -> (Reverse<Availability>, Reverse<Kilowatts>, Miles, &'a StationId) {
        let station = candidate.station;
        (
            Reverse(station.availability()),
            Reverse(station.max_power),
            frontier.haversine(station.location),
            &station.id,
        )
    }

    /// The pinned station for the slot, if there is one and it makes geometric sense.
    fn pinned(
        &self,
        slot: SlotIndex,
        position: Position,
        frontier: Coordinates,
    ) -> Option<Candidate<'a>> {
        let station_id = self.overrides?.get(&slot)?;
        let Some(station) = self.snapshot.stations.get(station_id) else {
            warn!(%slot, %station_id, "The pinned station is unknown, ignoring");
            return None;
        };
        if !self.snapshot.request.vehicle.connector.is_compatible_with(station.connectors) {
            warn!(%slot, %station_id, "The pinned station is incompatible, ignoring");
            return None;
        }
        let candidate = self.project(station);
        let distance = frontier.haversine(station.location);
        if candidate.index <= position.index || distance > OVERRIDE_RADIUS {
            info!(%slot, %station_id, %distance, "The pinned station is out of the way, ignoring");
            return None;
        }
        debug!(%slot, %station_id, "Using the pinned station");
        Some(candidate)
    }
}

/// Charge to leave a stop with: enough to finish with the reserve and at least the target,
/// but never less than what the vehicle arrived with.
pub fn target_departure(
    vehicle: &VehicleProfile,
    arrive_soc: Percent,
    remaining_distance: Miles,
    reserve_soc: Percent,
    target_soc: Percent,
) -> Percent {
    let needed = vehicle.soc_for(remaining_distance * TRIP_BUFFER) + reserve_soc;
    needed.max(target_soc).min(Percent::FULL).max(arrive_soc)
}
