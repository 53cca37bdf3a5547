use std::{collections::BTreeSet, sync::Arc};

use crate::{
    core::{
        plan::{Plan, PlanStop, SlotIndex},
        planner::{Overrides, Planner, target_departure},
        request::{PlanningRequest, Snapshot},
        station::StationId,
    },
    prelude::*,
    quantity::time::Minutes,
};

/// A planned trip together with the user's adjustments.
///
/// Adjustments never compound: the live plan is always derived from the base plan.
#[must_use]
#[derive(Clone, Debug)]
pub struct Trip {
    snapshot: Arc<Snapshot>,

    /// What the planner produced for the current overrides, before any skips.
    base: Plan,

    skipped: BTreeSet<SlotIndex>,
    overrides: Overrides,

    /// What gets displayed.
    live: Plan,
}

impl Trip {
    pub fn new(snapshot: Arc<Snapshot>, overrides: Overrides) -> Self {
        let base = Planner::builder().snapshot(&snapshot).overrides(&overrides).plan();
        let live = base.clone();
        Self { snapshot, base, skipped: BTreeSet::new(), overrides, live }
    }

    pub const fn plan(&self) -> &Plan {
        &self.live
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub const fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    pub const fn skipped(&self) -> &BTreeSet<SlotIndex> {
        &self.skipped
    }

    /// Drive past the charger in the slot.
    #[instrument(skip_all, fields(slot = %slot))]
    pub fn skip(&mut self, slot: SlotIndex) -> Result {
        ensure!(self.base.slot(slot).is_some(), "there is no charging stop #{slot}");
        if self.skipped.insert(slot) {
            info!("Skipping");
            self.replay();
        }
        Ok(())
    }

    /// Pin the station to the slot and re-plan.
    #[instrument(skip_all, fields(slot = %slot, station_id = %station_id))]
    pub fn replace(&mut self, slot: SlotIndex, station_id: StationId) -> Result {
        ensure!(self.base.slot(slot).is_some(), "there is no charging stop #{slot}");
        ensure!(
            self.snapshot.stations.get(&station_id).is_some(),
            "station `{station_id}` is not among the discovered ones",
        );
        info!("Replacing");
        self.overrides.insert(slot, station_id);
        self.replan();
        Ok(())
    }

    fn replan(&mut self) {
        self.base = Planner::builder().snapshot(&self.snapshot).overrides(&self.overrides).plan();
        self.skipped.retain(|slot| self.base.slot(*slot).is_some());
        self.replay();
    }

    fn replay(&mut self) {
        self.live = replay(&self.base, &self.snapshot.request, &self.skipped);
    }
}

/// Recompute the state-of-charge chain of the base plan with the skipped slots not charging.
fn replay(base: &Plan, request: &PlanningRequest, skipped: &BTreeSet<SlotIndex>) -> Plan {
    let vehicle = &request.vehicle;
    let origin = PlanStop {
        arrive_soc: request.start_soc,
        depart_soc: request.start_soc,
        ..base.origin().clone()
    };

    let mut soc = origin.depart_soc;
    let chargers = base
        .charging_stops()
        .map(|stop| {
            let arrive_soc = vehicle.soc_after_consuming(soc, stop.leg_distance);
            let is_skipped = stop.slot.is_some_and(|slot| skipped.contains(&slot));
            let (depart_soc, charge_time) = match &stop.station {
                Some(station) if !is_skipped => {
                    let depart_soc = target_departure(
                        vehicle,
                        arrive_soc,
                        stop.remaining_distance,
                        request.reserve_soc,
                        request.target_soc,
                    );
                    (depart_soc, vehicle.charge_time(arrive_soc, depart_soc, station.max_power))
                }
                _ => (arrive_soc, Minutes::ZERO),
            };
            soc = depart_soc;
            PlanStop { arrive_soc, depart_soc, charge_time, is_skipped, ..stop.clone() }
        })
        .collect();

    let destination = base.destination();
    let destination = PlanStop::destination(
        destination.location,
        vehicle.soc_after_consuming(soc, destination.leg_distance),
        destination.leg_distance,
    );
    Plan::new(origin, chargers, destination, base.summary().drive_time)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use enumset::enum_set;

    use super::*;
    use crate::{
        core::{
            connector::ConnectorType,
            route::tests::{equator_point, equator_route},
            station::Station,
            store::ChargerStore,
            vehicle::VehicleProfile,
        },
        quantity::{
            distance::Miles,
            efficiency::MilesPerKilowattHour,
            energy::KilowattHours,
            percent::Percent,
            power::Kilowatts,
        },
    };

    fn station(id: &str, miles: f64) -> Station {
        Station {
            id: StationId::from(id),
            name: id.to_owned(),
            location: equator_point(miles),
            network: "Electrify America".to_owned(),
            connectors: enum_set!(ConnectorType::Ccs),
            max_power: Kilowatts(150.0),
            stall_count: 4,
            available_stalls: 4,
        }
    }

    /// 75 kWh at 3 mi/kWh, from 20% with a 10% reserve over 400 miles, chargers at 100/220/330.
    fn trip() -> Trip {
        let route = equator_route(Miles(400.0), Miles(10.0));
        let vehicle = VehicleProfile::builder()
            .battery_capacity(KilowattHours(75.0))
            .efficiency(MilesPerKilowattHour(3.0))
            .connector(ConnectorType::Ccs)
            .max_charge_rate(Kilowatts(150.0))
            .build()
            .unwrap();
        let request = PlanningRequest::builder()
            .origin(route.origin())
            .destination(route.destination())
            .vehicle(vehicle)
            .start_soc(Percent(20.0))
            .reserve_soc(Percent(10.0))
            .build()
            .unwrap();
        let stations: ChargerStore =
            [station("s100", 100.0), station("s220", 220.0), station("s330", 330.0)]
                .into_iter()
                .collect();
        Trip::new(Arc::new(Snapshot { request, route, stations }), Overrides::new())
    }

    #[test]
    fn fresh_trip_shows_base_plan() {
        let trip = trip();
        assert_eq!(trip.plan(), &trip.base);
        assert_eq!(trip.plan().charging_stops().count(), 2);
    }

    #[test]
    fn replay_without_skips_reproduces_base() {
        let trip = trip();
        let replayed = replay(&trip.base, &trip.snapshot().request, &BTreeSet::new());
        assert_eq!(&replayed, &trip.base);
    }

    #[test]
    fn skip_is_idempotent() {
        let mut once = trip();
        once.skip(SlotIndex(1)).unwrap();
        let mut twice = once.clone();
        twice.skip(SlotIndex(1)).unwrap();
        assert_eq!(once.plan(), twice.plan());
    }

    #[test]
    fn skip_is_order_independent() {
        let mut forward = trip();
        forward.skip(SlotIndex(0)).unwrap();
        forward.skip(SlotIndex(1)).unwrap();
        let mut backward = trip();
        backward.skip(SlotIndex(1)).unwrap();
        backward.skip(SlotIndex(0)).unwrap();
        assert_eq!(forward.plan(), backward.plan());
    }

    #[test]
    fn skip_only_affects_downstream() {
        let mut trip = trip();
        trip.skip(SlotIndex(1)).unwrap();

        let base = &trip.base;
        let live = trip.plan();
        assert_eq!(live.origin(), base.origin());
        assert_eq!(live.slot(SlotIndex(0)), base.slot(SlotIndex(0)));

        let skipped = live.slot(SlotIndex(1)).unwrap();
        assert!(skipped.is_skipped);
        assert_eq!(skipped.arrive_soc, base.slot(SlotIndex(1)).unwrap().arrive_soc);
        assert_eq!(skipped.depart_soc, skipped.arrive_soc);
        assert_eq!(skipped.charge_time, Minutes::ZERO);

        // 100% minus 300 miles at 2.25 miles per percent:
        assert_abs_diff_eq!(
            live.destination().arrive_soc.0,
            100.0 - 300.0 / 2.25,
            epsilon = 1e-6,
        );
        assert!(!live.is_feasible());
    }

    #[test]
    fn skip_recomputes_summary() {
        let mut trip = trip();
        let charge_time = trip.plan().summary().charge_time;
        trip.skip(SlotIndex(1)).unwrap();
        let summary = trip.plan().summary();
        assert_eq!(summary.n_charging_stops, 1);
        assert!(summary.charge_time < charge_time);
        assert_eq!(summary.drive_time, trip.base.summary().drive_time);
    }

    #[test]
    fn skipping_first_raises_charging_downstream() {
        let mut trip = trip();
        trip.skip(SlotIndex(0)).unwrap();
        let live = trip.plan();
        let second = live.slot(SlotIndex(1)).unwrap();
        assert!(second.arrive_soc < trip.base.slot(SlotIndex(1)).unwrap().arrive_soc);
        assert!(second.depart_soc >= second.arrive_soc);
    }

    #[test]
    fn skip_unknown_slot_fails() {
        assert!(trip().skip(SlotIndex(7)).is_err());
    }

    #[test]
    fn replace_replans() {
        let mut trip = trip();
        trip.replace(SlotIndex(1), StationId::from("s330")).unwrap();
        let ids: Vec<_> = trip
            .plan()
            .charging_stops()
            .map(|stop| stop.station.as_ref().unwrap().id.as_str())
            .collect();
        assert_eq!(ids, ["s100", "s330"]);
        assert_eq!(trip.overrides().len(), 1);
    }

    #[test]
    fn skip_survives_replace() {
        let mut trip = trip();
        trip.skip(SlotIndex(0)).unwrap();
        trip.replace(SlotIndex(1), StationId::from("s330")).unwrap();
        assert!(trip.plan().slot(SlotIndex(0)).unwrap().is_skipped);
        assert_eq!(trip.skipped().len(), 1);
    }

    #[test]
    fn replace_with_unknown_station_fails() {
        let mut trip = trip();
        assert!(trip.replace(SlotIndex(0), StationId::from("nope")).is_err());
        assert!(trip.overrides().is_empty());
    }
}
