use bon::bon;

use crate::{
    core::{
        route::Route,
        store::{ChargerStore, Filters},
        vehicle::VehicleProfile,
    },
    geo::Coordinates,
    prelude::*,
    quantity::percent::Percent,
};

/// Departure charge the planner aims for unless the remaining trip needs more.
pub const DEFAULT_TARGET_SOC: Percent = Percent(80.0);

/// User inputs captured at the moment planning was requested.
#[must_use]
#[derive(Clone, Debug)]
pub struct PlanningRequest {
    pub origin: Coordinates,
    pub destination: Coordinates,
    pub vehicle: VehicleProfile,
    pub start_soc: Percent,

    /// Minimal charge to arrive at the destination with.
    pub reserve_soc: Percent,

    pub target_soc: Percent,
    pub filters: Filters,
}

#[bon]
impl PlanningRequest {
    #[builder]
    pub fn new(
        origin: Coordinates,
        destination: Coordinates,
        vehicle: VehicleProfile,
        start_soc: Percent,
        reserve_soc: Percent,
        #[builder(default = DEFAULT_TARGET_SOC)] target_soc: Percent,
        #[builder(default)] filters: Filters,
    ) -> Result<Self> {
        ensure!(
            (Percent::EMPTY..=Percent::FULL).contains(&start_soc),
            "starting charge must be within 0-100%: {start_soc}",
        );
        ensure!(
            (Percent::EMPTY..Percent::FULL).contains(&reserve_soc),
            "reserve must be within 0-100%: {reserve_soc}",
        );
        ensure!(
            target_soc > Percent::EMPTY && target_soc <= Percent::FULL,
            "target charge must be within 0-100%: {target_soc}",
        );
        Ok(Self { origin, destination, vehicle, start_soc, reserve_soc, target_soc, filters })
    }
}

/// Immutable inputs of a single planning run.
#[must_use]
#[derive(Debug)]
pub struct Snapshot {
    pub request: PlanningRequest,
    pub route: Route,
    pub stations: ChargerStore,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::connector::ConnectorType,
        quantity::{efficiency::MilesPerKilowattHour, energy::KilowattHours, power::Kilowatts},
    };

    fn vehicle() -> VehicleProfile {
        VehicleProfile::builder()
            .battery_capacity(KilowattHours(75.0))
            .efficiency(MilesPerKilowattHour(4.0))
            .connector(ConnectorType::Nacs)
            .max_charge_rate(Kilowatts(250.0))
            .build()
            .unwrap()
    }

    #[test]
    fn defaults_ok() {
        let request = PlanningRequest::builder()
            .origin(Coordinates::new(37.77, -122.42))
            .destination(Coordinates::new(34.05, -118.24))
            .vehicle(vehicle())
            .start_soc(Percent(90.0))
            .reserve_soc(Percent(15.0))
            .build()
            .unwrap();
        assert_eq!(request.target_soc, DEFAULT_TARGET_SOC);
        assert!(request.filters.network.is_none());
    }

    #[test]
    fn out_of_range_soc_rejected() {
        let result = PlanningRequest::builder()
            .origin(Coordinates::new(37.77, -122.42))
            .destination(Coordinates::new(34.05, -118.24))
            .vehicle(vehicle())
            .start_soc(Percent(120.0))
            .reserve_soc(Percent(15.0))
            .build();
        assert!(result.is_err());

        let result = PlanningRequest::builder()
            .origin(Coordinates::new(37.77, -122.42))
            .destination(Coordinates::new(34.05, -118.24))
            .vehicle(vehicle())
            .start_soc(Percent(50.0))
            .reserve_soc(Percent(-1.0))
            .build();
        assert!(result.is_err());
    }
}
