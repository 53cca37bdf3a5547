use bon::bon;

use crate::{
    core::connector::ConnectorType,
    prelude::*,
    quantity::{
        distance::Miles,
        efficiency::MilesPerKilowattHour,
        energy::KilowattHours,
        percent::Percent,
        power::Kilowatts,
        time::Minutes,
    },
};

/// Chargers reporting less than this are treated as this slow to keep charge times finite.
pub const MIN_CHARGER_POWER: Kilowatts = Kilowatts(10.0);

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VehicleProfile {
    pub battery_capacity: KilowattHours,
    pub efficiency: MilesPerKilowattHour,
    pub connector: ConnectorType,

    /// Vehicle-side charging power ceiling.
    pub max_charge_rate: Kilowatts,
}

#[bon]
impl VehicleProfile {
    #[builder]
    pub fn new(
        battery_capacity: KilowattHours,
        efficiency: MilesPerKilowattHour,
        connector: ConnectorType,
        max_charge_rate: Kilowatts,
    ) -> Result<Self> {
        ensure!(
            battery_capacity.0.is_finite() && battery_capacity > KilowattHours::ZERO,
            "battery capacity must be positive: {battery_capacity}",
        );
        ensure!(
            efficiency.0.is_finite() && efficiency > MilesPerKilowattHour::ZERO,
            "efficiency must be positive: {efficiency}",
        );
        ensure!(
            max_charge_rate.0.is_finite() && max_charge_rate > Kilowatts::ZERO,
            "maximum charge rate must be positive: {max_charge_rate}",
        );
        Ok(Self { battery_capacity, efficiency, connector, max_charge_rate })
    }
}

impl VehicleProfile {
    /// Distance the vehicle can drive on the given state of charge.
    pub fn range(&self, state_of_charge: Percent) -> Miles {
        self.battery_capacity * state_of_charge * self.efficiency
    }

    /// State of charge after driving the distance.
    ///
    /// Not clamped: a negative result means the leg cannot be driven.
    pub fn soc_after_consuming(&self, start: Percent, distance: Miles) -> Percent {
        start - self.soc_for(distance)
    }

    /// State of charge needed to drive the distance.
    pub fn soc_for(&self, distance: Miles) -> Percent {
        let energy = distance / self.efficiency;
        Percent(energy.0 / self.battery_capacity.0 * 100.0)
    }

    /// Energy to add to go from one state of charge to another.
    pub fn energy_to_reach(&self, from: Percent, to: Percent) -> KilowattHours {
        self.battery_capacity * (to - from)
    }

    /// Time to charge from one state of charge to another at a station.
    pub fn charge_time(&self, from: Percent, to: Percent, station_power: Kilowatts) -> Minutes {
        let power = self.max_charge_rate.min(station_power).max(MIN_CHARGER_POWER);
        self.energy_to_reach(from, to) / power
    }
}
