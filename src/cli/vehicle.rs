//! Vehicle and charger filter arguments.

use clap::Parser;

use crate::{
    core::{connector::ConnectorType, store::Filters, vehicle::VehicleProfile},
    prelude::*,
    quantity::{efficiency::MilesPerKilowattHour, energy::KilowattHours, power::Kilowatts},
};

#[derive(Parser)]
pub struct VehicleArgs {
    /// Usable battery capacity in kilowatt-hours.
    #[clap(long = "battery-kwh", env = "BATTERY_KWH")]
    battery_capacity: KilowattHours,

    /// Consumption in miles per kilowatt-hour.
    #[clap(long = "efficiency", env = "EFFICIENCY_MI_PER_KWH")]
    efficiency: MilesPerKilowattHour,

    /// Charging inlet.
    #[clap(long, value_enum, default_value = "ccs", env = "CONNECTOR")]
    connector: ConnectorType,

    /// Maximum charging power the vehicle accepts.
    #[clap(long = "max-charge-kw", default_value = "150", env = "MAX_CHARGE_KW")]
    max_charge_rate: Kilowatts,
}

impl VehicleArgs {
    pub fn profile(&self) -> Result<VehicleProfile> {
        VehicleProfile::builder()
            .battery_capacity(self.battery_capacity)
            .efficiency(self.efficiency)
            .connector(self.connector)
            .max_charge_rate(self.max_charge_rate)
            .build()
            .context("invalid vehicle profile")
    }
}

#[derive(Parser)]
pub struct FilterArgs {
    /// Only use this charging network.
    #[clap(long)]
    network: Option<String>,

    /// Minimal charger power.
    #[clap(long = "min-power-kw", default_value = "0")]
    min_power: Kilowatts,

    /// Ignore chargers with few free stalls.
    #[clap(long)]
    hide_low_availability: bool,

    /// Never use these connectors, may be repeated.
    #[clap(long = "exclude-connector", value_enum)]
    excluded_connectors: Vec<ConnectorType>,
}

impl FilterArgs {
    pub fn filters(&self) -> Filters {
        Filters::builder()
            .maybe_network(self.network.clone())
            .min_power(self.min_power)
            .hide_low_availability(self.hide_low_availability)
            .excluded_connectors(self.excluded_connectors.iter().copied().collect())
            .build()
    }
}
