use std::str::FromStr;

use clap::Parser;

use crate::{
    cli::{
        services::{DiscoveryArgs, OsrmArgs},
        vehicle::{FilterArgs, VehicleArgs},
    },
    core::{
        plan::SlotIndex,
        planner::Overrides,
        request::PlanningRequest,
        session::Session,
        station::StationId,
    },
    geo::Coordinates,
    prelude::*,
    quantity::percent::Percent,
    tables::{build_plan_table, build_summary_table},
};

#[derive(Parser)]
pub struct PlanArgs {
    /// Starting point as `lat,lng`.
    #[clap(long, allow_hyphen_values = true)]
    origin: Coordinates,

    /// Destination as `lat,lng`.
    #[clap(long, allow_hyphen_values = true)]
    destination: Coordinates,

    #[clap(flatten)]
    vehicle: VehicleArgs,

    /// State of charge at the start, in percent.
    #[clap(long = "start-soc", default_value = "80", env = "START_SOC")]
    start_soc: Percent,

    /// State of charge to arrive at the destination with, in percent.
    #[clap(long = "reserve-soc", default_value = "15", env = "RESERVE_SOC")]
    reserve_soc: Percent,

    /// State of charge to leave chargers with, unless the rest of the trip needs more.
    #[clap(long = "target-soc", default_value = "80", env = "TARGET_SOC")]
    target_soc: Percent,

    #[clap(flatten)]
    filters: FilterArgs,

    #[clap(flatten)]
    osrm: OsrmArgs,

    #[clap(flatten)]
    discovery: DiscoveryArgs,

    /// Pin a station to a charging slot as `SLOT=STATION_ID`, may be repeated.
    #[clap(long = "replace")]
    replacements: Vec<Replacement>,

    /// Drive past the charger in the slot, may be repeated.
    #[clap(long = "skip")]
    skips: Vec<SlotIndex>,
}

impl PlanArgs {
    #[instrument(skip_all)]
    pub async fn run(self) -> Result {
        let request = PlanningRequest::builder()
            .origin(self.origin)
            .destination(self.destination)
            .vehicle(self.vehicle.profile()?)
            .start_soc(self.start_soc)
            .reserve_soc(self.reserve_soc)
            .target_soc(self.target_soc)
            .filters(self.filters.filters())
            .build()?;
        let session = Session::new(
            Box::new(self.osrm.client()?),
            Box::new(self.discovery.client()?),
            self.discovery.settings(),
        );

        let mut trip =
            session.plan(request, Overrides::new()).await.context("the plan got superseded")?;
        for replacement in self.replacements {
            trip = session
                .replace(replacement.slot, replacement.station_id)?
                .context("the plan got superseded")?;
        }
        for slot in self.skips {
            trip = session.skip(slot)?.context("the plan got superseded")?;
        }

        info!(
            n_stations = trip.snapshot().stations.len(),
            n_overrides = trip.overrides().len(),
            n_skipped = trip.skipped().len(),
            "Planned",
        );
        let plan = trip.plan();
        println!("{}", build_plan_table(plan));
        println!("{}", build_summary_table(plan.summary()));
        if let Some(stop) = plan.first_stranded_stop() {
            warn!(
                kind = %stop.kind,
                arrive_soc = %stop.arrive_soc,
                is_feasible = plan.is_feasible(),
                "Running out of charge, consider other chargers or a higher starting charge",
            );
        }
        Ok(())
    }
}

/// `SLOT=STATION_ID`.
#[derive(Clone)]
struct Replacement {
    slot: SlotIndex,
    station_id: StationId,
}

impl FromStr for Replacement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (slot, station_id) =
            s.split_once('=').with_context(|| format!("expected `SLOT=STATION_ID`: `{s}`"))?;
        Ok(Self {
            slot: slot.trim().parse().with_context(|| format!("invalid slot: `{slot}`"))?,
            station_id: StationId::from(station_id.trim()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_replacement_ok() -> Result {
        let replacement: Replacement = "1=ocm-42".parse()?;
        assert_eq!(replacement.slot, SlotIndex(1));
        assert_eq!(replacement.station_id.as_str(), "ocm-42");
        Ok(())
    }

    #[test]
    fn parse_replacement_err() {
        assert!("ocm-42".parse::<Replacement>().is_err());
        assert!("x=ocm-42".parse::<Replacement>().is_err());
    }
}
