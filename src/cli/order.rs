use std::str::FromStr;

use chrono::{Local, NaiveTime, Timelike};
use clap::Parser;

use crate::{
    api::routing::DistanceMatrix,
    cli::services::OsrmArgs,
    core::ordering::{TimeWindow, TravelTimes, Waypoint, optimize},
    geo::Coordinates,
    prelude::*,
    quantity::time::Minutes,
    tables::build_order_table,
};

const MINUTES_PER_DAY: i64 = 24 * 60;

#[derive(Parser)]
pub struct OrderArgs {
    /// Waypoints as `lat,lng[@DWELL_MINUTES][#HH:MM-HH:MM]`, the first one is the start.
    #[clap(required = true, num_args = 1..)]
    waypoints: Vec<WaypointArg>,

    /// Departure time from the start as `HH:MM`, defaults to now.
    #[clap(long = "depart-at", value_parser = parse_time)]
    depart_at: Option<NaiveTime>,

    #[clap(flatten)]
    osrm: OsrmArgs,
}

impl OrderArgs {
    #[instrument(skip_all)]
    pub async fn run(self) -> Result {
        let depart_at = self.depart_at.unwrap_or_else(|| {
            let now = Local::now().time();
            now.with_second(0).unwrap_or(now).with_nanosecond(0).unwrap_or(now)
        });
        let points: Vec<Coordinates> =
            self.waypoints.iter().map(|waypoint| waypoint.location).collect();
        let travel_times = match self.osrm.client()?.get_matrix(&points).await {
            Ok(travel_times) => travel_times,
            Err(error) => {
                warn!("Failed to fetch travel times, estimating: {error:#}");
                TravelTimes::estimate(&points)
            }
        };
        let waypoints: Vec<Waypoint> = self
            .waypoints
            .into_iter()
            .enumerate()
            .map(|(index, waypoint)| waypoint.into_waypoint(index, depart_at))
            .collect::<Result<_>>()?;
        let best = optimize(&waypoints, &travel_times)?;
        println!("{}", build_order_table(&waypoints, &best, depart_at));
        Ok(())
    }
}

/// `lat,lng[@DWELL_MINUTES][#HH:MM-HH:MM]`.
#[derive(Clone)]
struct WaypointArg {
    location: Coordinates,
    dwell: Minutes,
    window: Option<(NaiveTime, NaiveTime)>,
}

impl WaypointArg {
    fn into_waypoint(self, index: usize, depart_at: NaiveTime) -> Result<Waypoint> {
        let window = self
            .window
            .map(|(earliest, latest)| {
                TimeWindow::new(
                    minutes_after(depart_at, earliest),
                    minutes_after(depart_at, latest),
                )
            })
            .transpose()?;
        Ok(Waypoint::builder()
            .label(format!("#{index} {}", self.location))
            .location(self.location)
            .dwell(self.dwell)
            .maybe_window(window)
            .build())
    }
}

impl FromStr for WaypointArg {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (head, window) = match s.split_once('#') {
            Some((head, window)) => {
                let (earliest, latest) = window
                    .split_once('-')
                    .with_context(|| format!("expected `HH:MM-HH:MM`: `{window}`"))?;
                (head, Some((parse_time(earliest)?, parse_time(latest)?)))
            }
            None => (s, None),
        };
        let (location, dwell) = match head.split_once('@') {
            Some((location, dwell)) => (
                location,
                dwell.trim().parse().with_context(|| format!("invalid dwell time: `{dwell}`"))?,
            ),
            None => (head, Minutes::ZERO),
        };
        Ok(Self { location: location.parse()?, dwell, window })
    }
}

fn parse_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").with_context(|| format!("expected `HH:MM`: `{s}`"))
}

/// Minutes from the departure until the wall-clock time, wrapping over midnight.
fn minutes_after(depart_at: NaiveTime, time: NaiveTime) -> Minutes {
    #[expect(clippy::cast_precision_loss)]
    let delta = (time - depart_at).num_minutes().rem_euclid(MINUTES_PER_DAY) as f64;
    Minutes(delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_waypoint_ok() -> Result {
        let waypoint: WaypointArg = "52.37,4.89@30#09:15-10:00".parse()?;
        assert_eq!(waypoint.location, Coordinates::new(52.37, 4.89));
        assert_eq!(waypoint.dwell, Minutes(30.0));
        assert_eq!(waypoint.window, Some((parse_time("09:15")?, parse_time("10:00")?)));
        Ok(())
    }

    #[test]
    fn parse_bare_waypoint_ok() -> Result {
        let waypoint: WaypointArg = "52.37,4.89".parse()?;
        assert_eq!(waypoint.dwell, Minutes::ZERO);
        assert!(waypoint.window.is_none());
        Ok(())
    }

    #[test]
    fn parse_waypoint_err() {
        assert!("52.37,4.89#09:15".parse::<WaypointArg>().is_err());
        assert!("52.37,4.89@soon".parse::<WaypointArg>().is_err());
        assert!("52.37".parse::<WaypointArg>().is_err());
    }

    #[test]
    fn minutes_after_ok() -> Result {
        let depart_at = parse_time("08:30")?;
        assert_eq!(minutes_after(depart_at, parse_time("09:15")?), Minutes(45.0));
        assert_eq!(minutes_after(depart_at, parse_time("00:30")?), Minutes(16.0 * 60.0));
        Ok(())
    }

    #[test]
    fn window_relative_to_departure() -> Result {
        let waypoint: WaypointArg = "52.37,4.89#09:00-09:30".parse()?;
        let waypoint = waypoint.into_waypoint(1, parse_time("08:00")?)?;
        assert_eq!(
            waypoint.window,
            Some(TimeWindow { earliest: Minutes(60.0), latest: Minutes(90.0) }),
        );
        Ok(())
    }
}
