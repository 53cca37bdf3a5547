use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{prelude::*, quantity::distance::Miles};

/// Mean Earth radius.
const EARTH_RADIUS: Miles = Miles(3958.8);

/// Multiplier that turns straight-line mileage into an estimate of road mileage.
///
/// Only used where no routed distance is available for the leg.
pub const ROAD_FACTOR: f64 = 1.1;

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance.
    pub fn haversine(self, other: Self) -> Miles {
        let lat_1 = self.lat.to_radians();
        let lat_2 = other.lat.to_radians();
        let sin_half_d_lat = ((other.lat - self.lat).to_radians() / 2.0).sin();
        let sin_half_d_lng = ((other.lng - self.lng).to_radians() / 2.0).sin();
        let h = sin_half_d_lat * sin_half_d_lat
            + lat_1.cos() * lat_2.cos() * sin_half_d_lng * sin_half_d_lng;
        EARTH_RADIUS * (2.0 * h.sqrt().min(1.0).asin())
    }

    /// Estimated driving distance when no routing is available.
    pub fn road_distance(self, other: Self) -> Miles {
        self.haversine(other) * ROAD_FACTOR
    }
}

impl Display for Coordinates {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lng)
    }
}

impl FromStr for Coordinates {
    type Err = Error;

    /// Parse `lat,lng`.
    fn from_str(s: &str) -> Result<Self> {
        let (lat, lng) = s.split_once(',').with_context(|| format!("expected `lat,lng`: `{s}`"))?;
        let lat: f64 = lat.trim().parse().with_context(|| format!("invalid latitude: `{lat}`"))?;
        let lng: f64 = lng.trim().parse().with_context(|| format!("invalid longitude: `{lng}`"))?;
        ensure!((-90.0..=90.0).contains(&lat), "latitude is out of range: {lat}");
        ensure!((-180.0..=180.0).contains(&lng), "longitude is out of range: {lng}");
        Ok(Self { lat, lng })
    }
}
