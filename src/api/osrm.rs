//! [OSRM](https://project-osrm.org/docs/v5.24.0/api/) client.

use async_trait::async_trait;
use itertools::Itertools;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use serde_with::serde_as;

use crate::{
    api::{
        client,
        routing::{DistanceMatrix, Router},
    },
    core::{ordering::TravelTimes, route::RouteResponse},
    geo::Coordinates,
    prelude::*,
    quantity::{distance::Miles, time::Minutes},
};

pub struct Api {
    client: Client,
    base_url: String,

    /// Routing profile, normally `driving`.
    profile: String,
}

impl Api {
    pub fn try_new(base_url: &str, profile: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: client::try_new()?,
            base_url: base_url.trim_end_matches('/').to_owned(),
            profile: profile.into(),
        })
    }

    async fn call<R: DeserializeOwned>(
        &self,
        service: &str,
        points: &[Coordinates],
        query: &[(&str, &str)],
    ) -> Result<R> {
        // OSRM wants `lng,lat` pairs:
        let coordinates =
            points.iter().map(|point| format!("{},{}", point.lng, point.lat)).join(";");
        let url = format!("{}/{service}/v1/{}/{coordinates}", self.base_url, self.profile);
        self.client
            .get(url)
            .query(query)
            .send()
            .await
            .context("failed to call")?
            .error_for_status()
            .context("request failed")?
            .json::<R>()
            .await
            .context("failed to deserialize the response")
    }
}

#[async_trait]
impl Router for Api {
    #[instrument(
        skip_all,
        name = "Fetching the route…",
        fields(origin = %origin, destination = %destination),
    )]
    async fn get_route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<RouteResponse> {
        let response: Response<RouteBody> = self
            .call(
                "route",
                &[origin, destination],
                &[("overview", "full"), ("geometries", "geojson")],
            )
            .await?;
        let route = response
            .into_result()?
            .routes
            .into_iter()
            .next()
            .context("no route found")?;
        info!(n_points = route.geometry.coordinates.len(), distance = route.distance, "Fetched");
        Ok(route.into())
    }
}

#[async_trait]
impl DistanceMatrix for Api {
    #[instrument(skip_all, name = "Fetching the travel times…", fields(n_points = points.len()))]
    async fn get_matrix(&self, points: &[Coordinates]) -> Result<TravelTimes> {
        let response: Response<TableBody> =
            self.call("table", points, &[("annotations", "duration")]).await?;
        response.into_result()?.into_travel_times(points)
    }
}

#[derive(Deserialize)]
struct Response<B> {
    code: String,

    #[serde(default)]
    message: Option<String>,

    #[serde(flatten)]
    body: B,
}

impl<B> Response<B> {
    fn into_result(self) -> Result<B> {
        if self.code == "Ok" {
            Ok(self.body)
        } else {
            bail!("`{}`: {}", self.code, self.message.unwrap_or_default())
        }
    }
}

#[serde_as]
#[derive(Deserialize)]
struct RouteBody {
    #[serde_as(as = "serde_with::DefaultOnNull")]
    #[serde(default)]
    routes: Vec<RouteEntry>,
}

#[derive(Deserialize)]
struct RouteEntry {
    /// Meters.
    distance: f64,

    /// Seconds.
    duration: f64,

    geometry: Geometry,
}

impl From<RouteEntry> for RouteResponse {
    fn from(route: RouteEntry) -> Self {
        Self {
            distance: Some(Miles::from_meters(route.distance)),
            duration: Some(Minutes::from_seconds(route.duration)),
            polyline: route
                .geometry
                .coordinates
                .into_iter()
                .map(|[lng, lat]| Coordinates::new(lat, lng))
                .collect(),
        }
    }
}

impl TableBody {
    fn into_travel_times(self, points: &[Coordinates]) -> Result<TravelTimes> {
        ensure!(self.durations.len() == points.len(), "expected {} rows", points.len());

        // Unroutable pairs come back as `null`, estimate those:
        let estimate = TravelTimes::estimate(points);
        let rows: Vec<Vec<Minutes>> = self
            .durations
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                row.into_iter()
                    .enumerate()
                    .map(|(j, seconds)| {
                        seconds.map_or_else(|| estimate.get(i, j), Minutes::from_seconds)
                    })
                    .collect()
            })
            .collect();
        TravelTimes::try_from(rows)
    }
}

#[derive(Deserialize)]
struct Geometry {
    coordinates: Vec<[f64; 2]>,
}

#[serde_as]
#[derive(Deserialize)]
struct TableBody {
    /// Seconds.
    #[serde_as(as = "serde_with::DefaultOnNull")]
    #[serde(default)]
    durations: Vec<Vec<Option<f64>>>,
}
