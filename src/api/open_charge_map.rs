//! [Open Charge Map](https://openchargemap.org/site/develop/api) client.

use async_trait::async_trait;
use enumset::EnumSet;
use reqwest::Client;
use serde::Deserialize;
use serde_with::serde_as;

use crate::{
    api::{client, discovery::ChargerDiscovery},
    core::{connector::ConnectorType, station::DiscoveredStation},
    geo::Coordinates,
    prelude::*,
    quantity::{distance::Miles, power::Kilowatts},
};

pub struct Api {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl Api {
    pub fn try_new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client: client::try_new()?,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
        })
    }
}

#[async_trait]
impl ChargerDiscovery for Api {
    #[instrument(
        skip_all,
        name = "Searching for chargers…",
        fields(center = %center, radius = %radius),
    )]
    async fn find_chargers(
        &self,
        center: Coordinates,
        radius: Miles,
        max_results: usize,
    ) -> Result<Vec<DiscoveredStation>> {
        let mut query = vec![
            ("output", "json".to_owned()),
            ("latitude", center.lat.to_string()),
            ("longitude", center.lng.to_string()),
            ("distance", radius.0.to_string()),
            ("distanceunit", "Miles".to_owned()),
            ("maxresults", max_results.to_string()),
            ("verbose", "false".to_owned()),
        ];
        if let Some(api_key) = &self.api_key {
            query.push(("key", api_key.clone()));
        }
        let points_of_interest = self
            .client
            .get(format!("{}/v3/poi", self.base_url))
            .query(&query)
            .send()
            .await
            .context("failed to call")?
            .error_for_status()
            .context("request failed")?
            .json::<Vec<PointOfInterest>>()
            .await
            .context("failed to deserialize the response")?;
        info!(n_stations = points_of_interest.len(), "Fetched");
        Ok(points_of_interest.into_iter().map(DiscoveredStation::from).collect())
    }
}

#[serde_as]
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PointOfInterest {
    #[serde(rename = "ID")]
    id: u64,

    address_info: AddressInfo,

    #[serde(default)]
    operator_info: Option<OperatorInfo>,

    #[serde_as(as = "serde_with::DefaultOnNull")]
    #[serde(default)]
    connections: Vec<Connection>,

    #[serde(default)]
    number_of_points: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AddressInfo {
    #[serde(default)]
    title: Option<String>,

    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OperatorInfo {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Deserialize)]
struct Connection {
    #[serde(default, rename = "ConnectionTypeID")]
    connection_type_id: Option<u32>,

    #[serde(default, rename = "PowerKW")]
    power_kw: Option<f64>,

    #[serde(default, rename = "Quantity")]
    quantity: Option<u32>,
}

impl Connection {
    /// Map Open Charge Map connection type onto the supported plugs.
    const fn connector_type(&self) -> Option<ConnectorType> {
        match self.connection_type_id {
            Some(1) => Some(ConnectorType::J1772),
            Some(32 | 33) => Some(ConnectorType::Ccs),
            Some(27 | 30) => Some(ConnectorType::Nacs),
            _ => None,
        }
    }
}

impl From<PointOfInterest> for DiscoveredStation {
    fn from(poi: PointOfInterest) -> Self {
        let connectors: EnumSet<ConnectorType> =
            poi.connections.iter().filter_map(Connection::connector_type).collect();
        let max_power = poi
            .connections
            .iter()
            .filter_map(|connection| connection.power_kw)
            .map(Kilowatts)
            .max();
        let stall_count = poi.number_of_points.or_else(|| {
            let quantities = poi.connections.iter().filter_map(|connection| connection.quantity);
            Some(quantities.sum::<u32>()).filter(|sum| *sum != 0)
        });
        Self::builder()
            .id(format!("ocm-{}", poi.id))
            .maybe_name(poi.address_info.title)
            .location(Coordinates::new(poi.address_info.latitude, poi.address_info.longitude))
            .maybe_operator(poi.operator_info.and_then(|operator| operator.title))
            .connectors(connectors)
            .maybe_max_power(max_power)
            .maybe_stall_count(stall_count)
            .build()
    }
}
