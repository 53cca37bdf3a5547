//! Collaborator service arguments.

use clap::Parser;

use crate::{
    api::{open_charge_map, osrm},
    core::session::DiscoverySettings,
    prelude::*,
    quantity::distance::Miles,
};

#[derive(Parser)]
pub struct OsrmArgs {
    /// OSRM server.
    #[clap(long = "osrm-url", default_value = "https://router.project-osrm.org", env = "OSRM_URL")]
    url: String,

    /// OSRM routing profile.
    #[clap(long = "osrm-profile", default_value = "driving", env = "OSRM_PROFILE")]
    profile: String,
}

impl OsrmArgs {
    pub fn client(&self) -> Result<osrm::Api> {
        osrm::Api::try_new(&self.url, self.profile.clone())
    }
}

#[derive(Parser)]
pub struct DiscoveryArgs {
    /// Open Charge Map server.
    #[clap(
        long = "open-charge-map-url",
        default_value = "https://api.openchargemap.io",
        env = "OPEN_CHARGE_MAP_URL"
    )]
    url: String,

    #[clap(long = "open-charge-map-api-key", env = "OPEN_CHARGE_MAP_API_KEY")]
    api_key: Option<String>,

    /// Search radius around each sampled route point.
    #[clap(long = "discovery-radius-miles", default_value = "25")]
    radius: Miles,

    /// Maximum number of chargers per search.
    #[clap(long = "discovery-max-results", default_value = "100")]
    max_results: usize,
}

impl DiscoveryArgs {
    pub fn client(&self) -> Result<open_charge_map::Api> {
        open_charge_map::Api::try_new(&self.url, self.api_key.clone())
    }

    pub fn settings(&self) -> DiscoverySettings {
        DiscoverySettings::builder().radius(self.radius).max_results(self.max_results).build()
    }
}
