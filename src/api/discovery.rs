use async_trait::async_trait;

use crate::{
    core::station::DiscoveredStation,
    geo::Coordinates,
    prelude::*,
    quantity::distance::Miles,
};

/// Charging station search around a point.
#[async_trait]
pub trait ChargerDiscovery: Send + Sync {
    async fn find_chargers(
        &self,
        center: Coordinates,
        radius: Miles,
        max_results: usize,
    ) -> Result<Vec<DiscoveredStation>>;
}
