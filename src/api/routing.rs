use async_trait::async_trait;

use crate::{
    core::{ordering::TravelTimes, route::RouteResponse},
    geo::Coordinates,
    prelude::*,
};

/// Driving route provider.
#[async_trait]
pub trait Router: Send + Sync {
    async fn get_route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<RouteResponse>;
}

/// Pairwise travel-time provider.
#[async_trait]
pub trait DistanceMatrix: Send + Sync {
    async fn get_matrix(&self, points: &[Coordinates]) -> Result<TravelTimes>;
}
