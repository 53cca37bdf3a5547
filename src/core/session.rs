use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use futures_util::future::join_all;
use tokio::sync::watch;

use crate::{
    api::{discovery::ChargerDiscovery, routing::Router},
    core::{
        plan::SlotIndex,
        planner::Overrides,
        request::{PlanningRequest, Snapshot},
        route::Route,
        station::{Station, StationId},
        store::ChargerStore,
        trip::Trip,
    },
    prelude::*,
    quantity::distance::Miles,
};

/// Number of points along the route around which chargers are searched for.
pub const N_DISCOVERY_POINTS: usize = 5;

#[derive(Copy, Clone, Debug, bon::Builder)]
pub struct DiscoverySettings {
    #[builder(default = Miles(25.0))]
    pub radius: Miles,

    #[builder(default = 100)]
    pub max_results: usize,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Runs planning against the collaborators and keeps the displayed trip.
///
/// Every request takes a ticket, and only the holder of the newest ticket may publish.
pub struct Session {
    router: Box<dyn Router>,
    discovery: Box<dyn ChargerDiscovery>,
    settings: DiscoverySettings,
    generation: AtomicU64,
    displayed: watch::Sender<Option<Arc<Trip>>>,
}

impl Session {
    pub fn new(
        router: Box<dyn Router>,
        discovery: Box<dyn ChargerDiscovery>,
        settings: DiscoverySettings,
    ) -> Self {
        Self {
            router,
            discovery,
            settings,
            generation: AtomicU64::new(0),
            displayed: watch::Sender::new(None),
        }
    }

    pub fn displayed(&self) -> Option<Arc<Trip>> {
        self.displayed.borrow().clone()
    }

    /// Plan a trip from scratch.
    ///
    /// # Returns
    ///
    /// The new trip, or [`None`] if a newer request came in meanwhile.
    #[instrument(
        skip_all,
        name = "Planning the trip…",
        fields(origin = %request.origin, destination = %request.destination),
    )]
    pub async fn plan(
        &self,
        request: PlanningRequest,
        overrides: Overrides,
    ) -> Option<Arc<Trip>> {
        let ticket = self.next_ticket();

        let response = self
            .router
            .get_route(request.origin, request.destination)
            .await
            .inspect_err(|error| {
                warn!("Routing failed, falling back to a straight line: {error:#}");
            })
            .ok();
        let route = Route::new(request.origin, request.destination, response);
        if !self.is_current(ticket) {
            info!(ticket, "Superseded while routing");
            return None;
        }

        let stations = self.discover(&route).await;
        if !self.is_current(ticket) {
            info!(ticket, "Superseded while discovering");
            return None;
        }

        let trip = Arc::new(Trip::new(Arc::new(Snapshot { request, route, stations }), overrides));
        self.publish(ticket, trip)
    }

    /// Skip the charger in the displayed trip.
    ///
    /// This is a local recomputation: it does not take a new ticket, so a planning request
    /// still in flight wins over it.
    pub fn skip(&self, slot: SlotIndex) -> Result<Option<Arc<Trip>>> {
        let ticket = self.generation.load(Ordering::SeqCst);
        self.mutate(ticket, |trip| trip.skip(slot))
    }

    /// Pin a station to the slot of the displayed trip and re-plan.
    ///
    /// Being a re-plan, this supersedes any planning request in flight.
    pub fn replace(&self, slot: SlotIndex, station_id: StationId) -> Result<Option<Arc<Trip>>> {
        let ticket = self.next_ticket();
        self.mutate(ticket, |trip| trip.replace(slot, station_id))
    }

    fn mutate(
        &self,
        ticket: u64,
        f: impl FnOnce(&mut Trip) -> Result,
    ) -> Result<Option<Arc<Trip>>> {
        let trip = self.displayed().context("there is no trip to change")?;
        let mut trip = Arc::unwrap_or_clone(trip);
        f(&mut trip)?;
        Ok(self.publish(ticket, Arc::new(trip)))
    }

    /// Search for chargers around evenly spaced points of the route, concurrently.
    ///
    /// Failed searches are logged and contribute nothing.
    #[instrument(
        skip_all,
        name = "Discovering chargers…",
        fields(radius = %self.settings.radius),
    )]
    async fn discover(&self, route: &Route) -> ChargerStore {
        let points = route.sample_points(N_DISCOVERY_POINTS);
        let batches = join_all(points.iter().map(|point| {
            self.discovery.find_chargers(*point, self.settings.radius, self.settings.max_results)
        }))
        .await;

        let mut stations = ChargerStore::default();
        for (point, batch) in points.iter().zip(batches) {
            match batch {
                Ok(batch) => {
                    let n_new = stations.merge(batch.into_iter().map(Station::from));
                    debug!(%point, n_new, "Merged");
                }
                Err(error) => {
                    warn!(%point, "Discovery failed: {error:#}");
                }
            }
        }
        info!(n_stations = stations.len(), "Discovered");
        stations
    }

    fn next_ticket(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    /// Show the trip unless a newer request has been made since the ticket was taken.
    fn publish(&self, ticket: u64, trip: Arc<Trip>) -> Option<Arc<Trip>> {
        let is_published = self.displayed.send_if_modified(|displayed| {
            if self.is_current(ticket) {
                *displayed = Some(trip.clone());
                true
            } else {
                false
            }
        });
        if is_published {
            debug!(ticket, "Published");
            Some(trip)
        } else {
            info!(ticket, "Superseded, discarding");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::{
        core::{
            connector::ConnectorType,
            route::{RouteResponse, tests::equator_point},
            station::DiscoveredStation,
            vehicle::VehicleProfile,
        },
        geo::Coordinates,
        quantity::{
            efficiency::MilesPerKilowattHour,
            energy::KilowattHours,
            percent::Percent,
            power::Kilowatts,
        },
    };

    /// Straight route along the equator, optionally held until released.
    struct FakeRouter {
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl Router for FakeRouter {
        async fn get_route(
            &self,
            origin: Coordinates,
            destination: Coordinates,
        ) -> Result<RouteResponse> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let polyline: Vec<_> =
                (0..=40).map(|n| equator_point(f64::from(n) * 10.0)).collect();
            ensure!(polyline[0] == origin && polyline[40] == destination);
            Ok(RouteResponse {
                distance: Some(Miles(400.0)),
                duration: None,
                polyline,
            })
        }
    }

    struct FailingRouter;

    #[async_trait]
    impl Router for FailingRouter {
        async fn get_route(&self, _: Coordinates, _: Coordinates) -> Result<RouteResponse> {
            bail!("no route")
        }
    }

    /// Returns the same three chargers from every search, records the centers.
    #[derive(Default)]
    struct FakeDiscovery {
        centers: Arc<Mutex<Vec<Coordinates>>>,
        is_failing: bool,
    }

    #[async_trait]
    impl ChargerDiscovery for FakeDiscovery {
        async fn find_chargers(
            &self,
            center: Coordinates,
            _radius: Miles,
            _max_results: usize,
        ) -> Result<Vec<DiscoveredStation>> {
            self.centers.lock().unwrap().push(center);
            ensure!(!self.is_failing, "service unavailable");
            Ok([("s100", 100.0), ("s220", 220.0), ("s330", 330.0)]
                .into_iter()
                .map(|(id, miles)| {
                    DiscoveredStation::builder()
                        .id(id)
                        .location(equator_point(miles))
                        .operator("Electrify America")
                        .max_power(Kilowatts(150.0))
                        .stall_count(4)
                        .available_stalls(4)
                        .build()
                })
                .collect())
        }
    }

    fn request(start_soc: f64) -> PlanningRequest {
        let vehicle = VehicleProfile::builder()
            .battery_capacity(KilowattHours(75.0))
            .efficiency(MilesPerKilowattHour(3.0))
            .connector(ConnectorType::Ccs)
            .max_charge_rate(Kilowatts(150.0))
            .build()
            .unwrap();
        PlanningRequest::builder()
            .origin(equator_point(0.0))
            .destination(equator_point(400.0))
            .vehicle(vehicle)
            .start_soc(Percent(start_soc))
            .reserve_soc(Percent(10.0))
            .build()
            .unwrap()
    }

    fn session(router: impl Router + 'static, discovery: FakeDiscovery) -> Session {
        Session::new(Box::new(router), Box::new(discovery), DiscoverySettings::default())
    }

    #[tokio::test]
    async fn plan_ok() {
        let discovery = FakeDiscovery::default();
        let centers = discovery.centers.clone();
        let session = session(FakeRouter { gate: None }, discovery);

        let trip = session.plan(request(20.0), Overrides::new()).await.unwrap();
        assert_eq!(centers.lock().unwrap().len(), N_DISCOVERY_POINTS);
        assert_eq!(trip.snapshot().stations.len(), 3);
        assert_eq!(trip.plan().charging_stops().count(), 2);
        assert!(Arc::ptr_eq(&trip, &session.displayed().unwrap()));
    }

    #[tokio::test]
    async fn failures_degrade_to_infeasible_plan() {
        let discovery = FakeDiscovery { is_failing: true, ..FakeDiscovery::default() };
        let session = session(FailingRouter, discovery);

        let trip = session.plan(request(20.0), Overrides::new()).await.unwrap();
        assert_eq!(trip.snapshot().route.len(), 2);
        assert!(trip.snapshot().stations.is_empty());
        assert_eq!(trip.plan().charging_stops().count(), 0);
        assert!(!trip.plan().is_feasible());
    }

    #[tokio::test]
    async fn newer_request_supersedes() {
        let gate = Arc::new(Notify::new());
        let session = session(FakeRouter { gate: Some(gate.clone()) }, FakeDiscovery::default());

        let stale = session.plan(request(20.0), Overrides::new());
        let fresh = async {
            // Let the stale run take its ticket first, then overtake it:
            tokio::task::yield_now().await;
            let fresh = session.plan(request(90.0), Overrides::new());
            gate.notify_one();
            gate.notify_one();
            fresh.await
        };
        let (stale, fresh) = tokio::join!(stale, fresh);

        assert!(stale.is_none());
        let fresh = fresh.unwrap();
        let displayed = session.displayed().unwrap();
        assert!(Arc::ptr_eq(&fresh, &displayed));
        assert_eq!(displayed.snapshot().request.start_soc, Percent(90.0));
    }

    #[tokio::test]
    async fn mutations_publish() {
        let session = session(FakeRouter { gate: None }, FakeDiscovery::default());
        session.plan(request(20.0), Overrides::new()).await.unwrap();

        let trip = session.skip(SlotIndex(1)).unwrap().unwrap();
        assert!(trip.plan().slot(SlotIndex(1)).unwrap().is_skipped);
        assert!(Arc::ptr_eq(&trip, &session.displayed().unwrap()));

        let trip = session.replace(SlotIndex(1), StationId::from("s330")).unwrap().unwrap();
        assert_eq!(trip.overrides().len(), 1);
        assert!(trip.skipped().contains(&SlotIndex(1)));
        assert!(Arc::ptr_eq(&trip, &session.displayed().unwrap()));
    }

    #[tokio::test]
    async fn skip_does_not_supersede_planning() {
        let gate = Arc::new(Notify::new());
        let session = session(FakeRouter { gate: Some(gate.clone()) }, FakeDiscovery::default());
        gate.notify_one();
        session.plan(request(20.0), Overrides::new()).await.unwrap();

        let fresh = session.plan(request(90.0), Overrides::new());
        let skipped = async {
            // Skip on the old trip while the new request waits for the route:
            tokio::task::yield_now().await;
            let skipped = session.skip(SlotIndex(1));
            gate.notify_one();
            skipped
        };
        let (fresh, skipped) = tokio::join!(fresh, skipped);

        assert!(skipped.unwrap().is_some());
        let fresh = fresh.unwrap();
        let displayed = session.displayed().unwrap();
        assert!(Arc::ptr_eq(&fresh, &displayed));
        assert_eq!(displayed.snapshot().request.start_soc, Percent(90.0));
    }

    #[tokio::test]
    async fn mutation_without_trip_fails() {
        let session = session(FakeRouter { gate: None }, FakeDiscovery::default());
        assert!(session.skip(SlotIndex(0)).is_err());
    }
}
