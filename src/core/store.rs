use std::collections::BTreeMap;

use enumset::EnumSet;

use crate::{
    core::{
        connector::ConnectorType,
        station::{Availability, Station, StationId},
    },
    quantity::power::Kilowatts,
};

/// User-selected charger filters.
#[must_use]
#[derive(Clone, Debug, Default, bon::Builder)]
pub struct Filters {
    /// Only this network, or any network when [`None`].
    #[builder(into)]
    pub network: Option<String>,

    #[builder(default)]
    pub hide_low_availability: bool,

    #[builder(default)]
    pub min_power: Kilowatts,

    /// Connector types the user never wants to use.
    #[builder(default)]
    pub excluded_connectors: EnumSet<ConnectorType>,
}

impl Filters {
    pub fn accepts(&self, station: &Station, vehicle_connector: ConnectorType) -> bool {
        self.network.as_ref().is_none_or(|network| network.eq_ignore_ascii_case(&station.network))
            && !(self.hide_low_availability && station.availability() == Availability::Low)
            && station.max_power >= self.min_power
            && !(vehicle_connector.usable_by_vehicle() & station.connectors)
                .difference(self.excluded_connectors)
                .is_empty()
    }
}

/// Charging stations discovered during a session, keyed by their provider id.
#[must_use]
#[derive(Clone, Debug, Default)]
pub struct ChargerStore {
    stations: BTreeMap<StationId, Station>,
}

impl ChargerStore {
    /// Merge a discovery batch, later records replacing earlier ones with the same id.
    ///
    /// # Returns
    ///
    /// Number of stations that were not known before.
    pub fn merge(&mut self, stations: impl IntoIterator<Item = Station>) -> usize {
        stations
            .into_iter()
            .filter(|station| self.stations.insert(station.id.clone(), station.clone()).is_none())
            .count()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn get(&self, id: &StationId) -> Option<&Station> {
        self.stations.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    /// Stations passing the filters for a vehicle with the given inlet.
    pub fn eligible<'a>(
        &'a self,
        filters: &'a Filters,
        vehicle_connector: ConnectorType,
    ) -> impl Iterator<Item = &'a Station> {
        self.iter().filter(move |station| filters.accepts(station, vehicle_connector))
    }
}

impl FromIterator<Station> for ChargerStore {
    fn from_iter<T: IntoIterator<Item = Station>>(iter: T) -> Self {
        let mut store = Self::default();
        store.merge(iter);
        store
    }
}
