use std::collections::HashMap;

use crate::config::RaptorConfig;

// Timestamp is seconds since midnight of the service day, and may exceed 24h.
pub type Timestamp = u32;
pub type StopIndex = u32;
pub type RouteIndex = u32;
pub type RouteStopIndex = u32;
pub type DepartureIndex = u32;
pub type PathfindingCost = f64;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum NetworkError {
    #[error("Route {0} has fewer than two stops.")]
    RouteTooShort(String),
    #[error("Unknown stop index {0}.")]
    UnknownStop(StopIndex),
    #[error("Unknown stop id {0}.")]
    UnknownStopId(String),
    #[error("Route {route} has inconsistent time offsets at position {position}.")]
    InvalidOffsets { route: String, position: usize },
    #[error("Trip {0} is missing a stop time.")]
    MissingStopTime(String),
    #[error("Unknown route index {0}.")]
    UnknownRoute(RouteIndex),
}

/// A sequence of route stops shared by a set of trips with identical time offsets.
#[derive(Debug)]
pub struct Route {
    pub line: Box<str>,
    pub id: Box<str>,
    pub route_stops_idx: usize,
    pub num_route_stops: usize,
    pub departures_idx: usize,
    pub num_departures: usize,
}

impl Route {
    pub fn get_route_stops<'a>(&self, route_stops: &'a [RouteStop]) -> &'a [RouteStop] {
        &route_stops[self.route_stops_idx..(self.route_stops_idx + self.num_route_stops)]
    }

    pub fn get_departures<'a>(&self, departures: &'a [Timestamp]) -> &'a [Timestamp] {
        &departures[self.departures_idx..(self.departures_idx + self.num_departures)]
    }
}

/// A stop position on a route. Offsets are relative to the departure of the trip at the first stop.
#[derive(Debug)]
pub struct RouteStop {
    pub route_idx: RouteIndex,
    pub stop_idx: StopIndex,
    pub arrival_offset: Timestamp,
    pub departure_offset: Timestamp,
    pub transfers_idx: usize,
    pub num_transfers: usize,
}

impl RouteStop {
    pub fn get_transfers<'a>(&self, transfers: &'a [Transfer]) -> &'a [Transfer] {
        &transfers[self.transfers_idx..(self.transfers_idx + self.num_transfers)]
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transfer {
    pub to_route_stop: RouteStopIndex,
    pub cost: PathfindingCost,
    pub time: Timestamp,
}

#[derive(Debug)]
pub struct Stop {
    pub id: Box<str>,
    pub name: Box<str>,
    pub route_stops_idx: usize,
    pub num_route_stops: usize,
}

impl Stop {
    pub fn get_route_stops<'a>(&self, stop_route_stops: &'a [RouteStopIndex]) -> &'a [RouteStopIndex] {
        &stop_route_stops[self.route_stops_idx..(self.route_stops_idx + self.num_route_stops)]
    }
}

/// Immutable, flattened timetable. Built once by [`crate::NetworkBuilder`] and then shared by reference.
pub struct Network {
    pub config: RaptorConfig,
    pub routes: Vec<Route>,
    pub route_stops: Vec<RouteStop>,
    pub stops: Vec<Stop>,
    pub stop_index: HashMap<String, StopIndex>,
    pub departures: Vec<Timestamp>,
    pub departure_ids: Vec<Box<str>>,
    pub transfers: Vec<Transfer>,
    pub stop_route_stops: Vec<RouteStopIndex>,
}

impl Network {
    pub fn get_stop(&self, stop: StopIndex) -> &Stop { &self.stops[stop as usize] }

    pub fn get_stop_idx(&self, stop_id: &str) -> Option<StopIndex> { self.stop_index.get(stop_id).copied() }

    pub fn get_stop_idx_from_name(&self, stop_name: &str) -> Option<StopIndex> {
        self.stops.iter().position(|stop| &*stop.name == stop_name).map(|idx| idx as StopIndex)
    }

    pub fn get_route(&self, route: RouteIndex) -> &Route { &self.routes[route as usize] }

    pub fn get_route_stop(&self, route_stop: RouteStopIndex) -> &RouteStop { &self.route_stops[route_stop as usize] }

    /// Route stops serving a physical stop. Empty for unknown stops or stops without service.
    pub fn route_stops_at(&self, stop: StopIndex) -> &[RouteStopIndex] {
        match self.stops.get(stop as usize) {
            Some(stop) => stop.get_route_stops(&self.stop_route_stops),
            None => &[],
        }
    }

    pub fn transfers_from(&self, route_stop: RouteStopIndex) -> &[Transfer] {
        self.get_route_stop(route_stop).get_transfers(&self.transfers)
    }

    pub fn route_departures(&self, route: RouteIndex) -> &[Timestamp] {
        self.get_route(route).get_departures(&self.departures)
    }

    pub fn departure_id(&self, departure: DepartureIndex) -> &str { &self.departure_ids[departure as usize] }

    pub fn is_last_route_stop(&self, route_stop: RouteStopIndex) -> bool {
        let route = self.get_route(self.get_route_stop(route_stop).route_idx);
        route_stop as usize + 1 == route.route_stops_idx + route.num_route_stops
    }

    /// Index of the first departure of the route that leaves `route_stop` at or after `time`.
    pub fn next_departure_index(&self, route_stop: RouteStopIndex, time: Timestamp) -> Option<DepartureIndex> {
        let route_stop = self.get_route_stop(route_stop);
        let route = self.get_route(route_stop.route_idx);
        let departures = route.get_departures(&self.departures);
        let time_at_route_start = time.saturating_sub(route_stop.departure_offset);
        let pos = departures.partition_point(|&departure| departure < time_at_route_start);
        (pos < departures.len()).then(|| (route.departures_idx + pos) as DepartureIndex)
    }

    pub fn num_stops(&self) -> usize { self.stops.len() }

    pub fn num_route_stops(&self) -> usize { self.route_stops.len() }

    pub fn num_routes(&self) -> usize { self.routes.len() }

    pub fn num_departures(&self) -> usize { self.departures.len() }

    pub fn print_stats(&self) {
        log::info!(
            "Network with {} stops, {} routes, {} route stops, {} departures and {} transfers.",
            self.num_stops(),
            self.num_routes(),
            self.num_route_stops(),
            self.num_departures(),
            self.transfers.len()
        );
    }
}
