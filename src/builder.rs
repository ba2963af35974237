use std::collections::{BTreeMap, HashMap};

use crate::config::RaptorConfig;
use crate::network::{
    Network, NetworkError, Route, RouteIndex, RouteStop, RouteStopIndex, Stop, StopIndex, Timestamp, Transfer,
};

/// Arrival and departure offsets of one stop of a route, relative to the trip start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteStopTimes {
    pub stop: StopIndex,
    pub arrival_offset: Timestamp,
    pub departure_offset: Timestamp,
}

impl RouteStopTimes {
    pub fn new(stop: StopIndex, arrival_offset: Timestamp, departure_offset: Timestamp) -> Self {
        Self { stop, arrival_offset, departure_offset }
    }
}

struct PendingStop {
    id: String,
    name: String,
}

struct PendingRoute {
    line: String,
    id: String,
    stops: Vec<RouteStopTimes>,
    departures: Vec<(Timestamp, String)>,
}

/// Collects stops, routes, departures and footpaths, then lays them out as a [`Network`].
pub struct NetworkBuilder {
    config: RaptorConfig,
    stops: Vec<PendingStop>,
    stop_index: HashMap<String, StopIndex>,
    routes: Vec<PendingRoute>,
    footpaths: BTreeMap<StopIndex, BTreeMap<StopIndex, Timestamp>>,
}

impl NetworkBuilder {
    pub fn new(config: RaptorConfig) -> Self {
        Self {
            config,
            stops: Vec::new(),
            stop_index: HashMap::new(),
            routes: Vec::new(),
            footpaths: BTreeMap::new(),
        }
    }

    /// Registers a stop, or returns the index of the stop already registered under `id`.
    pub fn add_stop(&mut self, id: &str, name: &str) -> StopIndex {
        if let Some(&stop_idx) = self.stop_index.get(id) {
            return stop_idx;
        }
        let stop_idx = self.stops.len() as StopIndex;
        self.stops.push(PendingStop { id: id.to_owned(), name: name.to_owned() });
        self.stop_index.insert(id.to_owned(), stop_idx);
        stop_idx
    }

    pub fn stop_idx(&self, id: &str) -> Result<StopIndex, NetworkError> {
        self.stop_index.get(id).copied().ok_or_else(|| NetworkError::UnknownStopId(id.to_owned()))
    }

    pub fn add_route(&mut self, line: &str, id: &str, stops: Vec<RouteStopTimes>) -> Result<RouteIndex, NetworkError> {
        if stops.len() < 2 {
            return Err(NetworkError::RouteTooShort(id.to_owned()));
        }
        for (position, times) in stops.iter().enumerate() {
            if times.stop as usize >= self.stops.len() {
                return Err(NetworkError::UnknownStop(times.stop));
            }
            let previous_departure = position.checked_sub(1).map(|prev| stops[prev].departure_offset);
            if times.departure_offset < times.arrival_offset
                || previous_departure.is_some_and(|departure| times.arrival_offset < departure)
            {
                return Err(NetworkError::InvalidOffsets { route: id.to_owned(), position });
            }
        }
        let route_idx = self.routes.len() as RouteIndex;
        self.routes.push(PendingRoute { line: line.to_owned(), id: id.to_owned(), stops, departures: Vec::new() });
        Ok(route_idx)
    }

    /// Adds a trip of `route` leaving its first stop at `time`.
    pub fn add_departure(&mut self, route: RouteIndex, trip_id: &str, time: Timestamp) -> Result<(), NetworkError> {
        let pending = self.routes.get_mut(route as usize).ok_or(NetworkError::UnknownRoute(route))?;
        pending.departures.push((time, trip_id.to_owned()));
        Ok(())
    }

    /// Adds a directed walking connection. Repeated footpaths between the same stops keep the shortest walk.
    pub fn add_footpath(&mut self, from: StopIndex, to: StopIndex, walk_time: Timestamp) -> Result<(), NetworkError> {
        for stop in [from, to] {
            if stop as usize >= self.stops.len() {
                return Err(NetworkError::UnknownStop(stop));
            }
        }
        if from == to {
            log::warn!("Ignoring footpath from stop {} to itself.", self.stops[from as usize].id);
            return Ok(());
        }
        let walk = self.footpaths.entry(from).or_default().entry(to).or_insert(walk_time);
        *walk = (*walk).min(walk_time);
        Ok(())
    }

    pub fn build(self) -> Result<Network, NetworkError> {
        let NetworkBuilder { config, stops: pending_stops, stop_index, routes: pending_routes, footpaths } = self;

        let mut routes = Vec::with_capacity(pending_routes.len());
        let mut route_stops = Vec::new();
        let mut departures = Vec::new();
        let mut departure_ids = Vec::new();
        for (route_idx, mut pending) in pending_routes.into_iter().enumerate() {
            if pending.departures.is_empty() {
                log::warn!("Route {} ({} line) has no departures.", pending.id, pending.line);
            }
            pending.departures.sort();

            routes.push(Route {
                line: pending.line.into_boxed_str(),
                id: pending.id.into_boxed_str(),
                route_stops_idx: route_stops.len(),
                num_route_stops: pending.stops.len(),
                departures_idx: departures.len(),
                num_departures: pending.departures.len(),
            });
            for times in pending.stops {
                route_stops.push(RouteStop {
                    route_idx: route_idx as RouteIndex,
                    stop_idx: times.stop,
                    arrival_offset: times.arrival_offset,
                    departure_offset: times.departure_offset,
                    transfers_idx: 0,
                    num_transfers: 0,
                });
            }
            for (time, trip_id) in pending.departures {
                departures.push(time);
                departure_ids.push(trip_id.into_boxed_str());
            }
        }

        // Index the route stops of each physical stop.
        let mut route_stops_per_stop = vec![Vec::new(); pending_stops.len()];
        for (route_stop_idx, route_stop) in route_stops.iter().enumerate() {
            route_stops_per_stop[route_stop.stop_idx as usize].push(route_stop_idx as RouteStopIndex);
        }
        let mut stops = Vec::with_capacity(pending_stops.len());
        let mut stop_route_stops = Vec::with_capacity(route_stops.len());
        for (pending, served_by) in pending_stops.into_iter().zip(route_stops_per_stop.iter()) {
            stops.push(Stop {
                id: pending.id.into_boxed_str(),
                name: pending.name.into_boxed_str(),
                route_stops_idx: stop_route_stops.len(),
                num_route_stops: served_by.len(),
            });
            stop_route_stops.extend_from_slice(served_by);
        }

        // Same-stop transfers to every other route stop, then footpaths to every route stop of the target.
        let same_stop_time = config.transfer_time(0);
        let same_stop_cost = config.transfer_cost(same_stop_time);
        let mut transfers = Vec::new();
        for (route_stop_idx, route_stop) in route_stops.iter_mut().enumerate() {
            route_stop.transfers_idx = transfers.len();
            for &to_route_stop in &route_stops_per_stop[route_stop.stop_idx as usize] {
                if to_route_stop as usize != route_stop_idx {
                    transfers.push(Transfer { to_route_stop, cost: same_stop_cost, time: same_stop_time });
                }
            }
            if let Some(targets) = footpaths.get(&route_stop.stop_idx) {
                for (&to_stop, &walk_time) in targets {
                    let time = config.transfer_time(walk_time);
                    let cost = config.transfer_cost(time);
                    for &to_route_stop in &route_stops_per_stop[to_stop as usize] {
                        transfers.push(Transfer { to_route_stop, cost, time });
                    }
                }
            }
            route_stop.num_transfers = transfers.len() - route_stop.transfers_idx;
        }

        Ok(Network {
            config,
            routes,
            route_stops,
            stops,
            stop_index,
            departures,
            departure_ids,
            transfers,
            stop_route_stops,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder_with_stops(count: usize) -> NetworkBuilder {
        let mut builder = NetworkBuilder::new(RaptorConfig { minimal_transfer_time: 120, ..RaptorConfig::default() });
        for i in 0..count {
            builder.add_stop(&format!("s{i}"), &format!("Stop {i}"));
        }
        builder
    }

    #[test]
    fn add_stop_is_idempotent() {
        let mut builder = builder_with_stops(2);
        assert_eq!(builder.add_stop("s1", "Another name"), 1);
        assert_eq!(builder.add_stop("s2", "Stop 2"), 2);
        assert_eq!(builder.stop_idx("s2"), Ok(2));
        assert_eq!(builder.stop_idx("nope"), Err(NetworkError::UnknownStopId("nope".to_owned())));
    }

    #[test]
    fn rejects_invalid_routes() {
        let mut builder = builder_with_stops(3);
        assert_eq!(
            builder.add_route("x", "short", vec![RouteStopTimes::new(0, 0, 0)]),
            Err(NetworkError::RouteTooShort("short".to_owned()))
        );
        assert_eq!(
            builder.add_route("x", "unknown", vec![RouteStopTimes::new(0, 0, 0), RouteStopTimes::new(7, 60, 60)]),
            Err(NetworkError::UnknownStop(7))
        );
        assert_eq!(
            builder.add_route("x", "dwell", vec![RouteStopTimes::new(0, 0, 0), RouteStopTimes::new(1, 60, 30)]),
            Err(NetworkError::InvalidOffsets { route: "dwell".to_owned(), position: 1 })
        );
        assert_eq!(
            builder.add_route("x", "backwards", vec![
                RouteStopTimes::new(0, 0, 100),
                RouteStopTimes::new(1, 60, 60),
                RouteStopTimes::new(2, 120, 120),
            ]),
            Err(NetworkError::InvalidOffsets { route: "backwards".to_owned(), position: 1 })
        );
        assert_eq!(builder.add_departure(3, "t", 0), Err(NetworkError::UnknownRoute(3)));
        assert_eq!(builder.add_footpath(0, 9, 60), Err(NetworkError::UnknownStop(9)));
    }

    #[test]
    fn generates_same_stop_and_footpath_transfers() {
        let mut builder = builder_with_stops(3);
        let red = builder
            .add_route("red", "red", vec![RouteStopTimes::new(0, 0, 0), RouteStopTimes::new(1, 60, 60)])
            .unwrap();
        let blue = builder
            .add_route("blue", "blue", vec![RouteStopTimes::new(1, 0, 0), RouteStopTimes::new(2, 60, 60)])
            .unwrap();
        builder.add_departure(red, "r", 0).unwrap();
        builder.add_departure(blue, "b", 0).unwrap();
        builder.add_footpath(0, 2, 300).unwrap();
        builder.add_footpath(0, 2, 200).unwrap();
        builder.add_footpath(2, 0, 60).unwrap();
        builder.add_footpath(1, 1, 60).unwrap();
        let network = builder.build().unwrap();
        let config = &network.config;

        // Stop 0: red[0] walks to blue[1] at stop 2.
        assert_eq!(network.transfers_from(0), &[Transfer { to_route_stop: 3, cost: config.transfer_cost(200), time: 200 }]);
        // Stop 1: red[1] and blue[0] can change in place, with the minimal transfer time.
        assert_eq!(network.transfers_from(1), &[Transfer { to_route_stop: 2, cost: config.transfer_cost(120), time: 120 }]);
        assert_eq!(network.transfers_from(2), &[Transfer { to_route_stop: 1, cost: config.transfer_cost(120), time: 120 }]);
        // Stop 2: the footpath is shorter than the minimal transfer time.
        assert_eq!(network.transfers_from(3), &[Transfer { to_route_stop: 0, cost: config.transfer_cost(120), time: 120 }]);
    }
}
