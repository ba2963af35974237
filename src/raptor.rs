use fixedbitset::FixedBitSet;

use crate::journey::Itinerary;
use crate::label::{Arrival, LabelId, Labels, PathElement};
use crate::network::{DepartureIndex, Network, PathfindingCost, RouteStopIndex, StopIndex, Timestamp};

mod range;

pub use range::{range_query, DepartureWindow};

/// An entry or exit point of the network, with the time and cost of walking between it and the stop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StopAccess {
    pub stop: StopIndex,
    pub time: Timestamp,
    pub cost: PathfindingCost,
}

impl StopAccess {
    pub fn new(stop: StopIndex, time: Timestamp, cost: PathfindingCost) -> Self { Self { stop, time, cost } }
}

// The trip a route scan is currently riding.
#[derive(Clone, Copy)]
struct Boarding {
    label: LabelId,
    departure: DepartureIndex,
    trip_start: Timestamp,
    boarding_time: Timestamp,
    cost: PathfindingCost,
}

fn improves(candidate: PathfindingCost, best: PathfindingCost, strict: bool) -> bool {
    candidate < best || (!strict && candidate <= best)
}

/// Mutable state of the round based least cost search.
///
/// One core serves one query at a time; the network it reads from can be shared between any number of cores.
pub struct RaptorCore<'a> {
    network: &'a Network,
    labels: Labels,
    arrival_path_per_route_stop: Vec<Option<LabelId>>,
    egress_cost_per_route_stop: Vec<PathfindingCost>,
    least_arrival_cost_at_route_stop: Vec<PathfindingCost>,
    least_arrival_cost_at_stop: Vec<PathfindingCost>,
    arrival_path_per_stop: Vec<Option<LabelId>>,
    // Transfer results are only published to the stops once all transfers of a round are relaxed.
    tmp_arrival_path_per_stop: Vec<Option<LabelId>>,
    improved_route_stops: FixedBitSet,
    improved_stops: FixedBitSet,
    tmp_improved_stops: FixedBitSet,
    destination_route_stops: FixedBitSet,
    destinations: Vec<StopAccess>,
    best_arrival_cost: PathfindingCost,
    max_transfers: u32,
    max_transfers_after_first_arrival: u32,
}

impl<'a> RaptorCore<'a> {
    pub fn new(network: &'a Network) -> Self {
        let num_route_stops = network.num_route_stops();
        let num_stops = network.num_stops();
        Self {
            network,
            labels: Labels::new(),
            arrival_path_per_route_stop: vec![None; num_route_stops],
            egress_cost_per_route_stop: vec![PathfindingCost::INFINITY; num_route_stops],
            least_arrival_cost_at_route_stop: vec![PathfindingCost::INFINITY; num_route_stops],
            least_arrival_cost_at_stop: vec![PathfindingCost::INFINITY; num_stops],
            arrival_path_per_stop: vec![None; num_stops],
            tmp_arrival_path_per_stop: vec![None; num_stops],
            improved_route_stops: FixedBitSet::with_capacity(num_route_stops),
            improved_stops: FixedBitSet::with_capacity(num_stops),
            tmp_improved_stops: FixedBitSet::with_capacity(num_stops),
            destination_route_stops: FixedBitSet::with_capacity(num_route_stops),
            destinations: Vec::new(),
            best_arrival_cost: PathfindingCost::INFINITY,
            max_transfers: network.config.max_transfers,
            max_transfers_after_first_arrival: network.config.max_transfers_after_first_arrival,
        }
    }

    /// Overrides the round limits taken from the network's config.
    pub fn with_max_transfers(mut self, max_transfers: u32, max_transfers_after_first_arrival: u32) -> Self {
        self.max_transfers = max_transfers;
        self.max_transfers_after_first_arrival = max_transfers_after_first_arrival;
        self
    }

    /// Labels created by the last query.
    pub fn labels(&self) -> &Labels { &self.labels }

    /// Finds the least cost itinerary leaving at `departure_time` from any of `access` to any of `egress`.
    pub fn calc_least_cost_route(
        &mut self,
        departure_time: Timestamp,
        access: &[StopAccess],
        egress: &[StopAccess],
    ) -> Itinerary<'a> {
        log::debug!(
            "Least cost query at {} from {} access to {} egress stops.",
            crate::utils::get_time_str(departure_time),
            access.len(),
            egress.len()
        );
        self.reset();
        self.register_destinations(egress);
        self.seed_access(departure_time, access);

        let mut allowed_transfers_left = self.max_transfers_after_first_arrival;
        for round in 0..=self.max_transfers {
            self.explore_routes();
            log::trace!("Round {}: {} stops improved by routes.", round, self.improved_stops.count_ones(..));

            if self.find_least_cost_arrival().is_some() {
                if allowed_transfers_left == 0 {
                    break;
                }
                allowed_transfers_left -= 1;
            }

            if self.improved_stops.is_clear() {
                break;
            }

            self.handle_transfers(true);
            log::trace!("Round {}: {} route stops improved by transfers.", round, self.improved_route_stops.count_ones(..));

            if self.improved_route_stops.is_clear() {
                break;
            }
        }

        let destination = self.find_least_cost_arrival().map(|egress| self.labels.push(egress));
        let itinerary = Itinerary::assemble(self.network, &self.labels, destination, departure_time, 0.0);
        log::debug!(
            "Least cost query done with {} labels, cost {:.3}, {} transfers.",
            self.labels.len(),
            itinerary.cost,
            itinerary.transfer_count
        );
        itinerary
    }

    fn reset(&mut self) {
        self.labels.clear();
        self.arrival_path_per_route_stop.fill(None);
        self.egress_cost_per_route_stop.fill(PathfindingCost::INFINITY);
        self.least_arrival_cost_at_route_stop.fill(PathfindingCost::INFINITY);
        self.least_arrival_cost_at_stop.fill(PathfindingCost::INFINITY);
        self.arrival_path_per_stop.fill(None);
        self.tmp_arrival_path_per_stop.fill(None);
        self.improved_route_stops.clear();
        self.improved_stops.clear();
        self.tmp_improved_stops.clear();
        self.destination_route_stops.clear();
        self.destinations.clear();
        self.best_arrival_cost = PathfindingCost::INFINITY;
    }

    // Repeated egress entries for the same stop replace each other.
    fn register_destinations(&mut self, egress: &[StopAccess]) {
        for access in egress {
            match self.destinations.iter_mut().find(|destination| destination.stop == access.stop) {
                Some(destination) => *destination = *access,
                None => self.destinations.push(*access),
            }
        }
        for destination in &self.destinations {
            for &route_stop in self.network.route_stops_at(destination.stop) {
                self.destination_route_stops.insert(route_stop as usize);
                self.egress_cost_per_route_stop[route_stop as usize] = destination.cost;
            }
        }
    }

    // Two access entries reaching the same route stop keep the cheaper one.
    fn seed_access(&mut self, departure_time: Timestamp, access: &[StopAccess]) {
        let network = self.network;
        for access in access {
            for &route_stop in network.route_stops_at(access.stop) {
                if access.cost >= self.least_arrival_cost_at_route_stop[route_stop as usize] {
                    continue;
                }
                self.set_initial_label(route_stop, departure_time + access.time, access.cost);
            }
        }
    }

    fn set_initial_label(&mut self, route_stop: RouteStopIndex, arrival_time: Timestamp, arrival_cost: PathfindingCost) -> LabelId {
        let label = self.labels.push(PathElement {
            coming_from: None,
            to_route_stop: Some(route_stop),
            arrival_time,
            arrival_cost,
            transfer_count: 0,
            arrival: Arrival::Walk,
        });
        let stop = self.network.get_route_stop(route_stop).stop_idx as usize;
        self.arrival_path_per_route_stop[route_stop as usize] = Some(label);
        self.least_arrival_cost_at_route_stop[route_stop as usize] = arrival_cost;
        self.arrival_path_per_stop[stop] = Some(label);
        self.least_arrival_cost_at_stop[stop] = arrival_cost;
        self.improved_route_stops.insert(route_stop as usize);
        label
    }

    fn explore_routes(&mut self) {
        self.improved_stops.clear();
        let improved_route_stops = std::mem::take(&mut self.improved_route_stops);

        // Only the first improved route stop of a route starts a scan, which then covers the rest of the route.
        let mut handled_route = None;
        for first_route_stop in improved_route_stops.ones() {
            let route_idx = self.network.route_stops[first_route_stop].route_idx;
            if handled_route == Some(route_idx) {
                continue;
            }
            let Some(label) = self.arrival_path_per_route_stop[first_route_stop] else {
                continue;
            };
            let Some(boarding) = self.board(first_route_stop as RouteStopIndex, label) else {
                continue;
            };
            if boarding.cost > self.best_arrival_cost {
                continue;
            }
            handled_route = Some(route_idx);
            self.ride(first_route_stop, boarding);
        }

        self.improved_route_stops = improved_route_stops;
    }

    // Boards the next trip leaving `route_stop` after the arrival of `label`.
    fn board(&self, route_stop: RouteStopIndex, label: LabelId) -> Option<Boarding> {
        let element = &self.labels[label];
        let departure = self.network.next_departure_index(route_stop, element.arrival_time)?;
        let trip_start = self.network.departures[departure as usize];
        let vehicle_arrival = trip_start + self.network.get_route_stop(route_stop).arrival_offset;
        let boarding_time = element.arrival_time.max(vehicle_arrival);
        let waiting_cost = self.network.config.waiting_cost(boarding_time - element.arrival_time);
        Some(Boarding { label, departure, trip_start, boarding_time, cost: element.arrival_cost + waiting_cost })
    }

    fn ride(&mut self, first_route_stop: usize, mut boarding: Boarding) {
        let network = self.network;
        let route = network.get_route(network.route_stops[first_route_stop].route_idx);
        let end = route.route_stops_idx + route.num_route_stops;

        for to_route_stop in (first_route_stop + 1)..end {
            let route_stop = &network.route_stops[to_route_stop];
            let arrival_time = boarding.trip_start + route_stop.arrival_offset;
            let in_vehicle_time = arrival_time.saturating_sub(boarding.boarding_time);
            let arrival_cost = boarding.cost + network.config.in_vehicle_cost(in_vehicle_time);

            if arrival_cost <= self.least_arrival_cost_at_route_stop[to_route_stop] {
                let transfer_count = self.labels[boarding.label].transfer_count;
                let label = self.labels.push(PathElement {
                    coming_from: Some(boarding.label),
                    to_route_stop: Some(to_route_stop as RouteStopIndex),
                    arrival_time,
                    arrival_cost,
                    transfer_count,
                    arrival: Arrival::Ride { departure: boarding.departure },
                });
                self.arrival_path_per_route_stop[to_route_stop] = Some(label);
                self.least_arrival_cost_at_route_stop[to_route_stop] = arrival_cost;

                let stop = route_stop.stop_idx as usize;
                if arrival_cost <= self.least_arrival_cost_at_stop[stop] {
                    self.least_arrival_cost_at_stop[stop] = arrival_cost;
                    self.arrival_path_per_stop[stop] = Some(label);
                    self.improved_stops.insert(stop);
                    self.check_for_best_arrival(to_route_stop, arrival_cost);
                }
            } else if let Some(label) = self.arrival_path_per_route_stop[to_route_stop] {
                // A cheaper arrival exists here already; continue on its trip if boarding that is cheaper.
                if let Some(alternative) = self.board(to_route_stop as RouteStopIndex, label) {
                    if alternative.cost < arrival_cost {
                        boarding = alternative;
                    }
                }
            }
        }
    }

    fn check_for_best_arrival(&mut self, route_stop: usize, arrival_cost: PathfindingCost) {
        if self.destination_route_stops.contains(route_stop) {
            let total_cost = arrival_cost + self.egress_cost_per_route_stop[route_stop];
            if total_cost < self.best_arrival_cost {
                self.best_arrival_cost = total_cost;
            }
        }
    }

    /// Relaxes the transfers of every stop improved by the last route scan.
    ///
    /// In strict mode only strictly cheaper arrivals replace existing ones.
    fn handle_transfers(&mut self, strict: bool) {
        self.improved_route_stops.clear();
        self.tmp_improved_stops.clear();
        let network = self.network;

        for stop in self.improved_stops.ones() {
            let Some(from_label) = self.arrival_path_per_stop[stop] else {
                continue;
            };
            let from = self.labels[from_label];
            if from.arrival_cost > self.best_arrival_cost {
                continue;
            }
            let Some(from_route_stop) = from.to_route_stop else {
                continue;
            };
            for transfer in network.transfers_from(from_route_stop) {
                let to_route_stop = transfer.to_route_stop as usize;
                let arrival_cost = from.arrival_cost + transfer.cost;
                if !improves(arrival_cost, self.least_arrival_cost_at_route_stop[to_route_stop], strict) {
                    continue;
                }
                let label = self.labels.push(PathElement {
                    coming_from: Some(from_label),
                    to_route_stop: Some(transfer.to_route_stop),
                    arrival_time: from.arrival_time + transfer.time,
                    arrival_cost,
                    transfer_count: from.transfer_count + 1,
                    arrival: Arrival::Walk,
                });
                self.arrival_path_per_route_stop[to_route_stop] = Some(label);
                self.least_arrival_cost_at_route_stop[to_route_stop] = arrival_cost;
                self.improved_route_stops.insert(to_route_stop);

                let to_stop = network.route_stops[to_route_stop].stop_idx as usize;
                if improves(arrival_cost, self.least_arrival_cost_at_stop[to_stop], strict) {
                    self.least_arrival_cost_at_stop[to_stop] = arrival_cost;
                    self.tmp_arrival_path_per_stop[to_stop] = Some(label);
                    self.tmp_improved_stops.insert(to_stop);
                }
            }
        }

        for stop in self.tmp_improved_stops.ones() {
            self.arrival_path_per_stop[stop] = self.tmp_arrival_path_per_stop[stop];
        }
    }

    /// The cheapest way out of the network from the current stop labels, as an unsaved egress label.
    ///
    /// Equal total costs are resolved in favour of fewer transfers.
    fn find_least_cost_arrival(&self) -> Option<PathElement> {
        let mut least_cost_path: Option<PathElement> = None;
        for destination in &self.destinations {
            let Some(&Some(label)) = self.arrival_path_per_stop.get(destination.stop as usize) else {
                continue;
            };
            let element = &self.labels[label];
            let total_cost = element.arrival_cost + destination.cost;
            let is_better = least_cost_path.as_ref().map_or(true, |best| {
                total_cost < best.arrival_cost
                    || (total_cost == best.arrival_cost && element.transfer_count < best.transfer_count)
            });
            if is_better {
                least_cost_path = Some(PathElement {
                    coming_from: Some(label),
                    to_route_stop: None,
                    arrival_time: element.arrival_time + destination.time,
                    arrival_cost: total_cost,
                    transfer_count: element.transfer_count,
                    arrival: Arrival::Walk,
                });
            }
        }
        least_cost_path
    }
}

/// Least cost itinerary between the access and egress stops for a departure at `departure_time`.
pub fn raptor_query<'a>(
    network: &'a Network,
    departure_time: Timestamp,
    access: &[StopAccess],
    egress: &[StopAccess],
) -> Itinerary<'a> {
    RaptorCore::new(network).calc_least_cost_route(departure_time, access, egress)
}
