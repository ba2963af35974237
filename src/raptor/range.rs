use std::collections::HashMap;

use crate::journey::Itinerary;
use crate::label::LabelId;
use crate::network::{DepartureIndex, Network, PathfindingCost, RouteStopIndex, Timestamp};

use super::{RaptorCore, StopAccess};

/// Departure times considered by a range query, all at the origin (before the access walk).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepartureWindow {
    pub earliest: Timestamp,
    pub desired: Timestamp,
    pub latest: Timestamp,
}

impl DepartureWindow {
    pub fn new(earliest: Timestamp, desired: Timestamp, latest: Timestamp) -> Self { Self { earliest, desired, latest } }

    pub fn around(desired: Timestamp, before: Timestamp, after: Timestamp) -> Self {
        Self::new(desired.saturating_sub(before), desired, desired.saturating_add(after))
    }
}

// A vehicle departure that can be reached directly from an access stop.
#[derive(Clone, Copy, Debug)]
struct DepartureCandidate {
    route_stop: RouteStopIndex,
    departure: DepartureIndex,
    time_at_stop: Timestamp,
    cost_offset: PathfindingCost,
    access: StopAccess,
}

impl DepartureCandidate {
    fn start_cost(&self) -> PathfindingCost { self.access.cost + self.cost_offset }
}

impl<'a> RaptorCore<'a> {
    /// Finds the non-dominated itineraries for departures within `window`.
    ///
    /// Every departure reachable from an access stop within the window is searched on its own, from the most
    /// to the least expensive start. Later departures start cheaper by the waiting they save, so they improve on
    /// the labels left behind by earlier ones. Results are ordered by departure time, then transfers, then
    /// travel time.
    pub fn calc_routes(&mut self, window: DepartureWindow, access: &[StopAccess], egress: &[StopAccess]) -> Vec<Itinerary<'a>> {
        if !(window.earliest <= window.desired && window.desired <= window.latest) {
            log::warn!("Departure window {:?} is not ordered earliest <= desired <= latest.", window);
        }
        log::debug!(
            "Range query from {} to {} from {} access to {} egress stops.",
            crate::utils::get_time_str(window.earliest),
            crate::utils::get_time_str(window.latest),
            access.len(),
            egress.len()
        );

        let found = self.collect_routes(window, access, egress);
        let num_found = found.len();
        let mut itineraries = filter_itineraries(found);
        itineraries.sort_by(|a, b| {
            a.departure_time
                .cmp(&b.departure_time)
                .then(a.transfer_count.cmp(&b.transfer_count))
                .then(a.travel_time.cmp(&b.travel_time))
        });
        log::debug!("Range query kept {} of {} itineraries.", itineraries.len(), num_found);
        itineraries
    }

    fn enumerate_departures(&self, window: &DepartureWindow, access: &[StopAccess]) -> Vec<DepartureCandidate> {
        let network = self.network;
        let mut candidates = Vec::new();
        for access in access {
            let earliest_at_stop = window.earliest + access.time;
            let latest_at_stop = window.latest + access.time;
            for &route_stop_idx in network.route_stops_at(access.stop) {
                if network.is_last_route_stop(route_stop_idx) {
                    continue;
                }
                let route_stop = network.get_route_stop(route_stop_idx);
                let route = network.get_route(route_stop.route_idx);
                for (offset, &trip_start) in route.get_departures(&network.departures).iter().enumerate() {
                    let time_at_stop = trip_start + route_stop.departure_offset;
                    if !(earliest_at_stop..=latest_at_stop).contains(&time_at_stop) {
                        continue;
                    }
                    candidates.push(DepartureCandidate {
                        route_stop: route_stop_idx,
                        departure: (route.departures_idx + offset) as DepartureIndex,
                        time_at_stop,
                        cost_offset: network.config.departure_cost_offset(time_at_stop - earliest_at_stop),
                        access: *access,
                    });
                }
            }
        }
        candidates.sort_by(|a, b| b.start_cost().total_cmp(&a.start_cost()).then(b.departure.cmp(&a.departure)));
        candidates
    }

    /// Runs the search once per departure candidate and returns every accepted itinerary in discovery order.
    pub(crate) fn collect_routes(&mut self, window: DepartureWindow, access: &[StopAccess], egress: &[StopAccess]) -> Vec<Itinerary<'a>> {
        let network = self.network;
        self.reset();
        let candidates = self.enumerate_departures(&window, access);
        self.register_destinations(egress);
        log::trace!("{} departure candidates.", candidates.len());

        // Best-known tables are shared by all candidates, only the frontier and the bound start over.
        let mut max_transfers = self.max_transfers;
        let mut access_time_per_root: HashMap<LabelId, Timestamp> = HashMap::new();
        let mut last_found: Option<Option<LabelId>> = None;
        let mut found = Vec::new();
        for candidate in &candidates {
            self.improved_stops.clear();
            self.improved_route_stops.clear();
            self.best_arrival_cost = PathfindingCost::INFINITY;
            let root = self.set_initial_label(candidate.route_stop, candidate.time_at_stop, candidate.start_cost());
            access_time_per_root.insert(root, candidate.access.time);

            let mut round = 0;
            while round <= max_transfers {
                self.explore_routes();

                if let Some(egress) = self.find_least_cost_arrival() {
                    if last_found != Some(egress.coming_from) {
                        last_found = Some(egress.coming_from);
                        let destination = self.labels.push(egress);
                        let departure_time = self.optimal_departure_time(destination, &access_time_per_root);
                        let itinerary =
                            Itinerary::assemble(network, &self.labels, Some(destination), departure_time, candidate.cost_offset);
                        log::debug!(
                            "Found itinerary departing {} with {} transfers and cost {:.3}.",
                            crate::utils::get_time_str(itinerary.departure_time),
                            itinerary.transfer_count,
                            itinerary.cost
                        );
                        found.push(itinerary);

                        max_transfers = max_transfers.min(egress.transfer_count + self.max_transfers_after_first_arrival);
                        if round == max_transfers {
                            break;
                        }
                    }
                }

                if self.improved_stops.is_clear() {
                    break;
                }

                self.handle_transfers(false);

                if self.improved_route_stops.is_clear() {
                    break;
                }
                round += 1;
            }
        }
        found
    }

    // The label the path starts from is the boarding itself, so leave early enough to walk there and change.
    fn optimal_departure_time(&self, destination: LabelId, access_time_per_root: &HashMap<LabelId, Timestamp>) -> Timestamp {
        let root = self.labels.root_of(destination);
        let access_time = access_time_per_root.get(&root).copied().unwrap_or(0);
        self.labels[root]
            .arrival_time
            .saturating_sub(self.network.config.minimal_transfer_time)
            .saturating_sub(access_time)
    }
}

/// Removes itineraries sharing transfers, departure and travel time with another one, then the dominated ones.
pub(crate) fn filter_itineraries(mut itineraries: Vec<Itinerary<'_>>) -> Vec<Itinerary<'_>> {
    itineraries.sort_by(|a, b| {
        a.transfer_count
            .cmp(&b.transfer_count)
            .then(a.departure_time.cmp(&b.departure_time))
            .then(a.travel_time.cmp(&b.travel_time))
    });
    itineraries.dedup_by(|a, b| {
        a.transfer_count == b.transfer_count && a.departure_time == b.departure_time && a.travel_time == b.travel_time
    });

    let keep: Vec<bool> = itineraries
        .iter()
        .enumerate()
        .map(|(i, itinerary)| !itineraries.iter().enumerate().any(|(j, other)| i != j && other.dominates(itinerary)))
        .collect();
    itineraries.into_iter().zip(keep).filter_map(|(itinerary, keep)| keep.then_some(itinerary)).collect()
}

/// Non-dominated itineraries between the access and egress stops for departures within `window`.
pub fn range_query<'a>(
    network: &'a Network,
    window: DepartureWindow,
    access: &[StopAccess],
    egress: &[StopAccess],
) -> Vec<Itinerary<'a>> {
    RaptorCore::new(network).calc_routes(window, access, egress)
}

#[cfg(test)]
mod tests {
    use crate::builder::{NetworkBuilder, RouteStopTimes};
    use crate::config::RaptorConfig;

    use super::*;

    const MINUTE: Timestamp = 60;

    fn hm(hours: Timestamp, minutes: Timestamp) -> Timestamp { hours * 3600 + minutes * MINUTE }

    // A slow line a -> c -> g every 20 minutes, and an hourly express c -> g.
    fn shortcut_network() -> Network {
        let mut builder = NetworkBuilder::new(RaptorConfig::default());
        let a = builder.add_stop("a", "A");
        let c = builder.add_stop("c", "C");
        let g = builder.add_stop("g", "G");
        let slow = builder
            .add_route("slow", "slow", vec![
                RouteStopTimes::new(a, 0, 0),
                RouteStopTimes::new(c, 12 * MINUTE, 12 * MINUTE),
                RouteStopTimes::new(g, 44 * MINUTE, 44 * MINUTE),
            ])
            .unwrap();
        let express = builder
            .add_route("express", "express", vec![RouteStopTimes::new(c, 0, 0), RouteStopTimes::new(g, 9 * MINUTE, 9 * MINUTE)])
            .unwrap();
        for i in 0..9 {
            builder.add_departure(slow, &format!("slow{i}"), hm(5, 6) + i * 20 * MINUTE).unwrap();
        }
        for hour in 5..9 {
            builder.add_departure(express, &format!("express{hour}"), hm(hour, 0)).unwrap();
        }
        builder.build().unwrap()
    }

    fn itinerary<'a>(network: &'a Network, departure_time: Timestamp, travel_time: Timestamp, transfer_count: u32) -> Itinerary<'a> {
        Itinerary { legs: Vec::new(), cost: 0.0, departure_time, travel_time, transfer_count, network }
    }

    #[test]
    fn window_around_desired_time() {
        assert_eq!(DepartureWindow::around(600, 900, 300), DepartureWindow::new(0, 600, 900));
        let late = Timestamp::MAX - 10;
        assert_eq!(DepartureWindow::around(late, 5, 100), DepartureWindow::new(late - 5, late, Timestamp::MAX));
    }

    #[test]
    fn candidates_run_from_expensive_to_cheap_start() {
        let network = shortcut_network();
        let core = RaptorCore::new(&network);
        let window = DepartureWindow::new(hm(5, 40), hm(6, 0), hm(6, 50));
        let candidates = core.enumerate_departures(&window, &[StopAccess::new(0, MINUTE, 0.2), StopAccess::new(2, 0, 0.0)]);
        let times: Vec<_> = candidates.iter().map(|candidate| candidate.time_at_stop).collect();
        // Nothing can be boarded at g, the last stop of both lines.
        assert_eq!(times, vec![hm(5, 46), hm(6, 6), hm(6, 26), hm(6, 46)]);
        assert!((candidates[0].cost_offset + 1.0).abs() < 1e-9);
    }

    #[test]
    fn itineraries_are_collected_in_discovery_order() {
        let network = shortcut_network();
        let mut core = RaptorCore::new(&network);
        let window = DepartureWindow::new(hm(5, 40), hm(6, 0), hm(6, 50));
        let found = core.collect_routes(window, &[StopAccess::new(0, MINUTE, 0.2)], &[StopAccess::new(2, MINUTE, 0.2)]);
        let transfer_counts: Vec<_> = found.iter().map(|itinerary| itinerary.transfer_count).collect();
        assert_eq!(transfer_counts, vec![0, 1, 0, 0, 0, 1]);
    }

    // A slow direct line a -> z at 6:00, and a chain of four five minute lines a -> b -> c -> d -> z from 6:10.
    fn chain_network() -> Network {
        let mut builder = NetworkBuilder::new(RaptorConfig::default());
        let stops: Vec<_> = ["a", "b", "c", "d", "z"].iter().map(|id| builder.add_stop(id, id)).collect();
        let direct = builder
            .add_route("direct", "direct", vec![RouteStopTimes::new(stops[0], 0, 0), RouteStopTimes::new(stops[4], 40 * MINUTE, 40 * MINUTE)])
            .unwrap();
        builder.add_departure(direct, "direct0", hm(6, 0)).unwrap();
        for (i, pair) in stops.windows(2).enumerate() {
            let leg = builder
                .add_route(&format!("L{i}"), &format!("leg{i}"), vec![
                    RouteStopTimes::new(pair[0], 0, 0),
                    RouteStopTimes::new(pair[1], 5 * MINUTE, 5 * MINUTE),
                ])
                .unwrap();
            builder.add_departure(leg, &format!("leg{i}"), hm(6, 10) + i as Timestamp * 5 * MINUTE).unwrap();
        }
        builder.build().unwrap()
    }

    #[test]
    fn later_candidates_are_capped_at_two_transfers_above_the_first_result() {
        let network = chain_network();
        let access = [StopAccess::new(0, 0, 0.0)];
        let egress = [StopAccess::new(4, 0, 0.0)];

        // On its own the chain is the cheapest way to z, with three transfers.
        let chained = crate::raptor::raptor_query(&network, hm(6, 5), &access, &egress);
        assert_eq!(chained.transfer_count, 3);

        let window = DepartureWindow::new(hm(5, 55), hm(6, 0), hm(6, 30));
        let found = RaptorCore::new(&network).collect_routes(window, &access, &egress);
        let summary: Vec<_> = found.iter().map(|itinerary| (itinerary.departure_time, itinerary.transfer_count)).collect();
        assert_eq!(summary, vec![(hm(6, 0), 0)]);
    }

    #[test]
    fn filter_removes_duplicates_and_dominated() {
        let network = shortcut_network();
        let kept = filter_itineraries(vec![
            itinerary(&network, 100, 50, 1),
            itinerary(&network, 100, 50, 1),
            itinerary(&network, 100, 60, 0),
            itinerary(&network, 90, 70, 0),
            itinerary(&network, 110, 30, 2),
        ]);
        let summary: Vec<_> = kept.iter().map(|i| (i.departure_time, i.travel_time, i.transfer_count)).collect();
        assert_eq!(summary, vec![(100, 60, 0), (100, 50, 1), (110, 30, 2)]);
    }
}
