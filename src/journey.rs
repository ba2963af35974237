use std::fmt::{Debug, Display};

use crate::label::{Arrival, LabelId, Labels};
use crate::network::{DepartureIndex, Network, PathfindingCost, RouteIndex, StopIndex, Timestamp};
use crate::utils;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkKind {
    Access,
    Egress,
    Transfer,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Leg {
    Transit {
        from_stop: StopIndex,
        to_stop: StopIndex,
        route: RouteIndex,
        departure: DepartureIndex,
        /// Arrival at the boarding stop, so the duration includes the wait for the vehicle.
        start_time: Timestamp,
        duration: Timestamp,
    },
    /// A stop of `None` lies outside the network (origin or destination).
    Walk {
        from_stop: Option<StopIndex>,
        to_stop: Option<StopIndex>,
        start_time: Timestamp,
        duration: Timestamp,
        kind: WalkKind,
    },
}

impl Leg {
    pub fn start_time(&self) -> Timestamp {
        match self {
            Leg::Transit { start_time, .. } | Leg::Walk { start_time, .. } => *start_time,
        }
    }

    pub fn duration(&self) -> Timestamp {
        match self {
            Leg::Transit { duration, .. } | Leg::Walk { duration, .. } => *duration,
        }
    }

    pub fn end_time(&self) -> Timestamp { self.start_time() + self.duration() }

    pub fn is_transit(&self) -> bool { matches!(self, Leg::Transit { .. }) }
}

/// Result of a query. An itinerary without legs and with infinite cost means nothing was found.
#[derive(Clone)]
pub struct Itinerary<'a> {
    pub legs: Vec<Leg>,
    pub cost: PathfindingCost,
    pub departure_time: Timestamp,
    pub travel_time: Timestamp,
    pub transfer_count: u32,
    pub network: &'a Network,
}

impl<'a> Itinerary<'a> {
    pub fn empty(network: &'a Network, departure_time: Timestamp) -> Self {
        Self { legs: Vec::new(), cost: PathfindingCost::INFINITY, departure_time, travel_time: 0, transfer_count: 0, network }
    }

    pub fn is_found(&self) -> bool { self.cost.is_finite() }

    pub fn arrival_time(&self) -> Timestamp { self.departure_time + self.travel_time }

    /// Leaves no earlier, arrives no later and needs no more transfers than `other`.
    pub fn dominates(&self, other: &Itinerary) -> bool {
        self.transfer_count <= other.transfer_count
            && self.departure_time >= other.departure_time
            && self.arrival_time() <= other.arrival_time()
    }

    /// Builds the itinerary ending in the egress label `destination`.
    ///
    /// `cost_offset` is subtracted from the label cost, which lets range queries report comparable costs.
    pub(crate) fn assemble(
        network: &'a Network,
        labels: &Labels,
        destination: Option<LabelId>,
        departure_time: Timestamp,
        cost_offset: PathfindingCost,
    ) -> Self {
        let Some(destination) = destination else {
            return Self::empty(network, departure_time);
        };
        let egress = &labels[destination];
        let path = labels.path_to(destination);

        let mut legs = Vec::with_capacity(path.len());
        let mut time = departure_time;
        let mut from_stop: Option<StopIndex> = None;
        for (i, &label_id) in path.iter().enumerate() {
            let element = &labels[label_id];
            let to_stop = element.to_route_stop.map(|route_stop| network.get_route_stop(route_stop).stop_idx);
            let duration = element.arrival_time.saturating_sub(time);
            match element.arrival {
                Arrival::Walk => {
                    if from_stop.is_some() && from_stop == to_stop {
                        // Changing vehicles within a stop is part of the next transit leg.
                        continue;
                    }
                    if i + 2 == path.len() {
                        // Merged into the egress walk.
                        continue;
                    }
                    let kind = match (from_stop, to_stop) {
                        (None, Some(_)) => WalkKind::Access,
                        (Some(_), None) => WalkKind::Egress,
                        _ => WalkKind::Transfer,
                    };
                    legs.push(Leg::Walk { from_stop, to_stop, start_time: time, duration, kind });
                }
                Arrival::Ride { departure } => {
                    if let (Some(boarded_stop), Some(route_stop)) = (from_stop, element.to_route_stop) {
                        let route_stop = network.get_route_stop(route_stop);
                        legs.push(Leg::Transit {
                            from_stop: boarded_stop,
                            to_stop: route_stop.stop_idx,
                            route: route_stop.route_idx,
                            departure,
                            start_time: time,
                            duration,
                        });
                    }
                }
            }
            time = element.arrival_time;
            from_stop = to_stop;
        }

        Self {
            legs,
            cost: egress.arrival_cost - cost_offset,
            departure_time,
            travel_time: egress.arrival_time.saturating_sub(departure_time),
            transfer_count: egress.transfer_count,
            network,
        }
    }

    fn stop_name(&self, stop: Option<StopIndex>, outside: &'static str) -> &str {
        match stop {
            Some(stop) => &self.network.get_stop(stop).name,
            None => outside,
        }
    }
}

impl Debug for Itinerary<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Itinerary")
            .field("legs", &self.legs)
            .field("cost", &self.cost)
            .field("departure_time", &self.departure_time)
            .field("travel_time", &self.travel_time)
            .field("transfer_count", &self.transfer_count)
            .finish_non_exhaustive()
    }
}

impl Display for Itinerary<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "-----------------------------------------------")?;
        if self.is_found() {
            for leg in self.legs.iter() {
                writeln!(f)?;
                match leg {
                    Leg::Transit { from_stop, to_stop, route, departure, start_time, duration } => {
                        writeln!(f,
                                 "Board at {} after {} ({} line, trip {}).",
                                 self.network.get_stop(*from_stop).name,
                                 utils::get_time_str(*start_time),
                                 self.network.get_route(*route).line,
                                 self.network.departure_id(*departure),
                        )?;
                        write!(f,
                               "Arrive at {} at {}.",
                               self.network.get_stop(*to_stop).name,
                               utils::get_time_str(start_time + duration)
                        )?;
                    }
                    Leg::Walk { from_stop, to_stop, start_time, duration, kind } => {
                        write!(f,
                               "Walk from {} to {} at {} ({} seconds, {:?}).",
                               self.stop_name(*from_stop, "origin"),
                               self.stop_name(*to_stop, "destination"),
                               utils::get_time_str(*start_time),
                               duration,
                               kind,
                        )?;
                    }
                }
            }
            writeln!(f)?;
            writeln!(f,
                     "Departure at {}, total journey time: {} minutes, {} transfers, cost {:.2}.",
                     utils::get_time_str(self.departure_time),
                     self.travel_time / 60,
                     self.transfer_count,
                     self.cost,
            )?;
        } else {
            writeln!(f)?;
            writeln!(f, "No journey found.")?;
        }
        writeln!(f, "-----------------------------------------------")?;
        Ok(())
    }
}
