use serde::{Deserialize, Serialize};

use crate::network::{PathfindingCost, Timestamp};

/// Parameters of the cost model and of the search limits.
///
/// Marginal utilities are given in utils per second and are expected to be
/// negative, so that time spent travelling, waiting or walking adds a
/// positive cost. The config is captured by the network when it is built,
/// because transfer costs are baked into the transfer edges.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaptorConfig {
    pub marginal_utility_of_travel_time: f64,
    pub marginal_utility_of_waiting: f64,
    pub marginal_utility_of_walking: f64,
    /// Fixed cost of every transfer, may be zero or negative.
    pub transfer_penalty: PathfindingCost,
    /// Lower bound for the time of any transfer edge, including same-stop transfers.
    pub minimal_transfer_time: Timestamp,
    pub max_transfers: u32,
    /// Extra rounds explored once a destination has been reached.
    pub max_transfers_after_first_arrival: u32,
}

impl Default for RaptorConfig {
    fn default() -> Self {
        Self {
            marginal_utility_of_travel_time: -12.0 / 3600.0,
            marginal_utility_of_waiting: -12.0 / 3600.0,
            marginal_utility_of_walking: -12.0 / 3600.0,
            transfer_penalty: 1.0,
            minimal_transfer_time: 0,
            max_transfers: 20,
            max_transfers_after_first_arrival: 2,
        }
    }
}

impl RaptorConfig {
    pub fn waiting_cost(&self, waiting_time: Timestamp) -> PathfindingCost {
        -self.marginal_utility_of_waiting * waiting_time as PathfindingCost
    }

    pub fn in_vehicle_cost(&self, in_vehicle_time: Timestamp) -> PathfindingCost {
        -self.marginal_utility_of_travel_time * in_vehicle_time as PathfindingCost
    }

    pub fn walking_cost(&self, walk_time: Timestamp) -> PathfindingCost {
        -self.marginal_utility_of_walking * walk_time as PathfindingCost
    }

    /// Time of a transfer edge with the given walking time.
    pub fn transfer_time(&self, walk_time: Timestamp) -> Timestamp {
        walk_time.max(self.minimal_transfer_time)
    }

    /// Cost of a transfer edge taking `transfer_time` seconds.
    pub fn transfer_cost(&self, transfer_time: Timestamp) -> PathfindingCost {
        self.transfer_penalty + self.walking_cost(transfer_time)
    }

    // Departing `delay` seconds after the earliest possible departure makes the
    // start cheaper by the waiting that is no longer necessary (result is <= 0).
    pub fn departure_cost_offset(&self, delay: Timestamp) -> PathfindingCost {
        self.marginal_utility_of_waiting * delay as PathfindingCost
    }
}
