use chrono::NaiveDate;
use gtfs_structures::{Error, Gtfs, GtfsReader};
use raptor::network::{PathfindingCost, StopIndex, Timestamp};
use raptor::{Network, NetworkBuilder, RaptorConfig, RouteStopTimes, StopAccess};

// Common fixture networks for the tests, benchmarks and demos.

pub const MINUTE: Timestamp = 60;

pub fn hm(hours: Timestamp, minutes: Timestamp) -> Timestamp { hours * 3600 + minutes * MINUTE }

pub fn load_example_gtfs() -> Result<Gtfs, Error> {
    GtfsReader::default().read_shapes(false).read(concat!(env!("CARGO_MANIFEST_DIR"), "/gtfs/tiny"))
}

pub fn get_example_date() -> NaiveDate {
    // A Friday with calendar date exceptions in the example feed.
    NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
}

/// Walking one minute to or from a stop, at the default cost rates.
pub fn one_minute_walk(network: &Network, stop_id: &str) -> StopAccess {
    let stop = stop(network, stop_id);
    StopAccess::new(stop, MINUTE, network.config.walking_cost(MINUTE))
}

pub fn stop(network: &Network, stop_id: &str) -> StopIndex {
    network.get_stop_idx(stop_id).unwrap_or_else(|| panic!("Unknown fixture stop {stop_id}."))
}

fn add_stops(builder: &mut NetworkBuilder, ids: &[&str]) -> Vec<StopIndex> {
    ids.iter().map(|id| builder.add_stop(id, &format!("Stop {}", id.to_uppercase()))).collect()
}

/// One line a -> b -> c, leaving a every 20 minutes from 5:06 to 7:46.
pub fn single_line_network() -> Network {
    let mut builder = NetworkBuilder::new(RaptorConfig::default());
    let stops = add_stops(&mut builder, &["a", "b", "c"]);
    let line = builder
        .add_route("blue", "blue", vec![
            RouteStopTimes::new(stops[0], 0, 0),
            RouteStopTimes::new(stops[1], 7 * MINUTE, 7 * MINUTE),
            RouteStopTimes::new(stops[2], 26 * MINUTE, 26 * MINUTE),
        ])
        .unwrap();
    for i in 0..9 {
        builder.add_departure(line, &format!("blue{i}"), hm(5, 6) + i * 20 * MINUTE).unwrap();
    }
    builder.build().unwrap()
}

/// A slow line a -> c -> g every 20 minutes from 5:06, and an hourly express c -> g that is cheaper despite the change.
///
/// Riding the slow line from a to g takes 42 minutes, changing at c to the express takes 23 including the wait.
pub fn shortcut_network() -> Network {
    let mut builder = NetworkBuilder::new(RaptorConfig::default());
    let stops = add_stops(&mut builder, &["a", "c", "g"]);
    let slow = builder
        .add_route("blue", "blue", vec![
            RouteStopTimes::new(stops[0], 0, 0),
            RouteStopTimes::new(stops[1], 12 * MINUTE, 12 * MINUTE),
            RouteStopTimes::new(stops[2], 42 * MINUTE, 42 * MINUTE),
        ])
        .unwrap();
    let express = builder
        .add_route("red", "red", vec![
            RouteStopTimes::new(stops[1], 0, 0),
            RouteStopTimes::new(stops[2], 9 * MINUTE, 9 * MINUTE),
        ])
        .unwrap();
    for i in 0..9 {
        builder.add_departure(slow, &format!("blue{i}"), hm(5, 6) + i * 20 * MINUTE).unwrap();
    }
    for hour in 5..9 {
        builder.add_departure(express, &format!("red{hour}"), hm(hour, 0)).unwrap();
    }
    builder.build().unwrap()
}

/// Two ways from x to z: line p to y1, a one minute walk to y2 and line q, or the slower direct line d.
///
/// The change at y1/y2 leaves three minutes, so a minimal transfer time above 180 s makes it impossible.
/// Without a transfer penalty the change is cheaper by 1.4.
pub fn interchange_network(minimal_transfer_time: Timestamp, transfer_penalty: PathfindingCost) -> Network {
    let config = RaptorConfig { transfer_penalty, minimal_transfer_time, ..RaptorConfig::default() };
    let mut builder = NetworkBuilder::new(config);
    let stops = add_stops(&mut builder, &["x", "y1", "y2", "z"]);
    let (x, y1, y2, z) = (stops[0], stops[1], stops[2], stops[3]);
    let p = builder.add_route("P", "p", vec![RouteStopTimes::new(x, 0, 0), RouteStopTimes::new(y1, 10 * MINUTE, 10 * MINUTE)]).unwrap();
    let q = builder.add_route("Q", "q", vec![RouteStopTimes::new(y2, 0, 0), RouteStopTimes::new(z, 10 * MINUTE, 10 * MINUTE)]).unwrap();
    let d = builder.add_route("D", "d", vec![RouteStopTimes::new(x, 0, 0), RouteStopTimes::new(z, 28 * MINUTE, 28 * MINUTE)]).unwrap();
    for hour in [6, 7] {
        builder.add_departure(p, &format!("p{hour}"), hm(hour, 0)).unwrap();
        builder.add_departure(q, &format!("q{hour}"), hm(hour, 13)).unwrap();
        builder.add_departure(d, &format!("d{hour}"), hm(hour, 2)).unwrap();
    }
    builder.add_footpath(y1, y2, MINUTE).unwrap();
    builder.build().unwrap()
}

/// Line r runs s0 -> x -> y, with footpaths x -> y and y -> z, and line r2 runs z -> dest at 6:10 and 6:40.
///
/// Walking x -> y -> z would catch the 6:10 departure, but only if both footpaths were taken in the same round.
pub fn footpath_chain_network() -> Network {
    let mut builder = NetworkBuilder::new(RaptorConfig::default());
    let stops = add_stops(&mut builder, &["s0", "x", "y", "z", "dest"]);
    let (s0, x, y, z, dest) = (stops[0], stops[1], stops[2], stops[3], stops[4]);
    let r = builder
        .add_route("R", "r", vec![
            RouteStopTimes::new(s0, 0, 0),
            RouteStopTimes::new(x, 5 * MINUTE, 5 * MINUTE),
            RouteStopTimes::new(y, 35 * MINUTE, 35 * MINUTE),
        ])
        .unwrap();
    let r2 = builder.add_route("R2", "r2", vec![RouteStopTimes::new(z, 0, 0), RouteStopTimes::new(dest, 10 * MINUTE, 10 * MINUTE)]).unwrap();
    builder.add_departure(r, "r0", hm(6, 0)).unwrap();
    builder.add_departure(r2, "r2a", hm(6, 10)).unwrap();
    builder.add_departure(r2, "r2b", hm(6, 40)).unwrap();
    builder.add_footpath(x, y, 2 * MINUTE).unwrap();
    builder.add_footpath(y, z, 2 * MINUTE).unwrap();
    builder.build().unwrap()
}

/// A reproducible random network: routes over distinct random stops with regular headways, plus random footpaths.
pub fn random_network(seed: u64, num_stops: usize, num_routes: usize) -> Network {
    let mut rng = fastrand::Rng::with_seed(seed);
    let config = RaptorConfig { minimal_transfer_time: MINUTE, ..RaptorConfig::default() };
    let mut builder = NetworkBuilder::new(config);
    let ids: Vec<String> = (0..num_stops).map(|i| format!("s{i}")).collect();
    let stops: Vec<StopIndex> = ids.iter().map(|id| builder.add_stop(id, id)).collect();

    for route in 0..num_routes {
        let mut order = stops.clone();
        rng.shuffle(&mut order);
        let length = rng.usize(2..=num_stops.clamp(2, 8));
        let mut offset = 0;
        let mut route_stops = Vec::with_capacity(length);
        for (position, &stop) in order.iter().take(length).enumerate() {
            if position > 0 {
                offset += rng.u32(2..=10) * MINUTE;
            }
            let dwell = if position > 0 { rng.u32(0..=1) * MINUTE } else { 0 };
            route_stops.push(RouteStopTimes::new(stop, offset, offset + dwell));
            offset += dwell;
        }
        let route_idx = builder.add_route(&format!("L{route}"), &format!("route{route}"), route_stops).unwrap();
        let first = hm(5, 0) + rng.u32(0..60) * MINUTE;
        let headway = rng.u32(10..=30) * MINUTE;
        for trip in 0..rng.u32(4..=12) {
            builder.add_departure(route_idx, &format!("route{route}-{trip}"), first + trip * headway).unwrap();
        }
    }

    for _ in 0..num_stops {
        let from = stops[rng.usize(0..num_stops)];
        let to = stops[rng.usize(0..num_stops)];
        if from != to {
            builder.add_footpath(from, to, rng.u32(1..=6) * MINUTE).unwrap();
        }
    }
    builder.build().unwrap()
}

/// A random network with a handful of access and egress stops, for benchmarks and demos.
pub fn get_example_scenario() -> (Network, Vec<StopAccess>, Timestamp, Vec<StopAccess>) {
    let network = random_network(7, 400, 120);
    let walk = |stop: StopIndex, minutes: Timestamp| {
        StopAccess::new(stop, minutes * MINUTE, network.config.walking_cost(minutes * MINUTE))
    };
    let access = vec![walk(0, 2), walk(1, 5), walk(2, 8)];
    let egress = vec![walk(397, 3), walk(398, 6), walk(399, 4)];
    (network, access, hm(6, 0), egress)
}
