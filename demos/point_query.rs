use raptor::{raptor_query, utils, Network, RaptorConfig, StopAccess};

use dev_utils::{get_example_date, load_example_gtfs};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Load GTFS timetable from disk and keep the trips of one day.
    let gtfs = load_example_gtfs()?;
    let network = Network::from_gtfs(&gtfs, get_example_date(), RaptorConfig::default())?;

    let start = network.get_stop_idx_from_name("First Street").ok_or("Unknown start stop.")?;
    let end = network.get_stop_idx_from_name("Third Street").ok_or("Unknown end stop.")?;
    let walk_time = 2 * 60;
    let walk_cost = network.config.walking_cost(walk_time);
    let departure_time = utils::parse_time("06:50:00")?;

    let itinerary = raptor_query(
        &network,
        departure_time,
        &[StopAccess::new(start, walk_time, walk_cost)],
        &[StopAccess::new(end, walk_time, walk_cost)],
    );
    println!("{itinerary}");

    Ok(())
}
