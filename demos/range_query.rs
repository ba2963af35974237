use raptor::{range_query, DepartureWindow};

use dev_utils::get_example_scenario;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let (network, access, desired, egress) = get_example_scenario();
    network.print_stats();

    let window = DepartureWindow::around(desired, 15 * 60, 60 * 60);
    let query_start = std::time::Instant::now();
    let itineraries = range_query(&network, window, &access, &egress);
    println!("Query took {:?}", query_start.elapsed());

    if itineraries.is_empty() {
        println!("No journey found.");
    }
    for itinerary in itineraries {
        println!("{itinerary}");
    }

    Ok(())
}
