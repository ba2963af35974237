use chrono::NaiveDate;

use dev_utils::{get_example_date, hm, load_example_gtfs};
use raptor::{raptor_query, Network, NetworkBuilder, RaptorConfig, StopAccess};

#[test]
fn groups_trips_running_on_the_date_into_routes() {
    let gtfs = load_example_gtfs().unwrap();
    let network = Network::from_gtfs(&gtfs, get_example_date(), RaptorConfig::default()).unwrap();

    assert_eq!(network.num_stops(), 4);
    assert_eq!(network.num_routes(), 2);
    assert_eq!(&*network.get_route(0).line, "1");
    assert_eq!(&*network.get_route(0).id, "R1");
    assert_eq!(network.route_departures(0), &[hm(7, 0), hm(8, 0)]);
    assert_eq!(network.departure_id(1), "T3");

    let second = network.get_stop_idx("S2").unwrap();
    let route_stop = network.get_route_stop(network.route_stops_at(second)[0]);
    assert_eq!((route_stop.arrival_offset, route_stop.departure_offset), (600, 660));
    assert_eq!(network.get_stop(second).name.as_ref(), "Second Street");
}

#[test]
fn calendar_applies_without_exceptions() {
    let gtfs = load_example_gtfs().unwrap();
    let monday = NaiveDate::from_ymd_opt(2024, 5, 13).unwrap();
    let network = Network::from_gtfs(&gtfs, monday, RaptorConfig::default()).unwrap();
    assert_eq!(network.num_routes(), 1);
    assert_eq!(network.route_departures(0), &[hm(6, 0)]);

    let sunday = NaiveDate::from_ymd_opt(2024, 5, 12).unwrap();
    let network = NetworkBuilder::from_gtfs(&gtfs, sunday, RaptorConfig::default()).unwrap().build().unwrap();
    assert_eq!(network.num_routes(), 0);
    let first = network.get_stop_idx("S1").unwrap();
    let third = network.get_stop_idx("S3").unwrap();
    assert!(!raptor_query(&network, hm(6, 0), &[StopAccess::new(first, 0, 0.0)], &[StopAccess::new(third, 0, 0.0)]).is_found());
}

#[test]
fn changes_lines_at_a_shared_stop() {
    let gtfs = load_example_gtfs().unwrap();
    let network = Network::from_gtfs(&gtfs, get_example_date(), RaptorConfig::default()).unwrap();
    let fourth = network.get_stop_idx("S4").unwrap();
    let third = network.get_stop_idx("S3").unwrap();

    let itinerary = raptor_query(&network, hm(7, 25), &[StopAccess::new(fourth, 0, 0.0)], &[StopAccess::new(third, 0, 0.0)]);
    assert!(itinerary.is_found());
    assert_eq!(itinerary.transfer_count, 1);
    assert_eq!(itinerary.arrival_time(), hm(8, 21));
    assert_eq!(itinerary.legs.iter().filter(|leg| leg.is_transit()).count(), 2);
}
