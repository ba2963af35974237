use dev_utils::{hm, one_minute_walk, random_network, shortcut_network, single_line_network, stop, MINUTE};
use raptor::{range_query, DepartureWindow, Itinerary, RaptorCore, StopAccess};

const EPSILON: f64 = 1e-9;

fn summary(itineraries: &[Itinerary]) -> Vec<(u32, u32, u32)> {
    itineraries.iter().map(|i| (i.departure_time, i.transfer_count, i.arrival_time())).collect()
}

fn assert_non_dominated(itineraries: &[Itinerary]) {
    for (i, a) in itineraries.iter().enumerate() {
        for (j, b) in itineraries.iter().enumerate() {
            if i != j {
                assert!(!b.dominates(a), "{b:?} dominates {a:?}");
                assert!(
                    (a.transfer_count, a.departure_time, a.travel_time) != (b.transfer_count, b.departure_time, b.travel_time),
                    "duplicate {a:?}"
                );
            }
        }
    }
}

#[test]
fn shortcut_is_offered_next_to_the_direct_line() {
    let network = shortcut_network();
    let window = DepartureWindow::new(hm(5, 40), hm(6, 0), hm(6, 50));
    let long_walk = 7 * MINUTE + 45;
    let egress = [StopAccess::new(stop(&network, "g"), long_walk, network.config.walking_cost(long_walk))];
    let itineraries = range_query(&network, window, &[one_minute_walk(&network, "a")], &egress);

    assert_eq!(summary(&itineraries), vec![
        (hm(5, 45), 0, hm(6, 35) + 45),
        (hm(5, 45), 1, hm(6, 16) + 45),
        (hm(6, 5), 0, hm(6, 55) + 45),
        (hm(6, 25), 0, hm(7, 15) + 45),
        (hm(6, 45), 0, hm(7, 35) + 45),
        (hm(6, 45), 1, hm(7, 16) + 45),
    ]);
    for itinerary in &itineraries {
        let expected = if itinerary.transfer_count == 0 { 10.15 } else { 7.35 };
        assert!((itinerary.cost - expected).abs() < EPSILON, "{itinerary:?}");
    }
    assert_non_dominated(&itineraries);
}

#[test]
fn every_departure_in_the_window_is_reported_once() {
    let network = single_line_network();
    let window = DepartureWindow::new(hm(5, 30), hm(6, 0), hm(6, 30));
    let itineraries = range_query(&network, window, &[one_minute_walk(&network, "a")], &[one_minute_walk(&network, "c")]);

    let departures: Vec<_> = itineraries.iter().map(|itinerary| itinerary.departure_time).collect();
    assert_eq!(departures, vec![hm(5, 45), hm(6, 5), hm(6, 25)]);
    for itinerary in &itineraries {
        assert_eq!(itinerary.travel_time, 28 * MINUTE);
        assert_eq!(itinerary.legs.len(), 3);
        // Leaving just in time means no waiting at all.
        assert!((itinerary.cost - (0.2 + 26.0 * 0.2 + 0.2)).abs() < EPSILON);
    }
}

#[test]
fn empty_window_finds_nothing() {
    let network = single_line_network();
    let window = DepartureWindow::new(hm(5, 7), hm(5, 10), hm(5, 20));
    let itineraries = range_query(&network, window, &[one_minute_walk(&network, "a")], &[one_minute_walk(&network, "c")]);
    assert!(itineraries.is_empty());
}

#[test]
fn range_results_are_pareto_sets_on_random_networks() {
    for seed in 0..20 {
        let network = random_network(seed, 30, 12);
        let access = [StopAccess::new(0, 2 * MINUTE, 0.4), StopAccess::new(1, 4 * MINUTE, 0.8)];
        let egress = [StopAccess::new(28, 3 * MINUTE, 0.6), StopAccess::new(29, MINUTE, 0.2)];
        let window = DepartureWindow::around(hm(6, 0), 30 * MINUTE, 60 * MINUTE);

        let itineraries = RaptorCore::new(&network).calc_routes(window, &access, &egress);
        assert_non_dominated(&itineraries);
        assert!(itineraries.windows(2).all(|pair| pair[0].departure_time <= pair[1].departure_time), "seed {seed}");
        for itinerary in &itineraries {
            assert!(itinerary.is_found(), "seed {seed}");
            assert!(itinerary.departure_time >= window.earliest.saturating_sub(MINUTE), "seed {seed}");
            assert!(itinerary.departure_time <= window.latest, "seed {seed}");
        }

        let again = range_query(&network, window, &access, &egress);
        assert_eq!(summary(&itineraries), summary(&again), "seed {seed}");
    }
}
