use std::collections::BTreeMap;

use chrono::NaiveDate;
use gtfs_structures::{Exception, Gtfs, Trip};

use crate::builder::{NetworkBuilder, RouteStopTimes};
use crate::config::RaptorConfig;
use crate::network::{Network, NetworkError, Timestamp};

/// Whether the trip's service runs on `date`, with calendar date exceptions taking precedence over the calendar.
pub fn does_trip_run(gtfs: &Gtfs, trip: &Trip, date: NaiveDate) -> bool {
    let exception = gtfs
        .calendar_dates
        .get(trip.service_id.as_str())
        .and_then(|calendar_dates| calendar_dates.iter().find(|calendar_date| calendar_date.date == date))
        .map(|calendar_date| &calendar_date.exception_type);
    match exception {
        Some(Exception::Added) => true,
        Some(Exception::Deleted) => false,
        None => gtfs.calendar.get(trip.service_id.as_str()).is_some_and(|calendar| {
            calendar.valid_weekday(date) && calendar.start_date <= date && date <= calendar.end_date
        }),
    }
}

impl NetworkBuilder {
    /// Loads the trips running on `date`.
    ///
    /// GTFS routes contain trips with different stop sequences, so trips are grouped into our own routes by
    /// GTFS route, stop sequence and time offsets. Each trip becomes one departure of its route.
    pub fn from_gtfs(gtfs: &Gtfs, date: NaiveDate, config: RaptorConfig) -> Result<Self, NetworkError> {
        let mut builder = NetworkBuilder::new(config);

        let mut stops: Vec<_> = gtfs.stops.values().collect();
        stops.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        for stop in stops {
            builder.add_stop(&stop.id, stop.name.as_deref().unwrap_or(&stop.id));
        }

        let mut patterns: BTreeMap<(&str, Vec<RouteStopTimes>), Vec<(Timestamp, &str)>> = BTreeMap::new();
        for trip in gtfs.trips.values() {
            if !does_trip_run(gtfs, trip, date) {
                continue;
            }
            if trip.stop_times.len() < 2 {
                log::warn!("Skipping trip {} with {} stop times.", trip.id, trip.stop_times.len());
                continue;
            }

            let mut trip_start = None;
            let mut times = Vec::with_capacity(trip.stop_times.len());
            for stop_time in trip.stop_times.iter() {
                let arrival = stop_time.arrival_time.or(stop_time.departure_time);
                let departure = stop_time.departure_time.or(stop_time.arrival_time);
                let (Some(arrival), Some(departure)) = (arrival, departure) else {
                    return Err(NetworkError::MissingStopTime(trip.id.clone()));
                };
                let start = *trip_start.get_or_insert(departure);
                let stop = builder.stop_idx(&stop_time.stop.id)?;
                times.push(RouteStopTimes::new(stop, arrival.saturating_sub(start), departure.saturating_sub(start)));
            }
            if let Some(start) = trip_start {
                patterns.entry((trip.route_id.as_str(), times)).or_default().push((start, trip.id.as_str()));
            }
        }

        for ((route_id, times), trips) in patterns {
            let line = gtfs
                .routes
                .get(route_id)
                .and_then(|route| route.short_name.clone().or_else(|| route.long_name.clone()))
                .unwrap_or_else(|| route_id.to_owned());
            let route = builder.add_route(&line, route_id, times)?;
            for (start, trip_id) in trips {
                builder.add_departure(route, trip_id, start)?;
            }
        }

        Ok(builder)
    }
}

impl Network {
    pub fn from_gtfs(gtfs: &Gtfs, date: NaiveDate, config: RaptorConfig) -> Result<Self, NetworkError> {
        let network = NetworkBuilder::from_gtfs(gtfs, date, config)?.build()?;
        network.print_stats();
        Ok(network)
    }
}
