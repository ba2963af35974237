pub mod network;

pub use network::{Network, NetworkError};

pub mod builder;

pub use builder::{NetworkBuilder, RouteStopTimes};

pub mod config;

pub use config::RaptorConfig;

pub mod gtfs;

pub mod label;

pub mod journey;

pub use journey::{Itinerary, Leg, WalkKind};

pub mod raptor;

pub use raptor::{range_query, raptor_query, DepartureWindow, RaptorCore, StopAccess};

pub mod utils;
