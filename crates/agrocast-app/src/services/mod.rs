//! Async request functions. Each spawns onto the shared runtime and reports
//! back over an `std::sync::mpsc` channel drained by the owning model.

pub mod geocode_service;
pub mod weather_service;

pub use geocode_service::GeocodeServiceMessage;
pub use weather_service::WeatherServiceMessage;
