pub mod city;
pub mod condition;
pub mod display;
pub mod geocode;
pub mod provider;
pub mod series;
pub mod store;
pub mod types;

pub use city::{search_cities, CityStore, GeocodeTicket, CITIES};
pub use condition::{classify_icon, wind_direction_label, IconCategory};
pub use display::{format_reading, forecast_day_label, plan_day_label, TemperatureBand};
pub use geocode::Geocoder;
pub use provider::WeatherProvider;
pub use store::{describe_error, LoadOutcome, LoadTicket, WeatherStore};
pub use types::*;
