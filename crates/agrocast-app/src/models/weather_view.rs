//! Display rows derived from a [`WeatherSnapshot`].
//!
//! Rows hold preformatted strings so every frontend renders absent readings
//! the same way.

use agrocast_weather::display::{format_reading, NOT_AVAILABLE};
use agrocast_weather::{
    forecast_day_label, wind_direction_label, DailyAggregate, HourlyRecord, TemperatureBand,
    WeatherSnapshot,
};
use serde::Serialize;

/// Today's headline card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub city: String,
    pub date: String,
    pub description: String,
    pub icon: &'static str,
    pub temperature: String,
    pub feels_like: String,
    pub humidity: String,
    pub precipitation: String,
    pub wind: String,
    pub pressure: String,
    /// Temperature band label, e.g. `"hot"`
    pub band: Option<&'static str>,
}

impl CurrentConditions {
    pub fn from_snapshot(snapshot: &WeatherSnapshot) -> Self {
        let today = &snapshot.today;
        let raw = &today.raw_data;
        Self {
            city: snapshot.city.clone(),
            date: today.time.clone(),
            description: description_or(&today.weather_description, today.icon().description()),
            icon: today.icon().icon_name(),
            temperature: format_reading(raw.temperature(), 1, "°C"),
            feels_like: format_reading(raw.apparent_temperature(), 1, "°C"),
            humidity: format_reading(raw.humidity(), 0, "%"),
            precipitation: format_reading(raw.precipitation(), 1, " mm"),
            wind: wind_text(raw.wind_speed(), raw.wind_direction()),
            pressure: format_reading(raw.pressure(), 0, " hPa"),
            band: raw
                .temperature()
                .map(|t| TemperatureBand::from_celsius(t).label()),
        }
    }
}

/// One row of the hourly table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyRow {
    pub time: String,
    pub icon: &'static str,
    pub temperature: String,
    pub precipitation: String,
    pub wind: String,
}

impl HourlyRow {
    fn from_record(record: &HourlyRecord) -> Self {
        let raw = &record.raw_data;
        Self {
            time: record.time.clone(),
            icon: record.icon().icon_name(),
            temperature: format_reading(raw.temperature(), 1, "°C"),
            precipitation: format_reading(raw.precipitation(), 1, " mm"),
            wind: wind_text(raw.wind_speed(), raw.wind_direction()),
        }
    }
}

/// One card of the 7-day outlook
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastCard {
    pub label: String,
    pub date: String,
    pub description: String,
    pub icon: &'static str,
    pub high: String,
    pub low: String,
    pub precipitation: String,
    pub sunshine: String,
}

impl ForecastCard {
    fn from_aggregate(index: usize, day: &DailyAggregate) -> Self {
        let readings = &day.readings;
        Self {
            label: forecast_day_label(index, day.naive_date()),
            date: day.date.clone(),
            description: description_or(&day.weather_description, day.icon().description()),
            icon: day.icon().icon_name(),
            high: format_reading(readings.temperature_max(), 1, "°C"),
            low: format_reading(readings.temperature_min(), 1, "°C"),
            precipitation: format_reading(readings.precipitation(), 1, " mm"),
            sunshine: format_reading(readings.sunshine_hours(), 1, " h"),
        }
    }
}

pub fn hourly_rows(snapshot: &WeatherSnapshot) -> Vec<HourlyRow> {
    snapshot
        .hourly_window()
        .iter()
        .map(HourlyRow::from_record)
        .collect()
}

pub fn forecast_cards(snapshot: &WeatherSnapshot) -> Vec<ForecastCard> {
    snapshot
        .seven_day
        .iter()
        .enumerate()
        .map(|(i, day)| ForecastCard::from_aggregate(i, day))
        .collect()
}

fn description_or(description: &str, fallback: &str) -> String {
    if description.trim().is_empty() {
        fallback.to_string()
    } else {
        description.to_string()
    }
}

fn wind_text(speed: Option<f64>, direction: Option<f64>) -> String {
    match (speed, direction) {
        (Some(speed), Some(dir)) => format!("{:.1} km/h {}", speed, wind_direction_label(dir)),
        (Some(speed), None) => format!("{:.1} km/h", speed),
        (None, _) => NOT_AVAILABLE.to_string(),
    }
}
