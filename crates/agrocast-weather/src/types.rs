use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::condition::IconCategory;

/// Numeric readings attached to a prediction.
///
/// Each endpoint fills a different subset, so every field is optional. The
/// accessor methods fold the hourly, daily-mean and daily-extreme spellings of
/// the same quantity into one value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawData {
    pub temperature_2m: Option<f64>,
    pub temperature_2m_mean: Option<f64>,
    pub temperature_2m_max: Option<f64>,
    pub temperature_2m_min: Option<f64>,

    pub apparent_temperature: Option<f64>,
    pub apparent_temperature_mean: Option<f64>,
    pub apparent_temperature_max: Option<f64>,
    pub apparent_temperature_min: Option<f64>,

    pub dew_point_2m: Option<f64>,
    pub dew_point_2m_mean: Option<f64>,

    pub precipitation: Option<f64>,
    pub precipitation_sum: Option<f64>,

    pub cloud_cover: Option<f64>,
    pub cloud_cover_mean: Option<f64>,

    pub relative_humidity_2m: Option<f64>,
    pub relative_humidity_2m_mean: Option<f64>,

    pub wind_gusts_10m: Option<f64>,
    pub wind_gusts_10m_mean: Option<f64>,
    pub wind_gusts_10m_max: Option<f64>,

    pub wind_speed_10m: Option<f64>,
    pub wind_speed_10m_mean: Option<f64>,
    pub wind_speed_10m_max: Option<f64>,

    pub wind_direction_10m: Option<f64>,
    #[serde(alias = "winddirection_10m_dominant")]
    pub wind_direction_10m_dominant: Option<f64>,

    pub surface_pressure: Option<f64>,
    pub surface_pressure_mean: Option<f64>,
    pub pressure_msl: Option<f64>,
    pub pressure_msl_mean: Option<f64>,

    /// Seconds
    pub daylight_duration: Option<f64>,
    /// Seconds
    pub sunshine_duration: Option<f64>,
}

impl RawData {
    pub fn temperature(&self) -> Option<f64> {
        self.temperature_2m.or(self.temperature_2m_mean)
    }

    pub fn temperature_max(&self) -> Option<f64> {
        self.temperature_2m_max.or_else(|| self.temperature())
    }

    pub fn temperature_min(&self) -> Option<f64> {
        self.temperature_2m_min.or_else(|| self.temperature())
    }

    pub fn apparent_temperature(&self) -> Option<f64> {
        self.apparent_temperature.or(self.apparent_temperature_mean)
    }

    pub fn dew_point(&self) -> Option<f64> {
        self.dew_point_2m.or(self.dew_point_2m_mean)
    }

    pub fn humidity(&self) -> Option<f64> {
        self.relative_humidity_2m.or(self.relative_humidity_2m_mean)
    }

    pub fn precipitation(&self) -> Option<f64> {
        self.precipitation.or(self.precipitation_sum)
    }

    pub fn cloud_cover(&self) -> Option<f64> {
        self.cloud_cover.or(self.cloud_cover_mean)
    }

    pub fn wind_speed(&self) -> Option<f64> {
        self.wind_speed_10m
            .or(self.wind_speed_10m_mean)
            .or(self.wind_speed_10m_max)
    }

    pub fn wind_gusts(&self) -> Option<f64> {
        self.wind_gusts_10m
            .or(self.wind_gusts_10m_mean)
            .or(self.wind_gusts_10m_max)
    }

    /// Bearing in degrees
    pub fn wind_direction(&self) -> Option<f64> {
        self.wind_direction_10m.or(self.wind_direction_10m_dominant)
    }

    /// Surface pressure preferred, mean sea level as fallback (hPa)
    pub fn pressure(&self) -> Option<f64> {
        self.surface_pressure
            .or(self.surface_pressure_mean)
            .or(self.pressure_msl)
            .or(self.pressure_msl_mean)
    }

    pub fn daylight_hours(&self) -> Option<f64> {
        self.daylight_duration.map(|s| s / 3600.0)
    }

    pub fn sunshine_hours(&self) -> Option<f64> {
        self.sunshine_duration.map(|s| s / 3600.0)
    }
}

/// One prediction: today's summary or a single hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub time: String,
    #[serde(default)]
    pub weather_code: Option<i32>,
    #[serde(default)]
    pub weather_description: String,
    #[serde(default)]
    pub raw_data: RawData,
}

impl WeatherRecord {
    pub fn icon(&self) -> IconCategory {
        IconCategory::from_optional_code(self.weather_code)
    }
}

pub type DailyRecord = WeatherRecord;
pub type HourlyRecord = WeatherRecord;

/// One day of the 7-day outlook. Readings arrive flat on the item rather than
/// nested under `raw_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    #[serde(alias = "time")]
    pub date: String,
    #[serde(default)]
    pub weather_code: Option<i32>,
    #[serde(default)]
    pub weather_description: String,
    #[serde(flatten)]
    pub readings: RawData,
}

impl DailyAggregate {
    pub fn icon(&self) -> IconCategory {
        IconCategory::from_optional_code(self.weather_code)
    }

    /// Parsed calendar date; accepts `YYYY-MM-DD` with or without a time part.
    pub fn naive_date(&self) -> Option<chrono::NaiveDate> {
        let day = self.date.get(..10)?;
        chrono::NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }
}

/// Immutable weather payload for one city at one fetch cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub today: DailyRecord,
    pub hourly: Vec<HourlyRecord>,
    pub seven_day: Vec<DailyAggregate>,
    pub fetched_at: DateTime<Utc>,
}

/// Number of hourly entries shown by the dashboard
pub const HOURLY_WINDOW: usize = 24;

impl WeatherSnapshot {
    pub fn from_response(response: AllWeatherResponse) -> Self {
        Self {
            city: response.city,
            today: response.today_forecast,
            hourly: response.hourly_forecast,
            seven_day: response.seven_day_forecast,
            fetched_at: Utc::now(),
        }
    }

    /// The next 24 hours (fewer if the backend returned fewer).
    pub fn hourly_window(&self) -> &[HourlyRecord] {
        let end = self.hourly.len().min(HOURLY_WINDOW);
        &self.hourly[..end]
    }
}

/// Resolved geographic position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// `POST /api/predict/daily`
#[derive(Debug, Clone, Deserialize)]
pub struct DailyResponse {
    pub city: String,
    #[serde(flatten)]
    pub record: DailyRecord,
}

/// `POST /api/predict/hourly`
#[derive(Debug, Clone, Deserialize)]
pub struct HourlyResponse {
    pub city: String,
    #[serde(default)]
    pub predictions: Vec<HourlyRecord>,
}

/// `POST /api/predict/7days`
#[derive(Debug, Clone, Deserialize)]
pub struct SevenDayResponse {
    pub city: String,
    #[serde(default)]
    pub predictions: Vec<DailyAggregate>,
}

/// `POST /api/predict/all`
#[derive(Debug, Clone, Deserialize)]
pub struct AllWeatherResponse {
    pub city: String,
    #[serde(default)]
    pub seven_day_forecast: Vec<DailyAggregate>,
    #[serde(default)]
    pub hourly_forecast: Vec<HourlyRecord>,
    pub today_forecast: DailyRecord,
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Weather API returned {status}: {detail}")]
    Api { status: u16, detail: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("City name is empty")]
    EmptyCity,
}

/// Forward geocoding errors
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Geocoder returned status {0}")]
    Status(u16),
    #[error("No match for {0}")]
    NoMatch(String),
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_seven_day_accepts_both_spellings() {
        let old: DailyAggregate = serde_json::from_value(serde_json::json!({
            "time": "2025-06-02",
            "weather_code": 61,
            "temperature_2m_max": 31.5,
            "winddirection_10m_dominant": 90.0,
            "wind_gusts_10m_mean": 20.0
        }))
        .unwrap();
        let new: DailyAggregate = serde_json::from_value(serde_json::json!({
            "date": "2025-06-02",
            "weather_code": 61,
            "temperature_2m_max": 31.5,
            "wind_direction_10m_dominant": 90.0,
            "wind_gusts_10m_max": 20.0
        }))
        .unwrap();

        assert_eq!(old.date, new.date);
        assert_eq!(old.readings.wind_direction(), Some(90.0));
        assert_eq!(new.readings.wind_direction(), Some(90.0));
        assert_eq!(old.readings.wind_gusts(), new.readings.wind_gusts());
        assert_eq!(old.naive_date(), chrono::NaiveDate::from_ymd_opt(2025, 6, 2));
    }

    #[test]
    fn test_missing_and_null_readings_are_absent() {
        let record: WeatherRecord = serde_json::from_value(serde_json::json!({
            "time": "2025-06-01T13:00",
            "weather_code": null,
            "raw_data": { "temperature_2m": 28.0, "relative_humidity_2m": null }
        }))
        .unwrap();

        assert_eq!(record.raw_data.temperature(), Some(28.0));
        assert_eq!(record.raw_data.humidity(), None);
        assert_eq!(record.raw_data.pressure(), None);
        assert_eq!(record.weather_description, "");
        assert_eq!(record.icon(), IconCategory::Overcast);
    }

    #[test]
    fn test_all_response_requires_today() {
        let result: Result<AllWeatherResponse, _> = serde_json::from_value(serde_json::json!({
            "city": "Hue",
            "seven_day_forecast": [],
            "hourly_forecast": []
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_hourly_window_caps_at_24() {
        let hour = WeatherRecord {
            time: "t".into(),
            weather_code: Some(0),
            weather_description: String::new(),
            raw_data: RawData::default(),
        };
        let snapshot = WeatherSnapshot {
            city: "Hue".into(),
            today: hour.clone(),
            hourly: vec![hour; 30],
            seven_day: vec![],
            fetched_at: Utc::now(),
        };
        assert_eq!(snapshot.hourly_window().len(), HOURLY_WINDOW);
    }

    #[test]
    fn test_pressure_falls_back_to_msl() {
        let raw = RawData {
            pressure_msl_mean: Some(1009.0),
            ..RawData::default()
        };
        assert_eq!(raw.pressure(), Some(1009.0));
    }

    #[test]
    fn test_daylight_hours() {
        let raw = RawData {
            daylight_duration: Some(43_200.0),
            ..RawData::default()
        };
        assert_eq!(raw.daylight_hours(), Some(12.0));
    }
}
