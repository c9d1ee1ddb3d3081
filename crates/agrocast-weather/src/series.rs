//! Chart projections of the hourly sequence.
//!
//! Every series takes the first [`HOURLY_WINDOW`] records. Absent readings
//! chart as zero.

use serde::Serialize;

use crate::display::or_zero;
use crate::types::{HourlyRecord, HOURLY_WINDOW};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub time: String,
    pub temperature: f64,
    /// Position between the series min (0) and max (100)
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecipitationPoint {
    pub time: String,
    pub precipitation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindPoint {
    pub time: String,
    pub speed: f64,
    pub gusts: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloudHumidityPoint {
    pub time: String,
    pub cloud_cover: f64,
    pub humidity: f64,
}

fn window(hourly: &[HourlyRecord]) -> impl Iterator<Item = &HourlyRecord> {
    hourly.iter().take(HOURLY_WINDOW)
}

/// Temperature trend normalized into `0..=100`.
///
/// A flat series (max == min) renders as a 50% midline.
pub fn temperature_trend(hourly: &[HourlyRecord]) -> Vec<TrendPoint> {
    let temps: Vec<(String, f64)> = window(hourly)
        .map(|h| (h.time.clone(), or_zero(h.raw_data.temperature())))
        .collect();

    let min = temps.iter().map(|(_, t)| *t).fold(f64::INFINITY, f64::min);
    let max = temps.iter().map(|(_, t)| *t).fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    temps
        .into_iter()
        .map(|(time, temperature)| {
            let percent = if range > 0.0 {
                (temperature - min) / range * 100.0
            } else {
                50.0
            };
            TrendPoint {
                time,
                temperature,
                percent,
            }
        })
        .collect()
}

pub fn precipitation_series(hourly: &[HourlyRecord]) -> Vec<PrecipitationPoint> {
    window(hourly)
        .map(|h| PrecipitationPoint {
            time: h.time.clone(),
            precipitation: or_zero(h.raw_data.precipitation()),
        })
        .collect()
}

pub fn wind_series(hourly: &[HourlyRecord]) -> Vec<WindPoint> {
    window(hourly)
        .map(|h| WindPoint {
            time: h.time.clone(),
            speed: or_zero(h.raw_data.wind_speed()),
            gusts: or_zero(h.raw_data.wind_gusts()),
        })
        .collect()
}

pub fn cloud_humidity_series(hourly: &[HourlyRecord]) -> Vec<CloudHumidityPoint> {
    window(hourly)
        .map(|h| CloudHumidityPoint {
            time: h.time.clone(),
            cloud_cover: or_zero(h.raw_data.cloud_cover()),
            humidity: or_zero(h.raw_data.humidity()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawData;

    fn hour(i: usize, raw_data: RawData) -> HourlyRecord {
        HourlyRecord {
            time: format!("2025-06-01T{:02}:00", i % 24),
            weather_code: Some(0),
            weather_description: String::new(),
            raw_data,
        }
    }

    fn with_temp(t: f64) -> RawData {
        RawData {
            temperature_2m: Some(t),
            ..RawData::default()
        }
    }

    #[test]
    fn test_flat_series_is_midline() {
        let hourly: Vec<_> = (0..24).map(|i| hour(i, with_temp(25.0))).collect();
        let trend = temperature_trend(&hourly);
        assert_eq!(trend.len(), 24);
        assert!(trend.iter().all(|p| p.percent == 50.0));
    }

    #[test]
    fn test_trend_spans_zero_to_hundred() {
        let hourly = vec![
            hour(0, with_temp(20.0)),
            hour(1, with_temp(25.0)),
            hour(2, with_temp(30.0)),
        ];
        let trend = temperature_trend(&hourly);
        assert_eq!(trend[0].percent, 0.0);
        assert_eq!(trend[1].percent, 50.0);
        assert_eq!(trend[2].percent, 100.0);
    }

    #[test]
    fn test_series_truncate_to_window() {
        let hourly: Vec<_> = (0..40).map(|i| hour(i, with_temp(i as f64))).collect();
        assert_eq!(precipitation_series(&hourly).len(), HOURLY_WINDOW);
        assert_eq!(wind_series(&hourly).len(), HOURLY_WINDOW);
        assert_eq!(temperature_trend(&hourly).len(), HOURLY_WINDOW);
    }

    #[test]
    fn test_absent_fields_chart_as_zero() {
        let hourly = vec![hour(0, RawData::default())];
        assert_eq!(precipitation_series(&hourly)[0].precipitation, 0.0);
        assert_eq!(wind_series(&hourly)[0].gusts, 0.0);
        let ch = &cloud_humidity_series(&hourly)[0];
        assert_eq!((ch.cloud_cover, ch.humidity), (0.0, 0.0));
        assert_eq!(temperature_trend(&hourly)[0].percent, 50.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(temperature_trend(&[]).is_empty());
    }
}
