//! Formatting helpers shared by the CLI and view models.

use chrono::{Datelike, Duration, NaiveDate};

/// Placeholder for readings the backend did not return
pub const NOT_AVAILABLE: &str = "N/A";

/// Coarse temperature band used to tint forecast cards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureBand {
    VeryHot,
    Hot,
    Warm,
    Comfortable,
    Cool,
    Cold,
}

impl TemperatureBand {
    pub fn from_celsius(temp: f64) -> Self {
        if temp >= 35.0 {
            Self::VeryHot
        } else if temp >= 30.0 {
            Self::Hot
        } else if temp >= 25.0 {
            Self::Warm
        } else if temp >= 20.0 {
            Self::Comfortable
        } else if temp >= 15.0 {
            Self::Cool
        } else {
            Self::Cold
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryHot => "very-hot",
            Self::Hot => "hot",
            Self::Warm => "warm",
            Self::Comfortable => "comfortable",
            Self::Cool => "cool",
            Self::Cold => "cold",
        }
    }

    /// Hex color for the band
    pub fn color(&self) -> &'static str {
        match self {
            Self::VeryHot => "#dc2626",
            Self::Hot => "#f97316",
            Self::Warm => "#f59e0b",
            Self::Comfortable => "#10b981",
            Self::Cool => "#3b82f6",
            Self::Cold => "#6366f1",
        }
    }
}

/// `value` with `decimals` places and `unit`, or `"N/A"` when absent.
pub fn format_reading(value: Option<f64>, decimals: usize, unit: &str) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}{}", decimals, v, unit),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Absent or non-finite readings become `0.0` for charting.
pub fn or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Label for the `index`-th card of the 7-day outlook.
///
/// The outlook starts tomorrow, so index 0 is "Tomorrow" and the rest use the
/// weekday of `date`.
pub fn forecast_day_label(index: usize, date: Option<NaiveDate>) -> String {
    if index == 0 {
        return "Tomorrow".to_string();
    }
    match date {
        Some(d) => d.format("%A").to_string(),
        None => format!("Day {}", index + 1),
    }
}

/// Calendar label for a plan day, e.g. `"Thu, Oct 16"`.
pub fn plan_day_label(today: NaiveDate, day_offset: u8) -> String {
    let date = today + Duration::days(i64::from(day_offset));
    format!("{}, {} {}", date.format("%a"), date.format("%b"), date.day())
}
