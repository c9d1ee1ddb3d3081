use serde::{Deserialize, Serialize};

/// Icon groups for WMO weather codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IconCategory {
    Clear,
    PartlyCloudy,
    /// Overcast and fog; also the fallback for unknown codes
    #[default]
    Overcast,
    Drizzle,
    Rain,
    /// Snow and freezing precipitation
    Snow,
    Showers,
    Thunderstorm,
}

impl IconCategory {
    pub const ALL: [IconCategory; 8] = [
        Self::Clear,
        Self::PartlyCloudy,
        Self::Overcast,
        Self::Drizzle,
        Self::Rain,
        Self::Snow,
        Self::Showers,
        Self::Thunderstorm,
    ];

    /// Classify a WMO weather code.
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1..=3 => Self::PartlyCloudy,
            45 | 48 => Self::Overcast,
            51..=57 => Self::Drizzle,
            61..=67 => Self::Rain,
            71..=77 => Self::Snow,
            80..=86 => Self::Showers,
            95..=99 => Self::Thunderstorm,
            _ => Self::Overcast,
        }
    }

    /// Missing codes render as overcast.
    pub fn from_optional_code(code: Option<i32>) -> Self {
        code.map_or(Self::Overcast, Self::from_code)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Overcast => "Overcast",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Showers => "Showers",
            Self::Thunderstorm => "Thunderstorm",
        }
    }

    /// Icon asset name used by renderers
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Clear => "sun",
            Self::PartlyCloudy => "cloud_sun",
            Self::Overcast => "cloud",
            Self::Drizzle => "cloud_drizzle",
            Self::Rain => "cloud_rain",
            Self::Snow => "cloud_snow",
            Self::Showers => "cloud_showers",
            Self::Thunderstorm => "cloud_lightning",
        }
    }
}

/// Shorthand for [`IconCategory::from_code`].
pub fn classify_icon(code: i32) -> IconCategory {
    IconCategory::from_code(code)
}

const COMPASS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// 16-point compass label for a bearing in degrees.
///
/// Negative and >360 bearings wrap; non-finite input yields `"N/A"`.
pub fn wind_direction_label(degrees: f64) -> &'static str {
    if !degrees.is_finite() {
        return "N/A";
    }
    let sector = (degrees.rem_euclid(360.0) / 22.5).round() as usize % COMPASS.len();
    COMPASS[sector]
}
