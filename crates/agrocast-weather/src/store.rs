use crate::provider::WeatherProvider;
use crate::types::{WeatherError, WeatherSnapshot};

/// Issued by [`WeatherStore::begin_load`]; only the newest ticket is honored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    epoch: u64,
    city: String,
}

impl LoadTicket {
    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load was started after this one
    Discarded,
}

/// Latest weather snapshot plus loading/error flags.
///
/// Failed loads keep the previous snapshot on screen and set `error`.
#[derive(Debug, Default)]
pub struct WeatherStore {
    snapshot: Option<WeatherSnapshot>,
    loading: bool,
    error: Option<String>,
    epoch: u64,
}

impl WeatherStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Start a load cycle: `loading` on, `error` cleared, earlier tickets stale.
    ///
    /// Returns `None` for an empty city. Earlier tickets still go stale and
    /// `loading` is switched off, but the snapshot and error are kept.
    pub fn begin_load(&mut self, city: &str) -> Option<LoadTicket> {
        self.epoch += 1;
        let city = city.trim();
        if city.is_empty() {
            self.loading = false;
            return None;
        }
        self.loading = true;
        self.error = None;
        Some(LoadTicket {
            epoch: self.epoch,
            city: city.to_string(),
        })
    }

    /// Apply the result of the load identified by `ticket`.
    pub fn finish(
        &mut self,
        ticket: &LoadTicket,
        result: Result<WeatherSnapshot, WeatherError>,
    ) -> LoadOutcome {
        if ticket.epoch != self.epoch {
            tracing::debug!(
                "Discarding stale weather for {} (epoch {}, current {})",
                ticket.city,
                ticket.epoch,
                self.epoch
            );
            return LoadOutcome::Discarded;
        }

        self.loading = false;
        match result {
            Ok(snapshot) => {
                self.snapshot = Some(snapshot);
                self.error = None;
            }
            Err(e) => {
                tracing::error!("Weather load for {} failed: {}", ticket.city, e);
                self.error = Some(describe_error(&e));
            }
        }
        LoadOutcome::Applied
    }

    /// Run a complete cycle for `city` against `provider`.
    pub async fn load_weather(&mut self, provider: &WeatherProvider, city: &str) -> LoadOutcome {
        let Some(ticket) = self.begin_load(city) else {
            return LoadOutcome::Discarded;
        };
        let result = provider.all(ticket.city()).await;
        self.finish(&ticket, result)
    }
}

/// Human-readable message for the dashboard error banner.
pub fn describe_error(error: &WeatherError) -> String {
    match error {
        WeatherError::Network(e) if e.is_timeout() => {
            "Weather request timed out. Please try again.".to_string()
        }
        WeatherError::Network(_) => {
            "Unable to reach the weather service. Check your connection.".to_string()
        }
        WeatherError::Api { status, detail } if detail.is_empty() => {
            format!("Weather service error ({})", status)
        }
        WeatherError::Api { status, detail } => {
            format!("Weather service error ({}): {}", status, detail)
        }
        WeatherError::Parse(_) => "Weather data could not be read.".to_string(),
        WeatherError::EmptyCity => "Please choose a city first.".to_string(),
    }
}
