//! Dashboard model: the selected city, its coordinates and its forecast.
//!
//! Selecting a city starts a geocode lookup and a weather load in parallel.
//! Results arrive on mpsc channels and are applied by [`DashboardModel::poll_channel`];
//! anything belonging to a superseded selection is dropped there.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use agrocast_weather::series::{
    cloud_humidity_series, precipitation_series, temperature_trend, wind_series,
    CloudHumidityPoint, PrecipitationPoint, TrendPoint, WindPoint,
};
use agrocast_weather::{CityStore, Coordinates, LoadOutcome, WeatherSnapshot, WeatherStore};

use crate::app_services::AppServices;
use crate::models::weather_view::{
    forecast_cards, hourly_rows, CurrentConditions, ForecastCard, HourlyRow,
};
use crate::services::geocode_service::{self, GeocodeServiceMessage};
use crate::services::weather_service::{self, WeatherServiceMessage};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct DashboardModel {
    services: Arc<AppServices>,
    city: CityStore,
    weather: WeatherStore,
    geocode_pending: bool,
    weather_tx: mpsc::Sender<WeatherServiceMessage>,
    weather_rx: mpsc::Receiver<WeatherServiceMessage>,
    geocode_tx: mpsc::Sender<GeocodeServiceMessage>,
    geocode_rx: mpsc::Receiver<GeocodeServiceMessage>,
}

impl DashboardModel {
    /// Start on the configured default city. Nothing is fetched until
    /// [`select_city`](Self::select_city) or [`refresh`](Self::refresh).
    pub fn new(services: Arc<AppServices>) -> Self {
        let (weather_tx, weather_rx) = mpsc::channel();
        let (geocode_tx, geocode_rx) = mpsc::channel();
        let city = CityStore::new(&services.config().dashboard.default_city);
        Self {
            services,
            city,
            weather: WeatherStore::new(),
            geocode_pending: false,
            weather_tx,
            weather_rx,
            geocode_tx,
            geocode_rx,
        }
    }

    pub fn city_name(&self) -> &str {
        self.city.name()
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.city.coordinates()
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.weather.snapshot()
    }

    pub fn is_loading(&self) -> bool {
        self.weather.is_loading()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.weather.error()
    }

    /// Switch to `name`: resolve its coordinates and load its forecast.
    ///
    /// A blank name is ignored and the current city stays selected.
    pub fn select_city(&mut self, name: &str) {
        if name.trim().is_empty() {
            tracing::debug!("Ignoring blank city selection");
            return;
        }
        let ticket = self.city.select(name);
        tracing::info!("City changed to {}", ticket.city());
        self.geocode_pending = true;
        geocode_service::request_geocode(
            &self.geocode_tx,
            &self.services.runtime(),
            self.services.geocoder(),
            ticket,
        );
        self.refresh();
    }

    /// Reload the forecast for the current city.
    pub fn refresh(&mut self) {
        let Some(ticket) = self.weather.begin_load(self.city.name()) else {
            tracing::debug!("No city selected; skipping weather load");
            return;
        };
        weather_service::request_fetch(
            &self.weather_tx,
            &self.services.runtime(),
            self.services.weather_provider(),
            ticket,
        );
    }

    /// Apply every result that has arrived. Returns true if state changed.
    pub fn poll_channel(&mut self) -> bool {
        let mut changed = false;

        while let Ok(msg) = self.geocode_rx.try_recv() {
            match msg {
                GeocodeServiceMessage::Resolved { ticket, result } => {
                    if self.city.is_current(&ticket) {
                        self.geocode_pending = false;
                    }
                    changed |= self.city.apply_geocode(&ticket, result);
                }
            }
        }

        while let Ok(msg) = self.weather_rx.try_recv() {
            match msg {
                WeatherServiceMessage::FetchDone { ticket, result } => {
                    if self.weather.finish(&ticket, result) == LoadOutcome::Applied {
                        changed = true;
                    }
                }
            }
        }

        changed
    }

    /// True while the current selection still has a request in flight.
    pub fn is_busy(&self) -> bool {
        self.geocode_pending || self.weather.is_loading()
    }

    /// Poll until the current selection settles or `timeout` elapses.
    /// Returns false on timeout.
    pub fn wait_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.poll_channel();
            if !self.is_busy() {
                return true;
            }
            if Instant::now() >= deadline {
                tracing::warn!("Timed out waiting for {}", self.city.name());
                return false;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    pub fn current_conditions(&self) -> Option<CurrentConditions> {
        self.snapshot().map(CurrentConditions::from_snapshot)
    }

    pub fn hourly_rows(&self) -> Vec<HourlyRow> {
        self.snapshot().map(hourly_rows).unwrap_or_default()
    }

    pub fn forecast_cards(&self) -> Vec<ForecastCard> {
        self.snapshot().map(forecast_cards).unwrap_or_default()
    }

    pub fn temperature_trend(&self) -> Vec<TrendPoint> {
        self.snapshot()
            .map(|s| temperature_trend(&s.hourly))
            .unwrap_or_default()
    }

    pub fn precipitation_series(&self) -> Vec<PrecipitationPoint> {
        self.snapshot()
            .map(|s| precipitation_series(&s.hourly))
            .unwrap_or_default()
    }

    pub fn wind_series(&self) -> Vec<WindPoint> {
        self.snapshot()
            .map(|s| wind_series(&s.hourly))
            .unwrap_or_default()
    }

    pub fn cloud_humidity_series(&self) -> Vec<CloudHumidityPoint> {
        self.snapshot()
            .map(|s| cloud_humidity_series(&s.hourly))
            .unwrap_or_default()
    }
}
