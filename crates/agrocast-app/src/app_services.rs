//! Shared application services: the tokio runtime plus every backend client.
//!
//! Models and the CLI get their clients from here. The record client is
//! opened lazily so commands that never touch plans or chat do not create a
//! database file.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::RwLock;

use agrocast_core::Config;
use agrocast_services::{AssistantClient, RecordClient};
use agrocast_weather::{Geocoder, WeatherProvider};

pub struct AppServices {
    /// Tokio runtime for async operations
    runtime: tokio::runtime::Runtime,

    config: Config,

    /// Prediction endpoints
    weather_provider: Arc<WeatherProvider>,

    /// City name to coordinates
    geocoder: Arc<Geocoder>,

    /// Schedule generation and chat
    assistant: AssistantClient,

    /// Plans, tasks and chat messages (SQLite or PostgREST)
    records: RwLock<Option<RecordClient>>,
}

impl AppServices {
    /// Build the runtime and the HTTP clients described by `config`.
    pub fn new(config: Config) -> Result<Arc<Self>> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("agrocast-tokio")
            .build()
            .context("Failed to create tokio runtime")?;

        let weather_provider =
            WeatherProvider::from_config(&config).context("Failed to create weather provider")?;
        let geocoder = Geocoder::from_config(&config).context("Failed to create geocoder")?;
        let assistant =
            AssistantClient::from_config(&config).context("Failed to create assistant client")?;

        tracing::info!(
            "Services ready (backend {}, geocoder {})",
            config.api.base_url,
            config.geocoding.search_url
        );

        Ok(Arc::new(Self {
            runtime,
            config,
            weather_provider: Arc::new(weather_provider),
            geocoder: Arc::new(geocoder),
            assistant,
            records: RwLock::new(None),
        }))
    }

    /// Handle for spawning onto and blocking on the shared runtime.
    pub fn runtime(&self) -> tokio::runtime::Handle {
        self.runtime.handle().clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn weather_provider(&self) -> Arc<WeatherProvider> {
        Arc::clone(&self.weather_provider)
    }

    pub fn geocoder(&self) -> Arc<Geocoder> {
        Arc::clone(&self.geocoder)
    }

    pub fn assistant(&self) -> AssistantClient {
        self.assistant.clone()
    }

    /// The configured record client, opened on first use.
    pub fn record_client(&self) -> Result<RecordClient> {
        if let Some(client) = self.records.read().as_ref() {
            return Ok(client.clone());
        }

        let mut slot = self.records.write();
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }
        let client = RecordClient::from_config(&self.config)
            .context("Failed to open the record store")?;
        tracing::debug!("Record store opened");
        *slot = Some(client.clone());
        Ok(client)
    }

    /// Replace the record client, e.g. with an in-memory store.
    pub fn set_record_client(&self, client: RecordClient) {
        *self.records.write() = Some(client);
    }

    /// Stop the runtime, giving in-flight requests a moment to finish.
    pub fn shutdown(self: Arc<Self>) {
        match Arc::try_unwrap(self) {
            Ok(services) => {
                services.runtime.shutdown_timeout(Duration::from_secs(2));
                tracing::info!("Services shut down");
            }
            Err(_) => tracing::warn!("Services still shared at shutdown; runtime left to drop"),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use agrocast_services::SqliteRecordStore;

    fn config(dir: &std::path::Path) -> Config {
        Config {
            config_dir: dir.to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn test_record_client_is_opened_once() {
        let dir = tempfile::tempdir().unwrap();
        let services = AppServices::new(config(dir.path())).unwrap();

        let first = services.record_client().unwrap();
        let second = services.record_client().unwrap();

        assert!(first.is_sqlite());
        assert!(second.is_sqlite());
        assert!(dir.path().join("agrocast.db").exists());
        services.shutdown();
    }

    #[test]
    fn test_record_client_can_be_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let services = AppServices::new(config(dir.path())).unwrap();
        services.set_record_client(RecordClient::sqlite(SqliteRecordStore::in_memory().unwrap()));

        services.record_client().unwrap();
        assert!(!dir.path().join("agrocast.db").exists());
    }
}
