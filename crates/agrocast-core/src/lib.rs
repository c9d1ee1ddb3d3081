pub mod config;
pub mod error;
pub mod retry;

pub use config::{
    ApiConfig, ChatConfig, Config, DashboardConfig, GeocodingConfig, RecordBackend, RecordsConfig,
    RetrySettings, ValidationResult,
};
pub use error::{
    AppError, AssistantError, DatabaseError, NetworkError, PlanError,
};
pub use retry::{with_retry, RetryConfig, RetryDecision};

use anyhow::Result;

/// Initialize logging for the process.
///
/// Honors `RUST_LOG`; falls back to `info`. Safe to call more than once.
pub fn init() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    tracing::info!("AgroCast core initialized");
    Ok(())
}
