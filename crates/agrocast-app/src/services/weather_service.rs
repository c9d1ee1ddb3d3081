//! Weather backend: fetches the combined forecast off the caller's thread.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use agrocast_weather::{LoadTicket, WeatherError, WeatherProvider, WeatherSnapshot};
use tokio::runtime::Handle;

/// Messages sent from async operations back to the model
#[derive(Debug)]
pub enum WeatherServiceMessage {
    /// Result of the load identified by `ticket`
    FetchDone {
        ticket: LoadTicket,
        result: Result<WeatherSnapshot, WeatherError>,
    },
}

/// Fetch the combined forecast for the ticket's city.
/// Sends `FetchDone` on the channel when complete.
pub fn request_fetch(
    tx: &Sender<WeatherServiceMessage>,
    runtime: &Handle,
    provider: Arc<WeatherProvider>,
    ticket: LoadTicket,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        tracing::debug!("Fetching weather for {} (epoch {})", ticket.city(), ticket.epoch());
        let result = provider.all(ticket.city()).await;
        let _ = tx.send(WeatherServiceMessage::FetchDone { ticket, result });
    });
}
