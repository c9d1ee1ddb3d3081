//! Geocoding backend: resolves the selected city's coordinates.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use agrocast_weather::{Coordinates, GeocodeError, GeocodeTicket, Geocoder};
use tokio::runtime::Handle;

#[derive(Debug)]
pub enum GeocodeServiceMessage {
    Resolved {
        ticket: GeocodeTicket,
        result: Result<Coordinates, GeocodeError>,
    },
}

/// Look up coordinates for the ticket's city.
/// Sends `Resolved` on the channel when complete.
pub fn request_geocode(
    tx: &Sender<GeocodeServiceMessage>,
    runtime: &Handle,
    geocoder: Arc<Geocoder>,
    ticket: GeocodeTicket,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = geocoder.lookup(ticket.city()).await;
        let _ = tx.send(GeocodeServiceMessage::Resolved { ticket, result });
    });
}
