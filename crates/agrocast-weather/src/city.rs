//! Selected-city state and the catalogue of selectable cities.

use serde::Serialize;

use crate::types::{Coordinates, GeocodeError};

/// Cities offered by the city picker.
pub const CITIES: &[&str] = &[
    "Da Nang",
    "Ho Chi Minh City",
    "Hanoi",
    "Ha Long",
    "Hue",
    "Da Lat",
    "Nha Trang",
    "Can Tho",
    "Bangkok",
    "Chiang Mai",
    "Phuket",
    "Singapore",
    "Kuala Lumpur",
    "Jakarta",
    "Bali",
    "Manila",
    "Cebu",
    "Hong Kong",
    "Shanghai",
    "Beijing",
    "Tokyo",
    "Seoul",
    "Taipei",
    "Sydney",
    "Melbourne",
    "Auckland",
    "New York",
    "Los Angeles",
    "London",
    "Paris",
    "Berlin",
    "Dubai",
    "Mumbai",
    "Delhi",
    "Cairo",
];

/// Case-insensitive substring search over [`CITIES`], in catalogue order.
/// An empty query returns the whole catalogue.
pub fn search_cities(query: &str) -> Vec<&'static str> {
    let needle = query.trim().to_lowercase();
    let mut matches: Vec<&'static str> = Vec::new();
    for city in CITIES {
        if city.to_lowercase().contains(&needle) && !matches.contains(city) {
            matches.push(city);
        }
    }
    matches
}

/// Proof that a geocode lookup was started for a particular selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeTicket {
    epoch: u64,
    city: String,
}

impl GeocodeTicket {
    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// The active city and its last resolved coordinates.
///
/// `coordinates` may lag behind `name`; when present they always belong to
/// the most recently resolved selection, never to a superseded one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CityStore {
    name: String,
    coordinates: Option<Coordinates>,
    #[serde(skip)]
    epoch: u64,
}

impl CityStore {
    pub fn new(initial: &str) -> Self {
        Self {
            name: initial.to_string(),
            coordinates: None,
            epoch: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    /// Make `name` the active city and issue a ticket for its geocode lookup.
    ///
    /// Any ticket issued earlier becomes stale.
    pub fn select(&mut self, name: &str) -> GeocodeTicket {
        self.epoch += 1;
        self.name = name.trim().to_string();
        tracing::debug!("Selected city {} (epoch {})", self.name, self.epoch);
        GeocodeTicket {
            epoch: self.epoch,
            city: self.name.clone(),
        }
    }

    /// Whether `ticket` belongs to the latest selection.
    pub fn is_current(&self, ticket: &GeocodeTicket) -> bool {
        ticket.epoch == self.epoch
    }

    /// Apply a geocode result. Returns true when the coordinates changed.
    ///
    /// Results for superseded selections are dropped. Failures keep the
    /// previous coordinates and are only logged.
    pub fn apply_geocode(
        &mut self,
        ticket: &GeocodeTicket,
        result: Result<Coordinates, GeocodeError>,
    ) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(
                "Discarding geocode for {} (epoch {}, current {})",
                ticket.city,
                ticket.epoch,
                self.epoch
            );
            return false;
        }

        match result {
            Ok(coordinates) => {
                self.coordinates = Some(coordinates);
                true
            }
            Err(e) => {
                tracing::warn!(
                    "Geocoding {} failed, keeping previous coordinates: {}",
                    ticket.city,
                    e
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HANOI: Coordinates = Coordinates {
        lat: 21.0285,
        lon: 105.8542,
    };
    const DA_NANG: Coordinates = Coordinates {
        lat: 16.0544,
        lon: 108.2022,
    };

    #[test]
    fn test_search_is_case_insensitive() {
        assert_eq!(search_cities("da"), vec!["Da Nang", "Da Lat"]);
        assert_eq!(search_cities("  kong "), vec!["Hong Kong"]);
        assert_eq!(search_cities("TOKYO"), vec!["Tokyo"]);
        assert!(search_cities("zzz").is_empty());
    }

    #[test]
    fn test_search_empty_query_returns_catalogue() {
        assert_eq!(search_cities("").len(), CITIES.len());
    }

    #[test]
    fn test_stale_geocode_is_discarded() {
        let mut store = CityStore::new("Da Nang");
        let hanoi = store.select("Hanoi");
        let da_nang = store.select("Da Nang");

        assert!(store.apply_geocode(&da_nang, Ok(DA_NANG)));
        assert!(!store.apply_geocode(&hanoi, Ok(HANOI)));

        assert_eq!(store.name(), "Da Nang");
        assert_eq!(store.coordinates(), Some(DA_NANG));
    }

    #[test]
    fn test_failed_geocode_keeps_previous_coordinates() {
        let mut store = CityStore::new("Hanoi");
        let first = store.select("Hanoi");
        store.apply_geocode(&first, Ok(HANOI));

        let second = store.select("Atlantis");
        let changed = store.apply_geocode(&second, Err(GeocodeError::NoMatch("Atlantis".into())));

        assert!(!changed);
        assert_eq!(store.name(), "Atlantis");
        assert_eq!(store.coordinates(), Some(HANOI));
    }
}
