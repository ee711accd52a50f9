//! Geocoded location
//!
//! Provider-agnostic result of a place search or reverse lookup.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub house_number: Option<String>,
    pub road: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.house_number.is_none()
            && self.road.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.postcode.is_none()
            && self.country.is_none()
            && self.country_code.is_none()
    }

    /// "road house_number, city, state, country" with missing parts skipped
    pub fn summary(&self) -> String {
        let street = match (&self.road, &self.house_number) {
            (Some(road), Some(number)) => Some(format!("{} {}", road, number)),
            (Some(road), None) => Some(road.clone()),
            _ => None,
        };
        [street, self.city.clone(), self.state.clone(), self.country.clone()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedLocation {
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<Address>,
    /// Provider classification, e.g. "city" or "house"
    pub place_type: Option<String>,
    pub importance: Option<f64>,
    /// Name of the provider that produced this result
    pub provider: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_summary() {
        let address = Address {
            road: Some("Main Street".to_string()),
            house_number: Some("12".to_string()),
            city: Some("Springfield".to_string()),
            country: Some("USA".to_string()),
            ..Default::default()
        };
        assert_eq!(address.summary(), "Main Street 12, Springfield, USA");
        assert!(!address.is_empty());
        assert!(Address::default().is_empty());
    }
}
