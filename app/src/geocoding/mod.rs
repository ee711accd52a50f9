//! Geocoding
//!
//! Place search and reverse lookup against two public services. Photon
//! (points of interest) is asked first and Nominatim (addresses) second;
//! both answers are normalised into [`GeocodedLocation`].

mod client;
mod http;
mod nominatim;
mod photon;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::GeocodedLocation;

pub use client::FallbackGeocoder;
pub use nominatim::NominatimProvider;
pub use photon::PhotonProvider;

pub type GeocodingResult<T> = Result<T, GeocodingError>;

#[derive(Debug, Error)]
pub enum GeocodingError {
    #[error("{provider}: request failed: {source}")]
    Network {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider}: HTTP status {status}")]
    Status { provider: &'static str, status: u16 },
    #[error("{provider}: malformed response: {source}")]
    Decode {
        provider: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{provider}: no place found")]
    NotFound { provider: &'static str },
    #[error("Invalid coordinates: {latitude}, {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
    /// Every provider failed; carries the error of the last one asked
    #[error("All geocoding providers failed: {last}")]
    Exhausted {
        #[source]
        last: Box<GeocodingError>,
    },
}

/// One geocoding backend
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Candidate places for a free-text query, best match first
    async fn search(&self, query: &str, limit: usize) -> GeocodingResult<Vec<GeocodedLocation>>;

    /// Best match for a coordinate
    async fn reverse(&self, latitude: f64, longitude: f64) -> GeocodingResult<GeocodedLocation>;
}

pub(crate) fn validate_coordinates(latitude: f64, longitude: f64) -> GeocodingResult<()> {
    if (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude) {
        Ok(())
    } else {
        Err(GeocodingError::InvalidCoordinates { latitude, longitude })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(0.0, 0.0).is_ok());
        assert!(validate_coordinates(-90.0, 180.0).is_ok());
        assert!(validate_coordinates(90.1, 0.0).is_err());
        assert!(validate_coordinates(0.0, -180.5).is_err());
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_both_normalisers_agree_on_coordinates() {
        // Eiffel Tower: Photon sends [lon, lat], Nominatim sends "lat"/"lon"
        let (lat, lon) = (48.8582599, 2.2945006);

        let photon: photon::PhotonResponse = serde_json::from_value(serde_json::json!({
            "features": [{
                "geometry": { "type": "Point", "coordinates": [lon, lat] },
                "properties": { "name": "Tour Eiffel", "city": "Paris", "country": "France" }
            }]
        }))
        .unwrap();
        let nominatim: Vec<nominatim::NominatimPlace> = serde_json::from_value(serde_json::json!([{
            "display_name": "Tour Eiffel, Paris, France",
            "lat": lat.to_string(),
            "lon": lon.to_string()
        }]))
        .unwrap();

        let from_photon = photon::normalize(photon).remove(0);
        let from_nominatim = nominatim::normalize(nominatim.into_iter().next().unwrap());

        assert_eq!((from_photon.latitude, from_photon.longitude), (lat, lon));
        assert_eq!((from_nominatim.latitude, from_nominatim.longitude), (lat, lon));
    }

    #[test]
    fn test_exhausted_mentions_last_error() {
        let err = GeocodingError::Exhausted {
            last: Box::new(GeocodingError::Status { provider: "nominatim", status: 503 }),
        };
        let message = err.to_string();
        assert!(message.contains("nominatim"));
        assert!(message.contains("503"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
