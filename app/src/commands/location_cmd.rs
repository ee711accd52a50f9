//! Commands for place lookup

use crate::domain::GeocodedLocation;
use crate::AppState;

/// Candidate places for a free-text query
pub async fn search_places(state: &AppState, query: String) -> Result<Vec<GeocodedLocation>, String> {
    state.geocoder.search(&query).await.map_err(|e| e.to_string())
}

/// Best place for a coordinate
pub async fn reverse_geocode(
    state: &AppState,
    latitude: f64,
    longitude: f64,
) -> Result<GeocodedLocation, String> {
    state
        .geocoder
        .reverse(latitude, longitude)
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::commands::test_support::{app_state, app_state_with};
    use crate::config::AppConfig;

    #[tokio::test]
    async fn test_search_falls_back_to_nominatim() {
        let photon = MockServer::start().await;
        let nominatim = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "features": [] })))
            .expect(1)
            .mount(&photon)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "display_name": "Cork, Ireland",
                "lat": "51.8985",
                "lon": "-8.4756"
            }])))
            .expect(1)
            .mount(&nominatim)
            .await;

        let mut config = AppConfig::default();
        config.geocoding.photon_base_url = photon.uri();
        config.geocoding.nominatim_base_url = nominatim.uri();
        let (state, _dir) = app_state_with(config).await;

        let places = search_places(&state, "Cork".into()).await.unwrap();
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].provider, "nominatim");
        assert_eq!(places[0].latitude, 51.8985);
    }

    #[tokio::test]
    async fn test_both_down_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut config = AppConfig::default();
        config.geocoding.photon_base_url = server.uri();
        config.geocoding.nominatim_base_url = server.uri();
        let (state, _dir) = app_state_with(config).await;

        let err = reverse_geocode(&state, 10.0, 10.0).await.unwrap_err();
        assert!(err.contains("nominatim"));
        assert!(err.contains("503"));
    }

    #[tokio::test]
    async fn test_invalid_coordinates() {
        let (state, _dir) = app_state().await;
        assert!(reverse_geocode(&state, 0.0, 200.0).await.is_err());
    }
}
