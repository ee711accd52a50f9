//! Photon provider
//!
//! Point-of-interest search backed by OpenStreetMap. Responses are GeoJSON
//! feature collections whose point coordinates are `[lon, lat]`.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::GeocodingConfig;
use crate::domain::{Address, GeocodedLocation};
use super::http::{endpoint, HttpTransport};
use super::{validate_coordinates, GeocodingError, GeocodingProvider, GeocodingResult};

const PROVIDER: &str = "photon";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PhotonResponse {
    #[serde(default)]
    pub features: Vec<PhotonFeature>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PhotonFeature {
    #[serde(default)]
    pub geometry: Option<PhotonGeometry>,
    #[serde(default)]
    pub properties: PhotonProperties,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PhotonGeometry {
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PhotonProperties {
    pub name: Option<String>,
    pub housenumber: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
    pub countrycode: Option<String>,
    #[serde(rename = "type")]
    pub place_type: Option<String>,
    pub osm_value: Option<String>,
}

pub struct PhotonProvider {
    http: HttpTransport,
    base_url: String,
    language: Option<String>,
}

impl PhotonProvider {
    pub fn new(config: &GeocodingConfig) -> GeocodingResult<Self> {
        Ok(Self {
            http: HttpTransport::new(PROVIDER, config)?,
            base_url: config.photon_base_url.clone(),
            language: config.language.clone(),
        })
    }
}

#[async_trait]
impl GeocodingProvider for PhotonProvider {
    fn name(&self) -> &'static str {
        self.http.provider()
    }

    async fn search(&self, query: &str, limit: usize) -> GeocodingResult<Vec<GeocodedLocation>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut params = vec![("q", query.to_string()), ("limit", limit.max(1).to_string())];
        if let Some(lang) = &self.language {
            params.push(("lang", lang.clone()));
        }

        let response: PhotonResponse = self
            .http
            .get_json(&endpoint(&self.base_url, "/api/"), &params)
            .await?;
        Ok(normalize(response))
    }

    async fn reverse(&self, latitude: f64, longitude: f64) -> GeocodingResult<GeocodedLocation> {
        validate_coordinates(latitude, longitude)?;

        let params = [("lat", latitude.to_string()), ("lon", longitude.to_string())];
        let response: PhotonResponse = self
            .http
            .get_json(&endpoint(&self.base_url, "/reverse"), &params)
            .await?;

        normalize(response)
            .into_iter()
            .next()
            .ok_or(GeocodingError::NotFound { provider: PROVIDER })
    }
}

pub(crate) fn normalize(response: PhotonResponse) -> Vec<GeocodedLocation> {
    response.features.into_iter().map(normalize_feature).collect()
}

fn normalize_feature(feature: PhotonFeature) -> GeocodedLocation {
    let coordinates = feature.geometry.map(|g| g.coordinates).unwrap_or_default();
    let longitude = coordinates.first().copied().unwrap_or(0.0);
    let latitude = coordinates.get(1).copied().unwrap_or(0.0);

    let props = feature.properties;
    let address = Address {
        house_number: props.housenumber,
        road: props.street,
        city: props.city,
        state: props.state,
        postcode: props.postcode,
        country: props.country,
        country_code: props.countrycode.map(|c| c.to_lowercase()),
    };

    let summary = address.summary();
    let display_name = match (props.name, summary.is_empty()) {
        (Some(name), true) => name,
        (Some(name), false) if leading_part(&summary) == name.trim() => summary,
        (Some(name), false) => format!("{}, {}", name, summary),
        (None, _) => summary,
    };

    GeocodedLocation {
        display_name,
        latitude,
        longitude,
        address: if address.is_empty() { None } else { Some(address) },
        place_type: props.place_type.or(props.osm_value),
        importance: None,
        provider: PROVIDER.to_string(),
    }
}

/// First comma-separated part of an address summary
fn leading_part(summary: &str) -> &str {
    summary.split(',').next().unwrap_or("").trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn berlin() -> serde_json::Value {
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [13.3888599, 52.5170365] },
                "properties": {
                    "name": "Berlin",
                    "state": "Berlin",
                    "country": "Deutschland",
                    "countrycode": "DE",
                    "type": "city",
                    "osm_value": "city"
                }
            }]
        })
    }

    fn provider_for(server: &MockServer) -> PhotonProvider {
        let config = GeocodingConfig {
            photon_base_url: server.uri(),
            ..GeocodingConfig::default()
        };
        PhotonProvider::new(&config).unwrap()
    }

    #[test]
    fn test_normalize_swaps_coordinates() {
        let response: PhotonResponse = serde_json::from_value(berlin()).unwrap();
        let location = normalize(response).remove(0);

        assert_eq!(location.latitude, 52.5170365);
        assert_eq!(location.longitude, 13.3888599);
        assert_eq!(location.display_name, "Berlin, Deutschland");
        assert_eq!(location.place_type.as_deref(), Some("city"));
        assert_eq!(location.address.unwrap().country_code.as_deref(), Some("de"));
        assert_eq!(location.provider, "photon");
    }

    #[test]
    fn test_name_kept_when_street_shares_prefix() {
        let response: PhotonResponse = serde_json::from_value(json!({
            "features": [{
                "geometry": { "coordinates": [13.31, 52.48] },
                "properties": {
                    "name": "Berlin",
                    "street": "Berliner Straße",
                    "housenumber": "12",
                    "city": "Berlin",
                    "country": "Deutschland"
                }
            }]
        }))
        .unwrap();
        let location = normalize(response).remove(0);

        assert_eq!(location.display_name, "Berlin, Berliner Straße 12, Berlin, Deutschland");
    }

    #[test]
    fn test_normalize_missing_geometry_defaults_to_zero() {
        let response: PhotonResponse = serde_json::from_value(json!({
            "features": [{ "properties": { "name": "Nowhere" } }]
        }))
        .unwrap();
        let location = normalize(response).remove(0);

        assert_eq!((location.latitude, location.longitude), (0.0, 0.0));
        assert_eq!(location.display_name, "Nowhere");
        assert!(location.address.is_none());
    }

    #[tokio::test]
    async fn test_search_sends_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/"))
            .and(query_param("q", "berlin"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(berlin()))
            .expect(1)
            .mount(&server)
            .await;

        let results = provider_for(&server).search("  berlin ", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].display_name, "Berlin, Deutschland");
    }

    #[tokio::test]
    async fn test_blank_query_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(berlin()))
            .expect(0)
            .mount(&server)
            .await;

        assert!(provider_for(&server).search("   ", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reverse_without_features_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "features": [] })))
            .mount(&server)
            .await;

        let err = provider_for(&server).reverse(52.5, 13.4).await.unwrap_err();
        assert!(matches!(err, GeocodingError::NotFound { provider: "photon" }));
    }

    #[tokio::test]
    async fn test_server_error_is_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = provider_for(&server).search("berlin", 5).await.unwrap_err();
        assert!(matches!(err, GeocodingError::Status { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_garbage_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .mount(&server)
            .await;

        let err = provider_for(&server).search("berlin", 5).await.unwrap_err();
        assert!(matches!(err, GeocodingError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_out_of_range_reverse_rejected() {
        let server = MockServer::start().await;
        let err = provider_for(&server).reverse(123.0, 0.0).await.unwrap_err();
        assert!(matches!(err, GeocodingError::InvalidCoordinates { .. }));
    }
}
