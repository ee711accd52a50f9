//! Nominatim provider
//!
//! Address-oriented search. Coordinates arrive as decimal strings under
//! `lat` and `lon`; a failed reverse lookup answers 200 with an `error` body.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::GeocodingConfig;
use crate::domain::{Address, GeocodedLocation};
use super::http::{endpoint, HttpTransport};
use super::{validate_coordinates, GeocodingError, GeocodingProvider, GeocodingResult};

const PROVIDER: &str = "nominatim";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NominatimPlace {
    #[serde(default)]
    pub display_name: String,
    pub lat: Option<String>,
    pub lon: Option<String>,
    #[serde(rename = "type")]
    pub place_type: Option<String>,
    pub addresstype: Option<String>,
    pub importance: Option<f64>,
    pub address: Option<NominatimAddress>,
}

impl NominatimPlace {
    /// An object with neither coordinates nor a name describes nothing
    fn is_blank(&self) -> bool {
        self.lat.is_none() && self.lon.is_none() && self.display_name.trim().is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NominatimAddress {
    pub house_number: Option<String>,
    pub road: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReverseResponse {
    Error { error: String },
    Place(NominatimPlace),
}

pub struct NominatimProvider {
    http: HttpTransport,
    base_url: String,
    language: Option<String>,
}

impl NominatimProvider {
    pub fn new(config: &GeocodingConfig) -> GeocodingResult<Self> {
        Ok(Self {
            http: HttpTransport::new(PROVIDER, config)?,
            base_url: config.nominatim_base_url.clone(),
            language: config.language.clone(),
        })
    }

    fn common_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("format", "jsonv2".to_string()),
            ("addressdetails", "1".to_string()),
        ];
        if let Some(lang) = &self.language {
            params.push(("accept-language", lang.clone()));
        }
        params
    }
}

#[async_trait]
impl GeocodingProvider for NominatimProvider {
    fn name(&self) -> &'static str {
        self.http.provider()
    }

    async fn search(&self, query: &str, limit: usize) -> GeocodingResult<Vec<GeocodedLocation>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut params = self.common_params();
        params.push(("q", query.to_string()));
        params.push(("limit", limit.max(1).to_string()));

        let places: Vec<NominatimPlace> = self
            .http
            .get_json(&endpoint(&self.base_url, "/search"), &params)
            .await?;
        Ok(places.into_iter().map(normalize).collect())
    }

    async fn reverse(&self, latitude: f64, longitude: f64) -> GeocodingResult<GeocodedLocation> {
        validate_coordinates(latitude, longitude)?;

        let mut params = self.common_params();
        params.push(("lat", latitude.to_string()));
        params.push(("lon", longitude.to_string()));

        let response: ReverseResponse = self
            .http
            .get_json(&endpoint(&self.base_url, "/reverse"), &params)
            .await?;

        match response {
            ReverseResponse::Place(place) if place.is_blank() => {
                Err(GeocodingError::NotFound { provider: PROVIDER })
            }
            ReverseResponse::Place(place) => Ok(normalize(place)),
            ReverseResponse::Error { error } => {
                log::debug!("nominatim reverse {}, {}: {}", latitude, longitude, error);
                Err(GeocodingError::NotFound { provider: PROVIDER })
            }
        }
    }
}

fn parse_coordinate(value: Option<&str>) -> f64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0.0)
}

pub(crate) fn normalize(place: NominatimPlace) -> GeocodedLocation {
    let address = place.address.map(|a| Address {
        house_number: a.house_number,
        road: a.road,
        city: a.city.or(a.town).or(a.village),
        state: a.state,
        postcode: a.postcode,
        country: a.country,
        country_code: a.country_code,
    });

    let display_name = if place.display_name.trim().is_empty() {
        address.as_ref().map(Address::summary).unwrap_or_default()
    } else {
        place.display_name
    };

    GeocodedLocation {
        display_name,
        latitude: parse_coordinate(place.lat.as_deref()),
        longitude: parse_coordinate(place.lon.as_deref()),
        address: address.filter(|a| !a.is_empty()),
        place_type: place.addresstype.or(place.place_type),
        importance: place.importance,
        provider: PROVIDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> NominatimProvider {
        let config = GeocodingConfig {
            nominatim_base_url: server.uri(),
            ..GeocodingConfig::default()
        };
        NominatimProvider::new(&config).unwrap()
    }

    fn hallstatt() -> serde_json::Value {
        json!({
            "place_id": 1234,
            "lat": "47.5622342",
            "lon": "13.6492617",
            "type": "administrative",
            "addresstype": "village",
            "importance": 0.61,
            "display_name": "Hallstatt, Gmunden, Oberösterreich, Österreich",
            "address": {
                "village": "Hallstatt",
                "state": "Oberösterreich",
                "postcode": "4830",
                "country": "Österreich",
                "country_code": "at"
            }
        })
    }

    #[test]
    fn test_normalize_parses_string_coordinates() {
        let place: NominatimPlace = serde_json::from_value(hallstatt()).unwrap();
        let location = normalize(place);

        assert_eq!(location.latitude, 47.5622342);
        assert_eq!(location.longitude, 13.6492617);
        assert_eq!(location.place_type.as_deref(), Some("village"));
        assert_eq!(location.importance, Some(0.61));
        // village stands in for a missing city
        assert_eq!(location.address.unwrap().city.as_deref(), Some("Hallstatt"));
    }

    #[test]
    fn test_normalize_bad_numbers_default_to_zero() {
        let place: NominatimPlace = serde_json::from_value(json!({
            "display_name": "Somewhere",
            "lat": "not a number"
        }))
        .unwrap();
        let location = normalize(place);

        assert_eq!((location.latitude, location.longitude), (0.0, 0.0));
        assert!(location.address.is_none());
    }

    #[test]
    fn test_town_preferred_over_village() {
        let place: NominatimPlace = serde_json::from_value(json!({
            "lat": "1", "lon": "2",
            "address": { "town": "Town", "village": "Village", "country": "X" }
        }))
        .unwrap();
        let location = normalize(place);

        assert_eq!(location.display_name, "Town, X");
        assert_eq!(location.address.unwrap().city.as_deref(), Some("Town"));
    }

    #[tokio::test]
    async fn test_search_requests_json_v2() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "hallstatt"))
            .and(query_param("format", "jsonv2"))
            .and(query_param("addressdetails", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([hallstatt()])))
            .expect(1)
            .mount(&server)
            .await;

        let results = provider_for(&server).search("hallstatt", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].provider, "nominatim");
    }

    #[tokio::test]
    async fn test_reverse_error_body_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "error": "Unable to geocode" })),
            )
            .mount(&server)
            .await;

        let err = provider_for(&server).reverse(0.0, -150.0).await.unwrap_err();
        assert!(matches!(err, GeocodingError::NotFound { provider: "nominatim" }));
    }

    #[tokio::test]
    async fn test_reverse_empty_object_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let err = provider_for(&server).reverse(10.0, 10.0).await.unwrap_err();
        assert!(matches!(err, GeocodingError::NotFound { provider: "nominatim" }));
    }

    #[tokio::test]
    async fn test_reverse_returns_place() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .and(query_param("lat", "47.5622"))
            .respond_with(ResponseTemplate::new(200).set_body_json(hallstatt()))
            .mount(&server)
            .await;

        let location = provider_for(&server).reverse(47.5622, 13.6493).await.unwrap();
        assert_eq!(location.latitude, 47.5622342);
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = provider_for(&server).search("x", 1).await.unwrap_err();
        assert!(matches!(err, GeocodingError::Status { status: 429, provider: "nominatim" }));
    }
}
