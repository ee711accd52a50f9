//! Primary/fallback geocoder
//!
//! Asks the primary provider first and the fallback second. "No matches"
//! is an empty success; an error is returned only when every provider
//! failed outright.

use std::sync::Arc;

use log::{debug, warn};

use crate::config::GeocodingConfig;
use crate::domain::GeocodedLocation;
use super::{
    validate_coordinates, GeocodingError, GeocodingProvider, GeocodingResult, NominatimProvider,
    PhotonProvider,
};

#[derive(Clone)]
pub struct FallbackGeocoder {
    primary: Arc<dyn GeocodingProvider>,
    fallback: Arc<dyn GeocodingProvider>,
    search_limit: usize,
}

impl FallbackGeocoder {
    pub fn new(
        primary: Arc<dyn GeocodingProvider>,
        fallback: Arc<dyn GeocodingProvider>,
        search_limit: usize,
    ) -> Self {
        Self { primary, fallback, search_limit: search_limit.max(1) }
    }

    /// Photon first, Nominatim second
    pub fn from_config(config: &GeocodingConfig) -> GeocodingResult<Self> {
        Ok(Self::new(
            Arc::new(PhotonProvider::new(config)?),
            Arc::new(NominatimProvider::new(config)?),
            config.search_limit,
        ))
    }

    pub async fn search(&self, query: &str) -> GeocodingResult<Vec<GeocodedLocation>> {
        self.search_with_limit(query, self.search_limit).await
    }

    pub async fn search_with_limit(
        &self,
        query: &str,
        limit: usize,
    ) -> GeocodingResult<Vec<GeocodedLocation>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let limit = limit.max(1);

        let primary_failed = match self.primary.search(query, limit).await {
            Ok(results) if !results.is_empty() => return Ok(results),
            Ok(_) => {
                debug!("{} found nothing for {:?}", self.primary.name(), query);
                false
            }
            Err(e) => {
                warn!("{} search failed: {}", self.primary.name(), e);
                true
            }
        };

        match self.fallback.search(query, limit).await {
            Ok(results) if !results.is_empty() => Ok(results),
            Ok(_) => Ok(Vec::new()),
            Err(e) if primary_failed => {
                warn!("{} search failed: {}", self.fallback.name(), e);
                Err(GeocodingError::Exhausted { last: Box::new(e) })
            }
            Err(e) => {
                // The primary answered, so this is "no matches"
                warn!("{} search failed: {}", self.fallback.name(), e);
                Ok(Vec::new())
            }
        }
    }

    pub async fn reverse(&self, latitude: f64, longitude: f64) -> GeocodingResult<GeocodedLocation> {
        validate_coordinates(latitude, longitude)?;

        match self.primary.reverse(latitude, longitude).await {
            Ok(location) => return Ok(location),
            Err(e) => warn!("{} reverse failed: {}", self.primary.name(), e),
        }

        self.fallback
            .reverse(latitude, longitude)
            .await
            .map_err(|e| {
                warn!("{} reverse failed: {}", self.fallback.name(), e);
                GeocodingError::Exhausted { last: Box::new(e) }
            })
    }
}
