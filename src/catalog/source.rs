//! REST client for the POI backend.
//!
//! The production backend is a Supabase-style PostgREST API: rows are fetched
//! with a `select` query and authenticated with an `apikey` header.

use super::{CatalogError, PoiRecord, PointOfInterest, DEFAULT_AUDIO_LENGTH_SECS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP timeout for catalog fetches.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A curated tour row from the backend's `tours` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourRecord {
    pub id: serde_json::Value,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
}

impl TourRecord {
    /// Convert into a browsable POI with no trigger zone.
    pub fn into_poi(self) -> PointOfInterest {
        PointOfInterest {
            id: super::record_id(&self.id),
            title: self.title,
            script: self.description,
            location: None,
            locality: self.location,
            radius_m: 0.0,
            audio_length_secs: DEFAULT_AUDIO_LENGTH_SECS,
        }
    }
}

/// Client for the POI and tour tables.
pub struct RestPoiSource {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestPoiSource {
    /// Create a client for the given backend.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Fetch every POI row, ordered by display name.
    pub async fn fetch_pois(&self) -> Result<Vec<PoiRecord>, CatalogError> {
        let url = format!("{}/rest/v1/pois?select=*&order=POI", self.base_url);
        self.fetch(&url).await
    }

    /// Fetch the curated tour listing, ordered by title.
    pub async fn fetch_tours(&self) -> Result<Vec<TourRecord>, CatalogError> {
        let url = format!("{}/rest/v1/tours?select=*&order=title", self.base_url);
        self.fetch(&url).await
    }

    async fn fetch<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, CatalogError> {
        tracing::debug!("Fetching {}", url);

        let response = self
            .http
            .get(url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CatalogError::Unavailable(format!(
                "backend returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| CatalogError::MalformedResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tour_record_into_poi() {
        let record = TourRecord {
            id: json!(7),
            title: "Harbor Walk".to_string(),
            description: "A stroll along the harbor.".to_string(),
            location: Some("New York, NY".to_string()),
        };

        let poi = record.into_poi();
        assert_eq!(poi.id, "7");
        assert_eq!(poi.title, "Harbor Walk");
        assert!(poi.location.is_none());
        assert_eq!(poi.locality.as_deref(), Some("New York, NY"));
        assert_eq!(poi.audio_length_secs, DEFAULT_AUDIO_LENGTH_SECS);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let source = RestPoiSource::new("https://example.supabase.co/", "key").unwrap();
        assert_eq!(source.base_url, "https://example.supabase.co");
    }
}
