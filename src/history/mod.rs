//! Completed-tour history: the summary produced when a tour ends, and the
//! REST sink that persists it for signed-in users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// HTTP timeout for history calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Summary of a completed tour, handed to `on_tour_ended` subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct TourSummary {
    /// Name of the POI that was toured
    pub poi_name: String,
    /// Locality label ("New York, NY")
    pub location: String,
    /// Seconds of narration heard
    pub duration_secs: f64,
    /// The narration text
    pub transcript: String,
    /// When the tour ended
    pub completed_at: DateTime<Utc>,
}

/// Hook invoked when a tour ends.
pub type TourEndedHook = Box<dyn Fn(&TourSummary) + Send>;

/// A persisted history row.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryRecord {
    pub id: serde_json::Value,
    pub user_id: Uuid,
    pub poi_name: String,
    #[serde(default)]
    pub location: Option<String>,
    pub duration_seconds: f64,
    #[serde(default)]
    pub transcript: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// History sink errors. Always recoverable; a failed save never corrupts the
/// session.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("User not authenticated")]
    NotAuthenticated,

    #[error("History backend unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed response from history backend: {0}")]
    MalformedResponse(String),
}

#[derive(Serialize)]
struct SavePayload<'a> {
    user_id: Uuid,
    poi_name: &'a str,
    location: &'a str,
    duration_seconds: f64,
    transcript: &'a str,
}

/// REST client for the `tour_history` table.
pub struct RestHistoryClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestHistoryClient {
    /// Create a client for the given backend.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, HistoryError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| HistoryError::Unavailable(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Persist a completed tour for a user.
    pub async fn save_completed_tour(
        &self,
        user_id: Uuid,
        summary: &TourSummary,
    ) -> Result<HistoryRecord, HistoryError> {
        let url = format!("{}/rest/v1/tour_history", self.base_url);
        let payload = SavePayload {
            user_id,
            poi_name: &summary.poi_name,
            location: &summary.location,
            duration_seconds: summary.duration_secs,
            transcript: &summary.transcript,
        };

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "return=representation")
            .json(&payload)
            .send()
            .await
            .map_err(|e| HistoryError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(HistoryError::Unavailable(format!(
                "backend returned {}",
                response.status()
            )));
        }

        let mut records: Vec<HistoryRecord> = response
            .json()
            .await
            .map_err(|e| HistoryError::MalformedResponse(e.to_string()))?;

        records
            .pop()
            .ok_or_else(|| HistoryError::MalformedResponse("empty insert response".to_string()))
    }

    /// Fetch a user's history, most recent first.
    pub async fn fetch_history(&self, user_id: Uuid) -> Result<Vec<HistoryRecord>, HistoryError> {
        let url = format!(
            "{}/rest/v1/tour_history?select=*&user_id=eq.{}&order=completed_at.desc",
            self.base_url, user_id
        );

        let response = self
            .http
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| HistoryError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(HistoryError::Unavailable(format!(
                "backend returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| HistoryError::MalformedResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_record_deserializes_backend_row() {
        let json = r#"{
            "id": 12,
            "user_id": "6a3e6b9e-4a47-4b59-9c6e-0f2c8b7d1a55",
            "poi_name": "Empire State Building",
            "location": "New York, NY",
            "duration_seconds": 160.0,
            "transcript": "Standing 1,454 feet tall...",
            "completed_at": "2024-05-01T12:30:00Z"
        }"#;

        let record: HistoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.poi_name, "Empire State Building");
        assert_eq!(record.duration_seconds, 160.0);
    }

    #[test]
    fn test_summary_serializes_for_save() {
        let summary = TourSummary {
            poi_name: "Times Square".to_string(),
            location: "New York, NY".to_string(),
            duration_secs: 150.0,
            transcript: "The bustling heart of Manhattan.".to_string(),
            completed_at: Utc::now(),
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["poi_name"], "Times Square");
        assert_eq!(value["duration_secs"], 150.0);
    }
}
