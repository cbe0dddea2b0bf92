use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub const DEFAULT_FRED_URL: &str = "https://api.stlouisfed.org/fred/series/observations";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to upstream failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream responded with {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("could not decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("observation {index} has non-numeric value {raw:?}")]
    InvalidValue { index: usize, raw: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: Option<NaiveDate>,
    pub value: f64,
}

/// Anything that can produce the observations of a named series, oldest first.
#[async_trait]
pub trait ObservationSource: Send + Sync {
    async fn fetch_series(&self, series_id: &str) -> Result<Vec<Observation>, FetchError>;
}

pub type SharedSource = Arc<dyn ObservationSource>;

// --- Wire format ---

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<RawObservation>,
}

#[derive(Debug, Deserialize)]
struct RawObservation {
    #[serde(default)]
    date: Option<NaiveDate>,
    value: String,
}

#[derive(Debug, Deserialize)]
struct FredErrorBody {
    error_message: String,
}

/// Decodes a FRED observations payload. Every value must be a finite number;
/// FRED marks missing data with "." which is rejected here.
pub fn parse_observations(body: &[u8]) -> Result<Vec<Observation>, FetchError> {
    let response: ObservationsResponse = serde_json::from_slice(body)?;

    response
        .observations
        .into_iter()
        .enumerate()
        .map(|(index, raw)| match raw.value.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Observation { date: raw.date, value }),
            _ => Err(FetchError::InvalidValue { index, raw: raw.value }),
        })
        .collect()
}

// --- Client ---

pub struct FredClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FredClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(FredClient {
            client,
            base_url,
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ObservationSource for FredClient {
    #[instrument(skip(self))]
    async fn fetch_series(&self, series_id: &str) -> Result<Vec<Observation>, FetchError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("series_id", series_id),
                ("api_key", self.api_key.as_str()),
                ("file_type", "json"),
            ])
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<FredErrorBody>(&body)
                .map(|e| e.error_message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).trim().to_string());
            warn!(%status, %message, "FRED rejected observations request");
            return Err(FetchError::Status { status, message });
        }

        let observations = parse_observations(&body)?;
        debug!(count = observations.len(), "Decoded observations");
        Ok(observations)
    }
}
