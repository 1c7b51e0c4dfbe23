use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    http::{REQUEST_TIMEOUT, build_client, truncate_body},
    model::{ForecastEntry, ForecastRequest},
};

/// Why a forecast could not be obtained. Always carries a readable description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForecastError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Forecast request timed out: {0}")]
    Timeout(String),

    #[error("Forecast request failed: {0}")]
    Request(String),

    #[error("Forecast request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse forecast JSON: {0}")]
    Parse(String),
}

impl ForecastError {
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// Either the forecast entries or the reason they are missing. Never both.
pub type ForecastResult = Result<Vec<ForecastEntry>, ForecastError>;

#[async_trait]
pub trait ForecastClient: Send + Sync + Debug {
    /// One GET against `endpoint`. Failures come back as `Err`, never as a panic.
    async fn fetch_forecast(&self, endpoint: &str, request: &ForecastRequest) -> ForecastResult;
}

/// Client for the OpenWeatherMap 5 day / 3 hour forecast API.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: Client,
}

impl OpenWeatherClient {
    pub fn new() -> Result<Self, ForecastError> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, ForecastError> {
        let http = build_client(timeout).map_err(|e| ForecastError::Client(e.to_string()))?;
        Ok(Self { http })
    }
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    #[serde(default)]
    list: Vec<ForecastEntry>,
}

#[async_trait]
impl ForecastClient for OpenWeatherClient {
    #[instrument(skip(self, request), fields(cnt = request.count))]
    async fn fetch_forecast(&self, endpoint: &str, request: &ForecastRequest) -> ForecastResult {
        let res = self
            .http
            .get(endpoint)
            .query(&request.query())
            .send()
            .await
            .map_err(ForecastError::from_transport)?;

        let status = res.status();
        let body = res.text().await.map_err(ForecastError::from_transport)?;

        if !status.is_success() {
            return Err(ForecastError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: OwForecastResponse =
            serde_json::from_str(&body).map_err(|e| ForecastError::Parse(e.to_string()))?;

        debug!(entries = parsed.list.len(), "Forecast received");
        Ok(parsed.list)
    }
}
