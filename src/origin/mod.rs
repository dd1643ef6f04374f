//! Origin data sources.
//!
//! The two datasets are fetched from HTTP endpoints this system does not
//! own. [`DataSource`] narrows them to the two calls the sync needs.

use crate::error::{PipelineError, PipelineResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Port for reading the two origin datasets.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Raw bytes of the time-series file.
    async fn time_series(&self) -> PipelineResult<Vec<u8>>;

    /// The population payload, parsed as JSON.
    async fn population(&self) -> PipelineResult<Value>;
}

/// Build the shared HTTP client used for origin fetches and webhooks.
pub fn build_http_client(timeout_seconds: u64, user_agent: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(user_agent)
        .build()
        .context("Failed to create HTTP client")
}

/// Origin sources served over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    time_series_url: String,
    population_url: String,
    http_client: reqwest::Client,
}

impl HttpSource {
    pub fn new(
        time_series_url: impl Into<String>,
        population_url: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            time_series_url: time_series_url.into(),
            population_url: population_url.into(),
            http_client,
        }
    }

    /// GET `url` and return the response once its status is checked.
    async fn get(&self, url: &str) -> PipelineResult<reqwest::Response> {
        debug!("Fetching {}", url);

        let response = self.http_client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                PipelineError::origin(url, "request timed out")
            } else if e.is_connect() {
                PipelineError::origin(url, "cannot connect")
            } else {
                PipelineError::origin(url, e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(PipelineError::origin(
                url,
                format!("HTTP status {}", response.status()),
            ));
        }

        Ok(response)
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn time_series(&self) -> PipelineResult<Vec<u8>> {
        let url = self.time_series_url.as_str();
        let bytes = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|e| PipelineError::origin(url, format!("failed to read body: {}", e)))?;

        debug!("Fetched {} bytes of time-series data", bytes.len());
        Ok(bytes.to_vec())
    }

    async fn population(&self) -> PipelineResult<Value> {
        let url = self.population_url.as_str();
        let body = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|e| PipelineError::origin(url, format!("failed to read body: {}", e)))?;

        serde_json::from_slice(&body)
            .map_err(|e| PipelineError::origin(url, format!("malformed JSON: {}", e)))
    }
}

/// Data source returning fixed payloads, for tests.
///
/// A `None` payload simulates a failed fetch.
#[cfg(test)]
pub struct StaticSource {
    pub time_series: Option<Vec<u8>>,
    pub population: Option<Value>,
}

#[cfg(test)]
impl StaticSource {
    pub fn new(time_series: &[u8], population: Value) -> Self {
        Self {
            time_series: Some(time_series.to_vec()),
            population: Some(population),
        }
    }

    pub fn failing_time_series(population: Value) -> Self {
        Self {
            time_series: None,
            population: Some(population),
        }
    }

    pub fn failing_population(time_series: &[u8]) -> Self {
        Self {
            time_series: Some(time_series.to_vec()),
            population: None,
        }
    }
}

#[cfg(test)]
#[async_trait]
impl DataSource for StaticSource {
    async fn time_series(&self) -> PipelineResult<Vec<u8>> {
        self.time_series
            .clone()
            .ok_or_else(|| PipelineError::origin("static://bls", "connection reset"))
    }

    async fn population(&self) -> PipelineResult<Value> {
        self.population
            .clone()
            .ok_or_else(|| PipelineError::origin("static://population", "malformed JSON"))
    }
}
