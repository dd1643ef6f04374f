//! Data models for the pipeline.
//!
//! This module contains the records parsed from the two datasets, the
//! analysis result structures, and the outcomes reported by the sync
//! operations.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One row of the labor-statistics time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRecord {
    /// Series identifier, e.g. `PRS30006032`.
    pub series_id: String,
    /// Calendar year of the observation.
    pub year: i32,
    /// Period code, e.g. `Q01`.
    pub period: String,
    /// Observed value.
    pub value: f64,
}

impl TimeSeriesRecord {
    #[cfg(test)]
    pub fn new(series_id: &str, year: i32, period: &str, value: f64) -> Self {
        Self {
            series_id: series_id.to_string(),
            year,
            period: period.to_string(),
            value,
        }
    }
}

/// One row of the population dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationRecord {
    pub year: i32,
    pub population: f64,
}

/// Mean and sample standard deviation of population over the year window.
///
/// `mean` is `None` when the window holds no rows; `std` is `None` when it
/// holds fewer than two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    /// Number of population rows inside the window.
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
}

/// The year with the largest summed value for one series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestYear {
    pub year: i32,
    pub value: f64,
}

/// A time-series row joined with the population of its year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedRow {
    pub series_id: String,
    pub year: i32,
    pub period: String,
    pub value: f64,
    /// Population for `year`, absent when the population table has no such year.
    pub population: Option<f64>,
}

/// The three derived views computed by the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub population_stats: PopulationStats,
    pub best_years: BTreeMap<String, BestYear>,
    pub combined_report: Vec<CombinedRow>,
}

/// Message published after the population blob is refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationMessage {
    #[serde(rename = "type")]
    pub kind: String,
    /// ISO-8601 issue time.
    pub timestamp: String,
}

impl NotificationMessage {
    pub const POPULATION_UPDATE: &'static str = "population_update";

    /// Creates a population update message stamped with `at`.
    pub fn population_update(at: DateTime<Utc>) -> Self {
        Self {
            kind: Self::POPULATION_UPDATE.to_string(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

/// Outcome of a time-series sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TimeSeriesSync {
    /// No stored copy existed; the payload was written.
    Created { bytes: usize },
    /// The stored copy differed; it was overwritten.
    Updated { bytes: usize },
    /// The stored copy matched byte-for-byte; nothing was written.
    UpToDate,
}

impl TimeSeriesSync {
    /// Returns true if the sync issued a write to the store.
    pub fn wrote(&self) -> bool {
        !matches!(self, TimeSeriesSync::UpToDate)
    }
}

impl fmt::Display for TimeSeriesSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeSeriesSync::Created { bytes } => write!(f, "created ({} bytes)", bytes),
            TimeSeriesSync::Updated { bytes } => write!(f, "updated ({} bytes)", bytes),
            TimeSeriesSync::UpToDate => write!(f, "already up to date"),
        }
    }
}

/// Outcome of a population sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSync {
    /// Size of the serialized payload written to the store.
    pub bytes: usize,
    /// Timestamp carried by the notification.
    pub notified_at: String,
}

/// Combined outcome of one sync invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub time_series: TimeSeriesSync,
    pub population: PopulationSync,
}
