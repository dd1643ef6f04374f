//! Trigger routing and the response envelope.
//!
//! A trigger carrying queued-message records runs the analysis; any other
//! trigger (a schedule tick, an empty object) runs both syncs. Every
//! outcome is packaged into a `{statusCode, body}` envelope whose body is a
//! JSON-encoded string.

use crate::analysis;
use crate::context::PipelineContext;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{AnalysisResult, SyncReport};
use crate::sync;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

/// Message returned in the body of a successful sync.
pub const SYNC_COMPLETED: &str = "Sync completed successfully";

/// Inbound event that decides which path runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trigger {
    /// Queued-message records delivered with the event.
    #[serde(
        rename = "Records",
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub records: Vec<Value>,
}

/// A `null` record list is an empty batch.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Trigger {
    /// Decode an event document. Blank input is a plain (sync) trigger.
    pub fn from_json(content: &str) -> PipelineResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(content).map_err(|e| PipelineError::InvalidTrigger(e.to_string()))
    }

    /// Trigger carrying one synthetic queued message.
    pub fn analysis() -> Self {
        Self {
            records: vec![json!({ "body": "manual" })],
        }
    }

    /// Returns true if this trigger routes to the analysis path.
    pub fn is_analysis(&self) -> bool {
        !self.records.is_empty()
    }
}

/// What an invocation produced.
#[derive(Debug)]
pub enum Outcome {
    Synced(SyncReport),
    Analyzed(AnalysisResult),
    Failed(PipelineError),
}

/// Response envelope handed back to the invoking runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON document encoded as a string.
    pub body: String,
}

impl Outcome {
    /// Returns true if the invocation succeeded.
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Failed(_))
    }

    /// JSON value carried in the envelope body.
    pub fn body_value(&self) -> serde_json::Result<Value> {
        match self {
            Outcome::Synced(report) => Ok(json!({
                "message": SYNC_COMPLETED,
                "time_series": report.time_series,
                "population": report.population,
            })),
            Outcome::Analyzed(result) => serde_json::to_value(result),
            Outcome::Failed(e) => Ok(json!({ "error": e.to_string() })),
        }
    }

    /// Package the outcome as a status envelope. A body that cannot be
    /// encoded turns the envelope into a 500.
    pub fn envelope(&self) -> Envelope {
        match self.body_value() {
            Ok(body) => Envelope {
                status_code: if self.is_success() { 200 } else { 500 },
                body: body.to_string(),
            },
            Err(e) => Envelope {
                status_code: 500,
                body: json!({ "error": format!("failed to encode response: {}", e) })
                    .to_string(),
            },
        }
    }
}

/// Route `trigger` to the sync or the analysis and capture the outcome.
///
/// Failures are logged here, once, and returned as [`Outcome::Failed`].
pub async fn dispatch(ctx: &PipelineContext, trigger: &Trigger) -> Outcome {
    if trigger.is_analysis() {
        info!(
            "Received {} queued record(s); running analysis",
            trigger.records.len()
        );
        match analysis::analyze(ctx).await {
            Ok(result) => {
                if let Ok(pretty) = serde_json::to_string_pretty(&result) {
                    info!("Analysis results:\n{}", pretty);
                }
                Outcome::Analyzed(result)
            }
            Err(e) => {
                error!("Error analyzing data: {}", e);
                Outcome::Failed(e)
            }
        }
    } else {
        info!("No queued records; running sync");
        match sync::sync_all(ctx).await {
            Ok(report) => Outcome::Synced(report),
            Err(e) => {
                error!("Error syncing data: {}", e);
                Outcome::Failed(e)
            }
        }
    }
}
