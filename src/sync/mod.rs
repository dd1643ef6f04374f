//! Dataset synchronization.
//!
//! Keeps the object store copies of the two origin datasets current:
//! the time series is written only when its bytes changed, the population
//! payload is always rewritten and announced on the notification channel.
//!
//! The read-compare-write in [`sync_time_series`] is not atomic. Two
//! overlapping invocations can both observe a stale copy and both write,
//! or one can overwrite the other's newer payload. Invocations are expected
//! to be scheduled, not concurrent, so no lock is taken.

use crate::context::PipelineContext;
use crate::error::{NotifyError, PipelineError, PipelineResult};
use crate::models::{NotificationMessage, PopulationSync, SyncReport, TimeSeriesSync};
use crate::store::Lookup;
use chrono::Utc;
use tracing::{debug, info};

/// Refresh the stored time-series blob if the origin copy changed.
///
/// Issues at most one write. A missing blob is written; an identical blob is
/// left untouched.
pub async fn sync_time_series(ctx: &PipelineContext) -> PipelineResult<TimeSeriesSync> {
    let key = ctx.keys.time_series.as_str();
    let current = ctx.source.time_series().await?;
    debug!("Fetched {} bytes for {}", current.len(), key);

    let outcome = match ctx.store.get(key).await? {
        Lookup::Found(existing) if existing == current => {
            info!("BLS data is already up to date");
            return Ok(TimeSeriesSync::UpToDate);
        }
        Lookup::Found(existing) => {
            debug!(
                "Stored copy differs ({} bytes stored, {} fetched)",
                existing.len(),
                current.len()
            );
            TimeSeriesSync::Updated {
                bytes: current.len(),
            }
        }
        Lookup::NotFound => {
            debug!("No stored copy at {}", key);
            TimeSeriesSync::Created {
                bytes: current.len(),
            }
        }
    };

    ctx.store.put(key, &current).await?;
    info!("Successfully updated BLS data: {}", outcome);

    Ok(outcome)
}

/// Rewrite the stored population blob and notify downstream consumers.
///
/// The payload is stored unconditionally. The notification is sent only
/// after the write succeeded.
pub async fn sync_population(ctx: &PipelineContext) -> PipelineResult<PopulationSync> {
    let key = ctx.keys.population.as_str();
    let data = ctx.source.population().await?;

    let payload = serde_json::to_vec(&data)
        .map_err(|e| PipelineError::origin(key, format!("cannot serialize payload: {}", e)))?;
    ctx.store.put(key, &payload).await?;
    debug!("Wrote {} bytes to {}", payload.len(), key);

    let message = NotificationMessage::population_update(Utc::now());
    let body = serde_json::to_string(&message)
        .map_err(|e| NotifyError::Encode(e.to_string()))?;
    ctx.notifier.send(&body).await?;

    info!("Successfully updated population data");

    Ok(PopulationSync {
        bytes: payload.len(),
        notified_at: message.timestamp,
    })
}

/// Run both syncs, time series first. The first failure aborts.
pub async fn sync_all(ctx: &PipelineContext) -> PipelineResult<SyncReport> {
    let time_series = sync_time_series(ctx).await?;
    if !time_series.wrote() {
        debug!("Time-series blob unchanged; continuing with population");
    }
    let population = sync_population(ctx).await?;

    Ok(SyncReport {
        time_series,
        population,
    })
}
