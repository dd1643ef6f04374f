//! Analysis of the stored datasets.
//!
//! Reads both blobs from the object store (never writes), parses them and
//! computes the three derived views. Any failure aborts the whole analysis.

pub mod aggregator;
pub mod table;

pub use aggregator::*;

use crate::context::PipelineContext;
use crate::error::{PipelineError, PipelineResult};
use crate::models::AnalysisResult;
use tracing::{debug, info};

/// Load a blob that the sync must already have written.
async fn load(ctx: &PipelineContext, key: &str) -> PipelineResult<Vec<u8>> {
    ctx.store
        .get(key)
        .await?
        .into_bytes()
        .ok_or_else(|| PipelineError::analysis(format!("dataset '{}' has not been synced", key)))
}

/// Compute population statistics, best years per series and the combined
/// report from the stored datasets.
pub async fn analyze(ctx: &PipelineContext) -> PipelineResult<AnalysisResult> {
    let (ts_bytes, pop_bytes) = futures::try_join!(
        load(ctx, &ctx.keys.time_series),
        load(ctx, &ctx.keys.population)
    )?;

    let series = table::parse_time_series(&ts_bytes)?;
    let population = table::parse_population(&pop_bytes)?;
    debug!(
        "Loaded {} time-series rows across {} series and {} population rows",
        series.len(),
        distinct_series(&series),
        population.len()
    );

    let settings = &ctx.analysis;
    let result = AnalysisResult {
        population_stats: population_stats(
            &population,
            settings.window_start,
            settings.window_end,
        ),
        best_years: best_years(&series),
        combined_report: combined_report(
            &series,
            &population,
            &settings.report_series_id,
            &settings.report_period,
        ),
    };

    info!(
        "Analysis complete: {} population rows in window, {} series, {} report rows",
        result.population_stats.count,
        result.best_years.len(),
        result.combined_report.len()
    );

    Ok(result)
}
