//! Output rendering.
//!
//! This module renders an invocation outcome either as the JSON response
//! envelope or as a Markdown summary for people reading the terminal.

use crate::dispatcher::{Envelope, Outcome};
use crate::models::{AnalysisResult, PopulationStats, SyncReport};
use anyhow::Result;
use chrono::{DateTime, Utc};

/// Render the response envelope as pretty JSON.
pub fn generate_json_report(envelope: &Envelope) -> Result<String> {
    serde_json::to_string_pretty(envelope).map_err(Into::into)
}

/// Generate a complete Markdown report for an outcome.
pub fn generate_markdown_report(outcome: &Outcome, generated_at: DateTime<Utc>) -> String {
    let mut output = String::new();

    output.push_str("# Datapipe Report\n\n");
    output.push_str(&format!(
        "- **Generated:** {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!(
        "- **Status:** {}\n\n",
        outcome.envelope().status_code
    ));

    match outcome {
        Outcome::Synced(report) => output.push_str(&generate_sync_section(report)),
        Outcome::Analyzed(result) => output.push_str(&generate_analysis_sections(result)),
        Outcome::Failed(e) => output.push_str(&format!("## Error\n\n{}\n\n", e)),
    }

    output
}

fn generate_sync_section(report: &SyncReport) -> String {
    let mut section = String::new();

    section.push_str("## Sync\n\n");
    section.push_str(&format!("- **Time series:** {}\n", report.time_series));
    section.push_str(&format!(
        "- **Population:** {} bytes written, notified at {}\n\n",
        report.population.bytes, report.population.notified_at
    ));

    section
}

fn generate_analysis_sections(result: &AnalysisResult) -> String {
    let mut output = String::new();

    output.push_str(&generate_population_section(&result.population_stats));

    output.push_str("## Best Year per Series\n\n");
    if result.best_years.is_empty() {
        output.push_str("No time-series data.\n\n");
    } else {
        output.push_str("| Series | Year | Value |\n");
        output.push_str("|--------|------|-------|\n");
        for (series_id, best) in &result.best_years {
            output.push_str(&format!(
                "| {} | {} | {} |\n",
                series_id, best.year, best.value
            ));
        }
        output.push('\n');
    }

    output.push_str("## Combined Report\n\n");
    if result.combined_report.is_empty() {
        output.push_str("No matching rows.\n\n");
    } else {
        output.push_str("| Series | Year | Period | Value | Population |\n");
        output.push_str("|--------|------|--------|-------|------------|\n");
        for row in &result.combined_report {
            let population = row
                .population
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string());
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                row.series_id, row.year, row.period, row.value, population
            ));
        }
        output.push('\n');
    }

    output
}

fn generate_population_section(stats: &PopulationStats) -> String {
    let mut section = String::new();

    section.push_str("## Population Statistics\n\n");
    section.push_str(&format!("- **Years in window:** {}\n", stats.count));
    match stats.mean {
        Some(mean) => section.push_str(&format!("- **Mean:** {:.2}\n", mean)),
        None => section.push_str("- **Mean:** no data\n"),
    }
    match stats.std {
        Some(std) => section.push_str(&format!("- **Std. deviation:** {:.2}\n", std)),
        None => section.push_str("- **Std. deviation:** no data\n"),
    }
    section.push('\n');

    section
}
