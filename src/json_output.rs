//! JSON output format for attribution reports

use crate::aggregator::{DatasetSummary, GroupedRow, PathLengthHistogram};
use crate::assembler::{AttributionReport, ChannelAttribution, SankeyEdge};
use crate::ingest::{ParseReport, SkippedRow};
use crate::markov::{RemovalEffect, TransitionMatrix};
use serde::Serialize;

/// Parse accounting section of the JSON document
#[derive(Debug, Clone, Serialize)]
pub struct JsonParseReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub skipped_rows: usize,
    /// Identity of every excluded row
    pub skipped: Vec<SkippedRow>,
}

impl From<&ParseReport> for JsonParseReport {
    fn from(report: &ParseReport) -> Self {
        Self {
            total_rows: report.total_rows,
            loaded_rows: report.loaded_rows,
            skipped_rows: report.skipped_count(),
            skipped: report.skipped.clone(),
        }
    }
}

/// Root JSON output structure
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    /// Active path-length filter
    pub filter: String,
    pub total_conversions: u64,
    pub summary: DatasetSummary,
    /// Final per-channel attribution table
    pub channels: Vec<ChannelAttribution>,
    pub baseline_conversion_probability: f64,
    /// Sorted ascending by effect
    pub removal_effects: Vec<RemovalEffect>,
    /// Diagnostic transition matrix (if `--matrix` enabled)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_matrix: Option<TransitionMatrix>,
    /// First→last flow edges (if `--sankey` enabled)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sankey: Option<Vec<SankeyEdge>>,
    /// Per-touch pivot tables (if `--summary` enabled)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_touch_summary: Option<Vec<GroupedRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_touch_summary: Option<Vec<GroupedRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_lengths: Option<PathLengthHistogram>,
    pub parse: JsonParseReport,
}

impl JsonReport {
    /// Assemble the JSON document from the engine report
    pub fn build(
        report: &AttributionReport,
        parse: &ParseReport,
        include_matrix: bool,
        include_sankey: bool,
        include_summary: bool,
    ) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "atribuir-report".to_string(),
            filter: report.filter.to_string(),
            total_conversions: report.total_conversions,
            summary: report.summary.clone(),
            channels: report.channels.clone(),
            baseline_conversion_probability: report.baseline_conversion_probability,
            removal_effects: report.removal_effects.clone(),
            transition_matrix: include_matrix.then(|| report.transition_matrix.clone()),
            sankey: include_sankey.then(|| report.sankey.clone()),
            first_touch_summary: include_summary.then(|| report.first_touch_summary.clone()),
            last_touch_summary: include_summary.then(|| report.last_touch_summary.clone()),
            path_lengths: include_summary.then(|| report.path_lengths.clone()),
            parse: parse.into(),
        }
    }

    /// Serialize to pretty-printed JSON
    pub fn render(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
