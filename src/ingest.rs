//! Journey dataset ingestion
//!
//! Loads the journey CSV into raw records, then decodes each record
//! into a [`Dataset`](crate::aggregator::Dataset). Structural problems
//! (unreadable file, malformed or negative counts) are fatal before
//! the pipeline runs; per-row path problems are recovered by
//! excluding the row and recording it in the [`ParseReport`], so no
//! journey is ever dropped silently.

use crate::aggregator::{Dataset, ParsedJourney};
use crate::channel_map::ChannelMap;
use crate::path_parser::{self, ParseError};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One raw row of the journey CSV, one row per distinct journey
/// signature
#[derive(Debug, Clone, Deserialize)]
pub struct JourneyRecord {
    /// Encoded touch sequence, `"<idx>&<code>@<idx>&<code>@..."`
    pub str_path: String,
    /// Count of journeys with this exact sequence that converted
    pub converters: u64,
    /// Count that did not convert
    pub nonconverters: u64,
    /// Precomputed first-touch label; must agree with the decode
    #[serde(default)]
    pub first_touch: Option<String>,
    /// Precomputed last-touch label; must agree with the decode
    #[serde(default)]
    pub last_touch: Option<String>,
    /// Optional per-record flag counts, summed for the summary only
    #[serde(default)]
    pub promotion: Option<u64>,
    #[serde(default)]
    pub web: Option<u64>,
    #[serde(default)]
    pub phone: Option<u64>,
}

/// Why a row was excluded from modeling
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum SkipReason {
    /// Path decoding failed (malformed segment, bad index, unknown code)
    Parse(String),
    /// `converters + nonconverters == 0`; would contribute degenerate edges
    ZeroWeight,
    /// Precomputed first/last touch column disagrees with the decode
    TouchMismatch(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Parse(msg) => write!(f, "{}", msg),
            SkipReason::ZeroWeight => write!(f, "zero journey weight"),
            SkipReason::TouchMismatch(msg) => write!(f, "{}", msg),
        }
    }
}

/// Identity of one excluded row
#[derive(Debug, Clone, Serialize)]
pub struct SkippedRow {
    /// 1-based data row number in the input CSV
    pub row: usize,
    /// The encoded path as it appeared in the input
    pub str_path: String,
    pub reason: SkipReason,
}

/// Accounting of which input rows made it into the dataset
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub skipped: Vec<SkippedRow>,
}

impl ParseReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Read raw journey records from a CSV file
///
/// # Errors
///
/// Fails on an unreadable file or any structurally malformed row —
/// including negative counts, which `u64` deserialization rejects.
pub fn read_journeys(path: &Path) -> Result<Vec<JourneyRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open journey dataset {}", path.display()))?;

    let mut records = Vec::new();
    for (line, record) in reader.deserialize().enumerate() {
        let record: JourneyRecord = record.with_context(|| {
            format!("invalid journey row {} (counts must be non-negative integers)", line + 2)
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Decode raw records into a dataset, recovering per-row failures
///
/// Rows that fail path decoding, disagree with their precomputed
/// first/last touch columns, or carry zero total weight are excluded
/// and recorded in the returned [`ParseReport`].
pub fn build_dataset(records: &[JourneyRecord], map: &ChannelMap) -> (Dataset, ParseReport) {
    let mut journeys = Vec::with_capacity(records.len());
    let mut report = ParseReport {
        total_rows: records.len(),
        ..ParseReport::default()
    };

    for (idx, record) in records.iter().enumerate() {
        let row = idx + 1;
        match decode_record(record, map) {
            Ok(journey) => {
                journeys.push(journey);
                report.loaded_rows += 1;
            }
            Err(reason) => {
                tracing::debug!(row, path = %record.str_path, %reason, "excluding journey row");
                report.skipped.push(SkippedRow {
                    row,
                    str_path: record.str_path.clone(),
                    reason,
                });
            }
        }
    }

    if !report.skipped.is_empty() {
        tracing::warn!(
            skipped = report.skipped.len(),
            total = report.total_rows,
            "excluded journey rows from modeling"
        );
    }

    (Dataset::new(journeys), report)
}

fn decode_record(
    record: &JourneyRecord,
    map: &ChannelMap,
) -> std::result::Result<ParsedJourney, SkipReason> {
    let path = path_parser::parse_path(&record.str_path, map)
        .map_err(|e: ParseError| SkipReason::Parse(e.to_string()))?;

    // Both ends of the decoded sequence exist since length >= 1.
    let first = path.first().map(String::as_str).unwrap_or_default();
    let last = path.last().map(String::as_str).unwrap_or_default();

    if let Some(expected) = record.first_touch.as_deref() {
        if !expected.is_empty() && expected != first {
            return Err(SkipReason::TouchMismatch(format!(
                "first_touch column '{}' disagrees with decoded '{}'",
                expected, first
            )));
        }
    }
    if let Some(expected) = record.last_touch.as_deref() {
        if !expected.is_empty() && expected != last {
            return Err(SkipReason::TouchMismatch(format!(
                "last_touch column '{}' disagrees with decoded '{}'",
                expected, last
            )));
        }
    }

    if record.converters + record.nonconverters == 0 {
        return Err(SkipReason::ZeroWeight);
    }

    Ok(ParsedJourney {
        path,
        converters: record.converters,
        nonconverters: record.nonconverters,
        promotion: record.promotion,
        web: record.web,
        phone: record.phone,
    })
}

/// Convenience: read and decode in one step
pub fn load_dataset(path: &Path, map: &ChannelMap) -> Result<(Dataset, ParseReport)> {
    let records = read_journeys(path)?;
    Ok(build_dataset(&records, map))
}
