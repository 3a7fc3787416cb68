//! Channel code→label mapping
//!
//! The mapping is fixed configuration supplied alongside the dataset
//! (a two-column `code,label` CSV), never derived from the data.
//! Codes absent from the map are a hard per-row error during path
//! parsing.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// One row of the mapping CSV
#[derive(Debug, Deserialize)]
struct MappingRecord {
    code: String,
    label: String,
}

/// Fixed lookup table from channel code to display label
#[derive(Debug, Clone, Default)]
pub struct ChannelMap {
    labels: HashMap<String, String>,
}

impl ChannelMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from `(code, label)` pairs
    pub fn from_pairs<I, C, L>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, L)>,
        C: Into<String>,
        L: Into<String>,
    {
        let labels = pairs
            .into_iter()
            .map(|(c, l)| (c.into(), l.into()))
            .collect();
        Self { labels }
    }

    /// Load a mapping from a two-column CSV with a `code,label` header
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, a row is malformed, or the
    /// same code is mapped twice.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to open channel mapping {}", path.display()))?;

        let mut labels = HashMap::new();
        for (line, record) in reader.deserialize().enumerate() {
            let record: MappingRecord = record
                .with_context(|| format!("malformed mapping row {}", line + 2))?;
            if labels
                .insert(record.code.clone(), record.label)
                .is_some()
            {
                anyhow::bail!("duplicate channel code '{}' in mapping", record.code);
            }
        }

        if labels.is_empty() {
            anyhow::bail!("channel mapping {} has no rows", path.display());
        }

        Ok(Self { labels })
    }

    /// Look up the display label for a channel code
    pub fn label(&self, code: &str) -> Option<&str> {
        self.labels.get(code).map(String::as_str)
    }

    /// Number of mapped codes
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True if no codes are mapped
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
