//! Journey aggregation and grouped views
//!
//! The [`Dataset`] is an immutable snapshot of decoded journeys. All
//! derived views — the weighted path multiset, grouped touch sums,
//! the dataset summary, the path-length histogram — are rebuilt from
//! it on demand and never mutated in place, so every (dataset,
//! filter) pair computes from scratch and two runs over the same
//! input produce identical tables.

use serde::Serialize;
use std::collections::HashMap;
use trueno::Vector;

/// One decoded journey row: an ordered label sequence plus outcome
/// counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedJourney {
    pub path: Vec<String>,
    pub converters: u64,
    pub nonconverters: u64,
    pub promotion: Option<u64>,
    pub web: Option<u64>,
    pub phone: Option<u64>,
}

impl ParsedJourney {
    /// Total journey weight for this row
    pub fn weight(&self) -> u64 {
        self.converters + self.nonconverters
    }
}

/// Immutable snapshot of all decoded journeys
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    journeys: Vec<ParsedJourney>,
}

impl Dataset {
    pub fn new(journeys: Vec<ParsedJourney>) -> Self {
        Self { journeys }
    }

    pub fn len(&self) -> usize {
        self.journeys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journeys.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParsedJourney> {
        self.journeys.iter()
    }

    /// Journeys selected by a path-length filter
    pub fn filtered(&self, filter: TouchFilter) -> impl Iterator<Item = &ParsedJourney> {
        self.journeys
            .iter()
            .filter(move |j| filter.matches(j.path.len()))
    }
}

/// Path-length partition: single-touch vs multi-touch journeys
///
/// A pure re-partitioning of the dataset, not a new computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchFilter {
    All,
    SingleTouch,
    MultiTouch,
}

impl TouchFilter {
    pub fn matches(self, path_len: usize) -> bool {
        match self {
            TouchFilter::All => true,
            TouchFilter::SingleTouch => path_len == 1,
            TouchFilter::MultiTouch => path_len > 1,
        }
    }
}

impl std::fmt::Display for TouchFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TouchFilter::All => "all",
            TouchFilter::SingleTouch => "single-touch",
            TouchFilter::MultiTouch => "multi-touch",
        };
        write!(f, "{}", name)
    }
}

/// A distinct path with its summed outcome counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedPath {
    pub path: Vec<String>,
    pub converters: u64,
    pub nonconverters: u64,
}

impl AggregatedPath {
    pub fn weight(&self) -> u64 {
        self.converters + self.nonconverters
    }

    pub fn first(&self) -> &str {
        &self.path[0]
    }

    pub fn last(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }

    /// Distinct channels in touch order (repeats count once)
    pub fn distinct_channels(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for channel in &self.path {
            if !seen.contains(&channel.as_str()) {
                seen.push(channel.as_str());
            }
        }
        seen
    }
}

/// Weighted multiset of distinct paths for one (dataset, filter) pair
///
/// Paths keep first-appearance order over the input rows, which makes
/// every downstream table deterministic.
#[derive(Debug, Clone, Default)]
pub struct AggregatedPaths {
    paths: Vec<AggregatedPath>,
    total_converters: u64,
    total_nonconverters: u64,
}

impl AggregatedPaths {
    /// Aggregate the filtered journeys into distinct weighted paths
    pub fn aggregate(dataset: &Dataset, filter: TouchFilter) -> Self {
        let mut paths: Vec<AggregatedPath> = Vec::new();
        let mut index: HashMap<Vec<String>, usize> = HashMap::new();
        let mut total_converters = 0;
        let mut total_nonconverters = 0;

        for journey in dataset.filtered(filter) {
            total_converters += journey.converters;
            total_nonconverters += journey.nonconverters;

            match index.get(&journey.path) {
                Some(&i) => {
                    paths[i].converters += journey.converters;
                    paths[i].nonconverters += journey.nonconverters;
                }
                None => {
                    index.insert(journey.path.clone(), paths.len());
                    paths.push(AggregatedPath {
                        path: journey.path.clone(),
                        converters: journey.converters,
                        nonconverters: journey.nonconverters,
                    });
                }
            }
        }

        Self {
            paths,
            total_converters,
            total_nonconverters,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AggregatedPath> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn total_conversions(&self) -> u64 {
        self.total_converters
    }

    pub fn total_nonconversions(&self) -> u64 {
        self.total_nonconverters
    }

    pub fn total_weight(&self) -> u64 {
        self.total_converters + self.total_nonconverters
    }

    /// All channels appearing in any path, sorted by label
    pub fn channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = Vec::new();
        for path in &self.paths {
            for channel in &path.path {
                if !channels.contains(channel) {
                    channels.push(channel.clone());
                }
            }
        }
        channels.sort();
        channels
    }
}

/// Typed key selector for grouped sums
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchKey {
    First,
    Last,
    FullPath,
}

impl TouchKey {
    fn key_for(self, path: &AggregatedPath) -> String {
        match self {
            TouchKey::First => path.first().to_string(),
            TouchKey::Last => path.last().to_string(),
            TouchKey::FullPath => path.path.join(" > "),
        }
    }
}

/// One grouped row: conversion and non-conversion sums for a key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedRow {
    pub key: String,
    /// Number of distinct paths under this key
    pub paths: usize,
    pub conversions: u64,
    pub non_conversions: u64,
    pub conversion_pct: f64,
    pub non_conversion_pct: f64,
}

/// Round to 3 decimals, the precision the summary tables display
fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Group aggregated paths by a touch key and sum their outcomes
///
/// Rows keep first-appearance order; consumers sort for display.
pub fn group_by(agg: &AggregatedPaths, key: TouchKey) -> Vec<GroupedRow> {
    let mut rows: Vec<GroupedRow> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for path in agg.iter() {
        let k = key.key_for(path);
        match index.get(&k) {
            Some(&i) => {
                rows[i].paths += 1;
                rows[i].conversions += path.converters;
                rows[i].non_conversions += path.nonconverters;
            }
            None => {
                index.insert(k.clone(), rows.len());
                rows.push(GroupedRow {
                    key: k,
                    paths: 1,
                    conversions: path.converters,
                    non_conversions: path.nonconverters,
                    conversion_pct: 0.0,
                    non_conversion_pct: 0.0,
                });
            }
        }
    }

    for row in &mut rows {
        let total = row.conversions + row.non_conversions;
        if total > 0 {
            row.conversion_pct = round3(row.conversions as f64 / total as f64 * 100.0);
            row.non_conversion_pct = round3(row.non_conversions as f64 / total as f64 * 100.0);
        }
    }

    rows
}

/// Headline counts for the filtered dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub total_journeys: u64,
    pub converters: u64,
    pub nonconverters: u64,
    pub conversion_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<u64>,
}

impl DatasetSummary {
    /// Compute headline counts over the filtered journeys
    pub fn compute(dataset: &Dataset, filter: TouchFilter) -> Self {
        let mut summary = DatasetSummary::default();
        let mut promotion: Option<u64> = None;
        let mut web: Option<u64> = None;
        let mut phone: Option<u64> = None;

        for journey in dataset.filtered(filter) {
            summary.converters += journey.converters;
            summary.nonconverters += journey.nonconverters;
            if let Some(p) = journey.promotion {
                promotion = Some(promotion.unwrap_or(0) + p);
            }
            if let Some(w) = journey.web {
                web = Some(web.unwrap_or(0) + w);
            }
            if let Some(p) = journey.phone {
                phone = Some(phone.unwrap_or(0) + p);
            }
        }

        summary.total_journeys = summary.converters + summary.nonconverters;
        if summary.total_journeys > 0 {
            summary.conversion_rate =
                round3(summary.converters as f64 / summary.total_journeys as f64 * 100.0);
        }
        summary.promotion = promotion;
        summary.web = web;
        summary.phone = phone;
        summary
    }
}

/// One histogram bucket: journeys with exactly `touches` touches
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathLengthBucket {
    pub touches: usize,
    /// Distinct path signatures of this length
    pub distinct_paths: usize,
    /// Journey-weighted count
    pub journeys: u64,
}

/// Distribution of touches per journey
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathLengthHistogram {
    pub buckets: Vec<PathLengthBucket>,
    /// Journey-weighted mean touches per path
    pub mean_touches: f64,
}

impl PathLengthHistogram {
    /// Build the histogram from the aggregated paths
    pub fn compute(agg: &AggregatedPaths) -> Self {
        if agg.is_empty() {
            return Self::default();
        }

        let mut by_length: HashMap<usize, (usize, u64)> = HashMap::new();
        for path in agg.iter() {
            let entry = by_length.entry(path.path.len()).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += path.weight();
        }

        let mut buckets: Vec<PathLengthBucket> = by_length
            .into_iter()
            .map(|(touches, (distinct_paths, journeys))| PathLengthBucket {
                touches,
                distinct_paths,
                journeys,
            })
            .collect();
        buckets.sort_by_key(|b| b.touches);

        // Weighted totals via trueno SIMD sums
        let weighted: Vec<f32> = agg
            .iter()
            .map(|p| p.path.len() as f32 * p.weight() as f32)
            .collect();
        let weights: Vec<f32> = agg.iter().map(|p| p.weight() as f32).collect();
        let weighted_sum = Vector::from_slice(&weighted).sum().unwrap_or(0.0) as f64;
        let weight_sum = Vector::from_slice(&weights).sum().unwrap_or(0.0) as f64;

        let mean_touches = if weight_sum > 0.0 {
            weighted_sum / weight_sum
        } else {
            0.0
        };

        Self {
            buckets,
            mean_touches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn journey(path: &[&str], conv: u64, nonconv: u64) -> ParsedJourney {
        ParsedJourney {
            path: path.iter().map(|s| s.to_string()).collect(),
            converters: conv,
            nonconverters: nonconv,
            promotion: None,
            web: None,
            phone: None,
        }
    }

    fn two_path_dataset() -> Dataset {
        Dataset::new(vec![
            journey(&["A", "B"], 5, 5),
            journey(&["B", "A"], 3, 7),
            journey(&["A"], 2, 8),
        ])
    }

    #[test]
    fn test_aggregate_merges_identical_paths() {
        let dataset = Dataset::new(vec![
            journey(&["A", "B"], 5, 5),
            journey(&["A", "B"], 1, 2),
        ]);
        let agg = AggregatedPaths::aggregate(&dataset, TouchFilter::All);

        assert_eq!(agg.len(), 1);
        let path = agg.iter().next().unwrap();
        assert_eq!(path.converters, 6);
        assert_eq!(path.nonconverters, 7);
        assert_eq!(agg.total_conversions(), 6);
        assert_eq!(agg.total_weight(), 13);
    }

    #[test]
    fn test_aggregate_keeps_distinct_paths_apart() {
        let agg = AggregatedPaths::aggregate(&two_path_dataset(), TouchFilter::All);
        assert_eq!(agg.len(), 3);
        assert_eq!(agg.total_conversions(), 10);
    }

    #[test]
    fn test_single_touch_filter() {
        let agg = AggregatedPaths::aggregate(&two_path_dataset(), TouchFilter::SingleTouch);
        assert_eq!(agg.len(), 1);
        assert_eq!(agg.iter().next().unwrap().path, vec!["A"]);
        assert_eq!(agg.total_conversions(), 2);
    }

    #[test]
    fn test_multi_touch_filter() {
        let agg = AggregatedPaths::aggregate(&two_path_dataset(), TouchFilter::MultiTouch);
        assert_eq!(agg.len(), 2);
        assert_eq!(agg.total_conversions(), 8);
    }

    #[test]
    fn test_filters_partition_the_dataset() {
        let dataset = two_path_dataset();
        let all = AggregatedPaths::aggregate(&dataset, TouchFilter::All);
        let single = AggregatedPaths::aggregate(&dataset, TouchFilter::SingleTouch);
        let multi = AggregatedPaths::aggregate(&dataset, TouchFilter::MultiTouch);

        assert_eq!(
            all.total_weight(),
            single.total_weight() + multi.total_weight()
        );
        assert_eq!(all.len(), single.len() + multi.len());
    }

    #[test]
    fn test_channels_sorted() {
        let agg = AggregatedPaths::aggregate(&two_path_dataset(), TouchFilter::All);
        assert_eq!(agg.channels(), vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_distinct_channels_dedups_repeats() {
        let path = AggregatedPath {
            path: vec!["A".into(), "B".into(), "A".into()],
            converters: 1,
            nonconverters: 0,
        };
        assert_eq!(path.distinct_channels(), vec!["A", "B"]);
    }

    #[test]
    fn test_group_by_first_touch() {
        let agg = AggregatedPaths::aggregate(&two_path_dataset(), TouchFilter::All);
        let rows = group_by(&agg, TouchKey::First);

        let a = rows.iter().find(|r| r.key == "A").unwrap();
        assert_eq!(a.paths, 2);
        assert_eq!(a.conversions, 7);
        assert_eq!(a.non_conversions, 13);
        assert_eq!(a.conversion_pct, 35.0);
        assert_eq!(a.non_conversion_pct, 65.0);

        let b = rows.iter().find(|r| r.key == "B").unwrap();
        assert_eq!(b.conversions, 3);
    }

    #[test]
    fn test_group_by_last_touch() {
        let agg = AggregatedPaths::aggregate(&two_path_dataset(), TouchFilter::All);
        let rows = group_by(&agg, TouchKey::Last);

        let a = rows.iter().find(|r| r.key == "A").unwrap();
        assert_eq!(a.conversions, 5);
        let b = rows.iter().find(|r| r.key == "B").unwrap();
        assert_eq!(b.conversions, 5);
    }

    #[test]
    fn test_group_by_full_path_key() {
        let agg = AggregatedPaths::aggregate(&two_path_dataset(), TouchFilter::All);
        let rows = group_by(&agg, TouchKey::FullPath);
        assert!(rows.iter().any(|r| r.key == "A > B"));
        assert!(rows.iter().any(|r| r.key == "B > A"));
    }

    #[test]
    fn test_dataset_summary() {
        let summary = DatasetSummary::compute(&two_path_dataset(), TouchFilter::All);
        assert_eq!(summary.total_journeys, 30);
        assert_eq!(summary.converters, 10);
        assert_eq!(summary.nonconverters, 20);
        assert_eq!(summary.conversion_rate, 33.333);
        assert_eq!(summary.promotion, None);
    }

    #[test]
    fn test_dataset_summary_flag_sums() {
        let mut j1 = journey(&["A"], 1, 1);
        j1.promotion = Some(3);
        j1.web = Some(1);
        let mut j2 = journey(&["B"], 1, 1);
        j2.promotion = Some(2);
        let summary = DatasetSummary::compute(&Dataset::new(vec![j1, j2]), TouchFilter::All);

        assert_eq!(summary.promotion, Some(5));
        assert_eq!(summary.web, Some(1));
        assert_eq!(summary.phone, None);
    }

    #[test]
    fn test_empty_filter_yields_empty_views() {
        let dataset = Dataset::new(vec![journey(&["A", "B"], 5, 5)]);
        let agg = AggregatedPaths::aggregate(&dataset, TouchFilter::SingleTouch);

        assert!(agg.is_empty());
        assert_eq!(agg.total_weight(), 0);
        assert!(group_by(&agg, TouchKey::First).is_empty());
        assert_eq!(PathLengthHistogram::compute(&agg), PathLengthHistogram::default());
    }

    #[test]
    fn test_path_length_histogram() {
        let agg = AggregatedPaths::aggregate(&two_path_dataset(), TouchFilter::All);
        let histogram = PathLengthHistogram::compute(&agg);

        assert_eq!(histogram.buckets.len(), 2);
        assert_eq!(histogram.buckets[0].touches, 1);
        assert_eq!(histogram.buckets[0].distinct_paths, 1);
        assert_eq!(histogram.buckets[0].journeys, 10);
        assert_eq!(histogram.buckets[1].touches, 2);
        assert_eq!(histogram.buckets[1].journeys, 20);

        // 10 journeys of length 1, 20 of length 2
        assert!((histogram.mean_touches - 5.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let dataset = two_path_dataset();
        let a = AggregatedPaths::aggregate(&dataset, TouchFilter::All);
        let b = AggregatedPaths::aggregate(&dataset, TouchFilter::All);
        let order_a: Vec<_> = a.iter().map(|p| p.path.clone()).collect();
        let order_b: Vec<_> = b.iter().map(|p| p.path.clone()).collect();
        assert_eq!(order_a, order_b);
    }
}
