//! Heuristic credit-assignment models
//!
//! First-touch, last-touch, and linear-touch attribution. Only
//! conversions are attributed; non-conversions feed rate denominators
//! elsewhere, never these tables. Each model's channel sum equals the
//! filtered dataset's total conversions (linear within floating-point
//! tolerance).

use crate::aggregator::AggregatedPaths;
use std::collections::BTreeMap;

/// Per-channel credit under the three heuristic models, in units of
/// attributed conversions
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeuristicScores {
    pub first_touch: f64,
    pub last_touch: f64,
    pub linear_touch: f64,
}

/// Heuristic attribution for one (dataset, filter) pair
///
/// Channels are keyed by label, so iteration order is deterministic.
#[derive(Debug, Clone, Default)]
pub struct HeuristicAttribution {
    scores: BTreeMap<String, HeuristicScores>,
}

impl HeuristicAttribution {
    pub fn get(&self, channel: &str) -> Option<&HeuristicScores> {
        self.scores.get(channel)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &HeuristicScores)> {
        self.scores.iter()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn total_first_touch(&self) -> f64 {
        self.scores.values().map(|s| s.first_touch).sum()
    }

    pub fn total_last_touch(&self) -> f64 {
        self.scores.values().map(|s| s.last_touch).sum()
    }

    pub fn total_linear_touch(&self) -> f64 {
        self.scores.values().map(|s| s.linear_touch).sum()
    }
}

/// Compute first-, last-, and linear-touch credit per channel
///
/// Linear credit is split per *distinct* channel in the path —
/// repeats within one journey count once — so the linear column sums
/// to total conversions exactly rather than drifting when channels
/// repeat.
pub fn attribute(agg: &AggregatedPaths) -> HeuristicAttribution {
    let mut scores: BTreeMap<String, HeuristicScores> = BTreeMap::new();

    for path in agg.iter() {
        let conversions = path.converters as f64;
        if path.converters == 0 {
            continue;
        }

        scores
            .entry(path.first().to_string())
            .or_default()
            .first_touch += conversions;
        scores
            .entry(path.last().to_string())
            .or_default()
            .last_touch += conversions;

        let distinct = path.distinct_channels();
        let share = conversions / distinct.len() as f64;
        for channel in distinct {
            scores.entry(channel.to_string()).or_default().linear_touch += share;
        }
    }

    HeuristicAttribution { scores }
}
