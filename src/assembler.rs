//! Final report assembly
//!
//! Merges the heuristic and Markov scores into one per-channel table
//! and derives the display-oriented views: the ascending
//! removal-effect table and the Sankey-ready (first, last) edge list.
//! The merge is an outer join with zero-fill — a channel present on
//! only one side keeps its scores and shows 0.0 for the other, so the
//! report never silently loses a channel.

use crate::aggregator::{
    AggregatedPaths, DatasetSummary, GroupedRow, PathLengthHistogram, TouchFilter,
};
use crate::heuristics::HeuristicAttribution;
use crate::markov::{RemovalAnalysis, RemovalEffect, TransitionMatrix};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// One row of the final attribution table, in units of attributed
/// conversions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelAttribution {
    pub channel: String,
    pub first_touch: f64,
    pub last_touch: f64,
    pub linear_touch: f64,
    pub markov_model: f64,
}

/// One first-touch→last-touch flow for Sankey rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SankeyEdge {
    pub first_touch: String,
    pub last_touch: String,
    pub conversions: u64,
    pub non_conversions: u64,
    pub total: u64,
}

/// Complete engine output for one (dataset, filter) pair
#[derive(Debug, Clone, Serialize)]
pub struct AttributionReport {
    pub filter: TouchFilter,
    pub total_conversions: u64,
    pub summary: DatasetSummary,
    pub channels: Vec<ChannelAttribution>,
    /// Baseline conversion probability of the intact chain
    pub baseline_conversion_probability: f64,
    /// Sorted ascending by effect for display
    pub removal_effects: Vec<RemovalEffect>,
    pub transition_matrix: TransitionMatrix,
    pub sankey: Vec<SankeyEdge>,
    pub first_touch_summary: Vec<GroupedRow>,
    pub last_touch_summary: Vec<GroupedRow>,
    pub path_lengths: PathLengthHistogram,
}

impl AttributionReport {
    /// True when the filter selected no journeys
    pub fn is_empty(&self) -> bool {
        self.summary.total_journeys == 0
    }
}

/// Outer-join heuristic and Markov scores on channel identity
///
/// Channels missing from either side get 0.0 for that side's columns
/// rather than being dropped, keeping column totals honest.
pub fn join_scores(
    heuristics: &HeuristicAttribution,
    markov: &BTreeMap<String, f64>,
) -> Vec<ChannelAttribution> {
    let channels: BTreeSet<&String> = heuristics
        .iter()
        .map(|(channel, _)| channel)
        .chain(markov.keys())
        .collect();

    channels
        .into_iter()
        .map(|channel| {
            let scores = heuristics.get(channel).copied().unwrap_or_default();
            ChannelAttribution {
                channel: channel.clone(),
                first_touch: scores.first_touch,
                last_touch: scores.last_touch,
                linear_touch: scores.linear_touch,
                markov_model: markov.get(channel).copied().unwrap_or(0.0),
            }
        })
        .collect()
}

/// Removal effects sorted ascending by effect (ties by channel label)
pub fn sorted_removal_effects(analysis: &RemovalAnalysis) -> Vec<RemovalEffect> {
    let mut effects = analysis.effects.clone();
    effects.sort_by(|a, b| {
        a.effect
            .total_cmp(&b.effect)
            .then_with(|| a.channel.cmp(&b.channel))
    });
    effects
}

/// Group aggregated paths by (first touch, last touch) into Sankey
/// edges, sorted by the pair
pub fn sankey_edges(agg: &AggregatedPaths) -> Vec<SankeyEdge> {
    let mut grouped: BTreeMap<(String, String), (u64, u64)> = BTreeMap::new();
    for path in agg.iter() {
        let entry = grouped
            .entry((path.first().to_string(), path.last().to_string()))
            .or_insert((0, 0));
        entry.0 += path.converters;
        entry.1 += path.nonconverters;
    }

    grouped
        .into_iter()
        .map(|((first, last), (conversions, non_conversions))| SankeyEdge {
            first_touch: first,
            last_touch: last,
            conversions,
            non_conversions,
            total: conversions + non_conversions,
        })
        .collect()
}
