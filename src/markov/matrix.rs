// Diagnostic view of the first-order transition probabilities

use super::graph::{TransitionGraph, CONVERSION_LABEL, NULL_LABEL};
use serde::Serialize;

/// Square transition-probability matrix over
/// {channels, CONVERSION, NULL}
///
/// A read-only view over the [`TransitionGraph`]: no independent
/// computation happens here. Rows for the absorbing states are
/// all-zero; channel rows are the same distributions used by the
/// removal-effect solve.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransitionMatrix {
    /// Row and column labels: channels in sorted order, then
    /// `(conversion)` and `(null)`
    pub labels: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl TransitionMatrix {
    /// Extract the diagnostic matrix from a transition graph
    pub fn from_graph(graph: &TransitionGraph) -> Self {
        let k = graph.channel_count();
        let mut labels: Vec<String> = graph.channels().to_vec();
        labels.push(CONVERSION_LABEL.to_string());
        labels.push(NULL_LABEL.to_string());

        let probabilities = graph.probabilities();
        let mut rows = Vec::with_capacity(k + 2);
        for i in 0..k {
            // Drop the START column: journeys never return to START
            rows.push(probabilities[graph.channel_state(i)][1..].to_vec());
        }
        rows.push(vec![0.0; k + 2]);
        rows.push(vec![0.0; k + 2]);

        Self { labels, rows }
    }

    pub fn size(&self) -> usize {
        self.labels.len()
    }

    /// Probability row for one label, if present
    pub fn row(&self, label: &str) -> Option<&[f64]> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.rows[i].as_slice())
    }
}
