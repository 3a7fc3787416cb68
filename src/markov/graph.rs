// Weighted transition graph over {START, channels, CONVERSION, NULL}

use crate::aggregator::AggregatedPaths;

/// Display label for the conversion absorbing state
pub const CONVERSION_LABEL: &str = "(conversion)";
/// Display label for the null (no conversion) absorbing state
pub const NULL_LABEL: &str = "(null)";

/// First-order transition graph built from aggregated journeys
///
/// States are densely indexed: `0` is START, `1..=k` are the channels
/// in sorted label order, `k+1` is CONVERSION and `k+2` is NULL. Edge
/// weights accumulate journey counts; multiple paths sharing a
/// consecutive pair contribute additively, and consecutive repeats of
/// a channel stay as ordinary self-loop edges.
#[derive(Debug, Clone)]
pub struct TransitionGraph {
    channels: Vec<String>,
    /// Dense (k+3)×(k+3) weight matrix; absorbing rows stay zero
    weights: Vec<Vec<f64>>,
    total_conversions: u64,
}

impl TransitionGraph {
    /// Build the graph from the aggregated path multiset
    ///
    /// For each path `[c1..cn]` with weights `(conv, nonconv)`:
    /// START→c1 and every ci→ci+1 get `conv + nonconv`; cn→CONVERSION
    /// gets `conv` and cn→NULL gets `nonconv`.
    pub fn build(agg: &AggregatedPaths) -> Self {
        let channels = agg.channels();
        let k = channels.len();
        let states = k + 3;
        let mut weights = vec![vec![0.0; states]; states];

        {
            let index: std::collections::HashMap<&str, usize> = channels
                .iter()
                .enumerate()
                .map(|(i, label)| (label.as_str(), i + 1))
                .collect();

            for path in agg.iter() {
                let weight = path.weight() as f64;

                let first = index[path.first()];
                weights[0][first] += weight;

                for pair in path.path.windows(2) {
                    let from = index[pair[0].as_str()];
                    let to = index[pair[1].as_str()];
                    weights[from][to] += weight;
                }

                let last = index[path.last()];
                weights[last][k + 1] += path.converters as f64;
                weights[last][k + 2] += path.nonconverters as f64;
            }
        }

        Self {
            channels,
            weights,
            total_conversions: agg.total_conversions(),
        }
    }

    /// Channel labels in state order (state `i + 1` is `channels()[i]`)
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of states including START and the two absorbing states
    pub fn num_states(&self) -> usize {
        self.channels.len() + 3
    }

    pub fn start_state(&self) -> usize {
        0
    }

    /// State index of the i-th channel (sorted order)
    pub fn channel_state(&self, i: usize) -> usize {
        i + 1
    }

    pub fn conversion_state(&self) -> usize {
        self.channels.len() + 1
    }

    pub fn null_state(&self) -> usize {
        self.channels.len() + 2
    }

    /// True for CONVERSION and NULL
    pub fn is_absorbing(&self, state: usize) -> bool {
        state >= self.conversion_state()
    }

    /// Raw edge weight between two states
    pub fn weight(&self, from: usize, to: usize) -> f64 {
        self.weights[from][to]
    }

    /// Total outgoing weight of a state (its traffic)
    pub fn out_weight(&self, state: usize) -> f64 {
        self.weights[state].iter().sum()
    }

    /// Total incoming weight of a state
    pub fn in_weight(&self, state: usize) -> f64 {
        self.weights.iter().map(|row| row[state]).sum()
    }

    /// Total conversions across the aggregated journeys
    pub fn total_conversions(&self) -> u64 {
        self.total_conversions
    }

    /// Row-normalized transition probabilities
    ///
    /// P(u→v) = weight(u→v) / Σ_v' weight(u→v'). Rows without traffic
    /// (and the absorbing rows) are all-zero.
    pub fn probabilities(&self) -> Vec<Vec<f64>> {
        self.weights
            .iter()
            .map(|row| {
                let out: f64 = row.iter().sum();
                if out > 0.0 {
                    row.iter().map(|w| w / out).collect()
                } else {
                    vec![0.0; row.len()]
                }
            })
            .collect()
    }
}
