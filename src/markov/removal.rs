// Absorbing-chain solve and per-channel removal effects
//
// The solve is deliberately explicit: partition the transition matrix
// into transient/absorbing blocks and solve (I - Q) x = r by Gaussian
// elimination with partial pivoting, where r is the one-step
// probability of reaching CONVERSION from each transient state. x at
// START is the chain's conversion probability. Removing a channel
// redirects every edge into it to NULL and re-solves; the relative
// drop in conversion probability is the channel's effect.

use super::graph::TransitionGraph;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Pivots below this are treated as a singular system
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Effects below this are rounding noise from the two solves and are
/// snapped to exactly zero, so an untouched channel reports 0, not
/// 1e-17
const EFFECT_TOLERANCE: f64 = 1e-9;

/// Errors for the absorbing-chain solve
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("transition chain is degenerate: no conversion path from start")]
    DegenerateChain,

    #[error("linear system is singular (pivot {pivot:.3e} below tolerance)")]
    SingularSystem { pivot: f64 },
}

/// Removal effect for one channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemovalEffect {
    pub channel: String,
    /// Conversion probability of the intact chain
    pub baseline: f64,
    /// Conversion probability with this channel excised
    pub removed: f64,
    /// `max(0, (baseline - removed) / baseline)`
    pub effect: f64,
}

/// Removal effects for every channel of one transition graph
#[derive(Debug, Clone, Default)]
pub struct RemovalAnalysis {
    /// Baseline conversion probability from START
    pub baseline: f64,
    /// One entry per channel, in the graph's sorted channel order
    pub effects: Vec<RemovalEffect>,
    /// True when the chain had no usable conversion path and every
    /// effect was reported as zero
    pub degenerate: bool,
}

impl RemovalAnalysis {
    pub fn total_effect(&self) -> f64 {
        self.effects.iter().map(|e| e.effect).sum()
    }
}

/// Compute the baseline conversion probability and every channel's
/// removal effect
///
/// Per-channel solves are independent given the baseline, so they fan
/// out in parallel; results are collected in channel order, keeping
/// the output deterministic. A degenerate chain (zero baseline, or a
/// singular system) is recovered as all-zero effects with a warning,
/// never a crash.
pub fn compute_removal_effects(graph: &TransitionGraph) -> RemovalAnalysis {
    if graph.channel_count() == 0 {
        return RemovalAnalysis::default();
    }

    let probabilities = graph.probabilities();
    let baseline = conversion_probability(&probabilities, graph).and_then(|p| {
        if p > 0.0 {
            Ok(p)
        } else {
            Err(ModelError::DegenerateChain)
        }
    });
    let baseline = match baseline {
        Ok(p) => p,
        Err(err) => {
            tracing::warn!(%err, "removal effects reported as zero");
            return degenerate_analysis(graph, 0.0);
        }
    };

    let effects: Vec<RemovalEffect> = (0..graph.channel_count())
        .into_par_iter()
        .map(|i| {
            let removed_probs = without_channel(&probabilities, graph, i);
            let removed = match conversion_probability(&removed_probs, graph) {
                Ok(p) => p,
                Err(err) => {
                    tracing::warn!(channel = %graph.channels()[i], %err,
                        "removal solve failed; reporting zero effect");
                    baseline
                }
            };
            let mut effect = ((baseline - removed) / baseline).max(0.0);
            if effect < EFFECT_TOLERANCE {
                effect = 0.0;
            }
            RemovalEffect {
                channel: graph.channels()[i].clone(),
                baseline,
                removed,
                effect,
            }
        })
        .collect();

    RemovalAnalysis {
        baseline,
        effects,
        degenerate: false,
    }
}

/// Normalize removal effects into attributed conversions
///
/// `markov_model(c) = effect(c) / Σ effects × total_conversions`, so
/// the scores sum to the dataset's total conversions. Channels with
/// zero effect contribute zero; a zero effect sum yields all-zero
/// scores rather than dividing by zero.
pub fn markov_attribution(
    analysis: &RemovalAnalysis,
    total_conversions: u64,
) -> BTreeMap<String, f64> {
    let total_effect = analysis.total_effect();
    if total_effect <= 0.0 {
        if !analysis.effects.is_empty() {
            tracing::warn!("all removal effects are zero; markov scores set to zero");
        }
        return analysis
            .effects
            .iter()
            .map(|e| (e.channel.clone(), 0.0))
            .collect();
    }

    analysis
        .effects
        .iter()
        .map(|e| {
            (
                e.channel.clone(),
                e.effect / total_effect * total_conversions as f64,
            )
        })
        .collect()
}

fn degenerate_analysis(graph: &TransitionGraph, baseline: f64) -> RemovalAnalysis {
    RemovalAnalysis {
        baseline,
        effects: graph
            .channels()
            .iter()
            .map(|channel| RemovalEffect {
                channel: channel.clone(),
                baseline,
                removed: baseline,
                effect: 0.0,
            })
            .collect(),
        degenerate: true,
    }
}

/// Probability of absorption at CONVERSION starting from START
///
/// Transient states are START plus the channels. Solves
/// `(I - Q) x = r` with `r_i = P(i → CONVERSION)`; a transient state
/// with no outgoing probability mass simply resolves to `x_i = 0`.
fn conversion_probability(
    probabilities: &[Vec<f64>],
    graph: &TransitionGraph,
) -> Result<f64, ModelError> {
    let transient = graph.channel_count() + 1;
    let conversion = graph.conversion_state();

    // A = I - Q over the transient block, augmented with r
    let mut a = vec![vec![0.0; transient + 1]; transient];
    for i in 0..transient {
        for j in 0..transient {
            let q = probabilities[i][j];
            a[i][j] = if i == j { 1.0 - q } else { -q };
        }
        a[i][transient] = probabilities[i][conversion];
    }

    gaussian_solve(&mut a).map(|x| x[graph.start_state()])
}

/// Solve the augmented system in place by Gaussian elimination with
/// partial pivoting
fn gaussian_solve(a: &mut [Vec<f64>]) -> Result<Vec<f64>, ModelError> {
    let n = a.len();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&x, &y| a[x][col].abs().total_cmp(&a[y][col].abs()))
            .unwrap_or(col);
        let pivot = a[pivot_row][col];
        if pivot.abs() < PIVOT_TOLERANCE {
            return Err(ModelError::SingularSystem { pivot: pivot.abs() });
        }
        a.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..=n {
                a[row][k] -= factor * a[col][k];
            }
        }
    }

    // Back substitution
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut sum = a[row][n];
        for col in (row + 1)..n {
            sum -= a[row][col] * x[col];
        }
        x[row] = sum / a[row][row];
    }
    Ok(x)
}

/// Transition probabilities with one channel excised
///
/// Every edge into the channel is redirected to NULL and the
/// channel's outgoing row is cleared, leaving it unreachable.
fn without_channel(
    probabilities: &[Vec<f64>],
    graph: &TransitionGraph,
    channel: usize,
) -> Vec<Vec<f64>> {
    let state = graph.channel_state(channel);
    let null = graph.null_state();

    let mut modified = probabilities.to_vec();
    for (row, probs) in modified.iter_mut().enumerate() {
        if row == state {
            probs.fill(0.0);
        } else {
            probs[null] += probs[state];
            probs[state] = 0.0;
        }
    }
    modified
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{AggregatedPaths, Dataset, ParsedJourney, TouchFilter};

    fn graph(rows: &[(&[&str], u64, u64)]) -> TransitionGraph {
        let journeys = rows
            .iter()
            .map(|(path, conv, nonconv)| ParsedJourney {
                path: path.iter().map(|s| s.to_string()).collect(),
                converters: *conv,
                nonconverters: *nonconv,
                promotion: None,
                web: None,
                phone: None,
            })
            .collect();
        TransitionGraph::build(&AggregatedPaths::aggregate(
            &Dataset::new(journeys),
            TouchFilter::All,
        ))
    }

    #[test]
    fn test_baseline_single_channel() {
        // START→A, A→CONVERSION 0.6 / A→NULL 0.4
        let analysis = compute_removal_effects(&graph(&[(&["A"], 6, 4)]));
        assert!((analysis.baseline - 0.6).abs() < 1e-12);
        assert!(!analysis.degenerate);
    }

    #[test]
    fn test_removal_of_only_channel_zeroes_conversion() {
        let analysis = compute_removal_effects(&graph(&[(&["A"], 6, 4)]));
        let a = &analysis.effects[0];
        assert_eq!(a.removed, 0.0);
        assert_eq!(a.effect, 1.0);
    }

    #[test]
    fn test_two_channel_scenario() {
        let analysis = compute_removal_effects(&graph(&[(&["A", "B"], 5, 5), (&["B", "A"], 3, 7)]));

        // Overall 8 conversions out of 20 journeys; chain baseline
        // reflects the path-weighted mix
        assert!(analysis.baseline > 0.0);
        assert!(!analysis.degenerate);
        assert_eq!(analysis.effects.len(), 2);
        for effect in &analysis.effects {
            assert!(effect.effect >= 0.0);
            assert!(effect.removed <= effect.baseline + 1e-12);
        }
    }

    #[test]
    fn test_effects_in_sorted_channel_order() {
        let analysis = compute_removal_effects(&graph(&[(&["B", "A"], 3, 7), (&["A", "B"], 5, 5)]));
        let order: Vec<&str> = analysis.effects.iter().map(|e| e.channel.as_str()).collect();
        assert_eq!(order, vec!["A", "B"]);
    }

    #[test]
    fn test_degenerate_chain_all_nonconverters() {
        let analysis = compute_removal_effects(&graph(&[(&["A", "B"], 0, 10)]));

        assert!(analysis.degenerate);
        assert_eq!(analysis.baseline, 0.0);
        assert!(analysis.effects.iter().all(|e| e.effect == 0.0));
    }

    #[test]
    fn test_cycle_does_not_break_solve() {
        // A→B→A cycle with eventual absorption
        let analysis = compute_removal_effects(&graph(&[
            (&["A", "B", "A"], 4, 6),
            (&["B", "A", "B"], 3, 7),
        ]));
        assert!(analysis.baseline > 0.0);
        assert!(analysis.effects.iter().all(|e| e.effect.is_finite()));
    }

    #[test]
    fn test_self_loop_does_not_break_solve() {
        let analysis = compute_removal_effects(&graph(&[(&["A", "A", "B"], 5, 5)]));
        assert!(analysis.baseline > 0.0);
    }

    #[test]
    fn test_markov_attribution_sums_to_total_conversions() {
        let g = graph(&[(&["A", "B"], 5, 5), (&["B", "A"], 3, 7)]);
        let analysis = compute_removal_effects(&g);
        let scores = markov_attribution(&analysis, g.total_conversions());

        let sum: f64 = scores.values().sum();
        assert!((sum - 8.0).abs() < 1e-6, "markov scores sum to {}", sum);
        assert!(scores.values().all(|&s| s >= 0.0));
    }

    #[test]
    fn test_markov_attribution_degenerate_is_all_zero() {
        let g = graph(&[(&["A"], 0, 10)]);
        let analysis = compute_removal_effects(&g);
        let scores = markov_attribution(&analysis, g.total_conversions());

        assert_eq!(scores.len(), 1);
        assert_eq!(scores["A"], 0.0);
    }

    #[test]
    fn test_channel_off_converting_paths_has_zero_effect() {
        // C only appears on a never-converting path; removing it
        // cannot change the conversion probability
        let analysis = compute_removal_effects(&graph(&[(&["A"], 5, 5), (&["C"], 0, 10)]));
        let c = analysis.effects.iter().find(|e| e.channel == "C").unwrap();
        assert_eq!(c.effect, 0.0);
    }

    #[test]
    fn test_empty_graph() {
        let analysis = compute_removal_effects(&graph(&[]));
        assert!(analysis.effects.is_empty());
        assert_eq!(analysis.total_effect(), 0.0);
        assert!(markov_attribution(&analysis, 0).is_empty());
    }

    #[test]
    fn test_gaussian_solve_known_system() {
        // 2x + y = 5, x + 3y = 10 → x = 1, y = 3
        let mut a = vec![vec![2.0, 1.0, 5.0], vec![1.0, 3.0, 10.0]];
        let x = gaussian_solve(&mut a).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_gaussian_solve_singular_system() {
        let mut a = vec![vec![1.0, 1.0, 2.0], vec![1.0, 1.0, 3.0]];
        assert!(matches!(
            gaussian_solve(&mut a),
            Err(ModelError::SingularSystem { .. })
        ));
    }

    #[test]
    fn test_baseline_matches_fundamental_matrix_hand_calc() {
        // Single path A→B, 5 conv / 5 nonconv:
        // START→A (1.0), A→B (1.0), B→CONV (0.5), B→NULL (0.5)
        let analysis = compute_removal_effects(&graph(&[(&["A", "B"], 5, 5)]));
        assert!((analysis.baseline - 0.5).abs() < 1e-12);

        // Removing A makes START feed NULL directly
        let a = analysis.effects.iter().find(|e| e.channel == "A").unwrap();
        assert!((a.removed - 0.0).abs() < 1e-12);
        assert!((a.effect - 1.0).abs() < 1e-12);
    }
}
