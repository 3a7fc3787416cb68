// Markov-chain attribution: transition graph, absorbing-chain solve,
// removal effects
//
// The journey multiset becomes a first-order Markov chain over
// {START, channels, CONVERSION, NULL}. A channel's causal credit is
// its removal effect: how much the chain's absorption probability at
// CONVERSION drops when every edge into that channel is redirected to
// NULL. Effects are normalized so the per-channel scores sum to the
// dataset's total conversions.
//
// Scientific Foundation:
// - Kemeny, J. G., & Snell, J. L. (1976). Finite Markov Chains.
//   Absorption probabilities of an absorbing chain via the
//   fundamental matrix N = (I - Q)^-1, read here as one linear solve
//   per chain.
// - Anderl, E., Becker, I., von Wangenheim, F., & Schumann, J. H.
//   (2016). Mapping the customer journey. IJRM. Removal effects as
//   channel contribution in graph-based attribution.

mod graph;
mod matrix;
mod removal;

pub use graph::{TransitionGraph, CONVERSION_LABEL, NULL_LABEL};
pub use matrix::TransitionMatrix;
pub use removal::{compute_removal_effects, markov_attribution, ModelError, RemovalAnalysis, RemovalEffect};

#[cfg(test)]
mod tests;
