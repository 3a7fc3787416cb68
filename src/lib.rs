//! Atribuir - Pure Rust multi-touch attribution engine
//!
//! This library computes per-channel attribution scores from a batch
//! of encoded customer journeys: the first-/last-/linear-touch
//! heuristics plus a Markov-chain model that credits each channel by
//! its removal effect on the chain's conversion probability.

pub mod aggregator;
pub mod assembler;
pub mod channel_map;
pub mod cli;
pub mod csv_output;
pub mod heuristics;
pub mod ingest;
pub mod json_output;
pub mod markov;
pub mod path_parser;
pub mod pipeline;
pub mod text_output;
