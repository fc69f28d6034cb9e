//! Heuristics module.
//!
//! This module exports the construction, local search and annealing heuristics.

pub mod annealing;
pub mod construction;
pub mod local_search;

pub use annealing::*;
pub use construction::*;
pub use local_search::*;
