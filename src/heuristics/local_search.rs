//! Local search improvement heuristics.
//!
//! - 2-opt with first- or best-improvement scanning
//! - the nearest neighbor + 2-opt pipeline

use crate::error::Result;
use crate::heuristics::construction::NearestNeighborHeuristic;
use crate::instance::DistanceMatrix;
use crate::solution::{tour_length, validate_tour, Solution, SolveStatus, TspSolver};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// A move is applied only if it shortens the tour by more than this fraction of
/// the length of the two edges it removes
pub const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Trait for local search improvement methods
pub trait LocalSearch {
    /// Improve `solution` in place. Returns whether its cost decreased.
    fn improve(&self, matrix: &DistanceMatrix, solution: &mut Solution) -> Result<bool>;
    fn name(&self) -> &str;
}

/// Which improving move a 2-opt scan applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImprovementStrategy {
    /// Apply the first improving move found, then restart the scan
    FirstImprovement,
    /// Scan every pair, then apply the best move
    BestImprovement,
}

/// 2-Opt Local Search
///
/// Removes two non-adjacent edges `(t[i], t[i+1])` and `(t[j], t[j+1])` and
/// reconnects the tour by reversing `t[i+1..=j]`. Stops at a 2-opt local
/// optimum or after `max_iterations` scans. City at position 0 never moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoOptSearch {
    pub strategy: ImprovementStrategy,
    /// Maximum number of full scans
    pub max_iterations: usize,
}

impl TwoOptSearch {
    pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

    pub fn new() -> Self {
        Self::first_improvement()
    }

    pub fn first_improvement() -> Self {
        TwoOptSearch {
            strategy: ImprovementStrategy::FirstImprovement,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn best_improvement() -> Self {
        TwoOptSearch {
            strategy: ImprovementStrategy::BestImprovement,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// One scan over all non-adjacent edge pairs. Returns the move to apply, if any.
    fn scan(&self, matrix: &DistanceMatrix, solution: &Solution) -> Option<(usize, usize)> {
        let n = solution.tour.len();
        let tour = &solution.tour;
        let mut best_delta = 0.0;
        let mut best_move = None;

        for i in 0..n - 2 {
            for j in i + 2..n {
                if i == 0 && j == n - 1 {
                    continue; // these two edges share city t[0]
                }

                let removed =
                    matrix.distance(tour[i], tour[i + 1]) + matrix.distance(tour[j], tour[(j + 1) % n]);
                let delta = solution.two_opt_delta(matrix, i, j);
                if delta < -IMPROVEMENT_EPSILON * removed && delta < best_delta {
                    if self.strategy == ImprovementStrategy::FirstImprovement {
                        return Some((i, j));
                    }
                    best_delta = delta;
                    best_move = Some((i, j));
                }
            }
        }

        best_move
    }

    /// Validate `tour` and improve it
    pub fn optimize(&self, matrix: &DistanceMatrix, tour: &[usize]) -> Result<Solution> {
        let start = Instant::now();
        let mut solution =
            Solution::from_tour(matrix, tour.to_vec(), self.name(), SolveStatus::Heuristic)?;
        self.improve(matrix, &mut solution)?;
        solution.computation_time = start.elapsed().as_secs_f64();
        Ok(solution)
    }
}

impl Default for TwoOptSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSearch for TwoOptSearch {
    fn improve(&self, matrix: &DistanceMatrix, solution: &mut Solution) -> Result<bool> {
        validate_tour(&solution.tour, matrix)?;
        let initial_tour = solution.tour.clone();
        let initial_cost = tour_length(&initial_tour, matrix)?;
        let n = solution.tour.len();

        let mut scans = 0;
        let mut converged = n < 4;

        while !converged && scans < self.max_iterations {
            scans += 1;
            match self.scan(matrix, solution) {
                Some((i, j)) => solution.apply_two_opt(i, j),
                None => converged = true,
            }
        }

        solution.validate(matrix)?;
        if solution.cost > initial_cost {
            solution.tour = initial_tour;
            solution.cost = initial_cost;
        }

        solution.iterations = Some(scans as u64);
        solution.status = if converged {
            SolveStatus::LocalOptimum
        } else {
            log::warn!(
                "2-opt stopped after {} scans without reaching a local optimum",
                self.max_iterations
            );
            SolveStatus::IterationCapReached
        };

        log::debug!("2-opt: {:.4} -> {:.4} in {} scans", initial_cost, solution.cost, scans);
        Ok(solution.cost < initial_cost)
    }

    fn name(&self) -> &str {
        match self.strategy {
            ImprovementStrategy::FirstImprovement => "2-Opt-FI",
            ImprovementStrategy::BestImprovement => "2-Opt-BI",
        }
    }
}

/// Two-stage pipeline: nearest neighbor construction followed by 2-opt
#[derive(Debug, Clone, Default)]
pub struct NearestNeighborTwoOpt {
    pub construction: NearestNeighborHeuristic,
    pub search: TwoOptSearch,
}

impl NearestNeighborTwoOpt {
    pub fn new(construction: NearestNeighborHeuristic, search: TwoOptSearch) -> Self {
        NearestNeighborTwoOpt { construction, search }
    }
}

impl TspSolver for NearestNeighborTwoOpt {
    fn solve(&self, matrix: &DistanceMatrix) -> Result<Solution> {
        let start = Instant::now();
        let mut solution = self.construction.solve(matrix)?;
        self.search.improve(matrix, &mut solution)?;
        solution.algorithm = format!("{}+{}", self.construction.name(), self.search.name());
        solution.computation_time = start.elapsed().as_secs_f64();
        Ok(solution)
    }

    fn name(&self) -> &str {
        "NearestNeighbor+2-Opt"
    }
}
