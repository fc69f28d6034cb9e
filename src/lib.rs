//! TSP Solver Library
//!
//! Exact, heuristic and metaheuristic solvers for the symmetric Traveling
//! Salesman Problem, sharing one distance model and one tour evaluator.
//!
//! # Features
//!
//! - Exact solvers: exhaustive enumeration (n ≤ ~10) and Held-Karp dynamic programming (n ≤ ~20)
//! - Nearest Neighbor construction (deterministic, randomized, multi-start)
//! - 2-opt local search (first or best improvement)
//! - Simulated Annealing with an injectable, seedable generator
//! - Comparison harness with ranking, statistics and CSV export
//!
//! # Example
//!
//! ```
//! use tsp_solver::instance::{DistanceMatrix, Point};
//!
//! let points = vec![
//!     Point::new(0.0, 0.0),
//!     Point::new(0.0, 1.0),
//!     Point::new(1.0, 1.0),
//!     Point::new(1.0, 0.0),
//! ];
//! let matrix = DistanceMatrix::from_points(&points).unwrap();
//!
//! let greedy = tsp_solver::solve_nearest_neighbor(&matrix, 0).unwrap();
//! let improved = tsp_solver::improve_two_opt(&matrix, &greedy.tour, 1000).unwrap();
//! let optimal = tsp_solver::solve_held_karp(&matrix).unwrap();
//!
//! assert!(improved.cost <= greedy.cost);
//! assert_eq!(optimal.cost, 4.0);
//! ```

pub mod benchmark;
pub mod error;
pub mod exact;
pub mod heuristics;
pub mod instance;
pub mod solution;

pub use error::{Result, TspError};
pub use instance::{DistanceMatrix, Instance, Point};
pub use solution::{tour_length, Solution, SolveStatus, TspSolver};

use exact::{BruteForceSolver, HeldKarpSolver};
use heuristics::{NearestNeighborHeuristic, SimulatedAnnealing, TwoOptSearch};

/// Optimal tour by enumerating every permutation with city 0 fixed. O(n!).
pub fn solve_exact_enumeration(matrix: &DistanceMatrix) -> Result<Solution> {
    BruteForceSolver::new().solve(matrix)
}

/// Optimal tour by Held-Karp dynamic programming. O(n² · 2ⁿ).
pub fn solve_held_karp(matrix: &DistanceMatrix) -> Result<Solution> {
    HeldKarpSolver::new().solve(matrix)
}

/// Greedy nearest neighbor tour starting at `start_city`
pub fn solve_nearest_neighbor(matrix: &DistanceMatrix, start_city: usize) -> Result<Solution> {
    NearestNeighborHeuristic::from_city(start_city).solve(matrix)
}

/// First-improvement 2-opt from `initial_tour`, capped at `max_iterations` scans
pub fn improve_two_opt(
    matrix: &DistanceMatrix,
    initial_tour: &[usize],
    max_iterations: usize,
) -> Result<Solution> {
    TwoOptSearch::first_improvement()
        .with_max_iterations(max_iterations)
        .optimize(matrix, initial_tour)
}

/// Simulated annealing from a random tour drawn with `rng_seed`
pub fn solve_simulated_annealing(
    matrix: &DistanceMatrix,
    initial_temperature: f64,
    cooling_rate: f64,
    min_temperature: f64,
    rng_seed: u64,
) -> Result<Solution> {
    SimulatedAnnealing::with_params(initial_temperature, cooling_rate, min_temperature, rng_seed)
        .solve(matrix)
}
