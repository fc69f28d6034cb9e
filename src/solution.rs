//! Solution representation and tour evaluation.
//!
//! [`tour_length`] is the single source of truth for the cost of a tour: every
//! solver recomputes its final cost through it before returning.

use crate::error::{Result, TourError};
use crate::instance::DistanceMatrix;
use serde::{Deserialize, Serialize};

/// How a solver's answer relates to the optimum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Proven globally optimal
    Optimal,
    /// Constructed or sampled, no optimality claim
    Heuristic,
    /// No improving move of the local search neighborhood remains
    LocalOptimum,
    /// Local search stopped at its iteration cap; the tour is valid and no worse than the input
    IterationCapReached,
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Heuristic => "heuristic",
            SolveStatus::LocalOptimum => "local-optimum",
            SolveStatus::IterationCapReached => "iteration-cap",
        };
        f.write_str(s)
    }
}

/// Check that `tour` is a permutation of `0..n` for an `n`-city matrix
pub fn validate_tour(tour: &[usize], matrix: &DistanceMatrix) -> Result<()> {
    let n = matrix.dimension();
    if tour.len() != n {
        return Err(TourError::WrongLength { expected: n, actual: tour.len() }.into());
    }

    let mut seen = vec![false; n];
    for &city in tour {
        if city >= n {
            return Err(TourError::CityOutOfRange { city, cities: n }.into());
        }
        if seen[city] {
            return Err(TourError::DuplicateCity(city).into());
        }
        seen[city] = true;
    }
    Ok(())
}

/// Total length of the closed cycle described by `tour`.
///
/// Fails if the tour is not a permutation matching the matrix dimension.
pub fn tour_length(tour: &[usize], matrix: &DistanceMatrix) -> Result<f64> {
    validate_tour(tour, matrix)?;
    Ok(cycle_length(tour, matrix))
}

/// Cycle length without validation, for tours the caller already knows are permutations
#[inline]
pub(crate) fn cycle_length(tour: &[usize], matrix: &DistanceMatrix) -> f64 {
    let n = tour.len();
    (0..n).map(|i| matrix.distance(tour[i], tour[(i + 1) % n])).sum()
}

/// A tour together with its length and run metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// City indices in visiting order; the last city connects back to the first
    pub tour: Vec<usize>,
    /// Total cyclic tour length
    pub cost: f64,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Iterations performed (permutations, scans or annealing steps)
    pub iterations: Option<u64>,
    pub status: SolveStatus,
}

impl Solution {
    /// Create a solution from a tour, validating it and computing its cost
    pub fn from_tour(
        matrix: &DistanceMatrix,
        tour: Vec<usize>,
        algorithm: &str,
        status: SolveStatus,
    ) -> Result<Self> {
        let cost = tour_length(&tour, matrix)?;
        Ok(Solution {
            tour,
            cost,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
            status,
        })
    }

    /// Recompute the cost from the tour
    pub fn validate(&mut self, matrix: &DistanceMatrix) -> Result<()> {
        self.cost = tour_length(&self.tour, matrix)?;
        Ok(())
    }

    /// Number of cities visited
    pub fn len(&self) -> usize {
        self.tour.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tour.is_empty()
    }

    /// Change in length from reversing `tour[i+1..=j]`, i.e. replacing edges
    /// `(t[i], t[i+1])` and `(t[j], t[j+1])` with `(t[i], t[j])` and `(t[i+1], t[j+1])`.
    ///
    /// Only valid for symmetric matrices, which every `DistanceMatrix` is.
    #[inline]
    pub fn two_opt_delta(&self, matrix: &DistanceMatrix, i: usize, j: usize) -> f64 {
        let n = self.tour.len();
        let a = self.tour[i];
        let b = self.tour[i + 1];
        let c = self.tour[j];
        let d = self.tour[(j + 1) % n];
        matrix.distance(a, c) + matrix.distance(b, d) - matrix.distance(a, b) - matrix.distance(c, d)
    }

    /// Apply a 2-opt move (reverse segment between i+1 and j)
    pub fn apply_two_opt(&mut self, i: usize, j: usize) {
        self.tour[i + 1..=j].reverse();
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Cost: {:.2}", self.cost)?;
        writeln!(f, "  Status: {}", self.status)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Iterations: {}", iter)?;
        }
        let route: Vec<String> = self
            .tour
            .iter()
            .chain(self.tour.first())
            .map(|c| c.to_string())
            .collect();
        writeln!(f, "  Tour: {}", route.join(" -> "))
    }
}

/// A solver that produces a complete tour from a distance matrix
pub trait TspSolver {
    fn solve(&self, matrix: &DistanceMatrix) -> Result<Solution>;
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TspError;
    use crate::instance::Point;

    fn square() -> DistanceMatrix {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 0.0),
        ];
        DistanceMatrix::from_points(&points).unwrap()
    }

    #[test]
    fn test_tour_length() {
        let matrix = square();
        assert!((tour_length(&[0, 1, 2, 3], &matrix).unwrap() - 4.0).abs() < 1e-12);
        let crossed = 2.0 + 2.0 * 2f64.sqrt();
        assert!((tour_length(&[0, 2, 1, 3], &matrix).unwrap() - crossed).abs() < 1e-12);
    }

    #[test]
    fn test_tour_length_is_rotation_and_reflection_invariant() {
        let matrix = square();
        let base = tour_length(&[0, 2, 1, 3], &matrix).unwrap();
        assert!((tour_length(&[2, 1, 3, 0], &matrix).unwrap() - base).abs() < 1e-12);
        assert!((tour_length(&[3, 1, 2, 0], &matrix).unwrap() - base).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_tours() {
        let matrix = square();
        assert_eq!(
            tour_length(&[0, 1, 2], &matrix),
            Err(TspError::InvalidTour(TourError::WrongLength { expected: 4, actual: 3 }))
        );
        assert_eq!(
            tour_length(&[0, 1, 2, 4], &matrix),
            Err(TspError::InvalidTour(TourError::CityOutOfRange { city: 4, cities: 4 }))
        );
        assert_eq!(
            tour_length(&[0, 1, 1, 3], &matrix),
            Err(TspError::InvalidTour(TourError::DuplicateCity(1)))
        );
    }

    #[test]
    fn test_two_opt_delta_matches_full_evaluation() {
        let matrix = square();
        let mut solution =
            Solution::from_tour(&matrix, vec![0, 2, 1, 3], "test", SolveStatus::Heuristic).unwrap();
        let delta = solution.two_opt_delta(&matrix, 0, 2);
        let before = solution.cost;

        solution.apply_two_opt(0, 2);
        solution.validate(&matrix).unwrap();

        assert_eq!(solution.tour, vec![0, 1, 2, 3]);
        assert!((solution.cost - (before + delta)).abs() < 1e-12);
    }
}
