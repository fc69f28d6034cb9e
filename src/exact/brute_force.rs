//! Exhaustive enumeration of every tour.
//!
//! City 0 is fixed as the first city, which removes rotations, and the
//! remaining `n-1` cities are permuted in lexicographic order. The first
//! strictly shortest tour wins, so ties resolve to the lexicographically
//! smallest tour. Runtime is O(n!), practical only up to about 10 cities.

use crate::error::Result;
use crate::instance::DistanceMatrix;
use crate::solution::{Solution, SolveStatus, TspSolver};
use std::time::Instant;

/// Exact solver by enumeration of all `(n-1)!` tours starting at city 0
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceSolver;

impl BruteForceSolver {
    /// Largest instance this solver is meant for. Not enforced.
    pub const PRACTICAL_LIMIT: usize = 10;

    pub fn new() -> Self {
        BruteForceSolver
    }
}

/// Rearrange `items` into the next lexicographic permutation.
///
/// Returns `false` (leaving `items` untouched) when `items` is already the last one.
fn next_permutation(items: &mut [usize]) -> bool {
    if items.len() < 2 {
        return false;
    }

    let mut i = items.len() - 1;
    while i > 0 && items[i - 1] >= items[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }

    let mut j = items.len() - 1;
    while items[j] <= items[i - 1] {
        j -= 1;
    }
    items.swap(i - 1, j);
    items[i..].reverse();
    true
}

/// Length of the cycle `0 -> rest[0] -> ... -> rest[last] -> 0`
#[inline]
fn anchored_length(matrix: &DistanceMatrix, rest: &[usize]) -> f64 {
    let (Some(&first), Some(&last)) = (rest.first(), rest.last()) else {
        return 0.0;
    };
    let inner: f64 = rest.windows(2).map(|w| matrix.distance(w[0], w[1])).sum();
    matrix.distance(0, first) + inner + matrix.distance(last, 0)
}

impl TspSolver for BruteForceSolver {
    fn solve(&self, matrix: &DistanceMatrix) -> Result<Solution> {
        let start = Instant::now();
        let n = matrix.dimension();

        if n > Self::PRACTICAL_LIMIT {
            log::warn!(
                "Enumerating {} cities exceeds the practical limit of {}",
                n,
                Self::PRACTICAL_LIMIT
            );
        }

        let mut rest: Vec<usize> = (1..n).collect();
        let mut best_rest = rest.clone();
        let mut best_cost = anchored_length(matrix, &rest);
        let mut evaluated: u64 = 1;

        while next_permutation(&mut rest) {
            evaluated = evaluated.saturating_add(1);
            let cost = anchored_length(matrix, &rest);
            if cost < best_cost {
                best_cost = cost;
                best_rest.copy_from_slice(&rest);
            }
        }

        let mut tour = Vec::with_capacity(n);
        if n > 0 {
            tour.push(0);
            tour.extend(best_rest);
        }

        log::debug!("Enumeration evaluated {} tours, best {:.4}", evaluated, best_cost);

        let mut solution = Solution::from_tour(matrix, tour, self.name(), SolveStatus::Optimal)?;
        solution.iterations = Some(evaluated);
        solution.computation_time = start.elapsed().as_secs_f64();
        Ok(solution)
    }

    fn name(&self) -> &str {
        "BruteForce"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Point;

    #[test]
    fn test_next_permutation_order() {
        let mut items = vec![1, 2, 3];
        let mut seen = vec![items.clone()];
        while next_permutation(&mut items) {
            seen.push(items.clone());
        }
        assert_eq!(
            seen,
            vec![
                vec![1, 2, 3],
                vec![1, 3, 2],
                vec![2, 1, 3],
                vec![2, 3, 1],
                vec![3, 1, 2],
                vec![3, 2, 1],
            ]
        );
        assert_eq!(items, vec![3, 2, 1]);
    }

    #[test]
    fn test_unit_square_follows_perimeter() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 0.0),
        ];
        let matrix = DistanceMatrix::from_points(&points).unwrap();
        let solution = BruteForceSolver::new().solve(&matrix).unwrap();

        assert_eq!(solution.cost, 4.0);
        assert_eq!(solution.tour, vec![0, 1, 2, 3]);
        assert_eq!(solution.iterations, Some(6));
        assert_eq!(solution.status, SolveStatus::Optimal);
    }

    #[test]
    fn test_first_minimum_wins_ties() {
        // Every tour of an equilateral-like uniform matrix has the same length.
        let rows = vec![
            vec![0.0, 1.0, 1.0, 1.0],
            vec![1.0, 0.0, 1.0, 1.0],
            vec![1.0, 1.0, 0.0, 1.0],
            vec![1.0, 1.0, 1.0, 0.0],
        ];
        let matrix = DistanceMatrix::from_rows(rows).unwrap();
        let solution = BruteForceSolver::new().solve(&matrix).unwrap();
        assert_eq!(solution.tour, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_degenerate_sizes() {
        let empty = BruteForceSolver::new().solve(&DistanceMatrix::empty()).unwrap();
        assert!(empty.tour.is_empty());
        assert_eq!(empty.cost, 0.0);

        let single = DistanceMatrix::from_points(&[Point::new(2.0, 3.0)]).unwrap();
        let solution = BruteForceSolver::new().solve(&single).unwrap();
        assert_eq!(solution.tour, vec![0]);
        assert_eq!(solution.cost, 0.0);
    }
}
