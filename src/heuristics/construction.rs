use crate::error::{Result, TspError};
use crate::instance::DistanceMatrix;
use crate::solution::{Solution, SolveStatus, TspSolver};
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Nearest Neighbor Heuristic
///
/// Builds a tour by repeatedly visiting the nearest unvisited city, breaking
/// distance ties by the lowest city index. O(n²).
///
/// The randomized variant instead picks uniformly among the `candidates`
/// nearest unvisited cities, drawing from the generator it is given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearestNeighborHeuristic {
    pub start_city: usize,
    pub randomized: bool,
    /// Size of the restricted candidate list in randomized mode
    pub candidates: usize,
    pub seed: u64,
}

impl NearestNeighborHeuristic {
    pub fn new() -> Self {
        NearestNeighborHeuristic {
            start_city: 0,
            randomized: false,
            candidates: 3,
            seed: 42,
        }
    }

    pub fn from_city(start_city: usize) -> Self {
        NearestNeighborHeuristic {
            start_city,
            ..Self::new()
        }
    }

    pub fn randomized(seed: u64) -> Self {
        NearestNeighborHeuristic {
            randomized: true,
            seed,
            ..Self::new()
        }
    }

    fn find_nearest<R: Rng + ?Sized>(
        &self,
        matrix: &DistanceMatrix,
        current: usize,
        visited: &[bool],
        rng: &mut R,
    ) -> Option<usize> {
        let unvisited = (0..matrix.dimension())
            .filter(|&c| !visited[c])
            .map(|c| (OrderedFloat(matrix.distance(current, c)), c));

        if !self.randomized {
            return unvisited.min().map(|(_, c)| c);
        }

        let mut candidates: Vec<(OrderedFloat<f64>, usize)> = unvisited.collect();
        if candidates.is_empty() {
            return None;
        }
        candidates.sort();

        let top_k = candidates.len().min(self.candidates.max(1));
        let idx = rng.gen_range(0..top_k);
        Some(candidates[idx].1)
    }

    /// Build a tour, drawing any random choices from `rng`
    pub fn construct_with_rng<R: Rng + ?Sized>(
        &self,
        matrix: &DistanceMatrix,
        rng: &mut R,
    ) -> Result<Solution> {
        let start = Instant::now();
        let n = matrix.dimension();

        if n == 0 {
            return Solution::from_tour(matrix, Vec::new(), self.name(), SolveStatus::Heuristic);
        }
        if self.start_city >= n {
            return Err(TspError::InvalidConfig(format!(
                "start city {} is out of range for {} cities",
                self.start_city, n
            )));
        }

        let mut tour = Vec::with_capacity(n);
        let mut visited = vec![false; n];
        let mut current = self.start_city;
        tour.push(current);
        visited[current] = true;

        while let Some(next) = self.find_nearest(matrix, current, &visited, rng) {
            tour.push(next);
            visited[next] = true;
            current = next;
        }

        let mut solution = Solution::from_tour(matrix, tour, self.name(), SolveStatus::Heuristic)?;
        solution.computation_time = start.elapsed().as_secs_f64();
        Ok(solution)
    }
}

impl Default for NearestNeighborHeuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl TspSolver for NearestNeighborHeuristic {
    fn solve(&self, matrix: &DistanceMatrix) -> Result<Solution> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.construct_with_rng(matrix, &mut rng)
    }

    fn name(&self) -> &str {
        if self.randomized {
            "NearestNeighbor-Randomized"
        } else {
            "NearestNeighbor"
        }
    }
}

/// Multi-start Nearest Neighbor
///
/// Runs the deterministic heuristic from every city and keeps the shortest
/// tour (the lowest start city on ties). O(n³).
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiStartNearestNeighbor;

impl MultiStartNearestNeighbor {
    pub fn new() -> Self {
        MultiStartNearestNeighbor
    }
}

impl TspSolver for MultiStartNearestNeighbor {
    fn solve(&self, matrix: &DistanceMatrix) -> Result<Solution> {
        let start = Instant::now();

        let mut best = NearestNeighborHeuristic::from_city(0).solve(matrix)?;
        for city in 1..matrix.dimension() {
            let candidate = NearestNeighborHeuristic::from_city(city).solve(matrix)?;
            if candidate.cost < best.cost {
                log::debug!("Start city {} improves to {:.4}", city, candidate.cost);
                best = candidate;
            }
        }

        best.algorithm = self.name().to_string();
        best.iterations = Some(matrix.dimension() as u64);
        best.computation_time = start.elapsed().as_secs_f64();
        Ok(best)
    }

    fn name(&self) -> &str {
        "NearestNeighbor-MultiStart"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Instance, Point};

    fn line(xs: &[f64]) -> DistanceMatrix {
        let points: Vec<Point> = xs.iter().map(|&x| Point::new(x, 0.0)).collect();
        DistanceMatrix::from_points(&points).unwrap()
    }

    #[test]
    fn test_nearest_neighbor_follows_closest_city() {
        let matrix = line(&[0.0, 10.0, 1.0, 3.0]);
        let solution = NearestNeighborHeuristic::new().solve(&matrix).unwrap();

        assert_eq!(solution.tour, vec![0, 2, 3, 1]);
        assert_eq!(solution.cost, 20.0);
        assert_eq!(solution.status, SolveStatus::Heuristic);
    }

    #[test]
    fn test_ties_break_by_lowest_index() {
        // Cities 1 and 2 are both at distance 1 from city 0.
        let matrix = line(&[0.0, 1.0, -1.0, 5.0]);
        let solution = NearestNeighborHeuristic::new().solve(&matrix).unwrap();
        assert_eq!(solution.tour[1], 1);
    }

    #[test]
    fn test_start_city() {
        let matrix = line(&[0.0, 10.0, 1.0, 3.0]);
        let solution = NearestNeighborHeuristic::from_city(1).solve(&matrix).unwrap();
        assert_eq!(solution.tour, vec![1, 3, 2, 0]);

        let err = NearestNeighborHeuristic::from_city(4).solve(&matrix).unwrap_err();
        assert!(matches!(err, TspError::InvalidConfig(_)));
    }

    #[test]
    fn test_randomized_is_reproducible() {
        let instance = Instance::random_uniform(30, 100.0, 3).unwrap();
        let matrix = &instance.distance_matrix;

        let a = NearestNeighborHeuristic::randomized(11).solve(matrix).unwrap();
        let b = NearestNeighborHeuristic::randomized(11).solve(matrix).unwrap();
        assert_eq!(a.tour, b.tour);

        let mut sorted = a.tour.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..30).collect::<Vec<_>>());
    }

    #[test]
    fn test_multi_start_is_no_worse_than_single_start() {
        let instance = Instance::random_uniform(25, 100.0, 9).unwrap();
        let matrix = &instance.distance_matrix;

        let single = NearestNeighborHeuristic::new().solve(matrix).unwrap();
        let multi = MultiStartNearestNeighbor::new().solve(matrix).unwrap();
        assert!(multi.cost <= single.cost);
        assert_eq!(multi.algorithm, "NearestNeighbor-MultiStart");
    }
}
