//! Simulated annealing over city swaps.
//!
//! The search keeps city 0 anchored at position 0, proposes swapping the cities
//! at two random positions, and accepts a worsening move of size `Δ` with
//! probability `exp(-Δ / T)`. The temperature is multiplied by the cooling rate
//! after every `iterations_per_temperature` proposals and the run ends once it
//! drops to `min_temperature`. The best tour seen at any point is returned.

use crate::error::{Result, TspError};
use crate::heuristics::local_search::LocalSearch;
use crate::instance::DistanceMatrix;
use crate::solution::{cycle_length, validate_tour, Solution, SolveStatus, TspSolver};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Annealing schedule state
#[derive(Debug, Clone, Copy, PartialEq)]
enum Schedule {
    Running(f64),
    Done,
}

impl Schedule {
    fn at(temperature: f64, min_temperature: f64) -> Self {
        if temperature > min_temperature {
            Schedule::Running(temperature)
        } else {
            Schedule::Done
        }
    }
}

/// Outcome of one annealing run
#[derive(Debug, Clone)]
struct AnnealingRun {
    best_tour: Vec<usize>,
    steps: u64,
    accepted: u64,
    final_temperature: f64,
}

/// Simulated Annealing
///
/// Metaheuristic that accepts worse solutions with decreasing probability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedAnnealing {
    /// Initial temperature
    pub initial_temperature: f64,
    /// Multiplier applied to the temperature, in (0, 1)
    pub cooling_rate: f64,
    /// The run stops once the temperature is at or below this. May be 0, since
    /// geometric cooling underflows to 0 in finitely many steps.
    pub min_temperature: f64,
    /// Proposals evaluated before each cooling step
    pub iterations_per_temperature: usize,
    /// Random seed
    pub seed: u64,
}

impl SimulatedAnnealing {
    pub fn new() -> Self {
        SimulatedAnnealing {
            initial_temperature: 1000.0,
            cooling_rate: 0.995,
            min_temperature: 1.0,
            iterations_per_temperature: 1,
            seed: 42,
        }
    }

    pub fn with_params(initial_temperature: f64, cooling_rate: f64, min_temperature: f64, seed: u64) -> Self {
        SimulatedAnnealing {
            initial_temperature,
            cooling_rate,
            min_temperature,
            seed,
            ..Self::new()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check every parameter is in its domain, so that the schedule terminates
    pub fn validate(&self) -> Result<()> {
        if !(self.initial_temperature.is_finite() && self.initial_temperature > 0.0) {
            return Err(TspError::InvalidConfig(format!(
                "initial temperature must be positive and finite, got {}",
                self.initial_temperature
            )));
        }
        if !(self.min_temperature.is_finite() && self.min_temperature >= 0.0) {
            return Err(TspError::InvalidConfig(format!(
                "minimum temperature must be non-negative and finite, got {}",
                self.min_temperature
            )));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(TspError::InvalidConfig(format!(
                "cooling rate must be in (0, 1), got {}",
                self.cooling_rate
            )));
        }
        if self.iterations_per_temperature == 0 {
            return Err(TspError::InvalidConfig(
                "iterations per temperature must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of cooling steps the schedule will take
    pub fn temperature_steps(&self) -> u64 {
        if self.initial_temperature <= self.min_temperature {
            return 0;
        }
        let mut temperature = self.initial_temperature;
        let mut steps = 0;
        while temperature > self.min_temperature {
            temperature *= self.cooling_rate;
            steps += 1;
        }
        steps
    }

    fn anneal<R: Rng + ?Sized>(
        &self,
        matrix: &DistanceMatrix,
        mut current: Vec<usize>,
        rng: &mut R,
    ) -> AnnealingRun {
        let n = current.len();
        let mut current_cost = cycle_length(&current, matrix);
        let mut best_tour = current.clone();
        let mut best_cost = current_cost;
        let mut steps = 0u64;
        let mut accepted = 0u64;

        if n < 3 {
            return AnnealingRun {
                best_tour,
                steps,
                accepted,
                final_temperature: self.initial_temperature,
            };
        }

        let mut schedule = Schedule::at(self.initial_temperature, self.min_temperature);
        let mut temperature = self.initial_temperature;

        while let Schedule::Running(t) = schedule {
            for _ in 0..self.iterations_per_temperature {
                let i = rng.gen_range(1..n);
                let j = rng.gen_range(1..n);
                current.swap(i, j);

                let new_cost = cycle_length(&current, matrix);
                let delta = new_cost - current_cost;
                let accept = delta < 0.0 || rng.gen::<f64>() < (-delta / t).exp();

                if accept {
                    current_cost = new_cost;
                    accepted += 1;
                    if current_cost < best_cost {
                        best_cost = current_cost;
                        best_tour.copy_from_slice(&current);
                    }
                } else {
                    current.swap(i, j);
                }
                steps += 1;
            }

            temperature = t * self.cooling_rate;
            schedule = Schedule::at(temperature, self.min_temperature);
        }

        log::debug!(
            "Annealing: {} steps, {} accepted, best {:.4}, final temperature {:.6}",
            steps,
            accepted,
            best_cost,
            temperature
        );

        AnnealingRun {
            best_tour,
            steps,
            accepted,
            final_temperature: temperature,
        }
    }

    /// Anneal from a random tour drawn from `rng`, with city 0 anchored first
    pub fn run_with_rng<R: Rng + ?Sized>(&self, matrix: &DistanceMatrix, rng: &mut R) -> Result<Solution> {
        self.validate()?;
        let start = Instant::now();
        let n = matrix.dimension();

        let mut initial: Vec<usize> = (0..n).collect();
        if n > 2 {
            initial[1..].shuffle(rng);
        }

        let run = self.anneal(matrix, initial, rng);
        let mut solution =
            Solution::from_tour(matrix, run.best_tour, TspSolver::name(self), SolveStatus::Heuristic)?;
        solution.iterations = Some(run.steps);
        solution.computation_time = start.elapsed().as_secs_f64();
        Ok(solution)
    }
}

impl Default for SimulatedAnnealing {
    fn default() -> Self {
        Self::new()
    }
}

impl TspSolver for SimulatedAnnealing {
    fn solve(&self, matrix: &DistanceMatrix) -> Result<Solution> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.run_with_rng(matrix, &mut rng)
    }

    fn name(&self) -> &str {
        "SimulatedAnnealing"
    }
}

impl LocalSearch for SimulatedAnnealing {
    fn improve(&self, matrix: &DistanceMatrix, solution: &mut Solution) -> Result<bool> {
        self.validate()?;
        validate_tour(&solution.tour, matrix)?;
        solution.validate(matrix)?;
        let initial_cost = solution.cost;

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let run = self.anneal(matrix, solution.tour.clone(), &mut rng);

        let improved = cycle_length(&run.best_tour, matrix) < initial_cost;
        if improved {
            solution.tour = run.best_tour;
            solution.validate(matrix)?;
            solution.status = SolveStatus::Heuristic;
        }
        solution.iterations = Some(run.steps);
        log::debug!(
            "Annealing accepted {}/{} moves, stopped at T={:.6}",
            run.accepted,
            run.steps,
            run.final_temperature
        );
        Ok(improved)
    }

    fn name(&self) -> &str {
        "SimulatedAnnealing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exact::HeldKarpSolver;
    use crate::instance::{Instance, Point};
    use crate::solution::tour_length;

    #[test]
    fn test_same_seed_same_tour() {
        let instance = Instance::random_uniform(15, 100.0, 2).unwrap();
        let matrix = &instance.distance_matrix;

        let a = SimulatedAnnealing::new().with_seed(7).solve(matrix).unwrap();
        let b = SimulatedAnnealing::new().with_seed(7).solve(matrix).unwrap();
        assert_eq!(a.tour, b.tour);
        assert_eq!(a.cost, b.cost);
        assert_eq!(a.tour[0], 0);
        assert_eq!(a.cost, tour_length(&a.tour, matrix).unwrap());
    }

    #[test]
    fn test_injected_rng_matches_seeded_solve() {
        let instance = Instance::random_uniform(12, 100.0, 4).unwrap();
        let matrix = &instance.distance_matrix;
        let sa = SimulatedAnnealing::new().with_seed(99);

        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let injected = sa.run_with_rng(matrix, &mut rng).unwrap();
        let seeded = sa.solve(matrix).unwrap();
        assert_eq!(injected.tour, seeded.tour);
    }

    #[test]
    fn test_step_count_follows_schedule() {
        let matrix = Instance::random_uniform(6, 10.0, 0).unwrap().distance_matrix;
        let sa = SimulatedAnnealing::with_params(10.0, 0.5, 1.0, 1);
        // 10 -> 5 -> 2.5 -> 1.25 -> 0.625
        assert_eq!(sa.temperature_steps(), 4);
        let solution = sa.solve(&matrix).unwrap();
        assert_eq!(solution.iterations, Some(4));
    }

    #[test]
    fn test_zero_min_temperature_terminates() {
        let matrix = Instance::random_uniform(5, 10.0, 0).unwrap().distance_matrix;
        let sa = SimulatedAnnealing::with_params(1.0, 0.5, 0.0, 1);
        // halving from 1.0 walks down the subnormals and rounds to 0 after 2^-1074
        assert_eq!(sa.temperature_steps(), 1075);

        let solution = sa.solve(&matrix).unwrap();
        assert_eq!(solution.iterations, Some(1075));
        assert_eq!(solution.cost, tour_length(&solution.tour, &matrix).unwrap());
    }

    #[test]
    fn test_close_to_optimum_on_small_instance() {
        let instance = Instance::random_uniform(8, 100.0, 6).unwrap();
        let matrix = &instance.distance_matrix;

        let optimal = HeldKarpSolver::new().solve(matrix).unwrap();
        let sa = SimulatedAnnealing::with_params(1000.0, 0.999, 0.01, 3).solve(matrix).unwrap();
        assert!(sa.cost >= optimal.cost - 1e-9);
        assert!(sa.cost <= optimal.cost * 1.25);
    }

    #[test]
    fn test_invalid_config() {
        let matrix = Instance::random_uniform(5, 10.0, 0).unwrap().distance_matrix;
        for sa in [
            SimulatedAnnealing::with_params(100.0, 1.0, 1.0, 0),
            SimulatedAnnealing::with_params(100.0, 0.0, 1.0, 0),
            SimulatedAnnealing::with_params(-1.0, 0.9, 1.0, 0),
            SimulatedAnnealing::with_params(100.0, 0.9, -1.0, 0),
            SimulatedAnnealing::with_params(100.0, 0.9, f64::NAN, 0),
        ] {
            assert!(matches!(sa.solve(&matrix), Err(TspError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_degenerate_sizes() {
        let single = DistanceMatrix::from_points(&[Point::new(1.0, 1.0)]).unwrap();
        let solution = SimulatedAnnealing::new().solve(&single).unwrap();
        assert_eq!(solution.tour, vec![0]);
        assert_eq!(solution.cost, 0.0);

        let pair = DistanceMatrix::from_points(&[Point::new(0.0, 0.0), Point::new(0.0, 2.0)]).unwrap();
        let solution = SimulatedAnnealing::new().solve(&pair).unwrap();
        assert_eq!(solution.tour, vec![0, 1]);
        assert_eq!(solution.cost, 4.0);
    }

    #[test]
    fn test_improve_never_worsens() {
        let instance = Instance::random_uniform(20, 100.0, 12).unwrap();
        let matrix = &instance.distance_matrix;
        let mut solution =
            Solution::from_tour(matrix, (0..20).collect(), "identity", SolveStatus::Heuristic).unwrap();
        let before = solution.cost;

        SimulatedAnnealing::new().improve(matrix, &mut solution).unwrap();
        assert!(solution.cost <= before);
    }
}
