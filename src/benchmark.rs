//! Comparison and benchmarking harness.
//!
//! Runs a line-up of solvers on the same distance matrix, ranks their tours,
//! aggregates repeated seeded runs, and exports the results.

use crate::error::Result;
use crate::exact::{BruteForceSolver, HeldKarpSolver};
use crate::heuristics::annealing::SimulatedAnnealing;
use crate::heuristics::construction::NearestNeighborHeuristic;
use crate::heuristics::local_search::{NearestNeighborTwoOpt, TwoOptSearch};
use crate::instance::{DistanceMatrix, Instance};
use crate::solution::{SolveStatus, TspSolver};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Result of running a single algorithm on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    /// Run label, e.g. `SimulatedAnnealing-run3`
    pub algorithm: String,
    /// Solver name shared by all runs of the same algorithm
    pub family: String,
    /// Instance name
    pub instance: String,
    /// Number of cities
    pub cities: usize,
    /// Tour length
    pub cost: f64,
    /// Computation time in seconds
    pub time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<u64>,
    pub status: SolveStatus,
    /// Best cost on this instance divided by this cost, in percent
    pub quality: f64,
    /// 1-based position when the instance's runs are sorted by cost
    pub rank: usize,
}

/// Aggregated statistics for an algorithm family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    pub algorithm: String,
    /// Number of runs aggregated
    pub runs: usize,
    pub avg_cost: f64,
    pub best_cost: f64,
    pub worst_cost: f64,
    /// Sample standard deviation of cost (0 for a single run)
    pub std_cost: f64,
    pub avg_quality: f64,
    pub avg_time: f64,
    pub total_time: f64,
}

/// Comparison configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonConfig {
    /// Number of seeded annealing runs per instance
    pub runs: usize,
    /// Seed of the first annealing run; run `k` uses `seed + k`
    pub seed: u64,
    /// Run exhaustive enumeration only up to this many cities
    pub max_enumeration_cities: usize,
    /// Run Held-Karp only up to this many cities
    pub max_held_karp_cities: usize,
    /// Run the solvers of one instance in parallel
    pub parallel: bool,
    pub two_opt: TwoOptSearch,
    pub annealing: SimulatedAnnealing,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        ComparisonConfig {
            runs: 1,
            seed: 42,
            max_enumeration_cities: BruteForceSolver::PRACTICAL_LIMIT,
            max_held_karp_cities: 15,
            parallel: false,
            two_opt: TwoOptSearch::default(),
            annealing: SimulatedAnnealing::default(),
        }
    }
}

type Entry = (String, Box<dyn TspSolver + Send + Sync>);

/// Comparison engine
pub struct Comparison {
    config: ComparisonConfig,
    results: Vec<AlgorithmResult>,
}

impl Comparison {
    pub fn new(config: ComparisonConfig) -> Self {
        Comparison {
            config,
            results: Vec::new(),
        }
    }

    /// The standard line-up for an instance of `n` cities
    fn lineup(&self, n: usize) -> Vec<Entry> {
        let mut entries: Vec<Entry> = Vec::new();

        if n <= self.config.max_enumeration_cities {
            entries.push(("BruteForce".to_string(), Box::new(BruteForceSolver::new())));
        } else {
            log::info!("Skipping enumeration for {} cities", n);
        }
        if n <= self.config.max_held_karp_cities {
            entries.push(("HeldKarp".to_string(), Box::new(HeldKarpSolver::new())));
        } else {
            log::info!("Skipping Held-Karp for {} cities", n);
        }

        entries.push(("NearestNeighbor".to_string(), Box::new(NearestNeighborHeuristic::new())));
        entries.push((
            "NearestNeighbor+2-Opt".to_string(),
            Box::new(NearestNeighborTwoOpt::new(
                NearestNeighborHeuristic::new(),
                self.config.two_opt.clone(),
            )),
        ));

        for run in 0..self.config.runs {
            let seed = self.config.seed.wrapping_add(run as u64);
            let sa = self.config.annealing.clone().with_seed(seed);
            entries.push((format!("SimulatedAnnealing-run{}", run), Box::new(sa)));
        }

        entries
    }

    /// Run `solvers` on one matrix, rank the outcomes and record them
    pub fn run_solvers(
        &mut self,
        instance_name: &str,
        matrix: &DistanceMatrix,
        solvers: &[Entry],
    ) -> Result<Vec<AlgorithmResult>> {
        let run = |(label, solver): &Entry| -> Result<AlgorithmResult> {
            let solution = solver.solve(matrix)?;
            log::debug!("{} on {}: {:.4}", label, instance_name, solution.cost);
            Ok(AlgorithmResult {
                algorithm: label.clone(),
                family: solver.name().to_string(),
                instance: instance_name.to_string(),
                cities: matrix.dimension(),
                cost: solution.cost,
                time: solution.computation_time,
                iterations: solution.iterations,
                status: solution.status,
                quality: 100.0,
                rank: 0,
            })
        };

        let mut results: Vec<AlgorithmResult> = if self.config.parallel {
            solvers.par_iter().map(run).collect::<Result<_>>()?
        } else {
            solvers.iter().map(run).collect::<Result<_>>()?
        };

        rank_results(&mut results);
        self.results.extend(results.iter().cloned());
        Ok(results)
    }

    /// Run the standard line-up on an instance
    pub fn run_instance(&mut self, instance: &Instance) -> Result<Vec<AlgorithmResult>> {
        log::info!(
            "Running comparison on instance: {} ({} cities)",
            instance.name,
            instance.dimension()
        );
        let solvers = self.lineup(instance.dimension());
        self.run_solvers(&instance.name, &instance.distance_matrix, &solvers)
    }

    /// Run the standard line-up on several instances
    pub fn run_on_instances(&mut self, instances: &[Instance]) -> Result<()> {
        for instance in instances {
            self.run_instance(instance)?;
        }
        Ok(())
    }

    /// Compute statistics for each algorithm family, sorted by average cost
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut by_family: HashMap<&str, Vec<&AlgorithmResult>> = HashMap::new();
        for result in &self.results {
            by_family.entry(result.family.as_str()).or_default().push(result);
        }

        let mut statistics: Vec<AlgorithmStatistics> = by_family
            .into_iter()
            .map(|(family, results)| {
                let costs: Vec<f64> = results.iter().map(|r| r.cost).collect();
                let times: Vec<f64> = results.iter().map(|r| r.time).collect();
                let qualities: Vec<f64> = results.iter().map(|r| r.quality).collect();

                let std_cost = if costs.len() > 1 { costs.iter().std_dev() } else { 0.0 };

                AlgorithmStatistics {
                    algorithm: family.to_string(),
                    runs: results.len(),
                    avg_cost: costs.iter().mean(),
                    best_cost: costs.iter().cloned().fold(f64::INFINITY, f64::min),
                    worst_cost: costs.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                    std_cost,
                    avg_quality: qualities.iter().mean(),
                    avg_time: times.iter().mean(),
                    total_time: times.iter().sum(),
                }
            })
            .collect();

        statistics.sort_by(|a, b| {
            a.avg_cost
                .total_cmp(&b.avg_cost)
                .then_with(|| a.algorithm.cmp(&b.algorithm))
        });
        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result).map_err(csv_error)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat).map_err(csv_error)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("          TSP Comparison Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!(
            "Generated: {}\n\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        report.push_str("Algorithm Performance Summary:\n");
        report.push_str("-".repeat(84).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<28} {:>6} {:>12} {:>12} {:>10} {:>12}\n",
            "Algorithm", "Runs", "Avg Cost", "Best Cost", "Quality", "Avg Time"
        ));
        report.push_str("-".repeat(84).as_str());
        report.push('\n');

        for stat in self.compute_statistics() {
            report.push_str(&format!(
                "{:<28} {:>6} {:>12.2} {:>12.2} {:>9.1}% {:>12.6}\n",
                stat.algorithm, stat.runs, stat.avg_cost, stat.best_cost, stat.avg_quality, stat.avg_time
            ));
        }

        report.push_str("-".repeat(84).as_str());
        report.push('\n');

        report.push_str("\nBest Solutions per Instance:\n");
        let mut best: Vec<&AlgorithmResult> = self.results.iter().filter(|r| r.rank == 1).collect();
        best.sort_by(|a, b| a.instance.cmp(&b.instance).then_with(|| a.algorithm.cmp(&b.algorithm)));
        for result in best {
            report.push_str(&format!(
                "  {}: {:.2} ({}, {})\n",
                result.instance, result.cost, result.algorithm, result.status
            ));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }
}

fn csv_error(e: csv::Error) -> crate::error::TspError {
    crate::error::TspError::Io(e.to_string())
}

/// Sort by cost (label on ties) and fill in rank and quality
fn rank_results(results: &mut [AlgorithmResult]) {
    results.sort_by(|a, b| a.cost.total_cmp(&b.cost).then_with(|| a.algorithm.cmp(&b.algorithm)));

    let best = results.first().map(|r| r.cost).unwrap_or(0.0);
    let mut rank = 0;
    let mut previous = f64::NAN;
    for (idx, result) in results.iter_mut().enumerate() {
        if result.cost != previous {
            rank = idx + 1;
            previous = result.cost;
        }
        result.rank = rank;
        result.quality = if result.cost > 0.0 { best / result.cost * 100.0 } else { 100.0 };
    }
}

/// Solve with both exact solvers and check they agree within `tolerance`
pub fn cross_validate_exact(matrix: &DistanceMatrix, tolerance: f64) -> Result<bool> {
    let brute = BruteForceSolver::new().solve(matrix)?;
    let dp = HeldKarpSolver::new().solve(matrix)?;
    let agree = (brute.cost - dp.cost).abs() <= tolerance;
    if !agree {
        log::warn!("Exact solvers disagree: enumeration {} vs Held-Karp {}", brute.cost, dp.cost);
    }
    Ok(agree)
}

/// Helper function to load instances from a directory
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<Instance>> {
    let mut instances = Vec::new();

    for entry in std::fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if path.extension().map(|e| e == "tsp").unwrap_or(false) {
            match Instance::from_file(&path) {
                Ok(instance) => instances.push(instance),
                Err(e) => log::warn!("Skipping {:?}: {}", path, e),
            }
        }
    }

    // Sort by dimension
    instances.sort_by(|a, b| a.dimension().cmp(&b.dimension()).then_with(|| a.name.cmp(&b.name)));

    Ok(instances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Point;

    #[test]
    fn test_comparison_config() {
        let config = ComparisonConfig::default();
        assert_eq!(config.runs, 1);
        assert_eq!(config.max_enumeration_cities, 10);
    }

    #[test]
    fn test_ranking_and_quality() {
        let instance = Instance::random_uniform(8, 100.0, 21).unwrap();
        let mut comparison = Comparison::new(ComparisonConfig {
            runs: 3,
            ..Default::default()
        });
        let results = comparison.run_instance(&instance).unwrap();

        assert_eq!(results.len(), 2 + 2 + 3);
        assert!(results.windows(2).all(|w| w[0].cost <= w[1].cost));
        assert_eq!(results[0].rank, 1);
        assert!((results[0].quality - 100.0).abs() < 1e-12);
        assert!(results.iter().all(|r| r.quality <= 100.0 + 1e-9));

        // Both exact solvers share the optimum, so both are ranked first.
        let exact: Vec<&AlgorithmResult> = results
            .iter()
            .filter(|r| r.status == SolveStatus::Optimal)
            .collect();
        assert_eq!(exact.len(), 2);
        assert!(exact.iter().all(|r| (r.cost - results[0].cost).abs() < 1e-9));
    }

    #[test]
    fn test_exact_solvers_skipped_on_large_instances() {
        let instance = Instance::random_uniform(20, 100.0, 1).unwrap();
        let mut comparison = Comparison::new(ComparisonConfig::default());
        let results = comparison.run_instance(&instance).unwrap();

        assert!(results.iter().all(|r| r.status != SolveStatus::Optimal));
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let instance = Instance::random_uniform(9, 100.0, 5).unwrap();
        let config = ComparisonConfig { runs: 2, ..Default::default() };

        let sequential = Comparison::new(config.clone()).run_instance(&instance).unwrap();
        let parallel = Comparison::new(ComparisonConfig { parallel: true, ..config })
            .run_instance(&instance)
            .unwrap();

        let key = |r: &AlgorithmResult| (r.algorithm.clone(), r.cost, r.rank);
        assert_eq!(
            sequential.iter().map(key).collect::<Vec<_>>(),
            parallel.iter().map(key).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_statistics_group_seeded_runs() {
        let instance = Instance::random_uniform(12, 100.0, 3).unwrap();
        let mut comparison = Comparison::new(ComparisonConfig {
            runs: 4,
            ..Default::default()
        });
        comparison.run_instance(&instance).unwrap();

        let stats = comparison.compute_statistics();
        let sa = stats.iter().find(|s| s.algorithm == "SimulatedAnnealing").unwrap();
        assert_eq!(sa.runs, 4);
        assert!(sa.best_cost <= sa.avg_cost && sa.avg_cost <= sa.worst_cost);
        assert!(stats.windows(2).all(|w| w[0].avg_cost <= w[1].avg_cost));

        let report = comparison.generate_report();
        assert!(report.contains("SimulatedAnnealing"));
        assert!(report.contains("Best Solutions per Instance"));
    }

    #[test]
    fn test_cross_validate_collinear() {
        let points: Vec<Point> = (0..5).map(|x| Point::new(x as f64, 0.0)).collect();
        let matrix = DistanceMatrix::from_points(&points).unwrap();
        assert!(cross_validate_exact(&matrix, 1e-9).unwrap());
    }
}
