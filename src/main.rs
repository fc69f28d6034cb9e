//! TSP Solver - Command Line Interface
//!
//! Solves, compares and benchmarks TSP algorithms on coordinate files or
//! seeded random instances.

use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tsp_solver::benchmark::{load_instances_from_dir, Comparison, ComparisonConfig};
use tsp_solver::exact::{BruteForceSolver, HeldKarpSolver};
use tsp_solver::heuristics::{
    MultiStartNearestNeighbor, NearestNeighborHeuristic, NearestNeighborTwoOpt, SimulatedAnnealing,
    TwoOptSearch,
};
use tsp_solver::instance::distinct_tour_count;
use tsp_solver::{Instance, Result, Solution, TspError, TspSolver};

use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "tsp-solver")]
#[command(version = "1.0")]
#[command(about = "Exact and heuristic solvers for the Traveling Salesman Problem")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the cities come from
#[derive(Args, Debug)]
struct InstanceArgs {
    /// Path to a TSP-LIB style coordinate file
    #[arg(short, long, conflicts_with = "random")]
    instance: Option<PathBuf>,

    /// Generate this many random cities instead of reading a file
    #[arg(long)]
    random: Option<usize>,

    /// Coordinate range of random cities
    #[arg(long, default_value = "100")]
    max_coord: f64,

    /// Seed for random cities
    #[arg(long, default_value = "42")]
    instance_seed: u64,
}

impl InstanceArgs {
    fn load(&self) -> Result<Instance> {
        match (&self.instance, self.random) {
            (Some(path), _) => {
                println!("Loading instance from {:?}...", path);
                Instance::from_file(path)
            }
            (None, Some(n)) => Instance::random_uniform(n, self.max_coord, self.instance_seed),
            (None, None) => Err(TspError::InvalidConfig(
                "either --instance or --random is required".to_string(),
            )),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an instance with one algorithm
    Solve {
        #[command(flatten)]
        source: InstanceArgs,

        /// Algorithm to use
        #[arg(short, long, value_enum, default_value = "nn-two-opt")]
        algorithm: Algorithm,

        /// Start city for nearest neighbor
        #[arg(long, default_value = "0")]
        start_city: usize,

        /// Maximum 2-opt scans
        #[arg(long, default_value = "1000")]
        max_iterations: usize,

        /// Use best-improvement 2-opt instead of first-improvement
        #[arg(long)]
        best_improvement: bool,

        /// Annealing initial temperature
        #[arg(long, default_value = "1000")]
        initial_temp: f64,

        /// Annealing cooling rate, in (0, 1)
        #[arg(long, default_value = "0.995")]
        cooling_rate: f64,

        /// Annealing stopping temperature
        #[arg(long, default_value = "1")]
        min_temp: f64,

        /// Random seed for randomized algorithms
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output solution to file (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare all applicable algorithms on an instance
    Compare {
        #[command(flatten)]
        source: InstanceArgs,

        /// Number of seeded annealing runs
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Seed of the first annealing run
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Run the solvers in parallel
        #[arg(long)]
        parallel: bool,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run comparisons on a directory of instances
    Benchmark {
        /// Directory containing .tsp files
        #[arg(short, long)]
        dir: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Number of seeded annealing runs per instance
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Run the solvers of each instance in parallel
        #[arg(long)]
        parallel: bool,

        /// Maximum instance size
        #[arg(long)]
        max_size: Option<usize>,
    },

    /// Analyze an instance
    Analyze {
        #[command(flatten)]
        source: InstanceArgs,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Algorithm {
    /// Exhaustive enumeration (exact)
    BruteForce,
    /// Held-Karp dynamic programming (exact)
    HeldKarp,
    /// Nearest Neighbor construction
    Nn,
    /// Nearest Neighbor choosing among the closest candidates at random
    NnRandomized,
    /// Nearest Neighbor from every start city
    NnMultiStart,
    /// Nearest Neighbor followed by 2-opt
    NnTwoOpt,
    /// Simulated Annealing
    Sa,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Solve {
            source,
            algorithm,
            start_city,
            max_iterations,
            best_improvement,
            initial_temp,
            cooling_rate,
            min_temp,
            seed,
            output,
        } => {
            let two_opt = if best_improvement {
                TwoOptSearch::best_improvement()
            } else {
                TwoOptSearch::first_improvement()
            }
            .with_max_iterations(max_iterations);
            let construction = NearestNeighborHeuristic {
                start_city,
                ..NearestNeighborHeuristic::randomized(seed)
            };
            let solver: Box<dyn TspSolver> = match algorithm {
                Algorithm::BruteForce => Box::new(BruteForceSolver::new()),
                Algorithm::HeldKarp => Box::new(HeldKarpSolver::new()),
                Algorithm::Nn => Box::new(NearestNeighborHeuristic::from_city(start_city)),
                Algorithm::NnRandomized => Box::new(construction),
                Algorithm::NnMultiStart => Box::new(MultiStartNearestNeighbor::new()),
                Algorithm::NnTwoOpt => Box::new(NearestNeighborTwoOpt::new(
                    NearestNeighborHeuristic::from_city(start_city),
                    two_opt,
                )),
                Algorithm::Sa => Box::new(SimulatedAnnealing::with_params(
                    initial_temp,
                    cooling_rate,
                    min_temp,
                    seed,
                )),
            };
            source
                .load()
                .and_then(|instance| solve_instance(&instance, solver.as_ref(), output.as_deref()))
        }

        Commands::Compare { source, runs, seed, parallel, output } => {
            let config = ComparisonConfig {
                runs,
                seed,
                parallel,
                ..Default::default()
            };
            source
                .load()
                .and_then(|instance| compare_algorithms(&instance, config, output.as_deref()))
        }

        Commands::Benchmark { dir, output, runs, parallel, max_size } => {
            let config = ComparisonConfig {
                runs,
                parallel,
                ..Default::default()
            };
            run_benchmark(&dir, &output, config, max_size)
        }

        Commands::Analyze { source } => source.load().map(|instance| analyze_instance(&instance)),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn solve_instance(instance: &Instance, solver: &dyn TspSolver, output: Option<&Path>) -> Result<()> {
    println!("{}", instance.statistics());
    println!("Solving with {}...", solver.name());

    let solution = solver.solve(&instance.distance_matrix)?;

    println!("\n========== Results ==========");
    print!("{}", solution);

    if let Some(out_path) = output {
        write_json(&solution, out_path)?;
        println!("\nSolution saved to {:?}", out_path);
    }
    Ok(())
}

fn write_json(solution: &Solution, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(solution).map_err(|e| TspError::Io(e.to_string()))?;
    std::fs::write(path, json)?;
    Ok(())
}

fn compare_algorithms(instance: &Instance, config: ComparisonConfig, output: Option<&Path>) -> Result<()> {
    println!("{}", instance.statistics());

    let mut comparison = Comparison::new(config);
    let results = comparison.run_instance(instance)?;

    println!(
        "{:<4} {:<28} {:>12} {:>10} {:>12} {:>14}",
        "Rank", "Algorithm", "Distance", "Quality", "Time (s)", "Status"
    );
    println!("{}", "-".repeat(84));
    for result in &results {
        println!(
            "{:<4} {:<28} {:>12.2} {:>9.1}% {:>12.6} {:>14}",
            result.rank, result.algorithm, result.cost, result.quality, result.time, result.status
        );
    }

    if let Some(path) = output {
        comparison.export_to_csv(path)?;
        println!("\nResults exported to {:?}", path);
    }
    Ok(())
}

fn run_benchmark(dir: &Path, output: &Path, config: ComparisonConfig, max_size: Option<usize>) -> Result<()> {
    println!("Loading instances from {:?}...", dir);

    let mut instances = load_instances_from_dir(dir)?;
    if let Some(max) = max_size {
        instances.retain(|i| i.dimension() <= max);
    }

    println!("Found {} instances", instances.len());
    if instances.is_empty() {
        return Err(TspError::InvalidConfig(format!("no .tsp instances in {:?}", dir)));
    }

    std::fs::create_dir_all(output)?;

    let mut comparison = Comparison::new(config);
    let progress = ProgressBar::new(instances.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    for instance in &instances {
        progress.set_message(format!("{} (n={})", instance.name, instance.dimension()));
        comparison.run_instance(instance)?;
        progress.inc(1);
    }
    progress.finish_with_message("done");
    println!("Recorded {} runs", comparison.results().len());

    let results_path = output.join("results.csv");
    comparison.export_to_csv(&results_path)?;
    println!("\nResults exported to {:?}", results_path);

    let stats_path = output.join("statistics.csv");
    comparison.export_statistics_csv(&stats_path)?;
    println!("Statistics exported to {:?}", stats_path);

    let report = comparison.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    std::fs::write(&report_path, &report)?;
    println!("Report saved to {:?}", report_path);
    Ok(())
}

fn analyze_instance(instance: &Instance) {
    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    let n = instance.dimension();
    match distinct_tour_count(n) {
        Some(count) => println!("Distinct tours: {}", count),
        None => println!("Distinct tours: more than {}", u64::MAX),
    }

    println!("Solver suitability:");
    println!(
        "  Enumeration:  {}",
        if n <= BruteForceSolver::PRACTICAL_LIMIT { "practical" } else { "impractical (O(n!))" }
    );
    println!(
        "  Held-Karp:    {}",
        if n <= HeldKarpSolver::PRACTICAL_LIMIT { "practical" } else { "impractical (O(n^2 * 2^n))" }
    );
    if let Some(states) = HeldKarpSolver::table_len(n) {
        println!("  Held-Karp states: {}", states);
    }

    let matrix = &instance.distance_matrix;
    if let Ok(nn) = NearestNeighborHeuristic::new().solve(matrix) {
        println!("\nQuick Solution Estimates:");
        println!("  Nearest Neighbor: {:.2}", nn.cost);
        if let Ok(improved) = NearestNeighborTwoOpt::default().solve(matrix) {
            println!("  Nearest Neighbor + 2-Opt: {:.2}", improved.cost);
        }
    }
}
