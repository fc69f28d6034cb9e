use proptest::prelude::*;
use tsp_solver::heuristics::MultiStartNearestNeighbor;
use tsp_solver::{
    improve_two_opt, solve_exact_enumeration, solve_held_karp, solve_nearest_neighbor,
    solve_simulated_annealing, tour_length, DistanceMatrix, Point, TspSolver,
};

fn points(max_len: usize) -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec((0.0..100.0f64, 0.0..100.0f64), 1..=max_len)
        .prop_map(|coords| coords.into_iter().map(|(x, y)| Point::new(x, y)).collect())
}

fn is_permutation(tour: &[usize], n: usize) -> bool {
    let mut seen = vec![false; n];
    tour.len() == n && tour.iter().all(|&c| c < n && !std::mem::replace(&mut seen[c], true))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Every solver returns a permutation whose reported cost is its tour length.
    #[test]
    fn prop_solutions_are_consistent(pts in points(8), seed in any::<u64>()) {
        let matrix = DistanceMatrix::from_points(&pts).unwrap();
        let n = matrix.dimension();
        let identity: Vec<usize> = (0..n).collect();

        let solutions = vec![
            solve_exact_enumeration(&matrix).unwrap(),
            solve_held_karp(&matrix).unwrap(),
            solve_nearest_neighbor(&matrix, 0).unwrap(),
            improve_two_opt(&matrix, &identity, 1000).unwrap(),
            solve_simulated_annealing(&matrix, 100.0, 0.95, 1.0, seed).unwrap(),
            MultiStartNearestNeighbor::new().solve(&matrix).unwrap(),
        ];

        for solution in solutions {
            prop_assert!(is_permutation(&solution.tour, n), "{}: {:?}", solution.algorithm, solution.tour);
            prop_assert_eq!(solution.cost, tour_length(&solution.tour, &matrix).unwrap());
        }
    }

    /// Enumeration and Held-Karp agree, and nothing beats them.
    #[test]
    fn prop_exact_solvers_agree(pts in points(8), seed in any::<u64>()) {
        let matrix = DistanceMatrix::from_points(&pts).unwrap();
        let brute = solve_exact_enumeration(&matrix).unwrap();
        let dp = solve_held_karp(&matrix).unwrap();
        let tolerance = 1e-9 * brute.cost.max(1.0);

        prop_assert!((brute.cost - dp.cost).abs() <= tolerance);

        let greedy = solve_nearest_neighbor(&matrix, 0).unwrap();
        let annealed = solve_simulated_annealing(&matrix, 100.0, 0.95, 1.0, seed).unwrap();
        prop_assert!(greedy.cost >= dp.cost - tolerance);
        prop_assert!(annealed.cost >= dp.cost - tolerance);
    }

    /// 2-opt never lengthens its input and is a fixed point on its own output.
    #[test]
    fn prop_two_opt_monotone_and_idempotent(pts in points(25), shuffle_seed in any::<u64>()) {
        use rand::seq::SliceRandom;
        use rand::SeedableRng;

        let matrix = DistanceMatrix::from_points(&pts).unwrap();
        let mut tour: Vec<usize> = (0..matrix.dimension()).collect();
        tour.shuffle(&mut rand_chacha::ChaCha8Rng::seed_from_u64(shuffle_seed));

        let before = tour_length(&tour, &matrix).unwrap();
        let improved = improve_two_opt(&matrix, &tour, 1000).unwrap();
        prop_assert!(improved.cost <= before + 1e-9);

        let again = improve_two_opt(&matrix, &improved.tour, 1000).unwrap();
        prop_assert_eq!(&again.tour, &improved.tour);
        prop_assert_eq!(again.cost, improved.cost);
    }

    /// Same seed, same tour.
    #[test]
    fn prop_annealing_is_reproducible(pts in points(12), seed in any::<u64>()) {
        let matrix = DistanceMatrix::from_points(&pts).unwrap();
        let a = solve_simulated_annealing(&matrix, 50.0, 0.9, 1.0, seed).unwrap();
        let b = solve_simulated_annealing(&matrix, 50.0, 0.9, 1.0, seed).unwrap();
        prop_assert_eq!(a.tour, b.tour);
    }
}
