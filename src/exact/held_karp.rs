//! Held-Karp dynamic programming.
//!
//! City 0 is the fixed start. A state is a subset of the other cities plus the
//! last city visited in it; its value is the shortest path from city 0 through
//! exactly that subset ending at the last city. States live in one dense table
//! indexed by `mask * n + last`, where bit `c - 1` of `mask` stands for city `c`.
//! Subsets are processed in strictly increasing size, so the recurrence only
//! ever reads finished states.
//!
//! Time is O(n² · 2ⁿ) and memory O(n · 2ⁿ); about 20 cities is the practical
//! ceiling.

use crate::error::{InputError, Result};
use crate::instance::DistanceMatrix;
use crate::solution::{Solution, SolveStatus, TspSolver};
use std::time::Instant;

/// Exact solver using subset dynamic programming
#[derive(Debug, Clone, Copy, Default)]
pub struct HeldKarpSolver;

impl HeldKarpSolver {
    /// Largest instance this solver is meant for. Not enforced.
    pub const PRACTICAL_LIMIT: usize = 20;

    pub fn new() -> Self {
        HeldKarpSolver
    }

    /// Number of `(mask, last)` cells needed for `n` cities, if it is addressable
    pub fn table_len(n: usize) -> Option<usize> {
        if n == 0 {
            return Some(0);
        }
        let masks = 1usize.checked_shl((n - 1) as u32)?;
        masks.checked_mul(n)
    }

    /// Largest city count whose table size fits in a `usize`
    pub fn max_addressable_cities() -> usize {
        (1..=usize::BITS as usize)
            .take_while(|&n| Self::table_len(n).is_some())
            .last()
            .unwrap_or(0)
    }
}

/// Cities (1-based) whose bits are set in `mask`, ascending
fn cities(mask: usize) -> impl Iterator<Item = usize> {
    let mut bits = mask;
    std::iter::from_fn(move || {
        if bits == 0 {
            return None;
        }
        let bit = bits.trailing_zeros() as usize;
        bits &= bits - 1;
        Some(bit + 1)
    })
}

/// All `width`-bit masks with exactly `size` bits set, in increasing order (Gosper's hack)
struct SubsetsOfSize {
    current: usize,
    limit: usize,
}

impl SubsetsOfSize {
    fn new(width: usize, size: usize) -> Self {
        SubsetsOfSize {
            current: (1usize << size) - 1,
            limit: 1usize << width,
        }
    }
}

impl Iterator for SubsetsOfSize {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.current >= self.limit {
            return None;
        }
        let out = self.current;
        let lowest = out & out.wrapping_neg();
        let ripple = out + lowest;
        self.current = (((ripple ^ out) >> 2) / lowest) | ripple;
        Some(out)
    }
}

impl TspSolver for HeldKarpSolver {
    fn solve(&self, matrix: &DistanceMatrix) -> Result<Solution> {
        let start = Instant::now();
        let n = matrix.dimension();

        if n <= 1 {
            let mut solution =
                Solution::from_tour(matrix, (0..n).collect(), self.name(), SolveStatus::Optimal)?;
            solution.computation_time = start.elapsed().as_secs_f64();
            return Ok(solution);
        }

        let table_len = Self::table_len(n).ok_or(InputError::TooManyCities {
            cities: n,
            max: Self::max_addressable_cities(),
        })?;
        if n > Self::PRACTICAL_LIMIT {
            log::warn!(
                "Held-Karp on {} cities exceeds the practical limit of {} ({} states)",
                n,
                Self::PRACTICAL_LIMIT,
                table_len
            );
        }

        let width = n - 1;
        let full = (1usize << width) - 1;
        let mut cost = vec![f64::INFINITY; table_len];
        // n < usize::BITS here, so every city index fits in a u8
        let mut parent = vec![0u8; table_len];
        let mut transitions: u64 = 0;

        for city in 1..n {
            cost[(1 << (city - 1)) * n + city] = matrix.distance(0, city);
        }

        for size in 2..=width {
            for mask in SubsetsOfSize::new(width, size) {
                for last in cities(mask) {
                    let prev_mask = mask & !(1 << (last - 1));
                    let mut best = f64::INFINITY;
                    let mut best_prev = 0;

                    for prev in cities(prev_mask) {
                        let candidate = cost[prev_mask * n + prev] + matrix.distance(prev, last);
                        // the first predecessor is taken even if every path overflows to inf
                        if best_prev == 0 || candidate < best {
                            best = candidate;
                            best_prev = prev;
                        }
                        transitions += 1;
                    }

                    cost[mask * n + last] = best;
                    parent[mask * n + last] = best_prev as u8;
                }
            }
        }

        let mut best_cost = f64::INFINITY;
        let mut best_last = 1;
        for last in 1..n {
            let candidate = cost[full * n + last] + matrix.distance(last, 0);
            if candidate < best_cost {
                best_cost = candidate;
                best_last = last;
            }
        }

        let mut tour = Vec::with_capacity(n);
        let mut mask = full;
        let mut current = best_last;
        while current != 0 {
            tour.push(current);
            let prev = parent[mask * n + current] as usize;
            mask &= !(1 << (current - 1));
            current = prev;
        }
        tour.push(0);
        tour.reverse();

        log::debug!(
            "Held-Karp filled {} states with {} transitions, best {:.4}",
            table_len,
            transitions,
            best_cost
        );

        let mut solution = Solution::from_tour(matrix, tour, self.name(), SolveStatus::Optimal)?;
        solution.iterations = Some(transitions);
        solution.computation_time = start.elapsed().as_secs_f64();
        Ok(solution)
    }

    fn name(&self) -> &str {
        "HeldKarp"
    }
}
