//! Exact solvers module.
//!
//! Both solvers guarantee a globally optimal tour and both blow up
//! exponentially; pick them by instance size, they do not refuse large input.

mod brute_force;
mod held_karp;

pub use brute_force::BruteForceSolver;
pub use held_karp::HeldKarpSolver;
