//! Error types for the TSP solvers.
//!
//! Structural problems (a malformed matrix, a tour that is not a permutation,
//! out-of-domain parameters) are reported before any search work starts.

use thiserror::Error;

/// Result type alias used across the crate
pub type Result<T> = std::result::Result<T, TspError>;

/// Top-level error returned by every fallible operation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TspError {
    /// The distance matrix or point set is unusable
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// A supplied tour is not a permutation of `0..n`
    #[error("invalid tour: {0}")]
    InvalidTour(#[from] TourError),

    /// A solver parameter is outside its domain
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading an instance file failed
    #[error("I/O error: {0}")]
    Io(String),

    /// An instance file is malformed
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl From<std::io::Error> for TspError {
    fn from(e: std::io::Error) -> Self {
        TspError::Io(e.to_string())
    }
}

/// Problems with the distance matrix or the coordinates it is built from
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("instance has no cities")]
    EmptyInstance,

    #[error("row {row} has {len} entries, expected {expected}")]
    NotSquare { row: usize, len: usize, expected: usize },

    #[error("non-finite value {value} at ({i}, {j})")]
    NonFinite { i: usize, j: usize, value: f64 },

    #[error("negative distance {value} at ({i}, {j})")]
    NegativeDistance { i: usize, j: usize, value: f64 },

    #[error("diagonal entry {i} is {value}, expected 0")]
    NonZeroDiagonal { i: usize, value: f64 },

    #[error("asymmetric distances: d({i}, {j}) = {forward}, d({j}, {i}) = {backward}")]
    Asymmetric { i: usize, j: usize, forward: f64, backward: f64 },

    #[error("{cities} cities exceed the {max} the subset index can address")]
    TooManyCities { cities: usize, max: usize },
}

/// Ways a tour can fail to be a permutation of `0..n`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TourError {
    #[error("tour has {actual} cities, matrix has {expected}")]
    WrongLength { expected: usize, actual: usize },

    #[error("city {city} is out of range for {cities} cities")]
    CityOutOfRange { city: usize, cities: usize },

    #[error("city {0} is visited more than once")]
    DuplicateCity(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err: TspError = TourError::DuplicateCity(3).into();
        assert_eq!(err.to_string(), "invalid tour: city 3 is visited more than once");

        let err: TspError = InputError::EmptyInstance.into();
        assert!(matches!(err, TspError::InvalidInput(InputError::EmptyInstance)));
    }
}
