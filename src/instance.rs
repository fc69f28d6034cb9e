//! Module for representing TSP instances and their distance model.
//!
//! A caller builds a `DistanceMatrix` once per problem, either from Euclidean
//! coordinates or from a validated general matrix, and then hands it read-only
//! to any of the solvers. Instances can also be read from TSP-LIB style
//! coordinate files or generated at random from a seed.

use crate::error::{InputError, Result, TspError};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Relative tolerance used when checking that a supplied matrix is symmetric
pub const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// A city location in the plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Symmetric n×n table of non-negative distances, stored row-major.
///
/// Built once and never mutated afterwards, so a single matrix can be shared
/// between solvers running on different threads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// The degenerate zero-city matrix. Solvers return an empty tour of length 0 for it.
    pub fn empty() -> Self {
        DistanceMatrix { n: 0, data: Vec::new() }
    }

    /// Compute the Euclidean distance matrix for a set of points.
    ///
    /// Fails if a coordinate is non-finite or a distance overflows to infinity.
    pub fn from_points(points: &[Point]) -> Result<Self> {
        if points.is_empty() {
            return Err(InputError::EmptyInstance.into());
        }
        if let Some(i) = points.iter().position(|p| !p.is_finite()) {
            let value = if points[i].x.is_finite() { points[i].y } else { points[i].x };
            return Err(InputError::NonFinite { i, j: i, value }.into());
        }

        let n = points.len();
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            for j in i + 1..n {
                let d = points[i].distance_to(&points[j]);
                if !d.is_finite() {
                    return Err(InputError::NonFinite { i, j, value: d }.into());
                }
                data[i * n + j] = d;
                data[j * n + i] = d;
            }
        }

        Ok(DistanceMatrix { n, data })
    }

    /// Validate a caller-supplied matrix.
    ///
    /// Rejects empty, non-square, non-finite, negative, non-zero diagonal and
    /// asymmetric (beyond [`SYMMETRY_TOLERANCE`]) input.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(InputError::EmptyInstance.into());
        }

        let mut data = Vec::with_capacity(n * n);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n {
                return Err(InputError::NotSquare { row: i, len: row.len(), expected: n }.into());
            }
            for (j, &value) in row.iter().enumerate() {
                if !value.is_finite() {
                    return Err(InputError::NonFinite { i, j, value }.into());
                }
                if value < 0.0 {
                    return Err(InputError::NegativeDistance { i, j, value }.into());
                }
                if i == j && value != 0.0 {
                    return Err(InputError::NonZeroDiagonal { i, value }.into());
                }
            }
            data.extend(row);
        }

        for i in 0..n {
            for j in i + 1..n {
                let forward = data[i * n + j];
                let backward = data[j * n + i];
                let scale = forward.abs().max(backward.abs()).max(1.0);
                if (forward - backward).abs() > SYMMETRY_TOLERANCE * scale {
                    return Err(InputError::Asymmetric { i, j, forward, backward }.into());
                }
            }
        }

        Ok(DistanceMatrix { n, data })
    }

    /// Number of cities
    #[inline]
    pub fn dimension(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Get the distance between two cities
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }
}

/// Number of distinct undirected tours through `n` cities, `(n-1)!/2`.
///
/// Returns `None` once the count no longer fits in a `u64` (n > 21).
pub fn distinct_tour_count(n: usize) -> Option<u64> {
    if n < 3 {
        return Some(1);
    }
    let mut count: u64 = 1;
    for k in 2..n as u64 {
        count = count.checked_mul(k)?;
    }
    Some(count / 2)
}

/// A named set of cities with its precomputed distance matrix
#[derive(Debug, Clone, Serialize)]
pub struct Instance {
    /// Name of the instance
    pub name: String,
    /// Comment/description
    pub comment: String,
    /// City coordinates, 0-indexed
    pub points: Vec<Point>,
    /// Precomputed distance matrix
    #[serde(skip)]
    pub distance_matrix: DistanceMatrix,
}

impl Instance {
    /// Build an instance from coordinates
    pub fn new(name: &str, points: Vec<Point>) -> Result<Self> {
        let distance_matrix = DistanceMatrix::from_points(&points)?;
        Ok(Instance {
            name: name.to_string(),
            comment: String::new(),
            points,
            distance_matrix,
        })
    }

    /// Generate `n` cities uniformly in `[0, max_coord)²`. Deterministic via seed.
    pub fn random_uniform(n: usize, max_coord: f64, seed: u64) -> Result<Self> {
        if !(max_coord.is_finite() && max_coord > 0.0) {
            return Err(TspError::InvalidConfig(format!(
                "max coordinate must be positive, got {}",
                max_coord
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let points = (0..n)
            .map(|_| Point::new(rng.gen_range(0.0..max_coord), rng.gen_range(0.0..max_coord)))
            .collect();

        Self::new(&format!("random-{}-s{}", n, seed), points)
    }

    /// Parse an instance from a TSP-LIB style coordinate file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        let mut instance = Self::from_reader(BufReader::new(file))?;
        if instance.name.is_empty() {
            instance.name = path
                .as_ref()
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(instance)
    }

    /// Parse the `NAME`, `COMMENT`, `DIMENSION` headers and the `NODE_COORD_SECTION`.
    ///
    /// Other headers and sections are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut name = String::new();
        let mut comment = String::new();
        let mut dimension: Option<usize> = None;
        let mut points = Vec::new();
        let mut in_coords = false;

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }
            if line == "EOF" {
                break;
            }

            if let Some((key, value)) = line.split_once(':') {
                let value = value.trim();
                match key.trim() {
                    "NAME" => name = value.to_string(),
                    "COMMENT" => comment = value.to_string(),
                    "DIMENSION" => {
                        let d = value.parse().map_err(|_| TspError::Parse {
                            line: line_no,
                            message: format!("invalid dimension '{}'", value),
                        })?;
                        dimension = Some(d);
                    }
                    _ => {}
                }
                in_coords = false;
                continue;
            }

            if line.ends_with("_SECTION") {
                in_coords = line == "NODE_COORD_SECTION";
                continue;
            }

            if in_coords {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < 3 {
                    return Err(TspError::Parse {
                        line: line_no,
                        message: format!("expected 'id x y', got '{}'", line),
                    });
                }
                let coord = |s: &str| {
                    s.parse::<f64>().map_err(|_| TspError::Parse {
                        line: line_no,
                        message: format!("invalid coordinate '{}'", s),
                    })
                };
                points.push(Point::new(coord(parts[1])?, coord(parts[2])?));
            }
        }

        if let Some(d) = dimension {
            if d != points.len() {
                return Err(TspError::Parse {
                    line: 0,
                    message: format!("DIMENSION is {} but {} coordinates were read", d, points.len()),
                });
            }
        }

        let mut instance = Self::new(&name, points)?;
        instance.comment = comment;
        Ok(instance)
    }

    /// Number of cities
    pub fn dimension(&self) -> usize {
        self.points.len()
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let n = self.dimension();
        let mut distances: Vec<f64> = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in i + 1..n {
                distances.push(self.distance_matrix.distance(i, j));
            }
        }

        let (avg_distance, min_distance, max_distance) = if distances.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                distances.iter().sum::<f64>() / distances.len() as f64,
                distances.iter().cloned().fold(f64::INFINITY, f64::min),
                distances.iter().cloned().fold(0.0, f64::max),
            )
        };

        InstanceStatistics {
            name: self.name.clone(),
            dimension: n,
            distinct_tours: distinct_tour_count(n),
            avg_distance,
            min_distance,
            max_distance,
        }
    }
}

/// Statistics about a TSP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    /// `None` when the count overflows a `u64`
    pub distinct_tours: Option<u64>,
    pub avg_distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Cities: {}", self.dimension)?;
        match self.distinct_tours {
            Some(count) => writeln!(f, "  Distinct tours: {}", count)?,
            None => writeln!(f, "  Distinct tours: more than {}", u64::MAX)?,
        }
        writeln!(f, "  Avg distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Min distance: {:.2}", self.min_distance)?;
        writeln!(f, "  Max distance: {:.2}", self.max_distance)
    }
}
