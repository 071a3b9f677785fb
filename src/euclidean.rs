//! Euclidean cost matrix provider.
//!
//! Turns planar coordinates into an integer travel-cost matrix, the way the
//! benchmark instances are usually generated when no distance file exists.

use crate::geometry::{Coord, euclidean};
use crate::traits::DistanceMatrixProvider;

/// Cost units per coordinate unit when no scale is given.
const DEFAULT_SCALE: f64 = 1.0;

/// Euclidean distance matrix provider.
///
/// Each entry is the straight-line distance multiplied by `scale` and rounded
/// to the nearest integer.
#[derive(Debug, Clone)]
pub struct EuclideanMatrix {
    /// Cost units per coordinate unit.
    pub scale: f64,
}

impl Default for EuclideanMatrix {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
        }
    }
}

impl EuclideanMatrix {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    fn scaled_cost(&self, from: Coord, to: Coord) -> u32 {
        (euclidean(from, to) * self.scale).round() as u32
    }
}

impl DistanceMatrixProvider for EuclideanMatrix {
    fn matrix_for(&self, locations: &[Coord]) -> Vec<Vec<u32>> {
        let n = locations.len();
        let mut matrix = vec![vec![0; n]; n];

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                if i != j {
                    matrix[i][j] = self.scaled_cost(*from, *to);
                }
            }
        }

        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(points: &[(f64, f64)]) -> Vec<Coord> {
        points.iter().map(|&(x, y)| Coord::new(x, y)).collect()
    }

    #[test]
    fn test_pythagorean_triples_are_exact() {
        let points = coords(&[(0.0, 0.0), (3.0, 4.0), (5.0, 12.0), (-8.0, -15.0)]);
        let matrix = EuclideanMatrix::default().matrix_for(&points);

        assert_eq!(matrix[0][1], 5);
        assert_eq!(matrix[0][2], 13);
        assert_eq!(matrix[0][3], 17);
        assert!((0..4).all(|i| matrix[i][i] == 0));
    }

    #[test]
    fn test_costs_round_to_nearest_unit() {
        let points = coords(&[(0.0, 0.0), (1.0, 1.0), (1.5, 0.0), (2.0, 2.0)]);
        let matrix = EuclideanMatrix::default().matrix_for(&points);

        assert_eq!(matrix[0][1], 1);
        assert_eq!(matrix[0][2], 2);
        assert_eq!(matrix[0][3], 3);
    }

    #[test]
    fn test_scale_applies_before_rounding() {
        let provider = EuclideanMatrix::new(10.0);
        // sqrt(2) * 10, not round(sqrt(2)) * 10
        assert_eq!(provider.scaled_cost(Coord::new(0.0, 0.0), Coord::new(1.0, 1.0)), 14);
        assert_eq!(EuclideanMatrix::new(0.5).scaled_cost(Coord::new(0.0, 0.0), Coord::new(6.0, 8.0)), 5);
    }

    #[test]
    fn test_translation_leaves_costs_unchanged() {
        let points = [(0.0, 0.0), (2.5, 7.0), (-4.0, 1.0)];
        let shifted: Vec<(f64, f64)> = points.iter().map(|&(x, y)| (x + 100.0, y - 40.0)).collect();
        let provider = EuclideanMatrix::default();

        assert_eq!(provider.matrix_for(&coords(&points)), provider.matrix_for(&coords(&shifted)));
    }

    #[test]
    fn test_rounding_bends_triangle_inequality_by_at_most_one() {
        let points = coords(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0), (0.4, 3.3), (5.0, -2.0)]);
        let matrix = EuclideanMatrix::default().matrix_for(&points);
        let n = matrix.len();

        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    assert!(matrix[i][k] <= matrix[i][j] + matrix[j][k] + 1, "{} -> {} -> {}", i, j, k);
                }
            }
        }
    }

    #[test]
    fn test_no_locations_no_matrix() {
        assert!(EuclideanMatrix::default().matrix_for(&[]).is_empty());
    }
}
