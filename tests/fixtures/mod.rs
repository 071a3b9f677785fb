//! Test fixtures for coverage-planner.
//!
//! Provides small planar instances and helpers to build solutions from
//! explicit node sequences.

#![allow(dead_code)]

use coverage_planner::euclidean::EuclideanMatrix;
use coverage_planner::geometry::Coord;
use coverage_planner::traits::InstanceProvider;
use coverage_planner::{MatrixInstance, Solution};

/// Euclidean instance over `points`, depot first.
pub fn planar_instance(points: &[(f64, f64)], k: usize, r: u32) -> MatrixInstance {
    let coords = points.iter().map(|&(x, y)| Coord::new(x, y)).collect();
    MatrixInstance::from_coordinates(coords, k, r, &EuclideanMatrix::default())
        .expect("planar fixture is well formed")
}

/// Depot at the origin with `customers` nodes evenly spaced on a circle.
pub fn ring_instance(customers: usize, radius: f64, k: usize, r: u32) -> MatrixInstance {
    let mut points = vec![(0.0, 0.0)];
    for i in 0..customers {
        let angle = std::f64::consts::TAU * i as f64 / customers as f64;
        points.push((radius * angle.cos(), radius * angle.sin()));
    }
    planar_instance(&points, k, r)
}

/// Four nodes with deliberately asymmetric costs.
pub fn asymmetric_instance() -> MatrixInstance {
    let matrix = vec![
        vec![0, 10, 20, 30],
        vec![1, 0, 5, 8],
        vec![2, 7, 0, 4],
        vec![3, 9, 12, 0],
    ];
    let coords = vec![
        Coord::new(0.0, 0.0),
        Coord::new(10.0, 0.0),
        Coord::new(10.0, 10.0),
        Coord::new(0.0, 10.0),
    ];
    MatrixInstance::new(matrix, coords, 1, 100).expect("asymmetric fixture is well formed")
}

/// Solution with one vehicle per sequence, each built by `push_back`.
pub fn solution_from<'a>(instance: &'a MatrixInstance, sequences: &[&[usize]]) -> Solution<'a, MatrixInstance> {
    let mut solution = Solution::new(instance);
    for _ in sequences {
        solution.create_vehicle();
    }
    solution.set_radius(instance.r());
    solution
        .batch(|s| {
            for (vehicle, sequence) in sequences.iter().enumerate() {
                for &node in *sequence {
                    s.push_back(vehicle, node)?;
                }
            }
            Ok(())
        })
        .expect("fixture sequences are valid");
    solution
}

