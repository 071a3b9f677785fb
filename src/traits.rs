//! Core domain traits for the coverage planner.
//!
//! The tour engine only ever reads an instance through these interfaces, so
//! callers can plug in their own cost and coordinate sources.

use crate::error::Result;
use crate::geometry::Coord;

/// Node index of the depot.
pub const DEPOT: usize = 0;

/// Read-only problem instance consumed by tours and solutions.
///
/// `Sync` is required because event distances are evaluated in parallel.
pub trait InstanceProvider: Sync {
    /// Travel cost from `from` to `to`. May be asymmetric.
    ///
    /// Fails with `NodeOutOfRange` for an invalid node id.
    fn cost(&self, from: usize, to: usize) -> Result<u32>;

    /// Planar position of a node.
    fn coordinate(&self, node: usize) -> Result<Coord>;

    /// Number of vehicles.
    fn k(&self) -> usize;

    /// Number of nodes, depot included.
    fn n(&self) -> usize;

    /// Coverage radius.
    fn r(&self) -> u32;

    /// Lower bound used by coverage-removal heuristics.
    fn coverage_lower_bound(&self, _covered: usize, _depart: usize, _arrival: usize) -> Option<f64> {
        None
    }

    /// Upper bound used by coverage-removal heuristics.
    fn coverage_upper_bound(&self, _covered: usize, _depart: usize, _arrival: usize) -> Option<f64> {
        None
    }
}

/// Provides a cost matrix for a set of locations.
///
/// The matrix is indexed by the provided location order.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, locations: &[Coord]) -> Vec<Vec<u32>>;
}
