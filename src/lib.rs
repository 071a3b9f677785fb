//! coverage-planner core
//!
//! Multi-vehicle tours under a back-covered constraint: whenever a vehicle
//! arrives at a node, every other moving vehicle must be within a coverage
//! radius of it. Tours keep their cost and arrival timeline up to date
//! incrementally; solutions aggregate the timelines and check coverage.

pub mod error;
pub mod geometry;
pub mod traits;
pub mod euclidean;
pub mod instance;
pub mod tour;
pub mod solution;
pub mod local_search;
pub mod construction;
pub mod solver;
pub mod polyline;
pub mod export;

pub use error::{PlannerError, Result};
pub use instance::MatrixInstance;
pub use solution::{Event, Solution};
pub use solver::{PlannerResult, SolveOptions, solve};
pub use tour::{Edge, Tour, TourState};
