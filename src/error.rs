//! Error type shared by the tour engine, the solution aggregator and the
//! loaders around them.

use thiserror::Error;

/// Errors raised by planner operations.
///
/// Every error is raised at the point of detection. Mutators validate their
/// arguments before touching state, so a failed call leaves the tour or
/// solution exactly as it was.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("position {pos} is out of range for a tour of {len} nodes")]
    PositionOutOfRange { pos: usize, len: usize },

    #[error("tour has no nodes")]
    EmptyTour,

    /// Interior removal needs a predecessor and a successor.
    #[error("tour of {len} nodes is too short for an interior removal")]
    TourTooShort { len: usize },

    #[error("invalid range {pos_i}..={pos_e} for a tour of {len} nodes")]
    InvalidRange { pos_i: usize, pos_e: usize, len: usize },

    #[error("vehicle {vehicle} not found ({count} vehicles)")]
    VehicleNotFound { vehicle: usize, count: usize },

    #[error("event {index} out of range ({count} events)")]
    EventOutOfRange { index: usize, count: usize },

    #[error("vehicle {vehicle} has no event at time {time}")]
    EventNotFound { vehicle: usize, time: u64 },

    #[error("node {node} out of range ({count} nodes)")]
    NodeOutOfRange { node: usize, count: usize },

    #[error("invalid instance: {0}")]
    InvalidInstance(String),

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("invalid move: {0}")]
    InvalidMove(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
