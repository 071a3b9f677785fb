//! Vehicle paths as straight-line polylines.

use serde::{Deserialize, Serialize};

use crate::geometry::{Coord, euclidean};

/// Coordinates a vehicle visits, in tour order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polyline {
    vertices: Vec<Coord>,
}

impl Polyline {
    pub fn new(vertices: Vec<Coord>) -> Self {
        Self { vertices }
    }

    pub fn points(&self) -> &[Coord] {
        &self.vertices
    }

    pub fn into_points(self) -> Vec<Coord> {
        self.vertices
    }

    /// Consecutive vertex pairs.
    pub fn segments(&self) -> impl Iterator<Item = (Coord, Coord)> + '_ {
        self.vertices.windows(2).map(|pair| (pair[0], pair[1]))
    }

    /// Total straight-line length.
    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| euclidean(a, b)).sum()
    }
}
