//! Planar coordinates and the distance helpers used by the coverage model.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A point in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Point at `fraction` of the way from `self` to `to`.
    pub fn lerp(self, to: Coord, fraction: f64) -> Coord {
        self + (to - self) * fraction
    }
}

impl Add for Coord {
    type Output = Coord;

    fn add(self, other: Coord) -> Coord {
        Coord::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Coord {
    type Output = Coord;

    fn sub(self, other: Coord) -> Coord {
        Coord::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Coord {
    type Output = Coord;

    fn mul(self, factor: f64) -> Coord {
        Coord::new(self.x * factor, self.y * factor)
    }
}

/// Euclidean distance between two points.
pub fn euclidean(a: Coord, b: Coord) -> f64 {
    (a - b).norm()
}

/// Euclidean distance rounded to the nearest integer.
pub fn distance(a: Coord, b: Coord) -> u32 {
    euclidean(a, b).round() as u32
}

/// Turn direction of the path `a -> b -> c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Clockwise,
    Collinear,
    CounterClockwise,
}

pub fn orientation(a: Coord, b: Coord, c: Coord) -> Orientation {
    let area = (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y);
    if area < 0.0 {
        Orientation::Clockwise
    } else if area > 0.0 {
        Orientation::CounterClockwise
    } else {
        Orientation::Collinear
    }
}
