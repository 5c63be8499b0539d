//! Polyline representation for route geometries.
//!
//! Points are `(lng, lat)` pairs, the order GeoJSON and the directions
//! service use. Projection into map space happens at the rendering seam.

use serde::{Deserialize, Serialize};

/// A `(lng, lat)` coordinate pair in degrees.
pub type Coord = (f64, f64);

/// A road-following path as an ordered list of coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Coord>,
}

impl Polyline {
    /// Creates a new Polyline from `(lng, lat)` points.
    pub fn new(points: Vec<Coord>) -> Self {
        Self { points }
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[Coord] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<Coord> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A polyline needs two points before it can be drawn as a line.
    pub fn is_drawable(&self) -> bool {
        self.points.len() >= 2
    }
}

impl From<Vec<Coord>> for Polyline {
    fn from(points: Vec<Coord>) -> Self {
        Self::new(points)
    }
}
