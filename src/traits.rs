//! Seams between the controller and its collaborators.
//!
//! The controller only talks to the directions service and the map through
//! these traits, so tests and other front ends can substitute their own.

use crate::error::FetchError;
use crate::polyline::{Coord, Polyline};
use crate::projection;
use crate::surface::{LineFeature, PointFeature, Popup};

/// Fetches road-following geometry for an ordered list of coordinates.
pub trait GeometryFetcher {
    /// Callers pass at least two `(lng, lat)` coordinates.
    fn fetch_route_geometry(&self, coordinates: &[Coord], api_key: &str) -> Result<Polyline, FetchError>;
}

/// Rendering collaborator: any map toolkit that can draw points and lines.
///
/// Feature clicks flow the other way, into
/// [`RouteSelectionController::handle_feature_click`](crate::controller::RouteSelectionController::handle_feature_click).
pub trait MapSurface {
    fn draw_points(&mut self, points: Vec<PointFeature>);

    fn draw_line(&mut self, line: LineFeature);

    /// Removes every route line, leaving points in place.
    fn clear_lines(&mut self);

    fn show_popup(&mut self, _popup: Popup) {}

    fn center_on(&mut self, _position: (f64, f64)) {}

    /// Maps `(lng, lat)` into the surface's coordinate space.
    fn project(&self, coord: Coord) -> (f64, f64) {
        projection::web_mercator(coord)
    }
}
