//! Test fixtures for fleet-routes.
//!
//! Provides a small Indian city registry, scripted geometry fetchers and a
//! map surface that records everything drawn on it.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use fleet_routes::error::FetchError;
use fleet_routes::polyline::{Coord, Polyline};
use fleet_routes::registry::{Endpoint, Location, Registry, RouteDefinition};
use fleet_routes::surface::{FeatureId, LineFeature, PointFeature, Popup};
use fleet_routes::traits::{GeometryFetcher, MapSurface};

pub const DELHI: Coord = (77.21, 28.61);
pub const JAIPUR: Coord = (76.61, 26.91);
pub const MUMBAI: Coord = (72.88, 19.08);
pub const PUNE: Coord = (73.86, 18.52);
pub const LONAVALA: Coord = (73.41, 18.75);

/// Delhi→Jaipur, Mumbai→Pune via Lonavala, and a route to a city that is
/// not in the registry.
pub fn india_registry() -> Registry {
    Registry::new(
        vec![
            Location::new("Delhi", DELHI.1, DELHI.0, 142),
            Location::new("Jaipur", JAIPUR.1, JAIPUR.0, 64),
            Location::new("Mumbai", MUMBAI.1, MUMBAI.0, 188),
            Location::new("Pune", PUNE.1, PUNE.0, 97),
        ],
        vec![
            RouteDefinition::new("DL-JP", Endpoint::named("Delhi"), Endpoint::named("Jaipur"), vec![]),
            RouteDefinition::new("MB-PN", Endpoint::named("Mumbai"), Endpoint::named("Pune"), vec![LONAVALA]),
            RouteDefinition::new("GHOST", Endpoint::named("Delhi"), Endpoint::named("Shimla"), vec![]),
        ],
    )
    .expect("fixture registry is valid")
}

pub fn delhi_jaipur_polyline() -> Polyline {
    Polyline::new(vec![DELHI, (76.9, 27.8), JAIPUR])
}

pub fn mumbai_pune_polyline() -> Polyline {
    Polyline::new(vec![MUMBAI, LONAVALA, (73.6, 18.6), PUNE])
}

/// Records every coordinate list it was asked to route.
pub type CallLog = Arc<Mutex<Vec<Vec<Coord>>>>;

/// Answers by the route's first coordinate, after an optional delay.
pub struct ScriptedFetcher {
    script: Vec<(Coord, Duration, Option<Polyline>)>,
    calls: CallLog,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            script: Vec::new(),
            calls: CallLog::default(),
        }
    }

    pub fn respond(mut self, first: Coord, delay: Duration, polyline: Polyline) -> Self {
        self.script.push((first, delay, Some(polyline)));
        self
    }

    pub fn fail(mut self, first: Coord, delay: Duration) -> Self {
        self.script.push((first, delay, None));
        self
    }

    pub fn calls(&self) -> CallLog {
        Arc::clone(&self.calls)
    }
}

impl GeometryFetcher for ScriptedFetcher {
    fn fetch_route_geometry(&self, coordinates: &[Coord], _api_key: &str) -> Result<Polyline, FetchError> {
        self.calls.lock().unwrap().push(coordinates.to_vec());

        let entry = self.script.iter().find(|(first, _, _)| Some(first) == coordinates.first());
        match entry {
            Some((_, delay, response)) => {
                thread::sleep(*delay);
                response.clone().ok_or(FetchError::MissingGeometry)
            }
            None => Err(FetchError::MissingGeometry),
        }
    }
}

/// Always fails, like a directions service answering 429.
#[derive(Default)]
pub struct FailingFetcher {
    calls: CallLog,
}

impl FailingFetcher {
    pub fn calls(&self) -> CallLog {
        Arc::clone(&self.calls)
    }
}

impl GeometryFetcher for FailingFetcher {
    fn fetch_route_geometry(&self, coordinates: &[Coord], _api_key: &str) -> Result<Polyline, FetchError> {
        self.calls.lock().unwrap().push(coordinates.to_vec());
        Err(FetchError::Status(reqwest::StatusCode::TOO_MANY_REQUESTS))
    }
}

/// Map surface that keeps what is currently drawn plus a full draw history.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub points: Vec<PointFeature>,
    pub lines: Vec<LineFeature>,
    pub drawn: Vec<FeatureId>,
    pub popups: Vec<Popup>,
    pub centers: Vec<(f64, f64)>,
}

impl MapSurface for RecordingSurface {
    fn draw_points(&mut self, points: Vec<PointFeature>) {
        self.points.extend(points);
    }

    fn draw_line(&mut self, line: LineFeature) {
        self.drawn.push(line.id.clone());
        self.lines.push(line);
    }

    fn clear_lines(&mut self) {
        self.lines.clear();
    }

    fn show_popup(&mut self, popup: Popup) {
        self.popups.push(popup);
    }

    fn center_on(&mut self, position: (f64, f64)) {
        self.centers.push(position);
    }
}
