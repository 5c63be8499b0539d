//! Static city and route reference data.
//!
//! Loaded once at startup and never mutated afterwards.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{InsufficientPoints, RegistryError};
use crate::polyline::Coord;

/// A named city with its delivery volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub delivery_count: u32,
}

impl Location {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64, delivery_count: u32) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
            delivery_count,
        }
    }

    /// `(lng, lat)` pair for this location.
    pub fn coord(&self) -> Coord {
        (self.lng, self.lat)
    }
}

/// Start or end of a route: a registry city, or a raw `(lng, lat)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Endpoint {
    Named(String),
    Coordinate(Coord),
}

impl Endpoint {
    pub fn named(name: impl Into<String>) -> Self {
        Endpoint::Named(name.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub vehicle_id: String,
    pub start: Endpoint,
    pub end: Endpoint,
    #[serde(default)]
    pub waypoints: Vec<Coord>,
}

impl RouteDefinition {
    pub fn new(vehicle_id: impl Into<String>, start: Endpoint, end: Endpoint, waypoints: Vec<Coord>) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            start,
            end,
            waypoints,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    locations: Vec<Location>,
    routes: Vec<RouteDefinition>,
}

/// Lookup tables over the static locations and routes.
#[derive(Debug, Clone)]
pub struct Registry {
    locations: Vec<Location>,
    routes: Vec<RouteDefinition>,
    location_index: HashMap<String, usize>,
    route_index: HashMap<String, usize>,
}

impl Registry {
    /// Builds a registry, rejecting duplicate names and vehicle ids.
    pub fn new(locations: Vec<Location>, routes: Vec<RouteDefinition>) -> Result<Self, RegistryError> {
        let mut location_index = HashMap::with_capacity(locations.len());
        for (i, location) in locations.iter().enumerate() {
            if location_index.insert(location.name.clone(), i).is_some() {
                return Err(RegistryError::DuplicateLocation(location.name.clone()));
            }
        }

        let mut route_index = HashMap::with_capacity(routes.len());
        for (i, route) in routes.iter().enumerate() {
            if route_index.insert(route.vehicle_id.clone(), i).is_some() {
                return Err(RegistryError::DuplicateVehicle(route.vehicle_id.clone()));
            }
        }

        Ok(Self {
            locations,
            routes,
            location_index,
            route_index,
        })
    }

    /// Parses `{ "locations": [...], "routes": [...] }`.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = serde_json::from_str(json)?;
        Self::new(file.locations, file.routes)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Built-in data set used by the dashboard when no file is supplied.
    pub fn demo() -> Result<Self, RegistryError> {
        let locations = vec![
            Location::new("Delhi", 28.61, 77.21, 142),
            Location::new("Jaipur", 26.91, 76.61, 64),
            Location::new("Agra", 27.18, 78.01, 38),
            Location::new("Lucknow", 26.85, 80.95, 51),
            Location::new("Mumbai", 19.08, 72.88, 188),
            Location::new("Pune", 18.52, 73.86, 97),
            Location::new("Ahmedabad", 23.02, 72.57, 73),
            Location::new("Bangalore", 12.97, 77.59, 161),
            Location::new("Chennai", 13.08, 80.27, 119),
            Location::new("Hyderabad", 17.39, 78.49, 104),
            Location::new("Kolkata", 22.57, 88.36, 88),
        ];

        let routes = vec![
            RouteDefinition::new(
                "V001",
                Endpoint::named("Delhi"),
                Endpoint::named("Jaipur"),
                vec![(76.64, 28.19)],
            ),
            RouteDefinition::new(
                "V002",
                Endpoint::named("Delhi"),
                Endpoint::named("Lucknow"),
                vec![(78.01, 27.18), (79.42, 27.16)],
            ),
            RouteDefinition::new("V003", Endpoint::named("Mumbai"), Endpoint::named("Pune"), vec![]),
            RouteDefinition::new(
                "V004",
                Endpoint::named("Bangalore"),
                Endpoint::named("Chennai"),
                vec![(78.13, 12.91)],
            ),
            RouteDefinition::new(
                "V005",
                Endpoint::named("Hyderabad"),
                Endpoint::named("Bangalore"),
                vec![(77.60, 14.68)],
            ),
            RouteDefinition::new(
                "V006",
                Endpoint::Coordinate((72.83, 21.17)),
                Endpoint::named("Ahmedabad"),
                vec![(73.18, 22.31)],
            ),
        ];

        Self::new(locations, routes)
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    pub fn route(&self, vehicle_id: &str) -> Option<&RouteDefinition> {
        self.route_index.get(vehicle_id).map(|&i| &self.routes[i])
    }

    /// Exact, case-sensitive name lookup.
    pub fn resolve_location(&self, name: &str) -> Option<&Location> {
        self.location_index.get(name).map(|&i| &self.locations[i])
    }

    pub fn resolve_endpoint(&self, endpoint: &Endpoint) -> Option<Coord> {
        match endpoint {
            Endpoint::Named(name) => self.resolve_location(name).map(Location::coord),
            Endpoint::Coordinate(coord) => Some(*coord),
        }
    }

    /// Start, waypoints in order, then end.
    ///
    /// Named endpoints that do not resolve are left out; the result is
    /// insufficient when fewer than two points remain.
    pub fn coordinates_for_route(&self, route: &RouteDefinition) -> Result<Vec<Coord>, InsufficientPoints> {
        let start = self.resolve_endpoint(&route.start);
        let end = self.resolve_endpoint(&route.end);

        let mut coordinates = Vec::with_capacity(route.waypoints.len() + 2);
        coordinates.extend(start);
        coordinates.extend(route.waypoints.iter().copied());
        coordinates.extend(end);

        if coordinates.len() < 2 {
            return Err(InsufficientPoints {
                resolved: coordinates.len(),
            });
        }
        Ok(coordinates)
    }

    /// Midpoint between the resolved start and end, if both resolve.
    pub fn route_midpoint(&self, route: &RouteDefinition) -> Option<Coord> {
        let (start_lng, start_lat) = self.resolve_endpoint(&route.start)?;
        let (end_lng, end_lat) = self.resolve_endpoint(&route.end)?;
        Some(((start_lng + end_lng) / 2.0, (start_lat + end_lat) / 2.0))
    }
}
