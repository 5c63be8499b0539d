//! OpenRouteService HTTP adapter for route geometry.

use geojson::{GeoJson, Value};
use serde::Serialize;
use tracing::debug;

use crate::error::FetchError;
use crate::polyline::{Coord, Polyline};
use crate::traits::GeometryFetcher;

#[derive(Debug, Clone)]
pub struct OrsConfig {
    pub base_url: String,
    pub profile: String,
    /// `None` keeps the HTTP client's default.
    pub timeout_secs: Option<u64>,
}

impl Default for OrsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openrouteservice.org".to_string(),
            profile: "driving-car".to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrsClient {
    config: OrsConfig,
    client: reqwest::blocking::Client,
}

impl OrsClient {
    pub fn new(config: OrsConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self { config, client })
    }

    pub fn directions_url(&self) -> String {
        format!(
            "{}/v2/directions/{}/geojson",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile
        )
    }
}

#[derive(Debug, Serialize)]
struct DirectionsRequest {
    coordinates: Vec<[f64; 2]>,
    instructions: bool,
}

impl DirectionsRequest {
    fn geometry_only(coordinates: &[Coord]) -> Self {
        Self {
            coordinates: coordinates.iter().map(|&(lng, lat)| [lng, lat]).collect(),
            instructions: false,
        }
    }
}

impl GeometryFetcher for OrsClient {
    fn fetch_route_geometry(&self, coordinates: &[Coord], api_key: &str) -> Result<Polyline, FetchError> {
        let url = self.directions_url();
        debug!(%url, points = coordinates.len(), "requesting route geometry");

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, api_key)
            .header(reqwest::header::ACCEPT, "application/geo+json, application/json")
            .json(&DirectionsRequest::geometry_only(coordinates))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text()?;
        parse_geometry(&body)
    }
}

/// Extracts `features[0].geometry.coordinates` from a directions response.
pub fn parse_geometry(body: &str) -> Result<Polyline, FetchError> {
    if body.trim().is_empty() {
        return Err(FetchError::Malformed("empty body".to_string()));
    }

    let geojson: GeoJson = body
        .parse()
        .map_err(|err: geojson::Error| FetchError::Malformed(err.to_string()))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(collection) => collection,
        _ => return Err(FetchError::Malformed("expected a FeatureCollection".to_string())),
    };

    let geometry = collection
        .features
        .into_iter()
        .next()
        .and_then(|feature| feature.geometry)
        .ok_or(FetchError::MissingGeometry)?;

    let positions = match geometry.value {
        Value::LineString(positions) => positions,
        _ => return Err(FetchError::MissingGeometry),
    };

    let points = positions
        .into_iter()
        .map(|position| match position.as_slice() {
            [lng, lat, ..] => Ok((*lng, *lat)),
            _ => Err(FetchError::Malformed("position with fewer than 2 values".to_string())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if points.len() < 2 {
        return Err(FetchError::ShortGeometry(points.len()));
    }

    Ok(Polyline::new(points))
}
