//! Error types shared across the crate.

use std::io;

use thiserror::Error;

/// Why a directions request produced no usable geometry.
///
/// The controller collapses all of these into a single "fetch failed"
/// outcome; the variants exist for diagnostics.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("directions request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("directions service returned {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed directions response: {0}")]
    Malformed(String),
    #[error("directions response has no route geometry")]
    MissingGeometry,
    #[error("route geometry has {0} point(s), need at least 2")]
    ShortGeometry(usize),
}

/// A route resolved to fewer than two coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("route resolves to {resolved} point(s), need at least 2")]
pub struct InsufficientPoints {
    pub resolved: usize,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate location name {0:?}")]
    DuplicateLocation(String),
    #[error("duplicate vehicle id {0:?}")]
    DuplicateVehicle(String),
    #[error("failed to read registry: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse registry: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("settings io error: {0}")]
    Io(#[from] io::Error),
    #[error("settings file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("refusing to store a blank API key")]
    BlankKey,
}
