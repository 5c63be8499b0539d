//! Terminal preview of route geometry.
//!
//! ```text
//! route-preview list
//! route-preview show <vehicle-id>
//! route-preview all
//! route-preview set-key <key>
//! route-preview clear-key
//! ```
//!
//! `ROUTE_PREVIEW_REGISTRY` points at a registry JSON file (defaults to the
//! built-in data); `ROUTE_PREVIEW_SETTINGS` overrides where a saved key lives.

use anyhow::{Context, Result, bail};
use geojson::{Feature, FeatureCollection, Geometry, Value};
use tracing::info;

use fleet_routes::config::ApiKeyStore;
use fleet_routes::controller::{GeometryResult, RouteSelectionController};
use fleet_routes::ors::{OrsClient, OrsConfig};
use fleet_routes::polyline::Polyline;
use fleet_routes::registry::Registry;
use fleet_routes::surface::{LineFeature, PointFeature, Popup};
use fleet_routes::traits::MapSurface;

const DEFAULT_SETTINGS_PATH: &str = ".fleet-routes/settings.json";

/// Logs what a real map would draw.
#[derive(Default)]
struct LogSurface {
    lines: usize,
}

impl MapSurface for LogSurface {
    fn draw_points(&mut self, points: Vec<PointFeature>) {
        info!(count = points.len(), "drawing city markers");
    }

    fn draw_line(&mut self, line: LineFeature) {
        self.lines += 1;
        info!(feature = ?line.id, points = line.points.len(), solid = line.style.is_solid(), "drawing route line");
    }

    fn clear_lines(&mut self) {
        self.lines = 0;
    }

    fn show_popup(&mut self, popup: Popup) {
        info!(text = %popup.text, "popup");
    }

    fn center_on(&mut self, position: (f64, f64)) {
        info!(x = position.0, y = position.1, "centering view");
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let _ = tracing_subscriber::fmt::try_init();
    let args: Vec<String> = std::env::args().collect();

    let settings_path =
        std::env::var("ROUTE_PREVIEW_SETTINGS").unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.to_string());
    let keys = ApiKeyStore::new(settings_path);

    match args.get(1).map(|s| s.as_str()) {
        Some("list") | None => list(&load_registry()?),
        Some("show") => {
            let vehicle_id = args.get(2).context("usage: route-preview show <vehicle-id>")?;
            show(load_registry()?, &keys, vehicle_id)
        }
        Some("all") => all(load_registry()?, &keys),
        Some("set-key") => {
            let key = args.get(2).context("usage: route-preview set-key <key>")?;
            keys.save_override(key)?;
            println!("saved API key to {}", keys.override_path().display());
            Ok(())
        }
        Some("clear-key") => {
            keys.clear_override()?;
            println!("removed saved API key");
            Ok(())
        }
        Some(other) => bail!("unknown command {other:?}"),
    }
}

fn load_registry() -> Result<Registry> {
    match std::env::var("ROUTE_PREVIEW_REGISTRY") {
        Ok(path) => Registry::from_path(&path).with_context(|| format!("loading registry from {path}")),
        Err(_) => Registry::demo().context("building demo registry"),
    }
}

fn build_controller(registry: Registry, keys: &ApiKeyStore) -> Result<RouteSelectionController<OrsClient, LogSurface>> {
    let client = OrsClient::new(OrsConfig::default()).context("building HTTP client")?;
    Ok(RouteSelectionController::new(registry, client, LogSurface::default(), keys.current()))
}

fn list(registry: &Registry) -> Result<()> {
    for route in registry.routes() {
        let points = match registry.coordinates_for_route(route) {
            Ok(coordinates) => coordinates.len().to_string(),
            Err(err) => err.to_string(),
        };
        println!("{}\t{:?} -> {:?}\t{}", route.vehicle_id, route.start, route.end, points);
    }
    Ok(())
}

fn show(registry: Registry, keys: &ApiKeyStore, vehicle_id: &str) -> Result<()> {
    let controller = build_controller(registry, keys)?;
    controller.select(Some(vehicle_id)).wait();
    eprintln!("{}", controller.status_text());

    let result = controller.result();
    if let Some(polyline) = result.as_ref().and_then(GeometryResult::polyline) {
        let collection = FeatureCollection {
            bbox: None,
            features: vec![line_feature(vehicle_id, polyline)],
            foreign_members: None,
        };
        println!("{}", serde_json::to_string_pretty(&collection)?);
    }
    Ok(())
}

fn all(registry: Registry, keys: &ApiKeyStore) -> Result<()> {
    let controller = build_controller(registry, keys)?;
    let mut features = Vec::new();
    for (vehicle_id, result) in controller.resolve_all() {
        match result {
            GeometryResult::Available(polyline) => {
                eprintln!("{vehicle_id}: {} points", polyline.len());
                features.push(line_feature(&vehicle_id, &polyline));
            }
            GeometryResult::Unavailable(reason) => eprintln!("{vehicle_id}: {reason}"),
            GeometryResult::Unknown => eprintln!("{vehicle_id}: unresolved"),
        }
    }
    eprintln!("{} line(s) drawn", controller.with_surface(|surface| surface.lines));

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    println!("{}", serde_json::to_string_pretty(&collection)?);
    Ok(())
}

fn line_feature(vehicle_id: &str, polyline: &Polyline) -> Feature {
    let positions = polyline.points().iter().map(|&(lng, lat)| vec![lng, lat]).collect();
    let mut feature = Feature::from(Geometry::new(Value::LineString(positions)));
    feature.set_property("vehicle_id", vehicle_id);
    feature
}
