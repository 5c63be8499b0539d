//! Route selection controller.
//!
//! Tracks which route (if any) is selected, derives its coordinates from the
//! registry, runs the geometry fetch on a worker thread and tells the map
//! what to draw. Every selection change bumps a generation counter; a fetch
//! result is applied only while its generation is still current, so a slow
//! fetch for an earlier selection can never overwrite a newer one.
//!
//! Missing road geometry means no line at all. There is no straight-line
//! fallback between endpoints.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread::{self, JoinHandle};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::non_blank;
use crate::error::FetchError;
use crate::polyline::{Coord, Polyline};
use crate::registry::{Registry, RouteDefinition};
use crate::surface::{FeatureId, LineFeature, LineStyle, PointFeature, Popup};
use crate::traits::{GeometryFetcher, MapSurface};

/// Why a route has no geometry to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnavailableReason {
    NoApiKey,
    InsufficientPoints,
    FetchFailed(String),
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::NoApiKey => write!(f, "no routing API key configured"),
            UnavailableReason::InsufficientPoints => {
                write!(f, "route has fewer than two resolvable points")
            }
            UnavailableReason::FetchFailed(detail) => {
                write!(f, "road geometry could not be fetched ({detail})")
            }
        }
    }
}

/// Geometry resolution for one route.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GeometryResult {
    /// Not resolved yet, or the fetch is still in flight.
    #[default]
    Unknown,
    Available(Polyline),
    Unavailable(UnavailableReason),
}

impl GeometryResult {
    pub fn polyline(&self) -> Option<&Polyline> {
        match self {
            GeometryResult::Available(polyline) => Some(polyline),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionState {
    Idle,
    Resolving,
    ResolvedAvailable,
    ResolvedUnavailable(UnavailableReason),
}

/// Completion handle for a selection change.
///
/// Dropping it lets the fetch finish in the background.
#[derive(Debug)]
pub struct Resolution {
    worker: Option<JoinHandle<()>>,
}

impl Resolution {
    fn settled() -> Self {
        Self { worker: None }
    }

    pub fn is_pending(&self) -> bool {
        self.worker.as_ref().is_some_and(|worker| !worker.is_finished())
    }

    /// Blocks until the fetch started by this selection change has finished.
    pub fn wait(self) {
        if let Some(worker) = self.worker {
            if worker.join().is_err() {
                warn!("geometry worker panicked");
            }
        }
    }
}

/// Point-in-time copy of the controller state, taken under one lock.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSnapshot {
    pub selection: Option<String>,
    pub state: ResolutionState,
    pub result: Option<GeometryResult>,
    pub status_text: String,
}

/// Map work recorded in state order and replayed onto the surface later.
#[derive(Debug)]
enum DrawCommand {
    ClearLines,
    Line {
        vehicle_id: String,
        polyline: Polyline,
        style: LineStyle,
    },
    CenterOn(Coord),
    Popup { at: Coord, text: String },
}

impl DrawCommand {
    fn apply<M: MapSurface>(self, surface: &mut M) {
        match self {
            DrawCommand::ClearLines => surface.clear_lines(),
            DrawCommand::Line {
                vehicle_id,
                polyline,
                style,
            } => {
                let line = LineFeature::from_polyline(&vehicle_id, &polyline, style, |coord| surface.project(coord));
                surface.draw_line(line);
            }
            DrawCommand::CenterOn(coord) => {
                let position = surface.project(coord);
                surface.center_on(position);
            }
            DrawCommand::Popup { at, text } => {
                let position = surface.project(at);
                surface.show_popup(Popup { position, text });
            }
        }
    }
}

/// A geometry fetch to run off the caller's thread.
struct FetchJob {
    vehicle_id: String,
    coordinates: Vec<Coord>,
    api_key: String,
    generation: u64,
}

#[derive(Debug, Default)]
struct SelectionState {
    selection: Option<String>,
    generation: u64,
    result: GeometryResult,
    api_key: Option<String>,
    pending: Vec<DrawCommand>,
}

impl SelectionState {
    /// Supersedes whatever was in flight and wipes the drawn route lines.
    fn begin_generation(&mut self) -> u64 {
        self.generation += 1;
        self.result = GeometryResult::Unknown;
        self.pending.push(DrawCommand::ClearLines);
        self.generation
    }

    fn current_result(&self) -> Option<GeometryResult> {
        self.selection.as_ref().map(|_| self.result.clone())
    }

    fn resolution_state(&self) -> ResolutionState {
        match (&self.selection, &self.result) {
            (None, _) => ResolutionState::Idle,
            (Some(_), GeometryResult::Unknown) => ResolutionState::Resolving,
            (Some(_), GeometryResult::Available(_)) => ResolutionState::ResolvedAvailable,
            (Some(_), GeometryResult::Unavailable(reason)) => {
                ResolutionState::ResolvedUnavailable(reason.clone())
            }
        }
    }

    fn status_text(&self) -> String {
        let Some(vehicle_id) = &self.selection else {
            return "No route selected".to_string();
        };
        match &self.result {
            GeometryResult::Unknown => format!("{vehicle_id}: fetching road geometry..."),
            GeometryResult::Available(polyline) => {
                format!("{vehicle_id}: showing road geometry ({} points)", polyline.len())
            }
            GeometryResult::Unavailable(reason) => format!("{vehicle_id}: {reason}"),
        }
    }
}

/// State and surface sit behind separate locks. The state lock is never
/// held while waiting for the surface, and the surface is only touched by
/// replaying queued commands, so surface callbacks may read the controller.
struct Shared<M> {
    state: Mutex<SelectionState>,
    surface: Mutex<M>,
}

impl<M: MapSurface> Shared<M> {
    fn state(&self) -> MutexGuard<'_, SelectionState> {
        lock(&self.state)
    }

    /// Replays queued commands unless another caller holds the surface, in
    /// which case that caller replays them before letting go.
    fn flush(&self) {
        loop {
            let mut surface = match self.surface.try_lock() {
                Ok(surface) => surface,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => return,
            };
            self.drain_into(&mut surface);
            drop(surface);

            if self.state().pending.is_empty() {
                return;
            }
        }
    }

    fn drain_into(&self, surface: &mut M) {
        loop {
            let commands = std::mem::take(&mut self.state().pending);
            if commands.is_empty() {
                return;
            }
            for command in commands {
                command.apply(surface);
            }
        }
    }

    fn apply_outcome(&self, job: &FetchJob, outcome: Result<Polyline, FetchError>) {
        {
            let mut state = self.state();
            if state.generation != job.generation {
                debug!(
                    vehicle_id = %job.vehicle_id,
                    generation = job.generation,
                    current = state.generation,
                    "discarding stale geometry"
                );
                return;
            }

            match check_drawable(outcome) {
                Ok(polyline) => {
                    info!(vehicle_id = %job.vehicle_id, points = polyline.len(), "route geometry available");
                    state.pending.push(DrawCommand::Line {
                        vehicle_id: job.vehicle_id.clone(),
                        polyline: polyline.clone(),
                        style: LineStyle::selected(),
                    });
                    state.result = GeometryResult::Available(polyline);
                }
                Err(err) => {
                    warn!(vehicle_id = %job.vehicle_id, %err, "route geometry fetch failed");
                    state.result = GeometryResult::Unavailable(UnavailableReason::FetchFailed(err.to_string()));
                }
            }
        }
        self.flush();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct RouteSelectionController<F, M> {
    registry: Arc<Registry>,
    fetcher: Arc<F>,
    shared: Arc<Shared<M>>,
}

impl<F, M> RouteSelectionController<F, M>
where
    F: GeometryFetcher + Send + Sync + 'static,
    M: MapSurface + Send + 'static,
{
    /// Draws the city markers and starts out Idle.
    pub fn new(registry: Registry, fetcher: F, mut surface: M, api_key: Option<String>) -> Self {
        let points = registry
            .locations()
            .iter()
            .map(|location| PointFeature {
                id: FeatureId::City(location.name.clone()),
                position: surface.project(location.coord()),
                label: location.name.clone(),
                delivery_count: location.delivery_count,
            })
            .collect();
        surface.draw_points(points);

        Self {
            registry: Arc::new(registry),
            fetcher: Arc::new(fetcher),
            shared: Arc::new(Shared {
                state: Mutex::new(SelectionState {
                    api_key: api_key.and_then(non_blank),
                    ..SelectionState::default()
                }),
                surface: Mutex::new(surface),
            }),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn selection(&self) -> Option<String> {
        self.shared.state().selection.clone()
    }

    /// Result for the current selection; `None` while Idle.
    pub fn result(&self) -> Option<GeometryResult> {
        self.shared.state().current_result()
    }

    pub fn state(&self) -> ResolutionState {
        self.shared.state().resolution_state()
    }

    /// Human-readable status line for the dashboard.
    pub fn status_text(&self) -> String {
        self.shared.state().status_text()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let state = self.shared.state();
        ControllerSnapshot {
            selection: state.selection.clone(),
            state: state.resolution_state(),
            result: state.current_result(),
            status_text: state.status_text(),
        }
    }

    /// Runs `f` against the map surface once all queued drawing is applied.
    ///
    /// `f` may call back into the controller, including `select`; whatever
    /// it changes is drawn before this returns. Calling `with_surface` from
    /// inside `f` or from a `MapSurface` callback blocks forever.
    pub fn with_surface<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        let mut surface = lock(&self.shared.surface);
        self.shared.drain_into(&mut surface);
        let result = f(&surface);
        self.shared.drain_into(&mut surface);
        drop(surface);
        self.shared.flush();
        result
    }

    /// Changes the selection and starts resolving its geometry.
    ///
    /// `None` or an unknown vehicle id returns to Idle. Lines drawn for the
    /// previous selection are always cleared first.
    pub fn select(&self, vehicle_id: Option<&str>) -> Resolution {
        let job = {
            let mut state = self.shared.state();
            let generation = state.begin_generation();
            state.selection = None;

            match vehicle_id {
                None => {
                    debug!(generation, "selection cleared");
                    None
                }
                Some(vehicle_id) => match self.registry.route(vehicle_id) {
                    None => {
                        warn!(vehicle_id, "selected vehicle has no route");
                        None
                    }
                    Some(route) => {
                        debug!(vehicle_id, generation, "route selected");
                        state.selection = Some(route.vehicle_id.clone());
                        if let Some(midpoint) = self.registry.route_midpoint(route) {
                            state.pending.push(DrawCommand::CenterOn(midpoint));
                        }
                        self.prepare_fetch(&mut state, route, generation)
                    }
                },
            }
        };
        self.shared.flush();
        self.spawn_fetch(job)
    }

    /// Replaces the API key and re-resolves only the selected route.
    pub fn set_api_key(&self, api_key: Option<String>) -> Resolution {
        let job = {
            let mut state = self.shared.state();
            state.api_key = api_key.and_then(non_blank);

            let route = state
                .selection
                .as_deref()
                .and_then(|vehicle_id| self.registry.route(vehicle_id));
            match route {
                None => None,
                Some(route) => {
                    let generation = state.begin_generation();
                    debug!(vehicle_id = %route.vehicle_id, generation, "API key changed, re-resolving selection");
                    self.prepare_fetch(&mut state, route, generation)
                }
            }
        };
        self.shared.flush();
        self.spawn_fetch(job)
    }

    /// Map click: route lines select their route, city markers open a popup.
    pub fn handle_feature_click(&self, feature: &FeatureId) -> Option<Resolution> {
        match feature {
            FeatureId::Route(vehicle_id) => Some(self.select(Some(vehicle_id.as_str()))),
            FeatureId::City(name) => {
                let location = self.registry.resolve_location(name)?;
                self.shared.state().pending.push(DrawCommand::Popup {
                    at: location.coord(),
                    text: format!("{}: {} deliveries", location.name, location.delivery_count),
                });
                self.shared.flush();
                None
            }
        }
    }

    /// Resolves every route in parallel with the same skip rules as a
    /// selection.
    ///
    /// When nothing is selected the available lines are drawn in the
    /// unselected style. Results are not drawn if the selection changed
    /// while the batch was running.
    pub fn resolve_all(&self) -> Vec<(String, GeometryResult)> {
        let (generation, api_key) = {
            let state = self.shared.state();
            (state.generation, state.api_key.clone())
        };

        let registry = &*self.registry;
        let fetcher = &*self.fetcher;
        let results: Vec<(String, GeometryResult)> = registry
            .routes()
            .par_iter()
            .map(|route| {
                let result = resolve_route(registry, fetcher, route, api_key.as_deref());
                (route.vehicle_id.clone(), result)
            })
            .collect();

        {
            let mut state = self.shared.state();
            if state.generation != generation {
                debug!(generation, "selection changed during bulk resolution, not drawing");
                return results;
            }
            if state.selection.is_none() {
                state.pending.push(DrawCommand::ClearLines);
                for (vehicle_id, result) in &results {
                    if let GeometryResult::Available(polyline) = result {
                        state.pending.push(DrawCommand::Line {
                            vehicle_id: vehicle_id.clone(),
                            polyline: polyline.clone(),
                            style: LineStyle::unselected(),
                        });
                    }
                }
            }
        }
        self.shared.flush();
        results
    }

    /// Records the outcome for routes that cannot be fetched, otherwise
    /// returns the fetch to run.
    fn prepare_fetch(&self, state: &mut SelectionState, route: &RouteDefinition, generation: u64) -> Option<FetchJob> {
        let vehicle_id = route.vehicle_id.clone();

        let Some(api_key) = state.api_key.clone() else {
            debug!(%vehicle_id, "no API key, geometry unavailable");
            state.result = GeometryResult::Unavailable(UnavailableReason::NoApiKey);
            return None;
        };
        let coordinates = match self.registry.coordinates_for_route(route) {
            Ok(coordinates) => coordinates,
            Err(err) => {
                debug!(%vehicle_id, %err, "not enough points to route");
                state.result = GeometryResult::Unavailable(UnavailableReason::InsufficientPoints);
                return None;
            }
        };
        state.result = GeometryResult::Unknown;

        Some(FetchJob {
            vehicle_id,
            coordinates,
            api_key,
            generation,
        })
    }

    fn spawn_fetch(&self, job: Option<FetchJob>) -> Resolution {
        let Some(job) = job else {
            return Resolution::settled();
        };

        let fetcher = Arc::clone(&self.fetcher);
        let shared = Arc::clone(&self.shared);
        let generation = job.generation;
        let spawned = thread::Builder::new()
            .name(format!("geometry-{}", job.vehicle_id))
            .spawn(move || {
                let outcome = fetcher.fetch_route_geometry(&job.coordinates, &job.api_key);
                shared.apply_outcome(&job, outcome);
            });

        match spawned {
            Ok(worker) => Resolution { worker: Some(worker) },
            Err(err) => {
                warn!(%err, "could not start geometry worker");
                let mut state = self.shared.state();
                if state.generation == generation {
                    state.result = GeometryResult::Unavailable(UnavailableReason::FetchFailed(err.to_string()));
                }
                Resolution::settled()
            }
        }
    }
}

fn check_drawable(outcome: Result<Polyline, FetchError>) -> Result<Polyline, FetchError> {
    let polyline = outcome?;
    if !polyline.is_drawable() {
        return Err(FetchError::ShortGeometry(polyline.len()));
    }
    Ok(polyline)
}

fn resolve_route<F: GeometryFetcher>(
    registry: &Registry,
    fetcher: &F,
    route: &RouteDefinition,
    api_key: Option<&str>,
) -> GeometryResult {
    let Some(api_key) = api_key else {
        return GeometryResult::Unavailable(UnavailableReason::NoApiKey);
    };
    let Ok(coordinates) = registry.coordinates_for_route(route) else {
        return GeometryResult::Unavailable(UnavailableReason::InsufficientPoints);
    };

    match check_drawable(fetcher.fetch_route_geometry(&coordinates, api_key)) {
        Ok(polyline) => GeometryResult::Available(polyline),
        Err(err) => {
            warn!(vehicle_id = %route.vehicle_id, %err, "route geometry fetch failed");
            GeometryResult::Unavailable(UnavailableReason::FetchFailed(err.to_string()))
        }
    }
}
