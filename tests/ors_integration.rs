//! OrsClient against a WireMock container standing in for OpenRouteService.
//!
//! Needs Docker: `cargo test -- --ignored`.

use std::time::{Duration, Instant};

use testcontainers::core::IntoContainerPort;
use testcontainers::runners::SyncRunner;
use testcontainers::{Container, GenericImage, ImageExt, TestcontainersError};

use fleet_routes::controller::{GeometryResult, RouteSelectionController};
use fleet_routes::error::FetchError;
use fleet_routes::ors::{OrsClient, OrsConfig};
use fleet_routes::registry::Registry;
use fleet_routes::traits::GeometryFetcher;

mod fixtures;

use fixtures::RecordingSurface;

const DIRECTIONS_PATH: &str = "/v2/directions/driving-car/geojson";

fn wiremock_container() -> Result<(Container<GenericImage>, String), TestcontainersError> {
    let image = GenericImage::new("wiremock/wiremock", "3.9.1")
        .with_exposed_port(8080.tcp())
        .with_startup_timeout(Duration::from_secs(60));

    let container = image.start()?;
    let port = container.get_host_port_ipv4(8080.tcp())?;
    let base_url = format!("http://127.0.0.1:{}", port);

    Ok((container, base_url))
}

fn wait_until_ready(http: &reqwest::blocking::Client, base_url: &str) {
    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(30) {
        let ready = http
            .get(format!("{}/__admin/health", base_url))
            .send()
            .map(|resp| resp.status().is_success())
            .unwrap_or(false);
        if ready {
            return;
        }
        std::thread::sleep(Duration::from_millis(500));
    }
    panic!("WireMock did not become ready at {}", base_url);
}

fn stub(http: &reqwest::blocking::Client, base_url: &str, api_key: &str, status: u16, body: serde_json::Value) {
    let mapping = serde_json::json!({
        "request": {
            "method": "POST",
            "urlPath": DIRECTIONS_PATH,
            "headers": { "Authorization": { "equalTo": api_key } },
            "bodyPatterns": [{ "equalToJson": { "instructions": false }, "ignoreExtraElements": true }]
        },
        "response": {
            "status": status,
            "headers": { "Content-Type": "application/geo+json;charset=UTF-8" },
            "jsonBody": body
        }
    });
    http.post(format!("{}/__admin/mappings", base_url))
        .json(&mapping)
        .send()
        .and_then(|resp| resp.error_for_status())
        .expect("register WireMock mapping");
}

#[test]
#[ignore = "requires docker"]
fn ors_directions_round_trip() {
    let (container, base_url) = wiremock_container().expect("start WireMock container");
    let http = reqwest::blocking::Client::new();
    wait_until_ready(&http, &base_url);

    stub(
        &http,
        &base_url,
        "good-key",
        200,
        serde_json::json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[72.88, 19.08], [73.41, 18.75], [73.86, 18.52]]
                }
            }]
        }),
    );
    stub(&http, &base_url, "spent-key", 429, serde_json::json!({ "error": "Quota exceeded" }));

    let client = OrsClient::new(OrsConfig {
        base_url: base_url.clone(),
        timeout_secs: Some(10),
        ..OrsConfig::default()
    })
    .expect("build ORS client");

    let coordinates = [(72.88, 19.08), (73.86, 18.52)];
    let polyline = client
        .fetch_route_geometry(&coordinates, "good-key")
        .expect("geometry from WireMock");
    assert_eq!(polyline.len(), 3);

    let err = client.fetch_route_geometry(&coordinates, "spent-key").unwrap_err();
    assert!(matches!(err, FetchError::Status(status) if status.as_u16() == 429));

    let controller = RouteSelectionController::new(
        Registry::demo().expect("demo registry"),
        client,
        RecordingSurface::default(),
        Some("good-key".to_string()),
    );
    controller.select(Some("V003")).wait();
    assert!(matches!(controller.result(), Some(GeometryResult::Available(_))));
    assert_eq!(controller.with_surface(|s| s.lines.len()), 1);

    drop(container);
}
