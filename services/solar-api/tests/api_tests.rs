//! End-to-end tests against a local stand-in for the Solar API.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use geotiff_parser::{FetchConfig, RasterFetcher};
use metrics_exporter_prometheus::PrometheusBuilder;
use panel_layout::{max_panel_capacity, MAX_LAYOUT_PANELS};
use serde_json::{json, Value};
use solar_api::build_router;
use solar_api::config::SolarConfig;
use solar_api::solar_client::SolarApiClient;
use solar_api::state::AppState;
use test_utils::{
    assert_approx_eq, bounds, create_flux_band, create_half_mask, interleave_rgb, utm,
    FixtureGeoref, GeoTiffBuilder,
};
use tower::ServiceExt;

/// What the fake upstream serves. `None` layers answer HTTP 500.
#[derive(Clone)]
struct Upstream {
    base: String,
    data_layers_status: StatusCode,
    mask: Option<Vec<u8>>,
    rgb: Option<Vec<u8>>,
    flux: Option<Vec<u8>>,
    queries: Arc<Mutex<Vec<String>>>,
}

fn georef(width: usize, height: usize) -> FixtureGeoref {
    FixtureGeoref::spanning(utm::PALO_ALTO_SW, utm::PALO_ALTO_NE, width, height)
}

fn mask_tiff() -> Vec<u8> {
    let mask: Vec<u8> = create_half_mask(8, 8).into_iter().map(|v| v as u8).collect();
    GeoTiffBuilder::projected(32610, georef(8, 8)).gray_u8(8, 8, &mask)
}

fn rgb_tiff() -> Vec<u8> {
    let plane: Vec<f32> = (0..32 * 32).map(|i| (i % 256) as f32).collect();
    let samples = interleave_rgb(&plane, &plane, &vec![64.0; 32 * 32]);
    GeoTiffBuilder::projected(32610, georef(32, 32)).rgb_u8(32, 32, &samples)
}

/// True-color tile stored one plane per band.
fn planar_rgb_tiff() -> Vec<u8> {
    let red: Vec<u8> = (0..16 * 16).map(|i| (i % 256) as u8).collect();
    let green = vec![128; 16 * 16];
    let blue = vec![32; 16 * 16];
    GeoTiffBuilder::projected(32610, georef(16, 16)).planar_rgb_u8(16, 16, &red, &green, &blue)
}

fn flux_tiff() -> Vec<u8> {
    GeoTiffBuilder::projected(32610, georef(16, 16)).gray_f32(16, 16, &create_flux_band(16, 16))
}

impl Upstream {
    fn healthy() -> Self {
        Self {
            base: String::new(),
            data_layers_status: StatusCode::OK,
            mask: Some(mask_tiff()),
            rgb: Some(rgb_tiff()),
            flux: Some(flux_tiff()),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

fn layer_response(bytes: &Option<Vec<u8>>) -> Response {
    match bytes {
        Some(bytes) => bytes.clone().into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "layer store unavailable").into_response(),
    }
}

async fn upstream_handler(State(up): State<Upstream>, uri: Uri) -> Response {
    if let Some(query) = uri.query() {
        up.queries.lock().unwrap().push(format!("{}?{}", uri.path(), query));
    }
    match uri.path() {
        "/v1/dataLayers:get" if up.data_layers_status != StatusCode::OK => (
            up.data_layers_status,
            Json(json!({"error": {"code": up.data_layers_status.as_u16(), "message": "Requested entity was not found."}})),
        )
            .into_response(),
        "/v1/dataLayers:get" => Json(json!({
            "imageryQuality": "HIGH",
            "maskUrl": format!("{}/layers/mask.tif", up.base),
            "rgbUrl": format!("{}/layers/rgb.tif", up.base),
            "annualFluxUrl": format!("{}/layers/flux.tif", up.base),
            "dsmUrl": format!("{}/layers/missing.tif", up.base),
            "hourlyShadeUrls": []
        }))
        .into_response(),
        "/v1/buildingInsights:findClosest" => Json(json!({
            "name": "buildings/test",
            "center": {"latitude": 37.4455, "longitude": -122.1384},
            "boundingBox": {
                "sw": {"latitude": bounds::PALO_ALTO.south, "longitude": bounds::PALO_ALTO.west},
                "ne": {"latitude": bounds::PALO_ALTO.north, "longitude": bounds::PALO_ALTO.east}
            },
            "solarPotential": {"wholeRoofStats": {"areaMeters2": 180.5}}
        }))
        .into_response(),
        "/layers/mask.tif" => layer_response(&up.mask),
        "/layers/rgb.tif" => layer_response(&up.rgb),
        "/layers/flux.tif" => layer_response(&up.flux),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Start the fake upstream and return the service router pointed at it.
async fn app_with(mut upstream: Upstream) -> (Router, Upstream) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    upstream.base = format!("http://{}", listener.local_addr().unwrap());

    let fake = Router::new()
        .fallback(upstream_handler)
        .with_state(upstream.clone());
    tokio::spawn(async move {
        axum::serve(listener, fake).await.unwrap();
    });

    let state = AppState::new(
        SolarApiClient::new(format!("{}/v1", upstream.base), Some("test-key".into())).unwrap(),
        RasterFetcher::new(FetchConfig::default()).unwrap(),
        SolarConfig::default(),
    );
    let prometheus = PrometheusBuilder::new().build_recorder().handle();
    (build_router(Arc::new(state), prometheus), upstream)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app_with(Upstream::healthy()).await;
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = app_with(Upstream::healthy()).await;
    let response = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
}

#[tokio::test]
async fn test_flux_overlay_masked_to_roof() {
    let (app, upstream) = app_with(Upstream::healthy()).await;
    let (status, body) = get(
        &app,
        "/api/overlay?lat=37.4455&lng=-122.1384&layer=annualFlux&roof_only=true",
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    assert_eq!(body["layer"], "annualFlux");
    assert_eq!(body["width"], 8);
    assert_eq!(body["height"], 8);
    assert_eq!(body["masked"], true);
    assert_eq!(body["range"]["max"], 1800.0);
    assert_approx_eq!(body["opacity"].as_f64().unwrap(), 0.8, 1e-6);
    assert!(body["image"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));

    let b = &body["bounds"];
    assert_approx_eq!(b["north"].as_f64().unwrap(), bounds::PALO_ALTO.north, 1e-4);
    assert_approx_eq!(b["south"].as_f64().unwrap(), bounds::PALO_ALTO.south, 1e-4);
    assert_approx_eq!(b["east"].as_f64().unwrap(), bounds::PALO_ALTO.east, 1e-4);
    assert_approx_eq!(b["west"].as_f64().unwrap(), bounds::PALO_ALTO.west, 1e-4);

    let queries = upstream.queries.lock().unwrap();
    let layers_query = queries
        .iter()
        .find(|q| q.starts_with("/v1/dataLayers:get"))
        .unwrap();
    assert!(layers_query.contains("location.latitude=37.44550"));
    assert!(layers_query.contains("location.longitude=-122.13840"));
    assert!(layers_query.contains("radius_meters=50"));
    assert!(layers_query.contains("required_quality=LOW"));
}

#[tokio::test]
async fn test_true_color_overlay_without_mask() {
    let (app, _) = app_with(Upstream::healthy()).await;
    let (status, body) = get(&app, "/api/overlay?lat=37.4455&lng=-122.1384&layer=rgb").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["width"], 32);
    assert_eq!(body["masked"], false);
    assert!(body.get("range").is_none());
}

#[tokio::test]
async fn test_true_color_overlay_from_separate_planes() {
    let upstream = Upstream {
        rgb: Some(planar_rgb_tiff()),
        ..Upstream::healthy()
    };
    let (app, _) = app_with(upstream).await;

    let (status, body) = get(&app, "/api/overlay?lat=37.4455&lng=-122.1384&layer=rgb").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["width"], 16);
    assert_eq!(body["height"], 16);

    let (status, body) = get(
        &app,
        "/api/overlay?lat=37.4455&lng=-122.1384&layer=rgb&roof_only=true",
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["masked"], true);
    assert_eq!(body["width"], 8);
    assert!(body["image"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn test_failed_mask_renders_unmasked() {
    let upstream = Upstream {
        mask: None,
        ..Upstream::healthy()
    };
    let (app, _) = app_with(upstream).await;
    let (status, body) = get(
        &app,
        "/api/overlay?lat=37.4455&lng=-122.1384&layer=annualFlux&roof_only=true",
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["masked"], false);
    assert_eq!(body["width"], 16);
}

#[tokio::test]
async fn test_failed_flux_fetch_is_transient() {
    let upstream = Upstream {
        flux: None,
        ..Upstream::healthy()
    };
    let (app, _) = app_with(upstream).await;
    let (status, body) = get(&app, "/api/overlay?lat=37.4455&lng=-122.1384&layer=annualFlux").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["class"], "transient");
    assert_eq!(body["retryable"], true);
    assert!(body["error"].as_str().unwrap().contains("layer store unavailable"));
}

#[tokio::test]
async fn test_corrupt_flux_is_unavailable() {
    let upstream = Upstream {
        flux: Some(b"<html>not a tiff</html>".to_vec()),
        ..Upstream::healthy()
    };
    let (app, _) = app_with(upstream).await;
    let (status, body) = get(&app, "/api/overlay?lat=37.4455&lng=-122.1384&layer=annualFlux").await;
    assert_eq!(status, StatusCode::FAILED_DEPENDENCY);
    assert_eq!(body["class"], "unavailable");

    // The other layers still render.
    let (status, _) = get(&app, "/api/overlay?lat=37.4455&lng=-122.1384&layer=rgb").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_layer_without_url_is_unavailable() {
    let (app, _) = app_with(Upstream::healthy()).await;
    let (status, _) = get(
        &app,
        "/api/overlay?lat=37.4455&lng=-122.1384&layer=monthlyFlux&month=3",
    )
    .await;
    assert_eq!(status, StatusCode::FAILED_DEPENDENCY);
}

#[tokio::test]
async fn test_no_imagery_for_location() {
    let upstream = Upstream {
        data_layers_status: StatusCode::NOT_FOUND,
        ..Upstream::healthy()
    };
    let (app, _) = app_with(upstream).await;
    let (status, body) = get(&app, "/api/overlay?lat=37.4455&lng=-122.1384").await;
    assert_eq!(status, StatusCode::FAILED_DEPENDENCY);
    assert!(body["error"].as_str().unwrap().contains("Requested entity was not found"));
}

#[tokio::test]
async fn test_overlay_rejects_bad_location() {
    let (app, _) = app_with(Upstream::healthy()).await;
    let (status, body) = get(&app, "/api/overlay?lat=95&lng=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["class"], "invalid_input");
}

#[tokio::test]
async fn test_panels_in_drawn_boundary() {
    let (app, _) = app_with(Upstream::healthy()).await;
    let rect = bounds::PALO_ALTO;
    let boundary: Vec<Value> = rect
        .corners()
        .iter()
        .map(|p| json!({"lat": p.lat, "lng": p.lng}))
        .collect();

    let (status, body) = post(&app, "/api/panels", json!({"boundary": boundary, "count": 60})).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["source"], "drawn");
    assert_eq!(body["requested"], 60);
    assert_eq!(body["footprints"].as_array().unwrap().len(), 60);
    assert_eq!(body["footprints"][0].as_array().unwrap().len(), 4);
    assert!(body["columns"].as_u64().unwrap() > 40);
    assert!(body["capacity"].as_u64().unwrap() > 1000);
    assert_approx_eq!(body["anchor"]["lat"].as_f64().unwrap(), rect.center().lat, 1e-9);
}

#[tokio::test]
async fn test_panels_from_closest_building() {
    let (app, upstream) = app_with(Upstream::healthy()).await;
    let (status, body) = post(
        &app,
        "/api/panels",
        json!({"center": {"lat": 37.4455, "lng": -122.1384}, "count": 10, "placement": "stacked"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["source"], "building");
    assert_eq!(
        body["capacity"].as_u64().unwrap(),
        max_panel_capacity(180.5).unwrap() as u64
    );
    assert_eq!(body["footprints"].as_array().unwrap().len(), 10);
    // Stacked columns: every panel in the row is identical.
    assert_eq!(body["footprints"][0], body["footprints"][9]);

    let queries = upstream.queries.lock().unwrap();
    assert!(queries
        .iter()
        .any(|q| q.starts_with("/v1/buildingInsights:findClosest") && q.contains("requiredQuality=HIGH")));
}

#[tokio::test]
async fn test_panels_need_boundary_or_center() {
    let (app, _) = app_with(Upstream::healthy()).await;
    let (status, _) = post(&app, "/api/panels", json!({"count": 4})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_panels_narrow_boundary() {
    let (app, _) = app_with(Upstream::healthy()).await;
    let strip = json!([
        {"lat": 37.4460, "lng": -122.13840},
        {"lat": 37.4450, "lng": -122.13839}
    ]);
    let (status, body) = post(&app, "/api/panels", json!({"boundary": strip, "count": 4})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("wide"));
}

#[tokio::test]
async fn test_panels_count_is_bounded() {
    let (app, upstream) = app_with(Upstream::healthy()).await;
    let (status, body) = post(
        &app,
        "/api/panels",
        json!({"center": {"lat": 37.4455, "lng": -122.1384}, "count": u32::MAX}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["class"], "invalid_input");
    assert!(body["error"].as_str().unwrap().contains(&MAX_LAYOUT_PANELS.to_string()));
    // Rejected before the building lookup.
    assert!(upstream.queries.lock().unwrap().is_empty());

    let rect = bounds::PALO_ALTO;
    let boundary: Vec<Value> = rect
        .corners()
        .iter()
        .map(|p| json!({"lat": p.lat, "lng": p.lng}))
        .collect();
    let (status, _) = post(
        &app,
        "/api/panels",
        json!({"boundary": boundary, "count": MAX_LAYOUT_PANELS + 1}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_capacity_by_area() {
    let (app, _) = app_with(Upstream::healthy()).await;
    let (status, body) = get(&app, "/api/capacity?area_m2=1000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["capacity"], 158);

    let (status, body) = get(&app, "/api/capacity?area_m2=-10").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["class"], "invalid_input");
}

#[tokio::test]
async fn test_capacity_by_polygon() {
    let (app, _) = app_with(Upstream::healthy()).await;
    let rect = bounds::PALO_ALTO;
    let boundary: Vec<Value> = rect
        .corners()
        .iter()
        .map(|p| json!({"lat": p.lat, "lng": p.lng}))
        .collect();
    let (status, body) = post(&app, "/api/capacity", json!({ "boundary": boundary })).await;
    assert_eq!(status, StatusCode::OK);

    let area = body["areaM2"].as_f64().unwrap();
    assert!(area > 11_000.0 && area < 12_500.0);
    assert_eq!(
        body["capacity"].as_u64().unwrap(),
        max_panel_capacity(area).unwrap() as u64
    );
}
