//! REST Adapter Tests - HttpVesselApi Against a Local axum Server
//!
//! Serves both vessel endpoints on an ephemeral port and checks query
//! parameters, bearer auth, status handling and the two-tier poller.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use serde_json::{Value, json};
use tokio_test::{assert_err, assert_ok};

use vessel_feed::adapters::api::{HttpVesselApi, SessionToken, VesselApiConfig};
use vessel_feed::domain::events::FeedSource;
use vessel_feed::domain::tracking::TrackingConfig;
use vessel_feed::ports::vessel_api::{ApiError, VesselApi};
use vessel_feed::usecases::FallbackPoller;

#[derive(Clone, Default)]
struct Upstream {
    requests: Arc<Mutex<Vec<(String, HashMap<String, String>, Option<String>)>>>,
    polling_status: Arc<Mutex<StatusCode>>,
    polling_body: Arc<Mutex<Value>>,
}

impl Upstream {
    fn record(&self, path: &str, query: HashMap<String, String>, headers: &HeaderMap) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.requests
            .lock()
            .unwrap()
            .push((path.to_string(), query, auth));
    }
}

async fn polling(
    State(upstream): State<Upstream>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    upstream.record("polling", query, &headers);
    let status = *upstream.polling_status.lock().unwrap();
    let body = upstream.polling_body.lock().unwrap().clone();
    (status, Json(body))
}

async fn general(
    State(upstream): State<Upstream>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    upstream.record("general", query, &headers);
    Json(json!([
        {"id": 11, "currentLat": 1.0, "currentLng": 2.0},
        {"id": 12, "currentLat": 3.0, "currentLng": 4.0},
        {"id": 13, "currentLng": 4.0},
    ]))
}

async fn serve(upstream: Upstream) -> String {
    let app = Router::new()
        .route("/api/vessels/polling", get(polling))
        .route("/api/vessels", get(general))
        .with_state(upstream);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base_url: String, token: Option<&str>) -> HttpVesselApi {
    HttpVesselApi::new(
        Arc::new(SessionToken::new(token.map(str::to_string))),
        VesselApiConfig {
            base_url,
            timeout: Duration::from_secs(5),
        },
    )
    .unwrap()
}

#[tokio::test]
async fn test_polling_request_carries_query_and_bearer() {
    let upstream = Upstream::default();
    *upstream.polling_status.lock().unwrap() = StatusCode::OK;
    *upstream.polling_body.lock().unwrap() = json!({
        "vessels": [{"id": 1, "currentLat": 10.0, "currentLng": 20.0}],
        "totalCount": 77,
    });
    let api = client(serve(upstream.clone()).await, Some("s3cret"));

    let tracking = TrackingConfig {
        region: "baltic".to_string(),
        page: 3,
        ..Default::default()
    };
    let response = assert_ok!(api.fetch_polling(&tracking).await);
    assert_eq!(response.vessels.len(), 1);
    assert_eq!(response.total_count, Some(77));

    let requests = upstream.requests.lock().unwrap();
    let (path, query, auth) = &requests[0];
    assert_eq!(path, "polling");
    assert_eq!(query["region"], "baltic");
    assert_eq!(query["page"], "3");
    assert_eq!(query["pageSize"], "100");
    assert_eq!(query["vesselType"], "all");
    assert_eq!(auth.as_deref(), Some("Bearer s3cret"));
}

#[tokio::test]
async fn test_error_status_maps_to_api_error() {
    let upstream = Upstream::default();
    *upstream.polling_status.lock().unwrap() = StatusCode::SERVICE_UNAVAILABLE;
    let api = client(serve(upstream.clone()).await, None);

    let err = assert_err!(api.fetch_polling(&TrackingConfig::default()).await);
    assert_eq!(err, ApiError::Status { status: 503 });

    let requests = upstream.requests.lock().unwrap();
    assert_eq!(requests[0].2, None, "no token, no auth header");
}

#[tokio::test]
async fn test_poller_falls_through_to_general_endpoint() {
    let upstream = Upstream::default();
    *upstream.polling_status.lock().unwrap() = StatusCode::INTERNAL_SERVER_ERROR;
    let api = client(serve(upstream.clone()).await, Some("s3cret"));

    let outcome = FallbackPoller::new(Arc::new(api))
        .fetch_once(&TrackingConfig::default())
        .await
        .unwrap();

    assert_eq!(outcome.source, FeedSource::RestApi);
    assert_eq!(outcome.vessels.len(), 2);
    assert_eq!(outcome.total_count, 2);

    let paths: Vec<String> = upstream
        .requests
        .lock()
        .unwrap()
        .iter()
        .map(|(path, _, _)| path.clone())
        .collect();
    assert_eq!(paths, vec!["polling", "general"]);
}

#[tokio::test]
async fn test_loose_total_count_stays_on_polling_tier() {
    let upstream = Upstream::default();
    *upstream.polling_status.lock().unwrap() = StatusCode::OK;
    let poller = FallbackPoller::new(Arc::new(client(serve(upstream.clone()).await, None)));

    for total in [json!("1500"), json!(1500.0)] {
        *upstream.polling_body.lock().unwrap() = json!({
            "vessels": [{"id": 1, "currentLat": 10.0, "currentLng": 20.0}],
            "totalCount": total,
        });
        let outcome = assert_ok!(poller.fetch_once(&TrackingConfig::default()).await);
        assert_eq!(outcome.source, FeedSource::RestPolling, "totalCount {total}");
        assert_eq!(outcome.total_count, 1500, "totalCount {total}");
        assert_eq!(outcome.vessels.len(), 1);
    }

    let requests = upstream.requests.lock().unwrap();
    assert!(requests.iter().all(|(path, _, _)| path == "polling"));
}

#[tokio::test]
async fn test_null_polling_vessels_fall_through_without_decode_error() {
    let upstream = Upstream::default();
    *upstream.polling_status.lock().unwrap() = StatusCode::OK;
    *upstream.polling_body.lock().unwrap() = json!({"vessels": null, "totalCount": 9});
    let api = client(serve(upstream.clone()).await, None);

    let response = assert_ok!(api.fetch_polling(&TrackingConfig::default()).await);
    assert!(response.vessels.is_empty());
    assert_eq!(response.total_count, Some(9));

    let outcome = assert_ok!(FallbackPoller::new(Arc::new(api))
        .fetch_once(&TrackingConfig::default())
        .await);
    assert_eq!(outcome.source, FeedSource::RestApi);
    assert_eq!(outcome.vessels.len(), 2);
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = client(format!("http://{addr}"), None);
    let err = assert_err!(api.fetch_general(&TrackingConfig::default()).await);
    assert!(matches!(err, ApiError::Network(_)));
}
