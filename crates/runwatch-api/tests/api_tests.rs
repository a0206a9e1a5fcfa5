//! Router tests.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use runwatch_api::{create_router, ApiConfig, AppState};
use runwatch_models::{BehaviorStatus, DashboardStats, DetectionResult, SyncMessage, ZoneAlerts};

struct TestApp {
    state: AppState,
    _snapshots: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    async fn with_config(configure: impl FnOnce(&mut ApiConfig)) -> Self {
        let snapshots = tempfile::tempdir().unwrap();
        let mut config = ApiConfig {
            snapshot_dir: snapshots.path().to_path_buf(),
            ..ApiConfig::default()
        };
        configure(&mut config);

        Self {
            state: AppState::new(config).await.unwrap(),
            _snapshots: snapshots,
        }
    }

    fn router(&self) -> Router {
        create_router(self.state.clone(), None)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let (status, body) = self
            .send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let (status, body) = self
            .send(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    async fn reading(&self, zone: &str, speed: f64, noise: f64) -> DetectionResult {
        let (status, body) = self
            .post_json(
                "/sensor/reading",
                json!({ "zone_name": zone, "movement_speed": speed, "noise_level": noise }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        serde_json::from_value(body).unwrap()
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new().await;
    let (status, body) = app.get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.get_json("/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["snapshot_dir"], "ok");
}

#[tokio::test]
async fn test_response_headers() {
    let app = TestApp::new().await;
    let response = app
        .router()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-request-id"], "req-42");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
}

#[tokio::test]
async fn test_reading_classification_flow() {
    let app = TestApp::new().await;

    let quiet = app.reading("stacks", 1.2, 42.0).await;
    assert_eq!(quiet.status, BehaviorStatus::Quiet);
    assert_eq!(quiet.streak, 1);
    assert_eq!(quiet.room_id, "default");
    assert_eq!(quiet.message, "Thank you for keeping the stacks quiet.");

    assert_eq!(app.reading("stacks", 1.0, 40.0).await.streak, 2);

    let running = app.reading("stacks", 7.5, 40.0).await;
    assert_eq!(running.status, BehaviorStatus::RunningDetected);
    assert_eq!(running.message, "Running detected! Please walk for safety.");
    assert_eq!(running.streak, 0);
    assert_eq!(running.alert_snapshot_url.as_deref(), Some("/static/logo.png"));

    let loud = app.reading("stacks", 1.0, 80.0).await;
    assert_eq!(loud.status, BehaviorStatus::Loud);
    assert_eq!(loud.message, "Noise level is high. Shhh!");
}

#[tokio::test]
async fn test_reading_validation() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json(
            "/sensor/reading",
            json!({ "zone_name": "", "movement_speed": 1.0, "noise_level": 40.0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("Validation"));

    let (status, _) = app
        .post_json(
            "/sensor/reading",
            json!({ "zone_name": "stacks", "movement_speed": -2.0, "noise_level": 40.0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json(
            "/sensor/reading",
            json!({ "zone_name": "stacks", "movement_speed": 1.0, "noise_level": 40.0, "room_id": "   " }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dashboard_holds_recent_alert() {
    let app = TestApp::new().await;
    app.reading("stacks", 1.0, 80.0).await;
    app.reading("stacks", 1.0, 40.0).await;
    app.reading("lab", 9.0, 40.0).await;

    let (status, body) = app.get_json("/api/rooms/default/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    let stats: DashboardStats = serde_json::from_value(body).unwrap();

    assert_eq!(stats.total_zones, 2);
    assert_eq!(stats.total_incidents, 1);
    assert_eq!(stats.total_noise, 1);
    let stacks = stats.zones.iter().find(|z| z.name == "stacks").unwrap();
    assert_eq!(stacks.status, BehaviorStatus::Loud);
    assert_eq!(stacks.events_today, 1);
}

#[tokio::test]
async fn test_dashboard_without_hold() {
    let app = TestApp::with_config(|c| c.alert_hold = Duration::ZERO).await;
    app.reading("stacks", 1.0, 80.0).await;
    app.reading("stacks", 1.0, 40.0).await;

    let (_, body) = app.get_json("/api/rooms/default/dashboard").await;
    let stats: DashboardStats = serde_json::from_value(body).unwrap();
    assert_eq!(stats.zones[0].status, BehaviorStatus::Quiet);
}

#[tokio::test]
async fn test_access_code_guards_dashboard() {
    let app = TestApp::new().await;

    let (status, _) = app.get_json("/api/rooms/default/dashboard").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.post_json("/api/auth/reset", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let code = body["code"].as_str().unwrap().to_string();
    assert!(code.starts_with("WATCH-"));

    let (status, _) = app.get_json("/api/rooms/default/dashboard").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(
            Request::builder()
                .uri("/api/rooms/default/dashboard")
                .header("x-access-code", &code)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // A reset invalidates the previous code
    app.post_json("/api/auth/reset", json!({})).await;
    let (status, _) = app
        .send(
            Request::builder()
                .uri("/api/rooms/default/dashboard")
                .header("x-access-code", &code)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_alerts_endpoint() {
    let app = TestApp::new().await;
    app.reading("stacks", 9.0, 40.0).await;
    app.reading("stacks", 1.0, 40.0).await;

    let (status, body) = app.get_json("/alerts/stacks").await;
    assert_eq!(status, StatusCode::OK);
    let alerts: ZoneAlerts = serde_json::from_value(body).unwrap();
    assert_eq!(alerts.zone, "stacks");
    assert_eq!(alerts.alerts.len(), 1);
    assert_eq!(alerts.alerts[0].status, BehaviorStatus::RunningDetected);

    let (_, body) = app.get_json("/alerts/stacks?room_id=WATCH-ABC123").await;
    assert_eq!(body["alerts"], json!([]));
}

#[tokio::test]
async fn test_layout_endpoint() {
    let app = TestApp::with_config(|c| c.layout_zones = vec!["stacks".into(), "lab".into()]).await;
    let (status, body) = app.get_json("/api/map/layout").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "zones": ["stacks", "lab"] }));
}

#[tokio::test]
async fn test_snapshot_upload_and_serve() {
    let app = TestApp::new().await;
    let image = format!("data:image/jpeg;base64,{}", STANDARD.encode(b"fake-jpeg"));

    let (status, body) = app
        .post_json("/upload/snapshot", json!({ "zone": "stacks", "image": image }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let url = body["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/snapshots/stacks_"));

    let (status, bytes) = app
        .send(Request::builder().uri(&url).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"fake-jpeg");

    let (status, _) = app
        .post_json("/upload/snapshot", json!({ "zone": "stacks", "image": "nope" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rate_limiting() {
    let app = TestApp::with_config(|c| c.rate_limit_rps = 1).await;
    let router = app.router();

    let request = || {
        Request::builder()
            .uri("/api/map/layout")
            .header("x-forwarded-for", "192.0.2.10")
            .body(Body::empty())
            .unwrap()
    };

    let first = router.clone().oneshot(request()).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = router.clone().oneshot(request()).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    // Health probes are not limited
    let health = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-forwarded-for", "192.0.2.10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_room_socket_relays_messages() {
    let app = TestApp::new().await;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let url = format!("ws://{}/ws/WATCH-ABC123", addr);
    let (mut desk, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
    let (mut floor, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
    assert_eq!(app.state.hub.subscriber_count("WATCH-ABC123").await, 2);

    let next_message = |text: tokio_tungstenite::tungstenite::Message| {
        SyncMessage::decode(text.to_text().unwrap()).unwrap()
    };

    // Emergency summons are relayed to every socket in the room
    let summon = SyncMessage::emergency("stacks", "front desk").encode().unwrap();
    desk.send(tokio_tungstenite::tungstenite::Message::Text(summon))
        .await
        .unwrap();
    let received = tokio::time::timeout(Duration::from_secs(5), floor.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    match next_message(received) {
        SyncMessage::Emergency(summon) => assert_eq!(summon.sender, "front desk"),
        other => panic!("unexpected message: {:?}", other),
    }

    // Readings that name the room are broadcast as STATE
    let (status, _) = app
        .post_json(
            "/sensor/reading",
            json!({
                "zone_name": "stacks",
                "movement_speed": 8.0,
                "noise_level": 40.0,
                "room_id": "WATCH-ABC123"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let received = tokio::time::timeout(Duration::from_secs(5), floor.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    match next_message(received) {
        SyncMessage::State(state) => {
            assert_eq!(state.status, BehaviorStatus::RunningDetected);
            assert_eq!(state.room_id, "WATCH-ABC123");
        }
        other => panic!("unexpected message: {:?}", other),
    }

    drop(desk);
    drop(floor);
    tokio::time::timeout(Duration::from_secs(5), async {
        while app.state.hub.room_count().await > 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();
}
