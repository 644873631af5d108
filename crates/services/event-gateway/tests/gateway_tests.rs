//! End-to-end tests driving the gateway router in-process

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, Method, Request, StatusCode},
    response::Response,
    routing::post,
    Form, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http_body_util::BodyExt;
use nvr_event_gateway::{
    api::{build_router, AppState, ErrorResponse, HealthResponse, IngestResponse},
    config::Config,
};
use tower::ServiceExt;

const MOTION_EVENT: &str = r#"{"eventType":"MotionDetection","deviceId":"NVR001","channelId":"Camera01","eventDetails":{"zoneId":"FrontDoor"}}"#;

fn hik_alarm(event_type: &str, date_time: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<EventNotificationAlert version="2.0" xmlns="http://www.hikvision.com/ver20/XMLSchema">
    <ipAddress>192.168.1.64</ipAddress>
    <portNo>80</portNo>
    <protocolType>HTTP</protocolType>
    <macAddress>00:11:22:33:44:55</macAddress>
    <channelID>1</channelID>
    <dateTime>{}</dateTime>
    <activePostCount>1</activePostCount>
    <eventType>{}</eventType>
    <eventState>active</eventState>
    <eventDescription>Alarm</eventDescription>
</EventNotificationAlert>"#,
        date_time, event_type
    )
}

fn app(config: Config) -> (Router, AppState) {
    let state = AppState::new(config).unwrap();
    (build_router(state.clone()), state)
}

fn request(method: Method, uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(body.into())
        .unwrap()
}

fn with_basic(mut req: Request<Body>, user: &str, pass: &str) -> Request<Body> {
    let value = format!("Basic {}", STANDARD.encode(format!("{}:{}", user, pass)));
    req.headers_mut()
        .insert(header::AUTHORIZATION, value.parse().unwrap());
    req
}

async fn body_bytes(response: Response) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Local stand-in for the Telegram Bot API; records every form post
async fn spawn_telegram_mock() -> (String, Arc<Mutex<Vec<HashMap<String, String>>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));

    async fn send_message(
        State(received): State<Arc<Mutex<Vec<HashMap<String, String>>>>>,
        Form(form): Form<HashMap<String, String>>,
    ) -> &'static str {
        received.lock().unwrap().push(form);
        r#"{"ok":true}"#
    }

    let router = Router::new()
        .route("/bottest-token/sendMessage", post(send_message))
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{}", addr), received)
}

#[tokio::test]
async fn test_vivotek_event_accepted() {
    let (router, state) = app(Config::default());

    let response = router
        .oneshot(request(Method::POST, "/event", MOTION_EVENT))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: IngestResponse = json_body(response).await;
    assert_eq!(body.status, "success");
    assert_eq!(body.message, "Event processed successfully");
    assert_eq!(body.event_id, 1);
    assert_eq!(state.pipeline.counter().current(), 1);
}

#[tokio::test]
async fn test_event_ids_follow_counter() {
    let (router, _state) = app(Config::default());

    for (i, path) in ["/event", "/events", "/event"].into_iter().enumerate() {
        let response = router
            .clone()
            .oneshot(request(Method::POST, path, MOTION_EVENT))
            .await
            .unwrap();
        let body: IngestResponse = json_body(response).await;
        assert_eq!(body.event_id, i as u64 + 1);
    }
}

#[tokio::test]
async fn test_hikvision_videoloss_normalized() {
    let (tg_base, received) = spawn_telegram_mock().await;
    let (router, _state) = app(Config {
        telegram_enabled: true,
        telegram_token: "test-token".to_string(),
        telegram_chat_id: "42".to_string(),
        telegram_api_base: tg_base,
        ..Config::default()
    });

    let response = router
        .oneshot(request(
            Method::POST,
            "/hikvision/alarm",
            hik_alarm("videoloss", "2024-05-01T10:20:30+08:00"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: IngestResponse = json_body(response).await;
    assert_eq!(body.message, "HIKVision alarm processed successfully");

    let forms = received.lock().unwrap();
    assert_eq!(forms.len(), 1);
    let form = &forms[0];
    assert_eq!(form["chat_id"], "42");
    assert_eq!(form["parse_mode"], "HTML");
    assert!(form["text"].contains("<b>Event:</b> VideoLoss"));
    assert!(form["text"].contains("<b>Device:</b> HIK_001122334455"));
    assert!(form["text"].contains("<b>Channel:</b> Channel1"));
    assert!(form["text"].contains("<b>Time:</b> 2024-05-01 02:20:30"));
}

#[tokio::test]
async fn test_hikvision_unparsable_time_accepted() {
    let (router, state) = app(Config::default());

    let response = router
        .oneshot(request(
            Method::POST,
            "/hikvision/alarm",
            hik_alarm("VMD", "yesterday at noon"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.pipeline.counter().current(), 1);
}

#[tokio::test]
async fn test_hikvision_get_accepted() {
    let (router, _state) = app(Config::default());

    let response = router
        .oneshot(request(
            Method::GET,
            "/hikvision/alarm",
            hik_alarm("linedetection", "2024-05-01T10:20:30Z"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_credentials_rejected() {
    let (router, state) = app(Config {
        auth_username: "admin".to_string(),
        auth_password: "secret".to_string(),
        ..Config::default()
    });

    let response = router
        .clone()
        .oneshot(request(Method::POST, "/event", MOTION_EVENT))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Basic realm=\"NVR API\""
    );
    assert_eq!(body_bytes(response).await, "Unauthorized");
    assert_eq!(state.pipeline.counter().current(), 0);

    let response = router
        .clone()
        .oneshot(with_basic(
            request(Method::POST, "/event", MOTION_EVENT),
            "admin",
            "wrong",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .oneshot(with_basic(
            request(Method::POST, "/event", MOTION_EVENT),
            "admin",
            "secret",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.pipeline.counter().current(), 1);
}

#[tokio::test]
async fn test_global_auth_precedes_method_check() {
    let (router, _state) = app(Config {
        auth_username: "admin".to_string(),
        auth_password: "secret".to_string(),
        ..Config::default()
    });

    let response = router
        .clone()
        .oneshot(request(Method::PUT, "/event", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .oneshot(with_basic(
            request(Method::PUT, "/event", Body::empty()),
            "admin",
            "secret",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_hikvision_auth() {
    let (router, state) = app(Config {
        hik_enabled: true,
        hik_username: "hik".to_string(),
        hik_password: "camera".to_string(),
        ..Config::default()
    });

    let response = router
        .clone()
        .oneshot(request(
            Method::POST,
            "/hikvision/alarm",
            hik_alarm("VMD", "2024-05-01T10:20:30Z"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_bytes(response).await,
        "Unauthorized for HIKVision integration"
    );

    // Method check runs before vendor auth
    let response = router
        .clone()
        .oneshot(request(Method::DELETE, "/hikvision/alarm", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = router
        .clone()
        .oneshot(request(Method::HEAD, "/hikvision/alarm", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = router
        .clone()
        .oneshot(with_basic(
            request(
                Method::POST,
                "/hikvision/alarm",
                hik_alarm("VMD", "2024-05-01T10:20:30Z"),
            ),
            "hik",
            "camera",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.pipeline.counter().current(), 1);

    // Vendor auth does not apply to the JSON routes
    let response = router
        .oneshot(request(Method::POST, "/event", MOTION_EVENT))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_payloads_rejected() {
    let (tg_base, received) = spawn_telegram_mock().await;
    let (router, state) = app(Config {
        telegram_enabled: true,
        telegram_token: "test-token".to_string(),
        telegram_chat_id: "42".to_string(),
        telegram_api_base: tg_base,
        ..Config::default()
    });

    let cases = [
        ("/event", "{ not json"),
        ("/events", r#"{"deviceId":"NVR001"}"#),
        ("/event", r#"{"eventType":"","deviceId":"NVR001"}"#),
        ("/hikvision/alarm", "<EventNotificationAlert><eventType>"),
        ("/hikvision/alarm", "<Other><eventType>VMD</eventType></Other>"),
        ("/hikvision/alarm", ""),
    ];

    for (path, body) in cases {
        let response = router
            .clone()
            .oneshot(request(Method::POST, path, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{} {}", path, body);
        let error: ErrorResponse = json_body(response).await;
        assert_eq!(error.status, "error");
        assert!(!error.message.is_empty());
    }

    assert_eq!(state.pipeline.counter().current(), 0);
    assert!(received.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_forward_does_not_fail_request() {
    let (tg_base, received) = spawn_telegram_mock().await;
    let (router, state) = app(Config {
        notify_url: "http://127.0.0.1:1/hook".to_string(),
        forward_timeout_seconds: 2,
        telegram_enabled: true,
        telegram_token: "test-token".to_string(),
        telegram_chat_id: "42".to_string(),
        telegram_api_base: tg_base,
        ..Config::default()
    });
    assert_eq!(
        state.pipeline.fan_out().sink_names(),
        vec!["forward", "telegram"]
    );

    let response = router
        .oneshot(request(Method::POST, "/event", MOTION_EVENT))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: IngestResponse = json_body(response).await;
    assert_eq!(body.event_id, 1);
    assert_eq!(state.pipeline.counter().current(), 1);

    // The failed forward did not stop the notification
    let forms = received.lock().unwrap();
    assert_eq!(forms.len(), 1);
    assert!(forms[0]["text"].contains("(Zone: FrontDoor)"));
}

#[tokio::test]
async fn test_pipeline_reports_sink_failure() {
    let state = AppState::new(Config {
        notify_url: "http://127.0.0.1:1/hook".to_string(),
        forward_timeout_seconds: 2,
        ..Config::default()
    })
    .unwrap();

    let ingested = tokio_test::assert_ok!(
        state
            .pipeline
            .ingest_vivotek(MOTION_EVENT.as_bytes())
            .await
    );
    assert_eq!(ingested.event_id, 1);
    assert_eq!(ingested.report.failures(), 1);
    assert!(!ingested.report.outcome("forward").unwrap().is_delivered());
}

#[tokio::test]
async fn test_forward_posts_canonical_json() {
    let received: Arc<Mutex<Vec<serde_json::Value>>> = Arc::new(Mutex::new(Vec::new()));

    async fn hook(
        State(received): State<Arc<Mutex<Vec<serde_json::Value>>>>,
        axum::Json(event): axum::Json<serde_json::Value>,
    ) -> StatusCode {
        received.lock().unwrap().push(event);
        StatusCode::NO_CONTENT
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hook_router = Router::new()
        .route("/hook", post(hook))
        .with_state(received.clone());
    tokio::spawn(async move {
        axum::serve(listener, hook_router).await.unwrap();
    });

    let (router, _state) = app(Config {
        notify_url: format!("http://{}/hook", addr),
        ..Config::default()
    });

    let response = router
        .oneshot(request(
            Method::POST,
            "/hikvision/alarm",
            hik_alarm("intrusion", "2024-05-01T10:20:30Z"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let events = received.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["eventType"], "IntrusionDetection");
    assert_eq!(events[0]["deviceId"], "HIK_001122334455");
    assert_eq!(events[0]["channelId"], "Channel1");
    assert_eq!(events[0]["eventDetails"]["originalType"], "intrusion");
}

#[tokio::test]
async fn test_method_not_allowed() {
    let (router, _state) = app(Config::default());

    let response = router
        .clone()
        .oneshot(request(Method::GET, "/event", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body_bytes(response).await, "Only POST method is supported");

    let response = router
        .clone()
        .oneshot(request(Method::PUT, "/hikvision/alarm", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        body_bytes(response).await,
        "Only POST and GET methods are supported"
    );

    // HEAD is not implied by GET on the alarm route
    let response = router
        .oneshot(request(
            Method::HEAD,
            "/hikvision/alarm",
            hik_alarm("VMD", "2024-05-01T10:20:30Z"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_health_reports_count() {
    let (router, _state) = app(Config {
        auth_username: "admin".to_string(),
        auth_password: "secret".to_string(),
        ..Config::default()
    });

    router
        .clone()
        .oneshot(with_basic(
            request(Method::POST, "/event", MOTION_EVENT),
            "admin",
            "secret",
        ))
        .await
        .unwrap();

    // No auth on /health
    let response = router
        .oneshot(request(Method::GET, "/health", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthResponse = json_body(response).await;
    assert_eq!(health.status, "ok");
    assert_eq!(health.event_count, 1);
    assert!(health.uptime.ends_with('s'));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_get_distinct_ids() {
    let (router, state) = app(Config::default());

    let tasks: Vec<_> = (0..50)
        .map(|_| {
            let router = router.clone();
            tokio::spawn(async move {
                let response = router
                    .oneshot(request(Method::POST, "/events", MOTION_EVENT))
                    .await
                    .unwrap();
                let body: IngestResponse = json_body(response).await;
                body.event_id
            })
        })
        .collect();

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(tokio::time::timeout(Duration::from_secs(10), task).await.unwrap().unwrap());
    }
    ids.sort_unstable();

    assert_eq!(ids, (1..=50).collect::<Vec<u64>>());
    assert_eq!(state.pipeline.counter().current(), 50);
}
