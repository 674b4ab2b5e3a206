use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use edgeguard_api::{AppConfig, DiagnosticRecord, DiagnosticSink};
use edgeguard_api::app::build_app_with_sink;

#[derive(Default)]
struct Recorder(Mutex<Vec<DiagnosticRecord>>);

impl DiagnosticSink for Recorder {
    fn record(&self, record: &DiagnosticRecord) {
        self.0.lock().unwrap().push(record.clone());
    }
}

struct TestApp {
    router: Router,
    recorder: Arc<Recorder>,
}

impl TestApp {
    fn spawn(overrides: &[(&str, &str)]) -> Self {
        let mut vars: HashMap<String, String> = [
            ("APP_ENV", "test"),
            ("JWT_ACCESS_SECRET", "test-access-secret"),
            ("JWT_REFRESH_SECRET", "test-refresh-secret"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        vars.extend(overrides.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        let config = AppConfig::from_lookup(|key| vars.get(key).cloned()).expect("config");
        let recorder = Arc::new(Recorder::default());
        let router = build_app_with_sink(&config, recorder.clone()).expect("router");
        Self { router, recorder }
    }

    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let res = self.router.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn register(&self) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({ "email": "ada@example.com", "password": "secret1", "name": "Ada" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    fn records(&self) -> Vec<DiagnosticRecord> {
        self.recorder.0.lock().unwrap().clone()
    }
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::spawn(&[]);
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["environment"], json!("test"));
}

#[tokio::test]
async fn invalid_registration_reports_every_issue() {
    let app = TestApp::spawn(&[]);
    let (status, body) = app
        .send(Method::POST, "/auth/register", None, Some(json!({ "email": "x", "password": "123" })))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Validation failed"));
    assert!(body.get("data").is_none());

    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["path"], json!("body.email"));
    assert_eq!(errors[1]["path"], json!("body.password"));

    let records = app.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].path, "/auth/register");
    assert_eq!(records[0].method, "POST");
}

#[tokio::test]
async fn malformed_json_is_a_validation_failure() {
    let app = TestApp::spawn(&[]);
    let req = Request::builder()
        .method(Method::POST)
        .uri("/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\":"))
        .unwrap();
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["errors"][0]["path"], json!("body"));
    assert_eq!(body["errors"][0]["code"], json!("malformed"));
}

#[tokio::test]
async fn registration_returns_user_and_tokens() {
    let app = TestApp::spawn(&[]);
    let body = app.register().await;

    assert_eq!(body["success"], json!(true));
    assert!(body.get("errors").is_none());
    assert_eq!(body["data"]["user"]["email"], json!("ada@example.com"));
    assert_eq!(body["data"]["user"]["role"], json!("user"));
    assert!(body["data"]["user"].get("password").is_none());
    assert!(body["data"]["accessToken"].as_str().is_some());
    assert!(body["data"]["refreshToken"].as_str().is_some());
    assert!(app.records().is_empty());
}

#[tokio::test]
async fn me_requires_a_valid_access_token() {
    let app = TestApp::spawn(&[]);
    let registered = app.register().await;
    let token = registered["data"]["accessToken"].as_str().unwrap();

    let (status, body) = app.send(Method::GET, "/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], registered["data"]["user"]["id"]);

    let (status, body) = app.send(Method::GET, "/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["details"]["reason"], json!("missing_token"));
}

#[tokio::test]
async fn tampered_token_is_rejected_as_signature_invalid() {
    let app = TestApp::spawn(&[]);
    let registered = app.register().await;
    let token = registered["data"]["accessToken"].as_str().unwrap();

    let (head, signature) = token.rsplit_once('.').unwrap();
    let first = if signature.starts_with('A') { 'B' } else { 'A' };
    let tampered = format!("{head}.{first}{}", &signature[1..]);

    let (status, body) = app.send(Method::GET, "/auth/me", Some(&tampered), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["details"]["reason"], json!("signature_invalid"));
}

#[tokio::test]
async fn refresh_token_is_not_an_access_token() {
    let app = TestApp::spawn(&[]);
    let registered = app.register().await;
    let refresh = registered["data"]["refreshToken"].as_str().unwrap();

    let (status, body) = app.send(Method::GET, "/auth/me", Some(refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["details"]["reason"], json!("signature_invalid"));

    let (status, body) = app
        .send(Method::POST, "/auth/refresh", None, Some(json!({ "refreshToken": refresh })))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let rotated = body["data"]["accessToken"].as_str().unwrap();
    let (status, _) = app.send(Method::GET, "/auth/me", Some(rotated), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn expired_access_token_is_distinguishable() {
    let app = TestApp::spawn(&[("JWT_ACCESS_TTL", "0")]);
    let registered = app.register().await;
    let token = registered["data"]["accessToken"].as_str().unwrap();

    let (status, body) = app.send(Method::GET, "/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], json!("Token expired"));
    assert_eq!(body["details"]["reason"], json!("expired"));
}

#[tokio::test]
async fn unknown_route_is_a_not_found_envelope() {
    let app = TestApp::spawn(&[]);
    let (status, body) = app.send(Method::GET, "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert!(body.get("errors").is_none());
    assert_eq!(app.records().len(), 1);
}

#[tokio::test]
async fn stack_is_exposed_only_in_development() {
    let dev = TestApp::spawn(&[("APP_ENV", "development")]);
    let (_, body) = dev.send(Method::GET, "/nope", None, None).await;
    assert!(body["stack"].as_str().unwrap().contains("NOT_FOUND"));

    let prod = TestApp::spawn(&[("APP_ENV", "production")]);
    let (_, body) = prod.send(Method::GET, "/nope", None, None).await;
    assert!(body.get("stack").is_none());
}

#[tokio::test]
async fn user_lookup_validates_the_path_param() {
    let app = TestApp::spawn(&[]);
    let registered = app.register().await;
    let token = registered["data"]["accessToken"].as_str().unwrap();
    let id = registered["data"]["user"]["id"].as_str().unwrap();

    let (status, body) = app.send(Method::GET, "/users/not-a-uuid", Some(token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["path"], json!("params.id"));

    let (status, body) = app.send(Method::GET, &format!("/users/{id}"), Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], json!("ada@example.com"));

    let other = "0190a3c4-0000-7000-8000-000000000000";
    let (status, _) = app.send(Method::GET, &format!("/users/{other}"), Some(token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_method_gets_the_failure_envelope() {
    let app = TestApp::spawn(&[]);
    let req = Request::builder()
        .method(Method::GET)
        .uri("/auth/register")
        .body(Body::empty())
        .unwrap();
    let res = app.router.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(res.headers().get(header::ALLOW).is_some());
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Method Not Allowed"));

    let records = app.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, 405);
}

#[tokio::test]
async fn oversized_body_is_rejected_before_validation() {
    let app = TestApp::spawn(&[]);
    let padding = "x".repeat(edgeguard_api::app::BODY_LIMIT_BYTES + 1);
    let (status, body) = app
        .send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "email": "ada@example.com", "password": "secret1", "name": padding })),
        )
        .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["errors"][0]["path"], json!("body"));
    assert_eq!(body["errors"][0]["code"], json!("too_large"));
}

#[tokio::test]
async fn body_without_json_content_type_is_rejected() {
    let app = TestApp::spawn(&[]);
    let req = Request::builder()
        .method(Method::POST)
        .uri("/auth/register")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(r#"{"email":"ada@example.com","password":"secret1"}"#))
        .unwrap();
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["errors"][0]["code"], json!("malformed"));
}
