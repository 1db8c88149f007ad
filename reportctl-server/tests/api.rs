//! Router-level tests against a temporary database file

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use reportctl_core::EmailConfig;
use reportctl_server::report::{Email, MailError, Mailer};
use reportctl_server::{build_router, AppState, Datasource};

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(EmailConfig, Email)>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, account: &EmailConfig, email: &Email) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap()
            .push((account.clone(), email.clone()));
        Ok(())
    }
}

struct TestApp {
    router: Router,
    mailer: Arc<RecordingMailer>,
    _dir: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let datasource = Datasource::open(dir.path().join("msupply.db")).await.unwrap();
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::new(datasource).with_mailer(mailer.clone());

        Self {
            router: build_router(state),
            mailer,
            _dir: dir,
        }
    }

    async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

#[tokio::test]
async fn health_is_ok() {
    let app = TestApp::new().await;
    let (status, body) = app.call(Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["message"], "Yeah, nah, All good");
}

#[tokio::test]
async fn queries_are_rejected_per_ref_id() {
    let app = TestApp::new().await;
    let (status, body) = app
        .call(
            Method::POST,
            "/query",
            Some(json!({ "queries": [{ "refId": "A" }, { "refId": "B", "format": "table" }] })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"]["A"]["error"], "Queries are not supported!");
    assert_eq!(body["results"]["B"]["error"], "Queries are not supported!");
}

#[tokio::test]
async fn schedule_crud() {
    let app = TestApp::new().await;

    let (status, created) = app
        .call(
            Method::POST,
            "/schedules",
            Some(json!({
                "name": "Weekly stock",
                "description": "Stock on hand",
                "interval": 604800,
                "nextReportTime": 1700000000,
                "lookback": 86400,
                "time": "08:00",
                "day": 1
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["reportGroupID"], Value::Null);

    let (status, fetched) = app.call(Method::GET, &format!("/schedules/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) = app
        .call(
            Method::PUT,
            &format!("/schedules/{id}"),
            Some(json!({ "name": "Daily stock", "interval": 86400 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Daily stock");
    assert_eq!(updated["lookback"], 0);

    let (_, list) = app.call(Method::GET, "/schedules", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = app.call(Method::DELETE, &format!("/schedules/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.call(Method::GET, &format!("/schedules/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn invalid_input_is_400() {
    let app = TestApp::new().await;

    let (status, body) = app
        .call(Method::POST, "/schedules", Some(json!({ "name": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = app
        .call(Method::POST, "/report-groups", Some(json!({ "name": 5 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn group_in_use_cannot_be_deleted() {
    let app = TestApp::new().await;

    let (_, group) = app
        .call(Method::POST, "/report-groups", Some(json!({ "name": "Managers" })))
        .await;
    let group_id = group["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .call(
            Method::POST,
            "/schedules",
            Some(json!({ "name": "Weekly", "reportGroupID": group_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .call(Method::DELETE, &format!("/report-groups/{group_id}"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn members_and_content_under_unknown_parent_are_404() {
    let app = TestApp::new().await;

    let (status, _) = app
        .call(
            Method::POST,
            "/report-groups/nope/members",
            Some(json!({ "userID": "3" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call(
            Method::POST,
            "/schedules/nope/content",
            Some(json!({ "panelID": 1, "dashboardID": "d" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.call(Method::GET, "/schedules/nope/content", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn settings_round_trip() {
    let app = TestApp::new().await;

    let (status, _) = app.call(Method::GET, "/settings", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let settings = json!({
        "grafanaUsername": "admin",
        "grafanaPassword": "admin",
        "grafanaURL": "http://localhost:3000",
        "email": "reports@example.org",
        "emailPassword": "pw",
        "emailHost": "smtp.example.org",
        "emailPort": 587,
        "datasourceID": 2
    });
    let (status, _) = app.call(Method::PUT, "/settings", Some(settings.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, fetched) = app.call(Method::GET, "/settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, settings);
}

#[tokio::test]
async fn test_email_sends_report() {
    let app = TestApp::new().await;

    app.call(
        Method::PUT,
        "/settings",
        Some(json!({
            "grafanaUsername": "admin",
            "grafanaPassword": "secret",
            "grafanaURL": "http://grafana:3000",
            "email": "reports@example.org",
            "emailPassword": "pw",
            "emailHost": "smtp.example.org",
            "emailPort": 465,
            "datasourceID": 9
        })),
    )
    .await;

    let (_, group) = app
        .call(Method::POST, "/report-groups", Some(json!({ "name": "Managers" })))
        .await;
    let group_id = group["id"].as_str().unwrap().to_string();
    let (status, _) = app
        .call(
            Method::POST,
            &format!("/report-groups/{group_id}/members"),
            Some(json!({ "userID": "42" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, schedule) = app
        .call(
            Method::POST,
            "/schedules",
            Some(json!({ "name": "Weekly", "lookback": 3600, "reportGroupID": group_id })),
        )
        .await;
    let schedule_id = schedule["id"].as_str().unwrap().to_string();
    let (status, _) = app
        .call(
            Method::POST,
            &format!("/schedules/{schedule_id}/content"),
            Some(json!({ "panelID": 4, "dashboardID": "stock" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, report) = app
        .call(Method::POST, &format!("/test-email/{schedule_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["scheduleID"], schedule_id.as_str());
    assert_eq!(report["datasourceID"], 9);
    assert_eq!(report["recipients"], json!(["42"]));
    assert_eq!(report["panels"][0]["panelID"], 4);

    let sent = app.mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let (account, email) = &sent[0];
    assert_eq!(account.port, 465);
    assert_eq!(email.subject, "Weekly");
    assert_eq!(email.to, vec!["42".to_string()]);
}

#[tokio::test]
async fn test_email_for_unknown_schedule_is_404() {
    let app = TestApp::new().await;
    app.call(
        Method::PUT,
        "/settings",
        Some(json!({ "grafanaURL": "http://grafana", "emailHost": "smtp", "emailPort": 25 })),
    )
    .await;

    let (status, _) = app.call(Method::POST, "/test-email/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_email_without_settings_is_404() {
    let app = TestApp::new().await;
    let (status, body) = app.call(Method::POST, "/test-email/any", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "settings 'ID' not found");
}

async fn schedule_with_panel(app: &TestApp) -> String {
    let (_, group) = app
        .call(Method::POST, "/report-groups", Some(json!({ "name": "Ops" })))
        .await;
    let group_id = group["id"].as_str().unwrap().to_string();
    app.call(
        Method::POST,
        &format!("/report-groups/{group_id}/members"),
        Some(json!({ "userID": "7" })),
    )
    .await;

    let (_, schedule) = app
        .call(
            Method::POST,
            "/schedules",
            Some(json!({ "name": "Daily", "lookback": 60, "reportGroupID": group_id })),
        )
        .await;
    let schedule_id = schedule["id"].as_str().unwrap().to_string();
    app.call(
        Method::POST,
        &format!("/schedules/{schedule_id}/content"),
        Some(json!({ "panelID": 1, "dashboardID": "ops" })),
    )
    .await;
    schedule_id
}

async fn save_grafana(app: &TestApp, url: &str, password: &str) {
    let (status, _) = app
        .call(
            Method::PUT,
            "/settings",
            Some(json!({
                "grafanaUsername": "admin",
                "grafanaPassword": password,
                "grafanaURL": url,
                "emailHost": "smtp",
                "emailPort": 25
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_email_with_reserved_password_characters() {
    let app = TestApp::new().await;
    save_grafana(&app, "http://grafana:3000", "top/secret#1?").await;
    let schedule_id = schedule_with_panel(&app).await;

    let (status, report) = app
        .call(Method::POST, &format!("/test-email/{schedule_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!report.to_string().contains("top/secret"));
    assert_eq!(
        report["panels"][0]["link"].as_str().unwrap().split('?').next(),
        Some("http://grafana:3000/render/d-solo/ops")
    );

    let sent = app.mailer.sent.lock().unwrap();
    assert!(!sent[0].1.body.contains("top/secret"));
}

#[tokio::test]
async fn unusable_grafana_url_error_hides_password() {
    let app = TestApp::new().await;
    save_grafana(&app, "http://", "top/secret").await;
    let schedule_id = schedule_with_panel(&app).await;

    let (status, body) = app
        .call(Method::POST, &format!("/test-email/{schedule_id}"), None)
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.to_string().contains("top/secret"));
    assert!(app.mailer.sent.lock().unwrap().is_empty());
}
