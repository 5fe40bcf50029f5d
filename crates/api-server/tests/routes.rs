//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use funnel_api::create_router;
use funnel_api::rest::AppState;
use funnel_core::config::SourceConfig;
use funnel_core::{Campaign, Dataset, Session, Timeline};
use funnel_source::{DatasetLoader, InMemorySource};
use serde_json::Value;
use tower::ServiceExt;

const MINUTE: i64 = 60_000;

fn session(id: &str, utm_id: Option<&str>, converted: bool) -> Session {
    let now = Utc::now().timestamp_millis();
    let landing = now - 60 * MINUTE;
    let mut timeline = Timeline {
        landing,
        updated_at: landing + 5 * MINUTE,
        ..Default::default()
    };
    if converted {
        timeline.form_start = Some(landing + 5 * MINUTE);
        timeline.form_filled_without_login = Some(landing + 15 * MINUTE);
        timeline.under_review = Some(landing + 25 * MINUTE);
        timeline.payment_started = Some(landing + 30 * MINUTE);
        timeline.payment_successful = Some(landing + 40 * MINUTE);
        timeline.updated_at = landing + 40 * MINUTE;
    }
    Session {
        session_id: id.to_string(),
        device_type: "mobile".into(),
        ip_address: String::new(),
        raw_location: String::new(),
        country: Some("India".into()),
        city: Some("Mumbai".into()),
        utm_campaign_id: utm_id.map(String::from),
        timeline,
    }
}

fn dataset() -> Dataset {
    Dataset::new(
        vec![
            session("s1", Some("utm-1"), true),
            session("s2", Some("utm-1"), false),
            session("s3", None, false),
        ],
        vec![Campaign {
            utm_id: "utm-1".into(),
            source: "google".into(),
            campaign: "summer".into(),
            medium: "cpc".into(),
            active: true,
            created_at: 0,
            phone_number: None,
        }],
    )
}

fn app(source: Arc<InMemorySource>) -> (Router, Arc<DatasetLoader>) {
    let loader = Arc::new(DatasetLoader::new(source, &SourceConfig::default()));
    (create_router(AppState::new(loader.clone())), loader)
}

async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn dashboard_is_unavailable_until_loaded() {
    let (app, _) = app(Arc::new(InMemorySource::new(dataset())));

    let (status, body) = send(&app, Method::GET, "/v1/dashboard").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "dataset_unavailable");

    let (status, _) = send(&app, Method::GET, "/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, body) = send(&app, Method::GET, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dataset"], "loading");
}

#[tokio::test]
async fn dashboard_reports_loaded_snapshot() {
    let (app, loader) = app(Arc::new(InMemorySource::new(dataset())));
    loader.refresh().await.unwrap();

    let (status, body) = send(&app, Method::GET, "/v1/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_sessions"], 3);
    assert_eq!(body["total_conversions"], 1);
    assert_eq!(body["funnel_stages"].as_array().unwrap().len(), 6);
    assert!(body["last_updated"].is_string());

    let (status, body) = send(&app, Method::GET, "/v1/campaigns").await;
    assert_eq!(status, StatusCode::OK);
    let campaigns = body.as_array().unwrap();
    assert_eq!(campaigns[0]["campaign"], "google - summer");
    assert_eq!(campaigns[0]["conversions"], 1);

    let (status, _) = send(&app, Method::GET, "/ready").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn campaign_urls_for_known_and_unknown_labels() {
    let (app, loader) = app(Arc::new(InMemorySource::new(dataset())));
    loader.refresh().await.unwrap();

    let uri = "/v1/campaigns/google%20-%20summer/urls";
    let (status, body) = send(&app, Method::GET, uri).await;
    assert_eq!(status, StatusCode::OK);
    let urls = body.as_array().unwrap();
    assert_eq!(urls.len(), 1);
    assert_eq!(urls[0]["url"], "google.com/summer-cpc");
    assert_eq!(urls[0]["sessions"], 2);

    let (status, body) = send(&app, Method::GET, "/v1/campaigns/nobody/urls").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(Vec::new()));
}

#[tokio::test]
async fn url_sessions_sorted_by_conversion() {
    let (app, loader) = app(Arc::new(InMemorySource::new(dataset())));
    loader.refresh().await.unwrap();

    let (status, body) = send(
        &app,
        Method::GET,
        "/v1/urls/sessions?url=google.com/summer-cpc&sort=conversion",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["session_id"], "s1");
    assert_eq!(rows[0]["status"], "converted");

    let (_, body) = send(&app, Method::GET, "/v1/urls/sessions?url=Direct%20Traffic").await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn behavior_for_missing_session_is_not_found() {
    let (app, loader) = app(Arc::new(InMemorySource::new(dataset())));
    loader.refresh().await.unwrap();

    let (status, body) = send(&app, Method::GET, "/v1/sessions/s1/behavior").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completion_rate"], 100.0);
    assert_eq!(body["device_info"]["type"], "mobile");

    let (status, body) = send(&app, Method::GET, "/v1/sessions/ghost/behavior").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn failed_refresh_reports_bad_gateway_then_recovers() {
    let source = Arc::new(InMemorySource::new(dataset()));
    let (app, _) = app(source.clone());

    source.set_failure(Some("upstream timed out"));
    let (status, body) = send(&app, Method::POST, "/v1/refresh").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "refresh_failed");

    let (_, body) = send(&app, Method::GET, "/v1/status").await;
    assert_eq!(body["state"], "failed");

    let (status, body) = send(&app, Method::GET, "/v1/funnel").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["message"].as_str().unwrap().contains("upstream timed out"));

    source.set_failure(None);
    let (status, body) = send(&app, Method::POST, "/v1/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "ready");
    assert_eq!(body["sessions"], 3);
}
