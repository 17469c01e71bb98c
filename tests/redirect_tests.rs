//! Redirect resolution tests
//!
//! The critical path: short code in, 302 out, one click recorded.
//! Expired codes answer 410 without recording a click.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use chrono::{Duration, Utc};
use tempfile::TempDir;

use linkpress::collector::CollectorClient;
use linkpress::services::{AppStartTime, configure_routes};
use linkpress::storage::backends::SeaOrmStore;
use linkpress::storage::{ShortUrlRecord, UrlStore};

async fn test_store() -> (Arc<dyn UrlStore>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("redirect_test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let store = SeaOrmStore::new(&db_url, "sqlite")
        .await
        .expect("Failed to create storage");
    (Arc::new(store) as Arc<dyn UrlStore>, temp_dir)
}

macro_rules! test_app {
    ($store:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($store.clone()))
                .app_data(web::Data::new(CollectorClient::disabled()))
                .app_data(web::Data::new(AppStartTime {
                    start_datetime: Utc::now(),
                }))
                .configure(configure_routes),
        )
        .await
    };
}

fn active_record(code: &str, target: &str) -> ShortUrlRecord {
    let now = Utc::now();
    ShortUrlRecord {
        short_code: code.to_string(),
        long_url: target.to_string(),
        created_at: now,
        expires_at: now + Duration::minutes(30),
        clicks: Vec::new(),
    }
}

#[actix_web::test]
async fn test_redirect_returns_302_and_records_click() {
    let (store, _dir) = test_store().await;
    store
        .insert(&active_record("abc1234", "https://example.com/landing"))
        .await
        .unwrap();

    let app = test_app!(store);

    let req = TestRequest::get()
        .uri("/abc1234")
        .insert_header(("User-Agent", "test-agent/1.0"))
        .insert_header(("Referer", "https://referrer.example"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    let location = resp
        .headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert_eq!(location, "https://example.com/landing");

    let record = store.get("abc1234").await.unwrap().unwrap();
    assert_eq!(record.clicks.len(), 1);
    assert!(record.clicks[0].source.contains("test-agent/1.0"));
    assert!(record.clicks[0].source.contains("https://referrer.example"));
}

#[actix_web::test]
async fn test_each_redirect_appends_one_click() {
    let (store, _dir) = test_store().await;
    store
        .insert(&active_record("hit-me_1", "https://example.com"))
        .await
        .unwrap();

    let app = test_app!(store);

    for _ in 0..3 {
        let req = TestRequest::get().uri("/hit-me_1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
    }

    let record = store.get("hit-me_1").await.unwrap().unwrap();
    assert_eq!(record.clicks.len(), 3);
}

#[actix_web::test]
async fn test_expired_code_answers_410_without_click() {
    let (store, _dir) = test_store().await;
    let now = Utc::now();
    store
        .insert(&ShortUrlRecord {
            short_code: "expired1".to_string(),
            long_url: "https://example.com".to_string(),
            created_at: now - Duration::minutes(60),
            expires_at: now - Duration::minutes(30),
            clicks: Vec::new(),
        })
        .await
        .unwrap();

    let app = test_app!(store);

    let req = TestRequest::get().uri("/expired1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::GONE);

    let record = store.get("expired1").await.unwrap().unwrap();
    assert!(record.clicks.is_empty());
}

#[actix_web::test]
async fn test_unknown_code_answers_404() {
    let (store, _dir) = test_store().await;
    let app = test_app!(store);

    let req = TestRequest::get().uri("/missing").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_malformed_code_answers_400() {
    let (store, _dir) = test_store().await;
    let app = test_app!(store);

    for bad in ["/ab", "/bad;code", "/with.dot"] {
        let req = TestRequest::get().uri(bad).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "path: {}", bad);
    }
}

#[actix_web::test]
async fn test_create_then_resolve_roundtrip() {
    let (store, _dir) = test_store().await;
    let app = test_app!(store);

    let req = TestRequest::post()
        .uri("/api/shorturls")
        .set_json(serde_json::json!({ "url": "https://example.com/page?x=1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let code = body["shortlink"]
        .as_str()
        .unwrap()
        .rsplit('/')
        .next()
        .unwrap()
        .to_string();

    let req = TestRequest::get().uri(&format!("/{}", code)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get("Location").unwrap(),
        "https://example.com/page?x=1"
    );
}
