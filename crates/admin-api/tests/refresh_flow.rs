//! Expired-token handling: coordinated refresh, replay, and forced logout

mod support;

use std::time::Duration;

use admin_api::{ApiRequest, SESSION_EXPIRED_MESSAGE, Upload};
use futures_util::future::join_all;
use serde_json::{Value, json};
use surface::Severity;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{logged_in_client, refresh_body, stored_keys};

async fn mount_expired_subjects(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/admin/subjects"))
        .and(header("authorization", "Bearer at_old"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Token expired"})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/subjects"))
        .and(header("authorization", "Bearer at_new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{"id": "s1", "name": "Physics"}]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn expired_token_is_refreshed_and_request_replayed() {
    let server = MockServer::start().await;
    mount_expired_subjects(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh-token"))
        .and(body_json(json!({"refreshToken": "rt_old"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(refresh_body("at_new", "rt_new")))
        .expect(1)
        .mount(&server)
        .await;

    let (client, surface) = logged_in_client(&server).await;
    let subjects: Vec<Value> = client.get("/api/admin/subjects").await.unwrap();

    assert_eq!(subjects[0]["name"], "Physics");
    assert_eq!(client.store().access_token().await.as_deref(), Some("at_new"));
    assert_eq!(client.store().refresh_token().await.as_deref(), Some("rt_new"));
    // The caller only sees the replayed result
    assert!(surface.notifications().is_empty());
    assert!(!client.refresh_coordinator().is_refreshing());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_expiries_share_one_refresh() {
    let server = MockServer::start().await;
    mount_expired_subjects(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(refresh_body("at_new", "rt_new"))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, _surface) = logged_in_client(&server).await;
    let calls = (0..8).map(|_| {
        let client = client.clone();
        tokio::spawn(async move { client.get::<Vec<Value>>("/api/admin/subjects").await })
    });
    let results = join_all(calls).await;

    for result in results {
        let subjects = result.unwrap().unwrap();
        assert_eq!(subjects.len(), 1);
    }
    assert_eq!(client.store().access_token().await.as_deref(), Some("at_new"));
    assert_eq!(client.refresh_coordinator().pending(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failed_refresh_rejects_every_waiter_and_ends_session() {
    let server = MockServer::start().await;
    mount_expired_subjects(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh-token"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"success": false, "message": "Refresh token expired"}))
                .set_delay(Duration::from_millis(500)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, surface) = logged_in_client(&server).await;
    let calls = (0..5).map(|_| {
        let client = client.clone();
        tokio::spawn(async move { client.get::<Vec<Value>>("/api/admin/subjects").await })
    });
    let results = join_all(calls).await;

    let errors: Vec<_> = results
        .into_iter()
        .map(|r| r.unwrap().unwrap_err())
        .collect();
    for err in &errors {
        assert_eq!(err, &errors[0]);
    }
    assert_eq!(errors[0].status, 401);
    assert_eq!(errors[0].message, "Refresh token expired");

    assert_eq!(stored_keys(client.store()).await, vec![None, None, None]);
    assert_eq!(surface.redirects(), 1);
    assert_eq!(surface.messages(Severity::Warning), vec![SESSION_EXPIRED_MESSAGE]);
}

#[tokio::test]
async fn missing_refresh_token_ends_session_without_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/sections"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (client, surface) = support::client(&server);
    let err = client.get::<Value>("/api/admin/sections").await.unwrap_err();

    assert_eq!(err.status, 401);
    assert_eq!(err.code.as_deref(), Some("session_expired"));
    assert_eq!(surface.redirects(), 1);
}

#[tokio::test]
async fn expiry_after_failed_refresh_does_not_redirect_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/lessons"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(400)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/notes"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Refresh token expired"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, surface) = logged_in_client(&server).await;
    let slow = {
        let client = client.clone();
        tokio::spawn(async move { client.get::<Value>("/api/admin/lessons").await })
    };

    let err = client.get::<Value>("/api/admin/notes").await.unwrap_err();
    assert_eq!(err.message, "Refresh token expired");
    assert_eq!(surface.redirects(), 1);

    // The slow request was sent with the old token and lands after the clear
    let late = slow.await.unwrap().unwrap_err();
    assert_eq!(late.code.as_deref(), Some("session_expired"));
    assert_eq!(surface.redirects(), 1);
    assert_eq!(surface.messages(Severity::Warning).len(), 1);
}

#[tokio::test]
async fn request_is_replayed_at_most_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/notes"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Still unauthorized"})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(refresh_body("at_new", "rt_new")))
        .expect(1)
        .mount(&server)
        .await;

    let (client, surface) = logged_in_client(&server).await;
    let err = client.get::<Value>("/api/admin/notes").await.unwrap_err();

    assert_eq!(err.status, 401);
    assert_eq!(err.message, "Still unauthorized");
    // The refresh itself succeeded; the session stays
    assert!(client.is_authenticated().await);
    assert_eq!(surface.redirects(), 0);
}

#[tokio::test]
async fn already_retried_request_is_not_refreshed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/users"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (client, _surface) = logged_in_client(&server).await;
    let mut request = ApiRequest::get("/api/admin/users");
    request.retried = true;
    let err = client.execute(request).await.unwrap_err();
    assert_eq!(err.status, 401);
}

#[tokio::test]
async fn late_expiry_uses_already_rotated_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/subjects"))
        .and(header("authorization", "Bearer at_old"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/subjects"))
        .and(header("authorization", "Bearer at_new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": "s1"}]})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(refresh_body("at_x", "rt_x")))
        .expect(0)
        .mount(&server)
        .await;

    let (client, _surface) = logged_in_client(&server).await;
    let in_flight = {
        let client = client.clone();
        tokio::spawn(async move { client.get::<Vec<Value>>("/api/admin/subjects").await })
    };

    // The session rotates while the request sent with at_old is still in flight
    tokio::time::sleep(Duration::from_millis(50)).await;
    let rotated = admin_auth::TokenPair {
        access_token: "at_new".into(),
        refresh_token: "rt_new".into(),
    };
    client.store().update_tokens(&rotated).await.unwrap();

    let subjects = in_flight.await.unwrap().unwrap();
    assert_eq!(subjects.len(), 1);
    assert_eq!(client.store().refresh_token().await.as_deref(), Some("rt_new"));
}

#[tokio::test]
async fn replayed_upload_is_rebuilt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/images"))
        .and(header("authorization", "Bearer at_old"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/images"))
        .and(header("authorization", "Bearer at_new"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": {"url": "https://cdn.example.com/b.jpg"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(refresh_body("at_new", "rt_new")))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _surface) = logged_in_client(&server).await;
    let upload = Upload::new("image", "b.jpg", vec![1u8; 4096]);
    let image: Value = client.upload_image(upload).await.unwrap();
    assert_eq!(image["url"], "https://cdn.example.com/b.jpg");
}
