//! Shared fixtures for the client integration tests

#![allow(dead_code)]

use std::sync::Arc;

use admin_api::ApiClient;
use admin_auth::{SessionStore, SessionUser, TokenPair};
use serde_json::{Value, json};
use surface::MemorySurface;
use wiremock::MockServer;

pub fn admin_user() -> SessionUser {
    SessionUser {
        id: "u_admin".into(),
        name: "Ada".into(),
        email: "ada@example.com".into(),
        role: "admin".into(),
        avatar: None,
    }
}

pub fn login_body(role: &str) -> Value {
    json!({
        "success": true,
        "message": "Login successful",
        "data": {
            "user": {"id": "u_1", "name": "Ada", "email": "ada@example.com", "role": role},
            "accessToken": "at_login",
            "refreshToken": "rt_login"
        }
    })
}

pub fn refresh_body(access: &str, refresh: &str) -> Value {
    json!({
        "success": true,
        "data": {"accessToken": access, "refreshToken": refresh}
    })
}

pub fn client(server: &MockServer) -> (ApiClient, Arc<MemorySurface>) {
    let surface = Arc::new(MemorySurface::new());
    let client = ApiClient::builder()
        .base_url(server.uri())
        .surface(surface.clone())
        .build()
        .unwrap();
    (client, surface)
}

/// Client with an admin session already holding `at_old` / `rt_old`.
pub async fn logged_in_client(server: &MockServer) -> (Arc<ApiClient>, Arc<MemorySurface>) {
    let (client, surface) = client(server);
    let tokens = TokenPair {
        access_token: "at_old".into(),
        refresh_token: "rt_old".into(),
    };
    client.store().establish(&tokens, &admin_user()).await.unwrap();
    (Arc::new(client), surface)
}

pub async fn stored_keys(store: &SessionStore) -> Vec<Option<String>> {
    let mut keys = Vec::new();
    for key in admin_auth::SESSION_KEYS {
        keys.push(store.get(key).await);
    }
    keys
}
