//! Auth endpoint calls
//!
//! Handles the three token endpoint interactions:
//! 1. Credential exchange (`POST /api/auth/login`)
//! 2. Token refresh (`POST /api/auth/refresh-token`)
//! 3. Server-side logout (`POST /api/auth/logout`)
//!
//! These calls bypass the request interceptors in `admin-api` on purpose: a
//! refresh must never trigger another refresh.

use std::fmt;

use common::Secret;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::endpoints::{LOGIN_PATH, LOGOUT_PATH, REFRESH_PATH, join_url};
use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::user::SessionUser;

/// Access/refresh token pair as issued by the backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// `data` of a successful login: the user plus a fresh token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user: SessionUser,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Exchange email and password for a session.
///
/// Returns the full envelope because callers need both the user and the
/// tokens. A success body without `data` is rejected as malformed.
pub async fn exchange_credentials(
    client: &reqwest::Client,
    base_url: &str,
    email: &str,
    password: &Secret<String>,
) -> Result<Envelope<AuthPayload>> {
    let response = client
        .post(join_url(base_url, LOGIN_PATH))
        .json(&json!({ "email": email, "password": password.expose() }))
        .send()
        .await
        .map_err(|e| Error::transport("login request failed", e))?;

    let envelope: Envelope<AuthPayload> = read_success(response, "login").await?;
    if envelope.data.is_none() {
        return Err(Error::InvalidResponse("login response carried no data".into()));
    }
    debug!(email, "credential exchange succeeded");
    Ok(envelope)
}

/// Trade a refresh token for a new token pair.
pub async fn refresh_token(
    client: &reqwest::Client,
    base_url: &str,
    refresh: &str,
) -> Result<TokenPair> {
    let response = client
        .post(join_url(base_url, REFRESH_PATH))
        .json(&json!({ "refreshToken": refresh }))
        .send()
        .await
        .map_err(|e| Error::transport("token refresh request failed", e))?;

    let envelope: Envelope<TokenPair> = read_success(response, "token refresh").await?;
    envelope
        .into_data()
        .ok_or_else(|| Error::InvalidResponse("refresh response carried no tokens".into()))
}

/// Invalidate the session server-side.
pub async fn revoke(client: &reqwest::Client, base_url: &str, access: &str) -> Result<()> {
    let response = client
        .post(join_url(base_url, LOGOUT_PATH))
        .bearer_auth(access)
        .send()
        .await
        .map_err(|e| Error::transport("logout request failed", e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    Ok(())
}

/// Turn a non-2xx response into `Rejected`, otherwise decode the envelope.
async fn read_success<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    what: &str,
) -> Result<Envelope<T>> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<Envelope<T>>()
        .await
        .map_err(|e| Error::InvalidResponse(format!("invalid {what} response: {e}")))
}
