//! Request dispatcher
//!
//! Issues one HTTP attempt against the backend: joins the base URL, applies the
//! timeout, attaches the bearer token unless the path is a public auth
//! endpoint, and encodes the body. It does not retry and does not interpret
//! statuses; a response of any status is `Ok`. Only "no response" is `Err`.

use std::time::{Duration, Instant};

use admin_auth::endpoints::join_url;
use admin_auth::is_public_auth_path;
use bytes::Bytes;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::metrics;
use crate::normalize::Failure;
use crate::upload::Upload;

/// Request body variants. JSON sets its own content type; multipart lets the
/// form set `multipart/form-data` with its boundary.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(Upload),
}

/// One logical request, replayable after a token refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub timeout: Option<Duration>,
    /// Set once the request has been replayed after a 401.
    pub retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            timeout: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).json(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path).json(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, path).json(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn upload(path: impl Into<String>, upload: Upload) -> Self {
        let mut request = Self::new(Method::POST, path);
        request.body = RequestBody::Multipart(upload);
        request
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn query<K: Into<String>, V: Into<String>>(
        mut self,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Public auth endpoints never carry a token and never refresh.
    pub fn is_public_auth(&self) -> bool {
        is_public_auth_path(&self.path)
    }
}

/// A response of any status, body fully read.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as JSON. An empty body (204) reads as `null`.
    pub fn json_value(&self) -> Result<Value, ApiError> {
        if self.body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&self.body).map_err(ApiError::invalid_response)
    }
}

/// HTTP transport bound to one backend.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    base_url: String,
}

impl Dispatcher {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let config = config.validated()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .user_agent(concat!("eduadmin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::local(format!("building HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }

    /// Underlying client, shared with the raw auth endpoint calls.
    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one attempt. `Err` only when no response arrived.
    #[instrument(skip_all, fields(
        request_id = %new_request_id(),
        method = %request.method,
        path = %request.path,
    ))]
    pub async fn send(&self, request: &ApiRequest, token: Option<&str>) -> Result<RawResponse, Failure> {
        let url = join_url(&self.base_url, &request.path);
        let mut builder = self.client.request(request.method.clone(), url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if !request.is_public_auth() {
            if let Some(token) = token {
                builder = builder.bearer_auth(token);
            }
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart(upload) => builder.multipart(upload.to_form()?),
        };

        let started = Instant::now();
        let response = builder.send().await.map_err(|e| transport_failure(&e))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| transport_failure(&e))?;

        metrics::record_request(
            status.as_u16(),
            request.method.as_str(),
            started.elapsed().as_secs_f64(),
        );
        debug!(status = status.as_u16(), bytes = body.len(), "response received");

        Ok(RawResponse { status, body })
    }
}

/// `req_<uuid>` id attached to every outbound call's span.
pub(crate) fn new_request_id() -> String {
    format!("req_{}", uuid::Uuid::new_v4().as_simple())
}

fn transport_failure(err: &reqwest::Error) -> Failure {
    let timed_out = err.is_timeout();
    let error_type = if timed_out { "timeout" } else { "network" };
    metrics::record_transport_error(error_type);
    warn!(error = %err, error_type, "no response from backend");
    Failure::Transport {
        timed_out,
        detail: err.to_string(),
    }
}
