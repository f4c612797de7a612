//! API client façade
//!
//! Wraps every outbound call: reads the current access token, dispatches,
//! detects expiry, runs the coordinated refresh, replays the request once, and
//! normalizes failures before they reach the caller. Presentation side
//! effects (toasts, forced login) go through the injected `Surface`.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use admin_auth::endpoints::REFRESH_PATH;
use admin_auth::{SessionStore, envelope_message, unwrap_data};
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use surface::{LogSurface, Notification, Surface};
use tracing::{Instrument, debug, info, info_span, instrument, warn};

use crate::config::ClientConfig;
use crate::dispatcher::{ApiRequest, Dispatcher, RawResponse, new_request_id};
use crate::error::{ApiError, ErrorKind, SESSION_EXPIRED_MESSAGE, generic_message};
use crate::metrics;
use crate::normalize::{Failure, normalize};
use crate::refresh::{RefreshCoordinator, RefreshOutcome, Ticket};
use crate::upload::Upload;

/// Session-aware client for the admin backend.
///
/// Owns its refresh coordinator, so two clients never share refresh state.
/// Share one client across tasks with `Arc`.
pub struct ApiClient {
    dispatcher: Dispatcher,
    store: Arc<SessionStore>,
    refresh: RefreshCoordinator,
    surface: Arc<dyn Surface>,
}

/// Builder for `ApiClient`.
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    store: Option<Arc<SessionStore>>,
    surface: Option<Arc<dyn Surface>>,
}

impl ApiClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn base_url(self, base_url: impl Into<String>) -> Self {
        self.config(ClientConfig::new(base_url))
    }

    /// Session storage. Defaults to an in-memory store.
    pub fn store(mut self, store: Arc<SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Notification sink and login navigation. Defaults to `LogSurface`.
    pub fn surface(mut self, surface: Arc<dyn Surface>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self
            .config
            .ok_or_else(|| ApiError::local("base_url is required"))?;
        let dispatcher = Dispatcher::new(config)?;
        let surface = self.surface.unwrap_or_else(|| Arc::new(LogSurface::new()));
        debug!(base_url = dispatcher.base_url(), surface = surface.id(), "api client ready");

        Ok(ApiClient {
            dispatcher,
            store: self
                .store
                .unwrap_or_else(|| Arc::new(SessionStore::in_memory())),
            refresh: RefreshCoordinator::new(),
            surface,
        })
    }
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn surface(&self) -> &Arc<dyn Surface> {
        &self.surface
    }

    pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.refresh
    }

    /// Run a request through the session layer.
    ///
    /// A 401 from a non-auth endpoint triggers one coordinated refresh and a
    /// single replay with the new token. Any failure comes back normalized.
    #[instrument(skip_all, fields(method = %request.method, path = %request.path))]
    pub async fn execute(&self, mut request: ApiRequest) -> Result<RawResponse, ApiError> {
        let token = self.store.access_token().await;
        let response = match self.dispatcher.send(&request, token.as_deref()).await {
            Ok(response) => response,
            Err(failure) => return Err(self.fail(failure).await),
        };

        if response.status == StatusCode::UNAUTHORIZED
            && !request.retried
            && !request.is_public_auth()
        {
            request.retried = true;
            debug!("access token rejected, entering refresh");
            let fresh = self.refresh_access_token(token.as_deref()).await?;
            let replay = match self.dispatcher.send(&request, Some(fresh.as_str())).await {
                Ok(response) => response,
                Err(failure) => return Err(self.fail(failure).await),
            };
            return self.check(replay).await;
        }

        self.check(response).await
    }

    /// GET, returning `data` (or the raw body).
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_and_decode(ApiRequest::get(path), false).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let request = ApiRequest::get(path).query(query.iter().copied());
        self.send_and_decode(request, false).await
    }

    /// POST; a returned `message` is shown as a success notification.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::post(path, to_json(body)?);
        self.send_and_decode(request, true).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::put(path, to_json(body)?);
        self.send_and_decode(request, true).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::patch(path, to_json(body)?);
        self.send_and_decode(request, true).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_and_decode(ApiRequest::delete(path), true).await
    }

    /// Multipart POST. Progress is reported through the upload's callback.
    pub async fn upload<T: DeserializeOwned>(&self, path: &str, upload: Upload) -> Result<T, ApiError> {
        self.send_and_decode(ApiRequest::upload(path, upload), true)
            .await
    }

    /// Clear the session and send the user to the login screen.
    pub async fn force_logout(&self) {
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "failed to clear session");
        }
        self.surface.redirect_to_login();
    }

    /// Run a token endpoint call under a request span and record it like a
    /// dispatched request.
    pub(crate) async fn auth_call<T>(
        &self,
        path: &'static str,
        call: impl Future<Output = admin_auth::Result<T>>,
    ) -> admin_auth::Result<T> {
        let span = info_span!("auth_call", request_id = %new_request_id(), method = "POST", path);
        let started = Instant::now();
        let result = call.instrument(span).await;
        metrics::record_auth_call(&result, started.elapsed().as_secs_f64());
        result
    }

    async fn send_and_decode<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        announce: bool,
    ) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        let body = response.json_value()?;
        if announce {
            if let Some(message) = envelope_message(&body) {
                self.surface.notify(Notification::success(message));
            }
        }
        serde_json::from_value(unwrap_data(body)).map_err(ApiError::invalid_response)
    }

    async fn check(&self, response: RawResponse) -> Result<RawResponse, ApiError> {
        if response.is_success() {
            return Ok(response);
        }
        Err(self
            .fail(Failure::Status {
                status: response.status.as_u16(),
                body: response.body,
            })
            .await)
    }

    /// Normalize a failure and apply its presentation side effects.
    pub(crate) async fn fail(&self, failure: impl Into<Failure>) -> ApiError {
        let err = normalize(failure);
        warn!(status = err.status, code = ?err.code, message = %err.message, "request failed");

        match err.kind() {
            ErrorKind::Transport => {
                self.surface.notify(Notification::error(err.message.clone()));
            }
            ErrorKind::Forbidden => {
                let message = if err.message.starts_with("Access denied") {
                    err.message.clone()
                } else {
                    format!("Access denied: {}", err.message)
                };
                self.surface.notify(Notification::error(message));
                if err.denies_admin_access() {
                    warn!("admin privileges revoked, ending session");
                    self.force_logout().await;
                }
            }
            ErrorKind::NotFound | ErrorKind::RateLimit | ErrorKind::Server => {
                self.surface
                    .notify(Notification::error(generic_message(err.status)));
            }
            ErrorKind::Validation | ErrorKind::Auth | ErrorKind::Client | ErrorKind::Local => {}
        }
        err
    }

    /// Join the refresh cycle for a request that was sent with `stale`.
    async fn refresh_access_token(&self, stale: Option<&str>) -> RefreshOutcome {
        let guard = match self.refresh.join() {
            Ticket::Follower(waiter) => return waiter.wait().await,
            Ticket::Leader(guard) => guard,
        };
        let outcome = self.run_refresh(stale).await;
        guard.settle(&outcome);
        outcome
    }

    /// Leader side of a refresh cycle.
    async fn run_refresh(&self, stale: Option<&str>) -> RefreshOutcome {
        let tokens = self.store.tokens().await;

        // A previous cycle already rotated the token this request was sent with
        if let Some(current) = tokens.access_token.as_deref() {
            if Some(current) != stale {
                debug!("access token already rotated, skipping refresh");
                metrics::record_refresh("already_rotated");
                return Ok(current.to_owned());
            }
        }

        let Some(refresh) = tokens.refresh_token else {
            metrics::record_refresh("no_refresh_token");
            // Sent with a token that is gone now: the session already ended
            // (failed refresh or logout) and whoever ended it handled login
            if stale.is_some() && tokens.access_token.is_none() {
                debug!("session ended while request was in flight");
                return Err(ApiError::session_expired());
            }
            warn!("no refresh token stored, ending session");
            self.force_logout().await;
            return Err(ApiError::session_expired());
        };

        let refreshed = self
            .auth_call(
                REFRESH_PATH,
                admin_auth::refresh_token(self.dispatcher.http(), self.dispatcher.base_url(), &refresh),
            )
            .await;
        match refreshed {
            Ok(pair) => {
                if let Err(e) = self.store.update_tokens(&pair).await {
                    warn!(error = %e, "failed to persist refreshed tokens");
                }
                metrics::record_refresh("success");
                info!("access token refreshed");
                Ok(pair.access_token)
            }
            Err(e) => {
                let err = normalize(e);
                warn!(status = err.status, error = %err, "token refresh failed, ending session");
                metrics::record_refresh("failure");
                self.surface
                    .notify(Notification::warning(SESSION_EXPIRED_MESSAGE));
                self.force_logout().await;
                Err(err)
            }
        }
    }
}

fn to_json<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::local(format!("serializing request body: {e}")))
}
