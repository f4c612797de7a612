//! Session operations: login, logout, current user, profile.

use admin_auth::endpoints::{LOGIN_PATH, LOGOUT_PATH, ME_PATH, PROFILE_PATH};
use admin_auth::{
    AuthPayload, Envelope, ProfileUpdate, SessionUser, UserPayload, exchange_credentials, revoke,
};
use common::Secret;
use tracing::{info, instrument, warn};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::normalize::normalize;

impl ApiClient {
    /// Log in with email and password.
    ///
    /// Only admins get a session. Any other role is rejected with a 403 and
    /// nothing is stored. The login endpoint is public, so a 401 here is a
    /// plain credential failure and never triggers a refresh.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn login(
        &self,
        email: &str,
        password: &Secret<String>,
    ) -> Result<Envelope<AuthPayload>, ApiError> {
        let exchange = exchange_credentials(
            self.dispatcher().http(),
            self.dispatcher().base_url(),
            email,
            password,
        );
        let envelope = match self.auth_call(LOGIN_PATH, exchange).await {
            Ok(envelope) => envelope,
            Err(e) => return Err(self.fail(e).await),
        };

        let Some(payload) = envelope.data.as_ref() else {
            return Err(ApiError::invalid_response("login response carried no data"));
        };
        if !payload.user.is_admin() {
            warn!(user_id = %payload.user.id, role = %payload.user.role, "non-admin login rejected");
            return Err(ApiError::not_admin());
        }

        self.store()
            .establish(&payload.tokens, &payload.user)
            .await
            .map_err(normalize)?;
        info!(user_id = %payload.user.id, "admin session established");
        Ok(envelope)
    }

    /// End the session. The server-side revoke is best effort; local state
    /// is cleared whatever the server says.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> Result<(), ApiError> {
        if let Some(access) = self.store().access_token().await {
            let revoked = revoke(self.dispatcher().http(), self.dispatcher().base_url(), &access);
            if let Err(e) = self.auth_call(LOGOUT_PATH, revoked).await {
                warn!(error = %e, "server-side logout failed, clearing local session anyway");
            }
        }
        self.store().clear().await.map_err(normalize)?;
        info!("logged out");
        Ok(())
    }

    /// Fetch the logged-in user and refresh the cached copy.
    ///
    /// A user who is no longer an admin loses the session.
    pub async fn current_user(&self) -> Result<SessionUser, ApiError> {
        let UserPayload { user }: UserPayload = self.get(ME_PATH).await?;
        if !user.is_admin() {
            warn!(user_id = %user.id, role = %user.role, "session user lost admin role");
            self.force_logout().await;
            return Err(ApiError::not_admin());
        }
        if let Err(e) = self.store().update_user(&user).await {
            warn!(error = %e, "failed to cache session user");
        }
        Ok(user)
    }

    /// Update name and/or avatar of the logged-in user.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<SessionUser, ApiError> {
        if update.is_empty() {
            return Err(ApiError::new(400, "Nothing to update."));
        }
        let UserPayload { user }: UserPayload = self.put(PROFILE_PATH, update).await?;
        if let Err(e) = self.store().update_user(&user).await {
            warn!(error = %e, "failed to cache session user");
        }
        Ok(user)
    }

    /// Cached user, without a network call.
    pub async fn session_user(&self) -> Option<SessionUser> {
        self.store().user().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.store().is_authenticated().await
    }

    pub async fn is_admin(&self) -> bool {
        self.store().is_admin().await
    }
}
