//! Persistent session storage
//!
//! A flat key/value map holding `accessToken`, `refreshToken` and `user`
//! (JSON-serialized), the same three keys the browser console keeps in local
//! storage. File-backed stores write with temp-file + rename so a crash never
//! leaves a half-written session. A tokio Mutex serializes writes from login,
//! refresh and logout.
//!
//! The two tokens are always written together and all three keys are removed
//! together, so a reader never sees an access token without its refresh token.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, SESSION_KEYS, USER_KEY};
use crate::error::{Error, Result};
use crate::token::TokenPair;
use crate::user::SessionUser;

/// Snapshot of the stored tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Session key/value store, optionally persisted to a JSON file.
pub struct SessionStore {
    path: Option<PathBuf>,
    state: Mutex<HashMap<String, String>>,
}

impl SessionStore {
    /// Load the session from the given file path.
    ///
    /// A missing file is a logged-out session; the file is created as `{}`.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading session file: {e}")))?;
            let entries: HashMap<String, String> = serde_json::from_str(&contents)
                .map_err(|e| Error::SessionParse(format!("parsing session file: {e}")))?;
            info!(path = %path.display(), keys = entries.len(), "loaded session");
            entries
        } else {
            info!(path = %path.display(), "session file not found, starting logged out");
            let entries = HashMap::new();
            write_atomic(&path, &entries).await?;
            entries
        };

        Ok(Self {
            path: Some(path),
            state: Mutex::new(state),
        })
    }

    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Raw value for one storage key.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.state.lock().await.get(key).cloned()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY).await
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY).await
    }

    /// Both tokens read under one lock.
    pub async fn tokens(&self) -> StoredTokens {
        let state = self.state.lock().await;
        StoredTokens {
            access_token: state.get(ACCESS_TOKEN_KEY).cloned(),
            refresh_token: state.get(REFRESH_TOKEN_KEY).cloned(),
        }
    }

    /// The cached user. A corrupt entry is logged and treated as absent.
    pub async fn user(&self) -> Option<SessionUser> {
        let raw = self.get(USER_KEY).await?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "cached user is not valid JSON, ignoring");
                None
            }
        }
    }

    /// Store tokens and user in a single write after a successful login.
    pub async fn establish(&self, tokens: &TokenPair, user: &SessionUser) -> Result<()> {
        let user_json = serde_json::to_string(user)
            .map_err(|e| Error::SessionParse(format!("serializing user: {e}")))?;
        let mut state = self.state.lock().await;
        state.insert(ACCESS_TOKEN_KEY.into(), tokens.access_token.clone());
        state.insert(REFRESH_TOKEN_KEY.into(), tokens.refresh_token.clone());
        state.insert(USER_KEY.into(), user_json);
        debug!(user_id = %user.id, "session established");
        self.persist(&state).await
    }

    /// Replace both tokens after a refresh.
    pub async fn update_tokens(&self, tokens: &TokenPair) -> Result<()> {
        let mut state = self.state.lock().await;
        state.insert(ACCESS_TOKEN_KEY.into(), tokens.access_token.clone());
        state.insert(REFRESH_TOKEN_KEY.into(), tokens.refresh_token.clone());
        debug!("session tokens rotated");
        self.persist(&state).await
    }

    /// Replace the cached user (after `/auth/me` or a profile update).
    pub async fn update_user(&self, user: &SessionUser) -> Result<()> {
        let user_json = serde_json::to_string(user)
            .map_err(|e| Error::SessionParse(format!("serializing user: {e}")))?;
        let mut state = self.state.lock().await;
        state.insert(USER_KEY.into(), user_json);
        self.persist(&state).await
    }

    /// Remove every session key in one write.
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        for key in SESSION_KEYS {
            state.remove(key);
        }
        debug!("session cleared");
        self.persist(&state).await
    }

    /// A bearer token and a user are both cached.
    pub async fn is_authenticated(&self) -> bool {
        let state = self.state.lock().await;
        state.contains_key(ACCESS_TOKEN_KEY) && state.contains_key(USER_KEY)
    }

    pub async fn is_admin(&self) -> bool {
        self.is_authenticated().await && self.user().await.is_some_and(|u| u.is_admin())
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn persist(&self, state: &HashMap<String, String>) -> Result<()> {
        match &self.path {
            Some(path) => write_atomic(path, state).await,
            None => Ok(()),
        }
    }
}

/// Write the session map to a file atomically with 0600 permissions.
async fn write_atomic(path: &Path, data: &HashMap<String, String>) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::SessionParse(format!("serializing session: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("session path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".session.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp session file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting session file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp session file: {e}")))?;

    debug!(path = %path.display(), "persisted session");
    Ok(())
}
