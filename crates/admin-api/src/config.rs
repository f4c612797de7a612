//! Client configuration

use std::time::Duration;

use crate::error::ApiError;

/// Default request timeout. A request that exceeds it is a transport failure.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Backend location and request timeout.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check the scheme and timeout and strip any trailing slash.
    pub fn validated(mut self) -> Result<Self, ApiError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ApiError::local(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(ApiError::local("timeout must be greater than 0"));
        }
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        Ok(self)
    }
}
