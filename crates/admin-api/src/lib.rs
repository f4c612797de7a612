//! Session-aware API client for the eduadmin console
//!
//! Every backend call goes through [`ApiClient`], which:
//! 1. Attaches the stored bearer token (except on public auth endpoints)
//! 2. On a 401, joins a single shared refresh and replays the request once
//! 3. Normalizes failures into [`ApiError`] and reports them to the [`Surface`]
//! 4. Unwraps the `{success, message, data}` envelope
//!
//! [`Surface`]: surface::Surface

pub mod auth;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod normalize;
pub mod refresh;
pub mod resources;
pub mod upload;

pub use client::{ApiClient, ApiClientBuilder};
pub use config::{ClientConfig, DEFAULT_TIMEOUT};
pub use dispatcher::{ApiRequest, Dispatcher, RawResponse, RequestBody};
pub use error::{ApiError, ErrorKind, NETWORK_ERROR_MESSAGE, NOT_ADMIN_MESSAGE, SESSION_EXPIRED_MESSAGE};
pub use normalize::{Failure, normalize};
pub use refresh::{RefreshCoordinator, RefreshOutcome};
pub use resources::{Resource, ResourceParseError};
pub use upload::{Upload, UploadProgress};
