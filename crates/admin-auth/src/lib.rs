//! Session primitives for the eduadmin console
//!
//! Provides the backend wire types, the persistent session store, and the raw
//! calls to the token endpoints. This crate knows nothing about retries or
//! refresh coordination; `admin-api` layers those on top.
//!
//! Session flow:
//! 1. `token::exchange_credentials()` trades email/password for an `AuthPayload`
//! 2. `SessionStore::establish()` persists tokens and user in one write
//! 3. On expiry, `token::refresh_token()` returns a new `TokenPair`
//! 4. `SessionStore::update_tokens()` stores the rotated pair
//! 5. `token::revoke()` + `SessionStore::clear()` end the session

pub mod constants;
pub mod endpoints;
pub mod envelope;
pub mod error;
pub mod session;
pub mod token;
pub mod user;

pub use constants::*;
pub use endpoints::is_public_auth_path;
pub use envelope::{Envelope, FieldError, envelope_message, unwrap_data};
pub use error::{Error, Result};
pub use session::{SessionStore, StoredTokens};
pub use token::{AuthPayload, TokenPair, exchange_credentials, refresh_token, revoke};
pub use user::{ProfileUpdate, SessionUser, UserPayload};
