//! Shared types for the eduadmin workspace
//!
//! `Secret` keeps passwords and tokens out of logs; `Error` covers the
//! configuration loading done by the binaries.

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
