//! Backend endpoint paths and their auth classification

/// Prefix shared by every auth endpoint.
pub const AUTH_PREFIX: &str = "/api/auth/";

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const LOGOUT_PATH: &str = "/api/auth/logout";
pub const REFRESH_PATH: &str = "/api/auth/refresh-token";
pub const ME_PATH: &str = "/api/auth/me";
pub const PROFILE_PATH: &str = "/api/users/profile";

/// Prefix for admin resource CRUD.
pub const ADMIN_PREFIX: &str = "/api/admin";

/// Auth endpoints that are called without a bearer token. A 401 from one of
/// these is a credential rejection, never an expired session.
pub const PUBLIC_AUTH_ENDPOINTS: &[&str] = &[
    "login",
    "signup",
    "register",
    "refresh-token",
    "forgot-password",
    "reset-password",
    "verify-email",
];

/// Whether `path` targets a public auth endpoint.
///
/// Accepts bare paths or full URLs. Matching is on the first segment after
/// `/api/auth/`, so `/api/auth/reset-password/<token>` is public while
/// `/api/auth/me` and `/api/auth/logout` are not.
pub fn is_public_auth_path(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    path.find(AUTH_PREFIX)
        .map(|idx| &path[idx + AUTH_PREFIX.len()..])
        .and_then(|rest| rest.split('/').next())
        .is_some_and(|segment| PUBLIC_AUTH_ENDPOINTS.contains(&segment))
}

/// Join a base URL and an absolute path without doubling the slash.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
