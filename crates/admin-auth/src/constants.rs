//! Storage keys and role names shared by the console

/// Storage key for the bearer token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Storage key for the JSON-serialized session user.
pub const USER_KEY: &str = "user";

/// Every key a session owns. Clearing a session removes all of them at once.
pub const SESSION_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY];

/// The only role allowed into the console.
pub const ADMIN_ROLE: &str = "admin";
