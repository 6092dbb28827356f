//! Shared constants used across Codex crates.

/// Default gateway base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Default quiet interval before a free-text search is dispatched.
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 400;

/// Default per-request timeout for gateway calls.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Durable storage key for the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Durable storage key for the cached user profile.
pub const USER_KEY: &str = "user";

/// Durable storage key for the list of snippet ids already counted as viewed.
pub const VIEWED_SNIPPETS_KEY: &str = "viewedSnippets";

/// Volatile storage key for the admin key.
pub const ADMIN_KEY_KEY: &str = "adminKey";

/// File name of the durable store inside the state directory.
pub const STATE_FILE_NAME: &str = "state.json";

/// Header carrying the admin key on admin requests.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";
