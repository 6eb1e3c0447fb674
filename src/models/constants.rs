/// File name of the shared session snapshot when the cache is not keyed by identity.
pub const DEFAULT_STORAGE_STATE_FILE: &str = "storage-state.json";

/// Local-storage entry holding the application's bearer token.
pub const TOKEN_ENTRY_NAME: &str = "token";

/// Prefix the application stores in front of the raw JWT.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Account used whenever an interactive sign-in is needed.
pub const DEFAULT_USER_EMAIL: &str = "test+e1f76f13-0f04-4f2e-86d8-0e78e3df2ddd@test.com";
pub const DEFAULT_USER_PASSWORD: &str = "xotabu4@gmail.com";

/// Number of hex characters of the email digest used in keyed snapshot names.
pub const IDENTITY_DIGEST_LEN: usize = 16;

/// Environment variable read by `logging::init` for the tracing filter.
pub const LOG_ENV_VAR: &str = "AUTHCACHE_LOG";
