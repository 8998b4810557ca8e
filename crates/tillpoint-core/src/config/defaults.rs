//! Default configuration values.

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:4780/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DB_PATH: &str = "tillpoint.db";
pub const DEFAULT_MAX_REPLAY_ATTEMPTS: u32 = 8;
