//! Workspace-wide constants.

/// Header carrying the bearer token on every authorized request.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Cache table behind the singleton settings slot.
pub const SETTINGS_TABLE: &str = "settings";
