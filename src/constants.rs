//! Application-wide constants for tuning and configuration
//!
//! Centralizes magic numbers to make them discoverable and configurable.

/// Backend origin used when neither the config file nor the environment
/// provides one.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080";

/// Environment variable that overrides the configured endpoint.
pub const ENDPOINT_ENV_VAR: &str = "TCMAIL_ENDPOINT";

/// Per-request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Folder count polling interval in milliseconds.
pub const FOLDER_COUNT_POLL_MS: u64 = 900;

/// Message list polling interval in milliseconds.
pub const MESSAGE_POLL_MS: u64 = 2000;

/// Account directory polling interval in milliseconds (compose mode only).
pub const ACCOUNT_LIST_POLL_MS: u64 = 3000;

/// Number of messages requested per page.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Largest page size the backend honors.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Subject prefix for replies.
pub const REPLY_PREFIX: &str = "Re:";

/// How often the terminal driver checks for state changes to print.
pub const RENDER_INTERVAL_MS: u64 = 250;
