//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Default number of status checks per watch session
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// Default delay between scheduled status checks
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;

/// Default wall-clock limit for one watch session (5 minutes)
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Longest poll interval or session timeout accepted (30 days)
pub const MAX_WATCH_DURATION_SECS: u64 = 30 * 24 * 60 * 60;

/// Default per-request HTTP timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default REST API base URL
pub const DEFAULT_API_URL: &str = "https://api.surebank.app/api/v1";

/// Status endpoint path, `{reference}` is replaced by the encoded reference
pub const DEFAULT_STATUS_PATH: &str = "/payments/verify/{reference}";

/// Placeholder substituted in `status_path`
pub const REFERENCE_PLACEHOLDER: &str = "{reference}";

/// Custom URL scheme the gateway redirects to
pub const DEEP_LINK_SCHEME: &str = "surebank";

/// Host part of payment deep links
pub const DEEP_LINK_HOST: &str = "payment";

/// Deep-link action used for gateway redirects
pub const ACTION_PAYMENT_CALLBACK: &str = "payment_callback";

/// Deep-link action that opens the packages screen
pub const ACTION_OPEN_PACKAGE: &str = "open_package";

/// Markers that mean the gateway reported success
pub const SUCCESS_MARKERS: &[&str] = &["success", "successful", "completed", "payment_success"];

/// Markers that mean the gateway reported a failure
pub const ERROR_MARKERS: &[&str] = &["error", "failed", "failure", "declined", "payment_failed"];

/// Markers that mean the user walked away from the gateway
pub const CANCEL_MARKERS: &[&str] = &["cancel", "cancelled", "canceled", "abandoned"];

/// Config directory name under the home directory
pub const CONFIG_DIR_NAME: &str = ".surebank";

/// Config file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Log file name
pub const LOG_FILE_NAME: &str = "surebank-watch.log";

/// Application name
pub const APP_NAME: &str = "SureBank Watch";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
