//! Shared constants for the Inci-Alert clients.

/// Base URL of the incident API when nothing overrides it.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

/// Storage key (and file name) under which the bearer token is persisted.
pub const TOKEN_STORAGE_KEY: &str = "auth_token";

/// Directory created under the user's data dir for persisted client state.
pub const APP_DIR_NAME: &str = "incialert";

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Interval between unconditional live-alert refreshes.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Largest attachment accepted by the report form (10 MiB).
pub const MAX_MEDIA_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Multipart field name carrying each attached media file.
pub const MEDIA_FORM_FIELD: &str = "media";

/// Categories offered by the report form, as `(value, label)`.
pub const REPORT_CATEGORIES: &[(&str, &str)] = &[
    ("fire", "Fire Emergency"),
    ("medical", "Medical Emergency"),
    ("accident", "Traffic Accident"),
    ("crime", "Criminal Activity"),
    ("natural", "Natural Disaster"),
    ("infrastructure", "Infrastructure Failure"),
    ("hazmat", "Hazardous Materials"),
    ("other", "Other"),
];
