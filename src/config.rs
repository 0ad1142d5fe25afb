//! Application-wide constants and compile-time configuration.
//!
//! All timing parameters, capacities, and protocol constants live here
//! so they can be tuned in one place. Pin assignments live in the
//! per-revision layout table (`input::layout`).

// Gestures

/// Hold time before a press becomes a long press (ms).
pub const LONG_PRESS_MS: u64 = 1500;

/// How long exactly four keys must be held to request an update check (ms).
pub const UPDATE_COMBO_MS: u64 = 5000;

/// How long exactly two keys must be held to request BLE pairing (ms).
pub const PAIRING_COMBO_MS: u64 = 5000;

/// Number of simultaneously held keys that arms the pairing combination.
pub const PAIRING_COMBO_KEYS: usize = 2;

/// Number of simultaneously held keys that arms the update combination.
pub const UPDATE_COMBO_KEYS: usize = 4;

/// Inactivity after a dial turn before the selection feedback clears (ms).
pub const DIAL_IDLE_MS: u64 = 1000;

/// Minimum time between accepted state changes of one key (ms).
/// 0 disables the settle window: every genuine level change is accepted.
pub const BUTTON_DEBOUNCE_MS: u64 = 0;

/// Depth of the pin edge channel between the edge tasks and the main loop.
pub const EDGE_QUEUE_DEPTH: usize = 32;

/// Upper bound on logical keys in any layout.
pub const MAX_KEYS: usize = 16;

/// Upper bound on dial routines.
pub const MAX_DIAL_OPTIONS: usize = 8;

/// Upper bound on simultaneously armed gesture timers.
pub const MAX_TIMERS: usize = 40;

// Outbound requests

/// Maximum number of requests in flight at once.
pub const REQUEST_QUEUE_CAPACITY: usize = 5;

/// Default per-request timeout (ms).
pub const REQUEST_TIMEOUT_MS: u64 = 5000;

/// Accepted range for a per-request timeout (ms).
pub const REQUEST_TIMEOUT_MIN_MS: u64 = 2000;
pub const REQUEST_TIMEOUT_MAX_MS: u64 = 5000;

/// TCP connect timeout when opening a request socket (ms).
pub const SOCKET_CONNECT_TIMEOUT_MS: u64 = 2000;

/// Upper bound on a single `poll()` wait (ms).
pub const POLL_WAIT_MS: u64 = 500;

/// Bytes read from a ready socket; only the status line is inspected.
pub const RESPONSE_BUFFER_LEN: usize = 256;

/// Maximum length of an encoded webhook request.
pub const PAYLOAD_MAX_LEN: usize = 256;

/// Home Assistant listens here unless configured otherwise.
pub const HUB_DEFAULT_PORT: u16 = 8123;

// WiFi

/// Minimum time between two association attempts (seconds).
pub const WIFI_BACKOFF_SECS: u64 = 30;

/// Status polls per association attempt.
pub const WIFI_STATUS_ATTEMPTS: u32 = 10;

/// Delay between status polls (ms).
pub const WIFI_STATUS_INTERVAL_MS: u32 = 1000;

/// How often the main loop checks the link and reconnects (seconds).
pub const HEALTH_CHECK_SECS: u64 = 10;

// Settings

/// Maximum length of the remote's display name.
pub const NAME_MAX_LEN: usize = 32;

/// Maximum SSID length (802.11).
pub const SSID_MAX_LEN: usize = 32;

/// Maximum WPA2 passphrase length.
pub const PASSWORD_MAX_LEN: usize = 64;

/// Maximum length of a dial routine name.
pub const ROUTINE_NAME_MAX_LEN: usize = 24;

/// Maximum length of a logical key label including a `-long` suffix.
pub const KEY_LABEL_MAX_LEN: usize = 32;
