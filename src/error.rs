//! Errors of the request queue, the WiFi manager and settings parsing.
//!
//! Each concern has its own small `Copy` enum; [`Error`] wraps them for
//! callers that only need to log. With the `defmt` feature every enum can
//! be printed on the probe as-is.

use core::fmt;

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Requests
    /// The outbound request queue rejected a request.
    Queue(QueueError),

    // WiFi
    /// Association with the access point failed.
    Wifi(ConnectFailure),

    // Settings
    /// The baked-in settings are invalid.
    Settings(SettingsError),
}

/// Why `enqueue` did not put a request in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueueError {
    /// Queue already holds its maximum number of requests.
    Full,
    /// Opening a socket to the hub failed.
    Connect,
    /// The payload could not be transmitted.
    Send,
}

/// Terminal failure classes of one association attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectFailure {
    NoApFound,
    WrongPassword,
    ConnectFailed,
    /// Status polling ran out without a terminal status.
    Timeout,
}

impl ConnectFailure {
    /// All failure classes, in counter order.
    pub const ALL: [ConnectFailure; 4] = [
        ConnectFailure::NoApFound,
        ConnectFailure::WrongPassword,
        ConnectFailure::ConnectFailed,
        ConnectFailure::Timeout,
    ];

    /// Short human-readable reason.
    pub fn message(self) -> &'static str {
        match self {
            ConnectFailure::NoApFound => "no access point found",
            ConnectFailure::WrongPassword => "wrong password",
            ConnectFailure::ConnectFailed => "connect failed",
            ConnectFailure::Timeout => "timeout",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            ConnectFailure::NoApFound => 0,
            ConnectFailure::WrongPassword => 1,
            ConnectFailure::ConnectFailed => 2,
            ConnectFailure::Timeout => 3,
        }
    }
}

impl fmt::Display for ConnectFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Problems found while building the settings snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsError {
    NameTooLong,
    /// Hub address is not a dotted IPv4 address.
    InvalidHost,
    InvalidPort,
    SsidTooLong,
    PasswordTooLong,
    /// Layout string does not name a supported hardware revision.
    UnknownLayout,
    TooManyRoutines,
    /// A dial routine is not of the form `name:r,g,b`.
    MalformedRoutine,
}

// Convenience conversions

impl From<QueueError> for Error {
    fn from(e: QueueError) -> Self {
        Error::Queue(e)
    }
}

impl From<ConnectFailure> for Error {
    fn from(e: ConnectFailure) -> Self {
        Error::Wifi(e)
    }
}

impl From<SettingsError> for Error {
    fn from(e: SettingsError) -> Self {
        Error::Settings(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Queue(e) => write!(f, "request queue: {:?}", e),
            Error::Wifi(e) => write!(f, "wifi: {}", e),
            Error::Settings(e) => write!(f, "settings: {:?}", e),
        }
    }
}
