//! Outbound requests and their outcomes.
//!
//! A request moves through `created -> in flight -> {succeeded | failed |
//! expired}`. The stages are distinct types: a [`Request`] is created by
//! the caller, the queue turns it into an in-flight entry that owns one
//! socket, and completion moves the caller's context into exactly one
//! [`RequestObserver`] call. Nothing is left behind that could complete
//! twice.

use core::fmt;

use embassy_time::Duration;

use crate::config::{REQUEST_TIMEOUT_MAX_MS, REQUEST_TIMEOUT_MIN_MS, REQUEST_TIMEOUT_MS};

use super::status::StatusLine;
use super::webhook::Payload;

/// Queue-assigned identifier, used for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RequestId(pub u32);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What went wrong underneath the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportFault {
    /// No route to the hub; the WiFi link is probably gone.
    Unreachable,
    /// The hub actively refused the connection.
    Refused,
    /// Connecting took longer than allowed.
    ConnectTimeout,
    /// The connection broke mid-request.
    Reset,
    /// Every socket is busy.
    NoSocket,
}

/// Why a request failed. Exactly one is reported per failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Expired before the hub answered.
    Timeout,
    /// The hub answered with a non-2xx status.
    Status(StatusLine),
    /// The response did not start with a status line.
    Malformed,
    /// The hub closed the connection without answering.
    Closed,
    Transport(TransportFault),
}

impl Failure {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Failure::Transport(TransportFault::Unreachable))
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Timeout => f.write_str("timed out"),
            Failure::Status(line) => write!(f, "status {}", line.code),
            Failure::Malformed => f.write_str("malformed response"),
            Failure::Closed => f.write_str("closed without response"),
            Failure::Transport(fault) => write!(f, "transport {:?}", fault),
        }
    }
}

/// A request that has not been handed to the queue yet.
#[derive(Debug)]
pub struct Request<C> {
    pub payload: Payload,
    pub timeout: Duration,
    /// Caller data handed back on completion.
    pub context: C,
}

impl<C> Request<C> {
    pub fn new(payload: Payload, context: C) -> Self {
        Self {
            payload,
            timeout: Duration::from_millis(REQUEST_TIMEOUT_MS),
            context,
        }
    }

    /// Override the timeout; clamped to the supported 2-5 s range.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let ms = timeout
            .as_millis()
            .clamp(REQUEST_TIMEOUT_MIN_MS, REQUEST_TIMEOUT_MAX_MS);
        self.timeout = Duration::from_millis(ms);
        self
    }
}

/// Completion callbacks. The context moves into exactly one of them.
pub trait RequestObserver<C> {
    fn on_success(&mut self, id: RequestId, context: C, status: &StatusLine);
    fn on_failure(&mut self, id: RequestId, context: C, failure: &Failure);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_clamped() {
        let short = Request::new(Payload::new(), ()).with_timeout(Duration::from_millis(100));
        assert_eq!(short.timeout, Duration::from_millis(REQUEST_TIMEOUT_MIN_MS));

        let long = Request::new(Payload::new(), ()).with_timeout(Duration::from_secs(60));
        assert_eq!(long.timeout, Duration::from_millis(REQUEST_TIMEOUT_MAX_MS));

        let ok = Request::new(Payload::new(), ()).with_timeout(Duration::from_millis(3_000));
        assert_eq!(ok.timeout, Duration::from_millis(3_000));
    }
}
