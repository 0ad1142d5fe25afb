//! WiFi association with backoff.
//!
//! The [`ConnectivityManager`] drives a [`WifiRadio`] through one bounded
//! association attempt per backoff window and reports the outcome to a
//! [`ConnectivityObserver`]. On the device the radio is the cyw43 chip; in
//! tests it is a scripted fake.

pub mod manager;

use core::net::Ipv4Addr;

use heapless::String;

use crate::config::{PASSWORD_MAX_LEN, SSID_MAX_LEN};
use crate::error::ConnectFailure;

pub use manager::{ConnectOutcome, ConnectivityManager, ConnectivityState, Phase};

/// Network name and passphrase baked into the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: String<SSID_MAX_LEN>,
    pub password: String<PASSWORD_MAX_LEN>,
}

/// What the radio reports while (and after) associating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStatus {
    Idle,
    Joining,
    GotIp(Ipv4Addr),
    NoApFound,
    WrongPassword,
    ConnectFailed,
}

impl LinkStatus {
    /// Terminal failure carried by this status, if any.
    pub fn failure(self) -> Option<ConnectFailure> {
        match self {
            LinkStatus::NoApFound => Some(ConnectFailure::NoApFound),
            LinkStatus::WrongPassword => Some(ConnectFailure::WrongPassword),
            LinkStatus::ConnectFailed => Some(ConnectFailure::ConnectFailed),
            _ => None,
        }
    }
}

/// The WiFi chip, as far as association is concerned.
#[allow(async_fn_in_trait)]
pub trait WifiRadio {
    /// Start associating with `credentials`. An error is a terminal
    /// failure of this attempt.
    async fn join(&mut self, credentials: &WifiCredentials) -> Result<(), ConnectFailure>;

    /// Current link status.
    async fn status(&mut self) -> LinkStatus;
}

/// Connectivity callbacks.
pub trait ConnectivityObserver {
    fn on_connecting(&mut self, _ssid: &str) {}
    fn on_connected(&mut self, _ip: Ipv4Addr) {}
    fn on_failed(&mut self, _ssid: &str, _reason: ConnectFailure) {}
}

/// Observer that ignores everything.
impl ConnectivityObserver for () {}
