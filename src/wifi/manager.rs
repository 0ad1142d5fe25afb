//! Rate-limited association state machine.
//!
//! `connect()` is safe to call from a periodic health check: inside the
//! backoff window it returns immediately without touching the radio.

use core::net::Ipv4Addr;

use embassy_time::{Duration, Instant};
use embedded_hal_async::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::{WIFI_BACKOFF_SECS, WIFI_STATUS_ATTEMPTS, WIFI_STATUS_INTERVAL_MS};
use crate::error::ConnectFailure;
use crate::time::Clock;
use crate::timers::{TimerQueue, TimerTag};

use super::{ConnectivityObserver, LinkStatus, WifiCredentials, WifiRadio};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    Idle,
    Connecting,
    Connected,
    Failed,
}

/// Result of one `connect()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectOutcome {
    /// Still inside the backoff window; nothing was attempted.
    Skipped,
    Connected(Ipv4Addr),
    Failed(ConnectFailure),
}

/// Everything the manager remembers between attempts.
#[derive(Debug)]
pub struct ConnectivityState {
    phase: Phase,
    last_ip: Option<Ipv4Addr>,
    backoff: TimerQueue<1>,
    attempts: u32,
    failures: [u32; ConnectFailure::ALL.len()],
    suspect: bool,
}

impl ConnectivityState {
    const fn new() -> Self {
        Self {
            phase: Phase::Idle,
            last_ip: None,
            backoff: TimerQueue::new(),
            attempts: 0,
            failures: [0; ConnectFailure::ALL.len()],
            suspect: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Address from the most recent successful association.
    pub fn last_ip(&self) -> Option<Ipv4Addr> {
        self.last_ip
    }

    /// End of the current backoff window, if one was ever armed.
    pub fn backoff_until(&self) -> Option<Instant> {
        self.backoff.deadline(TimerTag::Backoff)
    }

    /// Attempts that actually reached the radio.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn failures(&self, reason: ConnectFailure) -> u32 {
        self.failures[reason.index()]
    }

    /// The hub was unreachable since the last successful association.
    pub fn is_suspect(&self) -> bool {
        self.suspect
    }

    fn in_backoff(&mut self, now: Instant) -> bool {
        // An expired window is popped so it reads as disarmed.
        while self.backoff.pop_due(now).is_some() {}
        self.backoff.is_armed(TimerTag::Backoff)
    }
}

pub struct ConnectivityManager<R, K, D> {
    radio: R,
    clock: K,
    delay: D,
    credentials: WifiCredentials,
    backoff: Duration,
    state: ConnectivityState,
}

impl<R: WifiRadio, K: Clock, D: DelayNs> ConnectivityManager<R, K, D> {
    pub fn new(radio: R, clock: K, delay: D, credentials: WifiCredentials) -> Self {
        Self {
            radio,
            clock,
            delay,
            credentials,
            backoff: Duration::from_secs(WIFI_BACKOFF_SECS),
            state: ConnectivityState::new(),
        }
    }

    pub fn state(&self) -> &ConnectivityState {
        &self.state
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn ssid(&self) -> &str {
        &self.credentials.ssid
    }

    /// Make one association attempt unless a previous attempt started less
    /// than the backoff window ago.
    ///
    /// The window is armed before the radio is touched, whatever the
    /// outcome turns out to be. The attempt polls the link status up to
    /// ten times, one second apart.
    pub async fn connect(&mut self, observer: &mut impl ConnectivityObserver) -> ConnectOutcome {
        let now = self.clock.now();
        if self.state.in_backoff(now) {
            debug!("connect skipped, backing off");
            return ConnectOutcome::Skipped;
        }

        self.state.backoff.arm(TimerTag::Backoff, now + self.backoff);
        self.state.attempts += 1;
        self.state.phase = Phase::Connecting;
        info!("connecting to \"{}\"", self.credentials.ssid.as_str());
        observer.on_connecting(&self.credentials.ssid);

        if let Err(reason) = self.radio.join(&self.credentials).await {
            return self.fail(reason, observer);
        }

        for _ in 0..WIFI_STATUS_ATTEMPTS {
            let status = self.radio.status().await;
            if let LinkStatus::GotIp(ip) = status {
                self.state.phase = Phase::Connected;
                self.state.last_ip = Some(ip);
                self.state.suspect = false;
                info!("wifi connected ({})", ip);
                observer.on_connected(ip);
                return ConnectOutcome::Connected(ip);
            }
            if let Some(reason) = status.failure() {
                return self.fail(reason, observer);
            }
            info!("waiting for \"{}\"...", self.credentials.ssid.as_str());
            self.delay.delay_ms(WIFI_STATUS_INTERVAL_MS).await;
        }

        self.fail(ConnectFailure::Timeout, observer)
    }

    /// Re-read the radio. A link that dropped since it was last seen up is
    /// demoted to [`Phase::Idle`].
    ///
    /// A link marked lost reads as down, whatever the radio says, until the
    /// next successful `connect()`.
    pub async fn is_connected(&mut self) -> bool {
        if self.state.suspect {
            return false;
        }
        let up = matches!(self.radio.status().await, LinkStatus::GotIp(_));
        if !up && self.state.phase == Phase::Connected {
            warn!("wifi link lost");
            self.state.phase = Phase::Idle;
        }
        up
    }

    /// Demote the link after the hub turned out to be unreachable.
    pub fn mark_link_lost(&mut self) {
        self.state.suspect = true;
        if self.state.phase == Phase::Connected {
            warn!("hub unreachable, treating wifi link as lost");
            self.state.phase = Phase::Idle;
        }
    }

    fn fail(
        &mut self,
        reason: ConnectFailure,
        observer: &mut impl ConnectivityObserver,
    ) -> ConnectOutcome {
        self.state.phase = Phase::Failed;
        self.state.failures[reason.index()] += 1;
        warn!(
            "failed to connect to \"{}\": {}",
            self.credentials.ssid.as_str(),
            reason
        );
        observer.on_failed(&self.credentials.ssid, reason);
        ConnectOutcome::Failed(reason)
    }
}
