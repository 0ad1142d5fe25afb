//! Application glue.
//!
//! [`Remote`] turns gestures into webhook requests and colours, and turns
//! request and WiFi outcomes back into colours. [`App`] owns the three
//! subsystems and runs one main-loop pass per [`App::tick`].

use core::net::Ipv4Addr;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Receiver;
use embassy_time::{Duration, Instant};
use embedded_hal_async::delay::DelayNs;
use heapless::{Deque, String};
use log::{debug, info, warn};

use crate::config::{
    HEALTH_CHECK_SECS, KEY_LABEL_MAX_LEN, NAME_MAX_LEN, POLL_WAIT_MS, REQUEST_QUEUE_CAPACITY,
};
use crate::error::ConnectFailure;
use crate::feedback::{self, Feedback};
use crate::input::{DialOption, Edge, GestureEngine, GestureSink, Key};
use crate::net::webhook;
use crate::net::{
    Failure, Rejected, Request, RequestId, RequestObserver, RequestQueue, StatusLine, Transport,
};
use crate::settings::HubAddress;
use crate::time::Clock;
use crate::wifi::{ConnectivityManager, ConnectivityObserver, WifiRadio};

// ═══════════════════════════════════════════════════════════════════════════
// Collaborators
// ═══════════════════════════════════════════════════════════════════════════

/// BLE pairing, started on demand.
pub trait Pairing {
    fn start_pairing(&mut self);
}

/// Firmware update manager.
pub trait Updater {
    /// Whether a scheduled update check is due.
    fn should_check_update(&mut self) -> bool {
        false
    }

    fn try_update(&mut self);
}

// ═══════════════════════════════════════════════════════════════════════════
// Remote
// ═══════════════════════════════════════════════════════════════════════════

/// What a request was sent for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    pub button: String<KEY_LABEL_MAX_LEN>,
    pub long: bool,
}

pub struct Remote<F> {
    name: String<NAME_MAX_LEN>,
    hub: HubAddress,
    feedback: F,
    outbox: Deque<Request<Pending>, REQUEST_QUEUE_CAPACITY>,
    update_requested: bool,
    link_lost: bool,
}

impl<F: Feedback> Remote<F> {
    pub fn new(name: String<NAME_MAX_LEN>, hub: HubAddress, feedback: F) -> Self {
        Self {
            name,
            hub,
            feedback,
            outbox: Deque::new(),
            update_requested: false,
            link_lost: false,
        }
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    pub fn feedback_mut(&mut self) -> &mut F {
        &mut self.feedback
    }

    /// Next request waiting to be handed to the queue.
    pub fn take_outbound(&mut self) -> Option<Request<Pending>> {
        self.outbox.pop_front()
    }

    pub fn outbound_len(&self) -> usize {
        self.outbox.len()
    }

    /// Consume the update latch.
    pub fn take_update_request(&mut self) -> bool {
        core::mem::take(&mut self.update_requested)
    }

    /// Consume the "hub unreachable" flag.
    pub fn take_link_lost(&mut self) -> bool {
        core::mem::take(&mut self.link_lost)
    }

    /// A request the queue had no room for. It is reported like a failed one.
    pub fn reject(&mut self, request: Request<Pending>) {
        warn!("queue full, \"{}\" not sent", request.context.button.as_str());
        self.feedback
            .flash(feedback::FAILURE, feedback::REQUEST_FAILURE_FLASHES);
    }

    fn send(&mut self, button: &str, long: bool) {
        let payload = match webhook::remote_press(&self.hub, &self.name, button, long) {
            Ok(payload) => payload,
            Err(_) => {
                warn!("webhook for \"{}\" does not fit, dropping", button);
                return;
            }
        };
        let pending = Pending {
            button: String::try_from(button).unwrap_or_default(),
            long,
        };
        if self.outbox.push_back(Request::new(payload, pending)).is_err() {
            warn!("outbox full, dropping \"{}\"", button);
        }
    }
}

impl<F: Feedback> GestureSink for Remote<F> {
    fn on_press(&mut self, key: Key) {
        info!("press {}", key);
        self.feedback.show(feedback::PROGRESS);
        self.send(key.as_str(), false);
    }

    fn on_long_press(&mut self, key: Key) {
        info!("long press {}", key);
        self.feedback.show(feedback::LONG_PRESS);
        self.send(key.as_str(), true);
    }

    fn on_release(&mut self, key: Key) {
        debug!("release {}", key);
    }

    fn on_update(&mut self) {
        info!("update requested");
        self.update_requested = true;
    }

    fn on_dial_turn(&mut self, option: &DialOption) {
        self.feedback.show(option.color);
    }

    fn on_dial_press(&mut self, option: &DialOption, long: bool) {
        info!("dial press {} (long: {})", option.name.as_str(), long);
        self.feedback.show(option.color);
        self.send(&option.name, long);
    }

    fn on_dial_idle(&mut self) {
        self.feedback.off();
    }

    fn on_inputs_enabled(&mut self, enabled: bool) {
        info!("inputs {}", if enabled { "enabled" } else { "disabled" });
        if !enabled {
            self.feedback.off();
        }
    }
}

impl<F: Feedback> RequestObserver<Pending> for Remote<F> {
    fn on_success(&mut self, id: RequestId, pending: Pending, status: &StatusLine) {
        debug!("{} {} -> {}", id, pending.button.as_str(), status.code);
        self.feedback.off();
    }

    fn on_failure(&mut self, id: RequestId, pending: Pending, failure: &Failure) {
        warn!("{} {} failed: {}", id, pending.button.as_str(), failure);
        if failure.is_unreachable() {
            self.link_lost = true;
        }
        self.feedback
            .flash(feedback::FAILURE, feedback::REQUEST_FAILURE_FLASHES);
    }
}

impl<F: Feedback> ConnectivityObserver for Remote<F> {
    fn on_connecting(&mut self, _ssid: &str) {
        self.feedback.show(feedback::CONNECTING);
    }

    fn on_connected(&mut self, _ip: Ipv4Addr) {
        self.feedback
            .flash(feedback::CONNECTED, feedback::CONNECTED_FLASHES);
    }

    fn on_failed(&mut self, ssid: &str, reason: ConnectFailure) {
        warn!("Failed to connect to \"{}\": {}", ssid, reason);
        self.feedback
            .flash(feedback::FAILURE, feedback::CONNECT_FAILURE_FLASHES);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Main loop
// ═══════════════════════════════════════════════════════════════════════════

pub struct App<F, T, K, R, D, P, U> {
    engine: GestureEngine,
    queue: RequestQueue<T, K, Pending>,
    wifi: ConnectivityManager<R, K, D>,
    remote: Remote<F>,
    pairing: P,
    updater: U,
    clock: K,
    next_health_check: Instant,
}

impl<F, T, K, R, D, P, U> App<F, T, K, R, D, P, U>
where
    F: Feedback,
    T: Transport,
    K: Clock + Copy,
    R: WifiRadio,
    D: DelayNs,
    P: Pairing,
    U: Updater,
{
    pub fn new(
        engine: GestureEngine,
        queue: RequestQueue<T, K, Pending>,
        wifi: ConnectivityManager<R, K, D>,
        remote: Remote<F>,
        pairing: P,
        updater: U,
        clock: K,
    ) -> Self {
        Self {
            engine,
            queue,
            wifi,
            remote,
            pairing,
            updater,
            next_health_check: clock.now(),
            clock,
        }
    }

    pub fn engine(&self) -> &GestureEngine {
        &self.engine
    }

    pub fn queue(&self) -> &RequestQueue<T, K, Pending> {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut RequestQueue<T, K, Pending> {
        &mut self.queue
    }

    pub fn wifi(&self) -> &ConnectivityManager<R, K, D> {
        &self.wifi
    }

    pub fn wifi_mut(&mut self) -> &mut ConnectivityManager<R, K, D> {
        &mut self.wifi
    }

    pub fn remote(&self) -> &Remote<F> {
        &self.remote
    }

    pub fn pairing(&self) -> &P {
        &self.pairing
    }

    pub fn updater(&self) -> &U {
        &self.updater
    }

    /// One main-loop pass: gestures, outbound requests, latches, one
    /// bounded poll, and the health check when it is due.
    ///
    /// Returns the number of requests completed by the poll.
    pub async fn tick<M: RawMutex, const N: usize>(
        &mut self,
        edges: &Receiver<'_, M, Edge, N>,
    ) -> usize {
        let now = self.clock.now();
        self.engine.drain(edges, now, &mut self.remote);

        while let Some(request) = self.remote.take_outbound() {
            let result = self.queue.enqueue(request, &mut self.remote).await;
            // Open and send failures were already reported to `remote`.
            if let Err(Rejected {
                request: Some(request),
                ..
            }) = result
            {
                self.remote.reject(request);
            }
        }

        if self.engine.take_pairing_request() {
            info!("starting pairing");
            self.pairing.start_pairing();
        }
        if self.remote.take_update_request() {
            self.updater.try_update();
        }

        let wait = match self.engine.next_deadline() {
            Some(deadline) => deadline.saturating_duration_since(now),
            None => Duration::from_millis(POLL_WAIT_MS),
        };
        let completed = self.queue.poll(wait, &mut self.remote).await;

        if self.remote.take_link_lost() {
            self.wifi.mark_link_lost();
        }
        if self.clock.now() >= self.next_health_check {
            self.health_check().await;
        }
        completed
    }

    /// Reconnect if the link is down, and kick a scheduled update check.
    pub async fn health_check(&mut self) {
        self.next_health_check = self.clock.now() + Duration::from_secs(HEALTH_CHECK_SECS);
        if !self.wifi.is_connected().await {
            self.wifi.connect(&mut self.remote).await;
        }
        if self.updater.should_check_update() {
            self.updater.try_update();
        }
    }
}
