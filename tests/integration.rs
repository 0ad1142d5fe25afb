//! Integration tests for the host-testable remote.
//!
//! Each test wires the real engine, queue and WiFi manager into an
//! [`App`] over scripted hardware, then drives it one main-loop pass at a
//! time on a manual clock.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use embassy_futures::block_on;
use embassy_time::{Duration, Instant};
use embedded_hal_async::delay::DelayNs;
use heapless::Vec;

use pico_switch::app::{App, Pairing, Remote, Updater};
use pico_switch::error::ConnectFailure;
use pico_switch::feedback::{self, Feedback, Rgb};
use pico_switch::input::{Edge, EdgeChannel, GestureConfig, GestureEngine, HardwareRevision, Level};
use pico_switch::net::{RequestQueue, SocketId, Transport, TransportFault};
use pico_switch::settings::{HubAddress, RawSettings, Settings};
use pico_switch::time::Clock;
use pico_switch::wifi::{ConnectivityManager, LinkStatus, Phase, WifiCredentials, WifiRadio};

// ═══════════════════════════════════════════════════════════════════════════
// Scripted hardware
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct ManualClock {
    micros: Cell<u64>,
}

impl ManualClock {
    fn advance(&self, by: Duration) {
        self.micros.set(self.micros.get() + by.as_micros());
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        Instant::from_micros(self.micros.get())
    }
}

struct ManualDelay<'a>(&'a ManualClock);

impl DelayNs for ManualDelay<'_> {
    async fn delay_ns(&mut self, ns: u32) {
        self.0.advance(Duration::from_micros(u64::from(ns).div_ceil(1_000)));
    }
}

/// Answers every request with `response` on the next poll.
struct Hub<'a> {
    clock: &'a ManualClock,
    response: &'static [u8],
    open_fault: Option<TransportFault>,
    /// Accept requests but never answer them.
    silent: bool,
    next_socket: u8,
    pending: BTreeMap<u8, &'static [u8]>,
    requests: std::vec::Vec<String>,
}

impl<'a> Hub<'a> {
    fn new(clock: &'a ManualClock) -> Self {
        Self {
            clock,
            response: b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n",
            open_fault: None,
            silent: false,
            next_socket: 0,
            pending: BTreeMap::new(),
            requests: std::vec::Vec::new(),
        }
    }

    /// Buttons of every request received, in order.
    fn buttons(&self) -> std::vec::Vec<&str> {
        self.requests
            .iter()
            .map(|line| {
                let query = line.split("&button=").nth(1).unwrap();
                query.split(' ').next().unwrap()
            })
            .collect()
    }
}

impl Transport for Hub<'_> {
    async fn open(&mut self) -> Result<SocketId, TransportFault> {
        if let Some(fault) = self.open_fault {
            return Err(fault);
        }
        let socket = SocketId(self.next_socket);
        self.next_socket = self.next_socket.wrapping_add(1);
        Ok(socket)
    }

    async fn send(&mut self, socket: SocketId, payload: &[u8]) -> Result<(), TransportFault> {
        let text = std::str::from_utf8(payload).unwrap();
        self.requests.push(text.lines().next().unwrap().to_string());
        if !self.silent {
            self.pending.insert(socket.0, self.response);
        }
        Ok(())
    }

    async fn wait_readable<const N: usize>(
        &mut self,
        watched: &[SocketId],
        timeout: Duration,
        ready: &mut Vec<SocketId, N>,
    ) {
        for socket in watched {
            if self.pending.contains_key(&socket.0) {
                ready.push(*socket).unwrap();
            }
        }
        if ready.is_empty() {
            self.clock.advance(timeout);
        }
    }

    async fn recv(&mut self, socket: SocketId, buf: &mut [u8]) -> Result<usize, TransportFault> {
        let response = self.pending.remove(&socket.0).unwrap_or_default();
        buf[..response.len()].copy_from_slice(response);
        Ok(response.len())
    }

    fn close(&mut self, socket: SocketId) {
        self.pending.remove(&socket.0);
    }
}

const IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 77);

/// Access point that either hands out an address or rejects every join.
struct AccessPoint {
    accepts: bool,
    linked: bool,
    joins: usize,
}

impl WifiRadio for AccessPoint {
    async fn join(&mut self, _credentials: &WifiCredentials) -> Result<(), ConnectFailure> {
        self.joins += 1;
        self.linked = self.accepts;
        Ok(())
    }

    async fn status(&mut self) -> LinkStatus {
        match (self.linked, self.joins) {
            (true, _) => LinkStatus::GotIp(IP),
            (false, 0) => LinkStatus::Idle,
            (false, _) => LinkStatus::ConnectFailed,
        }
    }
}

#[derive(Default)]
struct Led(std::vec::Vec<(Rgb, u8)>);

impl Led {
    fn flashes(&self, color: Rgb, times: u8) -> usize {
        self.0.iter().filter(|c| **c == (color, times)).count()
    }

    fn last(&self) -> Option<Rgb> {
        self.0.last().map(|(color, _)| *color)
    }
}

impl Feedback for Led {
    fn show(&mut self, color: Rgb) {
        self.0.push((color, 0));
    }

    fn flash(&mut self, color: Rgb, times: u8) {
        self.0.push((color, times));
    }
}

#[derive(Default)]
struct Counter(usize);

impl Pairing for Counter {
    fn start_pairing(&mut self) {
        self.0 += 1;
    }
}

impl Updater for Counter {
    fn try_update(&mut self) {
        self.0 += 1;
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Harness
// ═══════════════════════════════════════════════════════════════════════════

type TestApp<'a> = App<Led, Hub<'a>, &'a ManualClock, AccessPoint, ManualDelay<'a>, Counter, Counter>;

// v7 pins.
const KEY_1: u8 = 12;
const KEY_2: u8 = 11;
const KEY_3: u8 = 7;
const KEY_4: u8 = 8;

fn settings() -> Settings {
    Settings::parse(&RawSettings {
        name: "Living Room",
        layout: "v7",
        hub: "192.168.1.10",
        port: "8123",
        ssid: "home",
        password: "hunter22",
        routines: "",
    })
    .unwrap()
}

fn build(clock: &ManualClock, wifi_accepts: bool) -> TestApp<'_> {
    let settings = settings();
    let engine = GestureEngine::new(
        settings.revision.layout(),
        settings.routines.clone(),
        GestureConfig::default(),
    );
    let queue = RequestQueue::new(Hub::new(clock), clock);
    let radio = AccessPoint {
        accepts: wifi_accepts,
        linked: false,
        joins: 0,
    };
    let wifi = ConnectivityManager::new(radio, clock, ManualDelay(clock), settings.wifi.clone());
    let remote = Remote::new(settings.name.clone(), settings.hub, Led::default());
    App::new(
        engine,
        queue,
        wifi,
        remote,
        Counter::default(),
        Counter::default(),
        clock,
    )
}

fn edge(channel: &EdgeChannel, clock: &ManualClock, pin: u8, level: Level) {
    channel
        .try_send(Edge {
            pin,
            level,
            at: clock.now(),
        })
        .unwrap();
}

fn tick(app: &mut TestApp<'_>, channel: &EdgeChannel) {
    block_on(app.tick(&channel.receiver()));
}

fn tick_until(app: &mut TestApp<'_>, channel: &EdgeChannel, clock: &ManualClock, ms: u64) {
    while clock.now() < Instant::from_millis(ms) {
        tick(app, channel);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Scenarios
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn boot_connects_and_flashes_blue() {
    let clock = ManualClock::default();
    let channel = EdgeChannel::new();
    let mut app = build(&clock, true);

    tick(&mut app, &channel);

    assert_eq!(app.wifi().state().phase(), Phase::Connected);
    assert_eq!(app.wifi().state().last_ip(), Some(IP));
    let led = app.remote().feedback();
    assert_eq!(led.0[0], (feedback::CONNECTING, 0));
    assert_eq!(led.flashes(feedback::CONNECTED, 2), 1);
}

#[test]
fn short_press_sends_one_webhook() {
    let clock = ManualClock::default();
    let channel = EdgeChannel::new();
    let mut app = build(&clock, true);
    tick(&mut app, &channel);

    edge(&channel, &clock, KEY_1, Level::Low);
    tick(&mut app, &channel);
    clock.advance(Duration::from_millis(300));
    edge(&channel, &clock, KEY_1, Level::High);
    tick_until(&mut app, &channel, &clock, 4_000);

    let hub = app.queue().transport();
    assert_eq!(hub.buttons(), ["1"]);
    assert!(hub.requests[0].starts_with("POST /api/webhook/remote-press?remote=Living%20Room&"));
    assert!(app.queue().is_empty());
    assert_eq!(app.remote().feedback().last(), Some(Rgb::OFF));
}

#[test]
fn held_key_sends_long_press_once() {
    let clock = ManualClock::default();
    let channel = EdgeChannel::new();
    let mut app = build(&clock, true);
    tick(&mut app, &channel);

    let pressed_at = clock.now().as_millis();
    edge(&channel, &clock, KEY_1, Level::Low);
    tick_until(&mut app, &channel, &clock, pressed_at + 2_000);
    edge(&channel, &clock, KEY_1, Level::High);
    tick_until(&mut app, &channel, &clock, pressed_at + 5_000);

    assert_eq!(app.queue().transport().buttons(), ["1", "1-long"]);
    let led = app.remote().feedback();
    assert!(led.0.contains(&(feedback::LONG_PRESS, 0)));
}

#[test]
fn two_key_hold_starts_pairing_once() {
    let clock = ManualClock::default();
    let channel = EdgeChannel::new();
    let mut app = build(&clock, true);
    tick(&mut app, &channel);

    let pressed_at = clock.now().as_millis();
    edge(&channel, &clock, KEY_1, Level::Low);
    edge(&channel, &clock, KEY_2, Level::Low);
    tick_until(&mut app, &channel, &clock, pressed_at + 7_000);

    assert_eq!(app.pairing().0, 1);
    // The second key completed the combination and was never forwarded.
    assert_eq!(app.queue().transport().buttons(), ["1"]);

    edge(&channel, &clock, KEY_1, Level::High);
    edge(&channel, &clock, KEY_2, Level::High);
    tick_until(&mut app, &channel, &clock, pressed_at + 9_000);
    assert_eq!(app.pairing().0, 1);
}

#[test]
fn releasing_before_the_window_cancels_pairing() {
    let clock = ManualClock::default();
    let channel = EdgeChannel::new();
    let mut app = build(&clock, true);
    tick(&mut app, &channel);

    let pressed_at = clock.now().as_millis();
    edge(&channel, &clock, KEY_1, Level::Low);
    edge(&channel, &clock, KEY_2, Level::Low);
    tick_until(&mut app, &channel, &clock, pressed_at + 3_000);
    edge(&channel, &clock, KEY_2, Level::High);
    tick_until(&mut app, &channel, &clock, pressed_at + 8_000);

    assert_eq!(app.pairing().0, 0);
    assert!(!app.engine().needs_pairing());
}

#[test]
fn four_key_hold_requests_an_update() {
    let clock = ManualClock::default();
    let channel = EdgeChannel::new();
    let mut app = build(&clock, true);
    tick(&mut app, &channel);

    let pressed_at = clock.now().as_millis();
    for pin in [KEY_1, KEY_2, KEY_3, KEY_4] {
        edge(&channel, &clock, pin, Level::Low);
    }
    tick_until(&mut app, &channel, &clock, pressed_at + 6_000);

    assert_eq!(app.updater().0, 1);
    assert_eq!(app.pairing().0, 0);
}

#[test]
fn failing_wifi_reports_each_attempt_once() {
    let clock = ManualClock::default();
    let channel = EdgeChannel::new();
    let mut app = build(&clock, false);

    // Health checks run every 10 s; the 30 s backoff lets one in three through.
    tick_until(&mut app, &channel, &clock, 65_000);

    assert_eq!(app.wifi().radio().joins, 3);
    let led = app.remote().feedback();
    assert_eq!(led.flashes(feedback::FAILURE, 5), 3);
    assert_eq!(led.flashes(feedback::CONNECTED, 2), 0);
}

#[test]
fn unreachable_hub_marks_the_link_lost() {
    let clock = ManualClock::default();
    let channel = EdgeChannel::new();
    let mut app = build(&clock, true);
    tick(&mut app, &channel);
    app.queue_mut().transport_mut().open_fault = Some(TransportFault::Unreachable);

    edge(&channel, &clock, KEY_3, Level::Low);
    tick(&mut app, &channel);

    assert_eq!(app.wifi().state().phase(), Phase::Idle);
    assert_eq!(app.remote().feedback().flashes(feedback::FAILURE, 2), 1);
    assert!(app.queue().is_empty());
}

#[test]
fn unreachable_hub_reconnects_after_backoff() {
    let clock = ManualClock::default();
    let channel = EdgeChannel::new();
    let mut app = build(&clock, true);
    tick(&mut app, &channel);
    assert_eq!(app.wifi().radio().joins, 1);

    app.queue_mut().transport_mut().open_fault = Some(TransportFault::Unreachable);
    edge(&channel, &clock, KEY_3, Level::Low);
    edge(&channel, &clock, KEY_3, Level::High);
    tick(&mut app, &channel);
    app.queue_mut().transport_mut().open_fault = None;

    // The radio still reports an address; the health checks inside the
    // backoff window must not touch it.
    tick_until(&mut app, &channel, &clock, 29_000);
    assert_eq!(app.wifi().radio().joins, 1);

    tick_until(&mut app, &channel, &clock, 45_000);
    assert_eq!(app.wifi().radio().joins, 2);
    assert_eq!(app.wifi().state().phase(), Phase::Connected);
    assert!(!app.wifi().state().is_suspect());
}

#[test]
fn press_beyond_queue_capacity_flashes_red() {
    let clock = ManualClock::default();
    let channel = EdgeChannel::new();
    let mut app = build(&clock, true);
    tick(&mut app, &channel);
    app.queue_mut().transport_mut().silent = true;

    for _ in 0..5 {
        edge(&channel, &clock, KEY_1, Level::Low);
        edge(&channel, &clock, KEY_1, Level::High);
    }
    tick(&mut app, &channel);
    assert_eq!(app.queue().len(), 5);
    assert_eq!(app.remote().feedback().flashes(feedback::FAILURE, 2), 0);

    edge(&channel, &clock, KEY_2, Level::Low);
    edge(&channel, &clock, KEY_2, Level::High);
    tick(&mut app, &channel);

    assert_eq!(app.queue().transport().buttons(), ["1", "1", "1", "1", "1"]);
    assert_eq!(app.queue().len(), 5);
    assert_eq!(app.remote().feedback().flashes(feedback::FAILURE, 2), 1);
    assert_eq!(app.remote().feedback().last(), Some(feedback::FAILURE));
}

#[test]
fn hub_errors_flash_red() {
    let clock = ManualClock::default();
    let channel = EdgeChannel::new();
    let mut app = build(&clock, true);
    tick(&mut app, &channel);
    app.queue_mut().transport_mut().response = b"HTTP/1.1 500 Internal Server Error\r\n\r\n";

    edge(&channel, &clock, KEY_4, Level::Low);
    tick(&mut app, &channel);

    assert_eq!(app.queue().transport().buttons(), ["4"]);
    assert_eq!(app.remote().feedback().flashes(feedback::FAILURE, 2), 1);
    assert_eq!(app.wifi().state().phase(), Phase::Connected);
}

#[test]
fn settings_select_the_layout() {
    let settings = settings();
    assert_eq!(settings.revision, HardwareRevision::V7);
    assert_eq!(
        settings.hub,
        HubAddress {
            ip: Ipv4Addr::new(192, 168, 1, 10),
            port: 8123
        }
    );
}
