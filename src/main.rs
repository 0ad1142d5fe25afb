//! pico-switch firmware for the Raspberry Pi Pico W.
//!
//! Boot order: logging, settings, radio and network stack, LED, one edge
//! task per input GPIO, then the main loop. The loop itself lives in
//! [`pico_switch::app::App::tick`].

#![no_std]
#![no_main]

mod board;

use defmt::{error, info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_rp::gpio::{AnyPin, Level, Output};
use embassy_time::{Delay, Timer};
use heapless::Vec;
use {defmt_rtt as _, panic_probe as _};

use pico_switch::app::{App, Remote};
use pico_switch::input::{EdgeChannel, GestureConfig, GestureEngine};
use pico_switch::net::RequestQueue;
use pico_switch::settings::Settings;
use pico_switch::time::SystemClock;
use pico_switch::wifi::ConnectivityManager;

use board::edges::{edge_task, MAX_INPUT_PINS, RADIO_PINS};
use board::led::{led_task, LedSignal, RgbLed, SignalFeedback};
use board::transport::SocketPool;
use board::{LogPairing, LogUpdater};

static EDGES: EdgeChannel = EdgeChannel::new();
static LED: LedSignal = LedSignal::new();

/// Network stack seed. There is no hardware RNG worth the name here.
const NET_SEED: u64 = 0x5a17_c4e5_0b1d_77e3;

/// Take a GPIO by number.
///
/// # Safety
/// The pin must not be owned by anything else. Layout pins never overlap
/// the radio pins, which are the only ones taken from `Peripherals`.
unsafe fn gpio(pin: u8) -> AnyPin {
    AnyPin::steal(pin)
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    board::logger::init();
    let p = embassy_rp::init(Default::default());
    info!("pico-switch {}", env!("CARGO_PKG_VERSION"));

    let settings = match Settings::parse(&board::baked_settings()) {
        Ok(settings) => settings,
        Err(e) => {
            error!("invalid settings: {}", e);
            loop {
                Timer::after_secs(3600).await;
            }
        }
    };
    let layout = settings.revision.layout();
    info!(
        "remote \"{=str}\" on layout {=str}",
        settings.name.as_str(),
        layout.revision.as_str()
    );

    // -- LED --------------------------------------------------------------
    let led = unsafe {
        RgbLed::new(
            Output::new(gpio(layout.led.r), Level::Low),
            Output::new(gpio(layout.led.g), Level::Low),
            Output::new(gpio(layout.led.b), Level::Low),
        )
    };
    unwrap!(spawner.spawn(led_task(led, &LED)));

    // -- Inputs -----------------------------------------------------------
    // The mode switch needs its supply line driven for its sense line to read.
    let _switch_power = layout
        .switch
        .map(|switch| Output::new(unsafe { gpio(switch.power) }, Level::High));

    let mut watched: Vec<u8, MAX_INPUT_PINS> = Vec::new();
    for pin in layout.input_pins() {
        if RADIO_PINS.contains(&pin) || watched.contains(&pin) {
            warn!("GPIO{} skipped", pin);
            continue;
        }
        if watched.push(pin).is_err() {
            warn!("too many input pins, GPIO{} ignored", pin);
            continue;
        }
        let input = unsafe { gpio(pin) };
        unwrap!(spawner.spawn(edge_task(pin, input, EDGES.sender())));
    }

    // -- Network ----------------------------------------------------------
    let radio = board::radio::init(
        spawner, p.PIN_23, p.PIN_24, p.PIN_25, p.PIN_29, p.PIO0, p.DMA_CH0, NET_SEED,
    )
    .await;
    let transport = SocketPool::new(radio.stack(), settings.hub);

    // -- Application ------------------------------------------------------
    let engine = GestureEngine::new(layout, settings.routines.clone(), GestureConfig::default());
    let queue = RequestQueue::new(transport, SystemClock);
    let wifi = ConnectivityManager::new(radio, SystemClock, Delay, settings.wifi.clone());
    let remote = Remote::new(settings.name.clone(), settings.hub, SignalFeedback::new(&LED));
    let mut app = App::new(
        engine,
        queue,
        wifi,
        remote,
        LogPairing,
        LogUpdater,
        SystemClock,
    );

    info!("main loop running");
    let edges = EDGES.receiver();
    loop {
        app.tick(&edges).await;
    }
}
