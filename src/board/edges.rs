//! GPIO edge producers.
//!
//! Every input GPIO of the layout gets its own task. The task reports the
//! level it starts at, then one [`Edge`] per transition. Inputs use the
//! internal pull-up, so a closed contact reads low.

use defmt::{info, warn};
use embassy_rp::gpio::{AnyPin, Input, Pull};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use embassy_time::Instant;

use pico_switch::config::EDGE_QUEUE_DEPTH;
use pico_switch::input::{Edge, Level};

/// Upper bound on input GPIOs: every key contact plus dial and switch lines.
pub const MAX_INPUT_PINS: usize = 24;

/// GPIOs owned by the cyw43 radio. A layout must never bind them.
pub const RADIO_PINS: [u8; 4] = [23, 24, 25, 29];

pub type EdgeSender = Sender<'static, CriticalSectionRawMutex, Edge, EDGE_QUEUE_DEPTH>;

fn level_of(input: &Input<'_>) -> Level {
    Level::from(input.is_high())
}

#[embassy_executor::task(pool_size = MAX_INPUT_PINS)]
pub async fn edge_task(gpio: u8, pin: AnyPin, tx: EdgeSender) -> ! {
    let mut input = Input::new(pin, Pull::Up);
    let mut level = level_of(&input);
    info!("GPIO{} watching, starts {}", gpio, level);
    report(&tx, gpio, level);

    loop {
        input.wait_for_any_edge().await;
        let now = level_of(&input);
        // A bounce shorter than the wakeup latency reads back unchanged.
        if now == level {
            continue;
        }
        level = now;
        report(&tx, gpio, level);
    }
}

fn report(tx: &EdgeSender, pin: u8, level: Level) {
    let edge = Edge {
        pin,
        level,
        at: Instant::now(),
    };
    if tx.try_send(edge).is_err() {
        warn!("edge queue full, dropping GPIO{} {}", pin, level);
    }
}
