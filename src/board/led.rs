//! Status LED.
//!
//! The main loop never waits on the LED. It posts a [`LedCommand`] to a
//! signal and the LED task plays it; a newer command replaces a flash
//! sequence that is still running.

use embassy_futures::select::{select, Either};
use embassy_rp::gpio::Output;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};

use pico_switch::feedback::{Feedback, Rgb};

/// On and off time of one flash.
const FLASH_HALF_PERIOD: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum LedCommand {
    Show(Rgb),
    Flash(Rgb, u8),
}

pub type LedSignal = Signal<CriticalSectionRawMutex, LedCommand>;

/// [`Feedback`] that posts to the LED task.
pub struct SignalFeedback {
    signal: &'static LedSignal,
}

impl SignalFeedback {
    pub fn new(signal: &'static LedSignal) -> Self {
        Self { signal }
    }
}

impl Feedback for SignalFeedback {
    fn show(&mut self, color: Rgb) {
        self.signal.signal(LedCommand::Show(color));
    }

    fn flash(&mut self, color: Rgb, times: u8) {
        self.signal.signal(LedCommand::Flash(color, times));
    }
}

/// Three digital channels; any non-zero component lights its channel.
pub struct RgbLed {
    r: Output<'static>,
    g: Output<'static>,
    b: Output<'static>,
}

impl RgbLed {
    pub fn new(r: Output<'static>, g: Output<'static>, b: Output<'static>) -> Self {
        Self { r, g, b }
    }

    fn set(&mut self, color: Rgb) {
        self.r.set_level((color.r > 0).into());
        self.g.set_level((color.g > 0).into());
        self.b.set_level((color.b > 0).into());
    }

    async fn flash(&mut self, color: Rgb, times: u8) {
        for _ in 0..times {
            self.set(color);
            Timer::after(FLASH_HALF_PERIOD).await;
            self.set(Rgb::OFF);
            Timer::after(FLASH_HALF_PERIOD).await;
        }
    }
}

#[embassy_executor::task]
pub async fn led_task(mut led: RgbLed, commands: &'static LedSignal) -> ! {
    led.set(Rgb::OFF);
    let mut command = commands.wait().await;
    loop {
        match command {
            LedCommand::Show(color) => {
                led.set(color);
                command = commands.wait().await;
            }
            LedCommand::Flash(color, times) => {
                match select(led.flash(color, times), commands.wait()).await {
                    Either::First(()) => command = commands.wait().await,
                    Either::Second(next) => command = next,
                }
            }
        }
    }
}
