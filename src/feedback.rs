//! Visual feedback vocabulary.
//!
//! The remote has a single RGB status LED. Library code only decides
//! *what* to show; the firmware LED task decides how to drive the pins.

/// An RGB colour, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const OFF: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn is_off(&self) -> bool {
        *self == Rgb::OFF
    }
}

/// Request in flight after a short press.
pub const PROGRESS: Rgb = Rgb::new(0, 0, 50);
/// Request in flight after a long press.
pub const LONG_PRESS: Rgb = Rgb::new(0, 50, 50);
/// Request or association failure.
pub const FAILURE: Rgb = Rgb::new(100, 0, 0);
/// WiFi association in progress.
pub const CONNECTING: Rgb = Rgb::new(100, 100, 0);
/// WiFi association succeeded.
pub const CONNECTED: Rgb = Rgb::new(0, 0, 50);

/// Flashes after a failed request.
pub const REQUEST_FAILURE_FLASHES: u8 = 2;
/// Flashes after a successful association.
pub const CONNECTED_FLASHES: u8 = 2;
/// Flashes after a failed association.
pub const CONNECT_FAILURE_FLASHES: u8 = 5;

/// Consumer of colour changes.
pub trait Feedback {
    /// Show a steady colour until told otherwise.
    fn show(&mut self, color: Rgb);

    /// Flash `color` `times` times, then go dark.
    fn flash(&mut self, color: Rgb, times: u8);

    fn off(&mut self) {
        self.show(Rgb::OFF);
    }
}
