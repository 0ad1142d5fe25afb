//! Input gesture engine - buttons, rotary dial and mode switch.
//!
//! Edge tasks sample a GPIO whenever it changes and push an [`Edge`] into a
//! channel. The main loop drains that channel once per tick into the
//! [`GestureEngine`], which owns every piece of input state and reports
//! classified gestures to a [`GestureSink`].
//!
//! ## Components
//!
//! - **Layout**: static per-revision pin maps
//! - **Button**: debounced press state per logical key
//! - **PressSet**: held keys, for the pairing/update combinations
//! - **RotaryDial**: quadrature decoding over the dial routines

pub mod button;
pub mod dial;
pub mod engine;
pub mod layout;
pub mod press_set;


use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Instant;

use crate::config::EDGE_QUEUE_DEPTH;

pub use button::{Button, PinLevels};
pub use dial::{DialOption, RotaryDial};
pub use engine::{GestureConfig, GestureEngine};
pub use layout::{HardwareRevision, Key, Layout};
pub use press_set::PressSet;

/// Electrical level of a GPIO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    /// `true` means high.
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// A sampled pin transition, timestamped by the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Edge {
    pub pin: u8,
    pub level: Level,
    pub at: Instant,
}

/// Single-producer-per-pin, single-consumer edge channel.
pub type EdgeChannel = Channel<CriticalSectionRawMutex, Edge, EDGE_QUEUE_DEPTH>;

/// Receiver of classified gestures. Every hook defaults to doing nothing.
pub trait GestureSink {
    fn on_press(&mut self, _key: Key) {}
    fn on_long_press(&mut self, _key: Key) {}
    fn on_release(&mut self, _key: Key) {}
    /// Four keys were held for the update window.
    fn on_update(&mut self) {}
    /// The dial moved onto `option`.
    fn on_dial_turn(&mut self, _option: &DialOption) {}
    /// The dial was pressed (or held, with `long`) on `option`.
    fn on_dial_press(&mut self, _option: &DialOption, _long: bool) {}
    /// No dial movement for the idle window.
    fn on_dial_idle(&mut self) {}
    /// The mode switch turned the inputs on or off.
    fn on_inputs_enabled(&mut self, _enabled: bool) {}
}
