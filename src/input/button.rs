//! Per-key press state and the mirror of sampled pin levels.

use embassy_time::Instant;

use super::layout::{Key, KeyBinding};
use super::Level;

/// Last sampled level of every GPIO, one bit per pin (set = low = active).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PinLevels(u64);

impl PinLevels {
    /// All pins idle (pulled high).
    pub const fn idle() -> Self {
        Self(0)
    }

    pub fn set(&mut self, pin: u8, level: Level) {
        if pin >= 64 {
            return;
        }
        match level {
            Level::Low => self.0 |= 1 << pin,
            Level::High => self.0 &= !(1 << pin),
        }
    }

    pub fn level(&self, pin: u8) -> Level {
        if self.is_active(pin) {
            Level::Low
        } else {
            Level::High
        }
    }

    /// Active-low: a pin reads active while pulled to ground.
    pub fn is_active(&self, pin: u8) -> bool {
        pin < 64 && self.0 & (1 << pin) != 0
    }

    /// Logical OR over a set of redundant contacts.
    pub fn any_active(&self, pins: &[u8]) -> bool {
        pins.iter().any(|&pin| self.is_active(pin))
    }
}

/// A logical key and its press state.
#[derive(Debug)]
pub struct Button {
    key: Key,
    pins: &'static [u8],
    pressed: bool,
    last_pressed: bool,
    last_change: Option<Instant>,
}

impl Button {
    pub fn new(binding: &KeyBinding) -> Self {
        Self {
            key: binding.key,
            pins: binding.pins,
            pressed: false,
            last_pressed: false,
            last_change: None,
        }
    }

    pub fn key(&self) -> Key {
        self.key
    }

    pub fn pins(&self) -> &'static [u8] {
        self.pins
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// State before the most recent accepted change.
    pub fn last_pressed(&self) -> bool {
        self.last_pressed
    }

    pub fn last_change(&self) -> Option<Instant> {
        self.last_change
    }

    /// Record a freshly sampled state. Returns `true` only if it differs
    /// from the recorded one; an identical sample changes nothing.
    pub fn accept(&mut self, pressed: bool, at: Instant) -> bool {
        if pressed == self.pressed {
            return false;
        }
        self.last_pressed = self.pressed;
        self.pressed = pressed;
        self.last_change = Some(at);
        true
    }
}
