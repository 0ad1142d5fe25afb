//! Rotary dial: quadrature decoding over a list of routines.
//!
//! Only rising clock edges step the dial. On such an edge the data line is
//! compared with the clock: equal levels step forward, different levels
//! step back. The selected index wraps around the routine list.

use heapless::{String, Vec};

use crate::config::{MAX_DIAL_OPTIONS, ROUTINE_NAME_MAX_LEN};
use crate::feedback::Rgb;

use super::Level;

/// A routine the dial can select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialOption {
    pub name: String<ROUTINE_NAME_MAX_LEN>,
    pub color: Rgb,
}

#[derive(Debug)]
pub struct RotaryDial {
    options: Vec<DialOption, MAX_DIAL_OPTIONS>,
    index: usize,
    enabled: bool,
    last_clk: Level,
    current_clk: Level,
    pressed: bool,
}

impl RotaryDial {
    pub fn new(options: Vec<DialOption, MAX_DIAL_OPTIONS>) -> Self {
        Self {
            options,
            index: 0,
            enabled: true,
            last_clk: Level::High,
            current_clk: Level::High,
            pressed: false,
        }
    }

    /// Feed a clock-line sample together with the current data-line level.
    ///
    /// Returns the new index when the dial moved.
    pub fn on_clock(&mut self, clk: Level, dt: Level) -> Option<usize> {
        self.last_clk = self.current_clk;
        self.current_clk = clk;

        if clk == Level::Low || !self.enabled || self.current_clk == self.last_clk {
            return None;
        }
        let count = self.options.len();
        if count == 0 {
            return None;
        }

        self.index = if clk == dt {
            (self.index + 1) % count
        } else {
            (self.index + count - 1) % count
        };
        Some(self.index)
    }

    /// Record the push-switch state. Returns the new state if it changed.
    pub fn on_switch(&mut self, pressed: bool) -> Option<bool> {
        if pressed == self.pressed {
            return None;
        }
        self.pressed = pressed;
        Some(pressed)
    }

    pub fn selected(&self) -> Option<&DialOption> {
        self.options.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn options(&self) -> &[DialOption] {
        &self.options
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dial(names: &[&str]) -> RotaryDial {
        let options = names
            .iter()
            .map(|n| DialOption {
                name: String::try_from(*n).unwrap(),
                color: Rgb::new(1, 2, 3),
            })
            .collect();
        RotaryDial::new(options)
    }

    /// One detent: clock falls, then rises with `dt` on the data line.
    fn detent(dial: &mut RotaryDial, dt: Level) -> Option<usize> {
        assert_eq!(dial.on_clock(Level::Low, dt), None);
        dial.on_clock(Level::High, dt)
    }

    #[test]
    fn forward_turns_wrap_around() {
        let mut d = dial(&["movie", "bedtime", "morning"]);
        assert_eq!(detent(&mut d, Level::High), Some(1));
        assert_eq!(detent(&mut d, Level::High), Some(2));
        assert_eq!(detent(&mut d, Level::High), Some(0));
    }

    #[test]
    fn backward_turn_from_zero_wraps_to_last() {
        let mut d = dial(&["movie", "bedtime", "morning"]);
        assert_eq!(detent(&mut d, Level::Low), Some(2));
        assert_eq!(d.selected().map(|o| o.name.as_str()), Some("morning"));
    }

    #[test]
    fn repeated_clock_level_is_ignored() {
        let mut d = dial(&["a", "b"]);
        assert_eq!(d.on_clock(Level::High, Level::High), None);
        assert_eq!(d.index(), 0);
    }

    #[test]
    fn disabled_or_empty_dial_does_not_move() {
        let mut d = dial(&["a", "b"]);
        d.set_enabled(false);
        assert_eq!(detent(&mut d, Level::High), None);

        let mut empty = dial(&[]);
        assert_eq!(detent(&mut empty, Level::High), None);
        assert!(empty.selected().is_none());
    }

    #[test]
    fn switch_reports_changes_only() {
        let mut d = dial(&["a"]);
        assert_eq!(d.on_switch(true), Some(true));
        assert_eq!(d.on_switch(true), None);
        assert_eq!(d.on_switch(false), Some(false));
    }
}
