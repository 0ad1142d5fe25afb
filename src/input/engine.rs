//! Gesture classification.
//!
//! The engine is fed [`Edge`]s in the order they happened and turns them
//! into presses, releases, long presses, combinations and dial gestures.
//! All delayed work goes through a [`TimerQueue`]; a timer that fires
//! re-checks the state that armed it before it reports anything.
//!
//! Before an edge stamped `t` is applied, every timer due at or before `t`
//! fires. A late main loop therefore never reorders a release and the
//! long press it should have cancelled.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Receiver;
use embassy_time::{Duration, Instant};
use heapless::Vec;
use log::{debug, info};

use crate::config::{
    BUTTON_DEBOUNCE_MS, DIAL_IDLE_MS, LONG_PRESS_MS, MAX_DIAL_OPTIONS, MAX_KEYS, MAX_TIMERS,
    PAIRING_COMBO_MS, UPDATE_COMBO_MS,
};
use crate::timers::{TimerQueue, TimerTag};

use super::button::{Button, PinLevels};
use super::dial::{DialOption, RotaryDial};
use super::layout::{Key, Layout};
use super::press_set::PressSet;
use super::{Edge, GestureSink, Level};

/// Gesture timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureConfig {
    pub long_press: Duration,
    pub update_hold: Duration,
    pub pairing_hold: Duration,
    pub dial_idle: Duration,
    /// Minimum spacing of accepted changes per key. Zero disables it.
    pub debounce: Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            long_press: Duration::from_millis(LONG_PRESS_MS),
            update_hold: Duration::from_millis(UPDATE_COMBO_MS),
            pairing_hold: Duration::from_millis(PAIRING_COMBO_MS),
            dial_idle: Duration::from_millis(DIAL_IDLE_MS),
            debounce: Duration::from_millis(BUTTON_DEBOUNCE_MS),
        }
    }
}

/// What a GPIO is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Key(u8),
    DialClock,
    DialData,
    DialSwitch,
    ModeSense,
}

pub struct GestureEngine {
    config: GestureConfig,
    layout: &'static Layout,
    buttons: Vec<Button, MAX_KEYS>,
    levels: PinLevels,
    press_set: PressSet,
    dial: Option<RotaryDial>,
    timers: TimerQueue<MAX_TIMERS>,
    /// Generic key forwarding; off while a combination is being held.
    forwarding: bool,
    /// Mode switch position; always on for boards without a switch.
    inputs_enabled: bool,
    update_armed: bool,
    pairing_armed: bool,
    needs_pairing: bool,
}

impl GestureEngine {
    /// Build the engine for a board. `dial_options` is ignored on boards
    /// without a dial.
    pub fn new(
        layout: &'static Layout,
        dial_options: Vec<DialOption, MAX_DIAL_OPTIONS>,
        config: GestureConfig,
    ) -> Self {
        let mut buttons = Vec::new();
        for binding in layout.keys.iter().take(MAX_KEYS) {
            let _ = buttons.push(Button::new(binding));
        }

        Self {
            config,
            layout,
            buttons,
            levels: PinLevels::idle(),
            press_set: PressSet::new(),
            dial: layout.dial.map(|_| RotaryDial::new(dial_options)),
            timers: TimerQueue::new(),
            forwarding: true,
            inputs_enabled: true,
            update_armed: false,
            pairing_armed: false,
            needs_pairing: false,
        }
    }

    pub fn layout(&self) -> &'static Layout {
        self.layout
    }

    /// Drain every queued edge, then fire the timers due at `now`.
    ///
    /// Returns the number of edges processed.
    pub fn drain<M: RawMutex, const N: usize>(
        &mut self,
        edges: &Receiver<'_, M, Edge, N>,
        now: Instant,
        sink: &mut impl GestureSink,
    ) -> usize {
        let mut count = 0;
        while let Ok(edge) = edges.try_receive() {
            self.handle_edge(edge, sink);
            count += 1;
        }
        self.run_timers(now, sink);
        count
    }

    /// Apply one sampled transition.
    pub fn handle_edge(&mut self, edge: Edge, sink: &mut impl GestureSink) {
        self.run_timers(edge.at, sink);
        self.levels.set(edge.pin, edge.level);

        match self.role_of(edge.pin) {
            Some(Role::Key(index)) => self.sample_key(index, edge.at, sink),
            Some(Role::DialClock) => self.turn_dial(edge.level, edge.at, sink),
            // Data line is only read through the level mirror.
            Some(Role::DialData) => {}
            Some(Role::DialSwitch) => self.dial_switch(edge.at, sink),
            Some(Role::ModeSense) => self.mode_switch(edge.level, sink),
            None => debug!("edge on unbound GPIO{}", edge.pin),
        }
    }

    /// Fire every timer due at `now`, earliest first.
    pub fn run_timers(&mut self, now: Instant, sink: &mut impl GestureSink) {
        while let Some((tag, deadline)) = self.timers.pop_due(now) {
            self.fire(tag, deadline, sink);
        }
    }

    /// When the main loop must run again for the next timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Consume the pairing latch. Forwarding resumes unless an update
    /// combination is still being held.
    pub fn take_pairing_request(&mut self) -> bool {
        if !self.needs_pairing {
            return false;
        }
        self.needs_pairing = false;
        self.pairing_armed = false;
        if !self.update_armed {
            self.forwarding = true;
        }
        true
    }

    pub fn needs_pairing(&self) -> bool {
        self.needs_pairing
    }

    pub fn is_forwarding(&self) -> bool {
        self.forwarding
    }

    pub fn inputs_enabled(&self) -> bool {
        self.inputs_enabled
    }

    pub fn press_set(&self) -> &PressSet {
        &self.press_set
    }

    /// Last sampled level of every bound pin.
    pub fn levels(&self) -> &PinLevels {
        &self.levels
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.buttons
            .iter()
            .any(|b| b.key() == key && b.is_pressed())
    }

    pub fn dial(&self) -> Option<&RotaryDial> {
        self.dial.as_ref()
    }

    pub fn is_timer_armed(&self, tag: TimerTag) -> bool {
        self.timers.is_armed(tag)
    }

    fn accepting(&self) -> bool {
        self.forwarding && self.inputs_enabled
    }

    fn role_of(&self, pin: u8) -> Option<Role> {
        if let Some(index) = self.buttons.iter().position(|b| b.pins().contains(&pin)) {
            return Some(Role::Key(index as u8));
        }
        if let Some(dial) = self.layout.dial {
            if pin == dial.clk {
                return Some(Role::DialClock);
            }
            if pin == dial.dt {
                return Some(Role::DialData);
            }
            if pin == dial.sw {
                return Some(Role::DialSwitch);
            }
        }
        match self.layout.switch {
            Some(switch) if switch.sense == pin => Some(Role::ModeSense),
            _ => None,
        }
    }

    // Buttons

    fn sample_key(&mut self, index: u8, at: Instant, sink: &mut impl GestureSink) {
        let debounce = self.config.debounce;
        let Some(button) = self.buttons.get_mut(index as usize) else {
            return;
        };
        let active = self.levels.any_active(button.pins());
        if active == button.is_pressed() {
            return;
        }

        if debounce.as_ticks() > 0 {
            if let Some(last) = button.last_change() {
                let settled_at = last + debounce;
                if at < settled_at {
                    self.timers.arm(TimerTag::Settle(index), settled_at);
                    return;
                }
            }
        }

        button.accept(active, at);
        if active {
            self.key_pressed(index, at, sink);
        } else {
            self.key_released(index, sink);
        }
    }

    fn key_pressed(&mut self, index: u8, at: Instant, sink: &mut impl GestureSink) {
        let key = self.buttons[index as usize].key();
        self.timers
            .arm(TimerTag::LongPress(index), at + self.config.long_press);
        self.press_set.insert(index);

        if self.press_set.could_update() {
            if self.pairing_armed {
                self.pairing_armed = false;
                self.timers.cancel(TimerTag::PairingCombo);
            }
            self.forwarding = false;
            self.update_armed = true;
            self.timers
                .arm(TimerTag::UpdateCombo, at + self.config.update_hold);
            info!("update combination armed");
        } else if self.press_set.could_pair() {
            self.forwarding = false;
            self.pairing_armed = true;
            self.timers
                .arm(TimerTag::PairingCombo, at + self.config.pairing_hold);
            info!("pairing combination armed");
        }

        if self.accepting() {
            sink.on_press(key);
        } else {
            debug!("suppressing press of {}", key.as_str());
        }
    }

    fn key_released(&mut self, index: u8, sink: &mut impl GestureSink) {
        let key = self.buttons[index as usize].key();
        self.timers.cancel(TimerTag::LongPress(index));
        self.press_set.remove(index);

        if self.update_armed && !self.press_set.could_update() {
            self.update_armed = false;
            self.timers.cancel(TimerTag::UpdateCombo);
            if !self.needs_pairing {
                self.forwarding = true;
            }
            debug!("update combination released");
        }
        if self.pairing_armed && !self.needs_pairing && !self.press_set.could_pair() {
            self.pairing_armed = false;
            self.timers.cancel(TimerTag::PairingCombo);
            self.forwarding = true;
            debug!("pairing combination released");
        }

        sink.on_release(key);
    }

    // Timers

    fn fire(&mut self, tag: TimerTag, deadline: Instant, sink: &mut impl GestureSink) {
        match tag {
            TimerTag::LongPress(index) => {
                let Some(button) = self.buttons.get(index as usize) else {
                    return;
                };
                if !button.is_pressed() {
                    return;
                }
                let key = button.key();
                if self.accepting() {
                    sink.on_long_press(key);
                } else {
                    debug!("suppressing long press of {}", key.as_str());
                }
            }
            TimerTag::Settle(index) => self.sample_key(index, deadline, sink),
            TimerTag::UpdateCombo => {
                if self.update_armed && self.press_set.could_update() {
                    info!("update combination held");
                    sink.on_update();
                }
            }
            TimerTag::PairingCombo => {
                if self.pairing_armed && self.press_set.could_pair() && !self.needs_pairing {
                    info!("pairing combination held, pairing requested");
                    self.needs_pairing = true;
                }
            }
            TimerTag::DialIdle => sink.on_dial_idle(),
            TimerTag::DialLongPress => {
                let accepting = self.accepting();
                let Some(dial) = self.dial.as_ref() else {
                    return;
                };
                if !dial.is_pressed() {
                    return;
                }
                if let Some(option) = dial.selected() {
                    if accepting {
                        sink.on_dial_press(option, true);
                    }
                }
            }
            TimerTag::Backoff => {}
        }
    }

    // Dial

    fn turn_dial(&mut self, clk: Level, at: Instant, sink: &mut impl GestureSink) {
        let Some(pins) = self.layout.dial else {
            return;
        };
        let dt = self.levels.level(pins.dt);
        let Some(dial) = self.dial.as_mut() else {
            return;
        };
        if dial.on_clock(clk, dt).is_none() {
            return;
        }
        if let Some(option) = dial.selected() {
            debug!("dial selected {}", option.name.as_str());
            sink.on_dial_turn(option);
        }
        self.timers
            .arm(TimerTag::DialIdle, at + self.config.dial_idle);
    }

    fn dial_switch(&mut self, at: Instant, sink: &mut impl GestureSink) {
        let Some(pins) = self.layout.dial else {
            return;
        };
        let pressed = self.levels.is_active(pins.sw);
        let accepting = self.accepting();
        let Some(dial) = self.dial.as_mut() else {
            return;
        };

        match dial.on_switch(pressed) {
            Some(true) => {
                self.timers
                    .arm(TimerTag::DialLongPress, at + self.config.long_press);
                match dial.selected() {
                    Some(option) if accepting => sink.on_dial_press(option, false),
                    Some(option) => debug!("suppressing dial press on {}", option.name.as_str()),
                    None => debug!("dial pressed without routines"),
                }
            }
            Some(false) => {
                self.timers.cancel(TimerTag::DialLongPress);
            }
            None => {}
        }
    }

    // Mode switch

    fn mode_switch(&mut self, level: Level, sink: &mut impl GestureSink) {
        let enabled = level == Level::High;
        if enabled == self.inputs_enabled {
            return;
        }
        self.inputs_enabled = enabled;
        if let Some(dial) = self.dial.as_mut() {
            dial.set_enabled(enabled);
        }
        info!("inputs {}", if enabled { "enabled" } else { "disabled" });
        sink.on_inputs_enabled(enabled);
    }
}
