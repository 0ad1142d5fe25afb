//! Static pin maps, one per hardware revision.
//!
//! All GPIO numbers refer to the RP2040 bank-0 pins of the Pico W. Buttons
//! are wired active-low against internal pull-ups. Several pins may alias
//! one logical key (the large "on"/"off" keys have two contacts).

use core::fmt;
use core::str::FromStr;

use crate::error::SettingsError;

/// Logical key label as sent to the hub (`button=<key>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Key(pub &'static str);

impl Key {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// One logical key and the GPIOs that close it.
#[derive(Debug)]
pub struct KeyBinding {
    pub key: Key,
    pub pins: &'static [u8],
}

/// Quadrature dial lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialPins {
    pub clk: u8,
    pub dt: u8,
    pub sw: u8,
}

/// Slide switch that turns the inputs on and off. `power` is driven high,
/// `sense` reads high while the switch is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchPins {
    pub power: u8,
    pub sense: u8,
}

/// Status LED channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbPins {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Board generations with a known pin map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HardwareRevision {
    V3,
    V4,
    V5,
    V6,
    V7,
}

impl HardwareRevision {
    pub const ALL: [HardwareRevision; 5] = [
        HardwareRevision::V3,
        HardwareRevision::V4,
        HardwareRevision::V5,
        HardwareRevision::V6,
        HardwareRevision::V7,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HardwareRevision::V3 => "v3",
            HardwareRevision::V4 => "v4",
            HardwareRevision::V5 => "v5",
            HardwareRevision::V6 => "v6",
            HardwareRevision::V7 => "v7",
        }
    }

    pub fn layout(self) -> &'static Layout {
        match self {
            HardwareRevision::V3 => &V3,
            HardwareRevision::V4 => &V4,
            HardwareRevision::V5 => &V5,
            HardwareRevision::V6 => &V6,
            HardwareRevision::V7 => &V7,
        }
    }
}

impl FromStr for HardwareRevision {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HardwareRevision::ALL
            .into_iter()
            .find(|rev| rev.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(SettingsError::UnknownLayout)
    }
}

/// Complete pin map of one board.
#[derive(Debug)]
pub struct Layout {
    pub revision: HardwareRevision,
    pub keys: &'static [KeyBinding],
    pub dial: Option<DialPins>,
    pub switch: Option<SwitchPins>,
    pub led: RgbPins,
}

impl Layout {
    /// Index of the key bound to `pin`, if any.
    pub fn key_for_pin(&self, pin: u8) -> Option<usize> {
        self.keys.iter().position(|b| b.pins.contains(&pin))
    }

    /// Every GPIO that must report edges: key contacts, dial lines and the
    /// switch sense line.
    pub fn input_pins(&self) -> impl Iterator<Item = u8> + '_ {
        let keys = self.keys.iter().flat_map(|b| b.pins.iter().copied());
        let dial = self.dial.into_iter().flat_map(|d| [d.clk, d.dt, d.sw]);
        let switch = self.switch.into_iter().map(|s| s.sense);
        keys.chain(dial).chain(switch)
    }
}

const fn bind(key: &'static str, pins: &'static [u8]) -> KeyBinding {
    KeyBinding { key: Key(key), pins }
}

static V3: Layout = Layout {
    revision: HardwareRevision::V3,
    keys: &[
        bind("on", &[0, 5]),
        bind("off", &[10, 15]),
        bind("1", &[28]),
        bind("2", &[11]),
        bind("3", &[6]),
        bind("4", &[1]),
        bind("5", &[27]),
        bind("6", &[12]),
        bind("7", &[7]),
        bind("8", &[2]),
        bind("9", &[26]),
        bind("10", &[13]),
        bind("11", &[8]),
        bind("12", &[3]),
    ],
    dial: None,
    switch: None,
    led: RgbPins { r: 18, g: 17, b: 16 },
};

// Keys 7 and 8 are swapped on the v4 silkscreen.
static V4: Layout = Layout {
    revision: HardwareRevision::V4,
    keys: &[
        bind("on", &[9, 6]),
        bind("off", &[3, 2]),
        bind("1", &[10]),
        bind("2", &[11]),
        bind("3", &[8]),
        bind("4", &[7]),
        bind("5", &[5]),
        bind("6", &[4]),
        bind("8", &[1]),
        bind("7", &[0]),
    ],
    dial: None,
    switch: None,
    led: RgbPins { r: 16, g: 17, b: 18 },
};

const V5_KEYS: &[KeyBinding] = &[
    bind("on", &[13, 14]),
    bind("off", &[0, 2]),
    bind("5", &[15]),
    bind("6", &[12]),
    bind("7", &[11]),
    bind("8", &[1]),
];

const V5_DIAL: DialPins = DialPins { clk: 7, dt: 6, sw: 8 };

static V5: Layout = Layout {
    revision: HardwareRevision::V5,
    keys: V5_KEYS,
    dial: Some(V5_DIAL),
    switch: None,
    led: RgbPins { r: 16, g: 17, b: 18 },
};

static V6: Layout = Layout {
    revision: HardwareRevision::V6,
    keys: V5_KEYS,
    dial: Some(V5_DIAL),
    switch: Some(SwitchPins { power: 27, sense: 28 }),
    led: RgbPins { r: 16, g: 17, b: 18 },
};

static V7: Layout = Layout {
    revision: HardwareRevision::V7,
    keys: &[
        bind("on", &[10, 9]),
        bind("off", &[5, 4]),
        bind("1", &[12]),
        bind("2", &[11]),
        bind("3", &[7]),
        bind("4", &[8]),
        bind("5", &[0]),
        bind("6", &[3]),
        bind("7", &[1]),
        bind("8", &[2]),
    ],
    dial: None,
    switch: None,
    led: RgbPins { r: 18, g: 19, b: 20 },
};
