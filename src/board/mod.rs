//! Pico W glue: the hardware side of every library seam.

pub mod edges;
pub mod led;
pub mod logger;
pub mod radio;
pub mod transport;

use defmt::info;

use pico_switch::app::{Pairing, Updater};
use pico_switch::settings::RawSettings;

/// Settings baked in by `build.rs`.
pub fn baked_settings() -> RawSettings<'static> {
    RawSettings {
        name: env!("PICO_SWITCH_NAME"),
        layout: env!("PICO_SWITCH_LAYOUT"),
        hub: env!("PICO_SWITCH_HUB"),
        port: env!("PICO_SWITCH_PORT"),
        ssid: env!("WIFI_SSID"),
        password: env!("WIFI_PASSWORD"),
        routines: env!("PICO_SWITCH_ROUTINES"),
    }
}

/// BLE pairing is not part of this firmware; the request is only logged.
pub struct LogPairing;

impl Pairing for LogPairing {
    fn start_pairing(&mut self) {
        info!("pairing requested (no BLE support in this build)");
    }
}

/// OTA updates are not part of this firmware; the request is only logged.
pub struct LogUpdater;

impl Updater for LogUpdater {
    fn try_update(&mut self) {
        info!("update requested (no OTA support in this build)");
    }
}
