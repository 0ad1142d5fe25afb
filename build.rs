//! Build script - copies the linker script into the output directory and
//! bakes the device settings from `.env` (or the environment) into the
//! firmware image.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings exported to the crate as `cargo:rustc-env` values.
const SETTINGS_VARS: &[&str] = &[
    "PICO_SWITCH_NAME",
    "PICO_SWITCH_LAYOUT",
    "PICO_SWITCH_HUB",
    "PICO_SWITCH_PORT",
    "PICO_SWITCH_ROUTINES",
    "WIFI_SSID",
    "WIFI_PASSWORD",
];

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to OUT_DIR
    fs::copy("memory.x", out_dir.join("memory.x")).unwrap();

    // Tell cargo to look for linker scripts in OUT_DIR
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Linker scripts only make sense for the RP2040 target.
    if env::var("TARGET").unwrap_or_default().starts_with("thumbv6m") {
        println!("cargo:rustc-link-arg-bins=--nmagic");
        println!("cargo:rustc-link-arg-bins=-Tlink.x");
        println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    load_settings();

    // Rebuild if the linker script changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Load device settings from `.env`; real environment variables win.
fn load_settings() {
    println!("cargo:rerun-if-changed=.env");
    for var in SETTINGS_VARS {
        println!("cargo:rerun-if-env-changed={}", var);
    }

    if Path::new(".env").exists() {
        match dotenvy::dotenv() {
            Ok(_) => println!("cargo:warning=Loaded .env file"),
            Err(e) => println!("cargo:warning=Failed to load .env file: {}", e),
        }
    }

    for var in SETTINGS_VARS {
        let value = env::var(var).unwrap_or_default().trim().to_string();
        println!("cargo:rustc-env={}={}", var, value);
    }

    if env::var("WIFI_SSID").map(|s| s.trim().is_empty()).unwrap_or(true) {
        println!("cargo:warning=WIFI_SSID is empty - WiFi will not be configured");
    }
}
