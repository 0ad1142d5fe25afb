//! pico-switch: a multi-button WiFi remote for a home-automation hub.
//!
//! This crate holds everything that does not touch hardware, so it builds
//! and tests on the host:
//!
//! - [`input`]: edges to presses, long presses, combinations and dial gestures
//! - [`net`]: bounded, non-blocking webhook request queue
//! - [`wifi`]: rate-limited WiFi association
//! - [`app`]: glue between the three and the main-loop pass
//!
//! Usage: `cargo test --lib`
//!
//! The firmware binary (`src/main.rs`, feature `embedded`) supplies the
//! RP2040/cyw43 implementations of the seams defined here.

#![cfg_attr(not(test), no_std)]

pub mod app;
pub mod config;
pub mod error;
pub mod feedback;
pub mod input;
pub mod net;
pub mod settings;
pub mod time;
pub mod timers;
pub mod wifi;

pub use error::Error;
