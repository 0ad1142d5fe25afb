//! Read-only settings snapshot.
//!
//! Firmware bakes its settings in at build time (see `build.rs`); this
//! module validates those raw strings once at boot and hands the rest of
//! the application a typed, immutable [`Settings`].

use core::net::Ipv4Addr;

use heapless::{String, Vec};

use crate::config::{
    HUB_DEFAULT_PORT, MAX_DIAL_OPTIONS, NAME_MAX_LEN, PASSWORD_MAX_LEN, ROUTINE_NAME_MAX_LEN,
    SSID_MAX_LEN,
};
use crate::error::SettingsError;
use crate::feedback::Rgb;
use crate::input::{DialOption, HardwareRevision};
use crate::wifi::WifiCredentials;

/// Remote name used when none is configured.
pub const DEFAULT_NAME: &str = "Remote";

/// Board revision used when none is configured.
pub const DEFAULT_REVISION: HardwareRevision = HardwareRevision::V7;

/// Where the home-automation hub listens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubAddress {
    pub ip: Ipv4Addr,
    pub port: u16,
}

/// Unvalidated settings, as strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawSettings<'a> {
    pub name: &'a str,
    pub layout: &'a str,
    pub hub: &'a str,
    pub port: &'a str,
    pub ssid: &'a str,
    pub password: &'a str,
    /// `name:r,g,b;name:r,g,b`
    pub routines: &'a str,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub name: String<NAME_MAX_LEN>,
    pub revision: HardwareRevision,
    pub hub: HubAddress,
    pub wifi: WifiCredentials,
    pub routines: Vec<DialOption, MAX_DIAL_OPTIONS>,
}

impl Settings {
    pub fn parse(raw: &RawSettings<'_>) -> Result<Self, SettingsError> {
        let name = non_empty(raw.name).unwrap_or(DEFAULT_NAME);
        let name = String::try_from(name).map_err(|_| SettingsError::NameTooLong)?;

        let revision = match non_empty(raw.layout) {
            Some(layout) => layout.parse()?,
            None => DEFAULT_REVISION,
        };

        let ip = raw
            .hub
            .trim()
            .parse::<Ipv4Addr>()
            .map_err(|_| SettingsError::InvalidHost)?;
        let port = match non_empty(raw.port) {
            Some(port) => port.parse().map_err(|_| SettingsError::InvalidPort)?,
            None => HUB_DEFAULT_PORT,
        };
        if port == 0 {
            return Err(SettingsError::InvalidPort);
        }

        let ssid = String::<SSID_MAX_LEN>::try_from(raw.ssid.trim())
            .map_err(|_| SettingsError::SsidTooLong)?;
        let password = String::<PASSWORD_MAX_LEN>::try_from(raw.password)
            .map_err(|_| SettingsError::PasswordTooLong)?;

        Ok(Self {
            name,
            revision,
            hub: HubAddress { ip, port },
            wifi: WifiCredentials { ssid, password },
            routines: parse_routines(raw.routines)?,
        })
    }
}

/// Parse dial routines of the form `movie:50,0,50;bedtime:0,0,50`.
pub fn parse_routines(s: &str) -> Result<Vec<DialOption, MAX_DIAL_OPTIONS>, SettingsError> {
    let mut routines = Vec::new();
    for entry in s.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, rgb) = entry
            .split_once(':')
            .ok_or(SettingsError::MalformedRoutine)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(SettingsError::MalformedRoutine);
        }

        let mut channels = rgb.split(',').map(|c| c.trim().parse::<u8>());
        let mut next = || match channels.next() {
            Some(Ok(v)) => Ok(v),
            _ => Err(SettingsError::MalformedRoutine),
        };
        let color = Rgb::new(next()?, next()?, next()?);
        if channels.next().is_some() {
            return Err(SettingsError::MalformedRoutine);
        }

        let option = DialOption {
            name: String::<ROUTINE_NAME_MAX_LEN>::try_from(name)
                .map_err(|_| SettingsError::MalformedRoutine)?,
            color,
        };
        routines
            .push(option)
            .map_err(|_| SettingsError::TooManyRoutines)?;
    }
    Ok(routines)
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}
