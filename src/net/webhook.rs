//! Webhook requests understood by the home-automation hub.

use core::fmt::{self, Write};

use heapless::{String, Vec};

use crate::config::PAYLOAD_MAX_LEN;
use crate::settings::HubAddress;

/// Encoded HTTP request bytes.
pub type Payload = Vec<u8, PAYLOAD_MAX_LEN>;

/// Suffix appended to a button for a long press.
pub const LONG_SUFFIX: &str = "-long";

/// Write `s` percent-encoded; RFC 3986 unreserved bytes pass through.
pub fn percent_encode(out: &mut impl Write, s: &str) -> fmt::Result {
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.write_char(b as char)?;
        } else {
            write!(out, "%{:02X}", b)?;
        }
    }
    Ok(())
}

/// `POST /api/webhook/remote-press?remote=<name>&button=<button>[-long]`
pub fn remote_press(
    hub: &HubAddress,
    remote: &str,
    button: &str,
    long: bool,
) -> Result<Payload, fmt::Error> {
    let mut request: String<PAYLOAD_MAX_LEN> = String::new();
    request.write_str("POST /api/webhook/remote-press?remote=")?;
    percent_encode(&mut request, remote)?;
    request.write_str("&button=")?;
    percent_encode(&mut request, button)?;
    if long {
        request.write_str(LONG_SUFFIX)?;
    }
    write!(
        request,
        " HTTP/1.1\r\nHost: {}:{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        hub.ip, hub.port
    )?;
    Ok(request.into_bytes())
}
