//! HTTP status line parsing.
//!
//! Only the first line of a response is ever inspected. Anything after the
//! first CR or LF is ignored.

use core::fmt;

use heapless::String;

/// Longest reason phrase kept; longer ones are truncated.
pub const REASON_MAX_LEN: usize = 32;

/// `HTTP/1.1 200 OK`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Minor HTTP version (`HTTP/1.x`).
    pub minor_version: u8,
    pub code: u16,
    pub reason: String<REASON_MAX_LEN>,
}

impl StatusLine {
    /// Parse the status line at the start of `response`.
    ///
    /// Version and code are read from the raw bytes. The reason phrase may
    /// carry non-UTF-8 octets or be cut mid-character by a short read; it
    /// keeps its longest valid UTF-8 prefix.
    pub fn parse(response: &[u8]) -> Option<Self> {
        let end = response
            .iter()
            .position(|&b| b == b'\r' || b == b'\n')
            .unwrap_or(response.len());
        let line = &response[..end];

        let rest = line.strip_prefix(b"HTTP/1.")?;
        let (&minor, rest) = rest.split_first()?;
        if !minor.is_ascii_digit() {
            return None;
        }
        let rest = rest.strip_prefix(b" ")?;

        let start = rest.iter().position(|&b| b != b' ')?;
        let rest = &rest[start..];
        let code_end = rest.iter().position(|&b| b == b' ').unwrap_or(rest.len());
        let code = match &rest[..code_end] {
            &[a, b, c] if [a, b, c].iter().all(u8::is_ascii_digit) => {
                u16::from(a - b'0') * 100 + u16::from(b - b'0') * 10 + u16::from(c - b'0')
            }
            _ => return None,
        };

        let reason = match core::str::from_utf8(&rest[code_end..]) {
            Ok(reason) => reason,
            Err(err) => {
                let valid = &rest[code_end..code_end + err.valid_up_to()];
                core::str::from_utf8(valid).unwrap_or_default()
            }
        };
        let mut kept = String::new();
        for c in reason.trim().chars() {
            if kept.push(c).is_err() {
                break;
            }
        }

        Some(Self {
            minor_version: minor - b'0',
            code,
            reason: kept,
        })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/1.{} {} {}", self.minor_version, self.code, self.reason)
    }
}
