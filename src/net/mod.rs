//! Outbound request queue - fire-and-forget webhooks to the hub.
//!
//! The queue owns a bounded set of in-flight requests, each with its own
//! socket, and never blocks gesture handling for longer than one bounded
//! `poll()` wait. Sockets come from a [`Transport`], which is an embassy-net
//! socket pool on the device and a scripted mock in tests.

pub mod queue;
pub mod request;
pub mod status;
pub mod webhook;


use embassy_time::Duration;
use heapless::Vec;

pub use queue::{Rejected, RequestQueue};
pub use request::{Failure, Request, RequestId, RequestObserver, TransportFault};
pub use status::StatusLine;

/// Handle of one transport socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SocketId(pub u8);

/// Socket source with readiness multiplexing.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Open a connection to the hub.
    async fn open(&mut self) -> Result<SocketId, TransportFault>;

    /// Transmit the whole payload.
    async fn send(&mut self, socket: SocketId, payload: &[u8]) -> Result<(), TransportFault>;

    /// Wait up to `timeout` for any of `watched` to become readable (data
    /// or peer close) and append the ready ones to `ready`. Returns with
    /// `ready` empty on timeout.
    async fn wait_readable<const N: usize>(
        &mut self,
        watched: &[SocketId],
        timeout: Duration,
        ready: &mut Vec<SocketId, N>,
    );

    /// Read what is available. `Ok(0)` means the peer closed.
    async fn recv(&mut self, socket: SocketId, buf: &mut [u8]) -> Result<usize, TransportFault>;

    /// Release the socket. Closing twice is harmless.
    fn close(&mut self, socket: SocketId);
}
