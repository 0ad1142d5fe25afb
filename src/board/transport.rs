//! Pooled embassy-net TCP sockets to the hub.

use core::future::pending;
use core::pin::pin;

use embassy_futures::select::select_slice;
use embassy_net::tcp::{ConnectError, TcpSocket};
use embassy_net::{IpAddress, IpEndpoint, Stack};
use embassy_time::{with_timeout, Duration};
use heapless::Vec;
use static_cell::StaticCell;

use pico_switch::config::{REQUEST_QUEUE_CAPACITY, SOCKET_CONNECT_TIMEOUT_MS};
use pico_switch::net::{SocketId, Transport, TransportFault};
use pico_switch::settings::HubAddress;

/// One socket per request the queue can hold.
pub const POOL_SIZE: usize = REQUEST_QUEUE_CAPACITY;

const RX_LEN: usize = 512;
const TX_LEN: usize = 512;

struct Buffers {
    rx: [u8; RX_LEN],
    tx: [u8; TX_LEN],
}

pub struct SocketPool {
    hub: IpEndpoint,
    sockets: [TcpSocket<'static>; POOL_SIZE],
    busy: [bool; POOL_SIZE],
}

impl SocketPool {
    /// Build the pool. Call once; the buffers are static.
    pub fn new(stack: Stack<'static>, hub: HubAddress) -> Self {
        static BUFFERS: StaticCell<[Buffers; POOL_SIZE]> = StaticCell::new();
        let buffers = BUFFERS.init_with(|| {
            core::array::from_fn(|_| Buffers {
                rx: [0; RX_LEN],
                tx: [0; TX_LEN],
            })
        });
        let sockets = buffers.each_mut().map(|Buffers { rx, tx }| {
            let mut socket = TcpSocket::new(stack, rx, tx);
            socket.set_timeout(Some(Duration::from_secs(10)));
            socket
        });

        Self {
            hub: IpEndpoint::new(IpAddress::Ipv4(hub.ip), hub.port),
            sockets,
            busy: [false; POOL_SIZE],
        }
    }

    fn slot(&self, socket: SocketId) -> Option<usize> {
        let index = usize::from(socket.0);
        (index < POOL_SIZE && self.busy[index]).then_some(index)
    }

    fn is_readable(&self, index: usize) -> bool {
        let socket = &self.sockets[index];
        socket.can_recv() || !socket.may_recv()
    }
}

async fn readable(socket: &TcpSocket<'_>, watched: bool) {
    if watched {
        socket.wait_read_ready().await
    } else {
        pending().await
    }
}

fn connect_fault(err: ConnectError) -> TransportFault {
    match err {
        ConnectError::NoRoute => TransportFault::Unreachable,
        ConnectError::ConnectionReset => TransportFault::Refused,
        ConnectError::TimedOut => TransportFault::ConnectTimeout,
        ConnectError::InvalidState => TransportFault::NoSocket,
    }
}

impl Transport for SocketPool {
    async fn open(&mut self) -> Result<SocketId, TransportFault> {
        let index = self
            .busy
            .iter()
            .position(|busy| !busy)
            .ok_or(TransportFault::NoSocket)?;
        let socket = &mut self.sockets[index];
        let timeout = Duration::from_millis(SOCKET_CONNECT_TIMEOUT_MS);
        match with_timeout(timeout, socket.connect(self.hub)).await {
            Ok(Ok(())) => {
                self.busy[index] = true;
                Ok(SocketId(index as u8))
            }
            Ok(Err(err)) => {
                socket.abort();
                Err(connect_fault(err))
            }
            Err(_) => {
                socket.abort();
                Err(TransportFault::ConnectTimeout)
            }
        }
    }

    async fn send(&mut self, socket: SocketId, payload: &[u8]) -> Result<(), TransportFault> {
        let index = self.slot(socket).ok_or(TransportFault::NoSocket)?;
        let mut written = 0;
        while written < payload.len() {
            match self.sockets[index].write(&payload[written..]).await {
                Ok(0) | Err(_) => return Err(TransportFault::Reset),
                Ok(n) => written += n,
            }
        }
        Ok(())
    }

    async fn wait_readable<const N: usize>(
        &mut self,
        watched: &[SocketId],
        timeout: Duration,
        ready: &mut Vec<SocketId, N>,
    ) {
        let waits: [_; POOL_SIZE] = core::array::from_fn(|i| {
            readable(&self.sockets[i], watched.contains(&SocketId(i as u8)))
        });
        // Timing out just means nothing became ready.
        let _ = with_timeout(timeout, select_slice(pin!(waits))).await;

        for socket in watched {
            if let Some(index) = self.slot(*socket) {
                if self.is_readable(index) {
                    let _ = ready.push(*socket);
                }
            }
        }
    }

    async fn recv(&mut self, socket: SocketId, buf: &mut [u8]) -> Result<usize, TransportFault> {
        let index = self.slot(socket).ok_or(TransportFault::NoSocket)?;
        if !self.sockets[index].can_recv() {
            return Ok(0);
        }
        self.sockets[index]
            .read(buf)
            .await
            .map_err(|_| TransportFault::Reset)
    }

    fn close(&mut self, socket: SocketId) {
        if let Some(index) = self.slot(socket) {
            self.sockets[index].abort();
            self.busy[index] = false;
        }
    }
}
