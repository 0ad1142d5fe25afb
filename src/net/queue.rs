//! Bounded queue of in-flight requests.

use embassy_time::{Duration, Instant};
use heapless::Vec;
use log::{debug, info, warn};

use crate::config::{POLL_WAIT_MS, REQUEST_QUEUE_CAPACITY, RESPONSE_BUFFER_LEN};
use crate::error::QueueError;
use crate::time::Clock;

use super::request::{Failure, Request, RequestId, RequestObserver};
use super::status::StatusLine;
use super::{SocketId, Transport};

/// A request `enqueue` did not put in flight.
///
/// `request` is handed back only when no callback has seen its context,
/// which is the case for [`QueueError::Full`].
#[derive(Debug)]
pub struct Rejected<C> {
    pub error: QueueError,
    pub request: Option<Request<C>>,
}

impl<C> Rejected<C> {
    fn full(request: Request<C>) -> Self {
        Self {
            error: QueueError::Full,
            request: Some(request),
        }
    }

    fn reported(error: QueueError) -> Self {
        Self {
            error,
            request: None,
        }
    }
}

struct InFlight<C> {
    id: RequestId,
    socket: SocketId,
    expiry: Instant,
    context: C,
}

/// Sockets the queue is waiting on.
struct Poller<const N: usize> {
    registered: Vec<SocketId, N>,
}

impl<const N: usize> Poller<N> {
    const fn new() -> Self {
        Self {
            registered: Vec::new(),
        }
    }

    fn register(&mut self, socket: SocketId) {
        if !self.registered.contains(&socket) {
            // One socket per in-flight request, and both are bounded by N.
            let _ = self.registered.push(socket);
        }
    }

    fn unregister(&mut self, socket: SocketId) {
        self.registered.retain(|s| *s != socket);
    }

    fn sockets(&self) -> &[SocketId] {
        &self.registered
    }
}

pub struct RequestQueue<T, K, C, const N: usize = REQUEST_QUEUE_CAPACITY> {
    transport: T,
    clock: K,
    in_flight: Vec<InFlight<C>, N>,
    poller: Poller<N>,
    next_id: u32,
}

impl<T: Transport, K: Clock, C, const N: usize> RequestQueue<T, K, C, N> {
    pub fn new(transport: T, clock: K) -> Self {
        Self {
            transport,
            clock,
            in_flight: Vec::new(),
            poller: Poller::new(),
            next_id: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.in_flight.is_full()
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Put a request in flight: open a socket, register it, send the
    /// payload and start its expiry clock.
    ///
    /// A full queue hands the request back untouched, without a callback
    /// and without opening a socket. An open or send failure reports the
    /// request as failed through `observer` before returning the error.
    pub async fn enqueue(
        &mut self,
        request: Request<C>,
        observer: &mut impl RequestObserver<C>,
    ) -> Result<RequestId, Rejected<C>> {
        if self.is_full() {
            warn!("request queue full ({}), handing request back", N);
            return Err(Rejected::full(request));
        }
        let Request {
            payload,
            timeout,
            context,
        } = request;

        let id = RequestId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        let socket = match self.transport.open().await {
            Ok(socket) => socket,
            Err(fault) => {
                warn!("request {}: connect failed: {:?}", id, fault);
                observer.on_failure(id, context, &Failure::Transport(fault));
                return Err(Rejected::reported(QueueError::Connect));
            }
        };
        self.poller.register(socket);

        if let Err(fault) = self.transport.send(socket, &payload).await {
            warn!("request {}: send failed: {:?}", id, fault);
            self.poller.unregister(socket);
            self.transport.close(socket);
            observer.on_failure(id, context, &Failure::Transport(fault));
            return Err(Rejected::reported(QueueError::Send));
        }

        let expiry = self.clock.now() + timeout;
        let entry = InFlight {
            id,
            socket,
            expiry,
            context,
        };
        if let Err(entry) = self.in_flight.push(entry) {
            // Capacity was checked above; keep the socket accounting exact anyway.
            self.poller.unregister(entry.socket);
            self.transport.close(entry.socket);
            return Err(Rejected::full(Request {
                payload,
                timeout,
                context: entry.context,
            }));
        }
        debug!("request {} in flight on socket {}", id, socket.0);
        Ok(id)
    }

    /// Wait at most `min(max_wait, 500 ms)` for responses, then complete
    /// what is ready. If nothing is ready, expired requests are pruned
    /// instead.
    ///
    /// Returns the number of requests completed.
    pub async fn poll(
        &mut self,
        max_wait: Duration,
        observer: &mut impl RequestObserver<C>,
    ) -> usize {
        let wait = max_wait.min(Duration::from_millis(POLL_WAIT_MS));
        let mut ready: Vec<SocketId, N> = Vec::new();
        self.transport
            .wait_readable(self.poller.sockets(), wait, &mut ready)
            .await;

        if ready.is_empty() {
            return self.prune_expired(observer);
        }

        let mut completed = 0;
        for socket in ready {
            self.poller.unregister(socket);
            let Some(index) = self.in_flight.iter().position(|r| r.socket == socket) else {
                warn!("socket {} ready but not tracked, closing", socket.0);
                self.transport.close(socket);
                continue;
            };
            let request = self.in_flight.remove(index);

            let mut buf = [0u8; RESPONSE_BUFFER_LEN];
            let read = self.transport.recv(socket, &mut buf).await;
            self.transport.close(socket);

            let outcome = match read {
                Ok(0) => Err(Failure::Closed),
                Ok(n) => match StatusLine::parse(&buf[..n]) {
                    Some(status) if status.is_success() => Ok(status),
                    Some(status) => Err(Failure::Status(status)),
                    None => Err(Failure::Malformed),
                },
                Err(fault) => Err(Failure::Transport(fault)),
            };

            match outcome {
                Ok(status) => {
                    info!("request {} succeeded: {}", request.id, status.code);
                    observer.on_success(request.id, request.context, &status);
                }
                Err(failure) => {
                    warn!("request {} failed: {}", request.id, failure);
                    observer.on_failure(request.id, request.context, &failure);
                }
            }
            completed += 1;
        }
        completed
    }

    fn prune_expired(&mut self, observer: &mut impl RequestObserver<C>) -> usize {
        let now = self.clock.now();
        let mut pruned = 0;
        let mut i = 0;
        while i < self.in_flight.len() {
            if self.in_flight[i].expiry > now {
                i += 1;
                continue;
            }
            let request = self.in_flight.remove(i);
            self.poller.unregister(request.socket);
            self.transport.close(request.socket);
            warn!("request {} expired", request.id);
            observer.on_failure(request.id, request.context, &Failure::Timeout);
            pruned += 1;
        }
        pruned
    }
}
