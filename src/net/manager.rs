//! Connection manager: the per-connection state machine.
//!
//! ```text
//!   ACCEPTED ──data──▶ PARSING ──complete──▶ DISPATCHED ──▶ SENDING(head + chunk)
//!                                                             │
//!                                              sent, more ◀───┤
//!                                                             ▼ sent, done
//!                                                           CLOSED
//! ```
//!
//! Any state can also go straight to CLOSED on peer close, transport error,
//! write failure or idle timeout. Every exit path runs the same
//! [`ConnectionManager::teardown`], which is a no-op for a slot that is
//! already gone.
//!
//! The manager is owned by the event pump thread and is the only thing that
//! mutates the pool.

use log::{debug, info, warn};

use crate::app::ports::EventSink;
use crate::config::{MAX_CONNECTIONS, RuntimeConfig};
use crate::state::AppContext;

use super::pool::{Pool, SlotId};
use super::request::{Progress, RequestError};
use super::response::{Outbound, Response};
use super::router;
use super::transport::{ConnHandle, Transport, TransportEvent};

/// Why a connection was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Completed,
    PeerClosed,
    TransportError(i32),
    WriteFailed,
    IdleTimeout,
}

pub struct ConnectionManager {
    pool: Pool,
    idle_timeout_ms: u64,
}

impl ConnectionManager {
    pub fn new(cfg: &RuntimeConfig) -> Self {
        Self { pool: Pool::new(), idle_timeout_ms: u64::from(cfg.idle_timeout_ms) }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Route one transport notification.
    pub fn handle_event<T, E>(&mut self, event: TransportEvent, now_ms: u64, ctx: &AppContext, transport: &mut T, sink: &mut E)
    where
        T: Transport,
        E: EventSink,
    {
        match event {
            TransportEvent::Accept { handle } => {
                self.on_accept(handle, now_ms, transport);
            }
            TransportEvent::Received { slot, data } => self.on_receive(slot, &data, now_ms, ctx, transport, sink),
            TransportEvent::Sent { slot, len } => self.on_sent(slot, len, transport),
            TransportEvent::Error { slot, code } => self.on_error(slot, code, transport),
        }
    }

    /// Claim a slot for a new connection, or refuse it when the pool is full.
    pub fn on_accept<T: Transport>(&mut self, handle: ConnHandle, now_ms: u64, transport: &mut T) -> Option<SlotId> {
        let Some(slot) = self.pool.claim(handle, now_ms + self.idle_timeout_ms) else {
            warn!("HTTP | pool full ({} slots), refusing connection", MAX_CONNECTIONS);
            transport.reject(handle);
            return None;
        };
        if let Err(e) = transport.bind(handle, slot) {
            warn!("HTTP | bind {} failed: {}", slot, e);
            self.pool.release(slot);
            transport.reject(handle);
            return None;
        }
        debug!("HTTP | {} accepted ({}/{})", slot, self.pool.occupied(), MAX_CONNECTIONS);
        Some(slot)
    }

    pub fn on_receive<T, E>(&mut self, slot: SlotId, data: &[u8], now_ms: u64, ctx: &AppContext, transport: &mut T, sink: &mut E)
    where
        T: Transport,
        E: EventSink,
    {
        if data.is_empty() {
            self.teardown(slot, CloseReason::PeerClosed, transport);
            return;
        }
        let idle = self.idle_timeout_ms;
        let Some(conn) = self.pool.get_mut(slot) else {
            return;
        };
        conn.deadline_ms = now_ms + idle;
        if conn.outbound.is_some() {
            // Already answering; anything after the request is ignored.
            return;
        }

        let response = match conn.request.push(data) {
            Ok(Progress::Partial) => return,
            Ok(Progress::Complete) => match conn.request.parse() {
                Ok(req) => {
                    info!("HTTP | {} {:?} {}", slot, req.method, req.path);
                    router::route(&req, ctx, sink)
                }
                Err(_) => Response::bad_request(),
            },
            Err(RequestError::TooLarge) => {
                warn!("HTTP | {} request too large", slot);
                Response::too_large()
            }
            Err(RequestError::OutOfMemory) => {
                warn!("HTTP | {} out of memory for request", slot);
                Response::internal_error()
            }
            Err(RequestError::BadRequest) => Response::bad_request(),
        };
        self.start_response(slot, response, transport);
    }

    /// Send the head and the first body chunk.
    fn start_response<T: Transport>(&mut self, slot: SlotId, response: Response, transport: &mut T) {
        let Some(conn) = self.pool.get_mut(slot) else {
            return;
        };
        let mut out = Outbound::new(response);
        let mut written = 0;
        let mut result = Ok(());
        if let Some(head) = out.take_head() {
            written += head.len();
            result = transport.write(slot, head);
        }
        if result.is_ok() {
            if let Some(chunk) = out.next_chunk() {
                written += chunk.len();
                result = transport.write(slot, chunk);
            }
        }
        // The request buffer is no longer needed once the response exists.
        conn.request = Default::default();
        conn.outbound = Some(out);
        conn.in_flight += written;

        if let Err(e) = result {
            warn!("HTTP | {} write failed: {}", slot, e);
            self.teardown(slot, CloseReason::WriteFailed, transport);
        }
    }

    /// Hand off the next chunk once everything written so far has left, or
    /// close when the body is exhausted.
    pub fn on_sent<T: Transport>(&mut self, slot: SlotId, len: usize, transport: &mut T) {
        let Some(conn) = self.pool.get_mut(slot) else {
            return;
        };
        conn.in_flight = conn.in_flight.saturating_sub(len);
        if conn.in_flight > 0 {
            return;
        }
        let Some(out) = conn.outbound.as_mut() else {
            return;
        };
        match out.next_chunk() {
            Some(chunk) => {
                let n = chunk.len();
                match transport.write(slot, chunk) {
                    Ok(()) => conn.in_flight += n,
                    Err(e) => {
                        warn!("HTTP | {} write failed: {}", slot, e);
                        self.teardown(slot, CloseReason::WriteFailed, transport);
                    }
                }
            }
            None => {
                self.teardown(slot, CloseReason::Completed, transport);
            }
        }
    }

    pub fn on_error<T: Transport>(&mut self, slot: SlotId, code: i32, transport: &mut T) {
        self.teardown(slot, CloseReason::TransportError(code), transport);
    }

    /// Expire every connection whose idle deadline has passed.
    pub fn sweep<T: Transport>(&mut self, now_ms: u64, transport: &mut T) -> usize {
        let expired = self.pool.expired(now_ms);
        for &slot in &expired {
            self.teardown(slot, CloseReason::IdleTimeout, transport);
        }
        expired.len()
    }

    /// Close the transport side and free the slot. Returns `false` when the
    /// slot was already free or reused (nothing done).
    pub fn teardown<T: Transport>(&mut self, slot: SlotId, reason: CloseReason, transport: &mut T) -> bool {
        if self.pool.release(slot).is_none() {
            return false;
        }
        transport.close(slot);
        match reason {
            CloseReason::Completed => debug!("HTTP | {} done", slot),
            CloseReason::IdleTimeout => info!("HTTP | {} idle timeout", slot),
            other => info!("HTTP | {} closed: {:?}", slot, other),
        }
        true
    }
}
