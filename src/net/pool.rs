//! Fixed-capacity connection pool.
//!
//! Slots are addressed by [`SlotId`]: an index plus a generation that is
//! bumped every time the slot is released. A stale id (from a connection
//! that has already been torn down) never matches the slot's current
//! occupant, so late notifications and a second teardown are harmless.

use core::fmt;

use crate::config::MAX_CONNECTIONS;

use super::request::RequestBuffer;
use super::response::Outbound;
use super::transport::ConnHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId {
    index: u8,
    generation: u32,
}

impl SlotId {
    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// State of one live connection.
#[derive(Debug)]
pub struct Connection {
    pub handle: ConnHandle,
    /// Monotonic milliseconds after which the sweep may expire this slot.
    pub deadline_ms: u64,
    pub request: RequestBuffer,
    /// Response being streamed, once dispatched.
    pub outbound: Option<Outbound>,
    /// Bytes written to the transport and not yet reported sent.
    pub in_flight: usize,
}

impl Connection {
    fn new(handle: ConnHandle, deadline_ms: u64) -> Self {
        Self {
            handle,
            deadline_ms,
            request: RequestBuffer::new(),
            outbound: None,
            in_flight: 0,
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    conn: Option<Connection>,
}

#[derive(Debug)]
pub struct Pool {
    slots: [Slot; MAX_CONNECTIONS],
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl Pool {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| Slot { generation: 0, conn: None }),
        }
    }

    /// Claim a free slot for `handle`. `None` when the pool is full.
    pub fn claim(&mut self, handle: ConnHandle, deadline_ms: u64) -> Option<SlotId> {
        let (index, slot) = self.slots.iter_mut().enumerate().find(|(_, s)| s.conn.is_none())?;
        slot.conn = Some(Connection::new(handle, deadline_ms));
        Some(SlotId { index: index as u8, generation: slot.generation })
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut Connection> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        slot.conn.as_mut()
    }

    pub fn is_live(&self, id: SlotId) -> bool {
        self.slots
            .get(id.index())
            .is_some_and(|s| s.generation == id.generation && s.conn.is_some())
    }

    /// Free the slot. Returns the connection only the first time; a stale
    /// or already released id is a no-op.
    pub fn release(&mut self, id: SlotId) -> Option<Connection> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        let conn = slot.conn.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        Some(conn)
    }

    /// Ids of live connections whose deadline is strictly before `now_ms`.
    pub fn expired(&self, now_ms: u64) -> heapless::Vec<SlotId, MAX_CONNECTIONS> {
        let mut out = heapless::Vec::new();
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.conn.as_ref().is_some_and(|c| c.deadline_ms < now_ms) {
                // Capacity equals the slot count.
                let _ = out.push(SlotId { index: index as u8, generation: slot.generation });
            }
        }
        out
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.conn.is_some()).count()
    }
}
