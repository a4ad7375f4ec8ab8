//! Transport boundary for the connection manager.
//!
//! The transport is event driven: it reports accepts, received data,
//! send completions and errors, and the manager reacts. Once a connection
//! has been bound to a pool slot, every later notification for it carries
//! that [`SlotId`], the same way lwIP callbacks carry their `arg` pointer.

use crate::error::TransportError;

use super::pool::SlotId;

/// Opaque id the transport gives a freshly accepted connection, valid
/// until it is bound or rejected.
pub type ConnHandle = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A peer connected and waits to be bound or rejected.
    Accept { handle: ConnHandle },
    /// Bytes arrived. Empty `data` means the peer closed its side.
    Received { slot: SlotId, data: Vec<u8> },
    /// `len` previously written bytes have left the send buffer.
    Sent { slot: SlotId, len: usize },
    /// The connection failed; the transport has already dropped it.
    Error { slot: SlotId, code: i32 },
}

pub trait Transport {
    /// Collect pending notifications. Never blocks.
    fn poll(&mut self, events: &mut Vec<TransportEvent>);

    /// Attach an accepted connection to a pool slot.
    fn bind(&mut self, handle: ConnHandle, slot: SlotId) -> Result<(), TransportError>;

    /// Queue bytes for sending. A later `Sent` reports their completion.
    fn write(&mut self, slot: SlotId, data: &[u8]) -> Result<(), TransportError>;

    /// Unbind and close the connection on `slot`. Unknown slots are ignored.
    fn close(&mut self, slot: SlotId);

    /// Refuse an accepted connection that never got a slot.
    fn reject(&mut self, handle: ConnHandle);
}
